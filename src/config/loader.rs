//! Configuration Loader (Figment-based)
//!
//! Loads and merges configuration from multiple sources using Figment:
//! 1. Built-in defaults (Serialized)
//! 2. Global config (~/.config/platogen/config.toml)
//! 3. Project config (./platogen.toml)
//! 4. Environment variables (PLATOGEN_* prefix)

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use super::types::Config;
use crate::types::{PlatoError, Result};

/// Configuration loader
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with full resolution chain using Figment:
    /// defaults → global → project → env vars
    pub fn load() -> Result<Config> {
        let mut figment = Figment::new().merge(Serialized::defaults(Config::default()));

        if let Some(global_path) = Self::global_config_path()
            && global_path.exists()
        {
            debug!("Loading global config from: {}", global_path.display());
            figment = figment.merge(Toml::file(&global_path));
        }

        let project_path = Self::project_config_path();
        if project_path.exists() {
            debug!("Loading project config from: {}", project_path.display());
            figment = figment.merge(Toml::file(&project_path));
        }

        // e.g. PLATOGEN_LLM_MODEL -> llm.model
        figment = figment.merge(Env::prefixed("PLATOGEN_").split('_').lowercase(true));

        let config: Config = figment
            .extract()
            .map_err(|e| PlatoError::Config(format!("Configuration error: {}", e)))?;

        config.validate()?;

        Ok(config)
    }

    /// Load configuration from a specific file only
    pub fn load_from_file(path: &Path) -> Result<Config> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(path))
            .extract()
            .map_err(|e| PlatoError::Config(format!("Configuration error: {}", e)))?;

        config.validate()?;

        Ok(config)
    }

    // =========================================================================
    // Path Management
    // =========================================================================

    /// Get path to global config directory (~/.config/platogen/)
    pub fn global_dir() -> Option<PathBuf> {
        env::var("XDG_CONFIG_HOME")
            .ok()
            .map(PathBuf::from)
            .or_else(|| {
                env::var("HOME")
                    .ok()
                    .map(|home| PathBuf::from(home).join(".config"))
            })
            .map(|p| p.join("platogen"))
    }

    /// Get path to global config file
    pub fn global_config_path() -> Option<PathBuf> {
        Self::global_dir().map(|dir| dir.join("config.toml"))
    }

    /// Get path to project config file
    pub fn project_config_path() -> PathBuf {
        PathBuf::from("platogen.toml")
    }

    // =========================================================================
    // Config Commands
    // =========================================================================

    /// Show config file path
    pub fn show_path() {
        println!("Configuration paths:");
        println!();

        if let Some(global) = Self::global_config_path() {
            let exists = if global.exists() { "✓" } else { "✗" };
            println!("  Global:  {} {}", exists, global.display());
        } else {
            println!("  Global:  (not available)");
        }

        let project = Self::project_config_path();
        let exists = if project.exists() { "✓" } else { "✗" };
        println!("  Project: {} {}", exists, project.display());
    }

    /// Show current effective configuration
    pub fn show_config(as_json: bool) -> Result<()> {
        let config = Self::load()?;

        if as_json {
            println!("{}", serde_json::to_string_pretty(&config)?);
        } else {
            println!(
                "{}",
                toml::to_string_pretty(&config).map_err(|e| PlatoError::Config(e.to_string()))?
            );
        }

        Ok(())
    }

    // =========================================================================
    // Initialization
    // =========================================================================

    /// Initialize global configuration
    pub fn init_global(force: bool) -> Result<PathBuf> {
        let global_dir = Self::global_dir().ok_or_else(|| {
            PlatoError::Config("Cannot determine global config directory".to_string())
        })?;

        fs::create_dir_all(&global_dir)?;

        let config_path = global_dir.join("config.toml");
        if !config_path.exists() || force {
            fs::write(&config_path, Self::default_global_config())?;
            info!("Created global config: {}", config_path.display());
        } else {
            info!("Global config exists: {}", config_path.display());
        }

        Ok(global_dir)
    }

    /// Generate default global config content (TOML)
    fn default_global_config() -> String {
        r#"# Platogen Global Configuration
# User-wide defaults. A ./platogen.toml in the working directory overrides these.

version = "1.0"

# LLM settings
[llm]
provider = "openai"
timeout_secs = 300

# Stage retry and regeneration policy
[pipeline]
max_attempts = 3
regeneration_enabled = false

# Generated-site output
[site]
output_dir = "generated_site"
"#
        .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_from_missing_file_uses_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let config = ConfigLoader::load_from_file(&temp_dir.path().join("nope.toml")).unwrap();
        assert_eq!(config.version, "1.0");
        assert_eq!(config.pipeline.max_attempts, 3);
    }

    #[test]
    fn test_load_from_file_overrides() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("platogen.toml");
        std::fs::write(
            &path,
            "[pipeline]\nmax_attempts = 5\nregeneration_enabled = true\n",
        )
        .unwrap();

        let config = ConfigLoader::load_from_file(&path).unwrap();
        assert_eq!(config.pipeline.max_attempts, 5);
        assert!(config.pipeline.regeneration_enabled);
    }

    #[test]
    fn test_invalid_file_rejected_by_validation() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("platogen.toml");
        std::fs::write(&path, "[pipeline]\nmax_attempts = 0\n").unwrap();

        assert!(ConfigLoader::load_from_file(&path).is_err());
    }
}
