//! Materializer
//!
//! Turns the final workspace into a runnable project directory: the
//! artifact as `index.html`, a package manifest, the structured stage
//! data, and copied media assets. Thin by design - all the interesting
//! guarantees live upstream. Failure here is the one terminal error class
//! of the whole pipeline.

use serde_json::{Value, json};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::types::{PlatoError, Result};

/// File-emission sink for a completed run.
///
/// Implementations must be all-or-nothing from the caller's perspective:
/// an `Err` is surfaced as a terminal pipeline failure with no partial
/// retry inside the pipeline.
pub trait Materializer: Send + Sync {
    fn materialize(
        &self,
        artifact: &str,
        structured_data: &Value,
        media_files: &[PathBuf],
    ) -> Result<()>;
}

/// Writes a standalone Vite-compatible project to disk
pub struct DiskMaterializer {
    output_dir: PathBuf,
}

impl DiskMaterializer {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    fn write(&self, path: &Path, contents: &str) -> Result<()> {
        fs::write(path, contents)
            .map_err(|e| PlatoError::Materialize(format!("writing {}: {}", path.display(), e)))
    }
}

impl Materializer for DiskMaterializer {
    fn materialize(
        &self,
        artifact: &str,
        structured_data: &Value,
        media_files: &[PathBuf],
    ) -> Result<()> {
        let out = &self.output_dir;

        // Clean output directory
        if out.exists() {
            fs::remove_dir_all(out).map_err(|e| {
                PlatoError::Materialize(format!("cleaning {}: {}", out.display(), e))
            })?;
        }

        let data_dir = out.join("src").join("data");
        let assets_dir = out.join("public").join("assets");
        for dir in [&data_dir, &assets_dir] {
            fs::create_dir_all(dir).map_err(|e| {
                PlatoError::Materialize(format!("creating {}: {}", dir.display(), e))
            })?;
        }

        // The self-contained site is the entry page; vite serves it as-is
        self.write(&out.join("index.html"), artifact)?;

        let site_title = structured_data
            .pointer("/content_strategy/meta/site_title")
            .and_then(Value::as_str)
            .unwrap_or("portfolio");
        let package_name = package_name(site_title);

        let package_json = json!({
            "name": package_name,
            "version": "1.0.0",
            "type": "module",
            "scripts": {
                "dev": "vite",
                "build": "vite build",
                "preview": "vite preview",
            },
            "devDependencies": {
                "vite": "^5.0.0",
            },
        });
        self.write(
            &out.join("package.json"),
            &serde_json::to_string_pretty(&package_json)?,
        )?;

        self.write(&out.join("vite.config.js"), VITE_CONFIG)?;

        self.write(
            &data_dir.join("site_data.json"),
            &serde_json::to_string_pretty(structured_data)?,
        )?;

        // Copy media assets; a missing upload is logged, not fatal
        let mut copied = 0usize;
        for media in media_files {
            let Some(file_name) = media.file_name() else {
                continue;
            };
            match fs::copy(media, assets_dir.join(file_name)) {
                Ok(_) => copied += 1,
                Err(e) => warn!("Skipping media file {}: {}", media.display(), e),
            }
        }

        self.write(&out.join("README.md"), &readme(site_title))?;

        info!(
            "Materialized project at {} ({} media files)",
            out.display(),
            copied
        );
        Ok(())
    }
}

/// npm-safe package name derived from the site title
fn package_name(site_title: &str) -> String {
    let slug: String = site_title
        .to_lowercase()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
        .collect::<String>()
        .trim_matches('-')
        .chars()
        .take(30)
        .collect();

    if slug.is_empty() {
        "portfolio".to_string()
    } else {
        format!("portfolio-{}", slug)
    }
}

const VITE_CONFIG: &str = r#"import { defineConfig } from 'vite'

export default defineConfig({
  server: {
    port: 3000
  },
  build: {
    outDir: 'dist',
    sourcemap: false
  }
})
"#;

fn readme(site_title: &str) -> String {
    format!(
        r#"# {} - Professional Portfolio

A standalone single-file site generated by Plato. `index.html` is
self-contained (React via CDN) and opens directly in a browser; the Vite
setup is only a convenience for local serving.

## Quick Start

```bash
npm install
npm run dev
```

Visit: http://localhost:3000

## Structure

- `index.html` - the complete site (markup, script, style)
- `src/data/site_data.json` - structured content and run audit log
- `public/assets/` - uploaded media
"#,
        site_title
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample_data() -> Value {
        json!({
            "content_strategy": {
                "meta": {"site_title": "Jordan", "navigation_structure": ["Home"]}
            }
        })
    }

    #[test]
    fn test_materialize_writes_project_files() {
        let temp = TempDir::new().unwrap();
        let out = temp.path().join("site");
        let materializer = DiskMaterializer::new(&out);

        materializer
            .materialize("<html></html>", &sample_data(), &[])
            .unwrap();

        assert_eq!(fs::read_to_string(out.join("index.html")).unwrap(), "<html></html>");
        assert!(out.join("package.json").exists());
        assert!(out.join("vite.config.js")
            .exists());
        assert!(out.join("src/data/site_data.json").exists());
        assert!(out.join("README.md").exists());

        let manifest: Value =
            serde_json::from_str(&fs::read_to_string(out.join("package.json")).unwrap()).unwrap();
        assert_eq!(manifest["name"], "portfolio-jordan");
    }

    #[test]
    fn test_materialize_replaces_previous_output() {
        let temp = TempDir::new().unwrap();
        let out = temp.path().join("site");
        let materializer = DiskMaterializer::new(&out);

        materializer
            .materialize("<html>v1</html>", &sample_data(), &[])
            .unwrap();
        fs::write(out.join("stale.txt"), "old").unwrap();

        materializer
            .materialize("<html>v2</html>", &sample_data(), &[])
            .unwrap();

        assert!(!out.join("stale.txt").exists());
        assert!(
            fs::read_to_string(out.join("index.html"))
                .unwrap()
                .contains("v2")
        );
    }

    #[test]
    fn test_materialize_copies_media() {
        let temp = TempDir::new().unwrap();
        let media = temp.path().join("headshot.png");
        fs::write(&media, b"fake image").unwrap();

        let out = temp.path().join("site");
        DiskMaterializer::new(&out)
            .materialize("<html></html>", &sample_data(), &[media])
            .unwrap();

        assert!(out.join("public/assets/headshot.png").exists());
    }

    #[test]
    fn test_missing_media_is_not_fatal() {
        let temp = TempDir::new().unwrap();
        let out = temp.path().join("site");
        let result = DiskMaterializer::new(&out).materialize(
            "<html></html>",
            &sample_data(),
            &[PathBuf::from("/nonexistent/file.png")],
        );
        assert!(result.is_ok());
    }

    #[test]
    fn test_package_name_slug() {
        assert_eq!(package_name("Jordan Q. Dev"), "portfolio-jordan-q--dev");
        assert_eq!(package_name("!!!"), "portfolio");
    }
}
