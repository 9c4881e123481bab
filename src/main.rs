use clap::{Parser, Subcommand};
use console::style;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::process::ExitCode;
use tokio::runtime::Runtime;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use platogen::pipeline::{DiskMaterializer, Materializer};
use platogen::{Config, ConfigLoader, PipelineInput, PipelineOrchestrator, ProviderConfig};

/// Parse a `key=value` argument
fn parse_key_value(s: &str) -> Result<(String, String), String> {
    s.split_once('=')
        .map(|(key, value)| (key.trim().to_string(), value.trim().to_string()))
        .ok_or_else(|| format!("Invalid key=value pair: '{}'", s))
}

#[derive(Parser)]
#[command(name = "platogen")]
#[command(version, about = "AI-driven single-page portfolio site generator")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(long)]
    verbose: bool,

    #[arg(long, short)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a portfolio site from raw text and questionnaire answers
    Generate {
        #[arg(long, help = "File with the raw extracted text ('-' for stdin)")]
        text: PathBuf,

        #[arg(long = "answer", value_parser = parse_key_value, help = "Questionnaire answer as key=value (repeatable)")]
        answers: Vec<(String, String)>,

        #[arg(long = "vibe", value_parser = parse_key_value, help = "Vibe input as key=value (repeatable: favorite_color, animal, abstract_word)")]
        vibe: Vec<(String, String)>,

        #[arg(long = "media", help = "Media file to copy into the site (repeatable)")]
        media: Vec<PathBuf>,

        #[arg(long, short, help = "Output directory for the generated project")]
        output: Option<PathBuf>,

        #[arg(long, help = "LLM provider (openai, ollama)")]
        provider: Option<String>,

        #[arg(long, help = "Model to use")]
        model: Option<String>,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show current configuration (merged from all sources)
    Show {
        #[arg(long, help = "Output as JSON instead of TOML")]
        json: bool,
    },
    /// Show configuration file paths
    Path,
    /// Initialize global configuration
    Init {
        #[arg(long, help = "Overwrite existing config")]
        force: bool,
    },
}

fn main() -> ExitCode {
    match run_cli() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", style("✗").red(), e);
            ExitCode::FAILURE
        }
    }
}

fn run_cli() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    match cli.command {
        Commands::Generate {
            text,
            answers,
            vibe,
            media,
            output,
            provider,
            model,
        } => {
            let mut config = ConfigLoader::load()?;
            if let Some(provider) = provider {
                config.llm.provider = provider;
            }
            if let Some(model) = model {
                config.llm.model = Some(model);
            }
            if let Some(output) = output {
                config.site.output_dir = output;
            }

            let raw_text = if text == PathBuf::from("-") {
                std::io::read_to_string(std::io::stdin())?
            } else {
                std::fs::read_to_string(&text)?
            };

            let input = PipelineInput {
                raw_text,
                answers: answers.into_iter().collect::<BTreeMap<_, _>>(),
                vibe: vibe.into_iter().collect::<BTreeMap<_, _>>(),
                media_files: media,
            };

            let rt = Runtime::new()?;
            rt.block_on(generate(config, input))?;
        }
        Commands::Config { action } => match action {
            ConfigAction::Show { json } => {
                ConfigLoader::show_config(json)?;
            }
            ConfigAction::Path => {
                ConfigLoader::show_path();
            }
            ConfigAction::Init { force } => {
                let dir = ConfigLoader::init_global(force)?;
                println!("{} Initialized config in {}", style("✓").green(), dir.display());
            }
        },
    }

    Ok(())
}

async fn generate(config: Config, input: PipelineInput) -> anyhow::Result<()> {
    let provider = platogen::create_provider(&ProviderConfig::from(&config.llm))?;
    let orchestrator = PipelineOrchestrator::new(provider, &config);

    println!(
        "{} Generating site for {}",
        style("▸").cyan(),
        style(input.user_name()).bold()
    );

    let outcome = orchestrator.run(&input).await;

    // Degradation summary: which stages fell back and why is in the log
    let degraded = outcome.workspace.degraded_stages();
    if degraded.is_empty() {
        println!("{} All stages generated successfully", style("✓").green());
    } else {
        for stage in &degraded {
            println!(
                "{} Stage '{}' degraded to its fallback",
                style("⚠").yellow(),
                stage
            );
        }
    }
    for finding in &outcome.review.findings {
        println!(
            "{} [{}] {}: {}",
            style("ℹ").blue(),
            finding.severity,
            finding.owner,
            finding.message
        );
    }

    let artifact = outcome.workspace.artifact_html().unwrap_or_default();
    let materializer = DiskMaterializer::new(&config.site.output_dir);
    materializer.materialize(
        artifact,
        &outcome.workspace.structured_data(),
        &input.media_files,
    )?;

    println!(
        "{} Site written to {}",
        style("✓").green(),
        style(config.site.output_dir.display()).bold()
    );
    println!("  Run: cd {} && npm install && npm run dev", config.site.output_dir.display());

    Ok(())
}
