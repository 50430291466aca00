use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use larder_core::schema::{strict_schema, PageCandidate, TextCandidate};
use larder_core::{ExtractionResult, Extractor, ExtractorConfig, RecipeSource};

#[derive(Parser)]
#[command(name = "larder")]
#[command(about = "Extract structured recipes from text, web pages and photos", long_about = None)]
struct Cli {
    /// Answer from the AI response cache only; never call the API
    #[arg(long, global = true)]
    offline: bool,

    /// Bound on one model call, in seconds (default: 60)
    #[arg(long, global = true)]
    ai_timeout_secs: Option<u64>,

    /// Bound on one page fetch, in seconds (default: 15)
    #[arg(long, global = true)]
    fetch_timeout_secs: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract a recipe from pasted text
    Text {
        /// File holding the text, or "-" for stdin
        file: PathBuf,
    },
    /// Extract a recipe from a public web page
    Url {
        url: String,
    },
    /// Extract a recipe from one or more photos of it
    Photos {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Print the strict output schema sent to the model
    Schema {
        #[arg(value_enum)]
        kind: SchemaKind,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum SchemaKind {
    Text,
    Page,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let source = match &cli.command {
        Commands::Schema { kind } => {
            let schema = match kind {
                SchemaKind::Text => strict_schema::<TextCandidate>(),
                SchemaKind::Page => strict_schema::<PageCandidate>(),
            };
            println!("{}", serde_json::to_string_pretty(&schema)?);
            return Ok(ExitCode::SUCCESS);
        }
        Commands::Text { file } => RecipeSource::Text(read_text(file)?),
        Commands::Url { url } => RecipeSource::Url(url.clone()),
        Commands::Photos { files } => {
            let mut photos = Vec::with_capacity(files.len());
            for path in files {
                let bytes = tokio::fs::read(path)
                    .await
                    .with_context(|| format!("Failed to read {}", path.display()))?;
                photos.push(bytes);
            }
            RecipeSource::Photos(photos)
        }
    };

    let extractor = build_extractor(&cli)?;
    let result = extractor.extract(source).await;

    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(exit_code(&result))
}

fn read_text(path: &Path) -> Result<String> {
    if path.as_os_str() == "-" {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .context("Failed to read stdin")?;
        return Ok(text);
    }
    std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

/// 0 for a recipe, 2 for a partial one that needs review, 1 otherwise.
fn exit_code(result: &ExtractionResult) -> ExitCode {
    match result {
        ExtractionResult::Success { .. } => ExitCode::SUCCESS,
        ExtractionResult::Incomplete { .. } => ExitCode::from(2),
        ExtractionResult::Failure { .. } => ExitCode::FAILURE,
    }
}

fn build_extractor(cli: &Cli) -> Result<Extractor> {
    let mut config = ExtractorConfig::from_env();
    if let Some(secs) = cli.ai_timeout_secs {
        config.ai_timeout = Duration::from_secs(secs);
    }
    if let Some(secs) = cli.fetch_timeout_secs {
        config.fetch_timeout = Duration::from_secs(secs);
    }

    tracing::debug!(
        ai_timeout_secs = config.ai_timeout.as_secs(),
        fetch_timeout_secs = config.fetch_timeout.as_secs(),
        offline = cli.offline,
        "building extractor"
    );
    Ok(Extractor::from_env(config, cli.offline)?)
}
