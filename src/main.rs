//! shipwright is a CLI tool that turns a live website or a design document into
//! ready-to-ship source files using an LLM model.
//!
//! The tool has four commands:
//! 1. `generate` - Runs the full pipeline and streams progress events to stdout
//! 2. `crawl` - Crawls a website and prints the extracted site facts
//! 3. `design` - Fetches a design document and prints the extracted design facts
//! 4. `parse` - Parses a saved model response into files

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use env_logger::Builder;
use llm::LLMProvider;
use llm::builder::{LLMBackend, LLMBuilder};
use log::{LevelFilter, info, warn};
use url::Url;

use shipwright::constants::{DEFAULT_MODEL, DESIGN_TOKEN_ENV_NAME, MODEL_API_KEY_ENV_NAME};
use shipwright::design::extract_document_key;
use shipwright::generate::rate_limiter;
use shipwright::materialize::write_artifacts;
use shipwright::progress::{self, ProgressEvent};
use shipwright::crawl::{crawl, normalize_root_url};
use shipwright::{
    DesignFetchError, DesignSource, GenerateContext, GenerateRequest, HttpDesignSource,
    HttpFetcher, Mode, PipelineConfig, Sources, extract_design, parse_files, pipeline,
};

/// Turn a website or a design document into source files
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// The command to execute
    #[command(subcommand)]
    command: Command,

    #[arg(long, short, action = clap::ArgAction::Count, help = "Output v(v...)erbosity: error (0), warn (1), info (2), debug (3), trace (4)", global = true, default_value_t = 2)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Command {
    /// Run the full generation pipeline and print progress events to stdout
    Generate {
        /// Website URL or design document URL/key
        source: Option<String>,
        /// Input mode: "url" (default) or "design"
        #[arg(long, default_value = "url")]
        mode: Mode,
        /// Project name used in generated files
        #[arg(long, short = 'n')]
        project: Option<String>,
        /// Design access token (falls back to SHIPWRIGHT_DESIGN_TOKEN)
        #[arg(long)]
        token: Option<String>,
        /// Path to a JSON request file `{mode, source, authToken?, projectName}`
        #[arg(long, conflicts_with = "source")]
        request: Option<PathBuf>,
        /// URL of the LLM model to use, as backend://model
        #[arg(long, short, default_value = DEFAULT_MODEL)]
        model: String,
        /// Directory to write the generated files to
        #[arg(long, short)]
        out: Option<PathBuf>,
        /// Maximum number of pages to crawl
        #[arg(long, default_value_t = 30)]
        max_pages: usize,
        /// Rate limit: requests per minute (default: no limit)
        #[arg(long, short = 'r')]
        rpm: Option<u32>,
        /// Deadline of one model call in seconds
        #[arg(long, default_value_t = 25)]
        call_timeout: u64,
        /// Pause between model calls in milliseconds
        #[arg(long, default_value_t = 800)]
        pacing: u64,
        /// First retry delay on rate limits in seconds; doubles on each retry
        #[arg(long, default_value_t = 8)]
        retry_base: u64,
        /// Token limit of each model response
        #[arg(long, default_value_t = 4096)]
        max_tokens: u32,
        /// Use a standard page structure when the site cannot be fetched
        #[arg(long)]
        hint_fallback: bool,
    },
    /// Crawl a website and print the extracted site facts as JSON
    Crawl {
        /// The website URL to crawl
        url: String,
        /// Maximum number of pages to crawl
        #[arg(long, default_value_t = 30)]
        max_pages: usize,
    },
    /// Fetch a design document and print the extracted design facts as JSON
    Design {
        /// Design document URL or key
        source: String,
        /// Design access token (falls back to SHIPWRIGHT_DESIGN_TOKEN)
        #[arg(long)]
        token: Option<String>,
    },
    /// Parse a saved model response into files
    Parse {
        /// Path to the response file
        file: PathBuf,
        /// Directory to write the parsed files to
        #[arg(long, short)]
        out: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    Builder::new()
        .filter_level(match cli.verbose {
            0 => LevelFilter::Error,
            1 => LevelFilter::Warn,
            2 => LevelFilter::Info,
            3 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        })
        .init();

    match cli.command {
        Command::Generate {
            source,
            mode,
            project,
            token,
            request,
            model,
            out,
            max_pages,
            rpm,
            call_timeout,
            pacing,
            retry_base,
            max_tokens,
            hint_fallback,
        } => {
            let request = match request {
                Some(path) => read_request(&path)?,
                None => GenerateRequest {
                    mode,
                    source: source.context("Specify a source or --request.")?,
                    auth_token: token,
                    project_name: project.unwrap_or_default(),
                },
            };

            let mut config = PipelineConfig {
                max_pages,
                max_tokens,
                hint_fallback,
                ..PipelineConfig::default()
            };
            config.retry.call_timeout = Duration::from_secs(call_timeout);
            config.retry.pacing = Duration::from_millis(pacing);
            config.retry.base_delay = Duration::from_secs(retry_base);

            handle_generate_command(request, &config, &model, rpm, out).await
        }
        Command::Crawl { url, max_pages } => handle_crawl_command(&url, max_pages).await,
        Command::Design { source, token } => handle_design_command(&source, token).await,
        Command::Parse { file, out } => handle_parse_command(&file, out),
    }
}

fn read_request(path: &Path) -> Result<GenerateRequest> {
    let content = fs::read_to_string(path)
        .context(format!("Failed to read request file: {}", path.display()))?;
    serde_json::from_str(&content).context(format!("Invalid request file: {}", path.display()))
}

fn design_token(token: Option<String>) -> Option<String> {
    token.or_else(|| std::env::var(DESIGN_TOKEN_ENV_NAME).ok())
}

fn build_model(model: &str, max_tokens: u32) -> Result<Box<dyn LLMProvider>> {
    let model_url = Url::parse(model).map_err(|e| anyhow::anyhow!("Invalid model URL: {}", e))?;
    let llm_builder = LLMBuilder::new()
        .backend(
            LLMBackend::from_str(model_url.scheme())
                .map_err(|e| anyhow::anyhow!("Invalid LLM backend: {}", e))?,
        )
        .model(
            [
                model_url
                    .host_str()
                    .context("Specify model name as host URL.")?,
                model_url.username(),
            ]
            .iter()
            .filter(|x| !x.is_empty())
            .cloned()
            .collect::<Vec<_>>()
            .join(":"),
        )
        .max_tokens(max_tokens);

    let llm_builder = match std::env::var(MODEL_API_KEY_ENV_NAME) {
        Ok(model_key) => {
            info!("Model API key is provided");
            llm_builder.api_key(model_key)
        }
        Err(err) => {
            warn!("{err} while reading {MODEL_API_KEY_ENV_NAME}");
            llm_builder
        }
    };

    llm_builder
        .build()
        .map_err(|e| anyhow::anyhow!("Failed to build LLM model: {}", e))
}

async fn handle_generate_command(
    mut request: GenerateRequest,
    config: &PipelineConfig,
    model: &str,
    rpm: Option<u32>,
    out: Option<PathBuf>,
) -> Result<()> {
    if request.auth_token.is_none() {
        request.auth_token = design_token(None);
    }

    let model = build_model(model, config.max_tokens)?;
    let limiter = rpm.and_then(rate_limiter);
    let ctx = GenerateContext {
        model: model.as_ref(),
        rate_limiter: limiter.as_ref(),
        policy: &config.retry,
    };
    let sources = Sources {
        pages: Arc::new(HttpFetcher::new(config.page_timeout)?),
        designs: Arc::new(HttpDesignSource::new(config.design_timeout)?),
    };

    let (sender, mut receiver) = progress::channel();
    let producer = pipeline::run(&request, config, &sources, &ctx, sender);
    let consumer = async {
        let mut files = None;
        let mut stdout = std::io::stdout();
        while let Some(event) = receiver.recv().await {
            if let Err(err) = stdout.write_all(event.to_line().as_bytes()) {
                warn!("Failed to write progress event: {err}");
            }
            if let ProgressEvent::Complete { files: generated } = event {
                files = Some(generated);
            }
        }
        files
    };

    let (outcome, files) = tokio::join!(producer, consumer);

    if let (Some(out), Some(files)) = (out, files) {
        write_artifacts(&out, &files)?;
    }

    outcome.map_err(anyhow::Error::from)
}

async fn handle_crawl_command(url: &str, max_pages: usize) -> Result<()> {
    let root = normalize_root_url(url)?;
    let fetcher = Arc::new(HttpFetcher::new(PipelineConfig::default().page_timeout)?);
    let facts = crawl(fetcher, &root, max_pages, None)
        .await
        .context(format!("Failed to crawl {root}"))?;

    println!("{}", serde_json::to_string_pretty(&facts)?);
    Ok(())
}

async fn handle_design_command(source: &str, token: Option<String>) -> Result<()> {
    let token = design_token(token)
        .context(format!("Specify --token or set {DESIGN_TOKEN_ENV_NAME}."))?;
    let key = extract_document_key(source)
        .context(DesignFetchError::MalformedKey.to_string())?;

    let designs = HttpDesignSource::new(PipelineConfig::default().design_timeout)?;
    let document = designs.fetch_document(&key, &token).await?;

    println!("{}", serde_json::to_string_pretty(&extract_design(&document))?);
    Ok(())
}

fn handle_parse_command(file: &Path, out: Option<PathBuf>) -> Result<()> {
    let response = fs::read_to_string(file)
        .context(format!("Failed to read response file: {}", file.display()))?;
    let files = parse_files(&response);

    for artifact in &files {
        println!("{} ({:?}, {})", artifact.name, artifact.kind(), artifact.display_size());
    }
    if let Some(out) = out {
        write_artifacts(&out, &files)?;
    }

    Ok(())
}
