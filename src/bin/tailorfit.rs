//! HTTP server binary for tailorfit.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `ServiceConfig` and serves the router.

use anyhow::{Context, Result};
use clap::Parser;
use std::io;
use std::net::SocketAddr;
use std::path::PathBuf;
use tailorfit::{http, PatternService, ResponseStrategy, ServiceConfig};
use tracing::info;
use tracing_subscriber::EnvFilter;

const AFTER_HELP: &str = r#"EXAMPLES:
  # Serve on the default address with provider auto-detection
  tailorfit

  # Pick a model and a different port
  tailorfit --bind 0.0.0.0:8080 --model gpt-4o --provider openai

  # Ask for JSON answers instead of key = value lines
  tailorfit --response-strategy structured

ENVIRONMENT VARIABLES:
  OPENAI_API_KEY          OpenAI API key
  ANTHROPIC_API_KEY       Anthropic API key
  GEMINI_API_KEY          Google Gemini API key
  EDGEQUAKE_LLM_PROVIDER  Override provider (openai, anthropic, gemini, ollama)
  EDGEQUAKE_MODEL         Override model ID
  PDFIUM_LIB_PATH         Path to libpdfium (PDF uploads only)
  RUST_LOG                Log filter, e.g. tailorfit=debug

Uploaded and scaled files are kept under --output-dir, one directory per
request. Nothing is deleted automatically.
"#;

/// Resize sewing patterns to body measurements.
#[derive(Parser, Debug)]
#[command(
    name = "tailorfit",
    version,
    about = "Web service that rescales SVG/PDF sewing patterns to body measurements",
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Address to listen on.
    #[arg(long, env = "TAILORFIT_BIND", default_value = "127.0.0.1:5000")]
    bind: SocketAddr,

    /// Root directory for per-request job directories.
    #[arg(long, env = "TAILORFIT_OUTPUT_DIR", default_value = "output")]
    output_dir: PathBuf,

    /// LLM model ID (default: gpt-4o-mini).
    #[arg(long, env = "EDGEQUAKE_MODEL")]
    model: Option<String>,

    /// LLM provider: openai, anthropic, gemini, ollama, azure.
    #[arg(long, env = "EDGEQUAKE_PROVIDER")]
    provider: Option<String>,

    /// PDF rasterisation DPI (72–600).
    #[arg(long, env = "TAILORFIT_DPI", default_value_t = 300,
          value_parser = clap::value_parser!(u32).range(72..=600))]
    dpi: u32,

    /// LLM temperature (0.0–2.0).
    #[arg(long, env = "TAILORFIT_TEMPERATURE", default_value_t = 0.3)]
    temperature: f32,

    /// Retries after a failed completion.
    #[arg(long, env = "TAILORFIT_MAX_RETRIES", default_value_t = 1)]
    max_retries: u32,

    /// Per-attempt completion timeout in seconds.
    #[arg(long, env = "TAILORFIT_API_TIMEOUT", default_value_t = 60)]
    api_timeout: u64,

    /// How the estimator answers: lines or structured.
    #[arg(long, env = "TAILORFIT_RESPONSE_STRATEGY", value_enum, default_value = "lines")]
    response_strategy: StrategyArg,

    /// Skip the sewing-instructions call.
    #[arg(long, env = "TAILORFIT_NO_INSTRUCTIONS")]
    no_instructions: bool,

    /// Largest accepted upload, in MiB.
    #[arg(long, env = "TAILORFIT_MAX_UPLOAD_MB", default_value_t = 25)]
    max_upload_mb: usize,

    /// Path to libpdfium; the system library is used when unset.
    #[arg(long, env = "PDFIUM_LIB_PATH")]
    pdfium_lib: Option<PathBuf>,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "TAILORFIT_VERBOSE")]
    verbose: bool,
}

#[derive(clap::ValueEnum, Clone, Debug)]
enum StrategyArg {
    Lines,
    Structured,
}

impl From<StrategyArg> for ResponseStrategy {
    fn from(v: StrategyArg) -> Self {
        match v {
            StrategyArg::Lines => ResponseStrategy::TolerantScan,
            StrategyArg::Structured => ResponseStrategy::Structured,
        }
    }
}

fn build_config(cli: &Cli) -> Result<ServiceConfig> {
    let mut builder = ServiceConfig::builder()
        .dpi(cli.dpi)
        .temperature(cli.temperature)
        .max_retries(cli.max_retries)
        .api_timeout_secs(cli.api_timeout)
        .response_strategy(cli.response_strategy.clone().into())
        .include_instructions(!cli.no_instructions)
        .max_upload_bytes(cli.max_upload_mb.saturating_mul(1024 * 1024))
        .output_dir(&cli.output_dir);

    if let Some(ref model) = cli.model {
        builder = builder.model(model);
    }
    if let Some(ref provider) = cli.provider {
        builder = builder.provider_name(provider);
    }
    if let Some(ref lib) = cli.pdfium_lib {
        builder = builder.pdfium_lib_path(lib);
    }

    builder.build().context("Invalid configuration")
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    let config = build_config(&cli)?;
    std::fs::create_dir_all(&config.output_dir).with_context(|| {
        format!(
            "Failed to create output directory {}",
            config.output_dir.display()
        )
    })?;

    let service =
        PatternService::from_config(config).context("Failed to configure the LLM provider")?;
    let app = http::router(service);

    let listener = tokio::net::TcpListener::bind(cli.bind)
        .await
        .with_context(|| format!("Failed to bind {}", cli.bind))?;
    info!("Listening on http://{}", cli.bind);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;
    Ok(())
}

async fn shutdown_signal() {
    // Ctrl-C only; a failed handler install just means no graceful stop.
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("Shutting down");
    }
}
