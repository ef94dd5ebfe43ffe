//! CLI binary for lender-pdf-parse.
//!
//! Each subcommand starts one HTTP service. Flags map onto
//! `ServiceConfig`; every flag has an environment fallback and a `.env`
//! file in the working directory is loaded first.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use lender_pdf_parse::{
    csv_router, rent_roll_router, CsvState, PdfiumTableExtractor, ProviderTextGenerator,
    RentRollState, ServiceConfig, TableExtractor,
};
use std::io;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const AFTER_HELP: &str = r#"EXAMPLES:
  # Rent-roll service (JSON via the LLM)
  INTERNAL_TOKEN=s3cret OPENAI_API_KEY=sk-... lender-pdf-parse rent-roll --port 8000

  curl -X POST localhost:8000/extracttable \
       -H 'x-internal-token: s3cret' -H 'content-type: application/json' \
       -d '{"pdf_url": "https://example.com/rent-roll.pdf"}'

  # Table-to-CSV service
  lender-pdf-parse tables-csv --port 8001

  curl -X POST localhost:8001/extract-tables/ -F file=@statement.pdf -o tables.csv

ENVIRONMENT VARIABLES:
  INTERNAL_TOKEN        Shared secret expected in the x-internal-token header
  OPENAI_API_KEY        OpenAI API key (rent-roll service)
  LENDER_PDF_PROVIDER   LLM provider (default: openai)
  LENDER_PDF_MODEL      LLM model ID (default: gpt-3.5-turbo)
  PDFIUM_LIB_PATH       Path to libpdfium; otherwise ./ then the system library
  LENDER_PDF_VERBOSE    Enable DEBUG-level logs
  PORT                  Listening port
  RUST_LOG              Overrides the log filter entirely
"#;

/// Serve PDF table extraction over HTTP.
#[derive(Parser, Debug)]
#[command(
    name = "lender-pdf-parse",
    version,
    about = "Serve PDF table extraction as rent-roll JSON or CSV",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Path to the pdfium shared library.
    #[arg(long, global = true, env = "PDFIUM_LIB_PATH")]
    pdfium_lib_path: Option<PathBuf>,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true, env = "LENDER_PDF_VERBOSE")]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// POST /extracttable: fetch a PDF by URL and restructure its tables with an LLM.
    RentRoll(RentRollArgs),
    /// POST /extract-tables/: merge the tables of an uploaded PDF into tables.csv.
    TablesCsv(ListenArgs),
}

#[derive(Args, Debug)]
struct ListenArgs {
    /// Address to bind to.
    #[arg(long, default_value = "0.0.0.0")]
    host: String,

    /// Port to listen on.
    #[arg(short, long, env = "PORT", default_value_t = 8000)]
    port: u16,
}

#[derive(Args, Debug)]
struct RentRollArgs {
    #[command(flatten)]
    listen: ListenArgs,

    /// Shared secret callers must send in x-internal-token.
    #[arg(long, env = "INTERNAL_TOKEN", hide_env_values = true)]
    internal_token: Option<String>,

    /// OpenAI API key.
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    openai_api_key: Option<String>,

    /// LLM provider: openai, anthropic, gemini, ollama, ...
    #[arg(long, env = "LENDER_PDF_PROVIDER", default_value = "openai")]
    provider: String,

    /// LLM model ID.
    #[arg(long, env = "LENDER_PDF_MODEL", default_value = "gpt-3.5-turbo")]
    model: String,

    /// LLM temperature (0.0–2.0).
    #[arg(long, default_value_t = 0.1)]
    temperature: f32,

    /// Max LLM output tokens.
    #[arg(long, default_value_t = 4096)]
    max_tokens: usize,

    /// Extra attempts after a malformed model reply (0 to 10).
    #[arg(long, default_value_t = 0,
          value_parser = clap::value_parser!(u32).range(0..=10))]
    max_retries: u32,

    /// HTTP download timeout in seconds.
    #[arg(long, default_value_t = 120)]
    download_timeout: u64,
}

impl ListenArgs {
    fn addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("Invalid listen address {}:{}", self.host, self.port))
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    match cli.command {
        Command::RentRoll(args) => {
            let mut builder = ServiceConfig::builder()
                .internal_token_opt(args.internal_token)
                .openai_api_key_opt(args.openai_api_key)
                .provider_name(args.provider)
                .model(args.model)
                .temperature(args.temperature)
                .max_tokens(args.max_tokens)
                .max_retries(args.max_retries)
                .download_timeout_secs(args.download_timeout);
            if let Some(path) = cli.pdfium_lib_path {
                builder = builder.pdfium_library_path(path);
            }
            let config = builder.build().context("Invalid configuration")?;

            if config.internal_token.is_none() {
                warn!("INTERNAL_TOKEN is not set; every request will be answered with 500");
            }
            let extractor = pdfium_extractor(&config);
            let generator = ProviderTextGenerator::from_config(&config)
                .context("Failed to initialise the LLM provider")?;

            let addr = args.listen.addr()?;
            let app = rent_roll_router(RentRollState::new(
                config,
                extractor,
                Arc::new(generator),
            ));
            serve(addr, app, "POST /extracttable").await
        }
        Command::TablesCsv(listen) => {
            let mut builder = ServiceConfig::builder();
            if let Some(path) = cli.pdfium_lib_path {
                builder = builder.pdfium_library_path(path);
            }
            let config = builder.build().context("Invalid configuration")?;

            let addr = listen.addr()?;
            let app = csv_router(CsvState::new(pdfium_extractor(&config)));
            serve(addr, app, "POST /extract-tables/").await
        }
    }
}

/// Build the pdfium extractor and check once that the library binds.
fn pdfium_extractor(config: &ServiceConfig) -> Arc<dyn TableExtractor> {
    let extractor = PdfiumTableExtractor::from_config(config);
    if let Err(e) = extractor.bind() {
        warn!("{}", e);
    }
    Arc::new(extractor)
}

async fn serve(addr: SocketAddr, app: axum::Router, route: &str) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("Listening on http://{} ({})", addr, route);
    axum::serve(listener, app).await.context("Server error")?;
    Ok(())
}
