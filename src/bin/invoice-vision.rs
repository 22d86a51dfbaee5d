//! CLI binary for invoice-vision.
//!
//! `serve` runs the HTTP API; `convert` runs one file through the same
//! pipeline and prints the record.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use invoice_vision::config::load_schema;
use invoice_vision::{server, Config, InvoiceConverter};
use std::io::{self, Write};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

const AFTER_HELP: &str = r#"EXAMPLES:
  # Run the API on port 8000
  invoice-vision serve

  # Extract one invoice to stdout
  invoice-vision convert scan.pdf

  # Local OCR only, no hosted model
  GEMINI_API_KEY= invoice-vision convert photo.jpg

  # SAP upload payload written to a file
  invoice-vision convert --sap invoice.pdf -o payload.json

ENVIRONMENT VARIABLES:
  GEMINI_API_KEY          Gemini API key; unset disables the vision path
  GEMINI_MODEL            Override model ID (default gemini-1.5-flash)
  GEMINI_API_BASE         Override the API base URL
  INVOICE_SCHEMA_PATH     JSON schema injected into the prompt
  PDFIUM_LIB_PATH         Path to the libpdfium shared library
  TESSERACT_PATH          tesseract binary for local OCR
  INVOICE_ADDR            Listen address for `serve`

A .env file in the working directory is loaded first."#;

/// Extract structured invoice JSON from PDFs and images.
#[derive(Parser, Debug)]
#[command(
    name = "invoice-vision",
    version,
    about = "Extract structured invoice JSON from PDFs and images",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Rendering DPI for PDF pages (72–600).
    #[arg(long, global = true, env = "INVOICE_DPI",
          value_parser = clap::value_parser!(u32).range(72..=600))]
    dpi: Option<u32>,

    /// Gemini model ID.
    #[arg(long, global = true)]
    model: Option<String>,

    /// JSON schema file injected into the prompt.
    #[arg(long, global = true)]
    schema: Option<PathBuf>,

    /// Vision call timeout in seconds.
    #[arg(long, global = true, env = "INVOICE_API_TIMEOUT")]
    api_timeout: Option<u64>,

    /// Skip grayscale/denoise/threshold/deskew.
    #[arg(long, global = true)]
    no_preprocess: bool,

    /// Skip QR code scanning.
    #[arg(long, global = true)]
    no_barcodes: bool,

    /// Never fall back to tesseract or the PDF text layer.
    #[arg(long, global = true)]
    no_local_fallback: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true, env = "INVOICE_VERBOSE")]
    verbose: bool,

    /// Suppress all logs except errors.
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP API.
    Serve {
        /// Listen address.
        #[arg(long, env = "INVOICE_ADDR", default_value = "0.0.0.0:8000")]
        addr: SocketAddr,

        /// Maximum upload size in MiB.
        #[arg(long, env = "INVOICE_MAX_UPLOAD_MB", default_value_t = 25)]
        max_upload_mb: usize,
    },
    /// Convert one file and print the record as JSON.
    Convert {
        /// PDF or image file.
        input: PathBuf,

        /// Write JSON to this file instead of stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Emit the SAP upload payload instead of the bare record.
        #[arg(long)]
        sap: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    let mut config = build_config(&cli)?;

    match cli.command {
        Command::Serve {
            addr,
            max_upload_mb,
        } => {
            config.max_upload_bytes = max_upload_mb.max(1) * 1024 * 1024;
            let converter =
                Arc::new(InvoiceConverter::new(config).context("Failed to build converter")?);
            server::serve(addr, converter, shutdown_signal())
                .await
                .with_context(|| format!("Server on {addr} failed"))?;
            info!("Server stopped");
        }
        Command::Convert { input, output, sap } => {
            let converter = InvoiceConverter::new(config).context("Failed to build converter")?;
            let json = if sap {
                let bytes = tokio::fs::read(&input)
                    .await
                    .with_context(|| format!("Failed to read {}", input.display()))?;
                let name = input.to_string_lossy().into_owned();
                let payload = converter.convert_for_sap(&name, bytes).await;
                serde_json::to_string_pretty(&payload)
            } else {
                let record = converter
                    .convert_file(&input)
                    .await
                    .with_context(|| format!("Failed to convert {}", input.display()))?;
                serde_json::to_string_pretty(&record)
            }
            .context("Failed to serialize result")?;

            match output {
                Some(path) => std::fs::write(&path, json + "\n")
                    .with_context(|| format!("Failed to write {}", path.display()))?,
                None => {
                    let mut stdout = io::stdout().lock();
                    writeln!(stdout, "{json}").context("Failed to write to stdout")?;
                }
            }
        }
    }

    Ok(())
}

/// Environment first, then command-line overrides.
fn build_config(cli: &Cli) -> Result<Config> {
    let mut config = Config::from_env().context("Invalid configuration in environment")?;

    if let Some(dpi) = cli.dpi {
        config.dpi = dpi;
    }
    if let Some(ref model) = cli.model {
        config.model = model.clone();
    }
    if let Some(ref path) = cli.schema {
        config.schema = load_schema(path)?;
    }
    if let Some(secs) = cli.api_timeout {
        config.api_timeout_secs = secs.max(1);
    }
    if cli.no_preprocess {
        config.preprocess = false;
    }
    if cli.no_barcodes {
        config.barcodes = false;
    }
    if cli.no_local_fallback {
        config.local_fallback = false;
    }

    Ok(config)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutting down");
}
