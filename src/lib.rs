//! # invoice-vision
//!
//! Extract structured invoice JSON from PDFs and images with a hosted
//! vision model, falling back to local OCR when the model is unavailable.
//!
//! ## Pipeline Overview
//!
//! ```text
//! upload (PDF or image)
//!  │
//!  ├─ 1. Input       classify by file name
//!  ├─ 2. Render      rasterise PDF pages via pdfium (spawn_blocking)
//!  ├─ 3. Barcodes    best-effort QR scan of the original pages
//!  ├─ 4. Preprocess  grayscale, denoise, threshold, deskew
//!  ├─ 5. Vision      one Gemini generateContent call with the schema prompt
//!  ├─ 6. Fallback    tesseract / PDF text layer when vision fails
//!  └─ 7. Normalize   one JSON object with `status` and `codes`
//! ```
//!
//! Every stage failure, a missing API key included, degrades to a
//! `NEEDS_REVIEW` record. The caller always gets JSON back.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use invoice_vision::{Config, InvoiceConverter};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::from_env()?;
//!     let converter = InvoiceConverter::new(config)?;
//!     let record = converter
//!         .convert_file(std::path::Path::new("invoice.pdf"))
//!         .await?;
//!     println!("{}", serde_json::to_string_pretty(&record)?);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `invoice-vision` binary (clap + anyhow + dotenvy + tracing-subscriber) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod attachment;
pub mod capabilities;
pub mod config;
pub mod convert;
pub mod error;
pub mod pipeline;
pub mod prompts;
pub mod record;
pub mod server;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use attachment::{prepare_sap_payload, Attachment, SapPayload};
pub use capabilities::Capabilities;
pub use config::{Config, ConfigBuilder};
pub use convert::{ConverterBuilder, InvoiceConverter};
pub use error::{InvoiceError, StageError};
pub use record::{Code, CodeKind, Failure, InvoiceRecord, Status, VisionOutcome};
pub use server::router;
