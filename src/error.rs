//! Error types for the invoice-vision library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`InvoiceError`] — **Fatal**: no invoice record can be produced at all
//!   (bad configuration, schema file missing, input file unreadable).
//!   Returned from config loading, converter construction and
//!   `convert_file`.
//!
//! * [`StageError`] — **Non-fatal**: one collaborator failed (pdfium could
//!   not render, tesseract is missing, pdf-extract choked). The converter
//!   logs it and moves on to the next fallback, so it never reaches the
//!   caller directly.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the invoice-vision library.
#[derive(Debug, Error)]
pub enum InvoiceError {
    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The invoice schema file could not be read.
    #[error("Failed to read invoice schema '{path}': {source}")]
    SchemaUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The invoice schema file is not valid JSON.
    #[error("Invoice schema '{path}' is not valid JSON: {detail}")]
    SchemaInvalid { path: PathBuf, detail: String },

    /// The HTTP client for the vision endpoint could not be built.
    #[error("Failed to build HTTP client: {0}")]
    HttpClient(String),

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Reading an input file for one-shot conversion failed.
    #[error("Failed to read input file '{path}': {source}")]
    InputUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// A non-fatal failure of a single pipeline collaborator.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StageError {
    /// The collaborator was not detected at startup.
    #[error("{0} is not available on this host")]
    Unavailable(&'static str),

    /// pdfium could not be bound.
    #[error("Failed to bind to pdfium library: {0}")]
    PdfiumBinding(String),

    /// The PDF could not be opened.
    #[error("PDF could not be loaded: {0}")]
    CorruptPdf(String),

    /// pdfium returned an error for a specific page.
    #[error("Rasterisation failed for page {page}: {detail}")]
    Rasterisation { page: usize, detail: String },

    /// The document has no pages to render.
    #[error("PDF has no pages")]
    EmptyDocument,

    /// The local OCR engine failed.
    #[error("OCR failed: {0}")]
    Ocr(String),

    /// The local PDF text parser failed.
    #[error("PDF text extraction failed: {0}")]
    PdfText(String),

    /// A temporary file could not be created or written.
    #[error("Temporary file error: {0}")]
    TempFile(String),

    /// A blocking task panicked or was cancelled.
    #[error("Blocking task failed: {0}")]
    Join(String),
}

impl From<tokio::task::JoinError> for StageError {
    fn from(e: tokio::task::JoinError) -> Self {
        StageError::Join(e.to_string())
    }
}
