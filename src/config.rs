//! Service configuration.
//!
//! All extraction behaviour is controlled through [`Config`], built via its
//! [`ConfigBuilder`] or read from the process environment with
//! [`Config::from_env`]. The converter receives a `Config` at construction
//! time, so whether the hosted vision path is enabled is decided once, by
//! whoever builds the config, and never by reading the environment mid-request.

use crate::error::InvoiceError;
use std::fmt;
use std::path::{Path, PathBuf};

/// Invoice schema injected into the vision prompt when no schema file is configured.
pub const DEFAULT_SCHEMA: &str = include_str!("../schema/universal_schema.json");

/// Default Gemini REST endpoint.
pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com";

/// Default Gemini vision model.
pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";

/// Configuration for the invoice extraction pipeline.
///
/// # Example
/// ```rust
/// use invoice_vision::Config;
///
/// let config = Config::builder()
///     .dpi(200)
///     .api_key("test-key")
///     .preprocess(false)
///     .build()
///     .unwrap();
/// assert!(config.vision_enabled());
/// ```
#[derive(Clone)]
pub struct Config {
    /// Rendering DPI used when rasterising each PDF page. Range: 72–600. Default: 300.
    pub dpi: u32,

    /// Maximum rendered image dimension (width or height) in pixels. Default: 4000.
    ///
    /// A 300-DPI render of an A3 page is already ~3500 px tall; this cap keeps
    /// oversized posters from exhausting memory.
    pub max_rendered_pixels: u32,

    /// Gemini API key. `None` disables the vision path entirely.
    pub api_key: Option<String>,

    /// Base URL of the Gemini REST API. Default: [`DEFAULT_API_BASE`].
    pub api_base_url: String,

    /// Gemini model identifier. Default: [`DEFAULT_MODEL`].
    pub model: String,

    /// Timeout for the single vision call, in seconds. Default: 90.
    pub api_timeout_secs: u64,

    /// Invoice JSON schema text, injected verbatim into the prompt.
    pub schema: String,

    /// Run the grayscale/threshold/deskew pass before vision and OCR. Default: true.
    pub preprocess: bool,

    /// Scan images for QR codes. Default: true.
    pub barcodes: bool,

    /// Allow the local OCR / PDF text fallback. Default: true.
    pub local_fallback: bool,

    /// Path to the tesseract binary. Default: "tesseract" (relies on PATH).
    pub tesseract_path: String,

    /// Tesseract language code. Default: "eng".
    pub ocr_language: String,

    /// Path to the libpdfium shared library. `None` uses the system library search path.
    pub pdfium_lib_path: Option<PathBuf>,

    /// Maximum accepted upload size in bytes. Default: 25 MiB.
    pub max_upload_bytes: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            dpi: 300,
            max_rendered_pixels: 4000,
            api_key: None,
            api_base_url: DEFAULT_API_BASE.to_string(),
            model: DEFAULT_MODEL.to_string(),
            api_timeout_secs: 90,
            schema: DEFAULT_SCHEMA.to_string(),
            preprocess: true,
            barcodes: true,
            local_fallback: true,
            tesseract_path: "tesseract".to_string(),
            ocr_language: "eng".to_string(),
            pdfium_lib_path: None,
            max_upload_bytes: 25 * 1024 * 1024,
        }
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("dpi", &self.dpi)
            .field("max_rendered_pixels", &self.max_rendered_pixels)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("api_base_url", &self.api_base_url)
            .field("model", &self.model)
            .field("api_timeout_secs", &self.api_timeout_secs)
            .field("schema", &format_args!("<{} bytes>", self.schema.len()))
            .field("preprocess", &self.preprocess)
            .field("barcodes", &self.barcodes)
            .field("local_fallback", &self.local_fallback)
            .field("tesseract_path", &self.tesseract_path)
            .field("ocr_language", &self.ocr_language)
            .field("pdfium_lib_path", &self.pdfium_lib_path)
            .field("max_upload_bytes", &self.max_upload_bytes)
            .finish()
    }
}

impl Config {
    /// Create a new builder for `Config`.
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder {
            config: Self::default(),
        }
    }

    /// Build a configuration from environment variables.
    ///
    /// | Variable | Field |
    /// |----------|-------|
    /// | `GEMINI_API_KEY` | `api_key` (empty counts as unset) |
    /// | `GEMINI_MODEL` | `model` |
    /// | `GEMINI_API_BASE` | `api_base_url` |
    /// | `INVOICE_SCHEMA_PATH` | `schema` (file contents) |
    /// | `PDFIUM_LIB_PATH` | `pdfium_lib_path` |
    /// | `TESSERACT_PATH` | `tesseract_path` |
    pub fn from_env() -> Result<Self, InvoiceError> {
        let mut builder = Self::builder();

        if let Some(key) = non_empty_var("GEMINI_API_KEY") {
            builder = builder.api_key(key);
        }
        if let Some(model) = non_empty_var("GEMINI_MODEL") {
            builder = builder.model(model);
        }
        if let Some(base) = non_empty_var("GEMINI_API_BASE") {
            builder = builder.api_base_url(base);
        }
        if let Some(path) = non_empty_var("INVOICE_SCHEMA_PATH") {
            builder = builder.schema(load_schema(Path::new(&path))?);
        }
        if let Some(path) = non_empty_var("PDFIUM_LIB_PATH") {
            builder = builder.pdfium_lib_path(path);
        }
        if let Some(path) = non_empty_var("TESSERACT_PATH") {
            builder = builder.tesseract_path(path);
        }

        builder.build()
    }

    /// Whether the hosted vision path will be attempted.
    pub fn vision_enabled(&self) -> bool {
        self.api_key.as_deref().is_some_and(|k| !k.is_empty())
    }
}

/// Read a schema file, checking that it parses as JSON.
///
/// The text itself is kept verbatim; parsing only guards against pointing
/// the service at the wrong file.
pub fn load_schema(path: &Path) -> Result<String, InvoiceError> {
    let text = std::fs::read_to_string(path).map_err(|e| InvoiceError::SchemaUnreadable {
        path: path.to_path_buf(),
        source: e,
    })?;
    serde_json::from_str::<serde_json::Value>(&text).map_err(|e| InvoiceError::SchemaInvalid {
        path: path.to_path_buf(),
        detail: e.to_string(),
    })?;
    Ok(text)
}

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// Builder for [`Config`].
#[derive(Debug)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    pub fn dpi(mut self, dpi: u32) -> Self {
        self.config.dpi = dpi.clamp(72, 600);
        self
    }

    pub fn max_rendered_pixels(mut self, px: u32) -> Self {
        self.config.max_rendered_pixels = px.max(100);
        self
    }

    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.config.api_key = Some(key.into());
        self
    }

    pub fn api_base_url(mut self, url: impl Into<String>) -> Self {
        self.config.api_base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = secs;
        self
    }

    pub fn schema(mut self, schema: impl Into<String>) -> Self {
        self.config.schema = schema.into();
        self
    }

    pub fn preprocess(mut self, v: bool) -> Self {
        self.config.preprocess = v;
        self
    }

    pub fn barcodes(mut self, v: bool) -> Self {
        self.config.barcodes = v;
        self
    }

    pub fn local_fallback(mut self, v: bool) -> Self {
        self.config.local_fallback = v;
        self
    }

    pub fn tesseract_path(mut self, path: impl Into<String>) -> Self {
        self.config.tesseract_path = path.into();
        self
    }

    pub fn ocr_language(mut self, lang: impl Into<String>) -> Self {
        self.config.ocr_language = lang.into();
        self
    }

    pub fn pdfium_lib_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.pdfium_lib_path = Some(path.into());
        self
    }

    pub fn max_upload_bytes(mut self, n: usize) -> Self {
        self.config.max_upload_bytes = n;
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<Config, InvoiceError> {
        let c = &self.config;
        if c.dpi < 72 || c.dpi > 600 {
            return Err(InvoiceError::InvalidConfig(format!(
                "DPI must be 72–600, got {}",
                c.dpi
            )));
        }
        if c.api_timeout_secs == 0 {
            return Err(InvoiceError::InvalidConfig(
                "API timeout must be ≥ 1 second".into(),
            ));
        }
        if c.schema.trim().is_empty() {
            return Err(InvoiceError::InvalidConfig(
                "Invoice schema must not be empty".into(),
            ));
        }
        if c.model.trim().is_empty() {
            return Err(InvoiceError::InvalidConfig("Model must not be empty".into()));
        }
        if c.max_upload_bytes == 0 {
            return Err(InvoiceError::InvalidConfig(
                "Upload limit must be ≥ 1 byte".into(),
            ));
        }
        Ok(self.config)
    }
}
