//! Which optional collaborators this host actually has.
//!
//! Probed once at startup. The converter checks these flags before each
//! path, so a missing native library becomes a skipped stage instead of a
//! failed request.

use crate::config::Config;
use crate::pipeline::fallback::is_tesseract_available;
use crate::pipeline::render::bind_pdfium;
use serde::Serialize;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Capabilities {
    /// libpdfium could be bound.
    pub pdf_rasterizer: bool,
    /// The tesseract binary runs.
    pub local_ocr: bool,
    /// PDF text-layer parsing (pure Rust).
    pub local_pdf_text: bool,
    /// QR scanning (pure Rust).
    pub barcode_scanner: bool,
    /// An API key is configured.
    pub vision: bool,
}

impl Capabilities {
    /// Probe the host according to `config`.
    pub fn probe(config: &Config) -> Self {
        let pdf_rasterizer = match bind_pdfium(config.pdfium_lib_path.as_deref()) {
            Ok(_) => true,
            Err(e) => {
                warn!("PDF rasterisation unavailable: {}", e);
                false
            }
        };

        let local_ocr = config.local_fallback && is_tesseract_available(&config.tesseract_path);
        if config.local_fallback && !local_ocr {
            warn!(
                "Local OCR unavailable: '{}' --version failed",
                config.tesseract_path
            );
        }

        let caps = Self {
            pdf_rasterizer,
            local_ocr,
            local_pdf_text: config.local_fallback,
            barcode_scanner: config.barcodes,
            vision: config.vision_enabled(),
        };
        info!(
            "Capabilities: pdf_rasterizer={} local_ocr={} local_pdf_text={} barcode_scanner={} vision={}",
            caps.pdf_rasterizer,
            caps.local_ocr,
            caps.local_pdf_text,
            caps.barcode_scanner,
            caps.vision
        );
        caps
    }

    /// Everything on. Useful with fake collaborators.
    pub fn all() -> Self {
        Self {
            pdf_rasterizer: true,
            local_ocr: true,
            local_pdf_text: true,
            barcode_scanner: true,
            vision: true,
        }
    }

    /// Everything off.
    pub fn none() -> Self {
        Self {
            pdf_rasterizer: false,
            local_ocr: false,
            local_pdf_text: false,
            barcode_scanner: false,
            vision: false,
        }
    }
}
