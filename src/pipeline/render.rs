//! PDF rasterisation: render every page to a JPEG via pdfium.
//!
//! pdfium wraps a C++ library with thread-local state, so rendering is a
//! blocking operation; the converter runs [`Rasterizer::rasterize`] inside
//! `spawn_blocking`. Binding happens per call, the same way the startup
//! probe binds, so a host without libpdfium gets a [`StageError`] instead
//! of a panic from `Pdfium::default()`.

use crate::config::Config;
use crate::error::StageError;
use crate::pipeline::encode::{encode_jpeg, PageImage};
use pdfium_render::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Converts PDF bytes into page images.
pub trait Rasterizer: Send + Sync {
    /// Render every page, in order. Blocking.
    fn rasterize(&self, pdf: &[u8]) -> Result<Vec<PageImage>, StageError>;
}

/// Bind to libpdfium, from an explicit library file when given, else from
/// the system search path.
pub fn bind_pdfium(lib_path: Option<&Path>) -> Result<Pdfium, StageError> {
    match lib_path {
        Some(path) => Pdfium::bind_to_library(path),
        None => Pdfium::bind_to_system_library(),
    }
    .map(Pdfium::new)
    .map_err(|e| StageError::PdfiumBinding(e.to_string()))
}

/// [`Rasterizer`] backed by pdfium-render.
#[derive(Debug, Clone)]
pub struct PdfiumRasterizer {
    lib_path: Option<PathBuf>,
    dpi: u32,
    max_pixels: u32,
}

impl PdfiumRasterizer {
    pub fn new(config: &Config) -> Self {
        Self {
            lib_path: config.pdfium_lib_path.clone(),
            dpi: config.dpi,
            max_pixels: config.max_rendered_pixels,
        }
    }

    fn render_config(&self) -> PdfRenderConfig {
        // PDF user space is 72 points per inch.
        let scale = self.dpi as f32 / 72.0;
        PdfRenderConfig::new()
            .scale_page_by_factor(scale)
            .set_maximum_width(self.max_pixels as i32)
            .set_maximum_height(self.max_pixels as i32)
    }
}

impl Rasterizer for PdfiumRasterizer {
    fn rasterize(&self, pdf: &[u8]) -> Result<Vec<PageImage>, StageError> {
        let pdfium = bind_pdfium(self.lib_path.as_deref())?;

        let document = pdfium
            .load_pdf_from_byte_slice(pdf, None)
            .map_err(|e| StageError::CorruptPdf(format!("{e:?}")))?;

        let render_config = self.render_config();
        let mut pages = Vec::new();

        for (idx, page) in document.pages().iter().enumerate() {
            let bitmap = page.render_with_config(&render_config).map_err(|e| {
                StageError::Rasterisation {
                    page: idx + 1,
                    detail: format!("{e:?}"),
                }
            })?;

            let image = bitmap.as_image();
            debug!(
                "Rendered page {} → {}x{} px",
                idx + 1,
                image.width(),
                image.height()
            );

            let encoded = encode_jpeg(&image).map_err(|e| StageError::Rasterisation {
                page: idx + 1,
                detail: format!("JPEG encoding failed: {e}"),
            })?;
            pages.push(encoded);
        }

        if pages.is_empty() {
            return Err(StageError::EmptyDocument);
        }

        info!("Rasterised {} pages at {} DPI", pages.len(), self.dpi);
        Ok(pages)
    }
}
