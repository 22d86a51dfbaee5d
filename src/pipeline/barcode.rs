//! Best-effort QR code extraction.
//!
//! A failed or panicking scan must never cost the caller their invoice, so
//! [`scan_all`] collapses every failure into an empty list and only logs it.

use crate::error::StageError;
use crate::pipeline::encode::PageImage;
use crate::record::Code;
use std::sync::Arc;
use tracing::{debug, warn};

/// Finds codes in one encoded image.
pub trait BarcodeScanner: Send + Sync {
    /// Scan one image. Blocking.
    ///
    /// Undecodable images yield `Ok(vec![])`; `Err` means the scanner itself broke.
    fn scan(&self, image: &[u8]) -> Result<Vec<Code>, StageError>;
}

/// [`BarcodeScanner`] backed by rqrr.
#[derive(Debug, Clone, Copy, Default)]
pub struct QrScanner;

impl BarcodeScanner for QrScanner {
    fn scan(&self, image: &[u8]) -> Result<Vec<Code>, StageError> {
        let gray = match image::load_from_memory(image) {
            Ok(img) => img.to_luma8(),
            Err(e) => {
                debug!("QR scan skipped, image not decodable: {}", e);
                return Ok(Vec::new());
            }
        };

        let (w, h) = gray.dimensions();
        let mut prepared = rqrr::PreparedImage::prepare_from_greyscale(
            w as usize,
            h as usize,
            |x, y| gray.get_pixel(x as u32, y as u32)[0],
        );

        let mut codes = Vec::new();
        for grid in prepared.detect_grids() {
            match grid.decode() {
                Ok((_meta, content)) if !content.is_empty() => codes.push(Code::qr(content)),
                Ok(_) => {}
                Err(e) => debug!("QR grid found but not decodable: {:?}", e),
            }
        }
        Ok(codes)
    }
}

/// Scan every page, in order, off the async runtime.
///
/// Any error or panic yields an empty list.
pub async fn scan_all(scanner: Arc<dyn BarcodeScanner>, pages: &[PageImage]) -> Vec<Code> {
    let images: Vec<Vec<u8>> = pages.iter().map(|p| p.bytes.clone()).collect();

    let joined = tokio::task::spawn_blocking(move || {
        let mut codes = Vec::new();
        for image in &images {
            codes.extend(scanner.scan(image)?);
        }
        Ok::<_, StageError>(codes)
    })
    .await;

    match joined {
        Ok(Ok(codes)) => {
            debug!("Barcode scan found {} codes", codes.len());
            codes
        }
        Ok(Err(e)) => {
            warn!("Barcode scan failed, continuing without codes: {}", e);
            Vec::new()
        }
        Err(e) => {
            warn!("Barcode scan task failed, continuing without codes: {}", e);
            Vec::new()
        }
    }
}
