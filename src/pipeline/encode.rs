//! Image encoding: page images as the vision endpoint wants them.
//!
//! Rendered PDF pages are sent as JPEG, which keeps a 300-DPI multi-page
//! request well under the inline payload limit. Uploaded images are sent
//! with whatever format their magic bytes announce.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::{DynamicImage, ImageFormat};
use std::io::Cursor;
use tracing::debug;

/// One page image, encoded, with its MIME type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageImage {
    pub bytes: Vec<u8>,
    pub mime_type: &'static str,
}

impl PageImage {
    /// Wrap already-encoded bytes, sniffing the MIME type.
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        let mime_type = sniff_mime(&bytes);
        Self { bytes, mime_type }
    }

    /// Base64 payload for an `inlineData` part.
    pub fn to_base64(&self) -> String {
        STANDARD.encode(&self.bytes)
    }
}

/// MIME type from magic bytes; unknown data is labelled `image/jpeg`.
pub fn sniff_mime(bytes: &[u8]) -> &'static str {
    match image::guess_format(bytes) {
        Ok(ImageFormat::Png) => "image/png",
        Ok(ImageFormat::Jpeg) => "image/jpeg",
        Ok(ImageFormat::WebP) => "image/webp",
        Ok(ImageFormat::Gif) => "image/gif",
        Ok(ImageFormat::Tiff) => "image/tiff",
        Ok(ImageFormat::Bmp) => "image/bmp",
        _ => "image/jpeg",
    }
}

/// Encode a rasterised page as JPEG.
///
/// JPEG has no alpha channel, so the page is flattened to RGB first.
pub fn encode_jpeg(img: &DynamicImage) -> Result<PageImage, image::ImageError> {
    let rgb = DynamicImage::ImageRgb8(img.to_rgb8());
    let mut buf = Vec::new();
    rgb.write_to(&mut Cursor::new(&mut buf), ImageFormat::Jpeg)?;
    debug!("Encoded page → {} bytes JPEG", buf.len());
    Ok(PageImage {
        bytes: buf,
        mime_type: "image/jpeg",
    })
}

/// Encode a grayscale image as PNG.
pub fn encode_png(img: &DynamicImage) -> Result<Vec<u8>, image::ImageError> {
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)?;
    Ok(buf)
}
