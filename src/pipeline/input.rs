//! Input classification: decide whether an upload is a PDF or an image.
//!
//! Only the file name matters. Anything that does not end in `.pdf`
//! (case-insensitive) is handed to the image path as-is; if it turns out not
//! to be an image, the decoders downstream simply find nothing in it.

use std::path::Path;

/// What kind of document an upload is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Pdf,
    Image,
}

impl DocumentKind {
    pub fn as_str(self) -> &'static str {
        match self {
            DocumentKind::Pdf => "pdf",
            DocumentKind::Image => "image",
        }
    }
}

/// Classify an upload by its file name extension.
pub fn detect_kind(filename: &str) -> DocumentKind {
    let is_pdf = Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"));
    if is_pdf {
        DocumentKind::Pdf
    } else {
        DocumentKind::Image
    }
}

/// The extension of `filename` without the dot, or an empty string.
pub fn extension(filename: &str) -> String {
    Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_string)
        .unwrap_or_default()
}
