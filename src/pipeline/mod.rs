//! Pipeline stages for invoice extraction.
//!
//! Each submodule implements exactly one step and, where a third-party
//! collaborator sits behind it, a small trait so the converter can be
//! driven with fakes in tests.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ render ──▶ barcode ──▶ preprocess ──▶ vision ──▶ fallback
//! (kind)    (pdfium)   (rqrr)      (image)        (Gemini)   (tesseract / pdf-extract)
//! ```
//!
//! 1. [`input`]      — decide PDF vs. image from the file name
//! 2. [`render`]     — rasterise PDF pages to JPEG; blocking, pdfium is not async-safe
//! 3. [`encode`]     — MIME sniffing, JPEG and base64 encoding
//! 4. [`barcode`]    — best-effort QR scanning, never fails the request
//! 5. [`preprocess`] — grayscale/denoise/threshold/deskew, never fails the request
//! 6. [`vision`]     — the single network call to the hosted model
//! 7. [`postprocess`] — strip code fences from the model's reply
//! 8. [`fallback`]   — local OCR or PDF text parsing when vision is unavailable

pub mod barcode;
pub mod encode;
pub mod fallback;
pub mod input;
pub mod postprocess;
pub mod preprocess;
pub mod render;
pub mod vision;
