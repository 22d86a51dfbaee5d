//! Local extraction when the hosted vision path is unavailable or fails.
//!
//! Two engines: the tesseract CLI for images and `pdf-extract` for PDFs with
//! a text layer. Both only recover raw text, so the record they produce is
//! always `NEEDS_REVIEW`; a few regex heuristics pull out the fields a
//! reviewer looks at first.

use crate::error::StageError;
use crate::pipeline::encode::sniff_mime;
use crate::record::{reason, InvoiceRecord, Status};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use std::io::Write;
use std::process::Command;
use tracing::debug;

/// Text recovery without the network.
pub trait LocalEngine: Send + Sync {
    /// OCR one encoded image. Blocking.
    fn ocr_image(&self, image: &[u8]) -> Result<String, StageError>;

    /// Extract the text layer of a PDF, one string per non-blank page. Blocking.
    fn parse_pdf(&self, pdf: &[u8]) -> Result<Vec<String>, StageError>;
}

/// [`LocalEngine`] using the tesseract binary and `pdf-extract`.
#[derive(Debug, Clone)]
pub struct LocalExtractor {
    tesseract_path: String,
    language: String,
}

impl LocalExtractor {
    pub fn new(tesseract_path: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            tesseract_path: tesseract_path.into(),
            language: language.into(),
        }
    }
}

impl LocalEngine for LocalExtractor {
    fn ocr_image(&self, image: &[u8]) -> Result<String, StageError> {
        // tesseract picks its decoder from the file extension.
        let suffix = match sniff_mime(image) {
            "image/png" => ".png",
            "image/tiff" => ".tif",
            "image/bmp" => ".bmp",
            "image/gif" => ".gif",
            "image/webp" => ".webp",
            _ => ".jpg",
        };
        let mut file = tempfile::Builder::new()
            .prefix("invoice-ocr-")
            .suffix(suffix)
            .tempfile()
            .map_err(|e| StageError::TempFile(e.to_string()))?;
        file.write_all(image)
            .map_err(|e| StageError::TempFile(e.to_string()))?;
        file.flush()
            .map_err(|e| StageError::TempFile(e.to_string()))?;

        let output = Command::new(&self.tesseract_path)
            .arg(file.path())
            .arg("stdout")
            .arg("-l")
            .arg(&self.language)
            .output()
            .map_err(|e| {
                StageError::Ocr(format!(
                    "could not run '{}': {}",
                    self.tesseract_path, e
                ))
            })?;

        if !output.status.success() {
            return Err(StageError::Ocr(format!(
                "exit code {}: {}",
                output.status.code().unwrap_or(-1),
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        let text = String::from_utf8_lossy(&output.stdout).trim().to_string();
        debug!("tesseract recovered {} chars", text.len());
        Ok(text)
    }

    fn parse_pdf(&self, pdf: &[u8]) -> Result<Vec<String>, StageError> {
        let text = pdf_extract::extract_text_from_mem(pdf)
            .map_err(|e| StageError::PdfText(e.to_string()))?;
        let pages = split_pages(&text);
        if pages.is_empty() {
            return Err(StageError::PdfText("no extractable text layer".into()));
        }
        debug!("pdf-extract recovered {} page(s)", pages.len());
        Ok(pages)
    }
}

/// Split extracted PDF text on form feeds, dropping blank pages.
pub fn split_pages(text: &str) -> Vec<String> {
    text.split('\x0c')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect()
}

/// Whether the tesseract binary runs at all.
pub fn is_tesseract_available(tesseract_path: &str) -> bool {
    Command::new(tesseract_path)
        .arg("--version")
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

// ── Heuristics ──────────────────────────────────────────────────────────────

static RE_INVOICE_NUMBER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)invoice\s*(?:no\.?|number|num\.?|#)\s*[:#]?\s*([A-Z0-9\-/]*\d[A-Z0-9\-/]*)")
        .unwrap()
});

static RE_INVOICE_DATE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\bdate\s*[:\-]?\s*(\d{4}-\d{2}-\d{2}|\d{1,2}[./-]\d{1,2}[./-]\d{2,4})")
        .unwrap()
});

static RE_TOTAL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(?:grand\s+)?total(?:\s+amount)?(?:\s+due)?\s*[:\-]?\s*(?:[A-Z]{3}|[$€£₹])?\s*(\d[\d.,]*)",
    )
    .unwrap()
});

/// Parse an amount written with either `1,234.56` or `1.234,56` grouping.
pub fn parse_amount(raw: &str) -> Option<f64> {
    let s = raw.trim().trim_end_matches(['.', ',']);
    let normalized = match (s.rfind('.'), s.rfind(',')) {
        (Some(dot), Some(comma)) if dot > comma => s.replace(',', ""),
        (Some(_), Some(_)) => s.replace('.', "").replace(',', "."),
        (None, Some(comma)) if s.len() - comma - 1 <= 2 => s.replace(',', "."),
        (None, Some(_)) => s.replace(',', ""),
        (Some(_), None) if s.matches('.').count() > 1 => s.replace('.', ""),
        _ => s.to_string(),
    };
    normalized.parse().ok()
}

/// Build the review record for locally recovered text.
pub fn local_record(pages: &[String], source: &str) -> InvoiceRecord {
    let text = pages.join("\n\n");

    let mut record = InvoiceRecord::new();
    record.insert("status".into(), Value::from(Status::NeedsReview.as_str()));
    record.insert("reason".into(), Value::from(reason::LOCAL_EXTRACTION));
    record.insert("source".into(), Value::from(source));
    record.insert("page_count".into(), Value::from(pages.len()));

    if let Some(c) = RE_INVOICE_NUMBER.captures(&text) {
        record.insert("invoice_number".into(), Value::from(&c[1]));
    }
    if let Some(c) = RE_INVOICE_DATE.captures(&text) {
        record.insert("invoice_date".into(), Value::from(&c[1]));
    }
    // Totals sit at the bottom; the last match beats any running total.
    if let Some(amount) = RE_TOTAL
        .captures_iter(&text)
        .filter_map(|c| parse_amount(&c[1]))
        .last()
    {
        record.insert("total_amount".into(), Value::from(amount));
    }

    record.insert("raw_text".into(), Value::from(text));
    record
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "ACME GmbH\nInvoice No: INV-2024/0042\nInvoice Date: 03.05.2024\n\
        Subtotal: 100,00\nVAT 19%: 19,00\nTotal: EUR 1.119,00\n";

    #[test]
    fn amounts_in_both_groupings() {
        assert_eq!(parse_amount("1,234.56"), Some(1234.56));
        assert_eq!(parse_amount("1.234,56"), Some(1234.56));
        assert_eq!(parse_amount("12,50"), Some(12.5));
        assert_eq!(parse_amount("1,234"), Some(1234.0));
        assert_eq!(parse_amount("1.234.567"), Some(1_234_567.0));
        assert_eq!(parse_amount("99.95."), Some(99.95));
        assert_eq!(parse_amount("abc"), None);
    }

    #[test]
    fn heuristics_pick_out_key_fields() {
        let record = local_record(&[SAMPLE.to_string()], "local_ocr");
        assert_eq!(record["status"], "NEEDS_REVIEW");
        assert_eq!(record["reason"], "local_extraction");
        assert_eq!(record["source"], "local_ocr");
        assert_eq!(record["invoice_number"], "INV-2024/0042");
        assert_eq!(record["invoice_date"], "03.05.2024");
        assert_eq!(record["total_amount"], 1119.0);
        assert_eq!(record["page_count"], 1);
    }

    #[test]
    fn subtotal_is_not_the_total() {
        let record = local_record(&["Subtotal: 50.00".to_string()], "local_ocr");
        assert!(!record.contains_key("total_amount"));
    }

    #[test]
    fn missing_fields_are_omitted_and_text_kept() {
        let record = local_record(&["hello".into(), "world".into()], "local_pdf_text");
        assert!(!record.contains_key("invoice_number"));
        assert!(!record.contains_key("invoice_date"));
        assert_eq!(record["raw_text"], "hello\n\nworld");
        assert_eq!(record["page_count"], 2);
    }

    #[test]
    fn pages_split_on_form_feed() {
        assert_eq!(split_pages("one\x0c  \x0ctwo\n"), vec!["one", "two"]);
        assert!(split_pages("\x0c").is_empty());
    }

    #[test]
    fn missing_tesseract_is_reported() {
        assert!(!is_tesseract_available("/nonexistent/tesseract"));
        let engine = LocalExtractor::new("/nonexistent/tesseract", "eng");
        let err = engine.ocr_image(b"\x89PNG\r\n\x1a\n").unwrap_err();
        assert!(matches!(err, StageError::Ocr(_)));
    }

    #[test]
    fn junk_pdf_is_an_error() {
        let engine = LocalExtractor::new("tesseract", "eng");
        assert!(engine.parse_pdf(b"definitely not a pdf").is_err());
    }
}
