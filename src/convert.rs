//! The conversion flow: one upload in, one invoice record out.
//!
//! ```text
//! bytes ─▶ kind ─┬─ pdf ──▶ rasterise ──┬─ ok ────────────┐
//!                │                      └─ fail ─▶ local pdf text / pdf_to_image_failed
//!                └─ image ──────────────────────────────────┤
//!                                                           ▼
//!                    barcodes (originals) ─▶ preprocess ─▶ vision ─┬─ ok ─▶ normalize
//!                                                                  └─ fail ─▶ local OCR / text ─▶ normalize
//! ```
//!
//! Every collaborator failure degrades to a record; [`InvoiceConverter::convert`]
//! itself cannot fail. Blocking collaborators run on the blocking pool and
//! their panics surface as join errors, handled like any other failure.

use crate::attachment::{prepare_sap_payload, SapPayload};
use crate::capabilities::Capabilities;
use crate::config::Config;
use crate::error::{InvoiceError, StageError};
use crate::pipeline::barcode::{scan_all, BarcodeScanner, QrScanner};
use crate::pipeline::encode::PageImage;
use crate::pipeline::fallback::{local_record, LocalEngine, LocalExtractor};
use crate::pipeline::input::{detect_kind, DocumentKind};
use crate::pipeline::preprocess::enhance;
use crate::pipeline::render::{PdfiumRasterizer, Rasterizer};
use crate::pipeline::vision::{GeminiClient, VisionExtractor};
use crate::record::{
    normalize, normalize_value, reason, Code, Failure, InvoiceRecord, Status, VisionOutcome,
};
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

const SOURCE_OCR: &str = "local_ocr";
const SOURCE_PDF_TEXT: &str = "local_pdf_text";

/// Runs the extraction pipeline with a fixed set of collaborators.
///
/// Cheap to share: wrap it in an `Arc` and hand it to every request.
pub struct InvoiceConverter {
    config: Config,
    capabilities: Capabilities,
    rasterizer: Arc<dyn Rasterizer>,
    scanner: Arc<dyn BarcodeScanner>,
    vision: Arc<dyn VisionExtractor>,
    local: Arc<dyn LocalEngine>,
}

impl std::fmt::Debug for InvoiceConverter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InvoiceConverter")
            .field("config", &self.config)
            .field("capabilities", &self.capabilities)
            .finish_non_exhaustive()
    }
}

/// Builder for [`InvoiceConverter`]. Unset collaborators get the real
/// implementations; unset capabilities are probed from the host.
pub struct ConverterBuilder {
    config: Config,
    capabilities: Option<Capabilities>,
    rasterizer: Option<Arc<dyn Rasterizer>>,
    scanner: Option<Arc<dyn BarcodeScanner>>,
    vision: Option<Arc<dyn VisionExtractor>>,
    local: Option<Arc<dyn LocalEngine>>,
}

impl ConverterBuilder {
    pub fn capabilities(mut self, caps: Capabilities) -> Self {
        self.capabilities = Some(caps);
        self
    }

    pub fn rasterizer(mut self, r: Arc<dyn Rasterizer>) -> Self {
        self.rasterizer = Some(r);
        self
    }

    pub fn scanner(mut self, s: Arc<dyn BarcodeScanner>) -> Self {
        self.scanner = Some(s);
        self
    }

    pub fn vision(mut self, v: Arc<dyn VisionExtractor>) -> Self {
        self.vision = Some(v);
        self
    }

    pub fn local_engine(mut self, l: Arc<dyn LocalEngine>) -> Self {
        self.local = Some(l);
        self
    }

    pub fn build(self) -> Result<InvoiceConverter, InvoiceError> {
        let config = self.config;
        let vision: Arc<dyn VisionExtractor> = match self.vision {
            Some(v) => v,
            None => Arc::new(GeminiClient::new(&config)?),
        };
        let rasterizer: Arc<dyn Rasterizer> = match self.rasterizer {
            Some(r) => r,
            None => Arc::new(PdfiumRasterizer::new(&config)),
        };
        let scanner: Arc<dyn BarcodeScanner> = match self.scanner {
            Some(s) => s,
            None => Arc::new(QrScanner),
        };
        let local: Arc<dyn LocalEngine> = match self.local {
            Some(l) => l,
            None => Arc::new(LocalExtractor::new(
                config.tesseract_path.clone(),
                config.ocr_language.clone(),
            )),
        };
        let capabilities = self
            .capabilities
            .unwrap_or_else(|| Capabilities::probe(&config));

        Ok(InvoiceConverter {
            config,
            capabilities,
            rasterizer,
            scanner,
            vision,
            local,
        })
    }
}

impl InvoiceConverter {
    pub fn builder(config: Config) -> ConverterBuilder {
        ConverterBuilder {
            config,
            capabilities: None,
            rasterizer: None,
            scanner: None,
            vision: None,
            local: None,
        }
    }

    /// Converter with the real collaborators and probed capabilities.
    pub fn new(config: Config) -> Result<Self, InvoiceError> {
        Self::builder(config).build()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn capabilities(&self) -> &Capabilities {
        &self.capabilities
    }

    /// Extract an invoice record from one upload.
    ///
    /// The result always carries `status` and a `codes` array.
    pub async fn convert(&self, filename: &str, bytes: Vec<u8>) -> InvoiceRecord {
        let start = Instant::now();
        let kind = detect_kind(filename);
        info!(
            "Converting '{}' ({}, {} bytes)",
            filename,
            kind.as_str(),
            bytes.len()
        );

        let (pdf, pages) = match kind {
            DocumentKind::Pdf => {
                let pdf = Arc::new(bytes);
                match self.rasterize(Arc::clone(&pdf)).await {
                    Ok(pages) => (Some(pdf), pages),
                    Err(e) => {
                        warn!("PDF rasterisation failed: {}", e);
                        let record = self.pdf_failure_record(pdf, e).await;
                        info!("Finished '{}' in {}ms", filename, start.elapsed().as_millis());
                        return record;
                    }
                }
            }
            DocumentKind::Image => (None, vec![PageImage::from_bytes(bytes)]),
        };

        let codes = if self.capabilities.barcode_scanner {
            scan_all(Arc::clone(&self.scanner), &pages).await
        } else {
            Vec::new()
        };

        let pages = if self.config.preprocess {
            self.preprocess(pages).await
        } else {
            pages
        };

        let outcome = self.extract_with_vision(&pages).await;
        let record = match outcome {
            VisionOutcome::Failure(failure) if self.config.local_fallback => {
                self.fall_back(failure, pdf, pages, &codes).await
            }
            other => normalize(other, &codes),
        };

        info!(
            "Finished '{}' → {} in {}ms",
            filename,
            Status::of(&record).map_or("?", Status::as_str),
            start.elapsed().as_millis()
        );
        record
    }

    /// Read a file from disk and convert it.
    pub async fn convert_file(&self, path: &Path) -> Result<InvoiceRecord, InvoiceError> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| InvoiceError::InputUnreadable {
                path: path.to_path_buf(),
                source: e,
            })?;
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("upload");
        Ok(self.convert(name, bytes).await)
    }

    /// Convert and wrap the record with attachment metadata for SAP.
    pub async fn convert_for_sap(&self, filename: &str, bytes: Vec<u8>) -> SapPayload {
        let record = self.convert(filename, bytes.clone()).await;
        let status = record
            .get("status")
            .and_then(Value::as_str)
            .unwrap_or(Status::NeedsReview.as_str())
            .to_string();
        prepare_sap_payload(record, filename, &bytes, status)
    }

    // ── Stages ───────────────────────────────────────────────────────────

    async fn rasterize(&self, pdf: Arc<Vec<u8>>) -> Result<Vec<PageImage>, StageError> {
        if !self.capabilities.pdf_rasterizer {
            return Err(StageError::Unavailable("pdfium"));
        }
        let rasterizer = Arc::clone(&self.rasterizer);
        let render_start = Instant::now();
        let pages = tokio::task::spawn_blocking(move || rasterizer.rasterize(&pdf)).await??;
        debug!(
            "Rasterised {} page(s) in {}ms",
            pages.len(),
            render_start.elapsed().as_millis()
        );
        Ok(pages)
    }

    async fn preprocess(&self, pages: Vec<PageImage>) -> Vec<PageImage> {
        let originals = pages.clone();
        let joined = tokio::task::spawn_blocking(move || {
            pages
                .into_iter()
                .map(|p| PageImage::from_bytes(enhance(&p.bytes)))
                .collect::<Vec<_>>()
        })
        .await;
        match joined {
            Ok(enhanced) => enhanced,
            Err(e) => {
                warn!("Preprocessing task failed, using original images: {}", e);
                originals
            }
        }
    }

    async fn extract_with_vision(&self, pages: &[PageImage]) -> VisionOutcome {
        if !self.capabilities.vision {
            info!("No API key configured, skipping vision extraction");
            return VisionOutcome::Failure(Failure::needs_review(reason::EXTRACTION_FAILED));
        }

        let vision = Arc::clone(&self.vision);
        let images = pages.to_vec();
        let llm_start = Instant::now();
        let joined = tokio::spawn(async move { vision.extract(&images).await }).await;
        debug!("Vision stage took {}ms", llm_start.elapsed().as_millis());

        joined.unwrap_or_else(|e| {
            warn!("Vision extraction task failed: {}", e);
            VisionOutcome::Failure(
                Failure::needs_review(reason::EXTRACTION_FAILED).with("error", e.to_string()),
            )
        })
    }

    /// Try local text recovery after a vision failure; keep the failure if
    /// nothing local works.
    async fn fall_back(
        &self,
        failure: Failure,
        pdf: Option<Arc<Vec<u8>>>,
        pages: Vec<PageImage>,
        codes: &[Code],
    ) -> InvoiceRecord {
        info!("Vision failed ({}), trying local extraction", failure.reason);

        // Multi-page PDFs go to the text layer first, single images to OCR.
        let recovered = match pdf {
            Some(pdf) if pages.len() > 1 => match self.parse_pdf_text(pdf).await {
                Some(texts) => Some((texts, SOURCE_PDF_TEXT)),
                None => self.ocr_pages(pages).await.map(|t| (t, SOURCE_OCR)),
            },
            Some(pdf) => match self.ocr_pages(pages).await {
                Some(texts) => Some((texts, SOURCE_OCR)),
                None => self.parse_pdf_text(pdf).await.map(|t| (t, SOURCE_PDF_TEXT)),
            },
            None => self.ocr_pages(pages).await.map(|t| (t, SOURCE_OCR)),
        };

        match recovered {
            Some((texts, source)) => {
                let mut record = local_record(&texts, source);
                record.insert("vision_reason".into(), Value::from(failure.reason));
                normalize_value(Value::Object(record), codes)
            }
            None => normalize(VisionOutcome::Failure(failure), codes),
        }
    }

    async fn parse_pdf_text(&self, pdf: Arc<Vec<u8>>) -> Option<Vec<String>> {
        if !self.capabilities.local_pdf_text {
            return None;
        }
        let local = Arc::clone(&self.local);
        match tokio::task::spawn_blocking(move || local.parse_pdf(&pdf))
            .await
            .map_err(StageError::from)
            .and_then(|r| r)
        {
            Ok(pages) => Some(pages),
            Err(e) => {
                warn!("Local PDF text extraction failed: {}", e);
                None
            }
        }
    }

    async fn ocr_pages(&self, pages: Vec<PageImage>) -> Option<Vec<String>> {
        if !self.capabilities.local_ocr || pages.is_empty() {
            return None;
        }
        let local = Arc::clone(&self.local);
        let joined = tokio::task::spawn_blocking(move || {
            pages
                .iter()
                .map(|p| local.ocr_image(&p.bytes))
                .collect::<Result<Vec<_>, _>>()
        })
        .await
        .map_err(StageError::from)
        .and_then(|r| r);

        match joined {
            Ok(texts) if texts.iter().any(|t| !t.trim().is_empty()) => Some(texts),
            Ok(_) => {
                warn!("Local OCR recovered no text");
                None
            }
            Err(e) => {
                warn!("Local OCR failed: {}", e);
                None
            }
        }
    }

    /// Record for a PDF that could not be rasterised.
    async fn pdf_failure_record(&self, pdf: Arc<Vec<u8>>, err: StageError) -> InvoiceRecord {
        if self.config.local_fallback {
            if let Some(texts) = self.parse_pdf_text(pdf).await {
                let mut record = local_record(&texts, SOURCE_PDF_TEXT);
                record.insert("reason".into(), Value::from(reason::PDF_TO_IMAGE_FAILED));
                record.insert("error".into(), Value::from(err.to_string()));
                return normalize_value(Value::Object(record), &[]);
            }
        }
        normalize(
            VisionOutcome::Failure(
                Failure::needs_review(reason::PDF_TO_IMAGE_FAILED).with("error", err.to_string()),
            ),
            &[],
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FakeRaster(Result<usize, StageError>);
    impl Rasterizer for FakeRaster {
        fn rasterize(&self, _pdf: &[u8]) -> Result<Vec<PageImage>, StageError> {
            self.0.clone().map(|n| {
                (0..n)
                    .map(|i| PageImage {
                        bytes: vec![i as u8],
                        mime_type: "image/jpeg",
                    })
                    .collect()
            })
        }
    }

    struct NoCodes;
    impl BarcodeScanner for NoCodes {
        fn scan(&self, _image: &[u8]) -> Result<Vec<Code>, StageError> {
            Ok(Vec::new())
        }
    }

    struct FixedVision(VisionOutcome, AtomicUsize);
    #[async_trait]
    impl VisionExtractor for FixedVision {
        async fn extract(&self, images: &[PageImage]) -> VisionOutcome {
            self.1.store(images.len(), Ordering::SeqCst);
            self.0.clone()
        }
    }

    #[derive(Default)]
    struct RecordingScanner(std::sync::Mutex<Vec<Vec<u8>>>);
    impl BarcodeScanner for RecordingScanner {
        fn scan(&self, image: &[u8]) -> Result<Vec<Code>, StageError> {
            self.0.lock().unwrap().push(image.to_vec());
            Ok(Vec::new())
        }
    }

    #[derive(Default)]
    struct RecordingVision(std::sync::Mutex<Vec<&'static str>>);
    #[async_trait]
    impl VisionExtractor for RecordingVision {
        async fn extract(&self, images: &[PageImage]) -> VisionOutcome {
            self.0
                .lock()
                .unwrap()
                .extend(images.iter().map(|p| p.mime_type));
            success()
        }
    }

    struct PanickingVision;
    #[async_trait]
    impl VisionExtractor for PanickingVision {
        async fn extract(&self, _images: &[PageImage]) -> VisionOutcome {
            panic!("client bug");
        }
    }

    struct FakeLocal {
        ocr: Result<String, StageError>,
        pdf: Result<Vec<String>, StageError>,
    }
    impl LocalEngine for FakeLocal {
        fn ocr_image(&self, _image: &[u8]) -> Result<String, StageError> {
            self.ocr.clone()
        }
        fn parse_pdf(&self, _pdf: &[u8]) -> Result<Vec<String>, StageError> {
            self.pdf.clone()
        }
    }

    fn broken_local() -> Arc<FakeLocal> {
        Arc::new(FakeLocal {
            ocr: Err(StageError::Unavailable("tesseract")),
            pdf: Err(StageError::PdfText("no text".into())),
        })
    }

    fn config() -> Config {
        Config::builder().preprocess(false).build().unwrap()
    }

    fn converter(
        vision: Arc<dyn VisionExtractor>,
        raster: Result<usize, StageError>,
        local: Arc<dyn LocalEngine>,
    ) -> InvoiceConverter {
        InvoiceConverter::builder(config())
            .capabilities(Capabilities::all())
            .rasterizer(Arc::new(FakeRaster(raster)))
            .scanner(Arc::new(NoCodes))
            .vision(vision)
            .local_engine(local)
            .build()
            .unwrap()
    }

    fn success() -> VisionOutcome {
        VisionOutcome::Success(
            json!({"invoice_number": "A-1"})
                .as_object()
                .cloned()
                .unwrap(),
        )
    }

    #[tokio::test]
    async fn vision_success_is_ok() {
        let vision = Arc::new(FixedVision(success(), AtomicUsize::new(0)));
        let c = converter(vision.clone(), Ok(3), broken_local());
        let r = c.convert("invoice.pdf", b"%PDF".to_vec()).await;
        assert_eq!(r["status"], "OK");
        assert_eq!(r["invoice_number"], "A-1");
        assert_eq!(r["codes"], json!([]));
        assert_eq!(vision.1.load(Ordering::SeqCst), 3, "every page is sent");
    }

    #[tokio::test]
    async fn vision_failure_without_local_keeps_reason() {
        let failure = Failure::needs_review(reason::HTTP_ERROR).with("http_status", 429);
        let vision = Arc::new(FixedVision(VisionOutcome::Failure(failure), AtomicUsize::new(0)));
        let r = converter(vision, Ok(1), broken_local())
            .convert("scan.png", vec![1, 2, 3])
            .await;
        assert_eq!(r["status"], "NEEDS_REVIEW");
        assert_eq!(r["reason"], "gemini_http_error");
        assert_eq!(r["http_status"], 429);
    }

    #[tokio::test]
    async fn vision_failure_falls_back_to_ocr() {
        let failure = Failure::needs_review(reason::REQUEST_FAILED);
        let vision = Arc::new(FixedVision(VisionOutcome::Failure(failure), AtomicUsize::new(0)));
        let local = Arc::new(FakeLocal {
            ocr: Ok("Invoice No: 77-A\nTotal: 12.50".into()),
            pdf: Err(StageError::PdfText("none".into())),
        });
        let r = converter(vision, Ok(1), local)
            .convert("scan.jpg", vec![1])
            .await;
        assert_eq!(r["status"], "NEEDS_REVIEW");
        assert_eq!(r["reason"], "local_extraction");
        assert_eq!(r["source"], "local_ocr");
        assert_eq!(r["vision_reason"], "gemini_request_failed");
        assert_eq!(r["invoice_number"], "77-A");
        assert_eq!(r["codes"], json!([]));
    }

    #[tokio::test]
    async fn pdf_prefers_text_layer_in_fallback() {
        let failure = Failure::needs_review(reason::JSON_PARSE_FAILED);
        let vision = Arc::new(FixedVision(VisionOutcome::Failure(failure), AtomicUsize::new(0)));
        let local = Arc::new(FakeLocal {
            ocr: Ok("ocr text".into()),
            pdf: Ok(vec!["page one".into(), "page two".into()]),
        });
        let r = converter(vision, Ok(2), local)
            .convert("a.pdf", b"%PDF".to_vec())
            .await;
        assert_eq!(r["source"], "local_pdf_text");
        assert_eq!(r["page_count"], 2);
    }

    #[tokio::test]
    async fn rasterisation_failure_uses_pdf_text() {
        let vision = Arc::new(FixedVision(success(), AtomicUsize::new(0)));
        let local = Arc::new(FakeLocal {
            ocr: Err(StageError::Unavailable("tesseract")),
            pdf: Ok(vec!["Invoice #: 5501".into()]),
        });
        let r = converter(vision.clone(), Err(StageError::EmptyDocument), local)
            .convert("a.pdf", b"%PDF".to_vec())
            .await;
        assert_eq!(r["status"], "NEEDS_REVIEW");
        assert_eq!(r["reason"], "pdf_to_image_failed");
        assert_eq!(r["source"], "local_pdf_text");
        assert_eq!(r["invoice_number"], "5501");
        assert_eq!(r["codes"], json!([]));
        assert_eq!(vision.1.load(Ordering::SeqCst), 0, "vision is never called");
    }

    #[tokio::test]
    async fn rasterisation_failure_without_fallback() {
        let vision = Arc::new(FixedVision(success(), AtomicUsize::new(0)));
        let r = converter(vision, Err(StageError::EmptyDocument), broken_local())
            .convert("a.PDF", b"%PDF".to_vec())
            .await;
        assert_eq!(r["status"], "NEEDS_REVIEW");
        assert_eq!(r["reason"], "pdf_to_image_failed");
        assert_eq!(r["codes"], json!([]));
    }

    #[tokio::test]
    async fn panicking_vision_client_degrades() {
        let r = converter(Arc::new(PanickingVision), Ok(1), broken_local())
            .convert("scan.png", vec![1])
            .await;
        assert_eq!(r["status"], "NEEDS_REVIEW");
        assert_eq!(r["reason"], "gemini_extraction_failed");
    }

    #[tokio::test]
    async fn missing_key_skips_to_needs_review() {
        let vision = Arc::new(FixedVision(success(), AtomicUsize::new(0)));
        let mut caps = Capabilities::all();
        caps.vision = false;
        let c = InvoiceConverter::builder(config())
            .capabilities(caps)
            .scanner(Arc::new(NoCodes))
            .vision(vision.clone())
            .local_engine(broken_local())
            .build()
            .unwrap();
        let r = c.convert("scan.png", vec![1]).await;
        assert_eq!(r["status"], "NEEDS_REVIEW");
        assert_eq!(r["reason"], "gemini_extraction_failed");
        assert_eq!(r["codes"], json!([]));
        assert_eq!(vision.1.load(Ordering::SeqCst), 0, "vision is never called");
    }

    #[tokio::test]
    async fn single_page_pdf_prefers_ocr_in_fallback() {
        let failure = Failure::needs_review(reason::HTTP_ERROR);
        let vision = Arc::new(FixedVision(VisionOutcome::Failure(failure), AtomicUsize::new(0)));
        let local = Arc::new(FakeLocal {
            ocr: Ok("Invoice No: 12\nTotal: 3.00".into()),
            pdf: Ok(vec!["text layer".into()]),
        });
        let r = converter(vision, Ok(1), local)
            .convert("one.pdf", b"%PDF".to_vec())
            .await;
        assert_eq!(r["source"], "local_ocr");
        assert_eq!(r["invoice_number"], "12");
    }

    #[tokio::test]
    async fn single_page_pdf_uses_text_layer_when_ocr_fails() {
        let failure = Failure::needs_review(reason::HTTP_ERROR);
        let vision = Arc::new(FixedVision(VisionOutcome::Failure(failure), AtomicUsize::new(0)));
        let local = Arc::new(FakeLocal {
            ocr: Err(StageError::Unavailable("tesseract")),
            pdf: Ok(vec!["Invoice No: 88".into()]),
        });
        let r = converter(vision, Ok(1), local)
            .convert("one.pdf", b"%PDF".to_vec())
            .await;
        assert_eq!(r["source"], "local_pdf_text");
        assert_eq!(r["vision_reason"], "gemini_http_error");
    }

    #[tokio::test]
    async fn barcodes_see_originals_and_vision_sees_preprocessed_png() {
        let page = image::DynamicImage::ImageLuma8(image::GrayImage::from_fn(64, 48, |x, _| {
            image::Luma([if x % 16 < 3 { 30 } else { 220 }])
        }));
        let original = crate::pipeline::encode::encode_jpeg(&page).unwrap().bytes;

        let scanner = Arc::new(RecordingScanner::default());
        let vision = Arc::new(RecordingVision::default());
        let c = InvoiceConverter::builder(Config::builder().preprocess(true).build().unwrap())
            .capabilities(Capabilities::all())
            .scanner(scanner.clone())
            .vision(vision.clone())
            .local_engine(broken_local())
            .build()
            .unwrap();

        let r = c.convert("scan.jpg", original.clone()).await;
        assert_eq!(r["status"], "OK");
        assert_eq!(*scanner.0.lock().unwrap(), vec![original]);
        assert_eq!(*vision.0.lock().unwrap(), vec!["image/png"]);
    }

    #[tokio::test]
    async fn sap_payload_carries_record_status() {
        let vision = Arc::new(FixedVision(success(), AtomicUsize::new(0)));
        let c = converter(vision, Ok(1), broken_local());
        let payload = c.convert_for_sap("dir/inv.png", vec![9, 9]).await;
        assert_eq!(payload.status, "OK");
        assert_eq!(payload.attachment.file_name, "inv.png");
        assert_eq!(payload.attachment.file_type, "png");
        assert_eq!(payload.invoice["invoice_number"], "A-1");
    }

    #[tokio::test]
    async fn missing_input_file_is_fatal() {
        let vision = Arc::new(FixedVision(success(), AtomicUsize::new(0)));
        let c = converter(vision, Ok(1), broken_local());
        let err = c
            .convert_file(Path::new("/definitely/not/here.pdf"))
            .await
            .unwrap_err();
        assert!(matches!(err, InvoiceError::InputUnreadable { .. }));
    }
}
