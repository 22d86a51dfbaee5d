//! The invoice result record and the normalizer that produces it.
//!
//! Whatever the extraction stages return — a schema object from the model,
//! bare text, or a structured failure — the caller always receives one JSON
//! object carrying `status` and `codes`. Everything else in the record is
//! either schema-defined invoice data or diagnostic detail for a human
//! reviewer.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A loosely typed invoice record: schema fields plus `status`/`codes`/diagnostics.
pub type InvoiceRecord = Map<String, Value>;

/// Outcome marker carried in every record's `status` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Status {
    /// A schema-conforming object was extracted.
    Ok,
    /// Something failed or was ambiguous; a human should check the result.
    NeedsReview,
    /// Fatal misconfiguration (e.g. missing credential).
    Error,
}

impl Status {
    pub fn as_str(self) -> &'static str {
        match self {
            Status::Ok => "OK",
            Status::NeedsReview => "NEEDS_REVIEW",
            Status::Error => "ERROR",
        }
    }

    /// Parse the `status` field of a record, if it holds a known marker.
    pub fn of(record: &InvoiceRecord) -> Option<Status> {
        match record.get("status").and_then(Value::as_str)? {
            "OK" => Some(Status::Ok),
            "NEEDS_REVIEW" => Some(Status::NeedsReview),
            "ERROR" => Some(Status::Error),
            _ => None,
        }
    }
}

/// Machine-readable `reason` values.
pub mod reason {
    pub const API_KEY_NOT_FOUND: &str = "GEMINI_API_KEY_NOT_FOUND";
    pub const HTTP_ERROR: &str = "gemini_http_error";
    pub const REQUEST_FAILED: &str = "gemini_request_failed";
    pub const RESPONSE_PARSE_FAILED: &str = "gemini_response_parse_failed";
    pub const JSON_PARSE_FAILED: &str = "json_parse_failed";
    pub const EXTRACTION_FAILED: &str = "gemini_extraction_failed";
    pub const PDF_TO_IMAGE_FAILED: &str = "pdf_to_image_failed";
    pub const LOCAL_EXTRACTION: &str = "local_extraction";
}

/// Kind of a decoded barcode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CodeKind {
    #[serde(rename = "QR")]
    Qr,
}

/// One barcode/QR finding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Code {
    #[serde(rename = "type")]
    pub kind: CodeKind,
    pub value: String,
    pub confidence: f32,
}

impl Code {
    pub fn qr(value: impl Into<String>) -> Self {
        Self {
            kind: CodeKind::Qr,
            value: value.into(),
            confidence: 1.0,
        }
    }
}

/// A structured stage failure: status, reason, and diagnostic fields.
#[derive(Debug, Clone, PartialEq)]
pub struct Failure {
    pub status: Status,
    pub reason: String,
    pub detail: Map<String, Value>,
}

impl Failure {
    pub fn needs_review(reason: impl Into<String>) -> Self {
        Self {
            status: Status::NeedsReview,
            reason: reason.into(),
            detail: Map::new(),
        }
    }

    pub fn error(reason: impl Into<String>) -> Self {
        Self {
            status: Status::Error,
            reason: reason.into(),
            detail: Map::new(),
        }
    }

    /// Attach a diagnostic field.
    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.detail.insert(key.to_string(), value.into());
        self
    }

    pub fn into_record(self) -> InvoiceRecord {
        let mut record = InvoiceRecord::new();
        record.insert("status".into(), Value::from(self.status.as_str()));
        record.insert("reason".into(), Value::from(self.reason));
        for (k, v) in self.detail {
            record.entry(k).or_insert(v);
        }
        record
    }
}

/// What the vision client produced.
#[derive(Debug, Clone, PartialEq)]
pub enum VisionOutcome {
    /// The reply parsed into a JSON object.
    Success(Map<String, Value>),
    /// The reply was valid JSON but not an object.
    NonObject(Value),
    /// The call or the parse failed.
    Failure(Failure),
}

/// Serialize codes into the JSON array stored under `codes`.
pub fn codes_value(codes: &[Code]) -> Value {
    Value::Array(
        codes
            .iter()
            .filter_map(|c| serde_json::to_value(c).ok())
            .collect(),
    )
}

/// Normalize a tagged vision outcome into a record.
pub fn normalize(outcome: VisionOutcome, codes: &[Code]) -> InvoiceRecord {
    match outcome {
        VisionOutcome::Success(map) => finish_object(map, codes),
        VisionOutcome::NonObject(value) => normalize_value(value, codes),
        VisionOutcome::Failure(failure) => finish_object(failure.into_record(), codes),
    }
}

/// Normalize an arbitrary value into a record.
///
/// * string → parsed as JSON; an object continues as below, anything else
///   becomes `NEEDS_REVIEW` with the text under `raw_text`
/// * object → `codes` and `status: "OK"` are added when absent, never overwritten
/// * anything else → `NEEDS_REVIEW` with the stringified value under `raw_response`
pub fn normalize_value(value: Value, codes: &[Code]) -> InvoiceRecord {
    match value {
        Value::Object(map) => finish_object(map, codes),
        Value::String(text) => match serde_json::from_str::<Value>(&text) {
            Ok(Value::Object(map)) => finish_object(map, codes),
            _ => {
                let mut record = review_record();
                record.insert("raw_text".into(), Value::String(text));
                record.insert("codes".into(), codes_value(codes));
                record
            }
        },
        other => {
            let mut record = review_record();
            record.insert("raw_response".into(), Value::String(other.to_string()));
            record.insert("codes".into(), codes_value(codes));
            record
        }
    }
}

fn review_record() -> InvoiceRecord {
    let mut record = InvoiceRecord::new();
    record.insert(
        "status".into(),
        Value::from(Status::NeedsReview.as_str()),
    );
    record
}

fn finish_object(mut map: Map<String, Value>, codes: &[Code]) -> InvoiceRecord {
    map.entry("codes").or_insert_with(|| codes_value(codes));
    map.entry("status")
        .or_insert_with(|| Value::from(Status::Ok.as_str()));
    map
}
