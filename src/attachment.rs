//! SAP upload payload: the extracted record plus attachment metadata.

use crate::pipeline::input::extension;
use crate::record::InvoiceRecord;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::path::Path;

/// Metadata identifying the original upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Attachment {
    pub file_name: String,
    /// Extension without the dot, case preserved.
    pub file_type: String,
    /// SHA-256 of the uploaded bytes, lowercase hex.
    pub file_hash: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SapPayload {
    pub invoice: InvoiceRecord,
    pub attachment: Attachment,
    pub status: String,
}

/// Lowercase hex SHA-256 of `bytes`.
pub fn file_hash(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    format!("{digest:x}")
}

/// Wrap a record for SAP upload.
///
/// `file_name` may be a path; only its last component is kept.
pub fn prepare_sap_payload(
    invoice: InvoiceRecord,
    file_name: &str,
    bytes: &[u8],
    status: impl Into<String>,
) -> SapPayload {
    let base = Path::new(file_name)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(file_name)
        .to_string();

    SapPayload {
        invoice,
        attachment: Attachment {
            file_type: extension(&base),
            file_name: base,
            file_hash: file_hash(bytes),
        },
        status: status.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn hash_is_lowercase_sha256_hex() {
        assert_eq!(
            file_hash(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn payload_shape() {
        let mut invoice = InvoiceRecord::new();
        invoice.insert("invoice_number".into(), json!("A-1"));

        let payload = prepare_sap_payload(invoice, "uploads/Scan.PDF", b"abc", "OK");
        let value = serde_json::to_value(&payload).unwrap();

        assert_eq!(value["invoice"]["invoice_number"], "A-1");
        assert_eq!(value["attachment"]["file_name"], "Scan.PDF");
        assert_eq!(value["attachment"]["file_type"], "PDF");
        assert_eq!(value["attachment"]["file_hash"], file_hash(b"abc"));
        assert_eq!(value["status"], "OK");
    }

    #[test]
    fn name_without_extension_has_empty_type() {
        let payload = prepare_sap_payload(InvoiceRecord::new(), "upload", b"", "NEEDS_REVIEW");
        assert_eq!(payload.attachment.file_type, "");
        assert_eq!(payload.attachment.file_name, "upload");
    }
}
