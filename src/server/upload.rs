//! Multipart upload parsing for `POST /convert`.

use axum::extract::multipart::MultipartError;
use axum::extract::Multipart;
use axum::http::StatusCode;

/// Name the file field must have.
pub const FILE_FIELD: &str = "file";

/// File name used when the client sends none.
const DEFAULT_FILENAME: &str = "upload";

/// The uploaded document.
#[derive(Debug)]
pub struct UploadedFile {
    pub filename: String,
    pub data: Vec<u8>,
}

/// Why an upload could not be read.
#[derive(Debug)]
pub enum UploadError {
    /// No `file` field in the form.
    MissingFile,
    /// The multipart stream itself was broken or too large.
    Malformed { status: StatusCode, detail: String },
}

impl From<MultipartError> for UploadError {
    fn from(e: MultipartError) -> Self {
        UploadError::Malformed {
            status: e.status(),
            detail: e.body_text(),
        }
    }
}

/// Read the `file` field; other fields are drained and ignored.
pub async fn parse_upload(mut multipart: Multipart) -> Result<UploadedFile, UploadError> {
    let mut file = None;

    while let Some(field) = multipart.next_field().await? {
        if field.name() == Some(FILE_FIELD) {
            let filename = field
                .file_name()
                .filter(|n| !n.is_empty())
                .unwrap_or(DEFAULT_FILENAME)
                .to_string();
            let data = field.bytes().await?.to_vec();
            file = Some(UploadedFile { filename, data });
        } else {
            let _ = field.bytes().await?;
        }
    }

    file.ok_or(UploadError::MissingFile)
}
