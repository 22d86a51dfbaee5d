//! HTTP surface: health check, conversion, and SAP payload endpoints.
//!
//! | Method | Path | Body | Response |
//! |--------|------|------|----------|
//! | `GET` | `/` | – | service banner |
//! | `POST` | `/convert` | multipart, field `file` | invoice record |
//! | `POST` | `/convert/sap` | multipart, field `file` | SAP payload |
//!
//! Extraction problems are reported inside the record with HTTP 200. Only a
//! broken upload (4xx) or an unexpected internal failure (500) changes the
//! status code, and those bodies are always `{"detail": "..."}`.

pub mod upload;

use crate::attachment::SapPayload;
use crate::convert::InvoiceConverter;
use crate::record::InvoiceRecord;
use axum::extract::multipart::MultipartRejection;
use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use std::any::Any;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};
use upload::{parse_upload, UploadError, UploadedFile};

/// Error bodies returned by the API.
#[derive(Debug)]
pub enum ApiError {
    MissingFile,
    InvalidUpload { status: StatusCode, detail: String },
    Internal,
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::MissingFile => StatusCode::BAD_REQUEST,
            ApiError::InvalidUpload { status, .. } => *status,
            ApiError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn detail(&self) -> &'static str {
        match self {
            ApiError::MissingFile => "missing_file",
            ApiError::InvalidUpload { status, .. } if *status == StatusCode::PAYLOAD_TOO_LARGE => {
                "file_too_large"
            }
            ApiError::InvalidUpload { .. } => "invalid_upload",
            ApiError::Internal => "internal_server_error",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let ApiError::InvalidUpload { detail, .. } = &self {
            warn!("Rejected upload: {}", detail);
        }
        (self.status(), Json(json!({ "detail": self.detail() }))).into_response()
    }
}

impl From<UploadError> for ApiError {
    fn from(e: UploadError) -> Self {
        match e {
            UploadError::MissingFile => ApiError::MissingFile,
            UploadError::Malformed { status, detail } => ApiError::InvalidUpload { status, detail },
        }
    }
}

impl From<MultipartRejection> for ApiError {
    fn from(e: MultipartRejection) -> Self {
        ApiError::InvalidUpload {
            status: StatusCode::BAD_REQUEST,
            detail: e.body_text(),
        }
    }
}

/// Build the application router.
pub fn router(converter: Arc<InvoiceConverter>) -> Router {
    let body_limit = DefaultBodyLimit::max(converter.config().max_upload_bytes);

    Router::new()
        .route("/", get(health))
        .route("/convert", post(convert))
        .route("/convert/sap", post(convert_sap))
        .layer(body_limit)
        .layer(TraceLayer::new_for_http())
        .layer(CatchPanicLayer::custom(panic_response))
        .with_state(converter)
}

/// Bind `addr` and serve until `shutdown` resolves.
pub async fn serve(
    addr: SocketAddr,
    converter: Arc<InvoiceConverter>,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Listening on http://{}", listener.local_addr()?);
    axum::serve(listener, router(converter))
        .with_graceful_shutdown(shutdown)
        .await
}

async fn health() -> Json<Value> {
    Json(json!({
        "status": "Invoice API running",
        "endpoint": "/convert",
        "method": "POST",
    }))
}

async fn convert(
    State(converter): State<Arc<InvoiceConverter>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<InvoiceRecord>, ApiError> {
    let file = parse_upload(multipart?).await?;
    let record = run_detached(converter, file, |c, f| async move {
        c.convert(&f.filename, f.data).await
    })
    .await?;
    Ok(Json(record))
}

async fn convert_sap(
    State(converter): State<Arc<InvoiceConverter>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<SapPayload>, ApiError> {
    let file = parse_upload(multipart?).await?;
    let payload = run_detached(converter, file, |c, f| async move {
        c.convert_for_sap(&f.filename, f.data).await
    })
    .await?;
    Ok(Json(payload))
}

/// Run a conversion on its own task so a panic inside it becomes a 500
/// with a logged cause instead of a dropped connection.
async fn run_detached<T, F, Fut>(
    converter: Arc<InvoiceConverter>,
    file: UploadedFile,
    f: F,
) -> Result<T, ApiError>
where
    T: Send + 'static,
    F: FnOnce(Arc<InvoiceConverter>, UploadedFile) -> Fut,
    Fut: Future<Output = T> + Send + 'static,
{
    let filename = file.filename.clone();
    tokio::spawn(f(converter, file)).await.map_err(|e| {
        error!("Unhandled error converting '{}': {}", filename, e);
        ApiError::Internal
    })
}

fn panic_response(err: Box<dyn Any + Send + 'static>) -> Response {
    let cause = err
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| err.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    error!("Handler panicked: {}", cause);
    ApiError::Internal.into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capabilities::Capabilities;
    use crate::config::Config;
    use axum::body::to_bytes;

    async fn body_json(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn converter() -> Arc<InvoiceConverter> {
        let converter = InvoiceConverter::builder(Config::default())
            .capabilities(Capabilities::none())
            .build()
            .unwrap();
        Arc::new(converter)
    }

    #[tokio::test]
    async fn panicking_conversion_is_internal_error() {
        let file = UploadedFile {
            filename: "boom.pdf".into(),
            data: Vec::new(),
        };
        let err = run_detached(converter(), file, |_, _| async { panic!("renderer blew up") })
            .await
            .unwrap_err();

        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            body_json(response).await,
            json!({"detail": "internal_server_error"})
        );
    }

    #[tokio::test]
    async fn finished_conversion_passes_through() {
        let file = UploadedFile {
            filename: "ok.png".into(),
            data: vec![1, 2, 3],
        };
        let len = run_detached(converter(), file, |_, f| async move { f.data.len() })
            .await
            .unwrap();
        assert_eq!(len, 3);
    }

    #[tokio::test]
    async fn caught_handler_panic_is_internal_error() {
        let response = panic_response(Box::new("handler bug"));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            body_json(response).await,
            json!({"detail": "internal_server_error"})
        );

        let response = panic_response(Box::new(String::from("formatted bug")));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
