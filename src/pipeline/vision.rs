//! Hosted vision extraction via the Gemini `generateContent` endpoint.
//!
//! Exactly one request per conversion: one text part (prompt + schema)
//! followed by one `inlineData` part per page image. There is no retry;
//! every failure mode maps to a [`Failure`] with its own `reason` so the
//! caller can tell a quota error from a malformed reply.

use crate::config::Config;
use crate::error::InvoiceError;
use crate::pipeline::encode::PageImage;
use crate::pipeline::postprocess::strip_code_fences;
use crate::prompts::extraction_prompt;
use crate::record::{reason, Failure, VisionOutcome};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Extracts an invoice object from page images.
#[async_trait]
pub trait VisionExtractor: Send + Sync {
    async fn extract(&self, images: &[PageImage]) -> VisionOutcome;
}

// ── Wire types ──────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct GenerateContentRequest {
    contents: Vec<Content>,
}

#[derive(Debug, Serialize)]
struct Content {
    role: &'static str,
    parts: Vec<RequestPart>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum RequestPart {
    Text {
        text: String,
    },
    Inline {
        #[serde(rename = "inlineData")]
        inline_data: InlineData,
    },
}

#[derive(Debug, Serialize)]
struct InlineData {
    #[serde(rename = "mimeType")]
    mime_type: &'static str,
    data: String,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

fn build_request(prompt: String, images: &[PageImage]) -> GenerateContentRequest {
    let mut parts = Vec::with_capacity(images.len() + 1);
    parts.push(RequestPart::Text { text: prompt });
    parts.extend(images.iter().map(|img| RequestPart::Inline {
        inline_data: InlineData {
            mime_type: img.mime_type,
            data: img.to_base64(),
        },
    }));
    GenerateContentRequest {
        contents: vec![Content {
            role: "user",
            parts,
        }],
    }
}

/// Pull `candidates[0].content.parts[0].text` out of a response body.
fn reply_text(body: &str) -> Option<String> {
    let response: GenerateContentResponse = serde_json::from_str(body).ok()?;
    response
        .candidates
        .into_iter()
        .next()?
        .content
        .parts
        .into_iter()
        .next()?
        .text
}

/// Interpret the model's text reply.
///
/// Fences are stripped first. A JSON object is a success; any other valid
/// JSON value is passed through for the normalizer.
pub fn parse_reply(text: &str) -> VisionOutcome {
    let cleaned = strip_code_fences(text);
    match serde_json::from_str::<Value>(&cleaned) {
        Ok(Value::Object(map)) => VisionOutcome::Success(map),
        Ok(other) => VisionOutcome::NonObject(other),
        Err(e) => VisionOutcome::Failure(
            Failure::needs_review(reason::JSON_PARSE_FAILED)
                .with("error", e.to_string())
                .with("raw_text", cleaned),
        ),
    }
}

// ── Client ──────────────────────────────────────────────────────────────────

/// [`VisionExtractor`] for the Gemini REST API.
#[derive(Debug, Clone)]
pub struct GeminiClient {
    http: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
    schema: String,
}

impl GeminiClient {
    /// Build a client from the config. A missing key is not an error here;
    /// [`extract`](VisionExtractor::extract) reports it per call.
    pub fn new(config: &Config) -> Result<Self, InvoiceError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.api_timeout_secs))
            .build()
            .map_err(|e| InvoiceError::HttpClient(e.to_string()))?;

        Ok(Self {
            http,
            endpoint: format!(
                "{}/v1/models/{}:generateContent",
                config.api_base_url, config.model
            ),
            api_key: config.api_key.clone().filter(|k| !k.is_empty()),
            schema: config.schema.clone(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl VisionExtractor for GeminiClient {
    async fn extract(&self, images: &[PageImage]) -> VisionOutcome {
        let Some(api_key) = self.api_key.as_deref() else {
            return VisionOutcome::Failure(Failure::error(reason::API_KEY_NOT_FOUND));
        };

        let request = build_request(extraction_prompt(&self.schema), images);
        info!("Sending {} page image(s) to {}", images.len(), self.endpoint);

        let response = match self
            .http
            .post(&self.endpoint)
            .header("x-goog-api-key", api_key)
            .json(&request)
            .send()
            .await
        {
            Ok(r) => r,
            Err(e) => {
                warn!("Vision request failed: {}", e);
                return VisionOutcome::Failure(
                    Failure::needs_review(reason::REQUEST_FAILED).with("error", e.to_string()),
                );
            }
        };

        let status = response.status();
        let body = match response.text().await {
            Ok(b) => b,
            Err(e) => {
                warn!("Reading vision response failed: {}", e);
                return VisionOutcome::Failure(
                    Failure::needs_review(reason::REQUEST_FAILED).with("error", e.to_string()),
                );
            }
        };

        if status != reqwest::StatusCode::OK {
            warn!("Vision endpoint answered HTTP {}", status.as_u16());
            return VisionOutcome::Failure(
                Failure::needs_review(reason::HTTP_ERROR)
                    .with("http_status", status.as_u16())
                    .with("raw_response", body),
            );
        }

        let Some(text) = reply_text(&body) else {
            warn!("Vision response did not contain candidate text");
            return VisionOutcome::Failure(
                Failure::needs_review(reason::RESPONSE_PARSE_FAILED).with("raw_response", body),
            );
        };

        debug!("Vision reply: {} chars", text.len());
        parse_reply(&text)
    }
}
