//! Gemini `generateContent` over plain HTTPS.
//!
//! ```text
//! POST {base}/v1beta/models/{model}:generateContent
//! x-goog-api-key: <key>
//! {"contents":[{"role":"user","parts":[{"text":"…"}]}],
//!  "systemInstruction":{"parts":[{"text":"…"}]}}
//! ```
//!
//! Errors come back as `{"error":{"code":503,"message":"…","status":"UNAVAILABLE"}}`.
//! They are reported as `"{http status}: {message}"` so that the status code
//! (`503`, `429`) and the provider wording ("overloaded", "quota") both reach
//! the retry classifier.

use super::{BackendFailure, GenerateRequest, TextBackend};
use crate::config::DEFAULT_GEMINI_BASE_URL;
use crate::credentials::ApiKey;
use crate::error::PlannerError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Longest slice of an unparseable error body kept in a failure message.
const MAX_RAW_ERROR_CHARS: usize = 300;

/// Backend bound to one Gemini API key and model.
#[derive(Debug, Clone)]
pub struct GeminiBackend {
    client: reqwest::Client,
    api_key: ApiKey,
    model: String,
    base_url: String,
}

impl GeminiBackend {
    pub fn new(
        api_key: ApiKey,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, PlannerError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| PlannerError::Internal(format!("HTTP client: {e}")))?;
        Ok(Self {
            client,
            api_key,
            model: model.into(),
            base_url: DEFAULT_GEMINI_BASE_URL.to_string(),
        })
    }

    /// Point the backend at another host (a proxy, or a mock server in tests).
    pub fn with_base_url(mut self, base_url: impl AsRef<str>) -> Self {
        self.base_url = base_url.as_ref().trim_end_matches('/').to_string();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        )
    }
}

#[async_trait]
impl TextBackend for GeminiBackend {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn generate(&self, request: &GenerateRequest<'_>) -> Result<String, BackendFailure> {
        let body = GenerateContentBody::from_request(request);

        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", self.api_key.expose())
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    BackendFailure::new(format!("request to {} timed out", self.model))
                } else {
                    BackendFailure::new(format!("transport error: {e}"))
                }
            })?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| BackendFailure::new(format!("{status}: failed to read body: {e}")))?;

        if !status.is_success() {
            return Err(BackendFailure::new(describe_error(status, &text)));
        }

        debug!("Gemini responded with {} bytes", text.len());
        let parsed: GenerateContentResponse = serde_json::from_str(&text)
            .map_err(|e| BackendFailure::new(format!("malformed Gemini response: {e}")))?;
        parsed.into_text()
    }
}

/// Render a non-2xx response as `"{status}: {message}"`.
fn describe_error(status: reqwest::StatusCode, body: &str) -> String {
    match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(envelope) => match envelope.error.status {
            Some(code) if !code.is_empty() => {
                format!("{status}: {} ({code})", envelope.error.message)
            }
            _ => format!("{status}: {}", envelope.error.message),
        },
        Err(_) => {
            let raw: String = body.trim().chars().take(MAX_RAW_ERROR_CHARS).collect();
            if raw.is_empty() {
                status.to_string()
            } else {
                format!("{status}: {raw}")
            }
        }
    }
}

// ── Wire types ───────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentBody<'a> {
    contents: Vec<Content<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content<'a>>,
}

impl<'a> GenerateContentBody<'a> {
    fn from_request(request: &GenerateRequest<'a>) -> Self {
        Self {
            contents: vec![Content {
                role: Some("user"),
                parts: vec![Part {
                    text: request.prompt,
                }],
            }],
            system_instruction: request.system_instruction.map(|text| Content {
                role: None,
                parts: vec![Part { text }],
            }),
        }
    }
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'a str>,
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: Option<String>,
}

impl GenerateContentResponse {
    /// Concatenate the text parts of the first candidate.
    fn into_text(self) -> Result<String, BackendFailure> {
        if let Some(reason) = self.prompt_feedback.and_then(|f| f.block_reason) {
            return Err(BackendFailure::new(format!(
                "prompt blocked by Gemini (blockReason: {reason})"
            )));
        }

        let Some(candidate) = self.candidates.into_iter().next() else {
            return Err(BackendFailure::new("empty response (no candidates)"));
        };

        let text: String = candidate
            .content
            .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();

        if text.is_empty() {
            return Err(BackendFailure::new(format!(
                "empty response (finishReason: {})",
                candidate.finish_reason.as_deref().unwrap_or("unknown")
            )));
        }
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn body_includes_system_instruction_only_when_present() {
        let with = GenerateContentBody::from_request(&GenerateRequest::new("hi", Some("sys")));
        let json = serde_json::to_value(&with).unwrap();
        assert_eq!(json["contents"][0]["role"], "user");
        assert_eq!(json["contents"][0]["parts"][0]["text"], "hi");
        assert_eq!(json["systemInstruction"]["parts"][0]["text"], "sys");

        let without = GenerateContentBody::from_request(&GenerateRequest::new("hi", None));
        let json = serde_json::to_value(&without).unwrap();
        assert!(json.get("systemInstruction").is_none());
    }

    #[test]
    fn joins_text_parts() {
        let resp: GenerateContentResponse = serde_json::from_str(
            r#"{"candidates":[{"content":{"parts":[{"text":"Hel"},{"text":"lo"}]},"finishReason":"STOP"}]}"#,
        )
        .unwrap();
        assert_eq!(resp.into_text().unwrap(), "Hello");
    }

    #[test]
    fn safety_stop_without_text_is_a_failure() {
        let resp: GenerateContentResponse =
            serde_json::from_str(r#"{"candidates":[{"finishReason":"SAFETY"}]}"#).unwrap();
        let err = resp.into_text().unwrap_err();
        assert!(err.message.contains("SAFETY"), "got: {err}");
    }

    #[test]
    fn blocked_prompt_is_a_failure() {
        let resp: GenerateContentResponse =
            serde_json::from_str(r#"{"promptFeedback":{"blockReason":"OTHER"}}"#).unwrap();
        assert!(resp.into_text().unwrap_err().message.contains("blockReason: OTHER"));
    }

    #[test]
    fn error_description_keeps_status_code_and_message() {
        let body = r#"{"error":{"code":503,"message":"The model is overloaded. Please try again later.","status":"UNAVAILABLE"}}"#;
        let msg = describe_error(reqwest::StatusCode::SERVICE_UNAVAILABLE, body);
        assert_eq!(
            msg,
            "503 Service Unavailable: The model is overloaded. Please try again later. (UNAVAILABLE)"
        );
    }

    #[test]
    fn error_description_falls_back_to_raw_body() {
        let msg = describe_error(reqwest::StatusCode::BAD_GATEWAY, "<html>upstream</html>");
        assert_eq!(msg, "502 Bad Gateway: <html>upstream</html>");
        let msg = describe_error(reqwest::StatusCode::TOO_MANY_REQUESTS, "");
        assert_eq!(msg, "429 Too Many Requests");
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let key = ApiKey::from_user("k").unwrap();
        let backend = GeminiBackend::new(key, "gemini-2.0-flash", Duration::from_secs(5))
            .unwrap()
            .with_base_url("http://localhost:9999/");
        assert_eq!(
            backend.endpoint(),
            "http://localhost:9999/v1beta/models/gemini-2.0-flash:generateContent"
        );
    }
}
