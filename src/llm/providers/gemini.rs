//! Gemini `generateContent` provider.
//!
//! Exposes a single `generate(&str, OutputMode) -> String` interface matching
//! the rest of the `LlmProvider` abstraction. All Gemini wire types are
//! private to this module — callers never see them. Structured-output parsing
//! belongs at the responder layer; this provider is stateless and returns the
//! model's raw text.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, trace};

use crate::llm::{OutputMode, ProviderError};

/// MIME type requested in JSON output mode.
const JSON_MIME_TYPE: &str = "application/json";

// ── Public provider ───────────────────────────────────────────────────────────

/// Adapter for the Gemini `generateContent` REST endpoint.
///
/// Constructed once at startup, then cheaply cloned because
/// `reqwest::Client` is an `Arc` internally. The API key travels in the
/// `x-goog-api-key` header so request URLs stay loggable.
#[derive(Debug, Clone)]
pub struct GeminiProvider {
    client: Client,
    api_base_url: String,
    model: String,
    temperature: f32,
    api_key: String,
}

impl GeminiProvider {
    /// Build a provider from config values and the API key.
    pub fn new(
        api_base_url: String,
        model: String,
        temperature: f32,
        timeout_seconds: u64,
        api_key: String,
    ) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_seconds))
            .build()
            .map_err(|e| ProviderError::Request(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { client, api_base_url, model, temperature, api_key })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.api_base_url.trim_end_matches('/'),
            self.model
        )
    }

    /// Send `prompt` as a single user turn and return the model's text.
    ///
    /// One round-trip only — the responder owns the retry-as-plain-text
    /// decision, not this provider.
    pub async fn generate(&self, prompt: &str, mode: OutputMode) -> Result<String, ProviderError> {
        let response_mime_type = match mode {
            OutputMode::Json => Some(JSON_MIME_TYPE.to_string()),
            OutputMode::Plain => None,
        };

        let payload = GenerateContentRequest {
            contents: vec![Content {
                role: "user".to_string(),
                parts: vec![Part { text: prompt.to_string() }],
            }],
            generation_config: GenerationConfig {
                temperature: self.temperature,
                response_mime_type,
            },
        };

        let url = self.endpoint();
        debug!(
            model = %self.model,
            mode = ?mode,
            prompt_len = prompt.len(),
            "sending generateContent request"
        );
        if tracing::enabled!(tracing::Level::TRACE) {
            let json = serde_json::to_string_pretty(&payload)
                .unwrap_or_else(|e| format!("<serialization failed: {e}>"));
            trace!(payload = %json, "full request payload");
        }

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", self.api_key.as_str())
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                error!(%url, error = %e, "generateContent HTTP request failed (transport)");
                ProviderError::Request(e.to_string())
            })?;

        let response = check_status(response).await?;

        let parsed = response
            .json::<GenerateContentResponse>()
            .await
            .map_err(|e| {
                error!(error = %e, "failed to deserialize generateContent response");
                ProviderError::Request(format!("failed to parse response body: {e}"))
            })?;

        if let Some(u) = &parsed.usage_metadata {
            debug!(
                input_tokens = u.prompt_token_count,
                output_tokens = u.candidates_token_count,
                "token usage"
            );
        }

        extract_text(parsed)
            .ok_or_else(|| ProviderError::Request("empty or missing candidate text in response".into()))
    }
}

// ── Private wire types ────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content {
    role: String,
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
struct Part {
    text: String,
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    temperature: f32,
    #[serde(rename = "responseMimeType", skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(rename = "usageMetadata", default)]
    usage_metadata: Option<UsageMetadata>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UsageMetadata {
    #[serde(rename = "promptTokenCount", default)]
    prompt_token_count: u64,
    #[serde(rename = "candidatesTokenCount", default)]
    candidates_token_count: u64,
}

// Error envelope used by the Gemini API.
#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
    #[serde(default)]
    status: Option<String>,
}

/// Join the text parts of the first candidate; `None` when the model
/// returned no usable text.
fn extract_text(response: GenerateContentResponse) -> Option<String> {
    let text = response
        .candidates
        .into_iter()
        .next()?
        .content?
        .parts
        .into_iter()
        .filter_map(|p| p.text)
        .collect::<Vec<_>>()
        .join("");
    let text = text.trim().to_string();
    if text.is_empty() { None } else { Some(text) }
}

/// Consume the response and return it if successful, or a structured error.
async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, ProviderError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "<failed to read error body>".to_string());

    let message = format_http_error(status.as_u16(), &body);
    error!(%status, %message, "generateContent returned HTTP error");
    Err(ProviderError::Request(message))
}

/// Render an HTTP error from the Gemini error envelope when the body carries
/// one, or from the raw body otherwise.
fn format_http_error(status: u16, body: &str) -> String {
    if let Ok(env) = serde_json::from_str::<ErrorEnvelope>(body) {
        let code = env
            .error
            .status
            .map(|s| format!(" [{s}]"))
            .unwrap_or_default();
        format!("HTTP {status}{code}: {}", env.error.message)
    } else {
        format!("HTTP {status}: {body}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider() -> GeminiProvider {
        GeminiProvider::new(
            "https://generativelanguage.googleapis.com/v1beta".into(),
            "gemini-flash-latest".into(),
            0.7,
            1,
            "test-key".into(),
        )
        .unwrap()
    }

    #[test]
    fn endpoint_includes_model() {
        assert_eq!(
            provider().endpoint(),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-flash-latest:generateContent"
        );
    }

    #[test]
    fn endpoint_tolerates_trailing_slash() {
        let p = GeminiProvider::new(
            "http://localhost:8080/v1beta/".into(),
            "m".into(),
            0.0,
            1,
            "k".into(),
        )
        .unwrap();
        assert_eq!(p.endpoint(), "http://localhost:8080/v1beta/models/m:generateContent");
    }

    #[test]
    fn json_mode_request_sets_mime_type() {
        let payload = GenerateContentRequest {
            contents: vec![Content {
                role: "user".into(),
                parts: vec![Part { text: "hi".into() }],
            }],
            generation_config: GenerationConfig {
                // 0.5 is exactly representable, so the JSON value compares cleanly.
                temperature: 0.5,
                response_mime_type: Some(JSON_MIME_TYPE.into()),
            },
        };
        let v = serde_json::to_value(&payload).unwrap();
        assert_eq!(v["generationConfig"]["responseMimeType"], "application/json");
        assert_eq!(v["generationConfig"]["temperature"], 0.5);
        assert_eq!(v["contents"][0]["role"], "user");
        assert_eq!(v["contents"][0]["parts"][0]["text"], "hi");
    }

    #[test]
    fn plain_mode_request_omits_mime_type() {
        let payload = GenerateContentRequest {
            contents: vec![],
            generation_config: GenerationConfig {
                temperature: 0.5,
                response_mime_type: None,
            },
        };
        let v = serde_json::to_value(&payload).unwrap();
        assert!(v["generationConfig"].get("responseMimeType").is_none());
    }

    #[test]
    fn extract_text_joins_parts() {
        let body = r#"{
            "candidates": [{"content": {"parts": [{"text": "Hello "}, {"text": "world"}]}}],
            "usageMetadata": {"promptTokenCount": 10, "candidatesTokenCount": 5}
        }"#;
        let parsed: GenerateContentResponse = serde_json::from_str(body).unwrap();
        assert_eq!(extract_text(parsed).unwrap(), "Hello world");
    }

    #[test]
    fn extract_text_empty_candidates_is_none() {
        let parsed: GenerateContentResponse = serde_json::from_str(r#"{"candidates": []}"#).unwrap();
        assert!(extract_text(parsed).is_none());
    }

    #[test]
    fn extract_text_whitespace_only_is_none() {
        let body = r#"{"candidates": [{"content": {"parts": [{"text": "  \n"}]}}]}"#;
        let parsed: GenerateContentResponse = serde_json::from_str(body).unwrap();
        assert!(extract_text(parsed).is_none());
    }

    #[test]
    fn http_error_uses_envelope() {
        let body = r#"{"error": {"code": 400, "message": "API key not valid", "status": "INVALID_ARGUMENT"}}"#;
        let msg = format_http_error(400, body);
        assert_eq!(msg, "HTTP 400 [INVALID_ARGUMENT]: API key not valid");
    }

    #[test]
    fn http_error_falls_back_to_raw_body() {
        let msg = format_http_error(502, "Bad Gateway");
        assert_eq!(msg, "HTTP 502: Bad Gateway");
    }
}
