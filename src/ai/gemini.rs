//! Google Generative Language adapter.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use tracker_core::TrackerError;

use super::AiCollaborator;
use crate::config::AiConfig;

const TOOL: &str = "gemini";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);
const NOT_CONFIGURED: &str = "AI not configured. Run 'pt ai config --api-key YOUR_API_KEY' first.";

#[derive(Debug, Clone)]
pub struct GeminiClient {
    client: reqwest::Client,
    config: AiConfig,
}

impl GeminiClient {
    /// Build a client from a resolved configuration. Fails when no API key is set.
    pub fn new(config: AiConfig) -> tracker_core::Result<Self> {
        let key = config
            .api_key
            .as_deref()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| TrackerError::external(TOOL, NOT_CONFIGURED))?;

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let key_value = HeaderValue::from_str(key)
            .map_err(|_| TrackerError::external(TOOL, "invalid API key format"))?;
        headers.insert("x-goog-api-key", key_value);

        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .default_headers(headers)
            .build()
            .map_err(|e| {
                TrackerError::external(TOOL, format!("failed to create HTTP client: {e}"))
            })?;

        Ok(Self { client, config })
    }

    fn generate_url(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.config.base_url.trim_end_matches('/'),
            self.config.model
        )
    }
}

// =============================================================================
// API TYPES
// =============================================================================

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    contents: [Content<'a>; 1],
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content<'a> {
    role: &'static str,
    parts: [RequestPart<'a>; 1],
}

#[derive(Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    error: Option<ApiError>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Deserialize)]
struct ApiError {
    message: Option<String>,
}

#[async_trait]
impl AiCollaborator for GeminiClient {
    async fn generate(&self, prompt: &str) -> tracker_core::Result<String> {
        let request = GenerateRequest {
            contents: [Content {
                role: "user",
                parts: [RequestPart { text: prompt }],
            }],
            generation_config: GenerationConfig {
                temperature: self.config.temperature,
                max_output_tokens: self.config.max_tokens,
            },
        };

        let response = self
            .client
            .post(self.generate_url())
            .json(&request)
            .send()
            .await
            .map_err(|e| TrackerError::external(TOOL, e.to_string()))?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| TrackerError::external(TOOL, e.to_string()))?;
        tracing::debug!(
            status = status.as_u16(),
            bytes = body.len(),
            "gemini response"
        );

        let parsed = serde_json::from_str::<GenerateResponse>(&body);
        if !status.is_success() {
            let message = parsed
                .ok()
                .and_then(|r| r.error)
                .and_then(|e| e.message)
                .unwrap_or_else(|| format!("HTTP {}", status.as_u16()));
            return Err(TrackerError::external(TOOL, message));
        }

        let parsed = parsed
            .map_err(|e| TrackerError::MalformedAiResponse(format!("unexpected payload: {e}")))?;
        let text: String = parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(TrackerError::MalformedAiResponse("empty response".into()));
        }
        Ok(text)
    }
}
