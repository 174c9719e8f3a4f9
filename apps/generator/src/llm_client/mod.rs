//! LLM Client: the single point of entry for all Gemini API calls.
//!
//! ARCHITECTURAL RULE: No other module may call the model API directly.
//! All model interactions MUST go through this module.
//!
//! Responses are free text that should contain a fenced json code block;
//! `parse_structured` extracts and deserializes it.

use reqwest::Client;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

pub mod prompts;

const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_MODEL: &str = "gemini-2.5-pro";
const MAX_OUTPUT_TOKENS: u32 = 8192;
const TEMPERATURE: f32 = 0.7;
const MAX_RETRIES: u32 = 3;
/// Transport-level ceiling. Callers apply their own, usually shorter, deadlines.
const HTTP_TIMEOUT_SECS: u64 = 600;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Rate limited after {retries} retries")]
    RateLimited { retries: u32 },

    #[error("LLM returned empty content")]
    EmptyContent,
}

// ────────────────────────────────────────────────────────────────────────────
// Wire types (generateContent)
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
    system_instruction: SystemInstruction<'a>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    role: &'a str,
    parts: Vec<PartReq<'a>>,
}

#[derive(Debug, Serialize)]
struct SystemInstruction<'a> {
    parts: Vec<PartReq<'a>>,
}

#[derive(Debug, Serialize)]
struct PartReq<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LlmResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    #[serde(default)]
    pub usage_metadata: Option<UsageMetadata>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    #[serde(default)]
    pub content: Option<CandidateContent>,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CandidateContent {
    #[serde(default)]
    pub parts: Vec<PartResp>,
}

#[derive(Debug, Deserialize)]
pub struct PartResp {
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageMetadata {
    #[serde(default)]
    pub prompt_token_count: Option<u32>,
    #[serde(default)]
    pub candidates_token_count: Option<u32>,
}

impl LlmResponse {
    /// Concatenated text of the first candidate's parts.
    pub fn text(&self) -> Option<String> {
        let parts = &self.candidates.first()?.content.as_ref()?.parts;
        let text: String = parts.iter().filter_map(|p| p.text.as_deref()).collect();
        if text.trim().is_empty() {
            None
        } else {
            Some(text)
        }
    }
}

#[derive(Debug, Deserialize)]
struct GeminiError {
    error: GeminiErrorBody,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorBody {
    message: String,
}

// ────────────────────────────────────────────────────────────────────────────
// Client
// ────────────────────────────────────────────────────────────────────────────

/// The single LLM client. Constructed once in `main` and passed to the
/// generation service; never a global.
#[derive(Clone)]
pub struct LlmClient {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl LlmClient {
    pub fn new(api_key: String, model: String) -> Result<Self, LlmError> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(HTTP_TIMEOUT_SECS))
            .build()?;
        Ok(Self {
            client,
            api_key,
            model,
            base_url: GEMINI_API_BASE.to_string(),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Makes a raw generateContent call, returning the full response object.
    /// Retries on 429 (rate limit) and 5xx errors with exponential backoff.
    pub async fn call(&self, prompt: &str, system: &str) -> Result<LlmResponse, LlmError> {
        let url = format!("{}/models/{}:generateContent", self.base_url, self.model);
        let request_body = GenerateContentRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![PartReq { text: prompt }],
            }],
            system_instruction: SystemInstruction {
                parts: vec![PartReq { text: system }],
            },
            generation_config: GenerationConfig {
                temperature: TEMPERATURE,
                max_output_tokens: MAX_OUTPUT_TOKENS,
            },
        };

        let mut last_error: Option<LlmError> = None;

        for attempt in 0..MAX_RETRIES {
            if attempt > 0 {
                // Exponential backoff: 1s, 2s
                let delay = std::time::Duration::from_millis(1000 * (1 << (attempt - 1)));
                warn!(
                    "LLM call attempt {} failed, retrying after {}ms...",
                    attempt,
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
            }

            let response = self
                .client
                .post(&url)
                .header("x-goog-api-key", &self.api_key)
                .header("content-type", "application/json")
                .json(&request_body)
                .send()
                .await;

            let response = match response {
                Ok(r) => r,
                Err(e) => {
                    last_error = Some(LlmError::Http(e));
                    continue;
                }
            };

            let status = response.status();

            if status.as_u16() == 429 || status.is_server_error() {
                let body = response.text().await.unwrap_or_default();
                warn!("LLM API returned {}: {}", status, body);
                last_error = Some(LlmError::Api {
                    status: status.as_u16(),
                    message: body,
                });
                continue;
            }

            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                let message = serde_json::from_str::<GeminiError>(&body)
                    .map(|e| e.error.message)
                    .unwrap_or(body);
                return Err(LlmError::Api {
                    status: status.as_u16(),
                    message,
                });
            }

            let llm_response: LlmResponse = response.json().await?;

            if let Some(usage) = &llm_response.usage_metadata {
                debug!(
                    "LLM call succeeded: model={}, prompt_tokens={:?}, output_tokens={:?}",
                    self.model, usage.prompt_token_count, usage.candidates_token_count
                );
            }

            return Ok(llm_response);
        }

        Err(last_error.unwrap_or(LlmError::RateLimited {
            retries: MAX_RETRIES,
        }))
    }

    /// Calls the model and returns the response text.
    pub async fn complete(&self, prompt: &str, system: &str) -> Result<String, LlmError> {
        let response = self.call(prompt, system).await?;
        match response.text() {
            Some(text) => Ok(text),
            None => {
                let reason = response
                    .candidates
                    .first()
                    .and_then(|c| c.finish_reason.clone())
                    .unwrap_or_else(|| "none".to_string());
                warn!("LLM returned no text (finish_reason={reason})");
                Err(LlmError::EmptyContent)
            }
        }
    }

    /// Calls the model and deserializes the structured payload of its reply.
    pub async fn call_json<T: DeserializeOwned>(
        &self,
        prompt: &str,
        system: &str,
    ) -> Result<T, LlmError> {
        let text = self.complete(prompt, system).await?;
        parse_structured(&text).map_err(LlmError::Parse)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Structured payload extraction
// ────────────────────────────────────────────────────────────────────────────

/// Result of looking for a fenced code block in model output.
#[derive(Debug, PartialEq, Eq)]
pub enum Extraction<'a> {
    Found(&'a str),
    NotFound,
}

/// Finds the first ```json block, else the first ``` block of any language.
/// An unterminated fence yields everything after the opening line.
pub fn extract_json_block(text: &str) -> Extraction<'_> {
    let start = match text.find("```json") {
        Some(i) => i,
        None => match text.find("```") {
            Some(i) => i,
            None => return Extraction::NotFound,
        },
    };

    // Skip the fence and its language tag
    let after_fence = &text[start + 3..];
    let body = match after_fence.find('\n') {
        Some(nl) => &after_fence[nl + 1..],
        None => after_fence.trim_start_matches(|c: char| c.is_ascii_alphanumeric()),
    };

    let payload = match body.find("```") {
        Some(end) => &body[..end],
        None => body,
    };
    Extraction::Found(payload.trim())
}

/// Deserializes the fenced payload, falling back to the whole text.
pub fn parse_structured<T: DeserializeOwned>(text: &str) -> Result<T, serde_json::Error> {
    let payload = match extract_json_block(text) {
        Extraction::Found(payload) => payload,
        Extraction::NotFound => text.trim(),
    };
    serde_json::from_str(payload)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Deserialize)]
    struct Probe {
        key: String,
    }

    #[test]
    fn test_extract_json_block_with_json_tag() {
        let input = "```json\n{\"key\": \"value\"}\n```";
        assert_eq!(extract_json_block(input), Extraction::Found("{\"key\": \"value\"}"));
    }

    #[test]
    fn test_extract_json_block_without_tag() {
        let input = "```\n{\"key\": \"value\"}\n```";
        assert_eq!(extract_json_block(input), Extraction::Found("{\"key\": \"value\"}"));
    }

    #[test]
    fn test_extract_json_block_no_fences() {
        let input = "{\"key\": \"value\"}";
        assert_eq!(extract_json_block(input), Extraction::NotFound);
    }

    #[test]
    fn test_extract_json_block_with_surrounding_prose() {
        let input = "Here is the result:\n```json\n{\"key\": \"v\"}\n```\nHope this helps.";
        assert_eq!(extract_json_block(input), Extraction::Found("{\"key\": \"v\"}"));
    }

    #[test]
    fn test_extract_prefers_json_block_over_earlier_fence() {
        let input = "```text\nnotes\n```\n```json\n{\"key\": \"v\"}\n```";
        assert_eq!(extract_json_block(input), Extraction::Found("{\"key\": \"v\"}"));
    }

    #[test]
    fn test_extract_unterminated_fence() {
        let input = "```json\n{\"key\": \"v\"}";
        assert_eq!(extract_json_block(input), Extraction::Found("{\"key\": \"v\"}"));
    }

    #[test]
    fn test_parse_structured_falls_back_to_whole_text() {
        let probe: Probe = parse_structured("  {\"key\": \"plain\"}  ").unwrap();
        assert_eq!(probe.key, "plain");
    }

    #[test]
    fn test_parse_structured_reports_malformed_payload() {
        let result: Result<Probe, _> = parse_structured("```json\n{\"key\": \n```");
        assert!(result.is_err());
    }

    #[test]
    fn test_response_text_joins_parts() {
        let body = r#"{
            "candidates": [{"content": {"parts": [{"text": "```json\n"}, {"text": "{}\n```"}]}, "finishReason": "STOP"}],
            "usageMetadata": {"promptTokenCount": 10, "candidatesTokenCount": 5}
        }"#;
        let response: LlmResponse = serde_json::from_str(body).unwrap();
        assert_eq!(response.text().as_deref(), Some("```json\n{}\n```"));
    }

    #[test]
    fn test_response_without_candidates_has_no_text() {
        let response: LlmResponse = serde_json::from_str(r#"{"candidates": []}"#).unwrap();
        assert!(response.text().is_none());
    }
}
