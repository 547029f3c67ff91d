//! Google Gemini `generateContent` backend，沒有 Groq key 時使用

use super::{failure_reason, request_failure};
use crate::domain::model::{AttemptOutcome, CompletionRequest};
use crate::domain::ports::ModelBackend;
use crate::utils::error::{Result, ScribeError};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

pub const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

pub const DEFAULT_GEMINI_MODELS: &[&str] = &[
    "gemini-1.5-flash",
    "gemini-1.5-flash-latest",
    "gemini-1.0-pro",
    "gemini-1.5-pro",
    "gemini-pro",
    "gemini-2.0-flash",
];

#[derive(Debug, Clone)]
pub struct GeminiClient {
    client: Client,
    api_key: String,
    base_url: String,
}

// -- 請求型別 --

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: [Content<'a>; 1],
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    role: &'static str,
    parts: [Part<'a>; 1],
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
}

// -- 回應型別 --

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
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
struct ErrorEnvelope {
    error: ApiError,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    message: String,
    #[serde(default)]
    status: Option<String>,
}

impl GeminiClient {
    pub fn new(api_key: &str, base_url: &str) -> Result<Self> {
        if api_key.trim().is_empty() {
            return Err(ScribeError::MissingConfigError {
                field: "GEMINI_API_KEY".to_string(),
            });
        }

        let client = Client::builder()
            .build()
            .map_err(|e| ScribeError::config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_key: api_key.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn endpoint(&self, model: &str) -> String {
        format!("{}/models/{}:generateContent", self.base_url, model)
    }
}

/// 不是每個 Gemini 模型都有 system 角色，兩段 prompt 合成一則 user 訊息，有結尾提示時附在最後
fn combined_prompt(request: &CompletionRequest<'_>) -> String {
    let mut prompt = format!("{}\n\n{}", request.system_prompt, request.user_prompt);
    if !request.answer_cue.is_empty() {
        prompt.push_str("\n\n");
        prompt.push_str(request.answer_cue);
    }
    prompt
}

pub(crate) fn classify_failure(status: StatusCode, body: &str) -> AttemptOutcome {
    let parsed = serde_json::from_str::<ErrorEnvelope>(body).ok();
    let api_status = parsed.as_ref().and_then(|e| e.error.status.as_deref());
    let message = parsed
        .as_ref()
        .map(|e| e.error.message.as_str())
        .unwrap_or(body);
    let reason = failure_reason(status, message);

    let quota_exceeded =
        status == StatusCode::TOO_MANY_REQUESTS || api_status == Some("RESOURCE_EXHAUSTED");
    let not_found = status == StatusCode::NOT_FOUND || api_status == Some("NOT_FOUND");

    if quota_exceeded || not_found {
        AttemptOutcome::Retryable {
            reason,
            quota_exceeded,
        }
    } else {
        AttemptOutcome::Fatal { reason }
    }
}

#[async_trait]
impl ModelBackend for GeminiClient {
    fn provider_name(&self) -> &'static str {
        "gemini"
    }

    async fn attempt(&self, model: &str, request: CompletionRequest<'_>) -> AttemptOutcome {
        let prompt = combined_prompt(&request);
        let body = GenerateContentRequest {
            contents: [Content {
                role: "user",
                parts: [Part { text: &prompt }],
            }],
            generation_config: GenerationConfig {
                temperature: request.temperature,
                max_output_tokens: request.max_output_tokens,
            },
        };

        let response = match self
            .client
            .post(self.endpoint(model))
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => return request_failure(e),
        };

        let status = response.status();
        let text = match response.text().await {
            Ok(text) => text,
            Err(e) => return request_failure(e),
        };

        if !status.is_success() {
            return classify_failure(status, &text);
        }

        let parsed: GenerateContentResponse = match serde_json::from_str(&text) {
            Ok(parsed) => parsed,
            Err(e) => {
                return AttemptOutcome::Fatal {
                    reason: format!("Failed to parse Gemini response: {}", e),
                }
            }
        };

        let content: String = parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();

        if content.is_empty() {
            return AttemptOutcome::Fatal {
                reason: "Empty response from Gemini".to_string(),
            };
        }
        AttemptOutcome::Success(content)
    }
}
