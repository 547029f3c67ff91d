//! Groq chat-completions backend (OpenAI 相容 API，免費方案)

use super::{failure_reason, request_failure};
use crate::domain::model::{AttemptOutcome, CompletionRequest};
use crate::domain::ports::ModelBackend;
use crate::utils::error::{Result, ScribeError};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

pub const GROQ_BASE_URL: &str = "https://api.groq.com/openai/v1";

/// 能力最強的排前面，後面是較小或較舊的備援模型
pub const DEFAULT_GROQ_MODELS: &[&str] = &[
    "llama-3.3-70b-versatile",
    "llama-3.1-70b-versatile",
    "llama-3.1-8b-instant",
    "mixtral-8x7b-32768",
    "llama3-70b-8192",
    "llama3-8b-8192",
];

/// 模型下架或被限流時 Groq 回傳的錯誤代碼
const RETRYABLE_CODES: &[&str] = &["model_not_found", "model_decommissioned", "rate_limit_exceeded"];

#[derive(Debug, Clone)]
pub struct GroqClient {
    client: Client,
    api_key: String,
    base_url: String,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ApiError,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    message: String,
    #[serde(default)]
    code: Option<String>,
}

impl GroqClient {
    pub fn new(api_key: &str, base_url: &str) -> Result<Self> {
        if api_key.trim().is_empty() {
            return Err(ScribeError::MissingConfigError {
                field: "GROQ_API_KEY".to_string(),
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

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }
}

/// 依 HTTP 狀態碼與錯誤代碼分類，不比對訊息字串
pub(crate) fn classify_failure(status: StatusCode, body: &str) -> AttemptOutcome {
    let parsed = serde_json::from_str::<ErrorEnvelope>(body).ok();
    let code = parsed.as_ref().and_then(|e| e.error.code.as_deref());
    let message = parsed
        .as_ref()
        .map(|e| e.error.message.as_str())
        .unwrap_or(body);
    let reason = failure_reason(status, message);

    let quota_exceeded =
        status == StatusCode::TOO_MANY_REQUESTS || code == Some("rate_limit_exceeded");
    let retryable = status == StatusCode::NOT_FOUND
        || quota_exceeded
        || code.is_some_and(|c| RETRYABLE_CODES.contains(&c));

    if retryable {
        AttemptOutcome::Retryable {
            reason,
            quota_exceeded,
        }
    } else {
        AttemptOutcome::Fatal { reason }
    }
}

#[async_trait]
impl ModelBackend for GroqClient {
    fn provider_name(&self) -> &'static str {
        "groq"
    }

    async fn attempt(&self, model: &str, request: CompletionRequest<'_>) -> AttemptOutcome {
        let body = ChatRequest {
            model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: request.system_prompt,
                },
                ChatMessage {
                    role: "user",
                    content: request.user_prompt,
                },
            ],
            temperature: request.temperature,
            max_tokens: request.max_output_tokens,
        };

        let response = match self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
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

        let parsed: ChatResponse = match serde_json::from_str(&text) {
            Ok(parsed) => parsed,
            Err(e) => {
                return AttemptOutcome::Fatal {
                    reason: format!("Failed to parse Groq response: {}", e),
                }
            }
        };

        match parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|c| !c.is_empty())
        {
            Some(content) => AttemptOutcome::Success(content),
            None => AttemptOutcome::Fatal {
                reason: "Empty response from Groq".to_string(),
            },
        }
    }
}
