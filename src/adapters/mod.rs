// Adapters 層：domain ports 背後的 provider 與 sink 實作

pub mod audit;
pub mod gemini;
pub mod groq;

use crate::config::{ProviderChoice, ProviderConfig};
use crate::core::fallback::FallbackChain;
use crate::domain::model::AttemptOutcome;
use crate::domain::ports::TextCompletionProvider;
use crate::utils::error::Result;
use reqwest::StatusCode;
use std::sync::Arc;

pub use audit::TracingAuditSink;
pub use gemini::GeminiClient;
pub use groq::GroqClient;

const MAX_REASON_CHARS: usize = 200;

/// 錯誤內容截斷，避免把整段回應寫進日誌
pub(crate) fn failure_reason(status: StatusCode, message: &str) -> String {
    let message = message.trim();
    if message.is_empty() {
        return status.to_string();
    }
    let truncated: String = message.chars().take(MAX_REASON_CHARS).collect();
    format!("{}: {}", status, truncated)
}

/// 連線層錯誤沒有重試依據，直接結束模型鏈
pub(crate) fn request_failure(error: reqwest::Error) -> AttemptOutcome {
    AttemptOutcome::Fatal {
        reason: format!("request failed: {}", error),
    }
}

/// 建立本行程唯一啟用的 provider
pub fn build_provider(config: &ProviderConfig) -> Result<Arc<dyn TextCompletionProvider>> {
    let provider: Arc<dyn TextCompletionProvider> = match config.select()? {
        ProviderChoice::Groq => {
            let client = GroqClient::new(config.groq_api_key(), config.groq_base_url())?;
            Arc::new(FallbackChain::new(client, config.groq_models()))
        }
        ProviderChoice::Gemini => {
            let client = GeminiClient::new(config.gemini_api_key(), config.gemini_base_url())?;
            Arc::new(FallbackChain::new(client, config.gemini_models()))
        }
    };

    tracing::info!(provider = provider.provider_name(), "Text provider selected");
    Ok(provider)
}
