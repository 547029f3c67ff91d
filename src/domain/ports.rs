use crate::domain::model::{AttemptOutcome, CompletionRequest, PromptPair};
use crate::utils::error::Result;
use async_trait::async_trait;
use serde_json::Value;

/// 文件產生器依賴的文字生成能力，每個行程只有一個實作在運作
#[async_trait]
pub trait TextCompletionProvider: Send + Sync {
    fn provider_name(&self) -> &str;

    async fn complete(&self, prompts: &PromptPair, max_output_tokens: u32) -> Result<String>;
}

/// 對 provider 的單一模型發出一次 HTTP 呼叫
#[async_trait]
pub trait ModelBackend: Send + Sync {
    fn provider_name(&self) -> &'static str;

    async fn attempt(&self, model: &str, request: CompletionRequest<'_>) -> AttemptOutcome;
}

#[derive(Debug, Clone, PartialEq)]
pub struct AuditEvent {
    pub user_id: String,
    pub action: &'static str,
    pub entity_type: &'static str,
    pub entity_id: Option<String>,
    pub details: Value,
}

#[async_trait]
pub trait AuditSink: Send + Sync {
    async fn record(&self, event: AuditEvent) -> Result<()>;
}
