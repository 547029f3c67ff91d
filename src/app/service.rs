use crate::core::generator::DocumentGenerator;
use crate::core::rate_limit::{RateLimitDecision, RateLimiter};
use crate::domain::model::{GenerationMode, GenerationRequest, UserRole};
use crate::domain::ports::{AuditEvent, AuditSink};
use crate::utils::error::{Result, ScribeError};
use serde_json::json;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    pub user_id: String,
    pub role: UserRole,
}

impl Caller {
    pub fn new(user_id: impl Into<String>, role: UserRole) -> Self {
        Self {
            user_id: user_id.into(),
            role,
        }
    }
}

/// 對外入口：角色檢查 → 每位使用者的限流 → 產生文件，成功後寫入稽核紀錄
pub struct DocumentService {
    generator: DocumentGenerator,
    limiter: RateLimiter,
    audit: Arc<dyn AuditSink>,
}

impl DocumentService {
    pub fn new(generator: DocumentGenerator, limiter: RateLimiter, audit: Arc<dyn AuditSink>) -> Self {
        Self {
            generator,
            limiter,
            audit,
        }
    }

    pub fn generator(&self) -> &DocumentGenerator {
        &self.generator
    }

    fn authorize(&self, caller: &Caller) -> Result<()> {
        if caller.role.can_access_sensitive_action() {
            return Ok(());
        }
        Err(ScribeError::Forbidden {
            role: caller.role.as_str().to_string(),
            action: "generate documents".to_string(),
        })
    }

    fn throttle(&self, caller: &Caller) -> Result<RateLimitDecision> {
        let decision = self.limiter.admit(&caller.user_id);
        if !decision.allowed {
            tracing::warn!(user_id = %caller.user_id, "🚦 Document generation rate limited");
            return Err(ScribeError::RateLimited {
                retry_after: decision.retry_after,
            });
        }
        Ok(decision)
    }

    /// 執行一次產生或重新產生；`document_id` 只用於稽核紀錄
    pub async fn process(
        &self,
        caller: &Caller,
        request: &GenerationRequest,
        document_id: Option<&str>,
    ) -> Result<String> {
        self.authorize(caller)?;
        let decision = self.throttle(caller)?;
        tracing::debug!(
            user_id = %caller.user_id,
            remaining = decision.remaining,
            "Rate limit admitted"
        );

        let text = self.generator.run(request).await?;

        let event = match request.mode {
            GenerationMode::Generate => AuditEvent {
                user_id: caller.user_id.clone(),
                action: "generate_document",
                entity_type: "Document",
                entity_id: document_id.map(str::to_string),
                details: json!({
                    "type": request.document_kind.as_str(),
                    "template": request.specialty_key,
                    "customTemplate": request.custom_template.is_some(),
                    "includeIcd10": request.include_code_suggestions,
                }),
            },
            GenerationMode::Regenerate => AuditEvent {
                user_id: caller.user_id.clone(),
                action: "update_document",
                entity_type: "Document",
                entity_id: document_id.map(str::to_string),
                details: json!({ "regenerate": true }),
            },
        };

        // 稽核失敗不影響已產生的文件
        if let Err(e) = self.audit.record(event).await {
            tracing::error!(error = %e, "Audit log failed");
        }

        Ok(text)
    }
}
