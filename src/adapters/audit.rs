use crate::domain::ports::{AuditEvent, AuditSink};
use crate::utils::error::Result;
use async_trait::async_trait;

/// 把稽核事件寫到 `medscribe::audit` tracing target，之後可換成持久化儲存
#[derive(Debug, Default, Clone)]
pub struct TracingAuditSink;

#[async_trait]
impl AuditSink for TracingAuditSink {
    async fn record(&self, event: AuditEvent) -> Result<()> {
        let details = serde_json::to_string(&event.details)?;
        tracing::info!(
            target: "medscribe::audit",
            user_id = %event.user_id,
            action = event.action,
            entity_type = event.entity_type,
            entity_id = event.entity_id.as_deref().unwrap_or(""),
            %details,
            "audit"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_record_accepts_event() {
        let sink = TracingAuditSink;
        let event = AuditEvent {
            user_id: "doctor-1".to_string(),
            action: "generate_document",
            entity_type: "Document",
            entity_id: None,
            details: serde_json::json!({ "type": "case_sheet" }),
        };
        tokio_test::assert_ok!(sink.record(event).await);
    }
}
