use crate::domain::model::{AttemptOutcome, CompletionRequest, PromptPair, ProviderAttempt};
use crate::domain::ports::{ModelBackend, TextCompletionProvider};
use crate::utils::error::{Result, ScribeError};
use async_trait::async_trait;

/// 低溫度讓臨床用語保守一致
pub const GENERATION_TEMPERATURE: f32 = 0.3;

/// 依序嘗試同一 backend 的模型清單，回傳第一個成功的結果
///
/// 一次只試一個模型；可重試的失敗換下一個，致命錯誤直接中止
pub struct FallbackChain<B: ModelBackend> {
    backend: B,
    models: Vec<String>,
}

/// 把失敗紀錄壓成一行，例如 `m1 (429 ...); m2 (404 ...)`
fn describe_trail(failures: &[ProviderAttempt]) -> String {
    failures
        .iter()
        .map(|f| format!("{} ({})", f.model, f.reason))
        .collect::<Vec<_>>()
        .join("; ")
}

impl<B: ModelBackend> FallbackChain<B> {
    pub fn new(backend: B, models: Vec<String>) -> Self {
        Self { backend, models }
    }

    pub fn models(&self) -> &[String] {
        &self.models
    }

    pub async fn run(&self, request: CompletionRequest<'_>) -> Result<String> {
        let provider = self.backend.provider_name();
        let mut failures: Vec<ProviderAttempt> = Vec::with_capacity(self.models.len());

        for model in &self.models {
            tracing::debug!(provider, model = %model, "Attempting completion");

            match self.backend.attempt(model, request).await {
                AttemptOutcome::Success(text) => {
                    tracing::info!(
                        provider,
                        model = %model,
                        attempts = failures.len() + 1,
                        chars = text.len(),
                        "✅ Completion succeeded"
                    );
                    return Ok(text);
                }
                AttemptOutcome::Retryable {
                    reason,
                    quota_exceeded,
                } => {
                    tracing::warn!(provider, model = %model, %reason, "Model unavailable, trying next");
                    failures.push(ProviderAttempt {
                        model: model.clone(),
                        reason,
                        quota_exceeded,
                    });
                }
                AttemptOutcome::Fatal { reason } => {
                    tracing::error!(provider, model = %model, %reason, "❌ Fatal provider error");
                    return Err(ScribeError::ProviderFatal {
                        provider: provider.to_string(),
                        model: Some(model.clone()),
                        reason,
                    });
                }
            }
        }

        tracing::error!(
            provider,
            attempts = failures.len(),
            trail = %describe_trail(&failures),
            "❌ Every candidate model failed"
        );
        let attempts = failures.len();
        let (last_reason, quota_exceeded) = match failures.pop() {
            Some(last) => (last.reason, last.quota_exceeded),
            None => ("no models configured".to_string(), false),
        };
        Err(ScribeError::GenerationExhausted {
            provider: provider.to_string(),
            attempts,
            last_reason,
            quota_exceeded,
        })
    }
}

#[async_trait]
impl<B: ModelBackend> TextCompletionProvider for FallbackChain<B> {
    fn provider_name(&self) -> &str {
        self.backend.provider_name()
    }

    async fn complete(&self, prompts: &PromptPair, max_output_tokens: u32) -> Result<String> {
        self.run(CompletionRequest {
            system_prompt: &prompts.system_prompt,
            user_prompt: &prompts.user_prompt,
            answer_cue: prompts.answer_cue,
            max_output_tokens,
            temperature: GENERATION_TEMPERATURE,
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// 每個模型回放固定結果，並記錄呼叫順序
    struct ScriptedBackend {
        outcomes: HashMap<String, AttemptOutcome>,
        calls: Mutex<Vec<String>>,
        cues: Mutex<Vec<String>>,
    }

    impl ScriptedBackend {
        fn new(outcomes: &[(&str, AttemptOutcome)]) -> Self {
            Self {
                outcomes: outcomes
                    .iter()
                    .map(|(m, o)| (m.to_string(), o.clone()))
                    .collect(),
                calls: Mutex::new(Vec::new()),
                cues: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        fn cues(&self) -> Vec<String> {
            self.cues.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ModelBackend for ScriptedBackend {
        fn provider_name(&self) -> &'static str {
            "scripted"
        }

        async fn attempt(&self, model: &str, request: CompletionRequest<'_>) -> AttemptOutcome {
            assert_eq!(request.temperature, GENERATION_TEMPERATURE);
            self.calls.lock().unwrap().push(model.to_string());
            self.cues.lock().unwrap().push(request.answer_cue.to_string());
            self.outcomes
                .get(model)
                .cloned()
                .unwrap_or(AttemptOutcome::Fatal {
                    reason: "unexpected model".to_string(),
                })
        }
    }

    fn quota() -> AttemptOutcome {
        AttemptOutcome::Retryable {
            reason: "429 quota exceeded".to_string(),
            quota_exceeded: true,
        }
    }

    fn prompts() -> PromptPair {
        PromptPair::new("system", "user")
    }

    fn models(names: &[&str]) -> Vec<String> {
        names.iter().map(|m| m.to_string()).collect()
    }

    #[tokio::test]
    async fn test_third_model_succeeds_after_two_quota_errors() {
        let backend = ScriptedBackend::new(&[
            ("m1", quota()),
            ("m2", quota()),
            ("m3", AttemptOutcome::Success("summary text".to_string())),
            ("m4", AttemptOutcome::Success("should never be used".to_string())),
        ]);
        let chain = FallbackChain::new(backend, models(&["m1", "m2", "m3", "m4"]));

        let text = chain.complete(&prompts(), 2000).await.unwrap();

        assert_eq!(text, "summary text");
        assert_eq!(chain.backend.calls(), vec!["m1", "m2", "m3"]);
    }

    #[tokio::test]
    async fn test_fatal_error_stops_the_chain() {
        let backend = ScriptedBackend::new(&[
            (
                "m1",
                AttemptOutcome::Fatal {
                    reason: "401 invalid api key".to_string(),
                },
            ),
            ("m2", AttemptOutcome::Success("unused".to_string())),
        ]);
        let chain = FallbackChain::new(backend, models(&["m1", "m2"]));

        let err = chain.complete(&prompts(), 2000).await.unwrap_err();

        match err {
            ScribeError::ProviderFatal { model, reason, .. } => {
                assert_eq!(model.as_deref(), Some("m1"));
                assert!(reason.contains("401"));
            }
            other => panic!("expected ProviderFatal, got {other:?}"),
        }
        assert_eq!(chain.backend.calls(), vec!["m1"]);
    }

    #[tokio::test]
    async fn test_exhaustion_carries_last_retryable_reason() {
        let backend = ScriptedBackend::new(&[
            ("m1", quota()),
            (
                "m2",
                AttemptOutcome::Retryable {
                    reason: "404 model not found".to_string(),
                    quota_exceeded: false,
                },
            ),
        ]);
        let chain = FallbackChain::new(backend, models(&["m1", "m2"]));

        let err = chain.complete(&prompts(), 2000).await.unwrap_err();

        match err {
            ScribeError::GenerationExhausted {
                attempts,
                last_reason,
                quota_exceeded,
                ..
            } => {
                assert_eq!(attempts, 2);
                assert_eq!(last_reason, "404 model not found");
                assert!(!quota_exceeded);
            }
            other => panic!("expected GenerationExhausted, got {other:?}"),
        }
    }

    #[test]
    fn test_trail_lists_every_failed_model_in_order() {
        let trail = describe_trail(&[
            ProviderAttempt {
                model: "m1".to_string(),
                reason: "429 quota exceeded".to_string(),
                quota_exceeded: true,
            },
            ProviderAttempt {
                model: "m2".to_string(),
                reason: "404 model not found".to_string(),
                quota_exceeded: false,
            },
        ]);
        assert_eq!(trail, "m1 (429 quota exceeded); m2 (404 model not found)");
    }

    #[tokio::test]
    async fn test_answer_cue_reaches_the_backend() {
        let backend = ScriptedBackend::new(&[("m1", AttemptOutcome::Success("ok".to_string()))]);
        let chain = FallbackChain::new(backend, models(&["m1"]));

        chain
            .complete(&prompts().with_answer_cue("Case Sheet:"), 2500)
            .await
            .unwrap();

        assert_eq!(chain.backend.cues(), vec!["Case Sheet:"]);
    }

    #[tokio::test]
    async fn test_empty_model_list_is_exhausted_immediately() {
        let chain = FallbackChain::new(ScriptedBackend::new(&[]), vec![]);
        let err = chain.complete(&prompts(), 100).await.unwrap_err();
        assert!(matches!(err, ScribeError::GenerationExhausted { attempts: 0, .. }));
    }
}
