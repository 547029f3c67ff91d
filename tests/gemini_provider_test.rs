use httpmock::prelude::*;
use medscribe::adapters::gemini::GeminiClient;
use medscribe::core::fallback::FallbackChain;
use medscribe::domain::model::PromptPair;
use medscribe::{ScribeError, TextCompletionProvider};
use serde_json::json;

fn candidate(parts: &[&str]) -> serde_json::Value {
    let parts: Vec<_> = parts.iter().map(|t| json!({ "text": t })).collect();
    json!({
        "candidates": [
            { "content": { "role": "model", "parts": parts }, "finishReason": "STOP" }
        ]
    })
}

fn exhausted() -> serde_json::Value {
    json!({
        "error": {
            "code": 429,
            "message": "You exceeded your current quota, please check your plan and billing details.",
            "status": "RESOURCE_EXHAUSTED"
        }
    })
}

fn chain(server: &MockServer, models: &[&str]) -> FallbackChain<GeminiClient> {
    let client = GeminiClient::new("gemini_test", &server.base_url()).unwrap();
    FallbackChain::new(client, models.iter().map(|m| m.to_string()).collect())
}

#[tokio::test]
async fn test_missing_model_then_success_joins_parts() {
    let server = MockServer::start_async().await;

    let missing = server
        .mock_async(|when, then| {
            when.method(POST).path("/models/gemini-1.5-flash:generateContent");
            then.status(404).json_body(json!({
                "error": {
                    "code": 404,
                    "message": "models/gemini-1.5-flash is not found for API version v1beta",
                    "status": "NOT_FOUND"
                }
            }));
        })
        .await;
    let ok = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/models/gemini-2.0-flash:generateContent")
                .header("x-goog-api-key", "gemini_test")
                .body_contains("You are a scribe.\\n\\nWrite the case sheet.")
                .body_contains("\"maxOutputTokens\":2500");
            then.status(200)
                .header("Content-Type", "application/json")
                .json_body(candidate(&["CASE SHEET\n", "History: cough"]));
        })
        .await;

    let text = chain(&server, &["gemini-1.5-flash", "gemini-2.0-flash"])
        .complete(&PromptPair::new("You are a scribe.", "Write the case sheet."), 2500)
        .await
        .unwrap();

    assert_eq!(text, "CASE SHEET\nHistory: cough");
    missing.assert_async().await;
    ok.assert_async().await;
}

#[tokio::test]
async fn test_quota_on_every_model_is_exhausted_with_groq_hint() {
    let server = MockServer::start_async().await;

    let first = server
        .mock_async(|when, then| {
            when.method(POST).path("/models/gemini-1.5-flash:generateContent");
            then.status(429).json_body(exhausted());
        })
        .await;
    let second = server
        .mock_async(|when, then| {
            when.method(POST).path("/models/gemini-pro:generateContent");
            then.status(429).json_body(exhausted());
        })
        .await;

    let err = chain(&server, &["gemini-1.5-flash", "gemini-pro"])
        .complete(&PromptPair::new("system", "user"), 2000)
        .await
        .unwrap_err();

    match &err {
        ScribeError::GenerationExhausted {
            provider,
            attempts,
            quota_exceeded,
            ..
        } => {
            assert_eq!(provider, "gemini");
            assert_eq!(*attempts, 2);
            assert!(*quota_exceeded);
        }
        other => panic!("expected GenerationExhausted, got {other:?}"),
    }
    assert!(err.recovery_suggestion().contains("GROQ_API_KEY"));
    first.assert_async().await;
    second.assert_async().await;
}

#[tokio::test]
async fn test_invalid_key_stops_the_chain() {
    let server = MockServer::start_async().await;

    let first = server
        .mock_async(|when, then| {
            when.method(POST).path("/models/gemini-1.5-flash:generateContent");
            then.status(400).json_body(json!({
                "error": {
                    "code": 400,
                    "message": "API key not valid. Please pass a valid API key.",
                    "status": "INVALID_ARGUMENT"
                }
            }));
        })
        .await;
    let second = server
        .mock_async(|when, then| {
            when.method(POST).path("/models/gemini-pro:generateContent");
            then.status(200).json_body(candidate(&["unused"]));
        })
        .await;

    let err = chain(&server, &["gemini-1.5-flash", "gemini-pro"])
        .complete(&PromptPair::new("system", "user"), 2000)
        .await
        .unwrap_err();

    assert!(matches!(err, ScribeError::ProviderFatal { .. }));
    assert!(err.to_string().contains("API key not valid"));
    first.assert_async().await;
    second.assert_hits_async(0).await;
}

#[tokio::test]
async fn test_candidate_without_text_is_fatal() {
    let server = MockServer::start_async().await;

    server
        .mock_async(|when, then| {
            when.method(POST).path("/models/gemini-1.5-flash:generateContent");
            then.status(200).json_body(json!({
                "candidates": [ { "finishReason": "SAFETY" } ]
            }));
        })
        .await;

    let err = chain(&server, &["gemini-1.5-flash", "gemini-pro"])
        .complete(&PromptPair::new("system", "user"), 2000)
        .await
        .unwrap_err();

    assert!(err.to_string().contains("Empty response from Gemini"));
}

#[tokio::test]
async fn test_single_turn_prompt_ends_with_answer_cue() {
    let server = MockServer::start_async().await;

    let completion = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/models/gemini-1.5-flash:generateContent")
                .body_contains("You are a scribe.\\n\\nWrite the summary.\\n\\nDischarge Summary:");
            then.status(200).json_body(candidate(&["DISCHARGE SUMMARY"]));
        })
        .await;

    let prompts = PromptPair::new("You are a scribe.", "Write the summary.")
        .with_answer_cue("Discharge Summary:");
    let text = chain(&server, &["gemini-1.5-flash"])
        .complete(&prompts, 2000)
        .await
        .unwrap();

    assert_eq!(text, "DISCHARGE SUMMARY");
    completion.assert_async().await;
}

#[tokio::test]
async fn test_whitespace_only_text_is_a_success() {
    let server = MockServer::start_async().await;

    let first = server
        .mock_async(|when, then| {
            when.method(POST).path("/models/gemini-1.5-flash:generateContent");
            then.status(200).json_body(candidate(&[" ", "\n"]));
        })
        .await;
    let second = server
        .mock_async(|when, then| {
            when.method(POST).path("/models/gemini-pro:generateContent");
            then.status(200).json_body(candidate(&["unused"]));
        })
        .await;

    let text = chain(&server, &["gemini-1.5-flash", "gemini-pro"])
        .complete(&PromptPair::new("system", "user"), 2000)
        .await
        .unwrap();

    assert_eq!(text, " \n");
    first.assert_async().await;
    second.assert_hits_async(0).await;
}
