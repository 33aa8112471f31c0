//! AI summary flows through a session.

use serde_json::json;
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, ResponseTemplate};

use tether_api::{ApiError, MISSING_TOKEN_MESSAGE};
use tether_sync::Hook;
use tether_types::{AccessToken, Platform};

use crate::common::{conv, requests_to, session, standup_messages, start_backend};

#[tokio::test]
async fn chat_summary_needs_sign_in_first() {
    let server = start_backend().await;
    Mock::given(method("POST"))
        .and(path("/api/discord/chats/standup/summary"))
        .and(header("authorization", "Bearer fresh"))
        .and(body_string_contains("minutes=15"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"summary": "deploy done"})))
        .expect(1)
        .mount(&server)
        .await;

    let session = session(&server, None);
    let hook = session.chat_summary();

    let err = hook
        .generate(&conv("standup"), &standup_messages(), None, Some(15))
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::MissingToken(_)));
    assert_eq!(hook.flags().error.as_deref(), Some(MISSING_TOKEN_MESSAGE));
    assert!(requests_to(&server, "/api/discord/chats/standup/summary").await.is_empty());

    session.sign_in(AccessToken::new("fresh").unwrap());
    let summary = hook
        .generate(&conv("standup"), &standup_messages(), None, Some(15))
        .await
        .unwrap();
    assert_eq!(summary.summary, "deploy done");
    assert!(hook.flags().success);
}

#[tokio::test]
async fn summarize_without_token_goes_out_unauthenticated() {
    let server = start_backend().await;
    Mock::given(method("POST"))
        .and(path("/api/summarize-messages"))
        .and(body_string_contains("extract_tasks=false"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "text": "quiet morning",
            "action_items": [],
        })))
        .mount(&server)
        .await;

    let session = session(&server, None);
    let summary = session
        .summarize_messages()
        .summarize(&standup_messages(), false, Platform::Discord)
        .await
        .unwrap();
    assert_eq!(summary.summary, "quiet morning");
    assert!(summary.tasks.is_empty());

    let requests = requests_to(&server, "/api/summarize-messages").await;
    assert!(requests[0].headers.get("authorization").is_none());
}

#[tokio::test]
async fn ai_conversations_empty_then_populated() {
    let server = start_backend().await;
    Mock::given(method("GET"))
        .and(path("/api/v2/ai/conversations"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"conversations": []})))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v2/ai/conversations"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": "c-9"}])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v2/ai/conversations/c-9"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "c-9",
            "title": "Roadmap",
            "messages": [],
            "model": "gpt-4o",
        })))
        .expect(1)
        .mount(&server)
        .await;

    let session = session(&server, None);
    let hook = session.ai_conversations();

    assert!(hook.fetch().await.unwrap().is_none());
    assert!(hook.flags().success);

    let conversation = hook.fetch().await.unwrap().unwrap();
    assert_eq!(conversation.title.as_deref(), Some("Roadmap"));
    assert_eq!(conversation.extra.get("model"), Some(&json!("gpt-4o")));
}
