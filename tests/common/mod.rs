//! Shared test utilities and fixtures
//!
//! A mock backend speaking the chat API, plus session builders.

#![allow(dead_code)]

use serde_json::{Value, json};
use wiremock::matchers::{method, path, path_regex, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use tether_api::ApiClientConfig;
use tether_sync::Session;
use tether_types::{AccessToken, ConversationId, SummaryMessage};

pub async fn start_backend() -> MockServer {
    MockServer::start().await
}

pub fn session(server: &MockServer, token: Option<&str>) -> Session {
    let config = ApiClientConfig::new(&server.uri()).expect("mock server uri is a valid base url");
    Session::new(config, token.and_then(AccessToken::new)).expect("client builds")
}

pub fn conv(id: &str) -> ConversationId {
    ConversationId::new(id).expect("non-empty id")
}

pub fn standup_messages() -> Vec<SummaryMessage> {
    vec![
        SummaryMessage::new("deploy is green", "2024-06-03T09:00:00Z", "ana"),
        SummaryMessage::new("I'll write the changelog", "2024-06-03T09:02:00Z", "bo"),
        SummaryMessage::new("ping me for review", "2024-06-03T09:05:00Z", "cy"),
    ]
}

pub async fn mount_unread_count(server: &MockServer, platform: &str, count: i64) {
    Mock::given(method("GET"))
        .and(path("/api/unread-counts"))
        .and(query_param("platform", platform))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "count": count })))
        .up_to_n_times(1)
        .mount(server)
        .await;
}

/// Any `/api/chats/{id}/mute` GET answers with `muted`.
pub async fn mount_mute_status(server: &MockServer, muted: bool) {
    Mock::given(method("GET"))
        .and(path_regex(r"^/api/chats/[^/]+/mute$"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "muted": muted })))
        .mount(server)
        .await;
}

pub async fn mount_ok(server: &MockServer, http_method: &str, route: &str) {
    mount_json(server, http_method, route, 200, json!({})).await;
}

pub async fn mount_json(server: &MockServer, http_method: &str, route: &str, status: u16, body: Value) {
    Mock::given(method(http_method))
        .and(path(route))
        .respond_with(ResponseTemplate::new(status).set_body_json(body))
        .mount(server)
        .await;
}

/// Requests the server saw for `route`, in arrival order.
pub async fn requests_to(server: &MockServer, route: &str) -> Vec<wiremock::Request> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .into_iter()
        .filter(|request| request.url.path() == route)
        .collect()
}
