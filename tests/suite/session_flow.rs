//! A user opening, reading and muting conversations, then signing out.

use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, ResponseTemplate};

use tether_sync::Hook;
use tether_types::{ChatSelection, Platform};

use crate::common::{
    conv, mount_json, mount_mute_status, mount_ok, mount_unread_count, requests_to, session,
    start_backend,
};

#[tokio::test]
async fn opening_a_conversation_loads_history_once() {
    let server = start_backend().await;
    mount_ok(&server, "GET", "/api/chats/general/read").await;
    let session = session(&server, Some("tok"));
    let chat = conv("general");

    let (session, chat) = (&session, &chat);
    for _ in 0..3 {
        session
            .fetched()
            .ensure_loaded(chat, move || async move {
                let status = session.read_status(chat.clone(), Platform::Discord).await;
                match status.flags().error {
                    Some(error) => Err(error),
                    None => Ok(()),
                }
            })
            .await
            .unwrap();
    }

    assert!(session.fetched().is_fetched(chat));
    assert_eq!(requests_to(&server, "/api/chats/general/read").await.len(), 1);
}

#[tokio::test]
async fn sign_out_forces_history_reload_and_drops_token() {
    let server = start_backend().await;
    mount_ok(&server, "GET", "/api/chats/general/read").await;
    let session = session(&server, Some("tok"));
    let chat = conv("general");

    let (session, chat) = (&session, &chat);
    let load = move || async move {
        session
            .read_status(chat.clone(), Platform::Tg)
            .await
            .is_read()
            .map(|_| ())
            .ok_or("read status unavailable")
    };

    assert!(session.fetched().ensure_loaded(chat, load).await.unwrap());
    session.sign_out();
    assert!(!session.fetched().is_fetched(chat));
    assert!(session.fetched().ensure_loaded(chat, load).await.unwrap());

    let requests = requests_to(&server, "/api/chats/general/read").await;
    assert_eq!(requests.len(), 2);
    assert!(requests[0].headers.get("authorization").is_some());
    assert!(requests[1].headers.get("authorization").is_none());
}

#[tokio::test]
async fn toggle_then_refetch_confirms_mute() {
    let server = start_backend().await;
    Mock::given(method("POST"))
        .and(path("/api/chats/chat-42/mute"))
        .and(body_json(json!({"platform": "discord", "muted": true})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;
    mount_mute_status(&server, true).await;

    let session = session(&server, None);
    let toggle = session.toggle_mute();
    assert!(toggle.toggle(&conv("chat-42"), Platform::Discord, true).await);

    let flags = toggle.flags();
    assert!(flags.success);
    assert!(flags.error.is_none());
    assert!(!flags.loading);

    let status = session.mute_status(conv("chat-42")).await;
    assert_eq!(status.muted(), Some(true));
}

#[tokio::test]
async fn toggle_rejected_by_server() {
    let server = start_backend().await;
    mount_json(
        &server,
        "POST",
        "/api/chats/chat-42/mute",
        403,
        json!({"message": "forbidden"}),
    )
    .await;

    let session = session(&server, Some("tok"));
    let toggle = session.toggle_mute();
    assert!(!toggle.toggle(&conv("chat-42"), Platform::Discord, true).await);

    let flags = toggle.flags();
    assert!(!flags.success);
    assert_eq!(flags.error.as_deref(), Some("forbidden"));
    assert!(!flags.loading);
}

#[tokio::test]
async fn unread_count_survives_outage() {
    let server = start_backend().await;
    mount_unread_count(&server, "tg", 5).await;
    mount_json(&server, "GET", "/api/unread-counts", 503, json!({"message": "maintenance"})).await;

    let session = session(&server, None);
    let unread = session.unread_count(Platform::Tg).await;
    assert_eq!(unread.count(), Some(5));

    assert_eq!(unread.refetch().await, Some(5));
    assert_eq!(unread.flags().error.as_deref(), Some("maintenance"));

    let other = session.unread_count(Platform::Discord).await;
    assert_eq!(other.count(), None);
}

#[tokio::test]
async fn bulk_read_across_chats() {
    let server = start_backend().await;
    Mock::given(method("POST"))
        .and(path("/api/messages/mark-all-read"))
        .and(header("authorization", "Bearer tok"))
        .and(body_json(json!({"platform": "discord", "chat_ids": "a,b,c"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"updated": 3})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/chats/a/read"))
        .and(query_param("platform", "discord"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"read": true})))
        .expect(1)
        .mount(&server)
        .await;

    let session = session(&server, Some("tok"));
    let selection = ChatSelection::from(vec![conv("a"), conv("b"), conv("c")]);
    assert!(session.mark_all_messages_read().mark_all(Platform::Discord, selection).await);
    assert!(session.mark_as_read().mark(&conv("a"), Platform::Discord).await);
}
