//! Unmount, overlap and timeout behavior of hooks against a slow backend.

use std::future::Future;
use std::pin::pin;
use std::task::{Context, Waker};
use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use tether_api::ApiClientConfig;
use tether_sync::{Hook, Session};
use tether_types::{AccessToken, Platform};

use crate::common::{conv, session, start_backend};

async fn mount_slow_unread(server: &MockServer, count: u64, delay: Duration) {
    Mock::given(method("GET"))
        .and(path("/api/unread-counts"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "count": count }))
                .set_delay(delay),
        )
        .mount(server)
        .await;
}

#[tokio::test]
async fn dispose_mid_flight_clears_loading() {
    let server = start_backend().await;
    mount_slow_unread(&server, 9, Duration::from_millis(300)).await;

    let session = session(&server, None);
    let unread = tether_sync::UnreadCount::new(session.client().clone(), Platform::Discord);

    let mut refetch = pin!(unread.refetch());
    let mut cx = Context::from_waker(Waker::noop());
    assert!(refetch.as_mut().poll(&mut cx).is_pending());
    assert!(unread.is_loading());

    unread.dispose();
    assert!(!unread.is_loading());
    assert_eq!(refetch.await, None);
    assert!(!unread.is_loading());
    assert_eq!(unread.count(), None);
    assert!(unread.flags().error.is_none());

    // Later calls never reach the network.
    assert_eq!(unread.refetch().await, None);
}

#[tokio::test]
async fn overlapping_actions_settle_to_not_loading() {
    let server = start_backend().await;
    Mock::given(method("POST"))
        .and(path("/api/bookmarks"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(80)))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/bookmarks"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({"message": "dup"})))
        .mount(&server)
        .await;

    let session = session(&server, None);
    let hook = session.add_bookmark();
    let message = tether_types::MessageId::new("m-1").unwrap();

    let (first, second) = tokio::join!(
        hook.add(&message, Platform::Discord),
        hook.add(&message, Platform::Discord),
    );
    // One of the two requests failed; which one depends on arrival order.
    assert_ne!(first, second);
    let flags = hook.flags();
    assert!(!flags.loading);
    // The later-issued call owns the final state.
    assert_eq!(flags.success, second);
    assert_eq!(flags.error.is_some(), !second);
}

#[tokio::test]
async fn hung_backend_times_out() {
    let server = start_backend().await;
    Mock::given(method("GET"))
        .and(path("/api/chats/slow/mute"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"muted": true}))
                .set_delay(Duration::from_secs(5)),
        )
        .mount(&server)
        .await;

    let config = ApiClientConfig::new(&server.uri())
        .unwrap()
        .with_request_timeout(Duration::from_millis(100));
    let session = Session::new(config, AccessToken::new("tok")).unwrap();

    let status = session.mute_status(conv("slow")).await;
    assert_eq!(status.muted(), None);
    assert!(!status.is_loading());
    let error = status.flags().error.unwrap();
    assert!(error.contains("timed out"), "unexpected error: {error}");

    let toggle = session.toggle_mute();
    assert!(!toggle.toggle(&conv("slow"), Platform::Discord, false).await);
    assert!(!toggle.is_loading());
}
