//! Config file driving a session.

use std::fs;
use std::time::Duration;

use serde_json::json;
use tempfile::tempdir;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, ResponseTemplate};

use tether_api::WaitlistEncoding;
use tether_config::TetherConfig;
use tether_sync::{Hook, Session};

use crate::common::start_backend;

#[tokio::test]
async fn config_file_selects_backend_and_waitlist_encoding() {
    let server = start_backend().await;
    Mock::given(method("POST"))
        .and(path("/api/waitlist/join"))
        .and(body_json(json!({"email": "new@example.com"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"position": 12})))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempdir().unwrap();
    let config_path = dir.path().join("config.toml");
    fs::write(
        &config_path,
        format!(
            "[api]\nbase_url = \"{}\"\nrequest_timeout_secs = 3\n\n[waitlist]\nencoding = \"json\"\n",
            server.uri()
        ),
    )
    .unwrap();

    let config = TetherConfig::load_from(&config_path).unwrap().unwrap();
    let client_config = config.client_config().unwrap();
    assert_eq!(client_config.request_timeout, Duration::from_secs(3));

    let session = Session::new(client_config, None)
        .unwrap()
        .with_waitlist_encoding(config.waitlist_encoding());
    let waitlist = session.join_waitlist();
    assert_eq!(waitlist.encoding(), WaitlistEncoding::Json);
    assert!(waitlist.join("new@example.com").await);
    assert!(waitlist.flags().success);
}
