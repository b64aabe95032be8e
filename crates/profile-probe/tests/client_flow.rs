//! End-to-end tests of the session → validate → fetch → extract flow
//! against a mock upstream.

use std::time::Duration;

use serde_json::json;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use wiremock::matchers::{header, header_regex, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use profile_probe::config::{ClientConfig, ProfileEndpoint};
use profile_probe::types::ConnectionKind;
use profile_probe::{
    build_session, extract, fetch_profile, validate, ConnectionSource, Credentials,
    FieldValue, HttpConnectionSource, ProbeError, ProfileField, RawProfileDocument,
};

// ─────────────────────── helpers ───────────────────────

fn config_for(server: &MockServer) -> ClientConfig {
    ClientConfig::with_base(&format!("{}/", server.uri()))
}

/// Base URL of a local port nothing is listening on.
fn dead_base() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    format!("http://127.0.0.1:{port}/")
}

fn creds_with_token() -> Credentials {
    Credentials::new("sid-123", Some("tok-abc".to_string()))
}

/// Base URL of a server that sends headers and the start of a body, then stalls.
async fn stalled_body_base() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            tokio::spawn(async move {
                let mut buf = [0u8; 4096];
                let _ = socket.read(&mut buf).await;
                let _ = socket
                    .write_all(
                        b"HTTP/1.1 200 OK\r\nContent-Type: application/json\r\n\
                          Content-Length: 100\r\n\r\n{\"data\":",
                    )
                    .await;
                tokio::time::sleep(Duration::from_secs(3)).await;
            });
        }
    });
    format!("http://127.0.0.1:{port}/")
}

async fn mount_profile(server: &MockServer, username: &str, status: u16, body: &str) {
    Mock::given(method("GET"))
        .and(path("/api/v1/users/web_profile_info/"))
        .and(query_param("username", username))
        .respond_with(ResponseTemplate::new(status).set_body_string(body))
        .mount(server)
        .await;
}

// ─────────────────────── session builder ───────────────────────

#[tokio::test]
async fn test_discovers_csrf_from_root_cookie() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("set-cookie", "csrftoken=found-it; Path=/; Secure"),
        )
        .expect(1)
        .mount(&server)
        .await;

    let ctx = build_session(Credentials::new("sid-123", None), config_for(&server))
        .await
        .unwrap();

    assert_eq!(ctx.csrf_token(), Some("found-it"));
    assert!(!ctx.is_csrf_less());
}

#[tokio::test]
async fn test_discovered_csrf_is_sent_on_later_requests() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(
            ResponseTemplate::new(200).insert_header("set-cookie", "csrftoken=found-it; Path=/"),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/users/web_profile_info/"))
        .and(header("X-CSRFToken", "found-it"))
        .and(header_regex("cookie", "csrftoken=found-it"))
        .and(header_regex("cookie", "sessionid=sid-123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": {"user": {}}})))
        .expect(1)
        .mount(&server)
        .await;

    let ctx = build_session(Credentials::new("sid-123", None), config_for(&server))
        .await
        .unwrap();
    let doc = fetch_profile(&ctx, "alice").await.unwrap();
    assert!(doc.is_json());
}

#[tokio::test]
async fn test_missing_csrf_cookie_gives_csrf_less_context_that_fails_validation() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html></html>"))
        .expect(1)
        .mount(&server)
        .await;

    let ctx = build_session(Credentials::new("sid-123", None), config_for(&server))
        .await
        .expect("context is still usable without a CSRF token");

    assert!(ctx.is_csrf_less());
    assert!(!validate(&ctx).await);
}

#[tokio::test]
async fn test_discovery_transport_failure_is_transport_error() {
    let config = ClientConfig::with_base(&dead_base());
    let err = build_session(Credentials::new("sid-123", None), config)
        .await
        .unwrap_err();
    assert!(matches!(err, ProbeError::Transport(_)), "got {err:?}");
}

// ─────────────────────── validator ───────────────────────

#[tokio::test]
async fn test_validate_sends_session_cookie_and_csrf_header() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .and(header("X-CSRFToken", "tok-abc"))
        .and(header_regex("cookie", "sessionid=sid-123"))
        .and(header_regex("cookie", "csrftoken=tok-abc"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let ctx = build_session(creds_with_token(), config_for(&server))
        .await
        .unwrap();
    assert!(validate(&ctx).await);
}

#[tokio::test]
async fn test_validate_false_on_non_success() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(403).set_body_string("forbidden"))
        .mount(&server)
        .await;

    let ctx = build_session(creds_with_token(), config_for(&server))
        .await
        .unwrap();
    assert!(!validate(&ctx).await);
}

#[tokio::test]
async fn test_validate_false_on_transport_failure() {
    let config = ClientConfig::with_base(&dead_base());
    let ctx = build_session(creds_with_token(), config).await.unwrap();

    assert!(!validate(&ctx).await);
}

// ─────────────────────── fetcher ───────────────────────

#[tokio::test]
async fn test_fetch_returns_json_document() {
    let server = MockServer::start().await;
    mount_profile(
        &server,
        "alice",
        200,
        r#"{"data":{"user":{"id":"123","is_verified":true}}}"#,
    )
    .await;

    let ctx = build_session(creds_with_token(), config_for(&server))
        .await
        .unwrap();
    let doc = fetch_profile(&ctx, "alice").await.unwrap();
    assert_eq!(
        doc,
        RawProfileDocument::Json(json!({"data":{"user":{"id":"123","is_verified":true}}}))
    );

    let record = extract(&doc, "alice");
    assert_eq!(record["Username"], "alice");
    assert_eq!(record["Profile ID"], "123");
    assert_eq!(record["Verified Account"], true);
    for (field, value) in record.iter() {
        if !matches!(
            field,
            ProfileField::Username | ProfileField::ProfileId | ProfileField::VerifiedAccount
        ) {
            assert_eq!(value, &FieldValue::Missing, "{field}");
        }
    }
}

#[tokio::test]
async fn test_fetch_non_success_is_fetch_error_with_status() {
    let server = MockServer::start().await;
    mount_profile(&server, "ghost", 404, r#"{"message":"not found"}"#).await;

    let ctx = build_session(creds_with_token(), config_for(&server))
        .await
        .unwrap();
    let err = fetch_profile(&ctx, "ghost").await.unwrap_err();

    match err {
        ProbeError::Fetch { status, body } => {
            assert_eq!(status, Some(404));
            assert!(body.contains("not found"));
        }
        other => panic!("expected fetch error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_fetch_falls_back_to_text_for_html() {
    let server = MockServer::start().await;
    let page = r#"<html><script>{"edge_followed_by":{"count":42}}</script></html>"#;
    Mock::given(method("GET"))
        .and(path("/bob/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(page))
        .mount(&server)
        .await;

    let config = ClientConfig {
        endpoint: ProfileEndpoint::ProfilePage,
        ..config_for(&server)
    };
    let ctx = build_session(creds_with_token(), config).await.unwrap();
    let doc = fetch_profile(&ctx, "bob").await.unwrap();

    assert!(matches!(doc, RawProfileDocument::Text(_)));
    let record = extract(&doc, "bob");
    assert_eq!(record[ProfileField::FollowersCount].to_string(), "42");
    assert!(record[ProfileField::FollowingCount].is_missing());
}

#[tokio::test]
async fn test_fetch_timeout_is_status_less_fetch_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/users/web_profile_info/"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(1_000)))
        .mount(&server)
        .await;

    let config = ClientConfig {
        request_timeout_ms: 100,
        ..config_for(&server)
    };
    let ctx = build_session(creds_with_token(), config).await.unwrap();
    let err = fetch_profile(&ctx, "slowpoke").await.unwrap_err();

    assert!(err.is_timeout(), "got {err:?}");
    assert_eq!(err.status(), None);
}

#[tokio::test]
async fn test_stalled_body_is_status_less_fetch_error() {
    let config = ClientConfig {
        request_timeout_ms: 300,
        ..ClientConfig::with_base(&stalled_body_base().await)
    };
    let ctx = build_session(creds_with_token(), config).await.unwrap();

    let err = fetch_profile(&ctx, "alice").await.unwrap_err();
    assert!(err.is_timeout(), "got {err:?}");

    let err = HttpConnectionSource
        .list(&ctx, "123", ConnectionKind::Followers, 5)
        .await
        .unwrap_err();
    assert!(err.is_timeout(), "got {err:?}");
}

#[tokio::test]
async fn test_invalid_username_rejected_before_request() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let ctx = build_session(creds_with_token(), config_for(&server))
        .await
        .unwrap();
    let err = fetch_profile(&ctx, "no/such user").await.unwrap_err();
    assert!(matches!(err, ProbeError::InvalidUsername(_)));
}

// ─────────────────────── connections ───────────────────────

#[tokio::test]
async fn test_lists_one_page_of_followers() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/friendships/123/followers/"))
        .and(query_param("count", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "users": [{"username": "ann"}, {"username": "ben"}, {"username": "cy"}],
            "next_max_id": "2"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let ctx = build_session(creds_with_token(), config_for(&server))
        .await
        .unwrap();
    let names = HttpConnectionSource
        .list(&ctx, "123", ConnectionKind::Followers, 2)
        .await
        .unwrap();
    assert_eq!(names, vec!["ann".to_string(), "ben".to_string()]);
}

#[tokio::test]
async fn test_connections_error_carries_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/friendships/123/following/"))
        .respond_with(ResponseTemplate::new(429).set_body_string("slow down"))
        .mount(&server)
        .await;

    let ctx = build_session(creds_with_token(), config_for(&server))
        .await
        .unwrap();
    let err = HttpConnectionSource
        .list(&ctx, "123", ConnectionKind::Following, 10)
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(429));
}

#[tokio::test]
async fn test_connections_require_numeric_id() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let ctx = build_session(creds_with_token(), config_for(&server))
        .await
        .unwrap();
    for user_id in ["", "abc"] {
        let err = HttpConnectionSource
            .list(&ctx, user_id, ConnectionKind::Followers, 10)
            .await
            .unwrap_err();
        assert!(matches!(err, ProbeError::MissingProfileId(_)), "got {err:?}");
        assert!(!err.is_timeout());
    }
}
