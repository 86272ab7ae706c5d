//! Server-side session helpers against a mock API

use nomdoc_http::NomdocClient;
use nomdoc_http::client::oauth::OAuthClient;
use nomdoc_http::session::{fetch_server_session, initial_status};
use nomdoc_core::{AccessToken, SessionStatus};
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn oauth_for(server: &MockServer) -> OAuthClient {
    OAuthClient::new(NomdocClient::new(server.uri()).unwrap())
}

#[tokio::test]
async fn test_forwards_refresh_cookie() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .and(header("cookie", "refresh_token=r1;"))
        .and(body_partial_json(json!({"grantType": "refresh_token"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "accessToken": "T1",
            "accessTokenExpiredAt": 1000,
            "refreshToken": "r2"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let cookie_header = "theme=dark; refresh_token=r1";
    assert_eq!(initial_status(Some(cookie_header)), SessionStatus::Loading);

    let session = fetch_server_session(&oauth_for(&server), Some(cookie_header))
        .await
        .unwrap();
    assert_eq!(session.access_token, AccessToken::new("T1", 1000));
    assert_eq!(session.refresh_token.as_deref(), Some("r2"));
}

#[tokio::test]
async fn test_no_session_without_cookie_or_on_rejection() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"message": "expired"})))
        .expect(1)
        .mount(&server)
        .await;

    let oauth = oauth_for(&server);
    assert!(fetch_server_session(&oauth, None).await.is_none());
    assert!(fetch_server_session(&oauth, Some("theme=dark")).await.is_none());
    assert!(
        fetch_server_session(&oauth, Some("refresh_token=stale"))
            .await
            .is_none()
    );
}
