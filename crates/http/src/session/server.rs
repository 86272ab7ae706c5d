//! Helpers for rendering a session on the server
//!
//! A server receives the browser's `Cookie` header. It may decide the initial
//! status from it, and may exchange the refresh token on the browser's behalf
//! before rendering.

use crate::client::oauth::OAuthClient;
use cookie::{Cookie, SameSite};
use nomdoc_core::{AccessToken, CookieConfig, SessionStatus};
use std::collections::HashMap;

pub const REFRESH_TOKEN_COOKIE: &str = "refresh_token";

/// Session obtained by exchanging a forwarded refresh cookie
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerSession {
    pub access_token: AccessToken,
    /// Rotated refresh token to set on the browser, if the server issued one
    pub refresh_token: Option<String>,
}

/// Split a `Cookie` header into percent-decoded name/value pairs
///
/// Malformed pairs are skipped.
pub fn parse_cookies(header: &str) -> HashMap<String, String> {
    Cookie::split_parse_encoded(header)
        .filter_map(Result::ok)
        .map(|cookie| (cookie.name().to_string(), cookie.value().to_string()))
        .collect()
}

fn refresh_token_from(cookie_header: Option<&str>) -> Option<String> {
    parse_cookies(cookie_header?)
        .remove(REFRESH_TOKEN_COOKIE)
        .filter(|value| !value.is_empty())
}

/// `Loading` when the browser holds a refresh cookie, `Unauthenticated` otherwise
#[must_use]
pub fn initial_status(cookie_header: Option<&str>) -> SessionStatus {
    if refresh_token_from(cookie_header).is_some() {
        SessionStatus::Loading
    } else {
        SessionStatus::Unauthenticated
    }
}

/// Exchange the browser's refresh cookie for a session
///
/// Returns `None` when there is no cookie or the exchange fails.
pub async fn fetch_server_session(
    oauth: &OAuthClient,
    cookie_header: Option<&str>,
) -> Option<ServerSession> {
    let refresh_token = refresh_token_from(cookie_header)?;
    match oauth.exchange_refresh_cookie(&refresh_token).await {
        Ok(response) => Some(ServerSession {
            access_token: response.access_token(),
            refresh_token: response.refresh_token,
        }),
        Err(err) => {
            debug!(error = %err, "server-side session exchange failed");
            None
        }
    }
}

/// `Set-Cookie` value for a refresh token
pub fn refresh_token_cookie(token: &str, config: &CookieConfig) -> String {
    let max_age = i64::try_from(config.max_age_secs).unwrap_or(i64::MAX);
    Cookie::build((REFRESH_TOKEN_COOKIE, token))
        .domain(config.domain.as_str())
        .path("/")
        .max_age(cookie::time::Duration::seconds(max_age))
        .http_only(true)
        .secure(true)
        .same_site(SameSite::Strict)
        .build()
        .encoded()
        .to_string()
}
