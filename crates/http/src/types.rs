//! Wire types of the authentication and graph endpoints

use crate::client::error::ClientError;
use nomdoc_core::AccessToken;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// Token endpoint request, discriminated by `grantType`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "grantType", rename_all = "snake_case")]
pub enum TokenGrant {
    /// Exchange the refresh-token cookie for a new token pair
    RefreshToken,
    #[serde(rename_all = "camelCase")]
    Password {
        email_address: String,
        password: String,
    },
    /// Exchange a mailed login token
    #[serde(rename_all = "camelCase")]
    LoginToken { login_token: String },
    #[serde(rename_all = "camelCase")]
    GoogleIdToken { google_id_token: String },
}

impl TokenGrant {
    /// Grant name as sent on the wire
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::RefreshToken => "refresh_token",
            Self::Password { .. } => "password",
            Self::LoginToken { .. } => "login_token",
            Self::GoogleIdToken { .. } => "google_id_token",
        }
    }
}

/// Validated token endpoint response
#[derive(Clone, PartialEq, Eq)]
pub struct TokenResponse {
    pub access_token: String,
    /// Unix timestamp in seconds
    pub access_token_expired_at: i64,
    /// Also set as an httpOnly cookie by the server
    pub refresh_token: Option<String>,
}

impl std::fmt::Debug for TokenResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenResponse")
            .field("access_token", &"<redacted>")
            .field("access_token_expired_at", &self.access_token_expired_at)
            .field("refresh_token", &self.refresh_token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl TokenResponse {
    /// Validate a raw token endpoint body
    ///
    /// The body must carry a string `accessToken` and a numeric
    /// `accessTokenExpiredAt`; anything else is an invalid token response.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidTokenResponse`] naming the offending field
    pub fn from_body(body: &JsonValue) -> Result<Self, ClientError> {
        let access_token = body
            .get("accessToken")
            .and_then(JsonValue::as_str)
            .ok_or_else(|| ClientError::InvalidTokenResponse("accessToken is not a string".into()))?;

        let expired_at = body.get("accessTokenExpiredAt").ok_or_else(|| {
            ClientError::InvalidTokenResponse("accessTokenExpiredAt is missing".into())
        })?;
        let access_token_expired_at = expired_at
            .as_i64()
            // Fractional timestamps are truncated to whole seconds
            .or_else(|| expired_at.as_f64().map(|secs| secs as i64))
            .ok_or_else(|| {
                ClientError::InvalidTokenResponse("accessTokenExpiredAt is not a number".into())
            })?;

        let refresh_token = body
            .get("refreshToken")
            .and_then(JsonValue::as_str)
            .map(str::to_string);

        Ok(Self {
            access_token: access_token.to_string(),
            access_token_expired_at,
            refresh_token,
        })
    }

    #[must_use]
    pub fn access_token(&self) -> AccessToken {
        AccessToken::new(self.access_token.clone(), self.access_token_expired_at)
    }
}

/// Login token request sent to the authorize endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginTokenRequest {
    /// Always `login_token`
    pub response_type: String,
    pub email_address: String,
}

impl LoginTokenRequest {
    pub fn new(email_address: impl Into<String>) -> Self {
        Self {
            response_type: "login_token".to_string(),
            email_address: email_address.into(),
        }
    }
}

/// Authorize endpoint response: where the login token was mailed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginTokenResponse {
    pub email_address: String,
}

/// Account registration request
#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub email_address: String,
    pub password: String,
    /// Proof issued by the bot-verification service
    pub recaptcha_token: String,
}

impl std::fmt::Debug for RegisterRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisterRequest")
            .field("email_address", &self.email_address)
            .finish_non_exhaustive()
    }
}

/// Graph query request
#[derive(Debug, Clone, Serialize)]
pub struct GraphRequest<'a, V: Serialize> {
    pub query: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variables: Option<&'a V>,
}

/// Graph query response envelope
#[derive(Debug, Clone, Deserialize)]
pub struct GraphResponse<T> {
    pub data: Option<T>,
    pub errors: Option<Vec<GraphError>>,
}

/// A single error reported by the graph endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphError {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub location: Vec<GraphErrorLocation>,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub path: Vec<String>,
    #[serde(default)]
    pub status_code: String,
}

/// Position of a graph error inside the query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphErrorLocation {
    pub column: u32,
    pub line: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_grant_wire_format() {
        assert_eq!(
            serde_json::to_value(TokenGrant::RefreshToken).unwrap(),
            json!({"grantType": "refresh_token"})
        );
        assert_eq!(
            serde_json::to_value(TokenGrant::Password {
                email_address: "a@b.c".into(),
                password: "pw".into(),
            })
            .unwrap(),
            json!({"grantType": "password", "emailAddress": "a@b.c", "password": "pw"})
        );
        assert_eq!(
            serde_json::to_value(TokenGrant::GoogleIdToken {
                google_id_token: "g".into(),
            })
            .unwrap(),
            json!({"grantType": "google_id_token", "googleIdToken": "g"})
        );
        assert_eq!(
            TokenGrant::LoginToken {
                login_token: "l".into()
            }
            .name(),
            "login_token"
        );
    }

    #[test]
    fn test_token_response_validation() {
        let ok = TokenResponse::from_body(&json!({
            "accessToken": "T2",
            "accessTokenExpiredAt": 2000,
            "refreshToken": "R"
        }))
        .unwrap();
        assert_eq!(ok.access_token(), AccessToken::new("T2", 2000));
        assert_eq!(ok.refresh_token.as_deref(), Some("R"));

        let string_expiry = TokenResponse::from_body(&json!({
            "accessToken": "T2",
            "accessTokenExpiredAt": "2000"
        }));
        assert!(matches!(
            string_expiry,
            Err(ClientError::InvalidTokenResponse(_))
        ));

        let missing_token = TokenResponse::from_body(&json!({"accessTokenExpiredAt": 1}));
        assert!(matches!(
            missing_token,
            Err(ClientError::InvalidTokenResponse(_))
        ));
    }

    #[test]
    fn test_graph_error_parsing() {
        let resp: GraphResponse<JsonValue> = serde_json::from_value(json!({
            "data": null,
            "errors": [{
                "code": "unauthenticated",
                "location": [{"column": 3, "line": 1}],
                "message": "login required",
                "path": ["me"],
                "status_code": "401"
            }]
        }))
        .unwrap();
        let errors = resp.errors.unwrap();
        assert_eq!(errors[0].code, "unauthenticated");
        assert_eq!(errors[0].location[0], GraphErrorLocation { column: 3, line: 1 });
    }
}
