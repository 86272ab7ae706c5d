//! Access token state held by one browser context

use std::fmt;

/// A bearer access token together with its expiry
///
/// The token and its expiry always travel together, so a token state can
/// never hold one without the other.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken {
    token: String,
    /// Unix timestamp in seconds
    expired_at: i64,
}

impl AccessToken {
    pub fn new(token: impl Into<String>, expired_at: i64) -> Self {
        Self {
            token: token.into(),
            expired_at,
        }
    }

    /// Raw token value
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.token
    }

    #[must_use]
    pub const fn expired_at(&self) -> i64 {
        self.expired_at
    }

    /// Whether the token may still be attached at `now` (unix seconds)
    #[must_use]
    pub const fn is_valid_at(&self, now: i64) -> bool {
        now < self.expired_at
    }

    /// `Authorization` header value
    #[must_use]
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.token)
    }

    /// Shortened form safe for logs
    #[must_use]
    pub fn redacted(&self) -> String {
        let prefix: String = self.token.chars().take(4).collect();
        format!("{prefix}***")
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessToken")
            .field("token", &self.redacted())
            .field("expired_at", &self.expired_at)
            .finish()
    }
}

/// Process-local token state of one browser context
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenState {
    current: Option<AccessToken>,
}

impl TokenState {
    #[must_use]
    pub const fn new() -> Self {
        Self { current: None }
    }

    #[must_use]
    pub const fn current(&self) -> Option<&AccessToken> {
        self.current.as_ref()
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.current.is_none()
    }

    /// Replace the held token
    pub fn set(&mut self, token: AccessToken) {
        self.current = Some(token);
    }

    pub fn clear(&mut self) {
        self.current = None;
    }

    /// The held token if it is still valid at `now`
    #[must_use]
    pub fn valid_at(&self, now: i64) -> Option<&AccessToken> {
        self.current.as_ref().filter(|t| t.is_valid_at(now))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expiry_boundary() {
        let token = AccessToken::new("T1", 1000);
        assert!(token.is_valid_at(999));
        assert!(!token.is_valid_at(1000));
        assert!(!token.is_valid_at(1001));
    }

    #[test]
    fn test_bearer_header() {
        assert_eq!(AccessToken::new("T1", 1000).bearer(), "Bearer T1");
    }

    #[test]
    fn test_debug_redacts_token() {
        let token = AccessToken::new("secret-token-value", 42);
        let rendered = format!("{token:?}");
        assert!(!rendered.contains("secret-token-value"));
        assert!(rendered.contains("secr***"));
    }

    #[test]
    fn test_state_set_and_clear() {
        let mut state = TokenState::new();
        assert!(state.is_empty());
        assert!(state.valid_at(0).is_none());

        state.set(AccessToken::new("T1", 1000));
        assert_eq!(state.valid_at(999).map(AccessToken::as_str), Some("T1"));
        assert!(state.valid_at(1000).is_none());
        assert!(state.current().is_some());

        state.clear();
        assert!(state.is_empty());
    }
}
