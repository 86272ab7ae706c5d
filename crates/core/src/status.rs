//! Session status shared across browser contexts

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Storage key under which the session status is published
pub const SESSION_STATUS_STORAGE_KEY: &str = "sessionStatus";

/// Tri-state authentication progress of one browser context
///
/// The storage encoding is `"0"` (loading), `"1"` (authenticated) and
/// `"2"` (unauthenticated). Other contexts read these exact strings, so
/// they must never change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SessionStatus {
    /// A refresh-token cookie was seen server side and an access token is pending
    #[serde(rename = "0")]
    Loading,
    #[serde(rename = "1")]
    Authenticated,
    #[serde(rename = "2")]
    Unauthenticated,
}

impl SessionStatus {
    /// Storage encoding of this status
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Loading => "0",
            Self::Authenticated => "1",
            Self::Unauthenticated => "2",
        }
    }

    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated)
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a stored value is not one of the three status encodings
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown session status: {0:?}")]
pub struct UnknownStatus(pub String);

impl FromStr for SessionStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "0" => Ok(Self::Loading),
            "1" => Ok(Self::Authenticated),
            "2" => Ok(Self::Unauthenticated),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_encoding() {
        for status in [
            SessionStatus::Loading,
            SessionStatus::Authenticated,
            SessionStatus::Unauthenticated,
        ] {
            assert_eq!(status.as_str().parse::<SessionStatus>(), Ok(status));
        }
        assert_eq!(SessionStatus::Authenticated.to_string(), "1");
    }

    #[test]
    fn test_unknown_value_rejected() {
        let err = "authenticated".parse::<SessionStatus>().unwrap_err();
        assert_eq!(err, UnknownStatus("authenticated".to_string()));
    }

    #[test]
    fn test_serde_uses_storage_encoding() {
        let json = serde_json::to_string(&SessionStatus::Loading).unwrap();
        assert_eq!(json, "\"0\"");
        let back: SessionStatus = serde_json::from_str("\"2\"").unwrap();
        assert_eq!(back, SessionStatus::Unauthenticated);
    }
}
