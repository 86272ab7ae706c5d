//! Client error types

use crate::types::GraphError;
use nomdoc_core::ValidationError;
use reqwest::StatusCode;
use reqwest::header::HeaderMap;
use thiserror::Error;

/// Client error types
///
/// Cloneable so a single refresh failure can be delivered to every caller
/// queued behind it.
#[derive(Debug, Clone, Error)]
pub enum ClientError {
    /// Server returned a non-2xx status
    #[error("Server error {status}: {body}")]
    Response {
        status: StatusCode,
        body: String,
        headers: HeaderMap,
    },

    /// The request never reached a server
    #[error("Network error: {0}")]
    Network(String),

    /// Operation invoked in the wrong session state
    #[error("Precondition failed: {0}")]
    Precondition(#[from] PreconditionError),

    /// Graph endpoint answered with errors
    #[error("Graph query failed: {}", format_graph_errors(.0))]
    Graph(Vec<GraphError>),

    /// Token endpoint answered 2xx without a usable token
    #[error("Invalid token response: {0}")]
    InvalidTokenResponse(String),

    /// The in-flight refresh was dropped before completing
    #[error("Token refresh aborted")]
    RefreshAborted,

    /// The session was ended while a refresh was in flight
    #[error("Session ended during token refresh")]
    SessionEnded,

    /// Bot verification could not produce a token
    #[error("Bot verification failed: {0}")]
    BotVerification(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    Configuration(String),
}

/// Session state required by an operation was not met
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PreconditionError {
    #[error("Already logged in.")]
    AlreadyAuthenticated,
    #[error("Not logged in.")]
    NotAuthenticated,
    #[error("Session is still loading.")]
    SessionLoading,
    #[error("Bot verification is not ready.")]
    BotVerifierNotReady,
}

/// Coarse classification for routing errors to the right handler
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Response,
    Network,
    Precondition,
    Graph,
    Other,
}

impl ClientError {
    /// Build a response error from its parts
    pub fn from_parts(status: StatusCode, headers: HeaderMap, body: impl Into<String>) -> Self {
        Self::Response {
            status,
            body: body.into(),
            headers,
        }
    }

    /// Consume a non-success response into a response error
    pub async fn from_response(response: reqwest::Response) -> Self {
        let status = response.status();
        let headers = response.headers().clone();
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| status.to_string());
        Self::from_parts(status, headers, body)
    }

    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Response { .. } => ErrorKind::Response,
            Self::Network(_) => ErrorKind::Network,
            Self::Precondition(_) => ErrorKind::Precondition,
            Self::Graph(_) => ErrorKind::Graph,
            _ => ErrorKind::Other,
        }
    }

    /// HTTP status for response errors
    #[must_use]
    pub const fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Response { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether the server rejected the credentials
    #[must_use]
    pub fn is_auth_expired(&self) -> bool {
        self.status() == Some(StatusCode::UNAUTHORIZED)
    }

    /// Response body parsed as JSON, if it is JSON
    #[must_use]
    pub fn body_json(&self) -> Option<serde_json::Value> {
        match self {
            Self::Response { body, .. } => serde_json::from_str(body).ok(),
            _ => None,
        }
    }

    /// Field-level validation failure carried by the response body
    #[must_use]
    pub fn validation_error(&self) -> Option<ValidationError> {
        ValidationError::from_value(&self.body_json()?)
    }

    /// Server-provided `message` field of the response body
    #[must_use]
    pub fn server_message(&self) -> Option<String> {
        self.body_json()?
            .get("message")?
            .as_str()
            .map(str::to_string)
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::Serialization(err.to_string())
        } else if err.is_builder() {
            Self::Configuration(err.to_string())
        } else {
            Self::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

fn format_graph_errors(errors: &[GraphError]) -> String {
    errors
        .iter()
        .map(|e| format!("{} ({})", e.message, e.code))
        .collect::<Vec<_>>()
        .join("; ")
}
