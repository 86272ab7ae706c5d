//! Bot verification collaborator used by account registration

use crate::client::error::ClientError;
use async_trait::async_trait;

/// Produces a proof-of-humanity token for a named action
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BotVerifier: Send + Sync {
    /// Whether the verifier has finished loading
    fn is_ready(&self) -> bool;

    async fn execute(&self, action: &str) -> Result<String, ClientError>;
}

/// Verifier returning a fixed token, for the CLI and for tests
#[derive(Clone)]
pub struct StaticBotVerifier {
    token: String,
}

impl StaticBotVerifier {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

impl std::fmt::Debug for StaticBotVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaticBotVerifier").finish_non_exhaustive()
    }
}

#[async_trait]
impl BotVerifier for StaticBotVerifier {
    fn is_ready(&self) -> bool {
        !self.token.is_empty()
    }

    async fn execute(&self, _action: &str) -> Result<String, ClientError> {
        if self.token.is_empty() {
            return Err(ClientError::BotVerification("no token configured".into()));
        }
        Ok(self.token.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_static_verifier() {
        let verifier = StaticBotVerifier::new("captcha");
        assert!(verifier.is_ready());
        assert_eq!(verifier.execute("sign_up").await.unwrap(), "captcha");

        let empty = StaticBotVerifier::new("");
        assert!(!empty.is_ready());
        assert!(matches!(
            empty.execute("sign_up").await,
            Err(ClientError::BotVerification(_))
        ));
    }
}
