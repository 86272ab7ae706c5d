//! Login, registration and logout

use super::SessionManager;
use crate::client::error::{ClientError, PreconditionError};
use crate::types::{LoginTokenResponse, RegisterRequest, TokenGrant};
use nomdoc_core::SessionStatus;
use serde_json::Value as JsonValue;

const SIGN_UP_ACTION: &str = "sign_up";

impl SessionManager {
    fn require_unauthenticated(&self) -> Result<(), ClientError> {
        match self.status() {
            SessionStatus::Unauthenticated => Ok(()),
            SessionStatus::Authenticated => Err(PreconditionError::AlreadyAuthenticated.into()),
            SessionStatus::Loading => Err(PreconditionError::SessionLoading.into()),
        }
    }

    /// Create an account; does not log in
    pub async fn register_account(
        &self,
        email_address: &str,
        password: &str,
    ) -> Result<JsonValue, ClientError> {
        self.require_unauthenticated()?;
        let bot = self
            .bot
            .as_ref()
            .filter(|bot| bot.is_ready())
            .ok_or(PreconditionError::BotVerifierNotReady)?;

        let recaptcha_token = bot.execute(SIGN_UP_ACTION).await?;
        let created = self
            .api
            .register(RegisterRequest {
                email_address: email_address.to_string(),
                password: password.to_string(),
                recaptcha_token,
            })
            .await?;
        info!(email = email_address, "registered account");
        Ok(created)
    }

    pub async fn login_with_password(
        &self,
        email_address: &str,
        password: &str,
    ) -> Result<(), ClientError> {
        self.require_unauthenticated()?;
        self.login(TokenGrant::Password {
            email_address: email_address.to_string(),
            password: password.to_string(),
        })
        .await
    }

    /// Ask for a login token to be mailed to `email_address`
    ///
    /// Session state is unchanged until the token is verified with
    /// [`SessionManager::verify_login_token`].
    pub async fn login_with_token(
        &self,
        email_address: &str,
    ) -> Result<LoginTokenResponse, ClientError> {
        self.require_unauthenticated()?;
        let sent = self
            .api
            .request_login_token(email_address.to_string())
            .await?;
        info!(email = %sent.email_address, "login token requested");
        Ok(sent)
    }

    pub async fn verify_login_token(&self, login_token: &str) -> Result<(), ClientError> {
        self.require_unauthenticated()?;
        self.login(TokenGrant::LoginToken {
            login_token: login_token.to_string(),
        })
        .await
    }

    pub async fn verify_google_id_token(&self, google_id_token: &str) -> Result<(), ClientError> {
        self.require_unauthenticated()?;
        self.login(TokenGrant::GoogleIdToken {
            google_id_token: google_id_token.to_string(),
        })
        .await
    }

    /// Revoke the refresh token and end the session
    ///
    /// Local state is cleared once the revoke call returns, even when it
    /// failed; the failure is still reported.
    pub async fn logout(&self) -> Result<(), ClientError> {
        if self.status() != SessionStatus::Authenticated {
            return Err(PreconditionError::NotAuthenticated.into());
        }
        let revoked = self.api.revoke().await;
        self.invalidate();
        match &revoked {
            Ok(()) => info!("logged out"),
            Err(err) => warn!(error = %err, "refresh token revocation failed, logged out locally"),
        }
        revoked
    }

    async fn login(&self, grant: TokenGrant) -> Result<(), ClientError> {
        let grant_name = grant.name();
        let response = self.api.exchange(grant).await?;
        self.establish(response.access_token());
        info!(grant = grant_name, "logged in");
        Ok(())
    }
}
