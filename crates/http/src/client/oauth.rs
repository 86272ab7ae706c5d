//! Authentication endpoints of the Nomdoc API

use super::NomdocClient;
use super::error::ClientError;
use crate::types::{LoginTokenRequest, LoginTokenResponse, RegisterRequest, TokenGrant, TokenResponse};
use async_trait::async_trait;
use nomdoc_core::SessionConfig;
use reqwest::header::COOKIE;
use serde_json::Value as JsonValue;

/// Authentication calls the session layer depends on
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AuthApi: Send + Sync {
    /// Exchange a grant for a new access token
    async fn exchange(&self, grant: TokenGrant) -> Result<TokenResponse, ClientError>;

    /// Ask the server to mail a login token
    async fn request_login_token(
        &self,
        email_address: String,
    ) -> Result<LoginTokenResponse, ClientError>;

    async fn register(&self, request: RegisterRequest) -> Result<JsonValue, ClientError>;

    /// Revoke the refresh token held in the cookie jar
    async fn revoke(&self) -> Result<(), ClientError>;
}

/// [`AuthApi`] over HTTP
///
/// The wrapped client must not carry the session interceptor, otherwise a
/// refresh would wait on itself. It shares the cookie jar of the session
/// client so the httpOnly refresh cookie set by the token endpoint travels
/// with later exchanges.
#[derive(Clone)]
pub struct OAuthClient {
    client: NomdocClient,
    token_path: String,
    authorize_path: String,
    revoke_path: String,
    register_path: String,
}

impl OAuthClient {
    /// Use the default endpoint paths
    pub fn new(client: NomdocClient) -> Self {
        Self::from_config(client, &SessionConfig::default())
    }

    /// Use the endpoint paths of `config`
    pub fn from_config(client: NomdocClient, config: &SessionConfig) -> Self {
        Self {
            client,
            token_path: config.token_path.clone(),
            authorize_path: config.authorize_path.clone(),
            revoke_path: config.revoke_path.clone(),
            register_path: config.register_path.clone(),
        }
    }

    /// Refresh on behalf of a browser whose cookie was forwarded to us
    pub async fn exchange_refresh_cookie(
        &self,
        refresh_token: &str,
    ) -> Result<TokenResponse, ClientError> {
        let req = self
            .client
            .request(reqwest::Method::POST, &self.token_path)
            .header(COOKIE, format!("refresh_token={refresh_token};"))
            .json(&TokenGrant::RefreshToken);
        self.token_request(req).await
    }

    async fn token_request(
        &self,
        req: reqwest::RequestBuilder,
    ) -> Result<TokenResponse, ClientError> {
        let body: JsonValue = self.client.execute(req).await?;
        TokenResponse::from_body(&body)
    }
}

#[async_trait]
impl AuthApi for OAuthClient {
    async fn exchange(&self, grant: TokenGrant) -> Result<TokenResponse, ClientError> {
        debug!(grant = grant.name(), "exchanging grant");
        let req = self
            .client
            .request(reqwest::Method::POST, &self.token_path)
            .json(&grant);
        self.token_request(req).await
    }

    async fn request_login_token(
        &self,
        email_address: String,
    ) -> Result<LoginTokenResponse, ClientError> {
        let req = self
            .client
            .request(reqwest::Method::POST, &self.authorize_path)
            .json(&LoginTokenRequest::new(email_address));
        self.client.execute(req).await
    }

    async fn register(&self, request: RegisterRequest) -> Result<JsonValue, ClientError> {
        let req = self
            .client
            .request(reqwest::Method::POST, &self.register_path)
            .json(&request);
        let body = self.client.send(req).await?.text().await?;
        if body.trim().is_empty() {
            return Ok(JsonValue::Null);
        }
        Ok(serde_json::from_str(&body)?)
    }

    async fn revoke(&self) -> Result<(), ClientError> {
        let req = self.client.request(reqwest::Method::POST, &self.revoke_path);
        self.client.send(req).await?;
        Ok(())
    }
}
