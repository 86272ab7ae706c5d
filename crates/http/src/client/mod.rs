//! Nomdoc HTTP client

pub mod error;
pub mod graph;
pub mod interceptor;
pub mod oauth;

use error::ClientError;
use interceptor::RequestInterceptor;
use nomdoc_core::SessionConfig;
use reqwest::{Client, ClientBuilder};
use std::sync::Arc;
use std::time::Duration;

const DEFAULT_USER_AGENT: &str = concat!("nomdoc-client/", env!("CARGO_PKG_VERSION"));
const DEFAULT_GRAPH_PATH: &str = "/graph";

/// Nomdoc API client
///
/// Interceptors are fixed at construction and run in registration order for
/// every request sent through [`NomdocClient::send`] or
/// [`NomdocClient::execute`].
#[derive(Clone)]
pub struct NomdocClient {
    client: Client,
    base_url: String,
    graph_path: String,
    interceptors: Arc<[Arc<dyn RequestInterceptor>]>,
}

impl NomdocClient {
    /// Create a new client with default configuration
    pub fn new(base_url: impl Into<String>) -> Result<Self, ClientError> {
        Self::builder().base_url(base_url).build()
    }

    /// Create a new client builder
    pub fn builder() -> NomdocClientBuilder {
        NomdocClientBuilder::default()
    }

    /// Get the base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Path graph queries are posted to
    pub fn graph_path(&self) -> &str {
        &self.graph_path
    }

    /// Copy of this client sharing the connection pool and cookie store, with
    /// `interceptor` appended to the chain
    #[must_use]
    pub fn with_interceptor(&self, interceptor: Arc<dyn RequestInterceptor>) -> Self {
        let mut interceptors: Vec<_> = self.interceptors.iter().cloned().collect();
        interceptors.push(interceptor);
        Self {
            client: self.client.clone(),
            base_url: self.base_url.clone(),
            graph_path: self.graph_path.clone(),
            interceptors: interceptors.into(),
        }
    }

    /// Create a request builder for `path` relative to the base URL
    pub fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        self.client.request(method, url)
    }

    /// Run the interceptor chain and send the request
    ///
    /// Non-2xx responses are turned into [`ClientError::Response`].
    pub async fn send(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<reqwest::Response, ClientError> {
        let mut request = request.build()?;
        for interceptor in self.interceptors.iter() {
            request = interceptor.intercept(request).await?;
        }

        let response = self.client.execute(request).await?;
        if response.status().is_success() {
            Ok(response)
        } else {
            Err(ClientError::from_response(response).await)
        }
    }

    /// Execute a request and decode the JSON body
    pub async fn execute<T: serde::de::DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T, ClientError> {
        let response = self.send(request).await?;
        Ok(response.json().await?)
    }
}

/// Builder for NomdocClient
#[derive(Default)]
pub struct NomdocClientBuilder {
    base_url: Option<String>,
    graph_path: Option<String>,
    timeout: Option<Duration>,
    user_agent: Option<String>,
    interceptors: Vec<Arc<dyn RequestInterceptor>>,
}

impl NomdocClientBuilder {
    /// Start from a session configuration
    pub fn from_config(config: &SessionConfig) -> Self {
        let mut builder = Self::default()
            .base_url(&config.api_base_url)
            .graph_path(&config.protected_path);
        if let Some(timeout) = config.timeout() {
            builder = builder.timeout(timeout);
        }
        if let Some(agent) = &config.user_agent {
            builder = builder.user_agent(agent);
        }
        builder
    }

    /// Set the base URL
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Set the graph endpoint path
    pub fn graph_path(mut self, path: impl Into<String>) -> Self {
        self.graph_path = Some(path.into());
        self
    }

    /// Set the request timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set the user agent
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    /// Register a request interceptor
    pub fn interceptor(mut self, interceptor: Arc<dyn RequestInterceptor>) -> Self {
        self.interceptors.push(interceptor);
        self
    }

    /// Build the client
    pub fn build(self) -> Result<NomdocClient, ClientError> {
        let base_url = self
            .base_url
            .ok_or_else(|| ClientError::Configuration("base_url is required".into()))?;

        // Ensure base_url ends without a trailing slash
        let base_url = base_url.trim_end_matches('/').to_string();

        // The refresh token travels as an httpOnly cookie set by the token endpoint
        let mut client_builder = ClientBuilder::new().cookie_store(true);

        if let Some(timeout) = self.timeout {
            client_builder = client_builder.timeout(timeout);
        }

        client_builder = client_builder.user_agent(
            self.user_agent
                .unwrap_or_else(|| DEFAULT_USER_AGENT.to_string()),
        );

        let client = client_builder.build()?;

        Ok(NomdocClient {
            client,
            base_url,
            graph_path: self
                .graph_path
                .unwrap_or_else(|| DEFAULT_GRAPH_PATH.to_string()),
            interceptors: self.interceptors.into(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use reqwest::header::{HeaderName, HeaderValue};

    struct TagInterceptor(&'static str);

    #[async_trait]
    impl RequestInterceptor for TagInterceptor {
        async fn intercept(
            &self,
            mut request: reqwest::Request,
        ) -> Result<reqwest::Request, ClientError> {
            request.headers_mut().append(
                HeaderName::from_static("x-tag"),
                HeaderValue::from_static(self.0),
            );
            Ok(request)
        }
    }

    #[test]
    fn test_builder_requires_base_url() {
        let result = NomdocClient::builder().build();
        assert!(matches!(result, Err(ClientError::Configuration(_))));
    }

    #[test]
    fn test_builder_trims_trailing_slash() {
        let client = NomdocClient::new("http://localhost:4000/").unwrap();
        assert_eq!(client.base_url(), "http://localhost:4000");
        assert_eq!(client.graph_path(), "/graph");
    }

    #[test]
    fn test_from_config() {
        let config = SessionConfig {
            api_base_url: "https://api.nomdoc.com".into(),
            protected_path: "/v2/graph".into(),
            ..SessionConfig::default()
        };
        let client = NomdocClientBuilder::from_config(&config).build().unwrap();
        assert_eq!(client.base_url(), "https://api.nomdoc.com");
        assert_eq!(client.graph_path(), "/v2/graph");
    }

    #[test]
    fn test_with_interceptor_appends() {
        let client = NomdocClient::builder()
            .base_url("http://localhost")
            .interceptor(Arc::new(TagInterceptor("first")))
            .build()
            .unwrap();
        let extended = client.with_interceptor(Arc::new(TagInterceptor("second")));
        assert_eq!(client.interceptors.len(), 1);
        assert_eq!(extended.interceptors.len(), 2);
    }
}
