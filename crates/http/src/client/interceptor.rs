//! Request interception before transmission

use super::error::ClientError;
use async_trait::async_trait;

/// Hook run on every outgoing request before it is sent
///
/// Interceptors may rewrite the request (attach headers) or delay it while
/// they wait on other work, such as an in-flight token refresh. Returning an
/// error aborts the request without sending it.
#[async_trait]
pub trait RequestInterceptor: Send + Sync {
    async fn intercept(&self, request: reqwest::Request) -> Result<reqwest::Request, ClientError>;
}
