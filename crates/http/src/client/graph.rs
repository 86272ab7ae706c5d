//! Graph endpoint

use super::NomdocClient;
use super::error::ClientError;
use crate::types::{GraphRequest, GraphResponse};
use serde::Serialize;
use serde::de::DeserializeOwned;

impl NomdocClient {
    /// Run a graph query and return its `data`
    ///
    /// The request goes through the interceptor chain, so a session-bound
    /// client attaches (and if needed refreshes) the access token.
    pub async fn query_graph<T, V>(
        &self,
        query: &str,
        variables: Option<&V>,
    ) -> Result<T, ClientError>
    where
        T: DeserializeOwned,
        V: Serialize,
    {
        let req = self
            .request(reqwest::Method::POST, self.graph_path())
            .json(&GraphRequest { query, variables });
        let response: GraphResponse<T> = self.execute(req).await?;

        // Any `errors` member fails the query, even an empty one
        if let Some(errors) = response.errors {
            return Err(ClientError::Graph(errors));
        }
        response
            .data
            .ok_or_else(|| ClientError::Serialization("graph response carried no data".into()))
    }
}
