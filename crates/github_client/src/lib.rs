use async_trait::async_trait;
use query_core::{QueryClient, QueryError};
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use thiserror::Error;
use tracing::{debug, warn};
use url::Url;

pub const DEFAULT_GRAPHQL_ENDPOINT: &str = "https://api.github.com/graphql";

const CLIENT_USER_AGENT: &str = concat!("github-profile-viewer/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Error)]
pub enum GithubClientError {
    #[error("invalid GraphQL endpoint {endpoint}: {source}")]
    InvalidEndpoint {
        endpoint: String,
        source: url::ParseError,
    },
    #[error("missing access token (set GITHUB_TOKEN)")]
    MissingToken,
}

/// Bearer-authenticated GraphQL transport for the GitHub v4 API. One
/// instance per token; login/logout in the surrounding application swap the
/// instance rather than mutate it.
#[derive(Debug)]
pub struct GithubClient {
    http: Client,
    endpoint: Url,
    token: String,
}

impl GithubClient {
    pub fn new(endpoint: &str, token: impl Into<String>) -> Result<Self, GithubClientError> {
        let token = token.into();
        if token.trim().is_empty() {
            return Err(GithubClientError::MissingToken);
        }
        let endpoint =
            Url::parse(endpoint).map_err(|source| GithubClientError::InvalidEndpoint {
                endpoint: endpoint.to_string(),
                source,
            })?;
        Ok(Self {
            http: Client::new(),
            endpoint,
            token,
        })
    }

    /// Builds a client from `GITHUB_TOKEN`, honoring `GITHUB_GRAPHQL_URL`
    /// when set.
    pub fn from_env() -> Result<Self, GithubClientError> {
        let token = std::env::var("GITHUB_TOKEN").map_err(|_| GithubClientError::MissingToken)?;
        let endpoint = std::env::var("GITHUB_GRAPHQL_URL")
            .unwrap_or_else(|_| DEFAULT_GRAPHQL_ENDPOINT.to_string());
        Self::new(&endpoint, token)
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[derive(Debug, Deserialize)]
struct GraphqlResponseBody {
    #[serde(default)]
    data: Option<Value>,
    #[serde(default)]
    errors: Vec<GraphqlResponseError>,
}

#[derive(Debug, Deserialize)]
struct GraphqlResponseError {
    message: String,
}

#[async_trait]
impl QueryClient for GithubClient {
    async fn request(
        &self,
        query: &str,
        variables: &Map<String, Value>,
    ) -> Result<Value, QueryError> {
        debug!(endpoint = %self.endpoint, "issuing graphql request");
        let response = self
            .http
            .post(self.endpoint.clone())
            .bearer_auth(&self.token)
            .header(reqwest::header::USER_AGENT, CLIENT_USER_AGENT)
            .json(&json!({ "query": query, "variables": variables }))
            .send()
            .await
            .map_err(|err| QueryError::Transport(err.to_string()))?
            .error_for_status()
            .map_err(|err| QueryError::Transport(err.to_string()))?;

        let body: GraphqlResponseBody = response
            .json()
            .await
            .map_err(|err| QueryError::Decode(err.to_string()))?;

        if !body.errors.is_empty() {
            let messages: Vec<String> = body.errors.into_iter().map(|err| err.message).collect();
            warn!(errors = messages.len(), "graphql request rejected by remote");
            return Err(QueryError::Remote(messages));
        }

        body.data.ok_or_else(|| {
            QueryError::Decode("response carried neither data nor errors".to_string())
        })
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
