use thiserror::Error;

/// Failure of one fetch, surfaced through the `error` field of the query
/// state rather than through a caller-visible `Err`.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum QueryError {
    #[error("transport failure: {0}")]
    Transport(String),
    #[error("remote rejected query: {}", .0.join("; "))]
    Remote(Vec<String>),
    #[error("malformed response payload: {0}")]
    Decode(String),
    #[error("no client attached")]
    Unavailable,
}
