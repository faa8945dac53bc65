use thiserror::Error;

/// Failures inside the HTTP client
///
/// These never cross the [`GraphBackend`](kgsync_core::GraphBackend)
/// boundary; the trait methods log them and report `false` or `None`.
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Failed to build HTTP client: {0}")]
    Build(#[source] reqwest::Error),

    #[error("Request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("Invalid response body from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Failed to encode payload: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("Backend rejected the request: {0}")]
    Rejected(String),
}

pub type ClientResult<T> = Result<T, ClientError>;
