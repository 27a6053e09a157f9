use thiserror::Error;

/// Failures surfaced by the SDK.
///
/// Network-level failures propagate untouched so callers can decide retry
/// policy. A response without a JSON body is not an error; see
/// [`crate::api::ApiClient::request`].
#[derive(Debug, Error)]
pub enum Error {
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("socket failure: {0}")]
    Socket(String),
    #[error("identity mismatch: session user is {expected:?}, call supplied {provided:?}")]
    IdentityMismatch { expected: String, provided: String },
    #[error("failed to decode response body: {0}")]
    Decode(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
