use reqwest::StatusCode;
use thiserror::Error;

/// Everything that can go wrong while talking to the inference endpoint.
///
/// The send cycle collapses all variants into one user-visible message; the
/// variants only exist for logging.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("endpoint returned {status}: {body}")]
    Status { status: StatusCode, body: String },
    #[error("malformed response body: {0}")]
    Decode(#[from] serde_json::Error),
}
