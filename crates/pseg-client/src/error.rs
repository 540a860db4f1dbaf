//! Error types for segment requests.

use thiserror::Error;

/// Result type alias for segment client operations.
pub type ClientResult<T> = Result<T, ClientError>;

/// Errors a segment request can produce.
///
/// The three variants separate the failure domains a caller may want to
/// react to differently: the server was unreachable, the server answered
/// but refused, or the server answered nonsense.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The request never produced a usable response: connect failure,
    /// timeout, or a broken connection mid-transfer.
    #[error("segment request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The server answered with a non-success status.
    #[error("segment request failed with status {status}: {body}")]
    UnexpectedStatus {
        /// HTTP status code
        status: u16,
        /// Response body, truncated for log hygiene
        body: String,
    },

    /// The server answered 2xx but the body did not parse as a
    /// segmentation array.
    #[error("malformed segment response: {0}")]
    Payload(#[from] serde_json::Error),
}
