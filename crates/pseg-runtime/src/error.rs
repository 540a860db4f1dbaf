//! Error types for shuttle operations.

use thiserror::Error;

/// Result type alias for shuttle operations.
pub type ShuttleResult<T> = Result<T, ShuttleError>;

/// Errors that can occur while bringing the segmenter server up.
///
/// Teardown has no error type on purpose: `stop` logs problems and
/// swallows them so it can be called from any cleanup path.
#[derive(Debug, Error)]
pub enum ShuttleError {
    /// Configuration that can never work, caught before launching.
    #[error("invalid shuttle configuration: {0}")]
    InvalidConfig(String),

    /// Pre-launch cleanup or the spawn itself failed.
    #[error("failed to launch segmenter server: {0}")]
    Launch(#[from] std::io::Error),

    /// The server never published a readable pid file.
    #[error("segmenter server pid could not be read after {attempts} attempts")]
    PidRetrieval {
        /// Poll budget that was exhausted
        attempts: u32,
    },

    /// The server process came up but never answered the readiness probe.
    #[error("segmenter server failed readiness testing after {attempts} attempts")]
    ReadinessFailed {
        /// Probe budget that was exhausted
        attempts: u32,
    },
}
