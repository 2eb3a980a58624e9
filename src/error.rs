//! Error types for livecheck

use thiserror::Error;

/// Errors that can occur while running a liveness session
#[derive(Debug, Error)]
pub enum LivenessError {
    #[error("Failed to parse frame input: {0}")]
    ParseError(String),

    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Invalid detection record: {0}")]
    InvalidDetection(String),

    #[error("Landmark detector unavailable: {0}")]
    DetectorUnavailable(String),

    #[error("Encoding error: {0}")]
    EncodingError(String),

    #[error("Failed to publish assessment: {0}")]
    PublishError(String),

    #[error("Session cancelled")]
    SessionCancelled,
}
