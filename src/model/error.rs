use thiserror::Error;

use crate::audio::AudioError;

/// Errors from the codec, the acoustic model and device placement.
#[derive(Debug, Error)]
pub enum ModelError {
    /// HTTP transport or connection error talking to the model sidecar.
    #[error("model request failed: {0}")]
    Request(String),

    #[error("model request timed out")]
    Timeout,

    /// The sidecar answered with an unexpected status or body.
    #[error("model protocol error: {0}")]
    Protocol(String),

    /// A token grid was ragged or had the wrong dimensionality.
    #[error("token grid shape mismatch: {0}")]
    Shape(String),

    #[error("device placement failed: {0}")]
    Placement(String),

    /// The sidecar is up but its checkpoint is incomplete.
    #[error("model weights are incomplete; missing keys: {}", .0.join(", "))]
    NotReady(Vec<String>),

    #[error("model returned no output")]
    EmptyOutput,

    #[error(transparent)]
    Audio(#[from] AudioError),
}

impl From<reqwest::Error> for ModelError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ModelError::Timeout
        } else {
            ModelError::Request(e.to_string())
        }
    }
}
