//! Error types for recording sessions
//!
//! Every error maps to a stable negative status code for the integer
//! [`ControlSurface`](crate::ControlSurface).

use pano_encoder::{classify_error, EncoderError, ErrorType};
use pano_projection::ProjectionError;
use thiserror::Error;

/// Status returned by the control surface on success
pub const STATUS_OK: i32 = 0;

/// Status returned when a frame was dropped (not an error)
pub const STATUS_DROPPED: i32 = 1;

/// Errors that can occur in a recording session
#[derive(Error, Debug)]
pub enum RecorderError {
    /// Operation needs an active recording
    #[error("No recording in progress")]
    NotRecording,

    /// A recording is already active
    #[error("A recording is already in progress")]
    AlreadyRecording,

    /// Argument outside its valid range
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Projection engine failure
    #[error("Projection failed: {0}")]
    Projection(#[from] ProjectionError),

    /// Encoder pipeline failure
    #[error("Encoder failed: {0}")]
    Encoder(#[from] EncoderError),

    /// I/O operation failed
    #[error("I/O operation failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for recorder operations
pub type Result<T> = std::result::Result<T, RecorderError>;

impl RecorderError {
    pub(crate) fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    /// Negative status code for the control surface
    ///
    /// | Code | Meaning |
    /// |------|---------|
    /// | -1 | not recording |
    /// | -2 | already recording |
    /// | -3 | invalid argument or frame |
    /// | -4 | GPU failure |
    /// | -5 | encoder failure |
    /// | -6 | I/O failure |
    pub fn status_code(&self) -> i32 {
        match self {
            Self::NotRecording => -1,
            Self::AlreadyRecording => -2,
            Self::InvalidArgument(_) => -3,
            Self::Projection(e) if e.is_contract_violation() => -3,
            Self::Projection(_) => -4,
            Self::Encoder(e) => match classify_error(e) {
                ErrorType::Configuration | ErrorType::Contract => -3,
                ErrorType::Io => -6,
                ErrorType::Engine | ErrorType::Worker => -5,
            },
            Self::Io(_) => -6,
        }
    }

    /// Whether the error ends the recording session
    pub fn is_fatal(&self) -> bool {
        matches!(self.status_code(), -6..=-4)
    }
}
