//! Error types for encoder operations
//!
//! Provides typed errors that library users can match and handle specifically.
//! A dropped frame is not an error; see [`SubmitOutcome`](crate::SubmitOutcome).

use std::path::PathBuf;

use thiserror::Error;

use crate::component::{ComponentState, Port};

/// Errors that can occur while starting, feeding or stopping an encoder pipeline
///
/// # Examples
///
/// ```no_run
/// # use pano_encoder::{classify_error, EncoderConfig, EncoderPipeline, ErrorType};
/// match EncoderPipeline::start_file("/tmp/out.h264", EncoderConfig::default()) {
///     Ok(pipeline) => println!("recording at {:?}", pipeline.settings()),
///     Err(e) => match classify_error(&e) {
///         ErrorType::Configuration => eprintln!("fix the configuration: {}", e),
///         ErrorType::Io => eprintln!("cannot write output: {}", e),
///         _ => eprintln!("encoder failed: {}", e),
///     },
/// }
/// ```
#[derive(Error, Debug)]
pub enum EncoderError {
    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The requested compression engine is not compiled in
    #[error("Compression engine unavailable: {0}")]
    EngineUnavailable(String),

    /// The compression engine could not be created or configured
    #[error("Compression engine initialization failed: {0}")]
    EngineInit(String),

    /// A lifecycle call was made from the wrong component state
    #[error("Cannot {operation} while component is {from:?}")]
    InvalidTransition {
        /// State the component was in
        from: ComponentState,
        /// Requested operation
        operation: &'static str,
    },

    /// A port was enabled or disabled twice
    #[error("{port:?} port is already {}", enablement(.enabled))]
    PortState {
        /// Port concerned
        port: Port,
        /// Current enablement
        enabled: bool,
    },

    /// The engine rejected an input buffer
    #[error("Buffer submission failed: {0}")]
    Submit(String),

    /// The engine failed to return an output buffer
    #[error("Output retrieval failed: {0}")]
    Retrieve(String),

    /// Submitted payload is not exactly one frame
    #[error("Frame payload is {actual} bytes, port expects exactly {expected}")]
    FrameSizeMismatch {
        /// stride × height
        expected: usize,
        /// Supplied length
        actual: usize,
    },

    /// Frame dimensions differ from the configured port size
    #[error("Frame is {actual_width}x{actual_height}, encoder expects {expected_width}x{expected_height}")]
    DimensionMismatch {
        /// Configured width
        expected_width: u32,
        /// Configured height
        expected_height: u32,
        /// Width of the supplied frame
        actual_width: u32,
        /// Height of the supplied frame
        actual_height: u32,
    },

    /// A frame's layout is inconsistent
    #[error("Invalid frame: {0}")]
    Frame(#[from] pano_projection::ProjectionError),

    /// The output file could not be created
    #[error("Failed to open output {}: {source}", path.display())]
    SinkOpen {
        /// Requested path
        path: PathBuf,
        /// Underlying error
        source: std::io::Error,
    },

    /// I/O operation failed
    #[error("I/O operation failed: {0}")]
    Io(#[from] std::io::Error),

    /// The worker thread could not be started
    #[error("Failed to spawn encoder worker: {0}")]
    WorkerSpawn(String),

    /// The worker thread panicked
    #[error("Encoder worker panicked")]
    WorkerPanicked,

    /// Still image encoding failed
    #[error("Still image encoding failed: {0}")]
    StillImage(#[from] image::ImageError),
}

fn enablement(enabled: &bool) -> &'static str {
    if *enabled {
        "enabled"
    } else {
        "disabled"
    }
}

/// Result type for encoder operations
pub type Result<T> = std::result::Result<T, EncoderError>;

impl EncoderError {
    /// Create an invalid configuration error
    pub(crate) fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }

    /// Create an engine initialization error
    #[cfg(feature = "h264")]
    pub(crate) fn engine_init(msg: impl Into<String>) -> Self {
        Self::EngineInit(msg.into())
    }

    /// Create a submission error
    pub(crate) fn submit(msg: impl Into<String>) -> Self {
        Self::Submit(msg.into())
    }

    /// Create an output retrieval error
    pub(crate) fn retrieve(msg: impl Into<String>) -> Self {
        Self::Retrieve(msg.into())
    }

    /// Whether this error was caused by the caller breaking a documented precondition
    pub fn is_contract_violation(&self) -> bool {
        classify_error(self) == ErrorType::Contract
    }

    /// Whether this error ends the recording session
    pub fn is_fatal(&self) -> bool {
        !self.is_contract_violation()
    }
}

/// Broad error category, for deciding how to react
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorType {
    /// Bad configuration; fix it and start again
    Configuration,
    /// Caller broke a precondition (frame size, dimensions)
    Contract,
    /// Compression engine failure
    Engine,
    /// Output file failure
    Io,
    /// Worker thread failure
    Worker,
}

/// Classify an error for recovery decisions
pub fn classify_error(error: &EncoderError) -> ErrorType {
    match error {
        EncoderError::InvalidConfig(_) | EncoderError::EngineUnavailable(_) => ErrorType::Configuration,
        EncoderError::FrameSizeMismatch { .. }
        | EncoderError::DimensionMismatch { .. }
        | EncoderError::Frame(_) => ErrorType::Contract,
        EncoderError::EngineInit(_)
        | EncoderError::InvalidTransition { .. }
        | EncoderError::PortState { .. }
        | EncoderError::Submit(_)
        | EncoderError::Retrieve(_)
        | EncoderError::StillImage(_) => ErrorType::Engine,
        EncoderError::SinkOpen { .. } | EncoderError::Io(_) => ErrorType::Io,
        EncoderError::WorkerSpawn(_) | EncoderError::WorkerPanicked => ErrorType::Worker,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = EncoderError::FrameSizeMismatch {
            expected: 3_110_400,
            actual: 100,
        };
        assert_eq!(
            err.to_string(),
            "Frame payload is 100 bytes, port expects exactly 3110400"
        );

        let err = EncoderError::InvalidTransition {
            from: ComponentState::Loaded,
            operation: "enter Executing",
        };
        assert_eq!(err.to_string(), "Cannot enter Executing while component is Loaded");

        let err = EncoderError::PortState {
            port: Port::Input,
            enabled: true,
        };
        assert_eq!(err.to_string(), "Input port is already enabled");
    }

    #[test]
    fn test_classify_error() {
        assert_eq!(
            classify_error(&EncoderError::invalid_config("bad")),
            ErrorType::Configuration
        );
        assert_eq!(classify_error(&EncoderError::submit("busy")), ErrorType::Engine);
        assert_eq!(classify_error(&EncoderError::WorkerPanicked), ErrorType::Worker);

        let io = EncoderError::from(std::io::Error::new(std::io::ErrorKind::Other, "disk full"));
        assert_eq!(classify_error(&io), ErrorType::Io);
        assert!(io.is_fatal());

        let size = EncoderError::FrameSizeMismatch { expected: 4, actual: 3 };
        assert!(size.is_contract_violation());
        assert!(!size.is_fatal());
    }
}
