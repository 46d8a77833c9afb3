//! Error types for projection operations
//!
//! Provides typed errors that library users can match and handle specifically.
//! GPU failures are never retried: once the driver reports an unexpected error
//! the engine instance must be dropped and rebuilt.

use thiserror::Error;

/// Errors that can occur while building or running a projection engine
///
/// # Examples
///
/// ```no_run
/// # use pano_projection::{ProjectionConfig, ProjectionEngine, ProjectionError};
/// match ProjectionEngine::new(ProjectionConfig::default()) {
///     Ok(engine) => println!("engine ready: {:?}", engine.config()),
///     Err(ProjectionError::AdapterUnavailable) => eprintln!("no GPU on this host"),
///     Err(e) if e.is_fatal() => eprintln!("GPU setup failed: {}", e),
///     Err(e) => eprintln!("invalid configuration: {}", e),
/// }
/// ```
#[derive(Error, Debug)]
pub enum ProjectionError {
    /// No GPU adapter could be found
    ///
    /// The host has no usable GPU backend (or the driver refused to expose one).
    #[error("No GPU adapter available")]
    AdapterUnavailable,

    /// Logical device creation failed
    #[error("Failed to create GPU device: {0}")]
    DeviceCreation(String),

    /// Shader module or render pipeline creation failed
    #[error("Shader program creation failed: {0}")]
    ShaderProgram(String),

    /// Texture or render target allocation failed
    #[error("Texture allocation failed: {0}")]
    TextureAllocation(String),

    /// A GPU call reported an error after the engine was built
    ///
    /// Driver state is assumed corrupted; the engine is unusable.
    #[error("GPU operation '{operation}' failed: {message}")]
    Gpu {
        /// The operation that was being performed
        operation: &'static str,
        /// Driver-provided message
        message: String,
    },

    /// Read-back buffer could not be mapped
    #[error("Read-back failed: {0}")]
    Readback(String),

    /// Texture dimension is not a multiple of the hardware alignment unit
    #[error("{what} dimensions {width}x{height} are not a multiple of {alignment}")]
    UnalignedDimensions {
        /// Which texture was rejected
        what: &'static str,
        /// Requested width
        width: u32,
        /// Requested height
        height: u32,
        /// Required alignment
        alignment: u32,
    },

    /// A frame does not match the engine's configured size
    #[error("Frame is {actual_width}x{actual_height}, engine expects {expected_width}x{expected_height}")]
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

    /// A frame's backing buffer is inconsistent with its declared layout
    #[error("Invalid frame layout: {0}")]
    InvalidFrame(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result type for projection operations
pub type Result<T> = std::result::Result<T, ProjectionError>;

impl ProjectionError {
    /// Create a GPU operation error
    pub(crate) fn gpu(operation: &'static str, message: impl Into<String>) -> Self {
        Self::Gpu {
            operation,
            message: message.into(),
        }
    }

    /// Create an invalid frame error
    pub(crate) fn invalid_frame(msg: impl Into<String>) -> Self {
        Self::InvalidFrame(msg.into())
    }

    /// Create a shader program error
    pub(crate) fn shader(msg: impl Into<String>) -> Self {
        Self::ShaderProgram(msg.into())
    }

    /// Whether this error leaves the engine unusable
    ///
    /// Contract violations (mismatched or malformed frames) are caller
    /// defects; the engine itself is still healthy afterwards.
    pub fn is_fatal(&self) -> bool {
        !self.is_contract_violation()
    }

    /// Whether this error was caused by the caller breaking a documented precondition
    pub fn is_contract_violation(&self) -> bool {
        matches!(
            self,
            Self::UnalignedDimensions { .. }
                | Self::DimensionMismatch { .. }
                | Self::InvalidFrame(_)
                | Self::InvalidConfig(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ProjectionError::UnalignedDimensions {
            what: "source",
            width: 1250,
            height: 1232,
            alignment: 4,
        };
        assert_eq!(err.to_string(), "source dimensions 1250x1232 are not a multiple of 4");

        let err = ProjectionError::gpu("draw", "device lost");
        assert_eq!(err.to_string(), "GPU operation 'draw' failed: device lost");
    }

    #[test]
    fn test_error_classification() {
        assert!(ProjectionError::AdapterUnavailable.is_fatal());
        assert!(ProjectionError::gpu("readback", "lost").is_fatal());

        let mismatch = ProjectionError::DimensionMismatch {
            expected_width: 1248,
            expected_height: 1232,
            actual_width: 640,
            actual_height: 480,
        };
        assert!(mismatch.is_contract_violation());
        assert!(!mismatch.is_fatal());
        assert!(ProjectionError::invalid_frame("short buffer").is_contract_violation());
    }
}
