//! # pano-recorder
//!
//! Recording sessions and a flat control API for 360° fisheye cameras.
//!
//! This crate is part of the `pano360` workspace. It joins
//! [`pano-projection`](https://crates.io/crates/pano-projection) and
//! [`pano-encoder`](https://crates.io/crates/pano-encoder) into the five
//! operations a camera daemon needs: start and stop a recording, set the rig
//! rotation, add a frame, and save a still.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use pano_recorder::{FrameOutcome, Recorder, RecorderConfig};
//!
//! # fn example(camera_bytes: &[u8]) -> Result<(), Box<dyn std::error::Error>> {
//! let mut recorder = Recorder::new(RecorderConfig::default())?;
//! recorder.set_rotation(0.0, 90.0, 0.0);
//! recorder.start_record("capture.raw", 3000)?;
//!
//! match recorder.add_frame(1248, 1232, 1248 * 3, camera_bytes)? {
//!     FrameOutcome::Queued { .. } => {}
//!     FrameOutcome::Dropped => println!("encoder busy"),
//! }
//!
//! let stats = recorder.stop_record()?;
//! println!("{} frames recorded", stats.frames_queued);
//! # Ok(())
//! # }
//! ```
//!
//! # Status codes
//!
//! [`ControlSurface`] returns plain integers: `0` success, `1` frame
//! dropped, negative values per [`RecorderError::status_code`].

// =============================================================================
// CORE MODULES
// =============================================================================

pub mod config;
pub mod control;
pub mod error;
pub mod recorder;

#[cfg(test)]
mod test_support;

// =============================================================================
// RE-EXPORTS - PRIMARY API
// =============================================================================

pub use control::ControlSurface;
pub use recorder::{FrameOutcome, Recorder};

// Configuration
pub use config::{RecorderConfig, RecorderConfigBuilder};

// Errors
pub use error::{RecorderError, Result, STATUS_DROPPED, STATUS_OK};

// Statistics
pub use pano_encoder::EncoderStats;

// =============================================================================
// CRATE-LEVEL ITEMS
// =============================================================================

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
