//! # pano360
//!
//! Fisheye to equirectangular reprojection and asynchronous video encoding
//! for 360° cameras.
//!
//! This crate provides a unified interface to the pano360 libraries:
//!
//! - **[`projection`]** - GPU reprojection of fisheye frames into equirectangular panoramas
//! - **[`encoder`]** - Buffer pool, encode queue and encoder worker writing an elementary stream
//! - **[`recorder`]** - Recording sessions and the integer-status control surface
//!
//! # Features
//!
//! ```toml
//! # Use everything (default)
//! pano360 = "0.1"
//!
//! # Projection only
//! pano360 = { version = "0.1", default-features = false, features = ["projection"] }
//!
//! # Everything including H.264
//! pano360 = { version = "0.1", features = ["full"] }
//! ```
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `projection` | Yes | GPU fisheye to equirectangular reprojection |
//! | `encoder` | Yes | Asynchronous encoder pipeline |
//! | `recorder` | Yes | Recording sessions and control surface |
//! | `h264` | No | H.264 compression engine (OpenH264) |
//! | `full` | No | All features from all sub-crates |
//!
//! # Quick Start
//!
//! ## Project and encode by hand
//!
//! ```rust,ignore
//! use pano360::prelude::*;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut engine = ProjectionEngine::new(ProjectionConfig::default())?;
//!     let encoder = EncoderPipeline::start_file(
//!         "capture.raw",
//!         EncoderConfig::builder().size(1440, 720).bitrate_kbps(3000).build(),
//!     )?;
//!
//!     let camera = Frame::new(1248, 1232, PixelFormat::Rgb24);
//!     let panorama = engine.transform(&camera.view())?;
//!     if encoder.encode_frame(&panorama.view())?.is_dropped() {
//!         println!("encoder busy");
//!     }
//!
//!     let stats = encoder.stop()?;
//!     println!("{} bytes written", stats.bytes_written);
//!     Ok(())
//! }
//! ```
//!
//! ## Recorder
//!
//! ```rust,ignore
//! use pano360::prelude::*;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut recorder = Recorder::new(RecorderConfig::default())?;
//!     recorder.start_record("capture.raw", 3000)?;
//!     // recorder.add_frame(width, height, stride, &bytes)? for each camera frame
//!     recorder.stop_record()?;
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                            pano360                              │
//! ├─────────────────────┬─────────────────────┬─────────────────────┤
//! │   pano-projection   │    pano-encoder     │    pano-recorder    │
//! │                     │                     │                     │
//! │  ProjectionEngine   │  EncoderPipeline    │  Recorder           │
//! │  RotationHandle     │  BufferPool         │  ControlSurface     │
//! │  ProjectionConfig   │  EncodeQueue        │  RecorderConfig     │
//! └──────────┬──────────┴──────────┬──────────┴──────────┬──────────┘
//!            │                     │                     │
//!            ▼                     ▼                     ▼
//!      wgpu (GPU)         Elementary stream      Integer status API
//! ```
//!
//! # Related Crates
//!
//! You can also use the individual crates directly:
//!
//! - [`pano-projection`](https://crates.io/crates/pano-projection) - Reprojection only
//! - [`pano-encoder`](https://crates.io/crates/pano-encoder) - Encoder pipeline only
//! - [`pano-recorder`](https://crates.io/crates/pano-recorder) - Recorder and control surface

#![cfg_attr(docsrs, feature(doc_cfg))]

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// =============================================================================
// RE-EXPORTS
// =============================================================================

/// GPU reprojection of fisheye camera frames.
///
/// - Headless wgpu render target with synchronous read-back
/// - Three-axis rig rotation shared across threads
/// - Strided input frames
///
/// See [`pano_projection`] documentation for details.
#[cfg(feature = "projection")]
#[cfg_attr(docsrs, doc(cfg(feature = "projection")))]
pub use pano_projection as projection;

/// Asynchronous encoder pipeline.
///
/// - Fixed input buffer pool, drop instead of block
/// - FIFO encode queue drained by one worker thread
/// - Raw and H.264 compression engines
/// - JPEG still images
///
/// See [`pano_encoder`] documentation for details.
#[cfg(feature = "encoder")]
#[cfg_attr(docsrs, doc(cfg(feature = "encoder")))]
pub use pano_encoder as encoder;

/// Recording sessions and the integer-status control surface.
///
/// See [`pano_recorder`] documentation for details.
#[cfg(feature = "recorder")]
#[cfg_attr(docsrs, doc(cfg(feature = "recorder")))]
pub use pano_recorder as recorder;

// =============================================================================
// PRELUDE - Common types for convenience
// =============================================================================

/// Prelude module with commonly used types.
///
/// ```rust
/// use pano360::prelude::*;
/// ```
pub mod prelude {
    #[cfg(feature = "projection")]
    pub use pano_projection::{
        Frame, FrameView, PixelFormat, ProjectionConfig, ProjectionEngine, ProjectionError, Reproject, Rotation,
        RotationHandle,
    };

    #[cfg(feature = "encoder")]
    pub use pano_encoder::{
        Codec, EncoderConfig, EncoderError, EncoderPipeline, EncoderStats, SubmitOutcome, WorkerState,
    };

    #[cfg(feature = "recorder")]
    pub use pano_recorder::{ControlSurface, FrameOutcome, Recorder, RecorderConfig, RecorderError};
}
