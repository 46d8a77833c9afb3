//! # pano-encoder
//!
//! Asynchronous encoder pipeline for equirectangular video.
//!
//! This crate is part of the `pano360` workspace. It takes projected frames
//! from [`pano-projection`](https://crates.io/crates/pano-projection) and
//! writes an encoded elementary stream without ever blocking the producer.
//!
//! # Features
//!
//! - **Non-blocking submission**: a fixed input buffer pool; when it is empty the frame is dropped
//! - **Ordered output**: one worker thread drains a FIFO queue and writes segments in submission order
//! - **Clean shutdown**: stopping drains every queued frame before the engine is unloaded
//! - **Pluggable engines**: raw pass-through always, H.264 with the `h264` feature
//! - **Still images**: JPEG snapshots of a single frame
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use pano_encoder::{EncoderConfig, EncoderPipeline};
//! use pano_projection::{Frame, PixelFormat};
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = EncoderConfig::builder()
//!     .size(1440, 720)
//!     .bitrate_kbps(3000)
//!     .build();
//! let pipeline = EncoderPipeline::start_file("capture.raw", config)?;
//!
//! let frame = Frame::new(1440, 720, PixelFormat::Rgb24);
//! for _ in 0..100 {
//!     if pipeline.encode_frame(&frame.view())?.is_dropped() {
//!         // Encoder is behind; the frame is simply skipped
//!     }
//! }
//!
//! let stats = pipeline.stop()?;
//! println!("{} frames written, {} dropped", stats.frames_queued, stats.frames_dropped);
//! # Ok(())
//! # }
//! ```
//!
//! # Cargo Features
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `h264` | No | H.264 compression engine backed by OpenH264 |

// =============================================================================
// CORE MODULES
// =============================================================================

pub mod component;
pub mod config;
pub mod engine;
pub mod error;
pub mod pipeline;
pub mod pool;
pub mod queue;
pub mod stats;
pub mod still;

mod worker;

// =============================================================================
// RE-EXPORTS - PRIMARY API
// =============================================================================

// Pipeline (primary entry point)
pub use pipeline::{EncoderPipeline, SubmitOutcome};

// Configuration
pub use config::{
    Codec, EncoderConfig, EncoderConfigBuilder, PortSettings, RateControl, DEFAULT_FRAME_RATE, MAX_FRAME_DIMENSION,
};

// Errors
pub use error::{classify_error, EncoderError, ErrorType, Result};

// Statistics
pub use stats::EncoderStats;

// Still images
pub use still::{encode_jpeg, save_jpeg, DEFAULT_JPEG_QUALITY};

// Worker state
pub use worker::WorkerState;

// =============================================================================
// RE-EXPORTS - ADVANCED API
// =============================================================================

pub use component::{Component, ComponentState, Port};
pub use config::align_up;
pub use engine::{engine_for, CompressionEngine, OutputBuffer, RawEngine, SegmentQueue};
pub use pool::{BufferPool, InputBuffer};
pub use queue::{EncodeQueue, EncodeRequest};

#[cfg(feature = "h264")]
pub use engine::H264Engine;

// =============================================================================
// CRATE-LEVEL ITEMS
// =============================================================================

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
