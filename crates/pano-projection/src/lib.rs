//! # pano-projection
//!
//! GPU reprojection of fisheye camera frames into equirectangular panoramas.
//!
//! This crate is part of the `pano360` workspace and feeds
//! [`pano-encoder`](https://crates.io/crates/pano-encoder) with frames ready
//! for compression.
//!
//! # Features
//!
//! - **Headless GPU rendering**: offscreen render target with synchronous read-back
//! - **Rig rotation**: three-axis rotation applied per frame, updatable from any thread
//! - **Strided input**: camera frames with padded rows are accepted as-is
//! - **Typed errors**: construction failures, GPU failures and caller mistakes are distinct
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use pano_projection::{Frame, PixelFormat, ProjectionConfig, ProjectionEngine};
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut engine = ProjectionEngine::new(ProjectionConfig::default())?;
//! engine.set_rotation(0.0, 90.0, 0.0);
//!
//! let camera = Frame::new(1248, 1232, PixelFormat::Rgb24);
//! let panorama = engine.transform(&camera.view())?;
//! println!("Panorama: {}x{}", panorama.width, panorama.height);
//! # Ok(())
//! # }
//! ```
//!
//! # Rotation from another thread
//!
//! ```rust,no_run
//! # use pano_projection::{ProjectionConfig, ProjectionEngine};
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let engine = ProjectionEngine::new(ProjectionConfig::default())?;
//! let rotation = engine.rotation_handle();
//!
//! std::thread::spawn(move || {
//!     rotation.set_degrees(5.0, 0.0, -2.5);
//! });
//! # Ok(())
//! # }
//! ```
//!
//! # Requirements
//!
//! - A GPU reachable through Vulkan, Metal, DX12 or GL
//! - Texture dimensions that are multiples of 4

// =============================================================================
// CORE MODULES
// =============================================================================

pub mod config;
pub mod engine;
pub mod error;
pub mod frame;
pub mod gpu;
pub mod program;
pub mod rotation;
pub mod texture;

// =============================================================================
// RE-EXPORTS - PRIMARY API
// =============================================================================

// Engine (primary entry point)
pub use engine::{ProjectionEngine, Reproject};

// Configuration
pub use config::{ProjectionConfig, ProjectionConfigBuilder, TEXTURE_ALIGNMENT};

// Errors
pub use error::{ProjectionError, Result};

// Frame types
pub use frame::{Frame, FrameView, PixelFormat};

// Rotation
pub use rotation::{Mat4, Rotation, RotationHandle};

// =============================================================================
// RE-EXPORTS - ADVANCED API
// =============================================================================

pub use gpu::GpuContext;
pub use program::{LensParams, ProjectionProgram};
pub use texture::{check_alignment, RenderTarget, SourceTexture};

// =============================================================================
// CRATE-LEVEL ITEMS
// =============================================================================

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_default_sizes_are_aligned() {
        let config = ProjectionConfig::default();
        assert!(check_alignment("source", config.source_width, config.source_height).is_ok());
        assert!(check_alignment("destination", config.width, config.height).is_ok());
    }
}
