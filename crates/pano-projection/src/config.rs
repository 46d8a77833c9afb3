//! Projection Configuration
//!
//! Provides configuration options for the projection engine with a builder
//! pattern for ergonomic construction.
//!
//! # Examples
//!
//! ```rust
//! use pano_projection::{PixelFormat, ProjectionConfig};
//!
//! // Using builder pattern
//! let config = ProjectionConfig::builder()
//!     .output_size(2048, 1024)
//!     .source_size(1248, 1232)
//!     .fov_degrees(220.0)
//!     .build();
//!
//! // Using struct literal with defaults
//! let config = ProjectionConfig {
//!     format: PixelFormat::Bgr24,
//!     ..Default::default()
//! };
//! ```

use crate::frame::PixelFormat;

/// Texture dimensions must be a multiple of this value
pub const TEXTURE_ALIGNMENT: u32 = 4;

/// Configuration for the projection engine
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectionConfig {
    /// Equirectangular output width in pixels (default: 1440)
    pub width: u32,

    /// Equirectangular output height in pixels (default: 720)
    pub height: u32,

    /// Camera frame width in pixels (default: 1248)
    pub source_width: u32,

    /// Camera frame height in pixels (default: 1232)
    pub source_height: u32,

    /// Lens field of view in degrees (default: 245)
    ///
    /// The source is sampled with an equidistant fisheye model whose image
    /// circle spans this angle across the shorter source dimension.
    pub fov_degrees: f32,

    /// Pixel layout of input and output frames (default: RGB)
    pub format: PixelFormat,

    /// Prefer a low-power GPU adapter (default: false)
    pub low_power: bool,
}

impl Default for ProjectionConfig {
    fn default() -> Self {
        Self {
            width: 1440,
            height: 720,
            source_width: 1248,
            source_height: 1232,
            fov_degrees: 245.0,
            format: PixelFormat::Rgb24,
            low_power: false,
        }
    }
}

impl ProjectionConfig {
    /// Create a new configuration builder
    #[must_use]
    pub fn builder() -> ProjectionConfigBuilder {
        ProjectionConfigBuilder::default()
    }

    /// Validate configuration and return any issues
    ///
    /// Returns `Ok(())` if configuration is valid, or a list of issues.
    /// Texture alignment is checked separately when the engine is built.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut issues = Vec::new();

        if self.width == 0 || self.height == 0 {
            issues.push("output dimensions must be non-zero".to_string());
        }

        if self.source_width == 0 || self.source_height == 0 {
            issues.push("source dimensions must be non-zero".to_string());
        }

        if !(self.fov_degrees > 0.0 && self.fov_degrees <= 360.0) {
            issues.push("fov_degrees must be in (0, 360]".to_string());
        }

        if issues.is_empty() {
            Ok(())
        } else {
            Err(issues)
        }
    }

    /// Bytes per row of an output frame
    pub fn output_stride(&self) -> usize {
        self.width as usize * self.format.bytes_per_pixel()
    }
}

/// Builder for [`ProjectionConfig`]
#[derive(Debug, Clone, Default)]
pub struct ProjectionConfigBuilder {
    output_size: Option<(u32, u32)>,
    source_size: Option<(u32, u32)>,
    fov_degrees: Option<f32>,
    format: Option<PixelFormat>,
    low_power: Option<bool>,
}

impl ProjectionConfigBuilder {
    /// Set equirectangular output size
    #[must_use]
    pub fn output_size(mut self, width: u32, height: u32) -> Self {
        self.output_size = Some((width, height));
        self
    }

    /// Set camera frame size
    #[must_use]
    pub fn source_size(mut self, width: u32, height: u32) -> Self {
        self.source_size = Some((width, height));
        self
    }

    /// Set lens field of view
    #[must_use]
    pub fn fov_degrees(mut self, fov: f32) -> Self {
        self.fov_degrees = Some(fov);
        self
    }

    /// Set pixel layout
    #[must_use]
    pub fn format(mut self, format: PixelFormat) -> Self {
        self.format = Some(format);
        self
    }

    /// Prefer a low-power adapter
    #[must_use]
    pub fn low_power(mut self, enable: bool) -> Self {
        self.low_power = Some(enable);
        self
    }

    /// Build the configuration
    #[must_use]
    pub fn build(self) -> ProjectionConfig {
        let defaults = ProjectionConfig::default();
        let (width, height) = self.output_size.unwrap_or((defaults.width, defaults.height));
        let (source_width, source_height) = self
            .source_size
            .unwrap_or((defaults.source_width, defaults.source_height));

        ProjectionConfig {
            width,
            height,
            source_width,
            source_height,
            fov_degrees: self.fov_degrees.unwrap_or(defaults.fov_degrees),
            format: self.format.unwrap_or(defaults.format),
            low_power: self.low_power.unwrap_or(defaults.low_power),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ProjectionConfig::default();

        assert_eq!((config.width, config.height), (1440, 720));
        assert_eq!((config.source_width, config.source_height), (1248, 1232));
        assert_eq!(config.format, PixelFormat::Rgb24);
        assert_eq!(config.output_stride(), 4320);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder_pattern() {
        let config = ProjectionConfig::builder()
            .output_size(1024, 512)
            .source_size(640, 480)
            .fov_degrees(180.0)
            .format(PixelFormat::Bgr24)
            .build();

        assert_eq!((config.width, config.height), (1024, 512));
        assert_eq!((config.source_width, config.source_height), (640, 480));
        assert_eq!(config.fov_degrees, 180.0);
        assert_eq!(config.format, PixelFormat::Bgr24);
        assert!(!config.low_power);
    }

    #[test]
    fn test_config_validation() {
        let invalid = ProjectionConfig {
            width: 0,
            fov_degrees: 0.0,
            ..Default::default()
        };
        let issues = invalid.validate().expect_err("should be rejected");
        assert_eq!(issues.len(), 2);
    }
}
