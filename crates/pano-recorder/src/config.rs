//! Recorder Configuration
//!
//! # Examples
//!
//! ```rust
//! use pano_encoder::{Codec, EncoderConfig};
//! use pano_projection::ProjectionConfig;
//! use pano_recorder::RecorderConfig;
//!
//! let config = RecorderConfig::builder()
//!     .projection(ProjectionConfig::builder().fov_degrees(235.0).build())
//!     .encoder(EncoderConfig::builder().codec(Codec::Raw).input_buffer_count(8).build())
//!     .jpeg_quality(85)
//!     .build();
//! assert!(config.validate().is_ok());
//! ```

use pano_encoder::{EncoderConfig, DEFAULT_JPEG_QUALITY};
use pano_projection::ProjectionConfig;

/// Configuration for a [`Recorder`](crate::Recorder)
#[derive(Debug, Clone, PartialEq)]
pub struct RecorderConfig {
    /// Projection engine settings
    pub projection: ProjectionConfig,

    /// Encoder template
    ///
    /// Frame size and pixel format are taken from `projection` and the
    /// bitrate from each `start_record` call.
    pub encoder: EncoderConfig,

    /// JPEG quality for still captures, 1-100 (default: 90)
    pub jpeg_quality: u8,
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            projection: ProjectionConfig::default(),
            encoder: EncoderConfig::default(),
            jpeg_quality: DEFAULT_JPEG_QUALITY,
        }
    }
}

impl RecorderConfig {
    /// Create a new configuration builder
    #[must_use]
    pub fn builder() -> RecorderConfigBuilder {
        RecorderConfigBuilder::default()
    }

    /// Encoder configuration for one recording at `bitrate_kbps`
    pub fn encoder_for(&self, bitrate_kbps: u32) -> EncoderConfig {
        EncoderConfig {
            width: self.projection.width,
            height: self.projection.height,
            format: self.projection.format,
            bitrate_kbps,
            ..self.encoder.clone()
        }
    }

    /// Validate configuration and return any issues
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut issues = Vec::new();

        if let Err(mut projection) = self.projection.validate() {
            issues.append(&mut projection);
        }

        if let Err(encoder) = self.encoder_for(self.encoder.bitrate_kbps).validate() {
            issues.extend(encoder.into_iter().map(|issue| format!("encoder: {}", issue)));
        }

        if !(1..=100).contains(&self.jpeg_quality) {
            issues.push("jpeg_quality must be between 1 and 100".to_string());
        }

        if issues.is_empty() {
            Ok(())
        } else {
            Err(issues)
        }
    }
}

/// Builder for [`RecorderConfig`]
#[derive(Debug, Clone, Default)]
pub struct RecorderConfigBuilder {
    projection: Option<ProjectionConfig>,
    encoder: Option<EncoderConfig>,
    jpeg_quality: Option<u8>,
}

impl RecorderConfigBuilder {
    /// Set projection settings
    #[must_use]
    pub fn projection(mut self, config: ProjectionConfig) -> Self {
        self.projection = Some(config);
        self
    }

    /// Set the encoder template
    #[must_use]
    pub fn encoder(mut self, config: EncoderConfig) -> Self {
        self.encoder = Some(config);
        self
    }

    /// Set still JPEG quality
    #[must_use]
    pub fn jpeg_quality(mut self, quality: u8) -> Self {
        self.jpeg_quality = Some(quality);
        self
    }

    /// Build the configuration
    #[must_use]
    pub fn build(self) -> RecorderConfig {
        let defaults = RecorderConfig::default();
        RecorderConfig {
            projection: self.projection.unwrap_or(defaults.projection),
            encoder: self.encoder.unwrap_or(defaults.encoder),
            jpeg_quality: self.jpeg_quality.unwrap_or(defaults.jpeg_quality),
        }
    }
}

#[cfg(test)]
mod tests {
    use pano_projection::PixelFormat;

    use super::*;

    #[test]
    fn test_default_config() {
        let config = RecorderConfig::default();
        assert_eq!(config.jpeg_quality, 90);
        assert_eq!(config.projection.width, 1440);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_encoder_follows_projection() {
        let config = RecorderConfig::builder()
            .projection(
                ProjectionConfig::builder()
                    .output_size(2048, 1024)
                    .format(PixelFormat::Bgr24)
                    .build(),
            )
            .build();

        let encoder = config.encoder_for(1000);
        assert_eq!((encoder.width, encoder.height), (2048, 1024));
        assert_eq!(encoder.format, PixelFormat::Bgr24);
        assert_eq!(encoder.bitrate_kbps, 1000);
        assert_eq!(encoder.input_buffer_count, 6);
    }

    #[test]
    fn test_validation() {
        let config = RecorderConfig::builder().jpeg_quality(0).build();
        let issues = config.validate().expect_err("quality 0");
        assert!(issues.iter().any(|i| i.contains("jpeg_quality")));

        let config = RecorderConfig::builder()
            .encoder(EncoderConfig::builder().input_buffer_count(0).build())
            .build();
        let issues = config.validate().expect_err("no input buffers");
        assert!(issues.iter().all(|i| i.starts_with("encoder: ")));
    }
}
