//! Encoder Configuration
//!
//! Provides configuration options for the encoder pipeline with a builder
//! pattern for ergonomic construction, plus the port geometry derived from it.
//!
//! # Examples
//!
//! ```rust
//! use pano_encoder::{Codec, EncoderConfig};
//!
//! // Using builder pattern
//! let config = EncoderConfig::builder()
//!     .size(1440, 720)
//!     .bitrate_kbps(1000)
//!     .frame_rate(30, 1)
//!     .codec(Codec::Raw)
//!     .build();
//!
//! // Using struct literal with defaults
//! let config = EncoderConfig {
//!     input_buffer_count: 8,
//!     ..Default::default()
//! };
//! ```

use pano_projection::PixelFormat;

use crate::error::{EncoderError, Result};

/// Frame rate used when either component is non-positive
pub const DEFAULT_FRAME_RATE: (u32, u32) = (25, 1);

/// Largest accepted frame width or height in pixels
pub const MAX_FRAME_DIMENSION: u32 = 16384;

/// Largest accepted stride or slice height alignment
pub const MAX_ALIGNMENT: u32 = 1024;

/// Compression engine selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Codec {
    /// Uncompressed elementary stream (always available)
    #[default]
    Raw,
    /// H.264 Annex-B stream (requires the `h264` feature)
    H264,
}

/// Rate control mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[non_exhaustive]
pub enum RateControl {
    /// Variable bitrate around the configured target
    #[default]
    Variable,
}

/// Configuration for an encoder pipeline
#[derive(Debug, Clone, PartialEq)]
pub struct EncoderConfig {
    /// Frame width in pixels (default: 1440)
    pub width: u32,

    /// Frame height in pixels (default: 720)
    pub height: u32,

    /// Pixel layout of submitted frames (default: RGB)
    pub format: PixelFormat,

    /// Target bitrate in kilobits per second (default: 3000)
    pub bitrate_kbps: u32,

    /// Frame rate numerator; non-positive falls back to 25/1 (default: 25)
    pub frame_rate_num: i32,

    /// Frame rate denominator; non-positive falls back to 25/1 (default: 1)
    pub frame_rate_den: i32,

    /// Number of input buffers in the pool (default: 6)
    ///
    /// When all are in flight, submissions are dropped.
    pub input_buffer_count: usize,

    /// Capacity of the output buffer in bytes (default: 512 KiB)
    pub output_buffer_size: usize,

    /// Input row alignment in pixels (default: 32)
    pub stride_alignment: u32,

    /// Input slice height alignment in rows (default: 16)
    pub slice_height_alignment: u32,

    /// Compression engine (default: raw)
    pub codec: Codec,

    /// Rate control mode (default: variable)
    pub rate_control: RateControl,

    /// Empty output polls tolerated per frame before moving on (default: 64)
    pub max_empty_polls: u32,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            width: 1440,
            height: 720,
            format: PixelFormat::Rgb24,
            bitrate_kbps: 3000,
            frame_rate_num: 25,
            frame_rate_den: 1,
            input_buffer_count: 6,
            output_buffer_size: 512 * 1024,
            stride_alignment: 32,
            slice_height_alignment: 16,
            codec: Codec::Raw,
            rate_control: RateControl::Variable,
            max_empty_polls: 64,
        }
    }
}

impl EncoderConfig {
    /// Create a new configuration builder
    #[must_use]
    pub fn builder() -> EncoderConfigBuilder {
        EncoderConfigBuilder::default()
    }

    /// Effective frame rate as (numerator, denominator)
    ///
    /// A non-positive numerator or denominator selects [`DEFAULT_FRAME_RATE`].
    pub fn frame_rate(&self) -> (u32, u32) {
        if self.frame_rate_num <= 0 || self.frame_rate_den <= 0 {
            DEFAULT_FRAME_RATE
        } else {
            (self.frame_rate_num as u32, self.frame_rate_den as u32)
        }
    }

    /// Effective frame rate in frames per second
    pub fn frame_rate_hz(&self) -> f64 {
        let (num, den) = self.frame_rate();
        f64::from(num) / f64::from(den)
    }

    /// Target bitrate in bits per second
    pub fn bitrate_bps(&self) -> u32 {
        self.bitrate_kbps.saturating_mul(1000)
    }

    /// Validate configuration and return any issues
    ///
    /// Returns `Ok(())` if configuration is valid, or a list of issues.
    pub fn validate(&self) -> std::result::Result<(), Vec<String>> {
        let mut issues = Vec::new();

        if self.width == 0 || self.height == 0 {
            issues.push("frame dimensions must be non-zero".to_string());
        }

        if self.width > MAX_FRAME_DIMENSION || self.height > MAX_FRAME_DIMENSION {
            issues.push(format!(
                "frame dimensions {}x{} exceed the {} pixel limit",
                self.width, self.height, MAX_FRAME_DIMENSION
            ));
        }

        if self.bitrate_kbps == 0 {
            issues.push("bitrate_kbps must be greater than 0".to_string());
        }

        if self.input_buffer_count == 0 {
            issues.push("input_buffer_count must be at least 1".to_string());
        }

        if self.output_buffer_size == 0 {
            issues.push("output_buffer_size must be greater than 0".to_string());
        }

        if self.stride_alignment == 0 || !self.stride_alignment.is_power_of_two() {
            issues.push("stride_alignment must be a power of two".to_string());
        }

        if self.slice_height_alignment == 0 || !self.slice_height_alignment.is_power_of_two() {
            issues.push("slice_height_alignment must be a power of two".to_string());
        }

        if self.stride_alignment > MAX_ALIGNMENT || self.slice_height_alignment > MAX_ALIGNMENT {
            issues.push(format!("alignments must not exceed {}", MAX_ALIGNMENT));
        }

        if self.max_empty_polls == 0 {
            issues.push("max_empty_polls must be at least 1".to_string());
        }

        if self.codec == Codec::H264 && (self.width % 2 != 0 || self.height % 2 != 0) {
            issues.push("H.264 requires even frame dimensions".to_string());
        }

        if issues.is_empty() {
            Ok(())
        } else {
            Err(issues)
        }
    }

    /// Derive port geometry, failing on invalid configuration
    pub fn port_settings(&self) -> Result<PortSettings> {
        self.validate()
            .map_err(|issues| EncoderError::invalid_config(issues.join("; ")))?;
        Ok(PortSettings::derive(self))
    }
}

/// Builder for [`EncoderConfig`]
#[derive(Debug, Clone, Default)]
pub struct EncoderConfigBuilder {
    size: Option<(u32, u32)>,
    format: Option<PixelFormat>,
    bitrate_kbps: Option<u32>,
    frame_rate: Option<(i32, i32)>,
    input_buffer_count: Option<usize>,
    output_buffer_size: Option<usize>,
    codec: Option<Codec>,
    rate_control: Option<RateControl>,
    max_empty_polls: Option<u32>,
}

impl EncoderConfigBuilder {
    /// Set frame size
    #[must_use]
    pub fn size(mut self, width: u32, height: u32) -> Self {
        self.size = Some((width, height));
        self
    }

    /// Set pixel layout
    #[must_use]
    pub fn format(mut self, format: PixelFormat) -> Self {
        self.format = Some(format);
        self
    }

    /// Set target bitrate (kbps)
    #[must_use]
    pub fn bitrate_kbps(mut self, kbps: u32) -> Self {
        self.bitrate_kbps = Some(kbps);
        self
    }

    /// Set frame rate; non-positive values fall back to 25/1
    #[must_use]
    pub fn frame_rate(mut self, num: i32, den: i32) -> Self {
        self.frame_rate = Some((num, den));
        self
    }

    /// Set input buffer pool size
    #[must_use]
    pub fn input_buffer_count(mut self, count: usize) -> Self {
        self.input_buffer_count = Some(count);
        self
    }

    /// Set output buffer capacity (bytes)
    #[must_use]
    pub fn output_buffer_size(mut self, bytes: usize) -> Self {
        self.output_buffer_size = Some(bytes);
        self
    }

    /// Set compression engine
    #[must_use]
    pub fn codec(mut self, codec: Codec) -> Self {
        self.codec = Some(codec);
        self
    }

    /// Set rate control mode
    #[must_use]
    pub fn rate_control(mut self, mode: RateControl) -> Self {
        self.rate_control = Some(mode);
        self
    }

    /// Set empty-poll limit per frame
    #[must_use]
    pub fn max_empty_polls(mut self, polls: u32) -> Self {
        self.max_empty_polls = Some(polls);
        self
    }

    /// Build the configuration
    #[must_use]
    pub fn build(self) -> EncoderConfig {
        let defaults = EncoderConfig::default();
        let (width, height) = self.size.unwrap_or((defaults.width, defaults.height));
        let (frame_rate_num, frame_rate_den) = self
            .frame_rate
            .unwrap_or((defaults.frame_rate_num, defaults.frame_rate_den));

        EncoderConfig {
            width,
            height,
            format: self.format.unwrap_or(defaults.format),
            bitrate_kbps: self.bitrate_kbps.unwrap_or(defaults.bitrate_kbps),
            frame_rate_num,
            frame_rate_den,
            input_buffer_count: self.input_buffer_count.unwrap_or(defaults.input_buffer_count),
            output_buffer_size: self.output_buffer_size.unwrap_or(defaults.output_buffer_size),
            stride_alignment: defaults.stride_alignment,
            slice_height_alignment: defaults.slice_height_alignment,
            codec: self.codec.unwrap_or(defaults.codec),
            rate_control: self.rate_control.unwrap_or(defaults.rate_control),
            max_empty_polls: self.max_empty_polls.unwrap_or(defaults.max_empty_polls),
        }
    }
}

/// Input and output port parameters handed to the compression engine
#[derive(Debug, Clone, PartialEq)]
pub struct PortSettings {
    /// Frame width in pixels
    pub width: u32,
    /// Frame height in pixels
    pub height: u32,
    /// Pixel layout
    pub format: PixelFormat,
    /// Input row stride in bytes
    pub stride: usize,
    /// Input slice height in rows
    pub slice_height: u32,
    /// Capacity of one input buffer (stride × slice height)
    pub input_buffer_size: usize,
    /// Number of input buffers
    pub input_buffer_count: usize,
    /// Capacity of the output buffer
    pub output_buffer_size: usize,
    /// Target bitrate in bits per second
    pub bitrate_bps: u32,
    /// Frame rate numerator
    pub frame_rate_num: u32,
    /// Frame rate denominator
    pub frame_rate_den: u32,
    /// Rate control mode
    pub rate_control: RateControl,
}

impl PortSettings {
    /// Compute port geometry from a configuration
    ///
    /// Rows are padded to `stride_alignment` pixels and the slice height to
    /// `slice_height_alignment` rows, as the hardware expects.
    pub fn derive(config: &EncoderConfig) -> Self {
        let aligned_width = align_up(config.width, config.stride_alignment);
        let stride = aligned_width as usize * config.format.bytes_per_pixel();
        let slice_height = align_up(config.height, config.slice_height_alignment);
        let (frame_rate_num, frame_rate_den) = config.frame_rate();

        Self {
            width: config.width,
            height: config.height,
            format: config.format,
            stride,
            slice_height,
            input_buffer_size: stride * slice_height as usize,
            input_buffer_count: config.input_buffer_count,
            output_buffer_size: config.output_buffer_size,
            bitrate_bps: config.bitrate_bps(),
            frame_rate_num,
            frame_rate_den,
            rate_control: config.rate_control,
        }
    }

    /// Bytes of one submitted frame (stride × height)
    pub fn frame_bytes(&self) -> usize {
        self.stride * self.height as usize
    }

    /// Frame rate in frames per second
    pub fn frame_rate_hz(&self) -> f64 {
        f64::from(self.frame_rate_num) / f64::from(self.frame_rate_den)
    }
}

/// Round `value` up to a multiple of the power-of-two `align`
///
/// Saturates at `u32::MAX` instead of wrapping.
pub fn align_up(value: u32, align: u32) -> u32 {
    match value.checked_add(align - 1) {
        Some(padded) => padded & !(align - 1),
        None => u32::MAX,
    }
}
