//! H.264 engine using OpenH264
//!
//! Converts each stride-padded RGB/BGR frame to YUV 4:2:0 and encodes it
//! to an Annex-B NAL unit stream.
//!
//! # System Requirements
//!
//! libopenh264 is built from source by the `openh264` crate; a C compiler
//! must be available.

use openh264::encoder::{Encoder, EncoderConfig as OpenH264Config};
use openh264::formats::YUVBuffer;
use pano_projection::PixelFormat;
use tracing::{debug, info};

use super::{check_payload, CompressionEngine, OutputBuffer, SegmentQueue};
use crate::component::{Component, ComponentState};
use crate::config::PortSettings;
use crate::error::{EncoderError, Result};

/// H.264 engine wrapping OpenH264
pub struct H264Engine {
    component: Component,
    settings: Option<PortSettings>,
    encoder: Option<Encoder>,
    pending: SegmentQueue,
    rgb: Vec<u8>,
    frames_encoded: u64,
}

impl H264Engine {
    /// Create an unconfigured engine in the Loaded state
    pub fn new() -> Self {
        Self {
            component: Component::new(),
            settings: None,
            encoder: None,
            pending: SegmentQueue::default(),
            rgb: Vec::new(),
            frames_encoded: 0,
        }
    }

    /// Frames encoded so far
    pub fn frames_encoded(&self) -> u64 {
        self.frames_encoded
    }

    /// Strip row padding and reorder channels to RGB
    fn pack_rgb(&mut self, payload: &[u8], settings: &PortSettings) {
        let row_bytes = settings.width as usize * 3;
        self.rgb.clear();
        for row in payload.chunks_exact(settings.stride).take(settings.height as usize) {
            let row = &row[..row_bytes];
            match settings.format {
                PixelFormat::Rgb24 => self.rgb.extend_from_slice(row),
                PixelFormat::Bgr24 => {
                    for px in row.chunks_exact(3) {
                        self.rgb.extend_from_slice(&[px[2], px[1], px[0]]);
                    }
                }
            }
        }
    }
}

impl Default for H264Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl CompressionEngine for H264Engine {
    fn name(&self) -> &'static str {
        "h264"
    }

    fn component(&self) -> &Component {
        &self.component
    }

    fn component_mut(&mut self) -> &mut Component {
        &mut self.component
    }

    fn configure(&mut self, settings: &PortSettings) -> Result<()> {
        if self.component.state() != ComponentState::Loaded {
            return Err(EncoderError::InvalidTransition {
                from: self.component.state(),
                operation: "configure ports",
            });
        }

        let config = OpenH264Config::new(settings.width, settings.height)
            .set_bitrate_bps(settings.bitrate_bps)
            .max_frame_rate(settings.frame_rate_hz() as f32);
        let encoder = Encoder::with_config(config)
            .map_err(|e| EncoderError::engine_init(format!("Failed to create H.264 encoder: {:?}", e)))?;

        info!(
            "H.264 engine configured: {}x{} @ {:.2} fps, {} bps",
            settings.width,
            settings.height,
            settings.frame_rate_hz(),
            settings.bitrate_bps
        );

        self.rgb = Vec::with_capacity(settings.width as usize * settings.height as usize * 3);
        self.encoder = Some(encoder);
        self.settings = Some(settings.clone());
        Ok(())
    }

    fn empty_this_buffer(&mut self, payload: &[u8], timestamp_ms: u64) -> Result<()> {
        self.component.ensure_executing("empty buffer")?;
        check_payload(self.settings.as_ref(), payload)?;
        let settings = self
            .settings
            .clone()
            .ok_or_else(|| EncoderError::submit("engine has not been configured"))?;

        self.pack_rgb(payload, &settings);
        let yuv = YUVBuffer::with_rgb(settings.width as usize, settings.height as usize, &self.rgb);

        let encoder = self
            .encoder
            .as_mut()
            .ok_or_else(|| EncoderError::submit("encoder not created"))?;
        let bitstream = encoder
            .encode(&yuv)
            .map_err(|e| EncoderError::submit(format!("H.264 encoding failed: {:?}", e)))?;

        let bytes = bitstream.to_vec();
        debug!("Frame {} encoded to {} bytes", self.frames_encoded, bytes.len());
        self.frames_encoded += 1;
        self.pending.push(bytes, timestamp_ms);
        Ok(())
    }

    fn fill_this_buffer(&mut self, out: &mut OutputBuffer) -> Result<()> {
        self.component.ensure_executing("fill buffer")?;
        self.pending.pop_into(out);
        Ok(())
    }
}
