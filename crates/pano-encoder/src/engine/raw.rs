//! Pass-through engine
//!
//! Emits every submitted frame unchanged. The output is an uncompressed
//! elementary stream of stride-padded rows, which keeps the whole pipeline
//! testable without a codec.

use tracing::debug;

use super::{check_payload, CompressionEngine, OutputBuffer, SegmentQueue};
use crate::component::{Component, ComponentState};
use crate::config::PortSettings;
use crate::error::{EncoderError, Result};

/// Uncompressed pass-through engine
#[derive(Debug, Default)]
pub struct RawEngine {
    component: Component,
    settings: Option<PortSettings>,
    pending: SegmentQueue,
}

impl RawEngine {
    /// Create an unconfigured engine in the Loaded state
    pub fn new() -> Self {
        Self::default()
    }

    /// Frames submitted but not yet fully retrieved
    pub fn pending_frames(&self) -> usize {
        self.pending.len()
    }
}

impl CompressionEngine for RawEngine {
    fn name(&self) -> &'static str {
        "raw"
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
        debug!(
            "Raw engine ports: {}x{}, stride {}, slice height {}",
            settings.width, settings.height, settings.stride, settings.slice_height
        );
        self.settings = Some(settings.clone());
        Ok(())
    }

    fn empty_this_buffer(&mut self, payload: &[u8], timestamp_ms: u64) -> Result<()> {
        self.component.ensure_executing("empty buffer")?;
        check_payload(self.settings.as_ref(), payload)?;
        self.pending.push(payload.to_vec(), timestamp_ms);
        Ok(())
    }

    fn fill_this_buffer(&mut self, out: &mut OutputBuffer) -> Result<()> {
        self.component.ensure_executing("fill buffer")?;
        self.pending.pop_into(out);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EncoderConfig;

    fn running_engine(config: &EncoderConfig) -> RawEngine {
        let mut engine = RawEngine::new();
        engine
            .configure(&PortSettings::derive(config))
            .expect("configure");
        engine.start().expect("start");
        engine
    }

    #[test]
    fn test_passthrough_segments() {
        let config = EncoderConfig::builder()
            .size(32, 4)
            .output_buffer_size(100)
            .build();
        let mut engine = running_engine(&config);
        let frame_bytes = PortSettings::derive(&config).frame_bytes();
        assert_eq!(frame_bytes, 384);

        let payload: Vec<u8> = (0..frame_bytes).map(|i| i as u8).collect();
        engine.empty_this_buffer(&payload, 0).expect("submit");

        let mut out = OutputBuffer::with_capacity(100);
        let mut collected = Vec::new();
        loop {
            engine.fill_this_buffer(&mut out).expect("fill");
            collected.extend_from_slice(out.filled());
            if out.is_frame_complete() {
                break;
            }
        }
        assert_eq!(collected, payload);
        assert_eq!(engine.pending_frames(), 0);

        engine.fill_this_buffer(&mut out).expect("fill");
        assert_eq!(out.filled_len(), 0);
    }

    #[test]
    fn test_rejects_wrong_payload_size() {
        let config = EncoderConfig::builder().size(32, 4).build();
        let mut engine = running_engine(&config);

        let err = engine.empty_this_buffer(&[0; 10], 0).expect_err("short payload");
        assert!(matches!(err, EncoderError::FrameSizeMismatch { expected: 384, actual: 10 }));
    }

    #[test]
    fn test_buffers_require_executing() {
        let config = EncoderConfig::builder().size(32, 4).build();
        let mut engine = RawEngine::new();
        engine.configure(&PortSettings::derive(&config)).expect("configure");

        assert!(engine.empty_this_buffer(&[0; 384], 0).is_err());

        engine.start().expect("start");
        assert!(engine.configure(&PortSettings::derive(&config)).is_err());

        engine.shutdown().expect("shutdown");
        assert_eq!(engine.component().state(), ComponentState::Loaded);
        let mut out = OutputBuffer::with_capacity(16);
        assert!(engine.fill_this_buffer(&mut out).is_err());
    }
}
