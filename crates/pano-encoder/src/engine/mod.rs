//! Compression engines
//!
//! A [`CompressionEngine`] stands in for the hardware encoder component. The
//! worker thread hands it one input payload at a time with
//! [`empty_this_buffer`](CompressionEngine::empty_this_buffer) and then pulls
//! compressed output with [`fill_this_buffer`](CompressionEngine::fill_this_buffer)
//! into a fixed-capacity [`OutputBuffer`] until the frame is complete.
//!
//! Engines own a [`Component`] and follow its lifecycle; the provided
//! [`start`](CompressionEngine::start) and [`shutdown`](CompressionEngine::shutdown)
//! methods run the full state sequence.

use std::collections::VecDeque;

use tracing::info;

use crate::component::{Component, ComponentState, Port};
use crate::config::{Codec, EncoderConfig, PortSettings};
use crate::error::{EncoderError, Result};

pub mod raw;

#[cfg(feature = "h264")]
pub mod h264;

pub use raw::RawEngine;

#[cfg(feature = "h264")]
pub use h264::H264Engine;

/// Fixed-capacity buffer compressed output is retrieved into
#[derive(Debug, Clone)]
pub struct OutputBuffer {
    data: Vec<u8>,
    filled_len: usize,
    timestamp_ms: u64,
    frame_complete: bool,
}

impl OutputBuffer {
    /// Allocate an output buffer of `capacity` bytes
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            data: vec![0; capacity],
            filled_len: 0,
            timestamp_ms: 0,
            frame_complete: false,
        }
    }

    /// Buffer capacity
    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    /// Valid payload bytes
    pub fn filled(&self) -> &[u8] {
        &self.data[..self.filled_len]
    }

    /// Number of valid payload bytes (may be zero)
    pub fn filled_len(&self) -> usize {
        self.filled_len
    }

    /// Timestamp of the frame this segment belongs to
    pub fn timestamp_ms(&self) -> u64 {
        self.timestamp_ms
    }

    /// Whether this segment ends its frame
    pub fn is_frame_complete(&self) -> bool {
        self.frame_complete
    }

    /// Mark the buffer empty
    pub fn clear(&mut self) {
        self.filled_len = 0;
        self.frame_complete = false;
    }

    /// Copy as much of `bytes` as fits; returns the number copied
    pub fn fill_from(&mut self, bytes: &[u8], timestamp_ms: u64, frame_complete: bool) -> usize {
        let len = bytes.len().min(self.capacity());
        self.data[..len].copy_from_slice(&bytes[..len]);
        self.filled_len = len;
        self.timestamp_ms = timestamp_ms;
        self.frame_complete = frame_complete && len == bytes.len();
        len
    }
}

/// Encoded frames waiting to be retrieved, split into output-sized segments
#[derive(Debug, Default)]
pub struct SegmentQueue {
    frames: VecDeque<(Vec<u8>, u64)>,
    offset: usize,
}

impl SegmentQueue {
    /// Queue one encoded frame
    pub fn push(&mut self, bytes: Vec<u8>, timestamp_ms: u64) {
        self.frames.push_back((bytes, timestamp_ms));
    }

    /// Number of frames not yet fully retrieved
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// Whether nothing is waiting
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Move the next segment into `out`; leaves `out` empty when nothing waits
    pub fn pop_into(&mut self, out: &mut OutputBuffer) {
        out.clear();
        let Some((bytes, timestamp_ms)) = self.frames.front() else {
            return;
        };

        let remaining = &bytes[self.offset..];
        let copied = out.fill_from(remaining, *timestamp_ms, true);
        self.offset += copied;

        if self.offset >= bytes.len() {
            self.frames.pop_front();
            self.offset = 0;
        }
    }
}

/// An encoder component that turns raw frames into bitstream segments
pub trait CompressionEngine: Send {
    /// Short engine name for logs
    fn name(&self) -> &'static str;

    /// Lifecycle state
    fn component(&self) -> &Component;

    /// Mutable lifecycle state
    fn component_mut(&mut self) -> &mut Component;

    /// Apply port settings; only valid while Loaded
    fn configure(&mut self, settings: &PortSettings) -> Result<()>;

    /// Submit one frame payload (stride × height bytes) for encoding
    fn empty_this_buffer(&mut self, payload: &[u8], timestamp_ms: u64) -> Result<()>;

    /// Retrieve the next output segment into `out`
    ///
    /// `out` is left with zero filled bytes when nothing is ready.
    fn fill_this_buffer(&mut self, out: &mut OutputBuffer) -> Result<()>;

    /// Loaded → Idle → ports enabled → Executing
    fn start(&mut self) -> Result<()> {
        let component = self.component_mut();
        component.enter_idle()?;
        component.enable_port(Port::Input)?;
        component.enable_port(Port::Output)?;
        component.enter_executing()?;
        info!("{} engine executing", self.name());
        Ok(())
    }

    /// Executing → Idle → ports disabled → Loaded
    fn shutdown(&mut self) -> Result<()> {
        let component = self.component_mut();
        if component.state() == ComponentState::Executing {
            component.enter_idle()?;
        }
        if component.is_port_enabled(Port::Input) {
            component.disable_port(Port::Input)?;
        }
        if component.is_port_enabled(Port::Output) {
            component.disable_port(Port::Output)?;
        }
        if component.state() == ComponentState::Idle {
            component.enter_loaded()?;
        }
        info!("{} engine unloaded", self.name());
        Ok(())
    }
}

/// Create the engine selected by `config.codec`
pub fn engine_for(config: &EncoderConfig) -> Result<Box<dyn CompressionEngine>> {
    match config.codec {
        Codec::Raw => Ok(Box::new(RawEngine::new())),
        #[cfg(feature = "h264")]
        Codec::H264 => Ok(Box::new(H264Engine::new())),
        #[cfg(not(feature = "h264"))]
        Codec::H264 => Err(EncoderError::EngineUnavailable(
            "H.264 support not enabled. Enable the 'h264' feature.".to_string(),
        )),
    }
}

/// Check a payload is exactly one frame
pub(crate) fn check_payload(settings: Option<&PortSettings>, payload: &[u8]) -> Result<()> {
    let settings = settings.ok_or_else(|| EncoderError::submit("engine has not been configured"))?;
    if payload.len() != settings.frame_bytes() {
        return Err(EncoderError::FrameSizeMismatch {
            expected: settings.frame_bytes(),
            actual: payload.len(),
        });
    }
    Ok(())
}
