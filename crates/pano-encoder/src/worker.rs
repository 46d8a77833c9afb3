//! Encoder worker thread
//!
//! Owns the compression engine and the output sink for the lifetime of one
//! pipeline. The loop:
//!
//! 1. wait for a request (or a stop with an empty queue)
//! 2. hand the payload to the engine and release the input buffer
//! 3. retrieve output segments until the frame is complete, writing each
//!    non-empty one to the sink in order and waiting briefly after an
//!    empty one
//!
//! Once stopped it makes one final retrieval so the engine is not left
//! holding an output buffer. Engine and sink failures are logged and the
//! affected frame or segment is skipped.

use std::io::Write;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::engine::{CompressionEngine, OutputBuffer};
use crate::error::{EncoderError, Result};
use crate::queue::{EncodeQueue, EncodeRequest};
use crate::stats::StatsCounters;

/// Pause after a retrieval that returned nothing for an unfinished frame
const EMPTY_POLL_WAIT: Duration = Duration::from_millis(1);

/// Worker state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    /// Consuming requests
    Running,
    /// Stop requested, still emptying the queue
    Draining,
    /// Thread finished
    Stopped,
}

impl WorkerState {
    fn as_u8(self) -> u8 {
        match self {
            Self::Running => 0,
            Self::Draining => 1,
            Self::Stopped => 2,
        }
    }

    fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::Running,
            1 => Self::Draining,
            _ => Self::Stopped,
        }
    }
}

/// Worker state readable from other threads
#[derive(Debug)]
pub(crate) struct SharedWorkerState(AtomicU8);

impl SharedWorkerState {
    pub(crate) fn new() -> Self {
        Self(AtomicU8::new(WorkerState::Running.as_u8()))
    }

    pub(crate) fn get(&self) -> WorkerState {
        WorkerState::from_u8(self.0.load(Ordering::Acquire))
    }

    fn set(&self, state: WorkerState) {
        self.0.store(state.as_u8(), Ordering::Release);
    }
}

/// What the worker hands back when it exits
pub(crate) struct WorkerOutput {
    pub(crate) engine: Box<dyn CompressionEngine>,
    pub(crate) sink: Box<dyn Write + Send>,
}

pub(crate) struct EncoderWorker {
    pub(crate) queue: Arc<EncodeQueue>,
    pub(crate) engine: Box<dyn CompressionEngine>,
    pub(crate) sink: Box<dyn Write + Send>,
    pub(crate) output: OutputBuffer,
    pub(crate) counters: Arc<StatsCounters>,
    pub(crate) state: Arc<SharedWorkerState>,
    pub(crate) max_empty_polls: u32,
}

impl EncoderWorker {
    /// Thread body
    pub(crate) fn run(mut self) -> WorkerOutput {
        info!("Encoder worker started ({} engine)", self.engine.name());

        while let Some(request) = self.queue.wait_next() {
            if self.state.get() == WorkerState::Running && self.queue.is_stop_requested() {
                info!("Encoder worker draining {} queued frames", self.queue.len() + 1);
                self.state.set(WorkerState::Draining);
            }
            self.encode(request);
        }

        // Flush whatever the engine may still be holding
        self.retrieve_once();

        self.state.set(WorkerState::Stopped);
        info!("Encoder worker stopped");

        WorkerOutput {
            engine: self.engine,
            sink: self.sink,
        }
    }

    fn encode(&mut self, request: EncodeRequest) {
        let EncodeRequest {
            buffer,
            timestamp_ms,
            sequence,
        } = request;

        let submitted = self.engine.empty_this_buffer(buffer.filled(), timestamp_ms);
        drop(buffer);

        if let Err(e) = submitted {
            warn!("Frame {} skipped: {}", sequence, e);
            StatsCounters::bump(&self.counters.submit_failures);
            return;
        }

        match self.collect_output() {
            Ok(()) => debug!("Frame {} (ts {} ms) written", sequence, timestamp_ms),
            Err(e) => {
                warn!("Frame {} output lost: {}", sequence, e);
                StatsCounters::bump(&self.counters.retrieval_failures);
            }
        }
    }

    /// Retrieve segments until the engine marks the frame complete
    ///
    /// A complete segment may be empty (the engine skipped the frame).
    fn collect_output(&mut self) -> Result<()> {
        let mut empty_polls = 0;
        loop {
            self.engine.fill_this_buffer(&mut self.output)?;

            if self.output.filled_len() > 0 {
                self.write_segment();
            }
            if self.output.is_frame_complete() {
                return Ok(());
            }

            if self.output.filled_len() == 0 {
                empty_polls += 1;
                if empty_polls >= self.max_empty_polls {
                    return Err(EncoderError::retrieve(format!("no output after {} polls", empty_polls)));
                }
                std::thread::sleep(EMPTY_POLL_WAIT);
            }
        }
    }

    fn retrieve_once(&mut self) {
        match self.engine.fill_this_buffer(&mut self.output) {
            Ok(()) if self.output.filled_len() > 0 => self.write_segment(),
            Ok(()) => {}
            Err(e) => {
                warn!("Final output retrieval failed: {}", e);
                StatsCounters::bump(&self.counters.retrieval_failures);
            }
        }
    }

    fn write_segment(&mut self) {
        let segment = self.output.filled();
        match self.sink.write_all(segment) {
            Ok(()) => self.counters.record_segment(segment.len()),
            Err(e) => {
                warn!("Dropping {} byte segment: {}", segment.len(), e);
                StatsCounters::bump(&self.counters.write_failures);
            }
        }
    }
}
