//! Encoder pipeline
//!
//! Ties the buffer pool, encode queue and worker thread together behind a
//! start/submit/stop API.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────┐
//! │  Caller thread               │
//! │                              │
//! │  try_acquire_input_buffer()  │──► BufferPool (non-blocking, None = drop)
//! │  submit(buffer, bytes)       │
//! └──────────────┬───────────────┘
//!                │ EncodeQueue (mutex + condvar, FIFO)
//! ┌──────────────▼───────────────┐
//! │  Encoder worker thread       │
//! │  (std::thread, owns engine)  │
//! │                              │
//! │  empty_this_buffer()         │
//! │  fill_this_buffer() ──► sink │
//! └──────────────────────────────┘
//! ```
//!
//! # Examples
//!
//! ```rust,no_run
//! use pano_encoder::{EncoderConfig, EncoderPipeline, SubmitOutcome};
//! use pano_projection::{Frame, PixelFormat};
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = EncoderConfig::builder().size(1440, 720).bitrate_kbps(1000).build();
//! let pipeline = EncoderPipeline::start_file("capture.raw", config)?;
//!
//! let frame = Frame::new(1440, 720, PixelFormat::Rgb24);
//! match pipeline.encode_frame(&frame.view())? {
//!     SubmitOutcome::Queued { timestamp_ms } => println!("queued at {} ms", timestamp_ms),
//!     SubmitOutcome::Dropped => println!("encoder busy, frame dropped"),
//! }
//!
//! let stats = pipeline.stop()?;
//! println!("{} bytes written", stats.bytes_written);
//! # Ok(())
//! # }
//! ```

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::Arc;
use std::thread::JoinHandle;

use pano_projection::FrameView;
use tracing::{debug, error, info, warn};

use crate::config::{EncoderConfig, PortSettings};
use crate::engine::{engine_for, CompressionEngine, OutputBuffer};
use crate::error::{EncoderError, Result};
use crate::pool::{BufferPool, InputBuffer};
use crate::queue::EncodeQueue;
use crate::stats::{EncoderStats, StatsCounters};
use crate::worker::{EncoderWorker, SharedWorkerState, WorkerOutput, WorkerState};

/// Result of offering a frame to the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// The frame is queued for encoding
    Queued {
        /// Assigned presentation timestamp
        timestamp_ms: u64,
    },
    /// No input buffer was free; the frame was not taken
    Dropped,
}

impl SubmitOutcome {
    /// Whether the frame was dropped
    pub fn is_dropped(&self) -> bool {
        matches!(self, Self::Dropped)
    }
}

/// A running encoder pipeline
///
/// Created by [`start`](Self::start) and ended by [`stop`](Self::stop).
/// Dropping a pipeline that was not stopped drains and stops it.
pub struct EncoderPipeline {
    settings: PortSettings,
    pool: BufferPool,
    queue: Arc<EncodeQueue>,
    counters: Arc<StatsCounters>,
    state: Arc<SharedWorkerState>,
    worker: Option<JoinHandle<WorkerOutput>>,
}

impl EncoderPipeline {
    /// Start a pipeline writing to `sink`, with the engine selected by `config.codec`
    pub fn start<W>(sink: W, config: EncoderConfig) -> Result<Self>
    where
        W: Write + Send + 'static,
    {
        let engine = engine_for(&config)?;
        Self::start_with_engine(sink, config, engine)
    }

    /// Start a pipeline writing to a newly created file
    pub fn start_file(path: impl AsRef<Path>, config: EncoderConfig) -> Result<Self> {
        let path = path.as_ref();
        let engine = engine_for(&config)?;
        let file = File::create(path).map_err(|source| EncoderError::SinkOpen {
            path: path.to_path_buf(),
            source,
        })?;
        info!("Recording to {}", path.display());
        Self::start_with_engine(BufWriter::new(file), config, engine)
    }

    /// Start a pipeline with an explicit compression engine
    ///
    /// Configures the engine's ports, walks it to Executing, allocates the
    /// input buffers and spawns the worker. On any failure nothing is left
    /// running.
    pub fn start_with_engine<W>(sink: W, config: EncoderConfig, mut engine: Box<dyn CompressionEngine>) -> Result<Self>
    where
        W: Write + Send + 'static,
    {
        let settings = config.port_settings()?;

        engine.configure(&settings)?;
        engine.start()?;

        let pool = BufferPool::new(settings.input_buffer_count, settings.input_buffer_size);
        let queue = Arc::new(EncodeQueue::new());
        let counters = Arc::new(StatsCounters::default());
        let state = Arc::new(SharedWorkerState::new());

        let worker = EncoderWorker {
            queue: Arc::clone(&queue),
            engine,
            sink: Box::new(sink),
            output: OutputBuffer::with_capacity(settings.output_buffer_size),
            counters: Arc::clone(&counters),
            state: Arc::clone(&state),
            max_empty_polls: config.max_empty_polls,
        };

        let handle = std::thread::Builder::new()
            .name("pano-encoder".to_string())
            .spawn(move || worker.run())
            .map_err(|e| EncoderError::WorkerSpawn(e.to_string()))?;

        info!(
            "Encoder pipeline started: {}x{}, stride {}, {} input buffers, {} bps, {}/{} fps",
            settings.width,
            settings.height,
            settings.stride,
            settings.input_buffer_count,
            settings.bitrate_bps,
            settings.frame_rate_num,
            settings.frame_rate_den
        );

        Ok(Self {
            settings,
            pool,
            queue,
            counters,
            state,
            worker: Some(handle),
        })
    }

    /// Port geometry in use
    pub fn settings(&self) -> &PortSettings {
        &self.settings
    }

    /// Take a free input buffer without blocking
    ///
    /// `None` means every buffer is in flight; the caller should drop the
    /// frame. Use [`record_drop`](Self::record_drop) to count it.
    pub fn try_acquire_input_buffer(&self) -> Option<InputBuffer> {
        self.pool.try_acquire()
    }

    /// Count a frame the caller dropped
    pub fn record_drop(&self) {
        StatsCounters::bump(&self.counters.frames_dropped);
    }

    /// Copy exactly one frame (stride × height bytes) into `buffer` and queue it
    ///
    /// Returns the assigned timestamp.
    pub fn submit(&self, mut buffer: InputBuffer, frame_bytes: &[u8]) -> Result<u64> {
        let expected = self.settings.frame_bytes();
        if frame_bytes.len() != expected {
            return Err(EncoderError::FrameSizeMismatch {
                expected,
                actual: frame_bytes.len(),
            });
        }
        buffer.fill(frame_bytes)?;
        Ok(self.enqueue(buffer))
    }

    /// Acquire a buffer, copy `frame` into it at the port stride and queue it
    ///
    /// Never blocks. Returns [`SubmitOutcome::Dropped`] when no buffer is free.
    pub fn encode_frame(&self, frame: &FrameView<'_>) -> Result<SubmitOutcome> {
        if frame.width != self.settings.width || frame.height != self.settings.height {
            return Err(EncoderError::DimensionMismatch {
                expected_width: self.settings.width,
                expected_height: self.settings.height,
                actual_width: frame.width,
                actual_height: frame.height,
            });
        }
        frame.validate()?;

        let Some(mut buffer) = self.pool.try_acquire() else {
            self.record_drop();
            warn!("No free input buffer, frame dropped");
            return Ok(SubmitOutcome::Dropped);
        };

        let frame_bytes = self.settings.frame_bytes();
        let data = buffer.as_mut_slice();
        frame.copy_to_strided(data, self.settings.stride)?;
        clear_row_padding(&mut data[..frame_bytes], self.settings.stride, frame.row_bytes());
        buffer.set_filled_len(frame_bytes);

        let timestamp_ms = self.enqueue(buffer);
        Ok(SubmitOutcome::Queued { timestamp_ms })
    }

    fn enqueue(&self, buffer: InputBuffer) -> u64 {
        let timestamp_ms = self.queue.push(buffer);
        StatsCounters::bump(&self.counters.frames_queued);
        debug!("Frame queued at {} ms ({} waiting)", timestamp_ms, self.queue.len());
        timestamp_ms
    }

    /// Current statistics
    pub fn stats(&self) -> EncoderStats {
        self.counters.snapshot()
    }

    /// Current worker state
    pub fn worker_state(&self) -> WorkerState {
        self.state.get()
    }

    /// Requests waiting for the worker
    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    /// Drain the queue, stop the worker, unload the engine and flush the sink
    pub fn stop(mut self) -> Result<EncoderStats> {
        self.shutdown()
    }

    fn shutdown(&mut self) -> Result<EncoderStats> {
        let Some(handle) = self.worker.take() else {
            return Ok(self.counters.snapshot());
        };

        info!("Stopping encoder pipeline ({} frames queued)", self.queue.len());
        self.queue.request_stop();

        let WorkerOutput { mut engine, mut sink } = handle.join().map_err(|_| {
            error!("Encoder worker panicked");
            EncoderError::WorkerPanicked
        })?;

        let unloaded = engine.shutdown();
        let flushed = sink.flush();
        drop(sink);

        unloaded?;
        flushed?;

        let stats = self.counters.snapshot();
        info!(
            "Encoder pipeline stopped: {} frames queued, {} dropped, {} bytes written",
            stats.frames_queued, stats.frames_dropped, stats.bytes_written
        );
        Ok(stats)
    }
}

/// Zero the bytes between the end of each row's pixels and the next row
///
/// Pool buffers are reused, and [`EncoderPipeline::submit`] copies caller
/// padding verbatim.
fn clear_row_padding(data: &mut [u8], stride: usize, row_bytes: usize) {
    if stride == row_bytes {
        return;
    }
    for row in data.chunks_exact_mut(stride) {
        row[row_bytes..].fill(0);
    }
}

impl Drop for EncoderPipeline {
    fn drop(&mut self) {
        if self.worker.is_some() {
            if let Err(e) = self.shutdown() {
                error!("Encoder pipeline shutdown failed: {}", e);
            }
        }
    }
}

impl std::fmt::Debug for EncoderPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EncoderPipeline")
            .field("settings", &self.settings)
            .field("worker_state", &self.state.get())
            .field("queued", &self.queue.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, Instant};

    use parking_lot::Mutex;
    use pano_projection::{Frame, PixelFormat};

    use super::*;
    use crate::component::{Component, ComponentState};
    use crate::config::Codec;
    use crate::engine::RawEngine;

    /// In-memory sink readable after the pipeline stops
    #[derive(Clone, Default)]
    struct SharedSink(Arc<Mutex<Vec<u8>>>);

    impl Write for SharedSink {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    /// Raw engine that takes `delay` to accept each frame
    struct ThrottledEngine {
        inner: RawEngine,
        delay: Duration,
    }

    impl ThrottledEngine {
        fn boxed(delay: Duration) -> Box<dyn CompressionEngine> {
            Box::new(Self {
                inner: RawEngine::new(),
                delay,
            })
        }
    }

    impl CompressionEngine for ThrottledEngine {
        fn name(&self) -> &'static str {
            "throttled"
        }
        fn component(&self) -> &Component {
            self.inner.component()
        }
        fn component_mut(&mut self) -> &mut Component {
            self.inner.component_mut()
        }
        fn configure(&mut self, settings: &PortSettings) -> Result<()> {
            self.inner.configure(settings)
        }
        fn empty_this_buffer(&mut self, payload: &[u8], timestamp_ms: u64) -> Result<()> {
            std::thread::sleep(self.delay);
            self.inner.empty_this_buffer(payload, timestamp_ms)
        }
        fn fill_this_buffer(&mut self, out: &mut OutputBuffer) -> Result<()> {
            self.inner.fill_this_buffer(out)
        }
    }

    /// Raw engine whose rate control skips every second frame
    ///
    /// A skipped frame completes with an empty segment.
    struct SkippingEngine {
        inner: RawEngine,
        submissions: u64,
        skipped: Option<u64>,
    }

    impl CompressionEngine for SkippingEngine {
        fn name(&self) -> &'static str {
            "skipping"
        }
        fn component(&self) -> &Component {
            self.inner.component()
        }
        fn component_mut(&mut self) -> &mut Component {
            self.inner.component_mut()
        }
        fn configure(&mut self, settings: &PortSettings) -> Result<()> {
            self.inner.configure(settings)
        }
        fn empty_this_buffer(&mut self, payload: &[u8], timestamp_ms: u64) -> Result<()> {
            self.submissions += 1;
            if self.submissions % 2 == 0 {
                self.skipped = Some(timestamp_ms);
                return Ok(());
            }
            self.inner.empty_this_buffer(payload, timestamp_ms)
        }
        fn fill_this_buffer(&mut self, out: &mut OutputBuffer) -> Result<()> {
            match self.skipped.take() {
                Some(timestamp_ms) => {
                    out.fill_from(&[], timestamp_ms, true);
                    Ok(())
                }
                None => self.inner.fill_this_buffer(out),
            }
        }
    }

    fn solid(width: u32, height: u32, value: u8) -> Frame {
        let data = vec![value; (width * height * 3) as usize];
        Frame::from_packed(width, height, PixelFormat::Rgb24, data).expect("valid frame")
    }

    fn small_config(buffers: usize) -> EncoderConfig {
        EncoderConfig::builder()
            .size(32, 8)
            .input_buffer_count(buffers)
            .output_buffer_size(100)
            .build()
    }

    #[test]
    fn test_frames_written_in_submission_order() {
        let sink = SharedSink::default();
        let pipeline = EncoderPipeline::start(sink.clone(), small_config(8)).expect("start");
        let frame_bytes = pipeline.settings().frame_bytes();

        for value in 1..=5u8 {
            let buffer = pipeline.try_acquire_input_buffer().expect("free buffer");
            pipeline
                .submit(buffer, &vec![value; frame_bytes])
                .expect("submit");
        }
        let stats = pipeline.stop().expect("stop");

        let written = sink.0.lock().clone();
        assert_eq!(written.len(), 5 * frame_bytes);
        for (index, chunk) in written.chunks_exact(frame_bytes).enumerate() {
            assert!(chunk.iter().all(|&b| b == index as u8 + 1));
        }
        assert_eq!(stats.frames_queued, 5);
        assert_eq!(stats.bytes_written, 5 * frame_bytes as u64);
        // 768 byte frames split into 100 byte segments
        assert_eq!(stats.segments_written, 5 * 8);
    }

    #[test]
    fn test_exhausted_pool_drops_without_blocking() {
        let config = small_config(2);
        let engine = ThrottledEngine::boxed(Duration::from_millis(50));
        let pipeline = EncoderPipeline::start_with_engine(SharedSink::default(), config, engine).expect("start");
        let frame = solid(32, 8, 7);

        let mut dropped = 0;
        for _ in 0..10 {
            let started = Instant::now();
            let outcome = pipeline.encode_frame(&frame.view()).expect("encode_frame");
            assert!(started.elapsed() < Duration::from_millis(25));
            if outcome.is_dropped() {
                dropped += 1;
            }
        }

        assert!(dropped > 0);
        let stats = pipeline.stop().expect("stop");
        assert_eq!(stats.frames_dropped, dropped);
        assert_eq!(stats.frames_queued + stats.frames_dropped, 10);
    }

    #[test]
    fn test_stop_drains_queued_frames() {
        let sink = SharedSink::default();
        let engine = ThrottledEngine::boxed(Duration::from_millis(10));
        let pipeline = EncoderPipeline::start_with_engine(sink.clone(), small_config(6), engine).expect("start");
        let frame_bytes = pipeline.settings().frame_bytes();

        for value in 0..6u8 {
            let outcome = pipeline.encode_frame(&solid(32, 8, value).view()).expect("encode_frame");
            assert!(!outcome.is_dropped());
        }
        assert_ne!(pipeline.worker_state(), WorkerState::Stopped);

        let stats = pipeline.stop().expect("stop");
        assert_eq!(stats.frames_queued, 6);
        assert_eq!(sink.0.lock().len(), 6 * frame_bytes);
    }

    #[test]
    fn test_drop_drains_like_stop() {
        let sink = SharedSink::default();
        {
            let engine = ThrottledEngine::boxed(Duration::from_millis(5));
            let pipeline = EncoderPipeline::start_with_engine(sink.clone(), small_config(3), engine).expect("start");
            for value in 0..3u8 {
                pipeline.encode_frame(&solid(32, 8, value).view()).expect("encode_frame");
            }
        }
        assert_eq!(sink.0.lock().len(), 3 * 96 * 8);
    }

    #[test]
    fn test_timestamps_follow_submission_order() {
        let pipeline = EncoderPipeline::start(SharedSink::default(), small_config(6)).expect("start");
        let frame = solid(32, 8, 1);

        let mut last = 0;
        for _ in 0..6 {
            std::thread::sleep(Duration::from_millis(2));
            if let SubmitOutcome::Queued { timestamp_ms } = pipeline.encode_frame(&frame.view()).expect("encode") {
                assert!(timestamp_ms >= last);
                last = timestamp_ms;
            }
        }
        pipeline.stop().expect("stop");
    }

    #[test]
    fn test_skipped_frames_are_not_retrieval_failures() {
        let sink = SharedSink::default();
        let engine = Box::new(SkippingEngine {
            inner: RawEngine::new(),
            submissions: 0,
            skipped: None,
        });
        let config = EncoderConfig {
            max_empty_polls: 2,
            ..small_config(6)
        };
        let pipeline = EncoderPipeline::start_with_engine(sink.clone(), config, engine).expect("start");
        let frame_bytes = pipeline.settings().frame_bytes();

        for value in 1..=4u8 {
            let outcome = pipeline.encode_frame(&solid(32, 8, value).view()).expect("encode_frame");
            assert!(!outcome.is_dropped());
        }
        let stats = pipeline.stop().expect("stop");

        assert_eq!(stats.frames_queued, 4);
        assert_eq!(stats.retrieval_failures, 0);
        assert_eq!(stats.bytes_written, 2 * frame_bytes as u64);

        let written = sink.0.lock().clone();
        assert!(written[..frame_bytes].iter().all(|&b| b == 1));
        assert!(written[frame_bytes..].iter().all(|&b| b == 3));
    }

    #[test]
    fn test_recycled_buffer_padding_is_cleared() {
        let sink = SharedSink::default();
        let config = EncoderConfig::builder()
            .size(20, 8)
            .input_buffer_count(1)
            .output_buffer_size(100)
            .build();
        let pipeline = EncoderPipeline::start(sink.clone(), config).expect("start");
        let stride = pipeline.settings().stride;
        let frame_bytes = pipeline.settings().frame_bytes();
        assert_eq!(stride, 96);

        // Caller bytes fill the padding of the only buffer
        let buffer = pipeline.try_acquire_input_buffer().expect("buffer");
        pipeline.submit(buffer, &vec![0xAA; frame_bytes]).expect("submit");

        let deadline = Instant::now() + Duration::from_secs(5);
        while pipeline.pool.available() == 0 {
            assert!(Instant::now() < deadline, "buffer never returned");
            std::thread::sleep(Duration::from_millis(1));
        }

        let outcome = pipeline.encode_frame(&solid(20, 8, 5).view()).expect("encode_frame");
        assert!(!outcome.is_dropped());
        pipeline.stop().expect("stop");

        let written = sink.0.lock().clone();
        assert_eq!(written.len(), 2 * frame_bytes);
        for row in written[frame_bytes..].chunks_exact(stride) {
            assert!(row[..60].iter().all(|&b| b == 5));
            assert!(row[60..].iter().all(|&b| b == 0));
        }
    }

    #[test]
    fn test_contract_violations() {
        let pipeline = EncoderPipeline::start(SharedSink::default(), small_config(2)).expect("start");

        let buffer = pipeline.try_acquire_input_buffer().expect("buffer");
        let err = pipeline.submit(buffer, &[0; 10]).expect_err("short payload");
        assert!(err.is_contract_violation());

        let err = pipeline
            .encode_frame(&solid(16, 8, 0).view())
            .expect_err("wrong dimensions");
        assert!(matches!(err, EncoderError::DimensionMismatch { actual_width: 16, .. }));

        // The rejected buffer went back to the pool
        assert_eq!(pipeline.pool.available(), 2);
        let stats = pipeline.stop().expect("stop");
        assert_eq!(stats.frames_queued, 0);
    }

    #[test]
    fn test_start_failures() {
        let invalid = EncoderConfig::builder().bitrate_kbps(0).build();
        let err = EncoderPipeline::start(SharedSink::default(), invalid).expect_err("zero bitrate");
        assert!(matches!(err, EncoderError::InvalidConfig(_)));

        let mut started = RawEngine::new();
        started
            .configure(&PortSettings::derive(&small_config(1)))
            .expect("configure");
        started.start().expect("start");
        assert_eq!(started.component().state(), ComponentState::Executing);
        let err = EncoderPipeline::start_with_engine(SharedSink::default(), small_config(1), Box::new(started))
            .expect_err("engine already executing");
        assert!(matches!(err, EncoderError::InvalidTransition { .. }));

        if !cfg!(feature = "h264") {
            let h264 = EncoderConfig::builder().codec(Codec::H264).build();
            let err = EncoderPipeline::start(SharedSink::default(), h264).expect_err("h264 disabled");
            assert!(matches!(err, EncoderError::EngineUnavailable(_)));
        }
    }

    #[test]
    fn test_recording_scenario() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("capture.raw");
        let config = EncoderConfig::builder()
            .size(1440, 720)
            .bitrate_kbps(1000)
            .input_buffer_count(6)
            .build();
        let engine = ThrottledEngine::boxed(Duration::from_millis(30));
        let sink = BufWriter::new(File::create(&path).expect("create output"));
        let pipeline = EncoderPipeline::start_with_engine(sink, config, engine).expect("start");
        let frame_bytes = pipeline.settings().frame_bytes();

        let mut last_size = 0;
        let mut queued_values = Vec::new();
        for value in 0..30u8 {
            let frame = solid(1440, 720, value);
            if let SubmitOutcome::Queued { .. } = pipeline.encode_frame(&frame.view()).expect("encode_frame") {
                queued_values.push(value);
            }
            let size = std::fs::metadata(&path).expect("metadata").len();
            assert!(size >= last_size);
            last_size = size;
            std::thread::sleep(Duration::from_millis(2));
        }

        let stats = pipeline.stop().expect("stop");
        assert!(stats.frames_dropped > 0);
        assert_eq!(stats.frames_queued as usize, queued_values.len());

        let written = std::fs::read(&path).expect("read output");
        assert!(!written.is_empty());
        assert_eq!(written.len(), queued_values.len() * frame_bytes);
        for (chunk, value) in written.chunks_exact(frame_bytes).zip(&queued_values) {
            assert!(chunk.iter().all(|b| b == value));
        }
    }
}
