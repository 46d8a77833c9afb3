//! Recording session
//!
//! A [`Recorder`] owns one projector and at most one active encoder
//! pipeline. Frames pass through the projector on the caller's thread and
//! are handed to the pipeline without blocking; when the encoder is behind
//! the frame is dropped and reported as such.

use std::path::Path;

use pano_encoder::{save_jpeg, EncoderPipeline, EncoderStats, SubmitOutcome};
use pano_projection::{FrameView, ProjectionEngine, ProjectionError, Reproject, Rotation};
use tracing::{debug, error, info, warn};

use crate::config::RecorderConfig;
use crate::error::{RecorderError, Result};

/// What happened to a frame offered with [`Recorder::add_frame`]
pub type FrameOutcome = SubmitOutcome;

/// One camera's recording session
pub struct Recorder<P: Reproject = ProjectionEngine> {
    config: RecorderConfig,
    projector: P,
    session: Option<EncoderPipeline>,
}

impl Recorder<ProjectionEngine> {
    /// Create a recorder with a GPU projection engine
    pub fn new(config: RecorderConfig) -> Result<Self> {
        config
            .validate()
            .map_err(|issues| RecorderError::invalid_argument(issues.join("; ")))?;
        let projector = ProjectionEngine::new(config.projection.clone())?;
        Ok(Self::with_projector(config, projector))
    }
}

impl<P: Reproject> Recorder<P> {
    /// Create a recorder around an existing projector
    pub fn with_projector(config: RecorderConfig, projector: P) -> Self {
        Self {
            config,
            projector,
            session: None,
        }
    }

    /// Active configuration
    pub fn config(&self) -> &RecorderConfig {
        &self.config
    }

    /// The projector
    pub fn projector(&self) -> &P {
        &self.projector
    }

    /// The projector, mutably
    pub fn projector_mut(&mut self) -> &mut P {
        &mut self.projector
    }

    /// Whether a recording is active
    pub fn is_recording(&self) -> bool {
        self.session.is_some()
    }

    /// Statistics of the active recording
    pub fn stats(&self) -> Option<EncoderStats> {
        self.session.as_ref().map(EncoderPipeline::stats)
    }

    /// Start recording to `path` at `bitrate_kbps`
    pub fn start_record(&mut self, path: impl AsRef<Path>, bitrate_kbps: u32) -> Result<()> {
        if self.session.is_some() {
            return Err(RecorderError::AlreadyRecording);
        }

        let (width, height) = self.projector.output_size();
        let encoder = pano_encoder::EncoderConfig {
            width,
            height,
            ..self.config.encoder_for(bitrate_kbps)
        };

        let pipeline = EncoderPipeline::start_file(path.as_ref(), encoder)?;
        info!("Recording started: {} at {} kbps", path.as_ref().display(), bitrate_kbps);
        self.session = Some(pipeline);
        Ok(())
    }

    /// Drain and stop the active recording
    pub fn stop_record(&mut self) -> Result<EncoderStats> {
        let pipeline = self.session.take().ok_or(RecorderError::NotRecording)?;
        let stats = pipeline.stop()?;
        info!(
            "Recording stopped: {} frames, {} dropped, {} bytes",
            stats.frames_queued, stats.frames_dropped, stats.bytes_written
        );
        Ok(stats)
    }

    /// Set the rig rotation in degrees
    pub fn set_rotation(&self, x_deg: f32, y_deg: f32, z_deg: f32) {
        self.projector.set_rotation(Rotation::new(x_deg, y_deg, z_deg));
    }

    /// Reproject one camera frame and queue it for encoding
    ///
    /// A fatal projection or encoder error ends the recording: the pipeline
    /// is drained and closed before the error is returned.
    pub fn add_frame(&mut self, width: u32, height: u32, stride: usize, data: &[u8]) -> Result<FrameOutcome> {
        let pipeline = self.session.as_ref().ok_or(RecorderError::NotRecording)?;
        let result = camera_frame(&self.projector, &self.config, width, height, stride, data).and_then(|input| {
            let panorama = self.projector.transform(&input)?;
            Ok(pipeline.encode_frame(&panorama.view())?)
        });

        match result {
            Ok(outcome) => {
                if outcome.is_dropped() {
                    debug!("Frame dropped, encoder busy");
                }
                Ok(outcome)
            }
            Err(e) if e.is_fatal() => {
                self.abort_session(&e);
                Err(e)
            }
            Err(e) => Err(e),
        }
    }

    /// End the active recording after a fatal error
    fn abort_session(&mut self, cause: &RecorderError) {
        error!("Recording aborted: {}", cause);
        if let Some(pipeline) = self.session.take() {
            match pipeline.stop() {
                Ok(stats) => info!(
                    "Aborted recording closed: {} frames, {} bytes",
                    stats.frames_queued, stats.bytes_written
                ),
                Err(e) => warn!("Aborted recording did not stop cleanly: {}", e),
            }
        }
    }

    /// Reproject one camera frame and save it as a JPEG at `path`
    ///
    /// Works with or without an active recording. The capture must have the
    /// configured source size.
    pub fn save_still_as_equirectangular(
        &mut self,
        width: u32,
        height: u32,
        stride: usize,
        data: &[u8],
        path: impl AsRef<Path>,
    ) -> Result<()> {
        let input = camera_frame(&self.projector, &self.config, width, height, stride, data)?;
        let panorama = self.projector.transform(&input)?;
        save_jpeg(&panorama.view(), self.config.jpeg_quality, path)?;
        Ok(())
    }
}

/// Wrap caller bytes as a frame of the projector's source size
fn camera_frame<'a, P: Reproject>(
    projector: &P,
    config: &RecorderConfig,
    width: u32,
    height: u32,
    stride: usize,
    data: &'a [u8],
) -> Result<FrameView<'a>> {
    let (expected_width, expected_height) = projector.source_size();
    if (width, height) != (expected_width, expected_height) {
        warn!(
            "Rejecting {}x{} capture, source is {}x{}",
            width, height, expected_width, expected_height
        );
        return Err(ProjectionError::DimensionMismatch {
            expected_width,
            expected_height,
            actual_width: width,
            actual_height: height,
        }
        .into());
    }
    Ok(FrameView::new(width, height, stride, config.projection.format, data)?)
}

impl<P: Reproject> Drop for Recorder<P> {
    fn drop(&mut self) {
        if self.session.is_some() {
            if let Err(e) = self.stop_record() {
                warn!("Recording did not stop cleanly: {}", e);
            }
        }
    }
}

impl<P: Reproject> std::fmt::Debug for Recorder<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Recorder")
            .field("config", &self.config)
            .field("recording", &self.session.is_some())
            .finish_non_exhaustive()
    }
}
