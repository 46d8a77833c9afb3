//! Integer-status control surface
//!
//! Flat entry points for callers that cannot handle Rust errors (a device
//! daemon, an FFI shim). Every call returns `0` on success, `1` for a dropped
//! frame, or a negative code from [`RecorderError::status_code`]. Errors are
//! logged before they are flattened.

use std::path::Path;

use pano_projection::{ProjectionEngine, Reproject};
use tracing::error;

use crate::config::RecorderConfig;
use crate::error::{RecorderError, Result, STATUS_DROPPED, STATUS_OK};
use crate::recorder::{FrameOutcome, Recorder};

/// Status-code wrapper around a [`Recorder`]
#[derive(Debug)]
pub struct ControlSurface<P: Reproject = ProjectionEngine> {
    recorder: Recorder<P>,
}

impl ControlSurface<ProjectionEngine> {
    /// Create a control surface with a GPU projection engine
    pub fn new(config: RecorderConfig) -> Result<Self> {
        Ok(Self::from_recorder(Recorder::new(config)?))
    }
}

impl<P: Reproject> ControlSurface<P> {
    /// Wrap an existing recorder
    pub fn from_recorder(recorder: Recorder<P>) -> Self {
        Self { recorder }
    }

    /// The wrapped recorder
    pub fn recorder(&self) -> &Recorder<P> {
        &self.recorder
    }

    /// Start recording to `path`
    pub fn start_record(&mut self, path: impl AsRef<Path>, bitrate_kbps: i32) -> i32 {
        let result = non_negative("bitrate_kbps", bitrate_kbps)
            .and_then(|kbps| self.recorder.start_record(path, kbps));
        status("StartRecord", result)
    }

    /// Stop the active recording
    pub fn stop_record(&mut self) -> i32 {
        status("StopRecord", self.recorder.stop_record().map(|_| ()))
    }

    /// Set the rig rotation in degrees
    pub fn set_rotation(&self, x_deg: f32, y_deg: f32, z_deg: f32) -> i32 {
        self.recorder.set_rotation(x_deg, y_deg, z_deg);
        STATUS_OK
    }

    /// Reproject and queue one frame; `1` means it was dropped
    pub fn add_frame(&mut self, width: i32, height: i32, stride: i32, data: &[u8]) -> i32 {
        let result = frame_geometry(width, height, stride)
            .and_then(|(w, h, s)| self.recorder.add_frame(w, h, s, data));
        match result {
            Ok(FrameOutcome::Queued { .. }) => STATUS_OK,
            Ok(FrameOutcome::Dropped) => STATUS_DROPPED,
            Err(e) => status("AddFrame", Err(e)),
        }
    }

    /// Reproject one frame and save it as a JPEG
    pub fn save_still_as_equirectangular(
        &mut self,
        width: i32,
        height: i32,
        stride: i32,
        data: &[u8],
        path: impl AsRef<Path>,
    ) -> i32 {
        let result = frame_geometry(width, height, stride)
            .and_then(|(w, h, s)| self.recorder.save_still_as_equirectangular(w, h, s, data, path));
        status("SaveStillAsEquirectangular", result)
    }
}

fn status(operation: &str, result: Result<()>) -> i32 {
    match result {
        Ok(()) => STATUS_OK,
        Err(e) => {
            error!("{} failed: {}", operation, e);
            e.status_code()
        }
    }
}

fn non_negative(name: &str, value: i32) -> Result<u32> {
    u32::try_from(value).map_err(|_| RecorderError::invalid_argument(format!("{} must not be negative, got {}", name, value)))
}

fn frame_geometry(width: i32, height: i32, stride: i32) -> Result<(u32, u32, usize)> {
    Ok((
        non_negative("width", width)?,
        non_negative("height", height)?,
        non_negative("stride", stride)? as usize,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::stub_recorder;

    #[test]
    fn test_status_codes() {
        let dir = tempfile::tempdir().expect("tempdir");
        let (recorder, camera) = stub_recorder();
        let mut control = ControlSurface::from_recorder(recorder);
        let (w, h, s) = (camera.width as i32, camera.height as i32, camera.stride as i32);

        assert_eq!(control.add_frame(w, h, s, &camera.data), -1);
        assert_eq!(control.stop_record(), -1);

        assert_eq!(control.start_record(dir.path().join("out.raw"), -5), -3);
        assert_eq!(control.start_record(dir.path().join("out.raw"), 1000), 0);
        assert_eq!(control.start_record(dir.path().join("again.raw"), 1000), -2);

        assert_eq!(control.set_rotation(0.0, 90.0, 0.0), 0);
        assert_eq!(control.add_frame(w, h, s, &camera.data), 0);
        assert_eq!(control.add_frame(-1, h, s, &camera.data), -3);
        assert_eq!(control.add_frame(w, h + 4, s, &camera.data), -3);

        assert_eq!(control.stop_record(), 0);
        assert!(!control.recorder().is_recording());
    }

    #[test]
    fn test_fatal_status_ends_recording() {
        let dir = tempfile::tempdir().expect("tempdir");
        let (mut recorder, camera) = stub_recorder();
        recorder.start_record(dir.path().join("out.raw"), 1000).expect("start");
        recorder.projector_mut().fail_next();
        let mut control = ControlSurface::from_recorder(recorder);
        let (w, h, s) = (camera.width as i32, camera.height as i32, camera.stride as i32);

        assert_eq!(control.add_frame(w, h, s, &camera.data), -4);
        assert!(!control.recorder().is_recording());
        assert_eq!(control.add_frame(w, h, s, &camera.data), -1);
        assert_eq!(control.stop_record(), -1);
    }

    #[test]
    fn test_save_still_status() {
        let dir = tempfile::tempdir().expect("tempdir");
        let (recorder, camera) = stub_recorder();
        let mut control = ControlSurface::from_recorder(recorder);
        let (w, h, s) = (camera.width as i32, camera.height as i32, camera.stride as i32);

        assert_eq!(
            control.save_still_as_equirectangular(w, h, s, &camera.data, dir.path().join("still.jpg")),
            0
        );
        assert_eq!(
            control.save_still_as_equirectangular(w, h, s, &camera.data, dir.path().join("no/such/dir.jpg")),
            -6
        );
    }
}
