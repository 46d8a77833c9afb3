//! CPU stand-in for the GPU projector, so recorder tests run without an adapter

use pano_projection::{Frame, FrameView, PixelFormat, ProjectionError, Reproject, Result, Rotation, RotationHandle};

use crate::{Recorder, RecorderConfig};

/// Nearest-neighbour rescale of the source into the output size
#[derive(Debug)]
pub(crate) struct CpuProjector {
    source: (u32, u32),
    output: Frame,
    rotation: RotationHandle,
    frames: u64,
    fail_next: bool,
}

impl CpuProjector {
    pub(crate) fn new(source: (u32, u32), output: (u32, u32)) -> Self {
        Self {
            source,
            output: Frame::new(output.0, output.1, PixelFormat::Rgb24),
            rotation: RotationHandle::default(),
            frames: 0,
            fail_next: false,
        }
    }

    pub(crate) fn frames(&self) -> u64 {
        self.frames
    }

    /// Make the next transform fail as if the GPU adapter had gone away
    pub(crate) fn fail_next(&mut self) {
        self.fail_next = true;
    }

    pub(crate) fn rotation(&self) -> Rotation {
        self.rotation.get()
    }
}

impl Reproject for CpuProjector {
    fn source_size(&self) -> (u32, u32) {
        self.source
    }

    fn output_size(&self) -> (u32, u32) {
        (self.output.width, self.output.height)
    }

    fn set_rotation(&self, rotation: Rotation) {
        self.rotation.set(rotation);
    }

    fn transform(&mut self, input: &FrameView<'_>) -> Result<&Frame> {
        if std::mem::take(&mut self.fail_next) {
            return Err(ProjectionError::AdapterUnavailable);
        }
        input.validate()?;
        let (width, height) = (self.output.width, self.output.height);
        for y in 0..height {
            let row = input.row(y * input.height / height);
            for x in 0..width {
                let src = (x * input.width / width) as usize * 3;
                let dst = y as usize * self.output.stride + x as usize * 3;
                self.output.data[dst..dst + 3].copy_from_slice(&row[src..src + 3]);
            }
        }
        self.frames += 1;
        Ok(&self.output)
    }
}

/// Recorder over a 32x32 → 64x32 CPU projector, plus a matching camera frame
pub(crate) fn stub_recorder() -> (Recorder<CpuProjector>, Frame) {
    let projector = CpuProjector::new((32, 32), (64, 32));
    let data = (0..32 * 32 * 3).map(|i| (i % 251) as u8).collect();
    let camera = Frame::from_packed(32, 32, PixelFormat::Rgb24, data).expect("camera frame");
    (Recorder::with_projector(RecorderConfig::default(), projector), camera)
}
