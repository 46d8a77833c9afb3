//! Projection engine
//!
//! Owns the GPU context, both textures and the shader program. Each
//! [`transform`](ProjectionEngine::transform) uploads a camera frame, builds
//! the rotation matrix from the current [`RotationHandle`] value, draws the
//! full-screen quad and reads the result back synchronously.
//!
//! The engine is confined to the thread that calls it; only the rotation
//! handle is meant to be shared. After a GPU failure the engine refuses
//! further transforms and must be rebuilt.

use tracing::{debug, error, info};

use crate::config::ProjectionConfig;
use crate::error::{ProjectionError, Result};
use crate::frame::{Frame, FrameView};
use crate::gpu::GpuContext;
use crate::program::{LensParams, ProjectionProgram};
use crate::rotation::{Rotation, RotationHandle};
use crate::texture::{check_alignment, RenderTarget, SourceTexture};

/// Something that turns a camera frame into an equirectangular frame
///
/// [`ProjectionEngine`] is the GPU implementation. Consumers that only need
/// the reprojection contract (recorders, tests) take this trait instead.
pub trait Reproject {
    /// Configured `(width, height)` of input frames
    fn source_size(&self) -> (u32, u32);

    /// Configured `(width, height)` of output frames
    fn output_size(&self) -> (u32, u32);

    /// Overwrite the rotation applied to subsequent transforms
    fn set_rotation(&self, rotation: Rotation);

    /// Reproject `input`; the returned frame is reused by the next call
    fn transform(&mut self, input: &FrameView<'_>) -> Result<&Frame>;
}

/// GPU fisheye to equirectangular reprojection
pub struct ProjectionEngine {
    config: ProjectionConfig,
    lens: LensParams,
    rotation: RotationHandle,
    program: ProjectionProgram,
    target: RenderTarget,
    source: SourceTexture,
    gpu: GpuContext,
    output: Frame,
    frames_transformed: u64,
    failed: bool,
}

impl ProjectionEngine {
    /// Create the GPU context, textures and shader program
    ///
    /// Construction is all-or-nothing: on error every resource created so far
    /// has already been released.
    pub fn new(config: ProjectionConfig) -> Result<Self> {
        config
            .validate()
            .map_err(|issues| ProjectionError::InvalidConfig(issues.join("; ")))?;
        check_alignment("source", config.source_width, config.source_height)?;
        check_alignment("destination", config.width, config.height)?;

        let gpu = GpuContext::new(config.low_power)?;
        let source = SourceTexture::new(&gpu, config.source_width, config.source_height)?;
        let target = RenderTarget::new(&gpu, config.width, config.height)?;
        let program = ProjectionProgram::new(&gpu, &source, &target)?;

        let lens = LensParams::new(config.fov_degrees, config.source_width, config.source_height);
        let output = Frame::new(config.width, config.height, config.format);

        info!(
            "Projection engine ready: {}x{} -> {}x{} (fov {}°, {})",
            config.source_width,
            config.source_height,
            config.width,
            config.height,
            config.fov_degrees,
            gpu.adapter_info().name
        );

        Ok(Self {
            config,
            lens,
            rotation: RotationHandle::default(),
            program,
            target,
            source,
            gpu,
            output,
            frames_transformed: 0,
            failed: false,
        })
    }

    /// Shorthand for a default configuration with the given sizes
    pub fn configure(width: u32, height: u32, source_width: u32, source_height: u32) -> Result<Self> {
        Self::new(
            ProjectionConfig::builder()
                .output_size(width, height)
                .source_size(source_width, source_height)
                .build(),
        )
    }

    /// Active configuration
    pub fn config(&self) -> &ProjectionConfig {
        &self.config
    }

    /// Set the rotation in degrees
    pub fn set_rotation(&self, x_deg: f32, y_deg: f32, z_deg: f32) {
        self.rotation.set_degrees(x_deg, y_deg, z_deg);
    }

    /// Shareable handle to the rotation state
    ///
    /// Writes through the handle are picked up by the next transform.
    pub fn rotation_handle(&self) -> RotationHandle {
        self.rotation.clone()
    }

    /// Number of frames transformed so far
    pub fn frames_transformed(&self) -> u64 {
        self.frames_transformed
    }

    /// Reproject `input` into the engine's output frame
    ///
    /// Blocks until the GPU has finished. The returned frame is overwritten
    /// by the next call.
    pub fn transform(&mut self, input: &FrameView<'_>) -> Result<&Frame> {
        self.ensure_usable()?;
        let result = self
            .render(input)
            .and_then(|()| self.target.read_into(&self.gpu, &mut self.output));
        self.complete_frame(result)?;
        Ok(&self.output)
    }

    /// Reproject `input` directly into a caller-owned frame
    pub fn transform_into(&mut self, input: &FrameView<'_>, out: &mut Frame) -> Result<()> {
        if out.format != self.config.format {
            return Err(ProjectionError::invalid_frame(format!(
                "output format {:?} does not match configured {:?}",
                out.format, self.config.format
            )));
        }
        self.ensure_usable()?;
        let result = self.render(input).and_then(|()| self.target.read_into(&self.gpu, out));
        self.complete_frame(result)
    }

    /// Whether an earlier GPU failure made the engine unusable
    pub fn is_failed(&self) -> bool {
        self.failed
    }

    fn ensure_usable(&self) -> Result<()> {
        if self.failed {
            return Err(ProjectionError::gpu(
                "transform",
                "engine unusable after an earlier GPU failure",
            ));
        }
        Ok(())
    }

    /// Count a frame once it has been read back; fatal errors disable the engine
    fn complete_frame(&mut self, result: Result<()>) -> Result<()> {
        match &result {
            Ok(()) => {
                self.frames_transformed += 1;
                debug!("Frame {} transformed", self.frames_transformed);
            }
            Err(e) if e.is_fatal() => {
                error!("Projection engine failed: {}", e);
                self.failed = true;
            }
            Err(_) => {}
        }
        result
    }

    fn render(&mut self, input: &FrameView<'_>) -> Result<()> {
        if input.format != self.config.format {
            return Err(ProjectionError::invalid_frame(format!(
                "input format {:?} does not match configured {:?}",
                input.format, self.config.format
            )));
        }

        self.source.upload(&self.gpu, input)?;

        let matrix = self.rotation.get().matrix();
        self.program.write_uniforms(&self.gpu, &matrix, &self.lens)?;

        let (program, target) = (&self.program, &self.target);
        self.gpu.checked("draw", |device, queue| {
            let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("equirect_frame"),
            });
            program.encode_draw(&mut encoder, target);
            target.encode_readback(&mut encoder);
            queue.submit(std::iter::once(encoder.finish()));
        })?;

        Ok(())
    }
}

impl Reproject for ProjectionEngine {
    fn source_size(&self) -> (u32, u32) {
        (self.config.source_width, self.config.source_height)
    }

    fn output_size(&self) -> (u32, u32) {
        (self.config.width, self.config.height)
    }

    fn set_rotation(&self, rotation: Rotation) {
        self.rotation.set(rotation);
    }

    fn transform(&mut self, input: &FrameView<'_>) -> Result<&Frame> {
        ProjectionEngine::transform(self, input)
    }
}

impl std::fmt::Debug for ProjectionEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProjectionEngine")
            .field("config", &self.config)
            .field("gpu", &self.gpu)
            .field("frames_transformed", &self.frames_transformed)
            .field("failed", &self.failed)
            .finish_non_exhaustive()
    }
}
