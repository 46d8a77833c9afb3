//! GPU textures
//!
//! Exactly two textures exist per engine: the source texture the camera frame
//! is uploaded into, and the render target the equirectangular image is drawn
//! into. Both are created once and live as long as the engine.
//!
//! wgpu has no 3-byte texel format, so frames are widened to RGBA on upload
//! and narrowed back on read-back. The scratch buffers for both directions
//! are allocated once and reused.

use tracing::debug;

use crate::config::TEXTURE_ALIGNMENT;
use crate::error::{ProjectionError, Result};
use crate::frame::{Frame, FrameView};
use crate::gpu::GpuContext;

const TEXEL_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;
const TEXEL_BYTES: u32 = 4;

/// Reject dimensions that are not a multiple of [`TEXTURE_ALIGNMENT`]
pub fn check_alignment(what: &'static str, width: u32, height: u32) -> Result<()> {
    if width == 0 || height == 0 || width % TEXTURE_ALIGNMENT != 0 || height % TEXTURE_ALIGNMENT != 0 {
        return Err(ProjectionError::UnalignedDimensions {
            what,
            width,
            height,
            alignment: TEXTURE_ALIGNMENT,
        });
    }
    Ok(())
}

fn check_limits(gpu: &GpuContext, what: &str, width: u32, height: u32) -> Result<()> {
    let max = gpu.max_texture_dimension();
    if width > max || height > max {
        return Err(ProjectionError::TextureAllocation(format!(
            "{} texture {}x{} exceeds device limit {}",
            what, width, height, max
        )));
    }
    Ok(())
}

/// Texture the camera frame is uploaded into
pub struct SourceTexture {
    texture: wgpu::Texture,
    view: wgpu::TextureView,
    width: u32,
    height: u32,
    rgba: Vec<u8>,
}

impl SourceTexture {
    /// Allocate the source texture
    pub fn new(gpu: &GpuContext, width: u32, height: u32) -> Result<Self> {
        check_alignment("source", width, height)?;
        check_limits(gpu, "source", width, height)?;

        let texture = gpu
            .checked("create source texture", |device, _| {
                device.create_texture(&wgpu::TextureDescriptor {
                    label: Some("source_texture"),
                    size: extent(width, height),
                    mip_level_count: 1,
                    sample_count: 1,
                    dimension: wgpu::TextureDimension::D2,
                    format: TEXEL_FORMAT,
                    usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
                    view_formats: &[],
                })
            })
            .map_err(|e| ProjectionError::TextureAllocation(e.to_string()))?;
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        debug!("Source texture allocated: {}x{}", width, height);

        Ok(Self {
            texture,
            view,
            width,
            height,
            rgba: vec![0; (width * height * TEXEL_BYTES) as usize],
        })
    }

    /// Texture width
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Texture height
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Sampling view
    pub fn view(&self) -> &wgpu::TextureView {
        &self.view
    }

    /// Replace the texture contents with `frame`
    ///
    /// The frame must have exactly the texture's dimensions.
    pub fn upload(&mut self, gpu: &GpuContext, frame: &FrameView<'_>) -> Result<()> {
        if frame.width != self.width || frame.height != self.height {
            return Err(ProjectionError::DimensionMismatch {
                expected_width: self.width,
                expected_height: self.height,
                actual_width: frame.width,
                actual_height: frame.height,
            });
        }
        frame.validate()?;

        let dst_row = (self.width * TEXEL_BYTES) as usize;
        for (row, dst) in frame.rows().zip(self.rgba.chunks_exact_mut(dst_row)) {
            for (px, out) in row.chunks_exact(3).zip(dst.chunks_exact_mut(4)) {
                out[..3].copy_from_slice(px);
                out[3] = u8::MAX;
            }
        }

        let (texture, rgba, width, height) = (&self.texture, &self.rgba, self.width, self.height);
        gpu.checked("upload source texture", |_, queue| {
            queue.write_texture(
                wgpu::TexelCopyTextureInfo {
                    texture,
                    mip_level: 0,
                    origin: wgpu::Origin3d::ZERO,
                    aspect: wgpu::TextureAspect::All,
                },
                rgba,
                wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(width * TEXEL_BYTES),
                    rows_per_image: Some(height),
                },
                extent(width, height),
            );
        })
    }
}

/// Render target the projection is drawn into, with its read-back buffer
pub struct RenderTarget {
    texture: wgpu::Texture,
    view: wgpu::TextureView,
    readback: wgpu::Buffer,
    padded_bytes_per_row: u32,
    width: u32,
    height: u32,
}

impl RenderTarget {
    /// Allocate the render target and read-back buffer
    pub fn new(gpu: &GpuContext, width: u32, height: u32) -> Result<Self> {
        check_alignment("destination", width, height)?;
        check_limits(gpu, "destination", width, height)?;

        let padded_bytes_per_row = padded_row_bytes(width);

        let (texture, readback) = gpu
            .checked("create render target", |device, _| {
                let texture = device.create_texture(&wgpu::TextureDescriptor {
                    label: Some("render_target"),
                    size: extent(width, height),
                    mip_level_count: 1,
                    sample_count: 1,
                    dimension: wgpu::TextureDimension::D2,
                    format: TEXEL_FORMAT,
                    usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
                    view_formats: &[],
                });
                let readback = device.create_buffer(&wgpu::BufferDescriptor {
                    label: Some("readback"),
                    size: u64::from(padded_bytes_per_row) * u64::from(height),
                    usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
                    mapped_at_creation: false,
                });
                (texture, readback)
            })
            .map_err(|e| ProjectionError::TextureAllocation(e.to_string()))?;
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        debug!(
            "Render target allocated: {}x{} (read-back row {} bytes)",
            width, height, padded_bytes_per_row
        );

        Ok(Self {
            texture,
            view,
            readback,
            padded_bytes_per_row,
            width,
            height,
        })
    }

    /// Texel format the pipeline must render
    pub fn format(&self) -> wgpu::TextureFormat {
        TEXEL_FORMAT
    }

    /// Attachment view
    pub fn view(&self) -> &wgpu::TextureView {
        &self.view
    }

    /// Record a copy of the rendered image into the read-back buffer
    pub fn encode_readback(&self, encoder: &mut wgpu::CommandEncoder) {
        encoder.copy_texture_to_buffer(
            wgpu::TexelCopyTextureInfo {
                texture: &self.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::TexelCopyBufferInfo {
                buffer: &self.readback,
                layout: wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(self.padded_bytes_per_row),
                    rows_per_image: Some(self.height),
                },
            },
            extent(self.width, self.height),
        );
    }

    /// Map the read-back buffer and narrow it into `out`
    ///
    /// Blocks until the GPU has finished all submitted work.
    pub fn read_into(&self, gpu: &GpuContext, out: &mut Frame) -> Result<()> {
        if out.width != self.width || out.height != self.height {
            return Err(ProjectionError::DimensionMismatch {
                expected_width: self.width,
                expected_height: self.height,
                actual_width: out.width,
                actual_height: out.height,
            });
        }

        let slice = self.readback.slice(..);
        let (tx, rx) = std::sync::mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = tx.send(result);
        });
        gpu.finish();

        rx.recv()
            .map_err(|_| ProjectionError::Readback("map callback was dropped".to_string()))?
            .map_err(|e| ProjectionError::Readback(e.to_string()))?;

        {
            let mapped = slice.get_mapped_range();
            let src_rows = mapped.chunks_exact(self.padded_bytes_per_row as usize);
            for (src, dst) in src_rows.zip(out.data.chunks_exact_mut(out.stride)) {
                for (texel, px) in src.chunks_exact(4).zip(dst.chunks_exact_mut(3)) {
                    px.copy_from_slice(&texel[..3]);
                }
            }
        }
        self.readback.unmap();

        Ok(())
    }
}

fn extent(width: u32, height: u32) -> wgpu::Extent3d {
    wgpu::Extent3d {
        width,
        height,
        depth_or_array_layers: 1,
    }
}

/// Row size of the read-back buffer, padded to the copy alignment
pub fn padded_row_bytes(width: u32) -> u32 {
    let unpadded = width * TEXEL_BYTES;
    let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
    unpadded.div_ceil(align) * align
}
