//! Still image output
//!
//! Writes one projected frame as a baseline JPEG. Stride padding is dropped
//! and BGR input is reordered to RGB before encoding.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use image::codecs::jpeg::JpegEncoder;
use image::{ExtendedColorType, ImageEncoder};
use pano_projection::{FrameView, PixelFormat};
use tracing::{debug, info};

use crate::error::{EncoderError, Result};

/// Default JPEG quality
pub const DEFAULT_JPEG_QUALITY: u8 = 90;

/// Encode `frame` as JPEG into `writer`
///
/// `quality` is clamped to 1..=100.
pub fn encode_jpeg<W: Write>(frame: &FrameView<'_>, quality: u8, writer: W) -> Result<()> {
    frame.validate()?;
    let quality = quality.clamp(1, 100);
    let rgb = packed_rgb(frame);

    JpegEncoder::new_with_quality(writer, quality).write_image(&rgb, frame.width, frame.height, ExtendedColorType::Rgb8)?;
    debug!("Encoded {}x{} JPEG at quality {}", frame.width, frame.height, quality);
    Ok(())
}

/// Encode `frame` as JPEG into a newly created file at `path`
pub fn save_jpeg(frame: &FrameView<'_>, quality: u8, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let file = File::create(path).map_err(|source| EncoderError::SinkOpen {
        path: path.to_path_buf(),
        source,
    })?;

    let mut writer = BufWriter::new(file);
    encode_jpeg(frame, quality, &mut writer)?;
    writer.flush()?;

    info!("Saved still image to {}", path.display());
    Ok(())
}

fn packed_rgb(frame: &FrameView<'_>) -> Vec<u8> {
    let mut packed = frame.to_packed();
    if frame.format == PixelFormat::Bgr24 {
        for pixel in packed.chunks_exact_mut(3) {
            pixel.swap(0, 2);
        }
    }
    packed
}
