//! Frame data model
//!
//! Frames are packed 3-channel images. Rows may carry trailing padding
//! (`stride > width * 3`) when they come from capture hardware with
//! alignment requirements.
//!
//! Input frames are borrowed from the caller through [`FrameView`]; the
//! projection engine keeps one owned [`Frame`] as its destination and
//! overwrites it on every transform.

use crate::error::{ProjectionError, Result};

/// Pixel layout of a frame
///
/// Both variants are 8-bit, 3-channel, packed. The GPU path treats the
/// channels as opaque and preserves their order, so a BGR input produces a
/// BGR output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PixelFormat {
    /// Packed R, G, B
    #[default]
    Rgb24,
    /// Packed B, G, R
    Bgr24,
}

impl PixelFormat {
    /// Bytes per pixel (always 3 for the supported formats)
    pub const fn bytes_per_pixel(self) -> usize {
        3
    }
}

/// Borrowed view of a caller-owned frame
#[derive(Debug, Clone, Copy)]
pub struct FrameView<'a> {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Bytes per row, at least `width * 3`
    pub stride: usize,
    /// Pixel layout
    pub format: PixelFormat,
    /// Pixel bytes, at least `stride * (height - 1) + width * 3` long
    pub data: &'a [u8],
}

impl<'a> FrameView<'a> {
    /// Wrap a caller buffer, validating that it can hold the declared layout
    pub fn new(width: u32, height: u32, stride: usize, format: PixelFormat, data: &'a [u8]) -> Result<Self> {
        let view = Self {
            width,
            height,
            stride,
            format,
            data,
        };
        view.validate()?;
        Ok(view)
    }

    /// Bytes of visible pixel data per row
    pub fn row_bytes(&self) -> usize {
        self.width as usize * self.format.bytes_per_pixel()
    }

    /// Check the layout is internally consistent
    pub fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(ProjectionError::invalid_frame("frame has zero area"));
        }
        if self.stride < self.row_bytes() {
            return Err(ProjectionError::invalid_frame(format!(
                "stride {} is smaller than row size {}",
                self.stride,
                self.row_bytes()
            )));
        }
        let required = self.stride * (self.height as usize - 1) + self.row_bytes();
        if self.data.len() < required {
            return Err(ProjectionError::invalid_frame(format!(
                "buffer holds {} bytes, layout needs {}",
                self.data.len(),
                required
            )));
        }
        Ok(())
    }

    /// Visible bytes of one row (padding excluded)
    pub fn row(&self, y: u32) -> &'a [u8] {
        let start = y as usize * self.stride;
        &self.data[start..start + self.row_bytes()]
    }

    /// Iterate visible rows top to bottom
    pub fn rows(&self) -> impl Iterator<Item = &'a [u8]> + '_ {
        (0..self.height).map(move |y| self.row(y))
    }

    /// Copy rows into `dst` using a (possibly larger) destination stride
    ///
    /// Padding bytes in `dst` are left untouched.
    pub fn copy_to_strided(&self, dst: &mut [u8], dst_stride: usize) -> Result<()> {
        let row_bytes = self.row_bytes();
        if dst_stride < row_bytes {
            return Err(ProjectionError::invalid_frame(format!(
                "destination stride {} is smaller than row size {}",
                dst_stride, row_bytes
            )));
        }
        let needed = dst_stride * (self.height as usize - 1) + row_bytes;
        if dst.len() < needed {
            return Err(ProjectionError::invalid_frame(format!(
                "destination holds {} bytes, needs {}",
                dst.len(),
                needed
            )));
        }
        for (y, row) in self.rows().enumerate() {
            let offset = y * dst_stride;
            dst[offset..offset + row_bytes].copy_from_slice(row);
        }
        Ok(())
    }

    /// Copy visible pixels into a tightly packed `Vec`
    pub fn to_packed(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.row_bytes() * self.height as usize);
        for row in self.rows() {
            out.extend_from_slice(row);
        }
        out
    }
}

/// Owned, tightly packed frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Bytes per row (`width * 3`)
    pub stride: usize,
    /// Pixel layout
    pub format: PixelFormat,
    /// Pixel bytes (`stride * height`)
    pub data: Vec<u8>,
}

impl Frame {
    /// Allocate a black frame
    pub fn new(width: u32, height: u32, format: PixelFormat) -> Self {
        let stride = width as usize * format.bytes_per_pixel();
        Self {
            width,
            height,
            stride,
            format,
            data: vec![0; stride * height as usize],
        }
    }

    /// Take ownership of packed pixel bytes
    pub fn from_packed(width: u32, height: u32, format: PixelFormat, data: Vec<u8>) -> Result<Self> {
        let stride = width as usize * format.bytes_per_pixel();
        if data.len() != stride * height as usize {
            return Err(ProjectionError::invalid_frame(format!(
                "packed {}x{} frame needs {} bytes, got {}",
                width,
                height,
                stride * height as usize,
                data.len()
            )));
        }
        Ok(Self {
            width,
            height,
            stride,
            format,
            data,
        })
    }

    /// Borrow as a view
    pub fn view(&self) -> FrameView<'_> {
        FrameView {
            width: self.width,
            height: self.height,
            stride: self.stride,
            format: self.format,
            data: &self.data,
        }
    }

    /// Size of the pixel data in bytes
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the frame has no pixel data
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn padded_frame() -> (Vec<u8>, usize) {
        // 2x2 pixels, 8 byte stride (2 bytes padding per row)
        let data = vec![
            1, 2, 3, 4, 5, 6, 0xEE, 0xEE, //
            7, 8, 9, 10, 11, 12, 0xEE, 0xEE,
        ];
        (data, 8)
    }

    #[test]
    fn test_view_validation() {
        let (data, stride) = padded_frame();
        assert!(FrameView::new(2, 2, stride, PixelFormat::Rgb24, &data).is_ok());

        // Stride smaller than a row
        assert!(FrameView::new(2, 2, 5, PixelFormat::Rgb24, &data).is_err());

        // Last row does not need its padding
        assert!(FrameView::new(2, 2, stride, PixelFormat::Rgb24, &data[..14]).is_ok());
        assert!(FrameView::new(2, 2, stride, PixelFormat::Rgb24, &data[..13]).is_err());

        assert!(FrameView::new(0, 2, stride, PixelFormat::Rgb24, &data).is_err());
    }

    #[test]
    fn test_to_packed_drops_padding() {
        let (data, stride) = padded_frame();
        let view = FrameView::new(2, 2, stride, PixelFormat::Rgb24, &data).expect("view");
        assert_eq!(view.to_packed(), vec![1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12]);
    }

    #[test]
    fn test_copy_to_strided() {
        let frame = Frame::from_packed(2, 2, PixelFormat::Rgb24, (1..=12).collect()).expect("frame");
        let mut dst = vec![0u8; 2 * 32];
        frame.view().copy_to_strided(&mut dst, 32).expect("copy");

        assert_eq!(&dst[0..6], &[1, 2, 3, 4, 5, 6]);
        assert!(dst[6..32].iter().all(|&b| b == 0));
        assert_eq!(&dst[32..38], &[7, 8, 9, 10, 11, 12]);

        let mut short = vec![0u8; 37];
        assert!(frame.view().copy_to_strided(&mut short, 32).is_err());
    }

    #[test]
    fn test_owned_frame() {
        let frame = Frame::new(4, 2, PixelFormat::Bgr24);
        assert_eq!(frame.stride, 12);
        assert_eq!(frame.len(), 24);
        assert!(!frame.is_empty());
        assert!(Frame::from_packed(4, 2, PixelFormat::Rgb24, vec![0; 23]).is_err());
    }
}
