//! Frame buffer types for video frames in CPU memory.

use crate::error::{Result, StabError};
use serde::{Deserialize, Serialize};

/// Pixel format enumeration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PixelFormat {
    /// 8-bit RGB (24 bits per pixel)
    #[default]
    Rgb8,
    /// 8-bit grayscale
    Gray8,
}

impl PixelFormat {
    /// Bytes per pixel.
    pub fn bytes_per_pixel(self) -> usize {
        match self {
            Self::Rgb8 => 3,
            Self::Gray8 => 1,
        }
    }
}

/// A plane of pixel data with stride information.
#[derive(Debug, Clone, PartialEq)]
pub struct FramePlane {
    /// Raw pixel data
    pub data: Vec<u8>,
    /// Bytes per row (may include padding)
    pub stride: usize,
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Bytes per pixel
    pub bytes_per_pixel: usize,
}

impl FramePlane {
    /// Create a new zero-filled frame plane with the given dimensions.
    pub fn new(width: u32, height: u32, bytes_per_pixel: usize) -> Self {
        // Align stride to 64 bytes for SIMD friendliness
        let min_stride = (width as usize) * bytes_per_pixel;
        let stride = (min_stride + 63) & !63;
        let data = vec![0u8; stride * height as usize];
        Self {
            data,
            stride,
            width,
            height,
            bytes_per_pixel,
        }
    }

    /// Get a row of pixel data (padding excluded).
    #[inline]
    pub fn row(&self, y: u32) -> &[u8] {
        let start = y as usize * self.stride;
        let end = start + self.width as usize * self.bytes_per_pixel;
        &self.data[start..end]
    }

    /// Get a mutable row of pixel data (padding excluded).
    #[inline]
    pub fn row_mut(&mut self, y: u32) -> &mut [u8] {
        let start = y as usize * self.stride;
        let end = start + self.width as usize * self.bytes_per_pixel;
        &mut self.data[start..end]
    }
}

/// A video frame in CPU memory.
///
/// Dimensions and format are fixed at construction; the pixel contents are
/// overwritten in place when the frame occupies a ring-buffer slot.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameBuffer {
    /// Pixel format
    pub format: PixelFormat,
    /// Frame width in pixels
    pub width: u32,
    /// Frame height in pixels
    pub height: u32,
    /// Pixel data
    pub plane: FramePlane,
}

impl FrameBuffer {
    /// Create a new zero-filled frame buffer with the given dimensions and format.
    pub fn new(width: u32, height: u32, format: PixelFormat) -> Self {
        Self {
            format,
            width,
            height,
            plane: FramePlane::new(width, height, format.bytes_per_pixel()),
        }
    }

    /// Total memory usage of this frame in bytes.
    pub fn memory_size(&self) -> usize {
        self.plane.data.len()
    }

    /// Read one pixel as an RGB triple (grayscale replicated across channels).
    #[inline]
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 3] {
        let row = self.plane.row(y);
        match self.format {
            PixelFormat::Rgb8 => {
                let i = x as usize * 3;
                [row[i], row[i + 1], row[i + 2]]
            }
            PixelFormat::Gray8 => {
                let v = row[x as usize];
                [v, v, v]
            }
        }
    }

    /// Write one pixel.
    #[inline]
    pub fn set_pixel(&mut self, x: u32, y: u32, rgb: [u8; 3]) {
        let format = self.format;
        let row = self.plane.row_mut(y);
        match format {
            PixelFormat::Rgb8 => {
                let i = x as usize * 3;
                row[i..i + 3].copy_from_slice(&rgb);
            }
            PixelFormat::Gray8 => {
                row[x as usize] = rgb[0];
            }
        }
    }

    /// Copy pixel contents from another frame of identical geometry.
    ///
    /// Reuses the existing allocation; fails if dimensions or format differ.
    pub fn copy_from(&mut self, other: &FrameBuffer) -> Result<()> {
        if self.width != other.width
            || self.height != other.height
            || self.format != other.format
        {
            return Err(StabError::Configuration(format!(
                "frame geometry mismatch: {}x{} {:?} vs {}x{} {:?}",
                other.width, other.height, other.format, self.width, self.height, self.format
            )));
        }
        self.plane.data.copy_from_slice(&other.plane.data);
        Ok(())
    }
}
