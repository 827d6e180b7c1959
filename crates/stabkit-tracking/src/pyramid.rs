//! Grayscale images and multi-scale pyramids for tracking.

use stabkit_core::{FrameBuffer, PixelFormat};

/// A grayscale image stored as f32 values [0, 1].
#[derive(Debug, Clone)]
pub struct GrayImage {
    pub data: Vec<f32>,
    pub width: u32,
    pub height: u32,
}

impl GrayImage {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            data: vec![0.0; (width * height) as usize],
            width,
            height,
        }
    }

    /// Sample with clamp-to-edge semantics.
    #[inline]
    pub fn get(&self, x: i32, y: i32) -> f32 {
        let x = x.clamp(0, self.width as i32 - 1) as u32;
        let y = y.clamp(0, self.height as i32 - 1) as u32;
        self.data[(y * self.width + x) as usize]
    }

    #[inline]
    pub fn set(&mut self, x: u32, y: u32, val: f32) {
        if x < self.width && y < self.height {
            self.data[(y * self.width + x) as usize] = val;
        }
    }
}

/// Multi-scale image pyramid, level 0 at full resolution.
pub struct ImagePyramid {
    pub levels: Vec<GrayImage>,
}

impl ImagePyramid {
    /// Build by repeated 2x2 box-filter downsampling.
    pub fn build(gray: &GrayImage, num_levels: u32) -> Self {
        let mut levels = vec![gray.clone()];
        for _ in 1..num_levels {
            let prev = levels.last().unwrap();
            let nw = prev.width.div_ceil(2);
            let nh = prev.height.div_ceil(2);
            let mut level = GrayImage::new(nw, nh);
            for y in 0..nh {
                for x in 0..nw {
                    let sx = (x * 2) as i32;
                    let sy = (y * 2) as i32;
                    let avg = (prev.get(sx, sy)
                        + prev.get(sx + 1, sy)
                        + prev.get(sx, sy + 1)
                        + prev.get(sx + 1, sy + 1))
                        * 0.25;
                    level.set(x, y, avg);
                }
            }
            levels.push(level);
        }
        Self { levels }
    }
}

/// Convert a frame buffer to a grayscale image using Rec.601 luma weights.
pub fn frame_to_gray(frame: &FrameBuffer) -> GrayImage {
    let mut gray = GrayImage::new(frame.width, frame.height);
    for y in 0..frame.height {
        let row = frame.plane.row(y);
        let out = &mut gray.data[(y * frame.width) as usize..((y + 1) * frame.width) as usize];
        match frame.format {
            PixelFormat::Rgb8 => {
                for (x, px) in out.iter_mut().enumerate() {
                    let i = x * 3;
                    *px = (0.299 * row[i] as f32
                        + 0.587 * row[i + 1] as f32
                        + 0.114 * row[i + 2] as f32)
                        / 255.0;
                }
            }
            PixelFormat::Gray8 => {
                for (x, px) in out.iter_mut().enumerate() {
                    *px = row[x] as f32 / 255.0;
                }
            }
        }
    }
    gray
}
