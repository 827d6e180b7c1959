//! Perspective warp of RGB frames.

use crate::config::{BorderMode, Interpolation};
use glam::Vec2;
use rayon::prelude::*;
use stabkit_core::{FrameBuffer, Homography, PixelFormat, Result, StabError};

/// Warp `src` by inverse mapping: `map` takes output pixel coordinates to
/// source coordinates, i.e. it is the inverse of the transform being
/// applied to the image content.
///
/// Samples outside the source frame, and output pixels whose homogeneous
/// `w` vanishes, receive the border fill. Rows are processed in parallel.
pub fn warp_perspective(
    src: &FrameBuffer,
    map: &Homography,
    interpolation: Interpolation,
    border: BorderMode,
) -> Result<FrameBuffer> {
    if src.width == 0 || src.height == 0 {
        return Err(StabError::Warp("empty source frame".into()));
    }
    if src.format != PixelFormat::Rgb8 {
        return Err(StabError::Warp(format!(
            "unsupported source format {:?}",
            src.format
        )));
    }

    let BorderMode::Constant(fill) = border;
    let mut out = FrameBuffer::new(src.width, src.height, src.format);
    let width = src.width;
    let stride = out.plane.stride;

    out.plane
        .data
        .par_chunks_mut(stride)
        .take(src.height as usize)
        .enumerate()
        .for_each(|(y, row)| {
            for x in 0..width {
                let rgb = match map.project(Vec2::new(x as f32, y as f32)) {
                    Some(p) => sample(src, p, interpolation, fill),
                    None => fill,
                };
                let i = x as usize * 3;
                row[i..i + 3].copy_from_slice(&rgb);
            }
        });

    Ok(out)
}

fn sample(src: &FrameBuffer, p: Vec2, interpolation: Interpolation, fill: [u8; 3]) -> [u8; 3] {
    match interpolation {
        Interpolation::Nearest => {
            let sx = p.x.round() as i64;
            let sy = p.y.round() as i64;
            if sx >= 0 && sy >= 0 && sx < src.width as i64 && sy < src.height as i64 {
                src.pixel(sx as u32, sy as u32)
            } else {
                fill
            }
        }
        Interpolation::Bilinear => {
            let x0 = p.x.floor();
            let y0 = p.y.floor();
            let fx = p.x - x0;
            let fy = p.y - y0;
            let taps = [
                (x0 as i64, y0 as i64, (1.0 - fx) * (1.0 - fy)),
                (x0 as i64 + 1, y0 as i64, fx * (1.0 - fy)),
                (x0 as i64, y0 as i64 + 1, (1.0 - fx) * fy),
                (x0 as i64 + 1, y0 as i64 + 1, fx * fy),
            ];
            let mut acc = [0.0f32; 3];
            for (tx, ty, weight) in taps {
                let rgb = if tx >= 0 && ty >= 0 && tx < src.width as i64 && ty < src.height as i64
                {
                    src.pixel(tx as u32, ty as u32)
                } else {
                    fill
                };
                for ch in 0..3 {
                    acc[ch] += rgb[ch] as f32 * weight;
                }
            }
            [
                acc[0].round().clamp(0.0, 255.0) as u8,
                acc[1].round().clamp(0.0, 255.0) as u8,
                acc[2].round().clamp(0.0, 255.0) as u8,
            ]
        }
    }
}
