//! FAST-9 corner detection.

use crate::pyramid::GrayImage;
use serde::{Deserialize, Serialize};
use tracing::trace;

/// A detected corner with its detector score.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Corner {
    pub x: f32,
    pub y: f32,
    pub score: f32,
}

/// Bresenham circle of radius 3 around the candidate pixel.
const CIRCLE: [(i32, i32); 16] = [
    (0, -3),
    (1, -3),
    (2, -2),
    (3, -1),
    (3, 0),
    (3, 1),
    (2, 2),
    (1, 3),
    (0, 3),
    (-1, 3),
    (-2, 2),
    (-3, 1),
    (-3, 0),
    (-3, -1),
    (-2, -2),
    (-1, -3),
];

/// Contiguous arc length required by the segment test.
const ARC_LEN: u32 = 9;

/// FAST-9 segment-test corner detector.
///
/// A pixel is a corner when at least 9 contiguous circle pixels are all
/// brighter than center + threshold or all darker than center - threshold.
/// Candidates pass 3x3 non-maximum suppression on the score, then the
/// highest-scoring `max_corners` survive.
pub struct FastDetector {
    /// Intensity threshold on the normalized [0, 1] gray scale.
    pub threshold: f32,
    /// Cap on the number of returned corners.
    pub max_corners: usize,
}

impl FastDetector {
    pub fn new(threshold: f32, max_corners: usize) -> Self {
        Self {
            threshold,
            max_corners,
        }
    }

    /// Detect corners, strongest first.
    pub fn detect(&self, img: &GrayImage) -> Vec<Corner> {
        if img.width < 7 || img.height < 7 {
            return Vec::new();
        }
        let w = img.width as i32;
        let h = img.height as i32;
        let mut scores = vec![0.0f32; (img.width * img.height) as usize];

        for y in 3..h - 3 {
            for x in 3..w - 3 {
                let score = self.segment_score(img, x, y);
                if score > 0.0 {
                    scores[(y * w + x) as usize] = score;
                }
            }
        }

        // 3x3 non-maximum suppression
        let mut corners = Vec::new();
        for y in 3..h - 3 {
            for x in 3..w - 3 {
                let s = scores[(y * w + x) as usize];
                if s <= 0.0 {
                    continue;
                }
                let mut is_max = true;
                'nms: for dy in -1..=1 {
                    for dx in -1..=1 {
                        if (dx, dy) == (0, 0) {
                            continue;
                        }
                        if scores[((y + dy) * w + x + dx) as usize] > s {
                            is_max = false;
                            break 'nms;
                        }
                    }
                }
                if is_max {
                    corners.push(Corner {
                        x: x as f32,
                        y: y as f32,
                        score: s,
                    });
                }
            }
        }

        corners.sort_by(|a, b| b.score.total_cmp(&a.score));
        corners.truncate(self.max_corners);
        trace!(count = corners.len(), "fast corners detected");
        corners
    }

    /// Segment-test score, or 0.0 when the pixel is not a corner.
    fn segment_score(&self, img: &GrayImage, x: i32, y: i32) -> f32 {
        let c = img.get(x, y);
        let mut brighter = [false; 16];
        let mut darker = [false; 16];
        let mut diffs = [0.0f32; 16];
        for (i, &(dx, dy)) in CIRCLE.iter().enumerate() {
            let p = img.get(x + dx, y + dy);
            diffs[i] = p - c;
            brighter[i] = p > c + self.threshold;
            darker[i] = p < c - self.threshold;
        }
        if !(max_circular_run(&brighter) >= ARC_LEN || max_circular_run(&darker) >= ARC_LEN) {
            return 0.0;
        }
        // Score: total excess over the threshold on either side of center
        let mut score = 0.0;
        for (i, &d) in diffs.iter().enumerate() {
            if brighter[i] || darker[i] {
                score += d.abs() - self.threshold;
            }
        }
        score
    }
}

impl Default for FastDetector {
    fn default() -> Self {
        Self::new(0.2, 200)
    }
}

/// Longest run of set flags on the circle, with wraparound.
fn max_circular_run(flags: &[bool; 16]) -> u32 {
    let mut run = 0u32;
    let mut best = 0u32;
    for i in 0..32 {
        if flags[i % 16] {
            run += 1;
            best = best.max(run.min(16));
        } else {
            run = 0;
        }
    }
    best
}
