//! Pyramidal Lucas-Kanade point tracking.

use crate::pyramid::{GrayImage, ImagePyramid};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Tuning for the iterative Lucas-Kanade solver.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LucasKanadeParams {
    /// Tracking window side length in pixels.
    pub window_size: u32,
    /// Pyramid depth for coarse-to-fine refinement.
    pub pyramid_levels: u32,
    /// Iteration cap per pyramid level.
    pub max_iterations: u32,
    /// Convergence threshold in pixels.
    pub epsilon: f32,
    /// Displacement beyond which a point counts as lost.
    pub search_radius: f32,
}

impl Default for LucasKanadeParams {
    fn default() -> Self {
        Self {
            window_size: 11,
            pyramid_levels: 3,
            max_iterations: 30,
            epsilon: 0.01,
            search_radius: 30.0,
        }
    }
}

/// Outcome of tracking one point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrackStatus {
    /// Successfully tracked to a new position.
    Tracked,
    /// The solver diverged, the gradient matrix was singular, or the
    /// point left the image or its search radius.
    Lost,
}

/// A point with its post-tracking position and status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackedPoint {
    pub position: [f32; 2],
    pub status: TrackStatus,
}

/// Lucas-Kanade optical flow point tracker with pyramidal support.
pub struct PointTracker {
    params: LucasKanadeParams,
}

impl PointTracker {
    pub fn new(params: LucasKanadeParams) -> Self {
        Self { params }
    }

    /// Track `points` from `prev` into `curr`.
    ///
    /// The returned vector is index-aligned with `points`; lost entries
    /// keep their last estimated position but must not be trusted.
    pub fn track(&self, prev: &GrayImage, curr: &GrayImage, points: &[[f32; 2]]) -> Vec<TrackedPoint> {
        let prev_pyr = ImagePyramid::build(prev, self.params.pyramid_levels);
        let curr_pyr = ImagePyramid::build(curr, self.params.pyramid_levels);

        points
            .par_iter()
            .map(|&p| self.track_point(&prev_pyr, &curr_pyr, p))
            .collect()
    }

    fn track_point(
        &self,
        prev_pyr: &ImagePyramid,
        curr_pyr: &ImagePyramid,
        position: [f32; 2],
    ) -> TrackedPoint {
        match self.solve_pyramidal(prev_pyr, curr_pyr, position) {
            Some(new_pos) => {
                let dx = new_pos[0] - position[0];
                let dy = new_pos[1] - position[1];
                let full = &prev_pyr.levels[0];
                let inside = new_pos[0] >= 0.0
                    && new_pos[1] >= 0.0
                    && new_pos[0] < full.width as f32
                    && new_pos[1] < full.height as f32;
                if !inside || (dx * dx + dy * dy).sqrt() > self.params.search_radius {
                    TrackedPoint {
                        position: new_pos,
                        status: TrackStatus::Lost,
                    }
                } else {
                    TrackedPoint {
                        position: new_pos,
                        status: TrackStatus::Tracked,
                    }
                }
            }
            None => TrackedPoint {
                position,
                status: TrackStatus::Lost,
            },
        }
    }

    /// Coarse-to-fine Lucas-Kanade, refining the displacement guess at
    /// each level of the pyramid.
    fn solve_pyramidal(
        &self,
        prev_pyr: &ImagePyramid,
        curr_pyr: &ImagePyramid,
        position: [f32; 2],
    ) -> Option<[f32; 2]> {
        let levels = prev_pyr.levels.len();
        let mut guess = [0.0f32, 0.0];

        for level in (0..levels).rev() {
            let scale = 1.0 / (1u32 << level) as f32;
            let px = position[0] * scale;
            let py = position[1] * scale;
            let prev_img = &prev_pyr.levels[level];
            let curr_img = &curr_pyr.levels[level];
            let hw = (self.params.window_size as f32 * scale * 0.5).max(1.0) as i32;

            // Spatial gradient matrix over the window
            let mut g11 = 0.0f32;
            let mut g12 = 0.0f32;
            let mut g22 = 0.0f32;
            for wy in -hw..=hw {
                for wx in -hw..=hw {
                    let ix = (prev_img.get(px as i32 + wx + 1, py as i32 + wy)
                        - prev_img.get(px as i32 + wx - 1, py as i32 + wy))
                        * 0.5;
                    let iy = (prev_img.get(px as i32 + wx, py as i32 + wy + 1)
                        - prev_img.get(px as i32 + wx, py as i32 + wy - 1))
                        * 0.5;
                    g11 += ix * ix;
                    g12 += ix * iy;
                    g22 += iy * iy;
                }
            }

            let det = g11 * g22 - g12 * g12;
            if det.abs() < 1e-6 {
                if level == 0 {
                    return None;
                }
                continue;
            }
            let inv_det = 1.0 / det;

            let mut dx = guess[0] * scale;
            let mut dy = guess[1] * scale;

            for _ in 0..self.params.max_iterations {
                let mut bx = 0.0f32;
                let mut by = 0.0f32;
                for wy in -hw..=hw {
                    for wx in -hw..=hw {
                        let ix = (prev_img.get(px as i32 + wx + 1, py as i32 + wy)
                            - prev_img.get(px as i32 + wx - 1, py as i32 + wy))
                            * 0.5;
                        let iy = (prev_img.get(px as i32 + wx, py as i32 + wy + 1)
                            - prev_img.get(px as i32 + wx, py as i32 + wy - 1))
                            * 0.5;
                        let it = curr_img.get((px + dx) as i32 + wx, (py + dy) as i32 + wy)
                            - prev_img.get(px as i32 + wx, py as i32 + wy);
                        bx += ix * it;
                        by += iy * it;
                    }
                }
                let ddx = inv_det * (g22 * bx - g12 * by);
                let ddy = inv_det * (-g12 * bx + g11 * by);
                dx -= ddx;
                dy -= ddy;
                if ddx * ddx + ddy * ddy < self.params.epsilon * self.params.epsilon {
                    break;
                }
            }
            guess = [dx / scale, dy / scale];
        }

        Some([position[0] + guess[0], position[1] + guess[1]])
    }
}
