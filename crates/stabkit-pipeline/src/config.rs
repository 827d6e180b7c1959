//! Pipeline configuration.

use serde::{Deserialize, Serialize};
use stabkit_core::{Result, StabError};

/// Upper bound on the half-window, keeping the Gaussian weight vector
/// well away from degenerate sigmas.
pub const MAX_HALF_WINDOW: usize = 16;

/// Upper bound on pyramid depth when derived from frame dimensions.
pub const MAX_PYRAMID_LEVELS: u32 = 4;

/// Interpolation used when resampling the warped frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Interpolation {
    #[default]
    Nearest,
    Bilinear,
}

/// Border policy for samples that fall outside the source frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BorderMode {
    /// Fill with a constant RGB value.
    Constant([u8; 3]),
}

impl Default for BorderMode {
    fn default() -> Self {
        Self::Constant([0, 0, 0])
    }
}

/// Motion-estimation tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MotionParams {
    /// Cap on tracked FAST corners per frame pair.
    pub max_corners: usize,
    /// FAST threshold on the normalized [0, 1] gray scale.
    pub fast_threshold: f32,
    /// Lucas-Kanade window side length in pixels.
    pub lk_window_size: u32,
    /// Lucas-Kanade iteration cap per pyramid level.
    pub lk_max_iterations: u32,
    /// Lucas-Kanade convergence threshold in pixels.
    pub lk_epsilon: f32,
    /// Pyramid depth for coarse-to-fine tracking.
    pub pyramid_levels: u32,
    /// Minimum tracked correspondences to accept a non-identity fit.
    pub min_correspondences: usize,
    /// RANSAC sampling iterations for the homography fit.
    pub ransac_iterations: u32,
    /// RANSAC inlier reprojection threshold in pixels.
    pub ransac_threshold: f32,
}

impl Default for MotionParams {
    fn default() -> Self {
        Self {
            max_corners: 200,
            fast_threshold: 0.2,
            lk_window_size: 11,
            lk_max_iterations: 30,
            lk_epsilon: 0.01,
            pyramid_levels: 3,
            min_correspondences: 8,
            ransac_iterations: 500,
            ransac_threshold: 3.0,
        }
    }
}

impl MotionParams {
    /// Defaults with pyramid depth derived from the frame dimensions:
    /// the number of halvings until the frame shrinks to the tracking
    /// window, clamped to `[1, MAX_PYRAMID_LEVELS]`.
    pub fn for_dimensions(width: u32, height: u32) -> Self {
        let mut params = Self::default();
        let wnd = params.lk_window_size as f32;
        let half: f32 = 0.5;
        let from_width = (wnd / width.max(1) as f32).ln() / half.ln();
        let from_height = (wnd / height.max(1) as f32).ln() / half.ln();
        let levels = from_width.min(from_height).floor();
        params.pyramid_levels = if levels.is_finite() && levels >= 1.0 {
            (levels as u32).min(MAX_PYRAMID_LEVELS)
        } else {
            1
        };
        params
    }
}

/// Stabilizer construction parameters, fixed for the pipeline's lifetime.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StabilizerConfig {
    pub frame_width: u32,
    pub frame_height: u32,
    /// Frames on each side of the window's center frame.
    pub half_window: usize,
    pub interpolation: Interpolation,
    pub border: BorderMode,
    /// |det| below this is treated as a singular transform.
    pub min_determinant: f32,
    pub motion: MotionParams,
}

impl StabilizerConfig {
    pub fn new(frame_width: u32, frame_height: u32, half_window: usize) -> Self {
        Self {
            frame_width,
            frame_height,
            half_window,
            interpolation: Interpolation::default(),
            border: BorderMode::default(),
            min_determinant: 1e-6,
            motion: MotionParams::for_dimensions(frame_width, frame_height),
        }
    }

    /// Frame ring-buffer capacity: `2H + 2`.
    pub fn window_size(&self) -> usize {
        2 * self.half_window + 2
    }

    /// Transform ring-buffer capacity: `2H + 1`.
    pub fn transform_window_size(&self) -> usize {
        2 * self.half_window + 1
    }

    pub(crate) fn validate(&self) -> Result<()> {
        let fail = |msg: String| Err(StabError::Configuration(msg));
        if self.frame_width == 0 || self.frame_height == 0 {
            return fail(format!(
                "frame dimensions must be positive, got {}x{}",
                self.frame_width, self.frame_height
            ));
        }
        if self.half_window < 1 {
            return fail("half_window must be at least 1".into());
        }
        if self.half_window > MAX_HALF_WINDOW {
            return fail(format!(
                "half_window {} exceeds maximum {}",
                self.half_window, MAX_HALF_WINDOW
            ));
        }
        if !(self.min_determinant > 0.0) {
            return fail("min_determinant must be positive".into());
        }
        if self.motion.min_correspondences < 4 {
            return fail("min_correspondences must be at least 4 to fit a homography".into());
        }
        if self.motion.max_corners < self.motion.min_correspondences {
            return fail(format!(
                "max_corners {} below min_correspondences {}",
                self.motion.max_corners, self.motion.min_correspondences
            ));
        }
        if self.motion.pyramid_levels < 1 {
            return fail("pyramid_levels must be at least 1".into());
        }
        if self.motion.lk_window_size == 0 || self.motion.lk_max_iterations == 0 {
            return fail("Lucas-Kanade window and iteration cap must be positive".into());
        }
        if self.motion.ransac_iterations == 0 {
            return fail("ransac_iterations must be positive".into());
        }
        Ok(())
    }
}
