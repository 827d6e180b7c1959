//! Pairwise inter-frame motion estimation.

use crate::config::MotionParams;
use stabkit_core::Homography;
use stabkit_tracking::{
    ransac_homography, FastDetector, GrayImage, LucasKanadeParams, PointTracker, TrackStatus,
};
use tracing::debug;

/// How a pairwise transform was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EstimationStatus {
    /// Fit from tracked feature correspondences.
    Measured,
    /// Too few correspondences; identity was substituted.
    IdentityFallback,
}

/// One transform ring-buffer slot: the homography mapping an older
/// frame's content onto its adjacent newer frame, plus how it was obtained.
#[derive(Debug, Clone, Copy)]
pub struct PairwiseMotion {
    pub transform: Homography,
    pub status: EstimationStatus,
}

impl PairwiseMotion {
    pub fn measured(transform: Homography) -> Self {
        Self {
            transform,
            status: EstimationStatus::Measured,
        }
    }

    pub fn fallback() -> Self {
        Self {
            transform: Homography::IDENTITY,
            status: EstimationStatus::IdentityFallback,
        }
    }
}

impl Default for PairwiseMotion {
    fn default() -> Self {
        Self::measured(Homography::IDENTITY)
    }
}

/// Estimates adjacent-frame homographies from tracked FAST corners.
///
/// Detection runs on the older frame, Lucas-Kanade tracks the corners
/// into the newer frame, and a RANSAC homography fit turns the surviving
/// correspondences into a transform. When any stage leaves fewer than
/// `min_correspondences`, the estimate degrades to identity rather than
/// failing the pipeline; the status records which path was taken.
pub struct MotionEstimator {
    detector: FastDetector,
    tracker: PointTracker,
    min_correspondences: usize,
    ransac_iterations: u32,
    ransac_threshold: f32,
}

impl MotionEstimator {
    pub fn new(params: &MotionParams) -> Self {
        Self {
            detector: FastDetector::new(params.fast_threshold, params.max_corners),
            tracker: PointTracker::new(LucasKanadeParams {
                window_size: params.lk_window_size,
                pyramid_levels: params.pyramid_levels,
                max_iterations: params.lk_max_iterations,
                epsilon: params.lk_epsilon,
                ..LucasKanadeParams::default()
            }),
            min_correspondences: params.min_correspondences,
            ransac_iterations: params.ransac_iterations,
            ransac_threshold: params.ransac_threshold,
        }
    }

    /// Estimate the transform mapping `older`'s content onto `newer`'s.
    pub fn estimate(&self, older: &GrayImage, newer: &GrayImage) -> PairwiseMotion {
        let corners = self.detector.detect(older);
        if corners.len() < self.min_correspondences {
            debug!(
                corners = corners.len(),
                needed = self.min_correspondences,
                "too few corners, falling back to identity"
            );
            return PairwiseMotion::fallback();
        }

        let points: Vec<[f32; 2]> = corners.iter().map(|c| [c.x, c.y]).collect();
        let tracked = self.tracker.track(older, newer, &points);

        let mut src = Vec::with_capacity(points.len());
        let mut dst = Vec::with_capacity(points.len());
        for (origin, moved) in points.iter().zip(&tracked) {
            if moved.status == TrackStatus::Tracked {
                src.push(*origin);
                dst.push(moved.position);
            }
        }

        if src.len() < self.min_correspondences {
            debug!(
                tracked = src.len(),
                needed = self.min_correspondences,
                "too few surviving correspondences, falling back to identity"
            );
            return PairwiseMotion::fallback();
        }

        match ransac_homography(&src, &dst, self.ransac_iterations, self.ransac_threshold) {
            Some(h) => PairwiseMotion::measured(h),
            None => {
                debug!("homography fit failed, falling back to identity");
                PairwiseMotion::fallback()
            }
        }
    }
}
