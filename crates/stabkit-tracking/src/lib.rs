//! StabKit Tracking - feature detection and optical-flow primitives
//!
//! This crate provides the tracking building blocks the stabilizer
//! pipeline consumes through their input/output contracts:
//! - Grayscale conversion and image pyramids
//! - FAST-9 corner detection
//! - Pyramidal Lucas-Kanade point tracking
//! - DLT + RANSAC homography fitting from point correspondences

pub mod corners;
pub mod homography;
pub mod point_tracker;
pub mod pyramid;

pub use corners::{Corner, FastDetector};
pub use homography::{fit_homography, ransac_homography};
pub use point_tracker::{LucasKanadeParams, PointTracker, TrackStatus, TrackedPoint};
pub use pyramid::{frame_to_gray, GrayImage, ImagePyramid};
