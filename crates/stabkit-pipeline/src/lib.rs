//! StabKit Pipeline - the temporal motion-compensation core
//!
//! Stabilizes shaky video by estimating inter-frame camera motion and
//! warping each frame by a temporally-smoothed inverse transform:
//! - A sliding window of frames and pairwise homographies held in fixed
//!   ring buffers with rotate-and-evict aging
//! - A motion estimator deriving each pairwise homography from tracked
//!   feature correspondences between adjacent frames
//! - A weighted-composition stage collapsing the window's transform chain
//!   into a single smoothing homography for the center frame
//!
//! Callers drive the pipeline through the strict two-call protocol:
//! one `submit_frame` per `retrieve_output`, with one window of latency
//! before the first stabilized frame appears.

pub mod composer;
pub mod config;
pub mod estimator;
pub mod pipeline;
pub mod ring_buffer;
pub mod warp;

pub use composer::{ComposedTransform, TransformComposer, WeightVector};
pub use config::{BorderMode, Interpolation, MotionParams, StabilizerConfig, MAX_HALF_WINDOW};
pub use estimator::{EstimationStatus, MotionEstimator, PairwiseMotion};
pub use pipeline::{StabilizedFrame, StabilizerPipeline};
pub use ring_buffer::RingBuffer;
pub use warp::warp_perspective;
