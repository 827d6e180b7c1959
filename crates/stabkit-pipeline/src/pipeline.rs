//! The stabilizer pipeline state machine.

use crate::composer::TransformComposer;
use crate::config::StabilizerConfig;
use crate::estimator::{EstimationStatus, MotionEstimator, PairwiseMotion};
use crate::ring_buffer::RingBuffer;
use crate::warp::warp_perspective;
use stabkit_core::{FrameBuffer, PixelFormat, Result, StabError};
use stabkit_tracking::frame_to_gray;
use tracing::{debug, info};

/// A stabilized output frame.
#[derive(Debug, Clone)]
pub struct StabilizedFrame {
    pub buffer: FrameBuffer,
    /// True when any pairwise transform in the composed window fell back
    /// to identity for lack of correspondences.
    pub degraded: bool,
}

/// Sliding-window video stabilizer.
///
/// Owns a frame ring buffer of `2H + 2` slots and a transform ring buffer
/// of `2H + 1` slots, aged in lock-step. Callers drive it in strict
/// alternation: one [`submit_frame`](Self::submit_frame) per
/// [`retrieve_output`](Self::retrieve_output). The first `2H + 1`
/// retrieves return `Ok(None)` while the window fills; from the
/// `(2H + 2)`-th pair onward each retrieve yields the stabilized center
/// frame of the current window.
///
/// Per-frame errors (`SingularTransform`, `Warp`) are scoped to that
/// output only: buffers still age, so subsequent frames proceed from
/// consistent state.
pub struct StabilizerPipeline {
    config: StabilizerConfig,
    estimator: MotionEstimator,
    composer: TransformComposer,
    frames: RingBuffer<FrameBuffer>,
    transforms: RingBuffer<PairwiseMotion>,
    /// Monotonic until the window fills, then pinned at `window_size`.
    frames_ingested: usize,
    /// Single-slot admission gate for the submit/retrieve alternation.
    pending_submission: bool,
}

impl StabilizerPipeline {
    /// Build a pipeline for fixed frame geometry and half-window.
    ///
    /// All buffers are allocated here and never resized; frames and
    /// transforms are overwritten in place as the window slides.
    pub fn new(config: StabilizerConfig) -> Result<Self> {
        config.validate()?;
        let (width, height) = (config.frame_width, config.frame_height);
        let frames = RingBuffer::new(config.window_size(), || {
            FrameBuffer::new(width, height, PixelFormat::Rgb8)
        })?;
        let transforms =
            RingBuffer::new(config.transform_window_size(), PairwiseMotion::default)?;
        let composer = TransformComposer::new(config.half_window, config.min_determinant)?;
        let estimator = MotionEstimator::new(&config.motion);
        info!(
            width,
            height,
            window = config.window_size(),
            "stabilizer pipeline created"
        );
        Ok(Self {
            config,
            estimator,
            composer,
            frames,
            transforms,
            frames_ingested: 0,
            pending_submission: false,
        })
    }

    pub fn config(&self) -> &StabilizerConfig {
        &self.config
    }

    /// Frames in the sliding window: `2H + 2`.
    pub fn window_size(&self) -> usize {
        self.config.window_size()
    }

    /// Submissions whose retrieves return `None` before the first output.
    pub fn warmup_len(&self) -> usize {
        self.window_size() - 1
    }

    /// Store one frame and, once two frames are present, estimate the
    /// newest pairwise transform.
    ///
    /// Fails with `BufferFull` when the previous submission has not been
    /// consumed by a retrieve, and with `Configuration` when the frame's
    /// geometry differs from the pipeline's.
    pub fn submit_frame(&mut self, frame: &FrameBuffer) -> Result<()> {
        if self.pending_submission {
            return Err(StabError::BufferFull);
        }
        self.frames.current_mut().copy_from(frame)?;
        self.pending_submission = true;
        if self.frames_ingested < self.config.window_size() {
            self.frames_ingested += 1;
        }

        if self.frames_ingested >= 2 {
            let newer = frame_to_gray(self.frames.current());
            let older = frame_to_gray(self.frames.at(1)?);
            let motion = self.estimator.estimate(&older, &newer);
            if motion.status == EstimationStatus::IdentityFallback {
                debug!("pairwise estimate degraded to identity");
            }
            *self.transforms.current_mut() = motion;
        }
        Ok(())
    }

    /// Produce the stabilized center frame for the current window, or
    /// `None` while the window is still filling.
    ///
    /// Ages both ring buffers and re-opens the admission gate regardless
    /// of the outcome; a failed composition only loses this one output.
    pub fn retrieve_output(&mut self) -> Result<Option<StabilizedFrame>> {
        if !self.pending_submission {
            return Err(StabError::MissingSubmission);
        }
        let outcome = if self.frames_ingested == self.config.window_size() {
            self.produce_output().map(Some)
        } else {
            Ok(None)
        };
        self.frames.age();
        self.transforms.age();
        self.pending_submission = false;
        outcome
    }

    fn produce_output(&self) -> Result<StabilizedFrame> {
        let composed = self.composer.compose(&self.transforms)?;
        let center = self.frames.at(self.config.window_size() / 2)?;
        let buffer = warp_perspective(
            center,
            &composed.sampling,
            self.config.interpolation,
            self.config.border,
        )?;
        Ok(StabilizedFrame {
            buffer,
            degraded: self.window_degraded(),
        })
    }

    fn window_degraded(&self) -> bool {
        (0..self.transforms.capacity()).any(|offset| {
            matches!(
                self.transforms.at(offset),
                Ok(m) if m.status == EstimationStatus::IdentityFallback
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Interpolation;

    fn test_config() -> StabilizerConfig {
        let mut config = StabilizerConfig::new(64, 64, 1);
        config.motion.pyramid_levels = 1;
        config.interpolation = Interpolation::Nearest;
        config
    }

    fn textured_frame() -> FrameBuffer {
        // Grid of bright dots; FAST fires reliably on isolated blobs.
        let mut frame = FrameBuffer::new(64, 64, PixelFormat::Rgb8);
        for gy in 0..7u32 {
            for gx in 0..7u32 {
                let cx = 5 + gx * 8;
                let cy = 5 + gy * 8;
                for dy in 0..3 {
                    for dx in 0..3 {
                        frame.set_pixel(cx + dx, cy + dy, [255, 255, 255]);
                    }
                }
            }
        }
        frame
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = StabilizerConfig::new(64, 64, 0);
        assert!(matches!(
            StabilizerPipeline::new(config),
            Err(StabError::Configuration(_))
        ));
    }

    #[test]
    fn test_double_submit_is_buffer_full() {
        let mut pipeline = StabilizerPipeline::new(test_config()).unwrap();
        let frame = textured_frame();
        pipeline.submit_frame(&frame).unwrap();
        assert!(matches!(
            pipeline.submit_frame(&frame),
            Err(StabError::BufferFull)
        ));
    }

    #[test]
    fn test_retrieve_without_submit() {
        let mut pipeline = StabilizerPipeline::new(test_config()).unwrap();
        assert!(matches!(
            pipeline.retrieve_output(),
            Err(StabError::MissingSubmission)
        ));
    }

    #[test]
    fn test_recovers_after_buffer_full() {
        let mut pipeline = StabilizerPipeline::new(test_config()).unwrap();
        let frame = textured_frame();
        pipeline.submit_frame(&frame).unwrap();
        let _ = pipeline.submit_frame(&frame).unwrap_err();
        pipeline.retrieve_output().unwrap();
        pipeline.submit_frame(&frame).unwrap();
    }

    #[test]
    fn test_geometry_mismatch_rejected() {
        let mut pipeline = StabilizerPipeline::new(test_config()).unwrap();
        let wrong = FrameBuffer::new(32, 64, PixelFormat::Rgb8);
        assert!(matches!(
            pipeline.submit_frame(&wrong),
            Err(StabError::Configuration(_))
        ));
    }

    #[test]
    fn test_warmup_then_steady_output() {
        // H = 1: window of 4 frames, exactly 3 warm-up retrieves.
        let mut pipeline = StabilizerPipeline::new(test_config()).unwrap();
        let frame = textured_frame();
        for i in 0..3 {
            pipeline.submit_frame(&frame).unwrap();
            assert!(
                pipeline.retrieve_output().unwrap().is_none(),
                "retrieve {i} should be warm-up"
            );
        }
        pipeline.submit_frame(&frame).unwrap();
        let out = pipeline.retrieve_output().unwrap();
        assert!(out.is_some());
    }

    #[test]
    fn test_static_scene_output_matches_center_exactly() {
        // Identity motion + nearest interpolation: output is the center
        // input, pixel for pixel.
        let mut pipeline = StabilizerPipeline::new(test_config()).unwrap();
        let frame = textured_frame();
        for _ in 0..3 {
            pipeline.submit_frame(&frame).unwrap();
            pipeline.retrieve_output().unwrap();
        }
        pipeline.submit_frame(&frame).unwrap();
        let out = pipeline.retrieve_output().unwrap().unwrap();
        assert!(!out.degraded);
        assert_eq!(out.buffer.plane.data, frame.plane.data);
    }

    #[test]
    fn test_blank_scene_is_degraded_but_produces_output() {
        let mut pipeline = StabilizerPipeline::new(test_config()).unwrap();
        let blank = FrameBuffer::new(64, 64, PixelFormat::Rgb8);
        for _ in 0..3 {
            pipeline.submit_frame(&blank).unwrap();
            pipeline.retrieve_output().unwrap();
        }
        pipeline.submit_frame(&blank).unwrap();
        let out = pipeline.retrieve_output().unwrap().unwrap();
        assert!(out.degraded);
    }
}
