//! End-to-end pipeline behavior through the public API.

use stabkit_core::{FrameBuffer, PixelFormat, StabError};
use stabkit_pipeline::{StabilizedFrame, StabilizerConfig, StabilizerPipeline};

const WIDTH: u32 = 160;
const HEIGHT: u32 = 120;

/// Dot-grid frame translated horizontally by `shift` pixels.
fn dot_grid(shift: i32) -> FrameBuffer {
    let mut frame = FrameBuffer::new(WIDTH, HEIGHT, PixelFormat::Rgb8);
    for gy in 0..(HEIGHT / 12) {
        for gx in 0..(WIDTH / 12) {
            let cx = 8 + gx as i32 * 12 + shift;
            let cy = 8 + gy as i32 * 12;
            for dy in 0..3 {
                for dx in 0..3 {
                    let x = cx + dx;
                    let y = cy + dy;
                    if x >= 0 && y >= 0 && (x as u32) < WIDTH && (y as u32) < HEIGHT {
                        frame.set_pixel(x as u32, y as u32, [255, 255, 255]);
                    }
                }
            }
        }
    }
    frame
}

fn config(half_window: usize) -> StabilizerConfig {
    let mut config = StabilizerConfig::new(WIDTH, HEIGHT, half_window);
    config.motion.pyramid_levels = 1;
    config
}

/// Mean x of bright pixels, a proxy for the grid's horizontal position.
fn centroid_x(frame: &FrameBuffer) -> f32 {
    let mut sum = 0.0f64;
    let mut count = 0u64;
    for y in 0..frame.height {
        for x in 0..frame.width {
            if frame.pixel(x, y)[0] > 128 {
                sum += x as f64;
                count += 1;
            }
        }
    }
    (sum / count.max(1) as f64) as f32
}

#[test]
fn warmup_length_matches_window() {
    for half_window in [1usize, 2, 3] {
        let mut pipeline = StabilizerPipeline::new(config(half_window)).unwrap();
        let frame = dot_grid(0);
        let warmup = 2 * half_window + 1;
        assert_eq!(pipeline.warmup_len(), warmup);
        for i in 0..warmup {
            pipeline.submit_frame(&frame).unwrap();
            assert!(
                pipeline.retrieve_output().unwrap().is_none(),
                "H={half_window}: retrieve {i} should be warm-up"
            );
        }
        pipeline.submit_frame(&frame).unwrap();
        assert!(
            pipeline.retrieve_output().unwrap().is_some(),
            "H={half_window}: first steady retrieve should produce output"
        );
    }
}

#[test]
fn static_scene_is_identity_invariant() {
    let mut pipeline = StabilizerPipeline::new(config(2)).unwrap();
    let frame = dot_grid(0);
    let mut outputs: Vec<StabilizedFrame> = Vec::new();
    for _ in 0..10 {
        pipeline.submit_frame(&frame).unwrap();
        if let Some(out) = pipeline.retrieve_output().unwrap() {
            outputs.push(out);
        }
    }
    assert!(!outputs.is_empty());
    for out in &outputs {
        assert!(!out.degraded);
        assert_eq!(out.buffer.plane.data, frame.plane.data);
    }
}

#[test]
fn alternation_is_enforced() {
    let mut pipeline = StabilizerPipeline::new(config(1)).unwrap();
    assert!(matches!(
        pipeline.retrieve_output(),
        Err(StabError::MissingSubmission)
    ));
    let frame = dot_grid(0);
    pipeline.submit_frame(&frame).unwrap();
    assert!(matches!(
        pipeline.submit_frame(&frame),
        Err(StabError::BufferFull)
    ));
    // The gate re-opens after a retrieve.
    pipeline.retrieve_output().unwrap();
    pipeline.submit_frame(&frame).unwrap();
}

#[test]
fn jittered_sequence_comes_out_smoother() {
    let jitter: [i32; 14] = [0, 2, -2, 2, -2, 2, -2, 2, -2, 2, -2, 2, -2, 0];
    let half_window = 2;
    let mut pipeline = StabilizerPipeline::new(config(half_window)).unwrap();

    let frames: Vec<FrameBuffer> = jitter.iter().map(|&dx| dot_grid(dx)).collect();
    let resting = centroid_x(&frames[0]);

    let mut input_dev = Vec::new();
    let mut output_dev = Vec::new();
    for (i, frame) in frames.iter().enumerate() {
        pipeline.submit_frame(frame).unwrap();
        if let Some(out) = pipeline.retrieve_output().unwrap() {
            assert!(!out.degraded, "frame {i} estimate degraded");
            // The output warps the window's center frame.
            let center = &frames[i - (half_window + 1)];
            input_dev.push((centroid_x(center) - resting).abs());
            output_dev.push((centroid_x(&out.buffer) - resting).abs());
        }
    }

    assert!(output_dev.len() >= 8);
    let mean = |v: &[f32]| v.iter().sum::<f32>() / v.len() as f32;
    let input_mean = mean(&input_dev);
    let output_mean = mean(&output_dev);
    assert!(
        output_mean < input_mean,
        "stabilized deviation {output_mean} should be below raw {input_mean}"
    );
}

#[test]
fn featureless_sequence_is_degraded_but_flows() {
    let mut pipeline = StabilizerPipeline::new(config(1)).unwrap();
    let blank = FrameBuffer::new(WIDTH, HEIGHT, PixelFormat::Rgb8);
    let mut produced = 0;
    for _ in 0..8 {
        pipeline.submit_frame(&blank).unwrap();
        if let Some(out) = pipeline.retrieve_output().unwrap() {
            assert!(out.degraded);
            produced += 1;
        }
    }
    assert_eq!(produced, 8 - pipeline.warmup_len());
}
