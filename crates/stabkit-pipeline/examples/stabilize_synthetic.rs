//! Stabilize a synthetic jittering sequence and log per-frame results.
//!
//! Run with: `cargo run --example stabilize_synthetic`

use stabkit_core::{FrameBuffer, PixelFormat, Result};
use stabkit_pipeline::{StabilizerConfig, StabilizerPipeline};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

/// A dot-grid frame translated horizontally by `shift` pixels, standing
/// in for a camera that jitters left and right.
fn jittered_frame(width: u32, height: u32, shift: i32) -> FrameBuffer {
    let mut frame = FrameBuffer::new(width, height, PixelFormat::Rgb8);
    for gy in 0..(height / 12) {
        for gx in 0..(width / 12) {
            let cx = 8 + gx as i32 * 12 + shift;
            let cy = 8 + gy as i32 * 12;
            for dy in 0..3 {
                for dx in 0..3 {
                    let x = cx + dx;
                    let y = cy + dy;
                    if x >= 0 && y >= 0 && (x as u32) < width && (y as u32) < height {
                        frame.set_pixel(x as u32, y as u32, [255, 240, 200]);
                    }
                }
            }
        }
    }
    frame
}

fn main() -> Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();
    tracing::subscriber::set_global_default(subscriber).ok();

    let (width, height) = (160, 120);
    let mut config = StabilizerConfig::new(width, height, 2);
    config.motion.pyramid_levels = 1;
    let mut pipeline = StabilizerPipeline::new(config)?;
    info!(warmup = pipeline.warmup_len(), "pipeline ready");

    let jitter: [i32; 16] = [0, 2, -1, 3, 0, -2, 1, 2, -3, 1, 0, 2, -1, -2, 3, 0];
    let mut produced = 0usize;
    for (i, &dx) in jitter.iter().enumerate() {
        let frame = jittered_frame(width, height, dx);
        pipeline.submit_frame(&frame)?;
        match pipeline.retrieve_output()? {
            Some(out) => {
                produced += 1;
                info!(frame = i, degraded = out.degraded, "stabilized frame");
            }
            None => info!(frame = i, "warming up"),
        }
    }
    info!(produced, total = jitter.len(), "done");
    Ok(())
}
