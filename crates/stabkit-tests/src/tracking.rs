//! Tracking primitives working together across crate boundaries.

use stabkit_core::{FrameBuffer, PixelFormat};
use stabkit_tracking::{
    frame_to_gray, ransac_homography, FastDetector, ImagePyramid, LucasKanadeParams, PointTracker,
    TrackStatus,
};

fn dot_frame(shift: i32) -> FrameBuffer {
    let mut frame = FrameBuffer::new(128, 96, PixelFormat::Rgb8);
    for gy in 0..7u32 {
        for gx in 0..9u32 {
            let cx = 10 + gx as i32 * 12 + shift;
            let cy = 10 + gy as i32 * 12;
            for dy in 0..3 {
                for dx in 0..3 {
                    let x = cx + dx;
                    let y = cy + dy;
                    if x >= 0 && y >= 0 && (x as u32) < 128 && (y as u32) < 96 {
                        frame.set_pixel(x as u32, y as u32, [230, 230, 230]);
                    }
                }
            }
        }
    }
    frame
}

#[test]
fn detect_track_fit_recovers_translation() {
    let older = frame_to_gray(&dot_frame(0));
    let newer = frame_to_gray(&dot_frame(2));

    let corners = FastDetector::new(0.2, 200).detect(&older);
    assert!(corners.len() >= 8, "only {} corners", corners.len());

    let points: Vec<[f32; 2]> = corners.iter().map(|c| [c.x, c.y]).collect();
    let tracker = PointTracker::new(LucasKanadeParams {
        pyramid_levels: 1,
        ..Default::default()
    });
    let tracked = tracker.track(&older, &newer, &points);

    let mut src = Vec::new();
    let mut dst = Vec::new();
    for (origin, moved) in points.iter().zip(&tracked) {
        if moved.status == TrackStatus::Tracked {
            src.push(*origin);
            dst.push(moved.position);
        }
    }
    assert!(src.len() >= 8);

    let h = ransac_homography(&src, &dst, 500, 3.0).unwrap().to_rows();
    assert!((h[0][2] - 2.0).abs() < 1.0, "tx = {}", h[0][2]);
    assert!(h[1][2].abs() < 1.0, "ty = {}", h[1][2]);
}

#[test]
fn pyramid_from_frame_buffer() {
    let gray = frame_to_gray(&dot_frame(0));
    let pyramid = ImagePyramid::build(&gray, 3);
    assert_eq!(pyramid.levels[0].width, 128);
    assert_eq!(pyramid.levels[1].width, 64);
    assert_eq!(pyramid.levels[2].width, 32);
}
