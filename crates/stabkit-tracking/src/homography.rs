//! Homography fitting from point correspondences.

use stabkit_core::Homography;
use tracing::trace;

/// Fit a homography from exactly 4+ point pairs using DLT.
///
/// Solves the 8x9 linear system with Gaussian elimination and partial
/// pivoting, using the first four pairs. Returns `None` for degenerate
/// configurations (collinear points, insufficient pairs).
pub fn fit_homography(src: &[[f32; 2]], dst: &[[f32; 2]]) -> Option<Homography> {
    if src.len() < 4 || src.len() != dst.len() {
        return None;
    }
    let n = src.len().min(4);
    let mut m = [[0.0f64; 9]; 8];
    for i in 0..n {
        let (x, y) = (src[i][0] as f64, src[i][1] as f64);
        let (xp, yp) = (dst[i][0] as f64, dst[i][1] as f64);
        m[i * 2] = [-x, -y, -1.0, 0.0, 0.0, 0.0, x * xp, y * xp, xp];
        m[i * 2 + 1] = [0.0, 0.0, 0.0, -x, -y, -1.0, x * yp, y * yp, yp];
    }

    #[allow(clippy::needless_range_loop)]
    for col in 0..8 {
        let mut max_row = col;
        let mut max_val = m[col][col].abs();
        for row in (col + 1)..8 {
            if m[row][col].abs() > max_val {
                max_val = m[row][col].abs();
                max_row = row;
            }
        }
        if max_val < 1e-10 {
            return None;
        }
        m.swap(col, max_row);
        let pivot = m[col][col];
        for j in col..9 {
            m[col][j] /= pivot;
        }
        for row in 0..8 {
            if row != col {
                let factor = m[row][col];
                for j in col..9 {
                    m[row][j] -= factor * m[col][j];
                }
            }
        }
    }

    let mut h = [0.0f64; 9];
    h[8] = 1.0;
    for i in 0..8 {
        h[i] = -m[i][8];
    }

    Some(Homography::from_rows([
        [h[0] as f32, h[1] as f32, h[2] as f32],
        [h[3] as f32, h[4] as f32, h[5] as f32],
        [h[6] as f32, h[7] as f32, h[8] as f32],
    ]))
}

/// Robust homography estimation via RANSAC over 4-point DLT samples.
///
/// Deterministic: sampling uses a fixed-seed LCG so a given set of
/// correspondences always yields the same model.
pub fn ransac_homography(
    src: &[[f32; 2]],
    dst: &[[f32; 2]],
    iterations: u32,
    threshold: f32,
) -> Option<Homography> {
    if src.len() < 4 {
        return None;
    }
    let n = src.len();
    let mut best_h: Option<Homography> = None;
    let mut best_inliers = 0;
    let mut seed = 12345u64;

    for _ in 0..iterations {
        let mut indices = [0usize; 4];
        for idx in &mut indices {
            seed = seed.wrapping_mul(6364136223846793005).wrapping_add(1);
            *idx = (seed >> 33) as usize % n;
        }
        let s: Vec<[f32; 2]> = indices.iter().map(|&i| src[i]).collect();
        let d: Vec<[f32; 2]> = indices.iter().map(|&i| dst[i]).collect();
        let Some(h) = fit_homography(&s, &d) else {
            continue;
        };
        let inliers = count_inliers(&h, src, dst, threshold);
        if inliers > best_inliers {
            best_inliers = inliers;
            best_h = Some(h);
        }
    }

    trace!(
        inliers = best_inliers,
        total = n,
        "ransac homography estimate"
    );
    best_h
}

fn count_inliers(h: &Homography, src: &[[f32; 2]], dst: &[[f32; 2]], threshold: f32) -> usize {
    let rows = h.to_rows();
    let mut inliers = 0;
    for i in 0..src.len() {
        let [x, y] = src[i];
        let w = rows[2][0] * x + rows[2][1] * y + rows[2][2];
        if w.abs() < 1e-8 {
            continue;
        }
        let px = (rows[0][0] * x + rows[0][1] * y + rows[0][2]) / w;
        let py = (rows[1][0] * x + rows[1][1] * y + rows[1][2]) / w;
        if ((px - dst[i][0]).powi(2) + (py - dst[i][1]).powi(2)).sqrt() < threshold {
            inliers += 1;
        }
    }
    inliers
}
