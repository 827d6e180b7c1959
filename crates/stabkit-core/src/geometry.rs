//! Projective geometry for inter-frame camera motion.

use glam::{Mat3, Vec2, Vec3};
use std::ops::Mul;

/// 3x3 homogeneous transform mapping image-plane coordinates between frames.
///
/// Stored as a `glam::Mat3`; `a * b` is the literal matrix product, so a
/// chain written `t0 * t1 * t2` multiplies left-to-right in that order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Homography(Mat3);

impl Homography {
    /// Identity transform.
    pub const IDENTITY: Self = Self(Mat3::IDENTITY);

    /// Build from row-major 3x3 coefficients.
    pub fn from_rows(rows: [[f32; 3]; 3]) -> Self {
        Self(Mat3::from_cols(
            Vec3::new(rows[0][0], rows[1][0], rows[2][0]),
            Vec3::new(rows[0][1], rows[1][1], rows[2][1]),
            Vec3::new(rows[0][2], rows[1][2], rows[2][2]),
        ))
    }

    /// Row-major 3x3 coefficients.
    pub fn to_rows(self) -> [[f32; 3]; 3] {
        let m = self.0;
        [
            [m.x_axis.x, m.y_axis.x, m.z_axis.x],
            [m.x_axis.y, m.y_axis.y, m.z_axis.y],
            [m.x_axis.z, m.y_axis.z, m.z_axis.z],
        ]
    }

    /// Pure translation transform.
    pub fn translation(dx: f32, dy: f32) -> Self {
        Self(Mat3::from_translation(Vec2::new(dx, dy)))
    }

    /// Wrap a raw matrix.
    pub fn from_mat3(m: Mat3) -> Self {
        Self(m)
    }

    /// Underlying matrix.
    pub fn to_mat3(self) -> Mat3 {
        self.0
    }

    /// Matrix determinant.
    pub fn determinant(self) -> f32 {
        self.0.determinant()
    }

    /// Inverse, or `None` when |det| falls below `min_determinant`.
    ///
    /// `glam` computes an inverse unconditionally, so the caller-supplied
    /// threshold is the only guard against an ill-conditioned result.
    pub fn try_inverse(self, min_determinant: f32) -> Option<Self> {
        if self.determinant().abs() < min_determinant {
            return None;
        }
        Some(Self(self.0.inverse()))
    }

    /// Project a point through the homography with perspective divide.
    ///
    /// Returns `None` when the homogeneous w vanishes.
    pub fn project(self, p: Vec2) -> Option<Vec2> {
        let v = self.0 * Vec3::new(p.x, p.y, 1.0);
        if v.z.abs() < 1e-8 {
            return None;
        }
        Some(Vec2::new(v.x / v.z, v.y / v.z))
    }

    /// Maximum absolute difference of coefficients, for tolerance checks.
    pub fn max_abs_diff(self, other: Self) -> f32 {
        let a = self.to_rows();
        let b = other.to_rows();
        let mut max = 0.0f32;
        for r in 0..3 {
            for c in 0..3 {
                max = max.max((a[r][c] - b[r][c]).abs());
            }
        }
        max
    }
}

impl Default for Homography {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Mul for Homography {
    type Output = Self;

    #[inline]
    fn mul(self, rhs: Self) -> Self {
        Self(self.0 * rhs.0)
    }
}
