//! Weighted composition of a window of pairwise transforms.

use crate::estimator::PairwiseMotion;
use crate::ring_buffer::RingBuffer;
use glam::Mat3;
use stabkit_core::{Homography, Result, StabError};

/// Normalized Gaussian weights over the `2H + 1` window positions.
///
/// Computed once at pipeline construction; `sigma = 0.35 * (windowSize - 2)`,
/// i.e. `0.7 * H`.
#[derive(Debug, Clone)]
pub struct WeightVector(Vec<f32>);

impl WeightVector {
    pub fn gaussian(half_window: usize) -> Self {
        let len = 2 * half_window + 1;
        let sigma = 0.7 * half_window as f32;
        let denom = 2.0 * sigma * sigma;
        let mut weights: Vec<f32> = (0..len)
            .map(|j| {
                let d = j as f32 - half_window as f32;
                (-d * d / denom).exp()
            })
            .collect();
        let sum: f32 = weights.iter().sum();
        for w in &mut weights {
            *w /= sum;
        }
        Self(weights)
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Result of composing one full window.
#[derive(Debug, Clone, Copy)]
pub struct ComposedTransform {
    /// `S`: maps the center frame to its smoothed reference position.
    pub smoothing: Homography,
    /// The weighted accumulation `Acc = S^-1`. Because the warp primitive
    /// samples source coordinates from output coordinates, this is the
    /// matrix handed to it.
    pub sampling: Homography,
}

/// Collapses a window of `2H + 1` pairwise transforms into the single
/// smoothing homography for the window's center frame.
///
/// With window position `j` in `[0, 2H]` and center `c = H`, each frame's
/// contribution expressed in the center frame's coordinates is:
/// - `j == c`: identity
/// - `j <  c`: the chained product `T[j] * T[j+1] * ... * T[c-1]`
/// - `j >  c`: the inverse of `T[c] * T[c+1] * ... * T[j-1]`
///
/// The contributions are accumulated as a literal weighted sum of matrix
/// entries (a linear smoothing approximation, not a manifold average),
/// and the output is the inverse of that accumulation.
pub struct TransformComposer {
    weights: WeightVector,
    half_window: usize,
    min_determinant: f32,
}

impl TransformComposer {
    pub fn new(half_window: usize, min_determinant: f32) -> Result<Self> {
        if half_window < 1 {
            return Err(StabError::Configuration(
                "half_window must be at least 1".into(),
            ));
        }
        Ok(Self {
            weights: WeightVector::gaussian(half_window),
            half_window,
            min_determinant,
        })
    }

    pub fn weights(&self) -> &WeightVector {
        &self.weights
    }

    /// Compose one full window.
    ///
    /// `transforms` holds the newest pairwise transform at the head, so
    /// window position `j` (0 = oldest pair) lives `2H - j` behind it.
    pub fn compose(&self, transforms: &RingBuffer<PairwiseMotion>) -> Result<ComposedTransform> {
        let c = self.half_window;
        let n = 2 * c + 1;
        debug_assert_eq!(transforms.capacity(), n);
        let t = |j: usize| -> Result<Homography> { Ok(transforms.at(n - 1 - j)?.transform) };

        let mut acc = Mat3::ZERO;
        for (j, &weight) in self.weights.as_slice().iter().enumerate() {
            let contribution = if j == c {
                Homography::IDENTITY
            } else if j < c {
                let mut chain = t(j)?;
                for k in (j + 1)..c {
                    chain = chain * t(k)?;
                }
                chain
            } else {
                let mut chain = t(c)?;
                for k in (c + 1)..j {
                    chain = chain * t(k)?;
                }
                chain
                    .try_inverse(self.min_determinant)
                    .ok_or(StabError::SingularTransform {
                        determinant: chain.determinant(),
                    })?
            };
            acc = acc + contribution.to_mat3() * weight;
        }

        let sampling = Homography::from_mat3(acc);
        let smoothing =
            sampling
                .try_inverse(self.min_determinant)
                .ok_or(StabError::SingularTransform {
                    determinant: sampling.determinant(),
                })?;
        Ok(ComposedTransform {
            smoothing,
            sampling,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn window(motions: &[PairwiseMotion]) -> RingBuffer<PairwiseMotion> {
        // Oldest first, matching how the pipeline fills the buffer.
        let mut rb = RingBuffer::new(motions.len(), PairwiseMotion::default).unwrap();
        for (i, &m) in motions.iter().enumerate() {
            if i > 0 {
                rb.age();
            }
            *rb.current_mut() = m;
        }
        rb
    }

    #[test]
    fn test_weights_normalized() {
        for h in 1..=4 {
            let w = WeightVector::gaussian(h);
            assert_eq!(w.len(), 2 * h + 1);
            let sum: f32 = w.as_slice().iter().sum();
            assert!((sum - 1.0).abs() < 1e-5, "H={h}: sum={sum}");
        }
    }

    #[test]
    fn test_weights_symmetric_peak_at_center() {
        let w = WeightVector::gaussian(3);
        let s = w.as_slice();
        for i in 0..3 {
            assert!((s[i] - s[6 - i]).abs() < 1e-6);
            assert!(s[i] < s[3]);
        }
    }

    #[test]
    fn test_identity_window_composes_to_identity() {
        let composer = TransformComposer::new(2, 1e-6).unwrap();
        let rb = window(&[PairwiseMotion::default(); 5]);
        let composed = composer.compose(&rb).unwrap();
        assert!(composed.smoothing.max_abs_diff(Homography::IDENTITY) < 1e-5);
        assert!(composed.sampling.max_abs_diff(Homography::IDENTITY) < 1e-5);
    }

    #[test]
    fn test_hand_computed_window() {
        // H = 1: contributions are T0, identity, inverse(T1); the newest
        // transform T2 only matters once the window slides.
        let t0 = Homography::translation(2.0, 0.0);
        let t1 = Homography::translation(0.0, 4.0);
        let t2 = Homography::translation(9.0, 9.0);
        let composer = TransformComposer::new(1, 1e-6).unwrap();
        let w = composer.weights().as_slice().to_vec();
        let rb = window(&[
            PairwiseMotion::measured(t0),
            PairwiseMotion::measured(t1),
            PairwiseMotion::measured(t2),
        ]);

        let composed = composer.compose(&rb).unwrap();

        // Affine translations with weights summing to 1 accumulate into
        // a translation of the weighted offsets.
        let expected_acc = Homography::translation(2.0 * w[0], -4.0 * w[2]);
        let expected_s = Homography::translation(-2.0 * w[0], 4.0 * w[2]);
        assert!(composed.sampling.max_abs_diff(expected_acc) < 1e-4);
        assert!(composed.smoothing.max_abs_diff(expected_s) < 1e-4);
    }

    #[test]
    fn test_chain_operand_order() {
        // H = 2, j = 0 must chain T0 * T1 in that order; scale and
        // translation do not commute, so a swap changes the result.
        let scale2 =
            Homography::from_rows([[2.0, 0.0, 0.0], [0.0, 2.0, 0.0], [0.0, 0.0, 1.0]]);
        let shift = Homography::translation(1.0, 0.0);
        let motions = [
            PairwiseMotion::measured(scale2),
            PairwiseMotion::measured(shift),
            PairwiseMotion::measured(shift),
            PairwiseMotion::measured(scale2),
            PairwiseMotion::measured(shift),
        ];
        let composer = TransformComposer::new(2, 1e-6).unwrap();
        let w = composer.weights().as_slice().to_vec();
        let composed = composer.compose(&window(&motions)).unwrap();

        // Reference accumulation built directly from the definition.
        let contributions = [
            scale2 * shift,
            shift,
            Homography::IDENTITY,
            shift.try_inverse(1e-6).unwrap(),
            (shift * scale2).try_inverse(1e-6).unwrap(),
        ];
        let mut acc = glam::Mat3::ZERO;
        for (contribution, weight) in contributions.iter().zip(&w) {
            acc = acc + contribution.to_mat3() * *weight;
        }
        let expected = Homography::from_mat3(acc);
        assert!(composed.sampling.max_abs_diff(expected) < 1e-4);
    }

    #[test]
    fn test_singular_window_reports_error() {
        let zero = Homography::from_rows([[0.0; 3]; 3]);
        let motions = [PairwiseMotion::measured(zero); 3];
        let composer = TransformComposer::new(1, 1e-6).unwrap();
        let err = composer.compose(&window(&motions)).unwrap_err();
        assert!(matches!(err, StabError::SingularTransform { .. }));
    }

    #[test]
    fn test_degenerate_half_window_rejected() {
        assert!(TransformComposer::new(0, 1e-6).is_err());
    }

    mod props {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn weights_sum_to_one(h in 1usize..=16) {
                let sum: f32 = WeightVector::gaussian(h).as_slice().iter().sum();
                prop_assert!((sum - 1.0).abs() < 1e-5);
            }
        }
    }
}
