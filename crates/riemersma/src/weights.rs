//! Precomputed weights for the error history.
//!
//! The curve ramps geometrically from `1` for the oldest remembered error up
//! to roughly `ratio` for the newest one. Each step is rounded to an integer
//! while the unrounded value keeps accumulating, so the rounding error does
//! not compound.

use crate::{Result, RiemersmaError};

/// An immutable, integer-valued geometric weight ramp.
#[derive(Debug, Clone, PartialEq)]
pub struct WeightCurve {
    weights: Vec<f64>,
}

impl WeightCurve {
    /// Builds `len` weights ramping from 1 to `ratio`.
    ///
    /// `len == 1` yields the single weight `1.0`.
    pub fn new(len: usize, ratio: f64) -> Result<Self> {
        if len == 0 {
            return Err(RiemersmaError::InvalidHistoryLength(len));
        }
        if !ratio.is_finite() || ratio <= 0.0 {
            return Err(RiemersmaError::InvalidRatio(ratio));
        }

        let mut weights = Vec::with_capacity(len);
        if len == 1 {
            weights.push(1.0);
        } else {
            let m = (ratio.ln() / (len - 1) as f64).exp();
            let mut v = 1.0_f64;
            for _ in 0..len {
                weights.push(v.round());
                v *= m;
            }
        }
        Ok(Self { weights })
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.weights.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    /// Weight for the `i`-th slot counted from the oldest.
    #[inline]
    pub fn get(&self, i: usize) -> f64 {
        self.weights[i]
    }

    #[inline]
    pub fn as_slice(&self) -> &[f64] {
        &self.weights
    }
}
