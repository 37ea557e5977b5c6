//! Height remapping curve.
//!
//! A small keyframe spline that maps normalized noise `[0, 1]` to a height
//! weighting. Segments are interpolated with monotone cubic Hermite tangents
//! (Fritsch–Carlson), so a curve whose keys never decrease never overshoots
//! between them.

use serde::{Deserialize, Serialize};

use crate::error::TerrainError;

/// Number of samples in a [`CurveLut`].
pub const LUT_SIZE: usize = 256;

/// A single curve keyframe.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CurveKey {
    /// Input position, normally in `[0, 1]`.
    pub time: f64,
    /// Output value at `time`.
    pub value: f64,
}

/// Keyframe spline used to reshape terrain noise before scaling.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HeightCurve {
    /// Keys ordered by strictly increasing `time`.
    pub keys: Vec<CurveKey>,
}

impl Default for HeightCurve {
    fn default() -> Self {
        Self::linear()
    }
}

impl HeightCurve {
    /// The identity curve `(0, 0) -> (1, 1)`.
    pub fn linear() -> Self {
        Self::from_points(&[(0.0, 0.0), (1.0, 1.0)])
    }

    /// Build a curve from `(time, value)` pairs.
    pub fn from_points(points: &[(f64, f64)]) -> Self {
        Self {
            keys: points
                .iter()
                .map(|&(time, value)| CurveKey { time, value })
                .collect(),
        }
    }

    /// Check that the curve has keys with finite, strictly increasing times.
    pub fn validate(&self) -> Result<(), TerrainError> {
        if self.keys.is_empty() {
            return Err(TerrainError::InvalidCurve("curve has no keys".into()));
        }
        for key in &self.keys {
            if !key.time.is_finite() || !key.value.is_finite() {
                return Err(TerrainError::InvalidCurve(format!(
                    "key ({}, {}) is not finite",
                    key.time, key.value
                )));
            }
        }
        for pair in self.keys.windows(2) {
            if pair[1].time <= pair[0].time {
                return Err(TerrainError::InvalidCurve(format!(
                    "key times must increase strictly: {} follows {}",
                    pair[1].time, pair[0].time
                )));
            }
        }
        Ok(())
    }

    /// Evaluate the curve at `t`, returning a value clamped to `[0, 1]`.
    ///
    /// Inputs before the first key or after the last key take the end key's
    /// value. A curve with no keys evaluates to `t` itself.
    pub fn evaluate(&self, t: f64) -> f64 {
        let t = if t.is_finite() { t } else { 0.0 };
        let Some(first) = self.keys.first() else {
            return t.clamp(0.0, 1.0);
        };
        let last = self.keys[self.keys.len() - 1];

        let value = if self.keys.len() == 1 || t <= first.time {
            first.value
        } else if t >= last.time {
            last.value
        } else {
            let seg = self.keys.partition_point(|k| k.time <= t) - 1;
            let tangents = self.tangents();
            hermite(self.keys[seg], self.keys[seg + 1], tangents[seg], tangents[seg + 1], t)
        };

        if value.is_finite() {
            value.clamp(0.0, 1.0)
        } else {
            0.0
        }
    }

    /// Fritsch–Carlson tangents, one per key.
    fn tangents(&self) -> Vec<f64> {
        let n = self.keys.len();
        if n < 2 {
            return vec![0.0; n];
        }

        let secants: Vec<f64> = self
            .keys
            .windows(2)
            .map(|w| (w[1].value - w[0].value) / (w[1].time - w[0].time))
            .collect();

        let mut m = vec![0.0; n];
        m[0] = secants[0];
        m[n - 1] = secants[n - 2];
        for k in 1..n - 1 {
            let (a, b) = (secants[k - 1], secants[k]);
            m[k] = if a * b <= 0.0 { 0.0 } else { (a + b) * 0.5 };
        }

        for (k, &d) in secants.iter().enumerate() {
            if d == 0.0 {
                m[k] = 0.0;
                m[k + 1] = 0.0;
                continue;
            }
            let alpha = m[k] / d;
            let beta = m[k + 1] / d;
            let len_sq = alpha * alpha + beta * beta;
            if len_sq > 9.0 {
                let tau = 3.0 / len_sq.sqrt();
                m[k] = tau * alpha * d;
                m[k + 1] = tau * beta * d;
            }
        }
        m
    }

    /// Precompute a lookup table for hot-path evaluation.
    pub fn to_lut(&self) -> CurveLut {
        CurveLut::new(self)
    }
}

fn hermite(k0: CurveKey, k1: CurveKey, m0: f64, m1: f64, t: f64) -> f64 {
    let h = k1.time - k0.time;
    let s = (t - k0.time) / h;
    let s2 = s * s;
    let s3 = s2 * s;
    let h00 = 2.0 * s3 - 3.0 * s2 + 1.0;
    let h10 = s3 - 2.0 * s2 + s;
    let h01 = -2.0 * s3 + 3.0 * s2;
    let h11 = s3 - s2;
    h00 * k0.value + h10 * h * m0 + h01 * k1.value + h11 * h * m1
}

/// A [`HeightCurve`] sampled at [`LUT_SIZE`] evenly spaced points over `[0, 1]`.
#[derive(Clone, Debug)]
pub struct CurveLut {
    samples: Vec<f64>,
}

impl CurveLut {
    /// Sample `curve` over `[0, 1]`.
    pub fn new(curve: &HeightCurve) -> Self {
        let samples = (0..LUT_SIZE)
            .map(|i| curve.evaluate(i as f64 / (LUT_SIZE - 1) as f64))
            .collect();
        Self { samples }
    }

    /// Linearly interpolate the table at `t` (clamped to `[0, 1]`).
    pub fn evaluate(&self, t: f64) -> f64 {
        let t = if t.is_finite() { t.clamp(0.0, 1.0) } else { 0.0 };
        let pos = t * (LUT_SIZE - 1) as f64;
        let i = (pos.floor() as usize).min(LUT_SIZE - 2);
        let frac = pos - i as f64;
        self.samples[i] + (self.samples[i + 1] - self.samples[i]) * frac
    }
}
