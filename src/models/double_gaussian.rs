//! Difference of two concentric Gaussians.

use serde::{Deserialize, Serialize};

use super::ProfileShape;

/// Two concentric Gaussians, the second subtracted from the first:
///
/// f(x) = offset + amp1·exp(-(x-c)²/(2σ1²)) − amp2·exp(-(x-c)²/(2σ2²))
///
/// The subtracted core lets the model describe hollow or flat-topped beams
/// while a single Gaussian (`amp2 = 0`) is still representable.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TwoGaussian {
    pub amp1: f64,
    pub amp2: f64,
    pub sigma1: f64,
    pub sigma2: f64,
    pub center: f64,
    pub offset: f64,
}

impl TwoGaussian {
    /// Parameter names, in the order used by [`TwoGaussian::from_slice`].
    pub const PARAM_NAMES: [&'static str; 6] =
        ["amp1", "amp2", "sigma1", "sigma2", "center", "offset"];

    /// Build from values ordered as [`TwoGaussian::PARAM_NAMES`].
    ///
    /// Callers guarantee `values.len() >= 6`.
    pub fn from_slice(values: &[f64]) -> Self {
        Self {
            amp1: values[0],
            amp2: values[1],
            sigma1: values[2],
            sigma2: values[3],
            center: values[4],
            offset: values[5],
        }
    }

    pub fn to_vec(&self) -> Vec<f64> {
        vec![
            self.amp1,
            self.amp2,
            self.sigma1,
            self.sigma2,
            self.center,
            self.offset,
        ]
    }
}

impl ProfileShape for TwoGaussian {
    fn shape_value(&self, x: f64) -> f64 {
        let d2 = (x - self.center) * (x - self.center);
        self.amp1 * (-d2 / (2.0 * self.sigma1 * self.sigma1)).exp()
            - self.amp2 * (-d2 / (2.0 * self.sigma2 * self.sigma2)).exp()
    }

    fn center(&self) -> f64 {
        self.center
    }

    fn sigma1(&self) -> f64 {
        self.sigma1
    }

    fn offset(&self) -> f64 {
        self.offset
    }
}
