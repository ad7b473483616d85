//! Difference of two concentric super-Gaussians.

use serde::{Deserialize, Serialize};

use super::ProfileShape;

/// Two concentric super-Gaussians, the second subtracted from the first:
///
/// f(x) = amp1·exp(-|x-c|^n1/(2σ1^n1)) − amp2·exp(-|x-c|^n2/(2σ2^n2))
///
/// The integer exponents control how flat the profile top is (`n = 2` is an
/// ordinary Gaussian). A single-sided profile has `amp2 = sigma2 = n2 = 0`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TwoSuperGaussian {
    pub amp1: f64,
    pub amp2: f64,
    pub sigma1: f64,
    pub sigma2: f64,
    pub center: f64,
    pub offset: f64,
    pub n1: u32,
    pub n2: u32,
}

impl TwoSuperGaussian {
    /// Parameter names, in the order used by [`TwoSuperGaussian::from_slice`].
    pub const PARAM_NAMES: [&'static str; 8] = [
        "amp1", "amp2", "sigma1", "sigma2", "center", "offset", "n1", "n2",
    ];

    /// Build from values ordered as [`TwoSuperGaussian::PARAM_NAMES`].
    ///
    /// Exponents are rounded to the nearest non-negative integer.
    /// Callers guarantee `values.len() >= 8`.
    pub fn from_slice(values: &[f64]) -> Self {
        Self {
            amp1: values[0],
            amp2: values[1],
            sigma1: values[2],
            sigma2: values[3],
            center: values[4],
            offset: values[5],
            n1: exponent(values[6]),
            n2: exponent(values[7]),
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
            f64::from(self.n1),
            f64::from(self.n2),
        ]
    }

    /// True when the second component is switched off.
    pub fn is_single_sided(&self) -> bool {
        self.amp2 == 0.0 && self.sigma2 == 0.0 && self.n2 == 0
    }
}

fn exponent(value: f64) -> u32 {
    value.round().max(0.0) as u32
}

fn component(amp: f64, sigma: f64, n: u32, d: f64) -> f64 {
    if amp == 0.0 {
        return 0.0;
    }
    let n = n as i32;
    amp * (-d.abs().powi(n) / (2.0 * sigma.powi(n))).exp()
}

impl ProfileShape for TwoSuperGaussian {
    fn shape_value(&self, x: f64) -> f64 {
        let d = x - self.center;
        component(self.amp1, self.sigma1, self.n1, d)
            - component(self.amp2, self.sigma2, self.n2, d)
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

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_exponent_two_is_gaussian() {
        let model = TwoSuperGaussian {
            amp1: 3.0,
            amp2: 0.0,
            sigma1: 2.0,
            sigma2: 0.0,
            center: 1.0,
            offset: 0.0,
            n1: 2,
            n2: 0,
        };
        let expected = 3.0 * (-(2.0_f64 * 2.0) / (2.0 * 4.0)).exp();
        assert_relative_eq!(model.shape_value(3.0), expected);
        assert!(model.is_single_sided());
    }

    #[test]
    fn test_exponents_round() {
        let model = TwoSuperGaussian::from_slice(&[1.0, 0.5, 2.0, 1.0, 0.0, 0.0, 4.6, 1.2]);
        assert_eq!(model.n1, 5);
        assert_eq!(model.n2, 1);
    }
}
