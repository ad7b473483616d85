//! RMS width of fitted curves and raw profiles.
//!
//! The RMS of a fit is the second central moment of the fitted *shape*
//! (offset excluded), sampled uniformly over `center ± span·sigma1`.

use ndarray::Array1;

use crate::config::AnalysisConfig;
use crate::error::{Result, WireFitError};
use crate::models::ProfileShape;
use crate::profile::ProfileData;

/// Intensity-weighted mean and RMS.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Moments {
    pub mean: f64,
    pub rms: f64,
}

/// Weighted first and second central moments of `y` over `x`.
///
/// # Arguments
///
/// * `x` - Sample positions
/// * `y` - Weights (curve values or intensities)
///
/// # Returns
///
/// * The moments, or `DegenerateFit` when the total weight is zero or the
///   variance is negative or not finite
pub fn weighted_moments(x: &Array1<f64>, y: &Array1<f64>) -> Result<Moments> {
    if x.len() != y.len() {
        return Err(WireFitError::DimensionMismatch(format!(
            "{} positions but {} weights",
            x.len(),
            y.len()
        )));
    }

    let total = y.sum();
    if total == 0.0 || !total.is_finite() {
        return Err(WireFitError::DegenerateFit(format!(
            "total weight is {}, moments are undefined",
            total
        )));
    }

    let mean = x.dot(y) / total;
    let variance = (x.mapv(|s| (s - mean).powi(2)) * y).sum() / total;

    // Curves with a deep subtracted core can have negative weights
    if !(variance.is_finite() && variance >= 0.0) {
        return Err(WireFitError::DegenerateFit(format!(
            "variance is {}, RMS is undefined",
            variance
        )));
    }

    Ok(Moments {
        mean,
        rms: variance.sqrt(),
    })
}

/// Computes RMS widths of fitted curves.
#[derive(Debug, Clone)]
pub struct MomentAnalyzer {
    sample_points: usize,
    span_sigmas: f64,
}

impl Default for MomentAnalyzer {
    fn default() -> Self {
        Self::new(&AnalysisConfig::default())
    }
}

impl MomentAnalyzer {
    pub fn new(config: &AnalysisConfig) -> Self {
        Self {
            sample_points: config.rms_sample_points,
            span_sigmas: config.rms_span_sigmas,
        }
    }

    /// Positions at which the fitted curve is sampled: `sample_points` equal
    /// steps starting at `center - span·sigma1`.
    pub fn sample_positions(&self, model: &impl ProfileShape) -> Array1<f64> {
        let half_span = self.span_sigmas * model.sigma1();
        let start = model.center() - half_span;
        let step = 2.0 * half_span / self.sample_points as f64;

        Array1::from_iter((0..self.sample_points).map(|i| start + i as f64 * step))
    }

    /// Mean and RMS of the fitted shape.
    pub fn moments(&self, model: &impl ProfileShape) -> Result<Moments> {
        if !(model.center().is_finite() && model.sigma1().is_finite()) {
            return Err(WireFitError::DegenerateFit(format!(
                "center {} / sigma1 {} are not finite",
                model.center(),
                model.sigma1()
            )));
        }

        let x = self.sample_positions(model);
        let y = model.eval_shape(&x);
        weighted_moments(&x, &y)
    }

    /// RMS width of the fitted shape.
    pub fn rms(&self, model: &impl ProfileShape) -> Result<f64> {
        Ok(self.moments(model)?.rms)
    }
}

/// RMS width of a fitted curve with the default sampling.
pub fn rms(model: &impl ProfileShape) -> Result<f64> {
    MomentAnalyzer::default().rms(model)
}

/// Intensity-weighted mean and RMS of the raw samples.
///
/// With a threshold, only samples at or above it contribute.
pub fn statistical_moments(data: &ProfileData, threshold: Option<f64>) -> Result<Moments> {
    let (x, y): (Vec<f64>, Vec<f64>) = data
        .samples()
        .filter(|(_, v)| threshold.map_or(true, |t| *v >= t))
        .unzip();

    if x.is_empty() {
        return Err(WireFitError::InsufficientData(format!(
            "{}: no samples for statistical RMS",
            data.label()
        )));
    }

    weighted_moments(&Array1::from_vec(x), &Array1::from_vec(y))
}
