//! Peak density of a wire from its fitted H and V profiles.
//!
//! For each plane the analyzer picks an evaluation position (the crossing)
//! and turns the fitted shape into a density per particle, `G`. The wire
//! density is then `Np · Gx · Gy`.

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

use crate::config::AnalysisConfig;
use crate::error::{Result, WireFitError};
use crate::models::{FitModel, ProfileShape};
use crate::profile::Direction;
use crate::store::ResultStore;

/// Density of one wire with its per-plane factors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireDensity {
    pub wire: String,
    /// Horizontal evaluation position
    pub x_root: f64,
    /// Vertical evaluation position
    pub y_root: f64,
    /// Horizontal density per particle
    pub gx: f64,
    /// Vertical density per particle
    pub gy: f64,
    /// `np · gx · gy`
    pub wire_density: f64,
}

/// Amplitudes and widths shared by both curve families.
fn components(model: &FitModel) -> (f64, f64, f64, f64) {
    match model {
        FitModel::TwoGaussian(m) => (m.amp1, m.amp2, m.sigma1, m.sigma2),
        FitModel::TwoSuperGaussian(m) => (m.amp1, m.amp2, m.sigma1, m.sigma2),
    }
}

/// Evaluates fitted profiles as particle densities.
#[derive(Debug, Clone)]
pub struct PeakDensityAnalyzer {
    steps: usize,
    span_rms: f64,
}

impl Default for PeakDensityAnalyzer {
    fn default() -> Self {
        Self::new(&AnalysisConfig::default())
    }
}

impl PeakDensityAnalyzer {
    pub fn new(config: &AnalysisConfig) -> Self {
        Self {
            steps: config.density_steps,
            span_rms: config.density_span_rms,
        }
    }

    /// Position at which a fitted profile's density is evaluated.
    ///
    /// Uses the two-Gaussian crossing formula
    /// `center + sqrt(2·σ1²·σ2²/(σ2²−σ1²) · ln(amp1/amp2 · (σ2/σ1)²))`,
    /// falling back to `center` when the radicand is not a positive number
    /// (equal components, `amp2 = 0`, ...).
    pub fn find_crossing(&self, model: &FitModel) -> f64 {
        let (amp1, amp2, sigma1, sigma2) = components(model);
        let center = model.center();

        let s1 = sigma1 * sigma1;
        let s2 = sigma2 * sigma2;
        let radicand = 2.0 * s1 * s2 / (s2 - s1) * (amp1 / amp2 * (s2 / s1)).ln();

        if radicand.is_finite() && radicand > 0.0 {
            center + radicand.sqrt()
        } else {
            center
        }
    }

    /// Density per particle of a fitted profile.
    ///
    /// # Arguments
    ///
    /// * `x` - Evaluation position (used by the Gaussian family)
    /// * `model` - Fitted parameters
    /// * `rms` - RMS width of the fit, bounding the super-Gaussian integration
    ///
    /// # Returns
    ///
    /// * For two Gaussians, the analytically normalized shape at `x`. For
    ///   super-Gaussians, the sampled peak of the shape divided by its area
    ///   over `center ± span·rms`.
    pub fn density_at(&self, x: f64, model: &FitModel, rms: f64) -> Result<f64> {
        match model {
            FitModel::TwoGaussian(m) => {
                let norm = m.amp1 * m.sigma1 - m.amp2 * m.sigma2;
                if norm == 0.0 || !norm.is_finite() {
                    return Err(WireFitError::DegenerateFit(format!(
                        "amp1·sigma1 − amp2·sigma2 is {}, density is undefined",
                        norm
                    )));
                }
                Ok(m.shape_value(x) / ((2.0 * PI).sqrt() * norm))
            }
            FitModel::TwoSuperGaussian(m) => {
                if !(rms.is_finite() && rms > 0.0) {
                    return Err(WireFitError::DegenerateFit(format!(
                        "rms {} cannot bound the density integral",
                        rms
                    )));
                }

                let left = m.center - self.span_rms * rms;
                let step = 2.0 * self.span_rms * rms / self.steps as f64;

                let mut area = 0.0;
                let mut y_max = f64::NEG_INFINITY;
                for i in 0..self.steps {
                    let y = m.shape_value(left + i as f64 * step);
                    if y > y_max {
                        y_max = y;
                    }
                    area += y * step;
                }

                if !(area.is_finite() && area > 0.0) {
                    return Err(WireFitError::DegenerateFit(format!(
                        "integrated profile area is {}",
                        area
                    )));
                }
                Ok(y_max / area)
            }
        }
    }

    /// Density of one wire from the latest H and V fits in the store.
    pub fn wire_density(&self, store: &ResultStore, wire: &str, np: f64) -> Result<WireDensity> {
        let plane = |direction: Direction| -> Result<(f64, f64)> {
            let fit = store
                .find_latest(wire, direction)
                .ok_or_else(|| WireFitError::MissingFit {
                    wire: wire.to_string(),
                    direction: direction.to_string(),
                })?;
            let root = self.find_crossing(fit.parameters());
            let g = self.density_at(root, fit.parameters(), fit.rms())?;
            Ok((root, g))
        };

        let (x_root, gx) = plane(Direction::H)?;
        let (y_root, gy) = plane(Direction::V)?;
        let wire_density = np * gx * gy;

        log::debug!(
            "{}: x root {:.4}, Gx {:.6e}, y root {:.4}, Gy {:.6e}, density {:.6e}",
            wire,
            x_root,
            gx,
            y_root,
            gy,
            wire_density
        );

        Ok(WireDensity {
            wire: wire.to_string(),
            x_root,
            y_root,
            gx,
            gy,
            wire_density,
        })
    }
}
