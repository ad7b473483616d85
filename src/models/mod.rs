//! Profile curve families used for wire-scan fitting.
//!
//! Two families are supported: the difference of two Gaussians and the
//! difference of two super-Gaussians. Both share a center, a pair of
//! amplitudes and widths, and an additive offset.
//!
//! Every model separates its *shape* (the peaked part, without offset) from
//! its displayed *value* (shape plus offset). Fitting compares data with the
//! value; RMS and density analysis work on the shape.

use ndarray::Array1;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

mod double_gaussian;
mod super_gaussian;

pub use double_gaussian::TwoGaussian;
pub use super_gaussian::TwoSuperGaussian;

/// Common interface of the profile curve families.
pub trait ProfileShape {
    /// Evaluate the peaked part of the curve (no offset).
    fn shape_value(&self, x: f64) -> f64;

    /// Center of the profile.
    fn center(&self) -> f64;

    /// Width of the primary component.
    fn sigma1(&self) -> f64;

    /// Additive offset.
    fn offset(&self) -> f64;

    /// Evaluate the full curve, offset included.
    fn value(&self, x: f64) -> f64 {
        self.offset() + self.shape_value(x)
    }

    /// Evaluate the shape at each x value.
    fn eval_shape(&self, x: &Array1<f64>) -> Array1<f64> {
        x.mapv(|x_val| self.shape_value(x_val))
    }
}

/// The curve family requested for a fit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModelKind {
    /// Difference of two Gaussians.
    TwoGaussian,
    /// Difference of two super-Gaussians.
    TwoSuperGaussian,
    /// Super-Gaussian with the second component switched off.
    TwoSuperGaussianSingleSided,
}

impl ModelKind {
    /// Optimizer time budget used when the caller does not supply one.
    pub fn default_time_budget(&self) -> Duration {
        match self {
            ModelKind::TwoGaussian => Duration::from_secs(2),
            ModelKind::TwoSuperGaussian | ModelKind::TwoSuperGaussianSingleSided => {
                Duration::from_secs(5)
            }
        }
    }

    /// Parameter names of the family, in declaration order.
    pub fn parameter_names(&self) -> &'static [&'static str] {
        match self {
            ModelKind::TwoGaussian => &TwoGaussian::PARAM_NAMES,
            ModelKind::TwoSuperGaussian | ModelKind::TwoSuperGaussianSingleSided => {
                &TwoSuperGaussian::PARAM_NAMES
            }
        }
    }

    /// Build a model from values ordered as [`ModelKind::parameter_names`].
    pub fn model_from_slice(&self, values: &[f64]) -> FitModel {
        match self {
            ModelKind::TwoGaussian => FitModel::TwoGaussian(TwoGaussian::from_slice(values)),
            ModelKind::TwoSuperGaussian | ModelKind::TwoSuperGaussianSingleSided => {
                FitModel::TwoSuperGaussian(TwoSuperGaussian::from_slice(values))
            }
        }
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ModelKind::TwoGaussian => "Two Gauss",
            ModelKind::TwoSuperGaussian => "Two Super Gauss",
            ModelKind::TwoSuperGaussianSingleSided => "SuperGauss",
        };
        f.write_str(label)
    }
}

/// Fitted (or seed) parameters of one curve family.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum FitModel {
    TwoGaussian(TwoGaussian),
    TwoSuperGaussian(TwoSuperGaussian),
}

impl FitModel {
    /// Parameter values ordered as the family's parameter names.
    pub fn to_vec(&self) -> Vec<f64> {
        match self {
            FitModel::TwoGaussian(m) => m.to_vec(),
            FitModel::TwoSuperGaussian(m) => m.to_vec(),
        }
    }

    /// Look up one parameter by name.
    pub fn parameter(&self, name: &str) -> Option<f64> {
        let names: &[&str] = match self {
            FitModel::TwoGaussian(_) => &TwoGaussian::PARAM_NAMES,
            FitModel::TwoSuperGaussian(_) => &TwoSuperGaussian::PARAM_NAMES,
        };
        let values = self.to_vec();
        names
            .iter()
            .position(|n| n.eq_ignore_ascii_case(name))
            .map(|i| values[i])
    }

    fn shape(&self) -> &dyn ProfileShape {
        match self {
            FitModel::TwoGaussian(m) => m,
            FitModel::TwoSuperGaussian(m) => m,
        }
    }
}

impl ProfileShape for FitModel {
    fn shape_value(&self, x: f64) -> f64 {
        self.shape().shape_value(x)
    }

    fn center(&self) -> f64 {
        self.shape().center()
    }

    fn sigma1(&self) -> f64 {
        self.shape().sigma1()
    }

    fn offset(&self) -> f64 {
        self.shape().offset()
    }
}
