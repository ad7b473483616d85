//! Profile fitting.
//!
//! [`FitEngine`] seeds a curve family from the data, hands the bounded
//! parameters and the residual objective to an [`Optimizer`], and turns the
//! best assignment into a [`FitResult`] with the RMS of the fitted shape.
//!
//! The objective is the root of the summed squared residuals between the
//! observed intensities and the full curve (offset included) for every
//! curve family.

use ndarray::Array1;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::{AnalysisConfig, FitConfig};
use crate::error::{Result, WireFitError};
use crate::global_opt::{
    CancelToken, Optimizer, RandomShrinkSearch, StopCondition, StopReason, Variable,
};
use crate::guess::initial_guess;
use crate::models::{FitModel, ModelKind, ProfileShape, TwoGaussian};
use crate::moments::{MomentAnalyzer, Moments};
use crate::preprocess::cut_below;
use crate::profile::{ProfileData, ProfileKey};
use crate::store::ResultStore;

/// Limits of the fit variables.
const AMP_LIMITS: (f64, f64) = (0.0, 50.0);
const SIGMA_LIMITS: (f64, f64) = (1.0, 50.0);
const CENTER_LIMITS: (f64, f64) = (-200.0, 200.0);
const OFFSET_LIMITS: (f64, f64) = (-0.1, 0.1);
const EXPONENT_LIMITS: (f64, f64) = (1.0, 10.0);

/// Points in the display curve when none are requested.
pub const DEFAULT_CURVE_POINTS: usize = 100;

/// How the optimizer run behind a fit went.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FitDiagnostics {
    /// Objective re-evaluated at the fitted parameters
    pub score: f64,
    pub satisfaction: f64,
    pub evaluations: usize,
    pub stop_reason: StopReason,
}

/// A fitted profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitResult {
    model_kind: ModelKind,
    parameters: FitModel,
    rms: f64,
    source: ProfileData,
    diagnostics: Option<FitDiagnostics>,
}

impl FitResult {
    /// Build a result from known parameters, computing the RMS of the shape.
    ///
    /// Used for fits produced elsewhere (e.g. restored sessions); results from
    /// [`FitEngine`] also carry optimizer diagnostics.
    pub fn from_model(
        source: ProfileData,
        model_kind: ModelKind,
        parameters: FitModel,
        analyzer: &MomentAnalyzer,
    ) -> Result<Self> {
        let rms = analyzer.rms(&parameters)?;
        Ok(Self {
            model_kind,
            parameters,
            rms,
            source,
            diagnostics: None,
        })
    }

    pub fn key(&self) -> &ProfileKey {
        self.source.label()
    }

    pub fn model_kind(&self) -> ModelKind {
        self.model_kind
    }

    pub fn parameters(&self) -> &FitModel {
        &self.parameters
    }

    pub fn rms(&self) -> f64 {
        self.rms
    }

    pub fn source(&self) -> &ProfileData {
        &self.source
    }

    pub fn diagnostics(&self) -> Option<&FitDiagnostics> {
        self.diagnostics.as_ref()
    }

    /// Record the raw-sample moments of a profile as a result.
    ///
    /// The record carries the mean as `center` and the moments' RMS; every
    /// amplitude, width and the offset are zero. Density prediction rejects
    /// such a record with `DegenerateFit`.
    pub fn from_statistics(source: ProfileData, moments: Moments) -> Self {
        let parameters = FitModel::TwoGaussian(TwoGaussian {
            amp1: 0.0,
            amp2: 0.0,
            sigma1: 0.0,
            sigma2: 0.0,
            center: moments.mean,
            offset: 0.0,
        });
        Self {
            model_kind: ModelKind::TwoGaussian,
            parameters,
            rms: moments.rms,
            source,
            diagnostics: None,
        }
    }

    /// Reconstructed curve (offset included) over `center ± 5·sigma1`.
    ///
    /// # Arguments
    ///
    /// * `points` - Number of samples
    ///
    /// # Returns
    ///
    /// * Positions and curve values
    pub fn fitted_curve(&self, points: usize) -> (Array1<f64>, Array1<f64>) {
        let model = &self.parameters;
        let half_span = 5.0 * model.sigma1();
        let x = Array1::linspace(
            model.center() - half_span,
            model.center() + half_span,
            points,
        );
        let y = x.mapv(|s| model.value(s));
        (x, y)
    }
}

/// Root of the summed squared residuals of `model` against the samples.
fn residual_norm(model: &impl ProfileShape, positions: &[f64], intensities: &[f64]) -> f64 {
    positions
        .iter()
        .zip(intensities)
        .map(|(&x, &y)| (y - model.value(x)).powi(2))
        .sum::<f64>()
        .sqrt()
}

/// Declare the bounded variables for a fit, ordered as the family's parameter names.
fn fit_variables(kind: ModelKind, seed: &FitModel, fit_offset: bool) -> Result<Vec<Variable>> {
    let single_sided = kind == ModelKind::TwoSuperGaussianSingleSided;
    let seed_values = seed.to_vec();

    kind.parameter_names()
        .iter()
        .zip(seed_values)
        .map(|(&name, initial)| {
            let second = matches!(name, "amp2" | "sigma2" | "n2");
            let (min, max) = match name {
                _ if single_sided && second => (0.0, 0.0),
                "amp1" | "amp2" => AMP_LIMITS,
                "sigma1" | "sigma2" => SIGMA_LIMITS,
                "center" => CENTER_LIMITS,
                "offset" if fit_offset => OFFSET_LIMITS,
                "offset" => (0.0, 0.0),
                "n1" | "n2" => EXPONENT_LIMITS,
                other => {
                    return Err(WireFitError::InvalidParameter(format!(
                        "unknown fit parameter '{}'",
                        other
                    )))
                }
            };

            let variable = Variable::new(name, initial, min, max)?;
            Ok(if name.starts_with('n') {
                variable.integer()
            } else {
                variable
            })
        })
        .collect()
}

/// Drives an [`Optimizer`] to fit profile curves.
#[derive(Debug, Clone)]
pub struct FitEngine<O: Optimizer = RandomShrinkSearch> {
    optimizer: O,
    config: FitConfig,
    analyzer: MomentAnalyzer,
}

impl FitEngine<RandomShrinkSearch> {
    /// Engine with the default optimizer and configuration.
    pub fn new() -> Self {
        Self::with_config(FitConfig::default())
    }

    /// Engine with the default optimizer, seeded from the configuration.
    pub fn with_config(config: FitConfig) -> Self {
        let optimizer = RandomShrinkSearch {
            seed: config.seed,
            ..RandomShrinkSearch::default()
        };
        Self::with_optimizer(optimizer, config)
    }
}

impl Default for FitEngine<RandomShrinkSearch> {
    fn default() -> Self {
        Self::new()
    }
}

impl<O: Optimizer> FitEngine<O> {
    pub fn with_optimizer(optimizer: O, config: FitConfig) -> Self {
        Self {
            optimizer,
            config,
            analyzer: MomentAnalyzer::default(),
        }
    }

    /// Use custom RMS sampling settings.
    pub fn with_analysis(mut self, analysis: &AnalysisConfig) -> Self {
        self.analyzer = MomentAnalyzer::new(analysis);
        self
    }

    pub fn config(&self) -> &FitConfig {
        &self.config
    }

    pub fn optimizer(&self) -> &O {
        &self.optimizer
    }

    /// Fit a profile with an explicit time budget.
    pub fn fit(
        &self,
        data: &ProfileData,
        kind: ModelKind,
        time_budget: Duration,
    ) -> Result<FitResult> {
        self.run(data, kind, time_budget, None)
    }

    /// Fit a profile with the configured (or per-kind default) time budget.
    pub fn fit_default(&self, data: &ProfileData, kind: ModelKind) -> Result<FitResult> {
        self.run(data, kind, self.config.time_budget(kind)?, None)
    }

    /// Fit a profile, aborting with `Cancelled` as soon as `cancel` is set.
    pub fn fit_cancellable(
        &self,
        data: &ProfileData,
        kind: ModelKind,
        time_budget: Duration,
        cancel: &CancelToken,
    ) -> Result<FitResult> {
        self.run(data, kind, time_budget, Some(cancel))
    }

    /// Fit independent profiles in parallel, one result per input, in input order.
    pub fn fit_all(&self, profiles: &[ProfileData], kind: ModelKind) -> Vec<Result<FitResult>> {
        profiles
            .par_iter()
            .map(|data| self.fit_default(data, kind))
            .collect()
    }

    /// Fit a profile and upsert the result into `store`.
    pub fn fit_and_store(
        &self,
        store: &mut ResultStore,
        data: &ProfileData,
        kind: ModelKind,
    ) -> Result<FitResult> {
        let result = self.fit_default(data, kind)?;
        store.store(result.clone());
        Ok(result)
    }

    fn run(
        &self,
        data: &ProfileData,
        kind: ModelKind,
        time_budget: Duration,
        cancel: Option<&CancelToken>,
    ) -> Result<FitResult> {
        self.config.validate()?;
        let min_time = self.config.min_time()?;

        let fitted = match self.config.threshold {
            Some(threshold) => cut_below(data, threshold),
            None => data.clone(),
        };

        if fitted.is_empty() {
            return Err(WireFitError::InsufficientData(format!(
                "{}: no samples to fit",
                data.label()
            )));
        }

        log::debug!(
            "{}: fitting {} with {} ({} points, budget {:?})",
            data.label(),
            kind,
            self.optimizer.label(),
            fitted.len(),
            time_budget
        );

        let seed = initial_guess(&fitted, kind)?;
        let variables = fit_variables(kind, &seed, self.config.fit_offset)?;

        // Owned per-fit copies of the samples
        let positions = fitted.positions().to_vec();
        let intensities = fitted.intensities().to_vec();
        let objective = |values: &[f64]| match kind.model_from_slice(values) {
            FitModel::TwoGaussian(m) => residual_norm(&m, &positions, &intensities),
            FitModel::TwoSuperGaussian(m) => residual_norm(&m, &positions, &intensities),
        };

        let mut stop = StopCondition::time_boxed(time_budget, self.config.target_satisfaction)
            .with_min_time(min_time);
        if let Some(max_evaluations) = self.config.max_evaluations {
            stop = stop.with_max_evaluations(max_evaluations);
        }
        if let Some(cancel) = cancel {
            stop = stop.with_cancel(cancel.clone());
        }

        let solution = self
            .optimizer
            .minimize(&variables, &objective, &stop)
            .map_err(|err| match err {
                WireFitError::Cancelled => WireFitError::Cancelled,
                other => WireFitError::OptimizationFailed(other.to_string()),
            })?;

        let values = variables
            .iter()
            .map(|variable| {
                solution.value(&variable.name).ok_or_else(|| {
                    WireFitError::OptimizationFailed(format!(
                        "solution has no value for '{}'",
                        variable.name
                    ))
                })
            })
            .collect::<Result<Vec<f64>>>()?;

        let parameters = kind.model_from_slice(&values);
        let score = objective(&values);

        log::info!(
            "{}: {} fit finished ({}), score {:.4e}, satisfaction {:.5}, {} evaluations",
            data.label(),
            kind,
            solution.reason,
            score,
            solution.satisfaction,
            solution.evaluations
        );

        let mut result = FitResult::from_model(data.clone(), kind, parameters, &self.analyzer)?;
        result.diagnostics = Some(FitDiagnostics {
            score,
            satisfaction: solution.satisfaction,
            evaluations: solution.evaluations,
            stop_reason: solution.reason,
        });

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TwoSuperGaussian;
    use crate::profile::Direction;

    #[test]
    fn test_gaussian_variables() {
        let seed = FitModel::TwoGaussian(TwoGaussian {
            amp1: 12.0,
            amp2: 6.0,
            sigma1: 0.4,
            sigma2: 0.2,
            center: 250.0,
            offset: 0.0,
        });
        let variables = fit_variables(ModelKind::TwoGaussian, &seed, true).unwrap();

        let names: Vec<&str> = variables.iter().map(|v| v.name.as_str()).collect();
        assert_eq!(names, TwoGaussian::PARAM_NAMES.to_vec());
        // Seeds outside the limits are clamped.
        assert_eq!(variables[2].initial, 1.0);
        assert_eq!(variables[4].initial, 200.0);
        assert_eq!(variables[5].bounds.max, 0.1);
    }

    #[test]
    fn test_single_sided_pins_second_component() {
        let seed = FitModel::TwoSuperGaussian(TwoSuperGaussian {
            amp1: 4.0,
            amp2: 0.0,
            sigma1: 5.0,
            sigma2: 0.0,
            center: 0.0,
            offset: 0.0,
            n1: 5,
            n2: 0,
        });
        let variables =
            fit_variables(ModelKind::TwoSuperGaussianSingleSided, &seed, false).unwrap();

        for variable in &variables {
            match variable.name.as_str() {
                "amp2" | "sigma2" | "n2" | "offset" => assert!(variable.bounds.is_fixed()),
                "n1" => assert!(variable.integer),
                _ => assert!(!variable.bounds.is_fixed()),
            }
        }
    }

    #[test]
    fn test_empty_profile_is_insufficient() {
        let empty =
            ProfileData::new(ProfileKey::new("scan", "WS01", Direction::H), vec![], vec![])
                .unwrap();
        let result = FitEngine::new().fit(&empty, ModelKind::TwoGaussian, Duration::from_secs(1));
        assert!(matches!(result, Err(WireFitError::InsufficientData(_))));
    }

    #[test]
    fn test_fitted_curve_includes_offset() {
        let source = ProfileData::new(
            ProfileKey::new("scan", "WS01", Direction::H),
            vec![0.0],
            vec![1.0],
        )
        .unwrap();
        let model = FitModel::TwoGaussian(TwoGaussian {
            amp1: 1.0,
            amp2: 0.0,
            sigma1: 2.0,
            sigma2: 1.0,
            center: 0.0,
            offset: 0.05,
        });
        let result =
            FitResult::from_model(source, ModelKind::TwoGaussian, model, &MomentAnalyzer::default())
                .unwrap();

        let (x, y) = result.fitted_curve(101);
        assert_eq!(x.len(), 101);
        assert!((x[0] + 10.0).abs() < 1e-12);
        assert!((y[50] - 1.05).abs() < 1e-12);
        assert!(result.diagnostics().is_none());
    }

    #[test]
    fn test_invalid_config_fails_before_fitting() {
        let data = ProfileData::new(
            ProfileKey::new("scan", "WS01", Direction::H),
            vec![-1.0, 0.0, 1.0],
            vec![0.5, 1.0, 0.5],
        )
        .unwrap();

        let negative_min_time = FitEngine::with_config(FitConfig {
            min_time_secs: -1.0,
            ..FitConfig::default()
        });
        assert!(matches!(
            negative_min_time.fit_default(&data, ModelKind::TwoGaussian),
            Err(WireFitError::Config(_))
        ));

        let nan_budget = FitEngine::with_config(FitConfig {
            time_budget_secs: Some(f64::NAN),
            ..FitConfig::default()
        });
        assert!(matches!(
            nan_budget.fit_default(&data, ModelKind::TwoGaussian),
            Err(WireFitError::Config(_))
        ));
    }

    #[test]
    fn test_statistics_record() {
        let source = ProfileData::new(
            ProfileKey::new("scan", "WS01", Direction::V),
            vec![-1.0, 0.0, 1.0],
            vec![1.0, 2.0, 1.0],
        )
        .unwrap();
        let moments = crate::moments::statistical_moments(&source, None).unwrap();
        let result = FitResult::from_statistics(source, moments);

        assert_eq!(result.parameters().center(), 0.0);
        assert!((result.rms() - 0.5_f64.sqrt()).abs() < 1e-12);
        assert_eq!(result.parameters().parameter("amp1"), Some(0.0));
        assert_eq!(result.key().direction, Direction::V);
    }
}
