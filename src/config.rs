//! Configuration for fitting and density analysis.
//!
//! Both configuration structs have defaults matching the standard wire
//! analysis settings and can be loaded from JSON.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{Result, WireFitError};
use crate::models::ModelKind;

/// Options controlling a profile fit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FitConfig {
    /// Time budget override in seconds. Default: per model kind (2 s / 5 s)
    pub time_budget_secs: Option<f64>,

    /// Minimum optimizer run time in seconds. Default: 0
    ///
    /// The interactive wire-analysis tool always searched for at least 1 s
    /// before accepting a satisfied fit; set 1.0 to reproduce that.
    pub min_time_secs: f64,

    /// Satisfaction at which the optimizer stops early. Default: 0.999
    pub target_satisfaction: f64,

    /// Seed for the optimizer. Default: None (entropy)
    pub seed: Option<u64>,

    /// Cap on objective evaluations per fit. Default: None (time only)
    ///
    /// With a seed, a fit that ends on this cap is reproducible regardless
    /// of machine speed.
    pub max_evaluations: Option<usize>,

    /// Drop samples below this intensity before fitting. Default: None
    pub threshold: Option<f64>,

    /// Let the offset vary in [-0.1, 0.1]; otherwise freeze it at 0. Default: true
    pub fit_offset: bool,
}

impl Default for FitConfig {
    fn default() -> Self {
        Self {
            time_budget_secs: None,
            min_time_secs: 0.0,
            target_satisfaction: 0.999,
            seed: None,
            max_evaluations: None,
            threshold: None,
            fit_offset: true,
        }
    }
}

impl FitConfig {
    /// Parse and validate a JSON configuration.
    pub fn from_json(text: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if let Some(budget) = self.time_budget_secs {
            if !budget.is_finite() || budget < 0.0 {
                return Err(WireFitError::Config(format!(
                    "time_budget_secs must be a non-negative number, got {}",
                    budget
                )));
            }
        }
        if !self.min_time_secs.is_finite() || self.min_time_secs < 0.0 {
            return Err(WireFitError::Config(format!(
                "min_time_secs must be a non-negative number, got {}",
                self.min_time_secs
            )));
        }
        if !(self.target_satisfaction > 0.0 && self.target_satisfaction <= 1.0) {
            return Err(WireFitError::Config(format!(
                "target_satisfaction must be in (0, 1], got {}",
                self.target_satisfaction
            )));
        }
        if self.max_evaluations == Some(0) {
            return Err(WireFitError::Config(
                "max_evaluations must be positive".to_string(),
            ));
        }
        if let Some(threshold) = self.threshold {
            if threshold.is_nan() {
                return Err(WireFitError::Config("threshold must not be NaN".to_string()));
            }
        }
        Ok(())
    }

    /// Time budget for a fit of the given kind.
    ///
    /// A negative or non-finite override fails with `Config`.
    pub fn time_budget(&self, kind: ModelKind) -> Result<Duration> {
        match self.time_budget_secs {
            Some(secs) => seconds("time_budget_secs", secs),
            None => Ok(kind.default_time_budget()),
        }
    }

    pub fn min_time(&self) -> Result<Duration> {
        seconds("min_time_secs", self.min_time_secs)
    }
}

fn seconds(name: &str, secs: f64) -> Result<Duration> {
    Duration::try_from_secs_f64(secs).map_err(|err| {
        WireFitError::Config(format!(
            "{} must be a non-negative number of seconds, got {} ({})",
            name, secs, err
        ))
    })
}

/// Numerical settings for RMS and density analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Samples of the fitted curve used for the RMS moment. Default: 200
    pub rms_sample_points: usize,

    /// Half-span of the RMS sampling in units of sigma1. Default: 5
    pub rms_span_sigmas: f64,

    /// Rectangle-rule steps for super-Gaussian normalization. Default: 1000
    pub density_steps: usize,

    /// Half-span of the density integration in units of the RMS. Default: 4
    pub density_span_rms: f64,

    /// Empirical scatter correction applied to target densities. Default: 0.96
    pub scatter_correction: f64,

    /// Reference area for the peaking factor. Default: 1.25e-4
    pub reference_area: f64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            rms_sample_points: 200,
            rms_span_sigmas: 5.0,
            density_steps: 1000,
            density_span_rms: 4.0,
            scatter_correction: 0.96,
            reference_area: 1.25e-4,
        }
    }
}

impl AnalysisConfig {
    /// Parse and validate a JSON configuration.
    pub fn from_json(text: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.rms_sample_points < 2 {
            return Err(WireFitError::Config(format!(
                "rms_sample_points must be at least 2, got {}",
                self.rms_sample_points
            )));
        }
        if self.density_steps == 0 {
            return Err(WireFitError::Config(
                "density_steps must be positive".to_string(),
            ));
        }
        let positive = [
            ("rms_span_sigmas", self.rms_span_sigmas),
            ("density_span_rms", self.density_span_rms),
            ("scatter_correction", self.scatter_correction),
            ("reference_area", self.reference_area),
        ];
        for (name, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(WireFitError::Config(format!(
                    "{} must be a positive number, got {}",
                    name, value
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = FitConfig::from_json(r#"{ "seed": 42, "fit_offset": false }"#).unwrap();
        assert_eq!(config.seed, Some(42));
        assert!(!config.fit_offset);
        assert_eq!(config.target_satisfaction, 0.999);
        assert_eq!(
            config.time_budget(ModelKind::TwoSuperGaussian).unwrap(),
            Duration::from_secs(5)
        );
    }

    #[test]
    fn test_min_time_default_and_override() {
        assert_eq!(FitConfig::default().min_time().unwrap(), Duration::ZERO);

        let config = FitConfig::from_json(r#"{ "min_time_secs": 1.0 }"#).unwrap();
        assert_eq!(config.min_time().unwrap(), Duration::from_secs(1));
    }

    #[test]
    fn test_budget_override() {
        let config = FitConfig {
            time_budget_secs: Some(0.5),
            ..FitConfig::default()
        };
        assert_eq!(
            config.time_budget(ModelKind::TwoGaussian).unwrap(),
            Duration::from_millis(500)
        );
    }

    #[test]
    fn test_bad_durations_are_config_errors() {
        let negative = FitConfig {
            min_time_secs: -1.0,
            ..FitConfig::default()
        };
        assert!(matches!(negative.min_time(), Err(WireFitError::Config(_))));

        let nan = FitConfig {
            time_budget_secs: Some(f64::NAN),
            ..FitConfig::default()
        };
        assert!(matches!(
            nan.time_budget(ModelKind::TwoGaussian),
            Err(WireFitError::Config(_))
        ));

        let no_evaluations = FitConfig {
            max_evaluations: Some(0),
            ..FitConfig::default()
        };
        assert!(matches!(no_evaluations.validate(), Err(WireFitError::Config(_))));
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(matches!(
            FitConfig::from_json(r#"{ "target_satisfaction": 1.5 }"#),
            Err(WireFitError::Config(_))
        ));
        assert!(matches!(
            AnalysisConfig::from_json(r#"{ "density_steps": 0 }"#),
            Err(WireFitError::Config(_))
        ));
        assert!(matches!(
            AnalysisConfig::from_json("{ not json"),
            Err(WireFitError::Json(_))
        ));
    }
}
