//! Target and window density prediction across wires.
//!
//! Each enabled wire's density is projected to the target and to the window
//! with externally supplied beam-spot area ratios, and the projections are
//! averaged over the enabled wires.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::config::AnalysisConfig;
use crate::density::PeakDensityAnalyzer;
use crate::error::{Result, WireFitError};
use crate::store::ResultStore;

/// Beam-spot area ratios from each wire to the target and to the window.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AreaRatios {
    pub target: HashMap<String, f64>,
    pub window: HashMap<String, f64>,
}

impl AreaRatios {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set both ratios for a wire.
    pub fn insert(&mut self, wire: impl Into<String>, target: f64, window: f64) {
        let wire = wire.into();
        self.target.insert(wire.clone(), target);
        self.window.insert(wire, window);
    }

    fn lookup(&self, wire: &str) -> Result<(f64, f64)> {
        match (self.target.get(wire), self.window.get(wire)) {
            (Some(&target), Some(&window)) => Ok((target, window)),
            _ => Err(WireFitError::MissingAreaRatio(wire.to_string())),
        }
    }
}

/// Projected densities of one wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireEstimate {
    pub wire: String,
    pub wire_density: f64,
    pub window_density: f64,
    pub target_density: f64,
    /// Target density relative to `np` spread over the reference area
    pub peaking_factor: f64,
}

/// Densities of all enabled wires and their averages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateDensity {
    pub per_wire: Vec<WireEstimate>,
    pub avg_target_density: f64,
    pub avg_window_density: f64,
}

/// Averages wire densities into target and window predictions.
#[derive(Debug, Clone)]
pub struct DensityAggregator {
    analyzer: PeakDensityAnalyzer,
    scatter_correction: f64,
    reference_area: f64,
}

impl Default for DensityAggregator {
    fn default() -> Self {
        Self::new(&AnalysisConfig::default())
    }
}

impl DensityAggregator {
    pub fn new(config: &AnalysisConfig) -> Self {
        Self {
            analyzer: PeakDensityAnalyzer::new(config),
            scatter_correction: config.scatter_correction,
            reference_area: config.reference_area,
        }
    }

    pub fn analyzer(&self) -> &PeakDensityAnalyzer {
        &self.analyzer
    }

    /// Project and average precomputed wire densities.
    ///
    /// # Arguments
    ///
    /// * `wire_densities` - `(wire, wire_density)` for each enabled wire
    /// * `np` - Particles in the pulse
    /// * `ratios` - Area ratios for every listed wire
    pub fn aggregate(
        &self,
        wire_densities: &[(String, f64)],
        np: f64,
        ratios: &AreaRatios,
    ) -> Result<AggregateDensity> {
        if wire_densities.is_empty() {
            return Err(WireFitError::NoEnabledWires);
        }
        if !(np.is_finite() && np > 0.0) {
            return Err(WireFitError::InvalidParameter(format!(
                "particle count must be positive, got {}",
                np
            )));
        }

        let per_wire = wire_densities
            .iter()
            .map(|(wire, wire_density)| {
                let (target_ratio, window_ratio) = ratios.lookup(wire)?;
                let target_density = wire_density * target_ratio * self.scatter_correction;
                Ok(WireEstimate {
                    wire: wire.clone(),
                    wire_density: *wire_density,
                    window_density: wire_density * window_ratio,
                    target_density,
                    peaking_factor: target_density / (self.reference_area * np),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let count = per_wire.len() as f64;
        let avg_target_density = per_wire.iter().map(|w| w.target_density).sum::<f64>() / count;
        let avg_window_density = per_wire.iter().map(|w| w.window_density).sum::<f64>() / count;

        log::info!(
            "average density over {} wires: target {:.6e}, window {:.6e}",
            per_wire.len(),
            avg_target_density,
            avg_window_density
        );

        Ok(AggregateDensity {
            per_wire,
            avg_target_density,
            avg_window_density,
        })
    }

    /// Compute each enabled wire's density from the store and aggregate.
    pub fn predict(
        &self,
        store: &ResultStore,
        enabled_wires: &[String],
        np: f64,
        ratios: &AreaRatios,
    ) -> Result<AggregateDensity> {
        if enabled_wires.is_empty() {
            return Err(WireFitError::NoEnabledWires);
        }

        let wire_densities = enabled_wires
            .iter()
            .map(|wire| {
                let density = self.analyzer.wire_density(store, wire, np)?;
                Ok((density.wire, density.wire_density))
            })
            .collect::<Result<Vec<_>>>()?;

        self.aggregate(&wire_densities, np, ratios)
    }
}
