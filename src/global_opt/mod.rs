//! Bounded global optimization for profile fitting.
//!
//! The fit engine only relies on the [`Optimizer`] trait: a set of bounded,
//! named variables, a scalar objective to minimize, and a [`StopCondition`].
//! Two stochastic implementations are provided, [`RandomShrinkSearch`] (the
//! default) and [`SimulatedAnnealing`].
//!
//! Progress is measured by *satisfaction*, `1 / (1 + score²)`, which maps a
//! zero-target objective onto `(0, 1]`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::error::{Result, WireFitError};

mod random_shrink;
mod simulated_annealing;

pub use random_shrink::RandomShrinkSearch;
pub use simulated_annealing::SimulatedAnnealing;

/// Objective function: lower is better.
pub type Objective<'a> = dyn Fn(&[f64]) -> f64 + Sync + 'a;

/// Trait for bounded global optimizers.
pub trait Optimizer: Sync {
    /// Short human-readable name of the algorithm.
    fn label(&self) -> &str;

    /// Minimize the objective over the bounded variables.
    ///
    /// # Arguments
    ///
    /// * `variables` - The variables to search, with initial values and bounds
    /// * `objective` - The score to minimize, evaluated on values ordered as `variables`
    /// * `stop` - When to stop searching
    ///
    /// # Returns
    ///
    /// * The best assignment found, or `Cancelled` if the stop condition's
    ///   cancel token was set before the search finished
    fn minimize(
        &self,
        variables: &[Variable],
        objective: &Objective<'_>,
        stop: &StopCondition,
    ) -> Result<Solution>;
}

/// Satisfaction of a score against a zero target.
///
/// Non-finite scores have zero satisfaction.
pub fn satisfaction(score: f64) -> f64 {
    if score.is_finite() {
        1.0 / (1.0 + score * score)
    } else {
        0.0
    }
}

/// Lower and upper limits of a variable.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    /// Minimum allowed value
    pub min: f64,

    /// Maximum allowed value
    pub max: f64,
}

impl Bounds {
    /// Create bounds, rejecting `min > max` and non-finite limits.
    pub fn new(min: f64, max: f64) -> Result<Self> {
        if !min.is_finite() || !max.is_finite() {
            return Err(WireFitError::InvalidParameter(format!(
                "bounds must be finite, got [{}, {}]",
                min, max
            )));
        }
        if min > max {
            return Err(WireFitError::InvalidParameter(format!(
                "invalid bounds: min ({}) must not exceed max ({})",
                min, max
            )));
        }

        Ok(Self { min, max })
    }

    /// Bounds that pin a variable to one value.
    pub fn fixed(value: f64) -> Self {
        Self {
            min: value,
            max: value,
        }
    }

    pub fn range(&self) -> f64 {
        self.max - self.min
    }

    pub fn is_fixed(&self) -> bool {
        self.min == self.max
    }

    pub fn clamp(&self, value: f64) -> f64 {
        value.max(self.min).min(self.max)
    }
}

/// A named, bounded search variable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Variable {
    pub name: String,
    pub initial: f64,
    pub bounds: Bounds,
    /// Integer-valued variables are rounded on every proposal.
    pub integer: bool,
}

impl Variable {
    /// Create a continuous variable.
    ///
    /// # Arguments
    ///
    /// * `name` - Variable name, used to read the result back
    /// * `initial` - Starting value; clamped into the bounds
    /// * `min` - Lower limit
    /// * `max` - Upper limit
    pub fn new(name: impl Into<String>, initial: f64, min: f64, max: f64) -> Result<Self> {
        let bounds = Bounds::new(min, max)?;
        Ok(Self {
            name: name.into(),
            initial: bounds.clamp(initial),
            bounds,
            integer: false,
        })
    }

    /// Mark the variable as integer-valued.
    pub fn integer(mut self) -> Self {
        self.integer = true;
        self.initial = self.snap(self.initial);
        self
    }

    /// Bring a proposed value into the variable's domain.
    pub fn snap(&self, value: f64) -> f64 {
        let value = self.bounds.clamp(value);
        if self.integer {
            self.bounds.clamp(value.round())
        } else {
            value
        }
    }
}

/// Shared cancellation flag for long-running fits.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Every clone observes it.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// When an optimizer run ends.
#[derive(Debug, Clone)]
pub struct StopCondition {
    /// Hard wall-clock limit
    pub max_time: Duration,

    /// The run is never stopped for satisfaction before this much time has passed
    pub min_time: Duration,

    /// Stop once the best satisfaction reaches this value
    pub target_satisfaction: f64,

    /// Optional cap on objective evaluations
    pub max_evaluations: Option<usize>,

    /// Optional cancellation flag
    pub cancel: Option<CancelToken>,
}

impl StopCondition {
    /// Time-boxed, satisfaction-based stop condition.
    pub fn time_boxed(max_time: Duration, target_satisfaction: f64) -> Self {
        Self {
            max_time,
            min_time: Duration::ZERO,
            target_satisfaction,
            max_evaluations: None,
            cancel: None,
        }
    }

    pub fn with_min_time(mut self, min_time: Duration) -> Self {
        self.min_time = min_time;
        self
    }

    pub fn with_max_evaluations(mut self, max_evaluations: usize) -> Self {
        self.max_evaluations = Some(max_evaluations);
        self
    }

    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = Some(cancel);
        self
    }
}

/// Why an optimizer run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StopReason {
    /// The target satisfaction was reached
    Satisfied,
    /// The time budget ran out
    TimeExpired,
    /// The evaluation cap was reached
    EvaluationLimit,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            StopReason::Satisfied => "target satisfaction reached",
            StopReason::TimeExpired => "time budget exhausted",
            StopReason::EvaluationLimit => "evaluation limit reached",
        };
        f.write_str(text)
    }
}

/// Best assignment found by an optimizer run.
#[derive(Debug, Clone)]
pub struct Solution {
    names: Vec<String>,
    values: Vec<f64>,

    /// Objective value at the best assignment
    pub score: f64,

    /// Satisfaction of the best score
    pub satisfaction: f64,

    /// Number of objective evaluations
    pub evaluations: usize,

    /// Wall-clock time spent
    pub elapsed: Duration,

    pub reason: StopReason,
}

impl Solution {
    /// Best values, ordered as the variables passed to the optimizer.
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Look up the best value of a variable by name (case-insensitive).
    pub fn value(&self, name: &str) -> Option<f64> {
        self.names
            .iter()
            .position(|n| n.eq_ignore_ascii_case(name))
            .map(|i| self.values[i])
    }
}

impl fmt::Display for Solution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Optimization Result:")?;
        writeln!(f, "  Stop reason: {}", self.reason)?;
        writeln!(f, "  Score: {:.6e}", self.score)?;
        writeln!(f, "  Satisfaction: {:.6}", self.satisfaction)?;
        writeln!(f, "  Evaluations: {}", self.evaluations)?;
        writeln!(f, "  Elapsed: {:?}", self.elapsed)?;
        for (name, value) in self.names.iter().zip(&self.values) {
            writeln!(f, "  {} = {:.6}", name, value)?;
        }
        Ok(())
    }
}

/// Bookkeeping shared by the optimizers: clock, evaluation count and best point.
pub(crate) struct SearchRun<'a> {
    variables: &'a [Variable],
    objective: &'a Objective<'a>,
    stop: &'a StopCondition,
    started: Instant,
    evaluations: usize,
    best_values: Vec<f64>,
    best_score: f64,
}

impl<'a> SearchRun<'a> {
    /// Validate the inputs and score the initial point.
    pub(crate) fn start(
        variables: &'a [Variable],
        objective: &'a Objective<'a>,
        stop: &'a StopCondition,
    ) -> Result<Self> {
        if variables.is_empty() {
            return Err(WireFitError::OptimizationFailed(
                "no variables to optimize".to_string(),
            ));
        }
        if !(stop.target_satisfaction > 0.0 && stop.target_satisfaction <= 1.0) {
            return Err(WireFitError::OptimizationFailed(format!(
                "target satisfaction must be in (0, 1], got {}",
                stop.target_satisfaction
            )));
        }

        let initial: Vec<f64> = variables.iter().map(|v| v.snap(v.initial)).collect();
        let mut run = Self {
            variables,
            objective,
            stop,
            started: Instant::now(),
            evaluations: 0,
            best_values: initial.clone(),
            best_score: f64::INFINITY,
        };
        run.evaluate(&initial);

        Ok(run)
    }

    pub(crate) fn variables(&self) -> &'a [Variable] {
        self.variables
    }

    pub(crate) fn best_values(&self) -> &[f64] {
        &self.best_values
    }

    pub(crate) fn best_score(&self) -> f64 {
        self.best_score
    }

    /// Score a candidate and remember it if it is the best so far.
    pub(crate) fn evaluate(&mut self, values: &[f64]) -> f64 {
        let raw = (self.objective)(values);
        let score = if raw.is_nan() { f64::INFINITY } else { raw };
        self.evaluations += 1;

        if score < self.best_score {
            self.best_score = score;
            self.best_values.copy_from_slice(values);
        }

        score
    }

    /// Check the stop condition.
    ///
    /// Returns `Err(Cancelled)` when the cancel token is set.
    pub(crate) fn check(&self) -> Result<Option<StopReason>> {
        if let Some(cancel) = &self.stop.cancel {
            if cancel.is_cancelled() {
                return Err(WireFitError::Cancelled);
            }
        }

        let elapsed = self.started.elapsed();
        if elapsed >= self.stop.min_time
            && satisfaction(self.best_score) >= self.stop.target_satisfaction
        {
            return Ok(Some(StopReason::Satisfied));
        }
        if elapsed >= self.stop.max_time {
            return Ok(Some(StopReason::TimeExpired));
        }
        if let Some(max) = self.stop.max_evaluations {
            if self.evaluations >= max {
                return Ok(Some(StopReason::EvaluationLimit));
            }
        }

        Ok(None)
    }

    pub(crate) fn finish(self, reason: StopReason) -> Solution {
        Solution {
            names: self.variables.iter().map(|v| v.name.clone()).collect(),
            values: self.best_values,
            score: self.best_score,
            satisfaction: satisfaction(self.best_score),
            evaluations: self.evaluations,
            elapsed: self.started.elapsed(),
            reason,
        }
    }
}

/// Seeded or entropy-backed generator for the stochastic optimizers.
pub(crate) fn make_rng(seed: Option<u64>) -> rand::rngs::StdRng {
    use rand::SeedableRng;

    match seed {
        Some(seed) => rand::rngs::StdRng::seed_from_u64(seed),
        None => rand::rngs::StdRng::from_entropy(),
    }
}
