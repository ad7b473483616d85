//! Random search with per-variable shrinking windows.
//!
//! Each trial changes a random subset of the variables of the current best
//! point (one variable on average). A changed variable draws its new value
//! from its search window most of the time and from its full bounds
//! otherwise. Whenever a trial improves on the best point, the window of every
//! variable that moved is re-centered on the new value with a half-width of
//! three times the move, then clipped to the bounds. Windows therefore shrink
//! as the search converges and grow again if a variable keeps moving far.

use rand::rngs::StdRng;
use rand::Rng;

use crate::error::Result;
use crate::global_opt::{
    make_rng, Objective, Optimizer, SearchRun, Solution, StopCondition, Variable,
};

/// Random shrink search optimizer.
#[derive(Debug, Clone)]
pub struct RandomShrinkSearch {
    /// Half-width of the initial windows as a fraction of each variable's range
    pub initial_delta: f64,

    /// Probability of drawing from the window rather than from the full bounds
    pub shrink_probability: f64,

    /// Window half-width as a multiple of the last improving move
    pub window_scale: f64,

    /// Seed for reproducible runs; `None` seeds from entropy
    pub seed: Option<u64>,
}

impl Default for RandomShrinkSearch {
    fn default() -> Self {
        Self {
            initial_delta: 0.05,
            shrink_probability: 0.9,
            window_scale: 3.0,
            seed: None,
        }
    }
}

/// Search window of one variable.
#[derive(Debug, Clone, Copy)]
struct Window {
    lower: f64,
    upper: f64,
}

impl RandomShrinkSearch {
    /// Create a new RandomShrinkSearch optimizer with default parameters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a fixed seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    fn initial_windows(&self, variables: &[Variable], start: &[f64]) -> Vec<Window> {
        variables
            .iter()
            .zip(start)
            .map(|(variable, &value)| {
                let delta = self.initial_delta * variable.bounds.range();
                Window {
                    lower: variable.bounds.clamp(value - delta),
                    upper: variable.bounds.clamp(value + delta),
                }
            })
            .collect()
    }

    fn propose(&self, variable: &Variable, window: &Window, rng: &mut StdRng) -> f64 {
        let (lower, upper) = if rng.gen::<f64>() < self.shrink_probability {
            (window.lower, window.upper)
        } else {
            (variable.bounds.min, variable.bounds.max)
        };

        variable.snap(lower + rng.gen::<f64>() * (upper - lower))
    }

    /// Fill `candidate` from `best`, changing a random subset of variables.
    ///
    /// At least one variable is always redrawn.
    fn next_point(
        &self,
        variables: &[Variable],
        windows: &[Window],
        best: &[f64],
        candidate: &mut [f64],
        rng: &mut StdRng,
    ) {
        let n = variables.len();
        let mut expected = 1;

        loop {
            candidate.copy_from_slice(best);
            let probability = expected as f64 / n as f64;
            let mut changed = false;

            for i in 0..n {
                if rng.gen::<f64>() <= probability {
                    changed = true;
                    candidate[i] = self.propose(&variables[i], &windows[i], rng);
                }
            }

            if changed {
                return;
            }
            expected = rng.gen_range(1..=n);
        }
    }

    fn update_windows(
        &self,
        variables: &[Variable],
        windows: &mut [Window],
        old: &[f64],
        new: &[f64],
    ) {
        for (i, variable) in variables.iter().enumerate() {
            if old[i] == new[i] {
                continue;
            }

            let half_width = self.window_scale * (new[i] - old[i]).abs();
            windows[i] = Window {
                lower: variable.bounds.clamp(new[i] - half_width),
                upper: variable.bounds.clamp(new[i] + half_width),
            };
        }
    }
}

impl Optimizer for RandomShrinkSearch {
    fn label(&self) -> &str {
        "Random Shrink Search"
    }

    fn minimize(
        &self,
        variables: &[Variable],
        objective: &Objective<'_>,
        stop: &StopCondition,
    ) -> Result<Solution> {
        let mut rng = make_rng(self.seed);
        let mut run = SearchRun::start(variables, objective, stop)?;
        let variables = run.variables();

        let mut best = run.best_values().to_vec();
        let mut best_score = run.best_score();
        let mut windows = self.initial_windows(variables, &best);
        let mut candidate = vec![0.0; variables.len()];

        loop {
            if let Some(reason) = run.check()? {
                return Ok(run.finish(reason));
            }

            self.next_point(variables, &windows, &best, &mut candidate, &mut rng);
            let score = run.evaluate(&candidate);

            if score <= best_score {
                self.update_windows(variables, &mut windows, &best, &candidate);
                best.copy_from_slice(&candidate);
                best_score = score;
            }
        }
    }
}
