//! Simulated Annealing algorithm for global optimization.
//!
//! This module implements the Simulated Annealing algorithm, a probabilistic
//! technique for finding global minima in complex search spaces. The run is
//! bounded by the same time/satisfaction stop condition as every other
//! optimizer, so the temperature schedule restarts (reheats) whenever it has
//! cooled below `min_temp` and time remains.

use rand::distributions::{Distribution, Uniform};
use rand::Rng;

use crate::error::Result;
use crate::global_opt::{
    make_rng, Objective, Optimizer, SearchRun, Solution, StopCondition, Variable,
};

/// Simulated Annealing algorithm for global optimization.
///
/// Simulated Annealing is a probabilistic technique for finding global minima
/// in complex search spaces. It is inspired by the process of annealing in metallurgy.
#[derive(Debug, Clone)]
pub struct SimulatedAnnealing {
    /// Initial temperature
    pub initial_temp: f64,

    /// Cooling rate
    pub cooling_rate: f64,

    /// Temperature at which the schedule reheats
    pub min_temp: f64,

    /// Step size as a fraction of each variable's range
    pub step_size: f64,

    /// Seed for reproducible runs; `None` seeds from entropy
    pub seed: Option<u64>,
}

impl Default for SimulatedAnnealing {
    fn default() -> Self {
        Self {
            initial_temp: 1.0,
            cooling_rate: 0.999,
            min_temp: 1e-8,
            step_size: 0.05,
            seed: None,
        }
    }
}

impl SimulatedAnnealing {
    /// Create a new SimulatedAnnealing optimizer with default parameters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new SimulatedAnnealing optimizer with custom parameters.
    ///
    /// # Arguments
    ///
    /// * `initial_temp` - Initial temperature
    /// * `cooling_rate` - Cooling rate (0.9-0.999 is typical)
    /// * `step_size` - Step size for perturbations, as a fraction of each range
    pub fn with_params(initial_temp: f64, cooling_rate: f64, step_size: f64) -> Self {
        Self {
            initial_temp,
            cooling_rate,
            step_size,
            ..Self::default()
        }
    }

    /// Use a fixed seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Perturb a solution by adding random values to each parameter.
    ///
    /// # Arguments
    ///
    /// * `variables` - The variables, for bounds and integer snapping
    /// * `solution` - The solution to perturb
    /// * `candidate` - Output buffer for the perturbed solution
    /// * `rng` - Random number generator
    fn perturb_solution(
        &self,
        variables: &[Variable],
        solution: &[f64],
        candidate: &mut [f64],
        rng: &mut impl Rng,
    ) {
        for (i, variable) in variables.iter().enumerate() {
            // Fixed variables stay where they are
            if variable.bounds.is_fixed() {
                candidate[i] = variable.bounds.min;
                continue;
            }

            // Calculate the step size as a fraction of the range; integer
            // variables always get at least one unit of freedom
            let mut step = variable.bounds.range() * self.step_size;
            if variable.integer {
                step = step.max(1.0);
            }

            // Add a random perturbation
            let perturbation = Uniform::new_inclusive(-step, step).sample(rng);
            candidate[i] = variable.snap(solution[i] + perturbation);
        }
    }
}

impl Optimizer for SimulatedAnnealing {
    fn label(&self) -> &str {
        "Simulated Annealing"
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

        // Initialize the walk at the starting point
        let mut current = run.best_values().to_vec();
        let mut current_cost = run.best_score();
        let mut candidate = vec![0.0; variables.len()];

        // Initialize temperature
        let mut temperature = self.initial_temp;

        loop {
            if let Some(reason) = run.check()? {
                return Ok(run.finish(reason));
            }

            // Generate a new candidate solution by perturbing the current solution
            self.perturb_solution(variables, &current, &mut candidate, &mut rng);
            let candidate_cost = run.evaluate(&candidate);

            // Calculate the difference in cost
            let cost_diff = candidate_cost - current_cost;

            // Determine whether to accept the candidate
            let accept = if cost_diff <= 0.0 {
                true
            } else if cost_diff.is_finite() {
                // Worse candidates are accepted with a probability that depends on
                // the current temperature and the cost difference
                let probability = (-cost_diff / temperature).exp();
                rng.gen::<f64>() < probability
            } else {
                false
            };

            if accept {
                current.copy_from_slice(&candidate);
                current_cost = candidate_cost;
            }

            // Cool the temperature, reheating from the best point when frozen
            temperature *= self.cooling_rate;
            if temperature < self.min_temp {
                temperature = self.initial_temp;
                current.copy_from_slice(run.best_values());
                current_cost = run.best_score();
            }
        }
    }
}
