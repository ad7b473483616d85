//! # wirefit
//!
//! `wirefit` fits wire-scan beam profiles and predicts peak beam density at
//! the target and at the window from the fitted profiles.
//!
//! The library provides:
//! - Profile preprocessing (point removal, thresholding, axis scaling)
//! - Two-Gaussian and two-super-Gaussian curve families with data-driven seeds
//! - A time-boxed fit engine over pluggable bounded global optimizers
//! - RMS widths from fitted curves and from raw samples
//! - An insertion-ordered result store and density prediction across wires
//!
//! ## Basic Usage
//!
//! ```no_run
//! use std::time::Duration;
//! use wirefit::{Direction, FitEngine, ModelKind, ProfileData, ProfileKey};
//!
//! let positions: Vec<f64> = (0..200).map(|i| i as f64 * 0.5).collect();
//! let intensities = positions
//!     .iter()
//!     .map(|x| (-(x - 50.0).powi(2) / 50.0).exp())
//!     .collect();
//! let data = ProfileData::new(
//!     ProfileKey::new("scan.txt", "WS20", Direction::H),
//!     positions,
//!     intensities,
//! )
//! .unwrap();
//!
//! let fit = FitEngine::new()
//!     .fit(&data, ModelKind::TwoGaussian, Duration::from_secs(2))
//!     .unwrap();
//! println!("rms = {}", fit.rms());
//! ```

pub mod aggregate;
pub mod config;
pub mod density;
pub mod error;
pub mod fit;
pub mod global_opt;
pub mod guess;
pub mod models;
pub mod moments;
pub mod preprocess;
pub mod profile;
pub mod store;

// Re-exports for convenience
pub use aggregate::{AggregateDensity, AreaRatios, DensityAggregator, WireEstimate};
pub use config::{AnalysisConfig, FitConfig};
pub use density::{PeakDensityAnalyzer, WireDensity};
pub use error::{Result, WireFitError};
pub use fit::{FitDiagnostics, FitEngine, FitResult};
pub use global_opt::{
    CancelToken, Optimizer, RandomShrinkSearch, SimulatedAnnealing, StopCondition, StopReason,
};
pub use models::{FitModel, ModelKind, ProfileShape, TwoGaussian, TwoSuperGaussian};
pub use moments::{statistical_moments, MomentAnalyzer, Moments};
pub use profile::{
    Direction, ProfileData, ProfileDatabase, ProfileKey, ProfileSource, WireScanRecord,
};
pub use store::{ResultStore, SharedResultStore};

/// Version of the library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
