//! Starting parameters for a profile fit.
//!
//! The seed is read straight off the data: the peak height sets the
//! amplitudes, and the 10%-of-peak edges set the center and width.

use crate::error::{Result, WireFitError};
use crate::models::{FitModel, ModelKind, TwoGaussian, TwoSuperGaussian};
use crate::profile::ProfileData;

/// Fraction of the peak used to locate the profile edges.
const EDGE_FRACTION: f64 = 0.1;

/// Starting exponent for both super-Gaussian components.
const SEED_EXPONENT: u32 = 5;

/// Center and width read from the profile edges.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EdgeEstimate {
    /// Largest intensity in the profile
    pub peak: f64,
    /// Index of the largest intensity
    pub peak_index: usize,
    pub left_edge: f64,
    pub right_edge: f64,
    pub center: f64,
    pub width: f64,
}

/// Locate the peak and the 10%-of-peak edges of a profile.
///
/// # Arguments
///
/// * `data` - A non-empty profile
///
/// # Returns
///
/// * The edge estimate, or `InsufficientData` for an empty profile
pub fn estimate_edges(data: &ProfileData) -> Result<EdgeEstimate> {
    let positions = data.positions();
    let intensities = data.intensities();

    if data.is_empty() {
        return Err(WireFitError::InsufficientData(format!(
            "{}: cannot seed a fit from an empty profile",
            data.label()
        )));
    }

    // Running max starts at zero, so a profile with no positive sample peaks at index 0.
    let mut peak = 0.0;
    let mut peak_index = 0;
    for (i, &value) in intensities.iter().enumerate() {
        if value > peak {
            peak = value;
            peak_index = i;
        }
    }

    let level = peak * EDGE_FRACTION;
    let last = positions.len() - 1;

    let left_edge = intensities
        .iter()
        .position(|&v| v > level)
        .map_or(positions[0], |i| positions[i]);

    let right_edge = intensities[peak_index..]
        .iter()
        .position(|&v| v < level)
        .map_or(positions[last], |i| positions[peak_index + i]);

    let center = left_edge + (right_edge - left_edge) / 2.0;
    let width = (right_edge - center) / 2.0;

    Ok(EdgeEstimate {
        peak,
        peak_index,
        left_edge,
        right_edge,
        center,
        width,
    })
}

/// Derive the seed parameter vector for a fit of the given kind.
///
/// For the single-sided super-Gaussian the second component is zeroed.
pub fn initial_guess(data: &ProfileData, kind: ModelKind) -> Result<FitModel> {
    let edges = estimate_edges(data)?;

    let amp1 = 2.0 * edges.peak;
    let amp2 = amp1 / 2.0;
    let sigma1 = edges.width;
    let sigma2 = sigma1 / 2.0;

    let seed = match kind {
        ModelKind::TwoGaussian => FitModel::TwoGaussian(TwoGaussian {
            amp1,
            amp2,
            sigma1,
            sigma2,
            center: edges.center,
            offset: 0.0,
        }),
        ModelKind::TwoSuperGaussian => FitModel::TwoSuperGaussian(TwoSuperGaussian {
            amp1,
            amp2,
            sigma1,
            sigma2,
            center: edges.center,
            offset: 0.0,
            n1: SEED_EXPONENT,
            n2: SEED_EXPONENT,
        }),
        ModelKind::TwoSuperGaussianSingleSided => FitModel::TwoSuperGaussian(TwoSuperGaussian {
            amp1,
            amp2: 0.0,
            sigma1,
            sigma2: 0.0,
            center: edges.center,
            offset: 0.0,
            n1: SEED_EXPONENT,
            n2: 0,
        }),
    };

    log::debug!("{}: seed {:?}", data.label(), seed);
    Ok(seed)
}
