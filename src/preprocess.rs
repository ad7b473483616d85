//! Preprocessing operators for wire-scan profiles.
//!
//! Every operator is a pure transform: it takes a profile by reference and
//! returns a new one. Positions and intensities are always rebuilt together.

use crate::error::{Result, WireFitError};
use crate::profile::ProfileData;

/// Drop the sample at `index`.
///
/// # Arguments
///
/// * `data` - The profile to edit
/// * `index` - Index of the (position, intensity) pair to remove
///
/// # Returns
///
/// * A profile with one sample fewer, or `IndexOutOfRange`
pub fn remove_point(data: &ProfileData, index: usize) -> Result<ProfileData> {
    let len = data.len();
    if index >= len {
        return Err(WireFitError::IndexOutOfRange { index, len });
    }

    let (positions, intensities) = data
        .samples()
        .enumerate()
        .filter(|(i, _)| *i != index)
        .map(|(_, sample)| sample)
        .unzip();

    Ok(data.with_samples(positions, intensities))
}

/// Keep only the samples whose intensity is at or above `threshold`.
///
/// The result may be empty; fitting an empty profile fails with
/// `InsufficientData`.
pub fn cut_below(data: &ProfileData, threshold: f64) -> ProfileData {
    let (positions, intensities) = data
        .samples()
        .filter(|(_, intensity)| *intensity >= threshold)
        .unzip();

    data.with_samples(positions, intensities)
}

/// Shift every position by `-delta`.
pub fn offset_horizontal(data: &ProfileData, delta: f64) -> ProfileData {
    let positions = data.positions().iter().map(|s| s - delta).collect();
    data.with_samples(positions, data.intensities().to_vec())
}

/// Divide every position by `norm`.
///
/// A zero or non-finite divisor fails with `InvalidParameter`.
pub fn normalize_horizontal(data: &ProfileData, norm: f64) -> Result<ProfileData> {
    if norm == 0.0 || !norm.is_finite() {
        return Err(WireFitError::InvalidParameter(format!(
            "horizontal normalization divisor must be finite and nonzero, got {}",
            norm
        )));
    }

    let positions = data.positions().iter().map(|s| s / norm).collect();
    Ok(data.with_samples(positions, data.intensities().to_vec()))
}

/// Scale intensities so that the largest one equals `target_peak`.
///
/// If the largest intensity is zero (or the profile is empty) the data is
/// returned unchanged.
pub fn normalize_vertical(data: &ProfileData, target_peak: f64) -> ProfileData {
    // The running max starts at zero, so an all-negative profile is also left alone.
    let max = data.intensities().iter().fold(0.0_f64, |m, &v| m.max(v));

    if max == 0.0 {
        log::warn!(
            "{}: peak intensity is zero, vertical normalization skipped",
            data.label()
        );
        return data.clone();
    }

    let scale = target_peak / max;
    let intensities = data.intensities().iter().map(|v| v * scale).collect();
    data.with_samples(data.positions().to_vec(), intensities)
}
