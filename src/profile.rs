//! Wire-scan profile samples and the profile database.
//!
//! A [`ProfileData`] holds the paired position/intensity samples of one wire
//! scan in one direction. The [`ProfileSource`] trait is the seam to whatever
//! loads raw scans; [`ProfileDatabase`] is an in-memory implementation that
//! turns stored wire-scan records into oriented profiles.

use crate::error::{Result, WireFitError};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Scan direction of a profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Direction {
    /// Horizontal
    H,
    /// Vertical
    V,
    /// Diagonal
    D,
}

impl Direction {
    /// The single-letter label used in result tables.
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::H => "H",
            Direction::V => "V",
            Direction::D => "D",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Direction {
    type Err = WireFitError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "H" | "h" => Ok(Direction::H),
            "V" | "v" => Ok(Direction::V),
            "D" | "d" => Ok(Direction::D),
            other => Err(WireFitError::InvalidParameter(format!(
                "unknown scan direction '{}'",
                other
            ))),
        }
    }
}

/// Identifies one profile: the scan file, the wire and the direction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ProfileKey {
    pub file: String,
    pub wire: String,
    pub direction: Direction,
}

impl ProfileKey {
    pub fn new(file: impl Into<String>, wire: impl Into<String>, direction: Direction) -> Self {
        Self {
            file: file.into(),
            wire: wire.into(),
            direction,
        }
    }
}

impl fmt::Display for ProfileKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.file, self.wire, self.direction)
    }
}

/// Paired position/intensity samples for one profile, in scan order.
///
/// The two arrays always have the same length. They are only replaced
/// together, so a position never loses its intensity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileData {
    label: ProfileKey,
    positions: Vec<f64>,
    intensities: Vec<f64>,
}

impl ProfileData {
    /// Create a profile from paired samples.
    ///
    /// # Arguments
    ///
    /// * `label` - The (file, wire, direction) key of the profile
    /// * `positions` - Wire positions in scan order
    /// * `intensities` - Measured signal at each position
    ///
    /// # Returns
    ///
    /// * The profile, or `DimensionMismatch` if the arrays differ in length
    pub fn new(label: ProfileKey, positions: Vec<f64>, intensities: Vec<f64>) -> Result<Self> {
        if positions.len() != intensities.len() {
            return Err(WireFitError::DimensionMismatch(format!(
                "{} positions but {} intensities",
                positions.len(),
                intensities.len()
            )));
        }

        Ok(Self {
            label,
            positions,
            intensities,
        })
    }

    /// Same label, new samples. Used by the preprocessing operators, which
    /// always build both arrays together.
    pub(crate) fn with_samples(&self, positions: Vec<f64>, intensities: Vec<f64>) -> Self {
        debug_assert_eq!(positions.len(), intensities.len());
        Self {
            label: self.label.clone(),
            positions,
            intensities,
        }
    }

    pub fn label(&self) -> &ProfileKey {
        &self.label
    }

    pub fn positions(&self) -> &[f64] {
        &self.positions
    }

    pub fn intensities(&self) -> &[f64] {
        &self.intensities
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Iterate over `(position, intensity)` pairs.
    pub fn samples(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.positions
            .iter()
            .copied()
            .zip(self.intensities.iter().copied())
    }
}

/// Source of raw profiles, e.g. a parsed wire-scan file set.
pub trait ProfileSource {
    /// Fetch the raw profile for one file, wire and direction.
    fn fetch_raw(&self, file: &str, wire: &str, direction: Direction) -> Result<ProfileData>;
}

/// One wire's worth of parsed scan data.
///
/// The harp/scanner reports a horizontal and a vertical position axis and one
/// signal per plane; the diagonal plane shares the vertical position axis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireScanRecord {
    pub file: String,
    pub wire: String,
    pub h_positions: Vec<f64>,
    pub v_positions: Vec<f64>,
    pub x_signal: Vec<f64>,
    pub y_signal: Vec<f64>,
    pub z_signal: Vec<f64>,
}

impl WireScanRecord {
    /// True when the horizontal signal's largest excursion is negative. The
    /// whole record is then inverted so that every profile is peak-up.
    fn inverted(&self) -> bool {
        let mut extreme = 0.0_f64;
        for &value in &self.x_signal {
            if value.abs() > extreme.abs() {
                extreme = value;
            }
        }
        extreme < 0.0
    }

    /// Build the oriented profile for one direction.
    pub fn profile(&self, direction: Direction) -> Result<ProfileData> {
        let (positions, signal, scale) = match direction {
            Direction::H => (&self.h_positions, &self.x_signal, 1.0),
            Direction::V => (&self.v_positions, &self.y_signal, 1.0),
            Direction::D => (&self.v_positions, &self.z_signal, std::f64::consts::SQRT_2),
        };

        if positions.len() != signal.len() {
            return Err(WireFitError::DimensionMismatch(format!(
                "wire {} direction {}: {} positions but {} signal samples",
                self.wire,
                direction,
                positions.len(),
                signal.len()
            )));
        }

        let sign = if self.inverted() { -1.0 } else { 1.0 };
        let positions = positions.iter().map(|s| s * scale).collect();
        let intensities = signal.iter().map(|v| v * sign).collect();

        ProfileData::new(
            ProfileKey::new(self.file.clone(), self.wire.clone(), direction),
            positions,
            intensities,
        )
    }
}

/// In-memory profile database keyed by (file, wire).
#[derive(Debug, Default, Clone)]
pub struct ProfileDatabase {
    records: HashMap<(String, String), WireScanRecord>,
}

impl ProfileDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a record, replacing any previous record for the same file and wire.
    pub fn insert(&mut self, record: WireScanRecord) {
        let key = (record.file.clone(), record.wire.clone());
        self.records.insert(key, record);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl ProfileSource for ProfileDatabase {
    fn fetch_raw(&self, file: &str, wire: &str, direction: Direction) -> Result<ProfileData> {
        let record = self
            .records
            .get(&(file.to_string(), wire.to_string()))
            .ok_or_else(|| WireFitError::ProfileNotFound(format!("{}:{}", file, wire)))?;

        record.profile(direction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn record(x_signal: Vec<f64>) -> WireScanRecord {
        WireScanRecord {
            file: "scan1.txt".to_string(),
            wire: "WS20".to_string(),
            h_positions: vec![-1.0, 0.0, 1.0],
            v_positions: vec![-2.0, 0.0, 2.0],
            x_signal,
            y_signal: vec![0.5, 2.0, 0.5],
            z_signal: vec![0.1, 0.3, 0.1],
        }
    }

    #[test]
    fn test_new_rejects_mismatched_lengths() {
        let key = ProfileKey::new("f", "w", Direction::H);
        let err = ProfileData::new(key, vec![1.0, 2.0], vec![1.0]).unwrap_err();
        assert!(matches!(err, WireFitError::DimensionMismatch(_)));
    }

    #[test]
    fn test_direction_parse() {
        assert_eq!("H".parse::<Direction>().unwrap(), Direction::H);
        assert_eq!("d".parse::<Direction>().unwrap(), Direction::D);
        assert!("X".parse::<Direction>().is_err());
        assert_eq!(Direction::V.to_string(), "V");
    }

    #[test]
    fn test_diagonal_scales_positions() {
        let mut db = ProfileDatabase::new();
        db.insert(record(vec![0.2, 1.0, 0.2]));

        let profile = db.fetch_raw("scan1.txt", "WS20", Direction::D).unwrap();
        assert_relative_eq!(profile.positions()[2], 2.0 * std::f64::consts::SQRT_2);
        assert_relative_eq!(profile.intensities()[1], 0.3);
        assert_eq!(profile.label().direction, Direction::D);
    }

    #[test]
    fn test_negative_signal_is_inverted() {
        let mut db = ProfileDatabase::new();
        db.insert(record(vec![-0.2, -1.0, 0.3]));

        let h = db.fetch_raw("scan1.txt", "WS20", Direction::H).unwrap();
        assert_eq!(h.intensities(), &[0.2, 1.0, -0.3]);

        // The vertical plane follows the horizontal orientation.
        let v = db.fetch_raw("scan1.txt", "WS20", Direction::V).unwrap();
        assert_eq!(v.intensities(), &[-0.5, -2.0, -0.5]);
    }

    #[test]
    fn test_missing_record() {
        let db = ProfileDatabase::new();
        let err = db.fetch_raw("nope", "WS20", Direction::H).unwrap_err();
        assert!(matches!(err, WireFitError::ProfileNotFound(_)));
    }
}
