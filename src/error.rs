use thiserror::Error;

/// Error types for the wirefit library.
#[derive(Error, Debug)]
pub enum WireFitError {
    /// Error for invalid parameter values (for example a zero normalization divisor).
    #[error("Invalid parameter value: {0}")]
    InvalidParameter(String),

    /// A point index outside the profile.
    #[error("Index {index} out of range for profile with {len} points")]
    IndexOutOfRange { index: usize, len: usize },

    /// Not enough samples to run the requested analysis.
    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    /// The fitted curve cannot be integrated or normalized.
    #[error("Degenerate fit: {0}")]
    DegenerateFit(String),

    /// Density aggregation was requested with no wires enabled.
    #[error("No wires enabled for density aggregation")]
    NoEnabledWires,

    /// The fit was cancelled before the optimizer finished.
    #[error("Fit cancelled")]
    Cancelled,

    /// Error reported by the optimizer.
    #[error("Optimization failed: {0}")]
    OptimizationFailed(String),

    /// Error indicating mismatched array lengths.
    #[error("Dimension mismatch: {0}")]
    DimensionMismatch(String),

    /// No stored fit for the wire/direction pair.
    #[error("No stored fit for wire {wire} direction {direction}")]
    MissingFit { wire: String, direction: String },

    /// No area ratio supplied for the wire.
    #[error("No area ratio for wire {0}")]
    MissingAreaRatio(String),

    /// The profile database has no record for the requested key.
    #[error("Profile not found: {0}")]
    ProfileNotFound(String),

    /// Invalid configuration values.
    #[error("Configuration error: {0}")]
    Config(String),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for wirefit operations.
pub type Result<T> = std::result::Result<T, WireFitError>;
