//! Error types for the churn-model crate.

use thiserror::Error;

/// The main error type for training and prediction operations.
#[derive(Error, Debug)]
pub enum ModelError {
    /// A configured feature column is missing from the dataset.
    #[error("Feature column '{0}' not found in dataset")]
    MissingFeature(String),

    /// Invalid training configuration.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A numeric feature column could not be read as floats.
    #[error("Feature column '{column}' is not numeric: {reason}")]
    NonNumericFeature { column: String, reason: String },

    /// The training set has no rows or no encoded features.
    #[error("Training set is empty: {0}")]
    EmptyTrainingSet(String),

    /// Label vector does not line up with the feature rows.
    #[error("Label/row mismatch: {rows} feature rows but {labels} labels")]
    LabelMismatch { rows: usize, labels: usize },

    /// Labels must be binary (0 or 1).
    #[error("Invalid label at row {row}: {value} (expected 0 or 1)")]
    InvalidLabel { row: usize, value: u32 },

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Polars error wrapper.
    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for model operations.
pub type Result<T> = std::result::Result<T, ModelError>;
