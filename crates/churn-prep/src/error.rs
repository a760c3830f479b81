//! Custom error types for the data-preparation pipeline.
//!
//! This module provides the error hierarchy using `thiserror`. Library code
//! returns [`PrepError`]; the CLI boundary converts into `anyhow`.

use thiserror::Error;

/// The main error type for data-preparation operations.
#[derive(Error, Debug)]
pub enum PrepError {
    /// Column was not found in the dataset.
    #[error("Column '{0}' not found in dataset")]
    ColumnNotFound(String),

    /// A step descriptor named a transform that is not registered.
    #[error("Unknown transform '{0}'")]
    UnknownTransform(String),

    /// Supplied step arguments are incompatible with the transform's signature.
    #[error("Argument mismatch for transform '{transform}': {reason}")]
    ArgumentMismatch { transform: String, reason: String },

    /// Type conversion failed.
    #[error("Failed to convert column '{column}' to {target_type}: {reason}")]
    TypeConversionFailed {
        column: String,
        target_type: String,
        reason: String,
    },

    /// A pipeline plan document could not be parsed or validated.
    #[error("Invalid pipeline plan: {0}")]
    InvalidPlan(String),

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Polars error wrapper.
    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with context.
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<PrepError>,
    },
}

impl PrepError {
    /// Add context to an error.
    pub fn with_context(self, context: impl Into<String>) -> Self {
        PrepError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Shorthand for an [`ArgumentMismatch`](Self::ArgumentMismatch) error.
    pub fn mismatch(transform: impl Into<String>, reason: impl Into<String>) -> Self {
        PrepError::ArgumentMismatch {
            transform: transform.into(),
            reason: reason.into(),
        }
    }

    /// Whether this error is an argument-shape mismatch (possibly wrapped).
    pub fn is_mismatch(&self) -> bool {
        match self {
            Self::ArgumentMismatch { .. } => true,
            Self::WithContext { source, .. } => source.is_mismatch(),
            _ => false,
        }
    }
}

/// Result type alias for data-preparation operations.
pub type Result<T> = std::result::Result<T, PrepError>;

/// Extension trait for adding context to Results.
pub trait ResultExt<T> {
    /// Add context to an error result.
    fn context(self, context: impl Into<String>) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, polars::error::PolarsError> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| PrepError::Polars(e).with_context(context))
    }
}
