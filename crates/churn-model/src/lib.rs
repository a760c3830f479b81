//! Churn classification: configuration, encoding, training, and scoring.
//!
//! The crate consumes frames prepared by `churn-prep` and fits a binary
//! classifier over a configured feature list. A [`config::TrainConfig`]
//! document names the numeric and categorical feature columns, optional
//! hyperparameters, and an optional feature-selection subset.
//!
//! # Quick start
//!
//! ```no_run
//! use churn_model::{PredictOptions, TrainConfig, train};
//! use polars::prelude::*;
//!
//! # fn run(features: DataFrame, labels: Series) -> churn_model::ModelResult<()> {
//! let config = TrainConfig::from_path("config/train.json")?;
//! let fitted = train(&features, &labels, &config)?;
//!
//! let result = fitted.predict(&features, &PredictOptions::default())?;
//! println!("{:?}", result.probabilities);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod encoder;
pub mod error;
pub mod model;
pub mod pipeline;

pub use config::{FsParams, ModelFeatures, ModelParameters, TrainConfig};
pub use encoder::Preprocessor;
pub use error::{ModelError, Result as ModelResult};
pub use model::{FitParams, LogisticModel};
pub use pipeline::{FittedPipeline, PredictOptions, PredictionResult, train};
