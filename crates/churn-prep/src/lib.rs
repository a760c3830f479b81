//! Churn Data Preparation Library
//!
//! Declarative cleaning and feature-derivation pipelines over polars
//! DataFrames, built for a customer-churn CSV export.
//!
//! # Overview
//!
//! The core abstraction is a [`Pipeline`]: an ordered list of
//! [`StepDescriptor`]s, each naming a registered transform plus optional
//! positional/keyword arguments. Steps are data, so a cleaning job can be
//! described in a JSON plan file and replayed against any dataset without
//! code changes.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use churn_prep::{Pipeline, StepDescriptor};
//! use serde_json::json;
//!
//! let pipeline = Pipeline::new(vec![
//!     StepDescriptor::new("drop_cols").with_kwarg("subset", json!(["Emite boletos.1", "ID"])),
//!     StepDescriptor::new("rename_cols"),
//!     StepDescriptor::new("clear_numeric_strings")
//!         .with_kwarg("subset", json!(["receita_mensal", "receita_total"])),
//!     StepDescriptor::new("convert_to_numeric")
//!         .with_kwarg("subset", json!(["receita_mensal", "receita_total"])),
//! ]);
//!
//! let cleaned = pipeline.run(raw_df)?;
//! ```
//!
//! Or from a JSON plan document:
//!
//! ```rust,ignore
//! let pipeline = churn_prep::Pipeline::from_path("plan.json")?;
//! pipeline.validate()?;
//! let cleaned = pipeline.run(raw_df)?;
//! ```
//!
//! # Built-in transforms
//!
//! Cleaning: `drop_cols`, `rename_cols`, `clear_numeric_strings`,
//! `convert_to_numeric`, `convert_to_categoric`.
//! Features: `classify_col`, `create_missing_indicator`,
//! `count_class_frequency`, `create_eq_or_gt_feature`.
//!
//! Custom transforms can be added through [`Registry::register`].

pub mod cleaner;
pub mod error;
pub mod features;
pub mod pipeline;

// Re-exports for convenient access
pub use cleaner::{
    clean_currency_string, clear_numeric_strings, convert_to_categoric, convert_to_numeric,
    drop_cols, normalize_col_name, rename_cols,
};
pub use error::{PrepError, Result as PrepResult, ResultExt};
pub use features::{
    classify_col, count_class_frequency, create_eq_or_gt_feature, create_missing_indicator,
    ClassRange,
};
pub use pipeline::{Pipeline, Registry, StepArgs, StepDescriptor, TransformFn};
