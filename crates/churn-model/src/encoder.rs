//! Feature encoding for model input.
//!
//! [`Preprocessor`] is fitted once on the training frame and then applied to
//! any frame with the same feature columns. Numeric features are median-filled
//! and standardized; categorical features are mode-filled and one-hot encoded
//! over the categories seen at fit time.

use std::collections::HashMap;

use polars::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::{ModelError, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
struct NumericStats {
    name: String,
    median: f64,
    mean: f64,
    std: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct CategoricalStats {
    name: String,
    mode: String,
    /// Distinct values seen at fit time, sorted for a stable column order.
    categories: Vec<String>,
}

/// Fitted encoding state mapping raw feature columns to a dense matrix.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Preprocessor {
    numeric: Vec<NumericStats>,
    categorical: Vec<CategoricalStats>,
}

fn numeric_values(df: &DataFrame, name: &str) -> Result<Vec<Option<f64>>> {
    let column = df
        .column(name)
        .map_err(|_| ModelError::MissingFeature(name.to_string()))?;
    let casted = column
        .cast(&DataType::Float64)
        .map_err(|e| ModelError::NonNumericFeature {
            column: name.to_string(),
            reason: e.to_string(),
        })?;
    Ok(casted.f64()?.into_iter().collect())
}

fn string_values(df: &DataFrame, name: &str) -> Result<Vec<Option<String>>> {
    let column = df
        .column(name)
        .map_err(|_| ModelError::MissingFeature(name.to_string()))?;
    let casted = column.cast(&DataType::String)?;
    Ok(casted
        .str()?
        .into_iter()
        .map(|v| v.map(|s| s.to_string()))
        .collect())
}

fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

fn string_mode(values: &[String]) -> Option<String> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for value in values {
        *counts.entry(value.as_str()).or_default() += 1;
    }
    // Ties break toward the lexicographically smallest value so fits are
    // deterministic regardless of row order.
    counts
        .into_iter()
        .max_by(|a, b| a.1.cmp(&b.1).then(b.0.cmp(a.0)))
        .map(|(value, _)| value.to_string())
}

impl Preprocessor {
    /// Learns fill values, scaling statistics, and category vocabularies from
    /// the training frame.
    pub fn fit(df: &DataFrame, num_features: &[String], cat_features: &[String]) -> Result<Self> {
        if df.height() == 0 {
            return Err(ModelError::EmptyTrainingSet(
                "training frame has no rows".to_string(),
            ));
        }

        let mut numeric = Vec::with_capacity(num_features.len());
        for name in num_features {
            let observed: Vec<f64> = numeric_values(df, name)?.into_iter().flatten().collect();
            let median = median(&observed);
            let filled: Vec<f64> = numeric_values(df, name)?
                .into_iter()
                .map(|v| v.unwrap_or(median))
                .collect();
            let mean = filled.iter().sum::<f64>() / filled.len() as f64;
            let variance =
                filled.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / filled.len() as f64;
            numeric.push(NumericStats {
                name: name.clone(),
                median,
                mean,
                std: variance.sqrt(),
            });
        }

        let mut categorical = Vec::with_capacity(cat_features.len());
        for name in cat_features {
            let observed: Vec<String> = string_values(df, name)?.into_iter().flatten().collect();
            let mode = string_mode(&observed).unwrap_or_else(|| "Unknown".to_string());
            let mut categories: Vec<String> = observed;
            categories.push(mode.clone());
            categories.sort();
            categories.dedup();
            categorical.push(CategoricalStats {
                name: name.clone(),
                mode,
                categories,
            });
        }

        Ok(Self { numeric, categorical })
    }

    /// Number of columns in the encoded matrix.
    pub fn width(&self) -> usize {
        self.numeric.len()
            + self
                .categorical
                .iter()
                .map(|c| c.categories.len())
                .sum::<usize>()
    }

    /// Column labels of the encoded matrix, in matrix order.
    pub fn feature_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.numeric.iter().map(|n| n.name.clone()).collect();
        for cat in &self.categorical {
            for value in &cat.categories {
                names.push(format!("{}={}", cat.name, value));
            }
        }
        names
    }

    /// Encodes a frame into a row-major matrix using the fitted statistics.
    ///
    /// Categories unseen at fit time encode as all zeros in their block.
    pub fn transform(&self, df: &DataFrame) -> Result<Vec<Vec<f64>>> {
        let height = df.height();
        let mut rows = vec![Vec::with_capacity(self.width()); height];

        for stats in &self.numeric {
            let values = numeric_values(df, &stats.name)?;
            for (row, value) in rows.iter_mut().zip(values) {
                let filled = value.unwrap_or(stats.median);
                let scaled = if stats.std > 0.0 {
                    (filled - stats.mean) / stats.std
                } else {
                    0.0
                };
                row.push(scaled);
            }
        }

        for stats in &self.categorical {
            let values = string_values(df, &stats.name)?;
            for (row, value) in rows.iter_mut().zip(values) {
                let value = value.unwrap_or_else(|| stats.mode.clone());
                for category in &stats.categories {
                    row.push(f64::from(*category == value));
                }
            }
        }

        Ok(rows)
    }
}
