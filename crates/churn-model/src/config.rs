//! Training configuration.
//!
//! [`TrainConfig`] mirrors the persisted configuration document:
//!
//! ```json
//! {
//!   "model_features": {
//!     "NUM_FEATURES": ["receita_mensal", "receita_total"],
//!     "CAT_FEATURES": ["internet", "telefone"]
//!   },
//!   "model_parameters": {
//!     "fit_params": { "learning_rate": 0.1, "epochs": 300 },
//!     "fs_params": { "select_cols_arr": ["receita_mensal", "internet"] }
//!   }
//! }
//! ```
//!
//! `fs_params` is optional; when present, `select_cols_arr` restricts the
//! feature lists before preprocessing.

use crate::error::{ModelError, Result};
use crate::model::FitParams;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Top-level training configuration document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainConfig {
    pub model_features: ModelFeatures,
    pub model_parameters: ModelParameters,
}

/// Feature lists used to build the preprocessor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelFeatures {
    #[serde(rename = "NUM_FEATURES")]
    pub num_features: Vec<String>,

    #[serde(rename = "CAT_FEATURES")]
    pub cat_features: Vec<String>,
}

/// Model hyperparameters and optional feature selection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelParameters {
    #[serde(default)]
    pub fit_params: FitParams,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fs_params: Option<FsParams>,
}

/// Feature-selection parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FsParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub select_cols_arr: Option<Vec<String>>,
}

impl TrainConfig {
    /// Parse a configuration from a JSON document.
    pub fn from_json(doc: &str) -> Result<Self> {
        let config: TrainConfig = serde_json::from_str(doc)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration from a JSON file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let doc = std::fs::read_to_string(path)?;
        Self::from_json(&doc)
    }

    /// Validate feature lists and hyperparameters.
    pub fn validate(&self) -> Result<()> {
        let features = &self.model_features;
        if features.num_features.is_empty() && features.cat_features.is_empty() {
            return Err(ModelError::InvalidConfig(
                "at least one numeric or categorical feature is required".to_string(),
            ));
        }
        for col in &features.num_features {
            if features.cat_features.contains(col) {
                return Err(ModelError::InvalidConfig(format!(
                    "column '{col}' listed as both numeric and categorical"
                )));
            }
        }
        self.model_parameters.fit_params.validate()?;

        if let Some(fs) = &self.model_parameters.fs_params
            && let Some(selected) = &fs.select_cols_arr
            && selected.is_empty()
        {
            return Err(ModelError::InvalidConfig(
                "select_cols_arr must not be empty when present".to_string(),
            ));
        }
        Ok(())
    }

    /// The feature lists after applying `select_cols_arr`, if configured.
    pub fn selected_features(&self) -> (Vec<String>, Vec<String>) {
        let selected = self
            .model_parameters
            .fs_params
            .as_ref()
            .and_then(|fs| fs.select_cols_arr.as_ref());

        match selected {
            Some(keep) => (
                self.model_features
                    .num_features
                    .iter()
                    .filter(|col| keep.contains(*col))
                    .cloned()
                    .collect(),
                self.model_features
                    .cat_features
                    .iter()
                    .filter(|col| keep.contains(*col))
                    .cloned()
                    .collect(),
            ),
            None => (
                self.model_features.num_features.clone(),
                self.model_features.cat_features.clone(),
            ),
        }
    }
}
