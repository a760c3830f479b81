//! Train and prediction entry points.

use polars::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::TrainConfig;
use crate::encoder::Preprocessor;
use crate::error::{ModelError, Result};
use crate::model::LogisticModel;

/// Controls what [`FittedPipeline::predict`] returns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictOptions {
    /// Probability cutoff for the positive class when labels are requested.
    #[serde(default = "default_threshold")]
    pub threshold: f64,
    #[serde(default = "default_true")]
    pub return_probabilities: bool,
    #[serde(default)]
    pub return_labels: bool,
}

fn default_threshold() -> f64 {
    0.5
}

fn default_true() -> bool {
    true
}

impl Default for PredictOptions {
    fn default() -> Self {
        Self {
            threshold: default_threshold(),
            return_probabilities: true,
            return_labels: false,
        }
    }
}

/// Output of a prediction call; fields mirror [`PredictOptions`] flags.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionResult {
    pub probabilities: Option<Vec<f64>>,
    pub labels: Option<Vec<u32>>,
}

/// A fitted preprocessor plus classifier, ready to score new frames.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FittedPipeline {
    preprocessor: Preprocessor,
    model: LogisticModel,
}

/// Fits the preprocessing state and the classifier on a training frame.
///
/// Feature columns are taken from the config; when `fs_params.select_cols_arr`
/// is present only the listed columns participate.
pub fn train(features: &DataFrame, labels: &Series, config: &TrainConfig) -> Result<FittedPipeline> {
    config.validate()?;
    let (num_features, cat_features) = config.selected_features();
    if num_features.is_empty() && cat_features.is_empty() {
        return Err(ModelError::InvalidConfig(
            "feature selection removed every configured feature".to_string(),
        ));
    }

    let y = label_vector(labels)?;
    if features.height() != y.len() {
        return Err(ModelError::LabelMismatch {
            rows: features.height(),
            labels: y.len(),
        });
    }

    info!(
        rows = features.height(),
        numeric = num_features.len(),
        categorical = cat_features.len(),
        "fitting churn pipeline"
    );

    let preprocessor = Preprocessor::fit(features, &num_features, &cat_features)?;
    let matrix = preprocessor.transform(features)?;
    let model = LogisticModel::fit(&matrix, &y, &config.model_parameters.fit_params)?;

    Ok(FittedPipeline { preprocessor, model })
}

fn label_vector(labels: &Series) -> Result<Vec<u32>> {
    let casted = labels
        .cast(&DataType::UInt32)
        .map_err(|e| ModelError::InvalidConfig(format!("labels must be integer 0/1: {e}")))?;
    let mut out = Vec::with_capacity(casted.len());
    for (row, value) in casted.u32()?.into_iter().enumerate() {
        match value {
            Some(v) if v <= 1 => out.push(v),
            Some(v) => return Err(ModelError::InvalidLabel { row, value: v }),
            None => {
                return Err(ModelError::InvalidConfig(format!(
                    "label at row {row} is null"
                )));
            }
        }
    }
    Ok(out)
}

impl FittedPipeline {
    /// Scores a frame carrying the same feature columns the pipeline was
    /// trained on.
    ///
    /// With both flags off the probabilities are still returned, so a caller
    /// that disables everything gets scores rather than an empty result.
    pub fn predict(&self, features: &DataFrame, options: &PredictOptions) -> Result<PredictionResult> {
        if !(0.0..=1.0).contains(&options.threshold) {
            return Err(ModelError::InvalidConfig(format!(
                "threshold must be within [0, 1], got {}",
                options.threshold
            )));
        }

        let matrix = self.preprocessor.transform(features)?;
        let probabilities = self.model.predict_proba(&matrix);

        let labels = options.return_labels.then(|| {
            probabilities
                .iter()
                .map(|p| u32::from(*p > options.threshold))
                .collect()
        });
        let probabilities = (options.return_probabilities || !options.return_labels)
            .then_some(probabilities);

        Ok(PredictionResult { probabilities, labels })
    }

    pub fn preprocessor(&self) -> &Preprocessor {
        &self.preprocessor
    }
}

static_assertions::assert_impl_all!(FittedPipeline: Send, Sync);
