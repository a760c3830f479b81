//! Logistic regression trained with full-batch gradient descent.
//!
//! The model operates on the dense feature matrix produced by
//! [`crate::encoder::Preprocessor`]; rows are observations, columns are
//! encoded features.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::error::{ModelError, Result};

fn default_learning_rate() -> f64 {
    0.1
}

fn default_epochs() -> usize {
    200
}

fn default_seed() -> u64 {
    42
}

/// Hyperparameters for [`LogisticModel::fit`].
///
/// Every field has a default so a config document may supply only the
/// parameters it wants to override, or omit the block entirely.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitParams {
    #[serde(default = "default_learning_rate")]
    pub learning_rate: f64,
    #[serde(default = "default_epochs")]
    pub epochs: usize,
    /// L2 penalty applied to the weights (not the bias).
    #[serde(default)]
    pub l2: f64,
    #[serde(default = "default_seed")]
    pub seed: u64,
}

impl Default for FitParams {
    fn default() -> Self {
        Self {
            learning_rate: default_learning_rate(),
            epochs: default_epochs(),
            l2: 0.0,
            seed: default_seed(),
        }
    }
}

impl FitParams {
    pub fn validate(&self) -> Result<()> {
        if !(self.learning_rate > 0.0) || !self.learning_rate.is_finite() {
            return Err(ModelError::InvalidConfig(format!(
                "learning_rate must be a positive finite number, got {}",
                self.learning_rate
            )));
        }
        if self.epochs == 0 {
            return Err(ModelError::InvalidConfig(
                "epochs must be at least 1".to_string(),
            ));
        }
        if self.l2 < 0.0 || !self.l2.is_finite() {
            return Err(ModelError::InvalidConfig(format!(
                "l2 must be non-negative and finite, got {}",
                self.l2
            )));
        }
        Ok(())
    }
}

fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}

/// A fitted binary classifier: one weight per encoded feature plus a bias.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogisticModel {
    weights: Vec<f64>,
    bias: f64,
}

impl LogisticModel {
    /// Fits the model on a row-major feature matrix `x` and binary labels
    /// `y` (0 or 1). Weights start from a small seeded random draw so runs
    /// are reproducible for a fixed [`FitParams::seed`].
    pub fn fit(x: &[Vec<f64>], y: &[u32], params: &FitParams) -> Result<Self> {
        params.validate()?;
        if x.is_empty() {
            return Err(ModelError::EmptyTrainingSet(
                "feature matrix has no rows".to_string(),
            ));
        }
        if x.len() != y.len() {
            return Err(ModelError::LabelMismatch {
                rows: x.len(),
                labels: y.len(),
            });
        }
        for (row, &label) in y.iter().enumerate() {
            if label > 1 {
                return Err(ModelError::InvalidLabel { row, value: label });
            }
        }

        let n_rows = x.len();
        let n_cols = x[0].len();
        let mut rng = StdRng::seed_from_u64(params.seed);
        let mut weights: Vec<f64> = (0..n_cols).map(|_| rng.gen_range(-0.01..0.01)).collect();
        let mut bias = 0.0;

        let mut grad_w = vec![0.0; n_cols];
        for _ in 0..params.epochs {
            grad_w.iter_mut().for_each(|g| *g = 0.0);
            let mut grad_b = 0.0;
            for (row, &label) in x.iter().zip(y) {
                let z = bias
                    + row
                        .iter()
                        .zip(&weights)
                        .map(|(v, w)| v * w)
                        .sum::<f64>();
                let residual = sigmoid(z) - f64::from(label);
                for (g, v) in grad_w.iter_mut().zip(row) {
                    *g += residual * v;
                }
                grad_b += residual;
            }
            let scale = params.learning_rate / n_rows as f64;
            for (w, g) in weights.iter_mut().zip(&grad_w) {
                *w -= scale * (g + params.l2 * *w);
            }
            bias -= scale * grad_b;
        }

        Ok(Self { weights, bias })
    }

    /// Predicted probability of the positive class for a single encoded row.
    pub fn predict_row(&self, row: &[f64]) -> f64 {
        let z = self.bias
            + row
                .iter()
                .zip(&self.weights)
                .map(|(v, w)| v * w)
                .sum::<f64>();
        sigmoid(z)
    }

    /// Predicted probabilities for a row-major matrix.
    pub fn predict_proba(&self, x: &[Vec<f64>]) -> Vec<f64> {
        x.iter().map(|row| self.predict_row(row)).collect()
    }

    pub fn n_features(&self) -> usize {
        self.weights.len()
    }
}
