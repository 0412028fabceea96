//! Compound transition classifier
//!
//! Multinomial logistic model over stint context: given the current
//! compound, circuit, and conditions, it yields a probability for each
//! candidate next compound. Strategy search uses these probabilities as
//! a historical plausibility prior.

use crate::features::FeatureRow;
use crate::{ModelError, Result};

/// Next-compound classifier queried during strategy scoring
pub trait TransitionModel: Send + Sync {
    /// Class labels, aligned with the output of [`predict_proba`]
    ///
    /// [`predict_proba`]: TransitionModel::predict_proba
    fn classes(&self) -> &[String];

    /// Numeric feature names the model expects in its input row
    fn numeric_features(&self) -> &[String];

    /// Categorical feature names the model expects in its input row
    fn categorical_features(&self) -> &[String];

    /// Class probabilities for one encoded row; sums to 1
    fn predict_proba(&self, row: &FeatureRow) -> Result<Vec<f64>>;
}

/// Fitted multinomial logistic parameters with softmax inference
#[derive(Debug)]
pub struct SoftmaxTransition {
    classes: Vec<String>,
    numeric_features: Vec<String>,
    categorical_features: Vec<String>,
    feature_columns: Vec<String>,
    intercepts: Vec<f64>,
    coefficients: Vec<Vec<f64>>,
}

impl SoftmaxTransition {
    pub fn new(
        classes: Vec<String>,
        numeric_features: Vec<String>,
        categorical_features: Vec<String>,
        feature_columns: Vec<String>,
        intercepts: Vec<f64>,
        coefficients: Vec<Vec<f64>>,
    ) -> Result<Self> {
        if classes.is_empty() {
            return Err(ModelError::InvalidParameter(
                "classifier needs at least one class".to_string(),
            ));
        }
        if intercepts.len() != classes.len() {
            return Err(ModelError::ArityMismatch {
                what: "intercepts".to_string(),
                expected: classes.len(),
                got: intercepts.len(),
            });
        }
        if coefficients.len() != classes.len() {
            return Err(ModelError::ArityMismatch {
                what: "coefficient rows".to_string(),
                expected: classes.len(),
                got: coefficients.len(),
            });
        }
        for (class, row) in classes.iter().zip(&coefficients) {
            if row.len() != feature_columns.len() {
                return Err(ModelError::ArityMismatch {
                    what: format!("coefficients for class {}", class),
                    expected: feature_columns.len(),
                    got: row.len(),
                });
            }
        }
        if intercepts.iter().any(|b| !b.is_finite())
            || coefficients.iter().flatten().any(|c| !c.is_finite())
        {
            return Err(ModelError::NonFinite("classifier coefficient".to_string()));
        }
        Ok(Self {
            classes,
            numeric_features,
            categorical_features,
            feature_columns,
            intercepts,
            coefficients,
        })
    }
}

impl TransitionModel for SoftmaxTransition {
    fn classes(&self) -> &[String] {
        &self.classes
    }

    fn numeric_features(&self) -> &[String] {
        &self.numeric_features
    }

    fn categorical_features(&self) -> &[String] {
        &self.categorical_features
    }

    fn predict_proba(&self, row: &FeatureRow) -> Result<Vec<f64>> {
        let x = row.vector(&self.feature_columns);
        if x.iter().any(|v| !v.is_finite()) {
            return Err(ModelError::NonFinite("input feature".to_string()));
        }

        let scores: Vec<f64> = self
            .intercepts
            .iter()
            .zip(&self.coefficients)
            .map(|(intercept, weights)| {
                intercept + weights.iter().zip(&x).map(|(w, v)| w * v).sum::<f64>()
            })
            .collect();

        // Max-subtracted softmax keeps the exponentials in range.
        let max_score = scores.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        let exps: Vec<f64> = scores.iter().map(|s| (s - max_score).exp()).collect();
        let total: f64 = exps.iter().sum();
        if !total.is_finite() || total <= 0.0 {
            return Err(ModelError::NonFinite("softmax normalizer".to_string()));
        }
        Ok(exps.iter().map(|e| e / total).collect())
    }
}
