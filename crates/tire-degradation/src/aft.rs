//! Weibull accelerated failure time model
//!
//! Stint length is treated as a survival time: the tire "fails" when
//! degradation forces a pit stop. Under the Weibull AFT parameterization
//!
//! ```text
//! S(t|x) = exp(-(t / lambda(x))^rho)
//! lambda(x) = exp(intercept + beta . x)
//! ```
//!
//! the p-quantile of failure time has the closed form
//! `t_p = lambda(x) * (-ln(1 - p))^(1/rho)`, which is what strategy
//! search queries for the 25th/50th/75th percentile stint lengths.

use crate::features::FeatureRow;
use crate::{ModelError, Result};

/// Survival model queried for failure-time percentiles
pub trait SurvivalModel: Send + Sync {
    /// Percentile of the failure-time distribution at probability `p`,
    /// with `p` in the open interval (0, 1)
    fn percentile(&self, features: &[f64], p: f64) -> Result<f64>;
}

/// Fitted Weibull AFT parameters
#[derive(Debug, Clone)]
pub struct WeibullAft {
    rho: f64,
    intercept: f64,
    coefficients: Vec<f64>,
}

impl WeibullAft {
    pub fn new(rho: f64, intercept: f64, coefficients: Vec<f64>) -> Result<Self> {
        if !rho.is_finite() || rho <= 0.0 {
            return Err(ModelError::InvalidParameter(format!(
                "shape rho must be finite and positive, got {}",
                rho
            )));
        }
        if !intercept.is_finite() || coefficients.iter().any(|c| !c.is_finite()) {
            return Err(ModelError::NonFinite("AFT coefficient".to_string()));
        }
        Ok(Self {
            rho,
            intercept,
            coefficients,
        })
    }

    pub fn rho(&self) -> f64 {
        self.rho
    }

    /// Linear predictor `intercept + beta . x`
    fn linear_predictor(&self, features: &[f64]) -> Result<f64> {
        if features.len() != self.coefficients.len() {
            return Err(ModelError::ArityMismatch {
                what: "feature vector".to_string(),
                expected: self.coefficients.len(),
                got: features.len(),
            });
        }
        let mut eta = self.intercept;
        for (coef, x) in self.coefficients.iter().zip(features) {
            eta += coef * x;
        }
        Ok(eta)
    }
}

impl SurvivalModel for WeibullAft {
    fn percentile(&self, features: &[f64], p: f64) -> Result<f64> {
        if !(p > 0.0 && p < 1.0) {
            return Err(ModelError::InvalidParameter(format!(
                "percentile probability must lie in (0, 1), got {}",
                p
            )));
        }
        if features.iter().any(|x| !x.is_finite()) {
            return Err(ModelError::NonFinite("input feature".to_string()));
        }
        let scale = self.linear_predictor(features)?.exp();
        let quantile = scale * (-(1.0 - p).ln()).powf(1.0 / self.rho);
        if !quantile.is_finite() {
            return Err(ModelError::NonFinite(format!("quantile at p={}", p)));
        }
        Ok(quantile)
    }
}

/// A fitted survival model together with its feature schema and the
/// fallback quantiles to use when a query fails.
pub struct SurvivalBundle {
    pub model: Box<dyn SurvivalModel>,
    /// Numeric feature names the model was trained on
    pub numeric_features: Vec<String>,
    /// Categorical feature names, expanded to one-hot columns at encode time
    pub categorical_features: Vec<String>,
    /// Post-encoding column order expected by the model
    pub feature_columns: Vec<String>,
    /// Optional stored (q25, q50, q75) fallback, in laps
    pub fallback_quantiles: Option<[f64; 3]>,
}

impl std::fmt::Debug for SurvivalBundle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SurvivalBundle")
            .field("numeric_features", &self.numeric_features)
            .field("categorical_features", &self.categorical_features)
            .field("feature_columns", &self.feature_columns)
            .field("fallback_quantiles", &self.fallback_quantiles)
            .finish_non_exhaustive()
    }
}

impl SurvivalBundle {
    /// Encode a row against this bundle's column order and query the model
    pub fn percentile(&self, row: &FeatureRow, p: f64) -> Result<f64> {
        self.model.percentile(&row.vector(&self.feature_columns), p)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_bad_shape() {
        assert!(WeibullAft::new(0.0, 0.0, vec![]).is_err());
        assert!(WeibullAft::new(-1.5, 0.0, vec![]).is_err());
        assert!(WeibullAft::new(f64::NAN, 0.0, vec![]).is_err());
        assert!(WeibullAft::new(1.0, f64::INFINITY, vec![]).is_err());
        assert!(WeibullAft::new(1.0, 0.0, vec![0.1, f64::NAN]).is_err());
    }

    #[test]
    fn test_quantiles_increase_in_p() {
        let model = WeibullAft::new(1.8, 3.2, vec![]).unwrap();
        let q25 = model.percentile(&[], 0.25).unwrap();
        let q50 = model.percentile(&[], 0.50).unwrap();
        let q75 = model.percentile(&[], 0.75).unwrap();
        assert!(q25 < q50 && q50 < q75);
    }

    #[test]
    fn test_scale_is_multiplicative_in_linear_predictor() {
        // Doubling lambda doubles every quantile.
        let base = WeibullAft::new(2.0, 0.0, vec![1.0]).unwrap();
        let q_at_zero = base.percentile(&[0.0], 0.5).unwrap();
        let q_shifted = base.percentile(&[2.0_f64.ln()], 0.5).unwrap();
        assert!((q_shifted - 2.0 * q_at_zero).abs() < 1e-9);
    }

    #[test]
    fn test_known_quantile_at_unit_shape() {
        // rho = 1 degenerates to the exponential: t_50 = lambda * ln 2.
        let model = WeibullAft::new(1.0, 30.0_f64.ln(), vec![]).unwrap();
        let q50 = model.percentile(&[], 0.5).unwrap();
        assert!((q50 - 30.0 * std::f64::consts::LN_2).abs() < 1e-9);
    }

    #[test]
    fn test_non_finite_input_errors() {
        let model = WeibullAft::new(1.0, 0.0, vec![0.5]).unwrap();
        assert!(model.percentile(&[f64::NAN], 0.5).is_err());
    }

    #[test]
    fn test_feature_arity_checked() {
        let model = WeibullAft::new(1.0, 0.0, vec![0.5, 0.5]).unwrap();
        let err = model.percentile(&[1.0], 0.5).unwrap_err();
        assert!(matches!(err, ModelError::ArityMismatch { .. }));
    }

    #[test]
    fn test_bundle_encodes_against_columns() {
        let model = WeibullAft::new(1.0, 0.0, vec![3.0_f64.ln(), 0.0]).unwrap();
        let bundle = SurvivalBundle {
            model: Box::new(model),
            numeric_features: vec!["track_temp".to_string()],
            categorical_features: vec!["circuit".to_string()],
            feature_columns: vec!["circuit_Monza".to_string(), "circuit_Spa".to_string()],
            fallback_quantiles: None,
        };
        let row = FeatureRow::new().categorical("circuit", "Monza");
        // lambda = exp(ln 3) = 3, median = 3 ln 2
        let q50 = bundle.percentile(&row, 0.5).unwrap();
        assert!((q50 - 3.0 * std::f64::consts::LN_2).abs() < 1e-9);
    }
}
