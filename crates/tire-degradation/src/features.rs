//! Model feature encoding
//!
//! Fitted models carry the exact feature-column order they were trained
//! on. A [`FeatureRow`] collects named numeric features and one-hot
//! categorical indicators, then aligns them to a model's column order
//! with absent columns filled as 0.0.

use std::collections::HashMap;

/// A named feature row prior to column alignment.
///
/// Categorical values are expanded to `{column}_{value}` indicator
/// features at insertion time, so a trained column like `circuit_Monaco`
/// matches a row built with `.categorical("circuit", "Monaco")`.
#[derive(Debug, Clone, Default)]
pub struct FeatureRow {
    values: HashMap<String, f64>,
}

impl FeatureRow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a numeric feature by column name
    pub fn numeric(mut self, name: &str, value: f64) -> Self {
        self.values.insert(name.to_string(), value);
        self
    }

    /// Set a categorical feature as a one-hot indicator column
    pub fn categorical(mut self, column: &str, value: &str) -> Self {
        self.values.insert(format!("{}_{}", column, value), 1.0);
        self
    }

    /// Value for a column, 0.0 when absent
    pub fn get(&self, column: &str) -> f64 {
        self.values.get(column).copied().unwrap_or(0.0)
    }

    /// Align to a trained column order. Columns the row never set come
    /// out as 0.0, extra row entries are dropped.
    pub fn vector(&self, columns: &[String]) -> Vec<f64> {
        columns.iter().map(|c| self.get(c)).collect()
    }
}
