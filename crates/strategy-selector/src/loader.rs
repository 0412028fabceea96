//! Model artifact loading from JSON files
//!
//! Artifacts are exported by the training pipeline: one survival model
//! per compound, one transition classifier, and a circuit parameter
//! table. Loading is strict. A file that parses but carries inconsistent
//! shapes is rejected rather than silently truncated, because a model
//! with misaligned coefficients scores garbage without failing.

use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde::Deserialize;
use tire_degradation::{SoftmaxTransition, SurvivalBundle, TransitionModel, WeibullAft};
use tracing::info;

use crate::circuits::CircuitCatalog;
use crate::{Result, StrategyError};

/// Raw Weibull AFT parameters from JSON
#[derive(Debug, Deserialize)]
struct RawWeibullModel {
    rho: f64,
    intercept: f64,
    coefficients: Vec<f64>,
}

/// Raw stored fallback quantiles from JSON
#[derive(Debug, Deserialize)]
struct RawQuantiles {
    q25: f64,
    q50: f64,
    q75: f64,
}

/// Raw per-compound survival entry from JSON
#[derive(Debug, Deserialize)]
struct RawSurvivalBundle {
    #[serde(default)]
    feats_num: Vec<String>,
    #[serde(default)]
    feats_cat: Vec<String>,
    feature_columns: Vec<String>,
    model: RawWeibullModel,
    fallback_q: Option<RawQuantiles>,
}

/// Raw transition classifier from JSON
#[derive(Debug, Deserialize)]
struct RawTransitionClassifier {
    classes: Vec<String>,
    #[serde(default)]
    feats_num: Vec<String>,
    #[serde(default)]
    feats_cat: Vec<String>,
    feature_columns: Vec<String>,
    intercepts: Vec<f64>,
    coefficients: Vec<Vec<f64>>,
}

/// Raw circuit entry from JSON
#[derive(Debug, Deserialize)]
struct RawCircuit {
    total_laps: u32,
    pit_loss: f64,
    base_pace_s: f64,
}

/// Load the per-compound survival models
pub fn load_survival_bundles(path: impl AsRef<Path>) -> Result<HashMap<String, SurvivalBundle>> {
    let path = path.as_ref();
    info!("Loading survival models from {:?}", path);

    let file = File::open(path)?;
    let reader = BufReader::new(file);
    let raw: HashMap<String, RawSurvivalBundle> = serde_json::from_reader(reader)?;

    let mut bundles = HashMap::with_capacity(raw.len());
    for (compound, entry) in raw {
        if entry.model.coefficients.len() != entry.feature_columns.len() {
            return Err(StrategyError::InvalidArtifact(format!(
                "survival model for {} has {} coefficients for {} feature columns",
                compound,
                entry.model.coefficients.len(),
                entry.feature_columns.len()
            )));
        }
        let model = WeibullAft::new(
            entry.model.rho,
            entry.model.intercept,
            entry.model.coefficients,
        )?;
        bundles.insert(
            compound,
            SurvivalBundle {
                model: Box::new(model),
                numeric_features: entry.feats_num,
                categorical_features: entry.feats_cat,
                feature_columns: entry.feature_columns,
                fallback_quantiles: entry.fallback_q.map(|q| [q.q25, q.q50, q.q75]),
            },
        );
    }

    info!("Loaded {} survival models", bundles.len());
    Ok(bundles)
}

/// Load the compound transition classifier
pub fn load_classifier(path: impl AsRef<Path>) -> Result<SoftmaxTransition> {
    let path = path.as_ref();
    info!("Loading transition classifier from {:?}", path);

    let file = File::open(path)?;
    let reader = BufReader::new(file);
    let raw: RawTransitionClassifier = serde_json::from_reader(reader)?;

    let classifier = SoftmaxTransition::new(
        raw.classes,
        raw.feats_num,
        raw.feats_cat,
        raw.feature_columns,
        raw.intercepts,
        raw.coefficients,
    )?;
    info!("Loaded classifier with {} classes", classifier.classes().len());
    Ok(classifier)
}

/// Load circuit parameters, replacing the built-in catalog
pub fn load_circuits(path: impl AsRef<Path>) -> Result<CircuitCatalog> {
    let path = path.as_ref();
    info!("Loading circuit parameters from {:?}", path);

    let file = File::open(path)?;
    let reader = BufReader::new(file);
    let raw: HashMap<String, RawCircuit> = serde_json::from_reader(reader)?;

    let mut catalog = CircuitCatalog::new();
    for (name, circuit) in raw {
        if circuit.total_laps == 0 {
            return Err(StrategyError::InvalidArtifact(format!(
                "circuit {} has zero race laps",
                name
            )));
        }
        if !circuit.pit_loss.is_finite() || circuit.pit_loss < 0.0 {
            return Err(StrategyError::InvalidArtifact(format!(
                "circuit {} has invalid pit loss {}",
                name, circuit.pit_loss
            )));
        }
        if !circuit.base_pace_s.is_finite() || circuit.base_pace_s <= 0.0 {
            return Err(StrategyError::InvalidArtifact(format!(
                "circuit {} has invalid base pace {}",
                name, circuit.base_pace_s
            )));
        }
        catalog.add_circuit(&name, circuit.total_laps, circuit.pit_loss, circuit.base_pace_s);
    }

    info!("Loaded {} circuits", catalog.len());
    Ok(catalog)
}
