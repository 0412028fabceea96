//! Race Strategy Selector
//!
//! Enumerates candidate pit-stop strategies for a race, estimates stint
//! lengths from per-compound survival models, simulates race times by
//! Monte Carlo, and ranks candidates by a Bayesian-style score.
//!
//! # Ranking Model
//!
//! ```text
//! score(c)     = prior(c)^PRIOR_EXPONENT * exp(-norm_time(c) * TIME_DECAY)
//! norm_time(c) = (t_c - t_min) / (sigma_pop + epsilon)
//! ```
//!
//! `prior` is the geometric-mean probability of the template's compound
//! transitions under a historical classifier; `t_c` is the mean simulated
//! race time. Scores are normalized to probabilities over every generated
//! candidate, then truncated to the requested top-K without
//! renormalization, so a truncated response reports its share of the full
//! field.
//!
//! # Pipeline
//!
//! resolve circuit -> enumerate templates -> durability gate ->
//! Monte Carlo simulation -> transition prior -> rank -> pit windows to
//! stint boundaries

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod circuits;
pub mod diagnostics;
pub mod durability;
pub mod loader;
pub mod predictor;
pub mod prior;
pub mod quantiles;
pub mod ranking;
pub mod simulate;
pub mod stats;
pub mod templates;
pub mod windows;

pub use circuits::CircuitCatalog;
pub use diagnostics::{Diagnostics, DiagnosticsSnapshot};
pub use durability::DurabilityLimits;
pub use predictor::{StrategyArtifacts, StrategyPredictor};
pub use quantiles::QuantileEstimator;

/// Exponent applied to the historical transition prior when scoring
pub const PRIOR_EXPONENT: f64 = 3.0;
/// Decay applied to normalized race time when scoring
pub const TIME_DECAY: f64 = 0.4;

/// Simulation runs per template
pub const DEFAULT_SIMS: usize = 260;
/// Fraction of runs to complete before the early-stop check arms
pub const EARLY_STOP_FRACTION: f64 = 0.18;
/// A template stops simulating once its running mean exceeds its best
/// time by this margin in seconds
pub const EARLY_STOP_MARGIN_S: f64 = 8.0;

/// Prior assigned to degenerate templates and failed transition lookups
pub const PRIOR_FLOOR: f64 = 1e-4;
/// Added to classifier probabilities before taking logs
pub const PROBA_EPSILON: f64 = 1e-9;
/// Added to the time spread before normalizing, guards division by zero
pub const NORM_EPSILON: f64 = 1e-9;

/// Shortest stint length a quantile may report, in laps
pub const QUANTILE_FLOOR_LAPS: u32 = 5;
/// Minimum q75 - q25 spread; narrower estimates are widened
pub const MIN_QUANTILE_SPREAD: u32 = 6;
/// Quantiles used when no survival model is available or a query fails
pub const FALLBACK_QUANTILES: StintQuantiles = StintQuantiles {
    q25: 15,
    q50: 22,
    q75: 35,
};

/// Base RNG seed when a request does not carry one
pub const DEFAULT_SEED: u64 = 42;

#[derive(Error, Debug)]
pub enum StrategyError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Model error: {0}")]
    Model(#[from] tire_degradation::ModelError),
    #[error("Invalid artifact: {0}")]
    InvalidArtifact(String),
}

pub type Result<T> = std::result::Result<T, StrategyError>;

/// Integer stint-length quartiles, in laps
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StintQuantiles {
    pub q25: u32,
    pub q50: u32,
    pub q75: u32,
}

/// One stint of a concrete strategy. Lap range is end-exclusive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stint {
    pub compound: String,
    pub start_lap: u32,
    pub end_lap: u32,
}

impl Stint {
    pub fn laps(&self) -> u32 {
        self.end_lap - self.start_lap
    }
}

/// Percentile lap range for one pit stop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PitWindow {
    pub p25: u32,
    pub p50: u32,
    pub p75: u32,
}

/// A ranked pit strategy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyCandidate {
    /// Compound per stint, in running order
    pub template: Vec<String>,
    /// Concrete lap ranges covering the full race distance
    pub stints: Vec<Stint>,
    /// Pit-lap percentile windows, one per stop
    pub windows: Vec<PitWindow>,
    /// Mean simulated race duration in seconds
    pub expected_total_race_time: f64,
    /// Relative likelihood among all generated candidates
    pub prob: f64,
}

/// Track surface abrasion applied to every circuit. Modeled per circuit
/// but populated nowhere upstream, so it stays a constant.
pub const DEFAULT_ABRASION: f64 = 0.5;

/// Per-circuit race constants
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CircuitParams {
    pub total_laps: u32,
    pub pit_loss_s: f64,
    pub base_pace_s: f64,
    pub abrasion: f64,
}

impl Default for CircuitParams {
    fn default() -> Self {
        Self {
            total_laps: 60,
            pit_loss_s: 20.0,
            base_pace_s: 100.0,
            abrasion: DEFAULT_ABRASION,
        }
    }
}

/// One prediction request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyRequest {
    pub circuit: String,
    /// Track surface temperature in Celsius
    pub track_temp: f64,
    /// Air temperature in Celsius
    pub air_temp: f64,
    #[serde(default = "default_compounds")]
    pub compounds: Vec<String>,
    #[serde(default = "default_max_stops")]
    pub max_stops: u32,
    /// Require at least two distinct compounds per strategy
    #[serde(default = "default_fia_rule")]
    pub fia_rule: bool,
    #[serde(default = "default_top_k")]
    pub top_k: usize,
    /// Overrides the configured base seed for this request
    #[serde(default)]
    pub seed: Option<u64>,
}

impl StrategyRequest {
    pub fn new(circuit: impl Into<String>, track_temp: f64, air_temp: f64) -> Self {
        Self {
            circuit: circuit.into(),
            track_temp,
            air_temp,
            compounds: default_compounds(),
            max_stops: default_max_stops(),
            fia_rule: default_fia_rule(),
            top_k: default_top_k(),
            seed: None,
        }
    }
}

fn default_compounds() -> Vec<String> {
    vec!["SOFT".to_string(), "MEDIUM".to_string(), "HARD".to_string()]
}

fn default_max_stops() -> u32 {
    2
}

fn default_fia_rule() -> bool {
    true
}

fn default_top_k() -> usize {
    5
}

/// Search tuning knobs
#[derive(Debug, Clone)]
pub struct SearchConfig {
    pub sims: usize,
    pub early_stop_fraction: f64,
    pub early_stop_margin_s: f64,
    pub seed: u64,
    /// Optional wall-clock budget for one prediction; templates left when
    /// it expires are skipped
    pub time_budget: Option<std::time::Duration>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            sims: DEFAULT_SIMS,
            early_stop_fraction: EARLY_STOP_FRACTION,
            early_stop_margin_s: EARLY_STOP_MARGIN_S,
            seed: DEFAULT_SEED,
            time_budget: None,
        }
    }
}

/// Full prediction output written by the CLI
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionReport {
    pub request: StrategyRequest,
    pub candidates: Vec<StrategyCandidate>,
    pub diagnostics: DiagnosticsSnapshot,
    pub generated_at: String,
}
