//! Stint-length quantile estimation
//!
//! Wraps the per-compound survival bundles behind a cache and a fallback
//! ladder. Every estimate goes through the same finishing step: quantiles
//! are rounded to whole laps, clamped to a plausible stint range for the
//! race distance, and widened when the model is overconfident, so the
//! simulation layer never sees a degenerate sampling window.
//!
//! The ladder, in order:
//! 1. the compound's fitted survival model,
//! 2. the quantiles stored alongside the model if the query fails,
//! 3. a generic dry-race triple when no model is available at all.

use std::collections::HashMap;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use parking_lot::RwLock;
use tire_degradation::{FeatureRow, SurvivalBundle};
use tracing::{debug, warn};

use crate::diagnostics::Diagnostics;
use crate::{StintQuantiles, FALLBACK_QUANTILES, MIN_QUANTILE_SPREAD, QUANTILE_FLOOR_LAPS};

/// Cache key for one quantile query. Temperatures are keyed on their exact
/// bit patterns, so only byte-identical requests share an entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct QuantileKey {
    compound: String,
    stint_index: u32,
    circuit: String,
    track_temp_bits: u64,
    air_temp_bits: u64,
    total_laps: u32,
}

/// Cached estimator over the loaded survival bundles
pub struct QuantileEstimator {
    bundles: HashMap<String, SurvivalBundle>,
    cache: RwLock<HashMap<QuantileKey, StintQuantiles>>,
    diagnostics: Arc<Diagnostics>,
}

impl QuantileEstimator {
    pub fn new(bundles: HashMap<String, SurvivalBundle>, diagnostics: Arc<Diagnostics>) -> Self {
        Self {
            bundles,
            cache: RwLock::new(HashMap::new()),
            diagnostics,
        }
    }

    /// Estimate (q25, q50, q75) stint lengths in laps for a compound in a
    /// given stint slot. Never fails: model problems degrade through the
    /// fallback ladder and are counted in diagnostics.
    pub fn estimate(
        &self,
        compound: &str,
        stint_index: u32,
        circuit: &str,
        track_temp: f64,
        air_temp: f64,
        total_laps: u32,
    ) -> StintQuantiles {
        let key = QuantileKey {
            compound: compound.to_string(),
            stint_index,
            circuit: circuit.to_string(),
            track_temp_bits: track_temp.to_bits(),
            air_temp_bits: air_temp.to_bits(),
            total_laps,
        };
        if let Some(hit) = self.cache.read().get(&key).copied() {
            self.diagnostics
                .quantile_cache_hits
                .fetch_add(1, Ordering::Relaxed);
            return hit;
        }
        let quantiles =
            self.compute(compound, stint_index, circuit, track_temp, air_temp, total_laps);
        self.cache.write().insert(key, quantiles);
        quantiles
    }

    fn compute(
        &self,
        compound: &str,
        stint_index: u32,
        circuit: &str,
        track_temp: f64,
        air_temp: f64,
        total_laps: u32,
    ) -> StintQuantiles {
        let raw = match self.bundles.get(compound) {
            Some(bundle) => {
                let row = build_row(bundle, stint_index, circuit, track_temp, air_temp, total_laps);
                match model_quantiles(bundle, &row) {
                    Ok(raw) => raw,
                    Err(err) => {
                        self.diagnostics
                            .model_query_fallbacks
                            .fetch_add(1, Ordering::Relaxed);
                        warn!(
                            "Survival query failed for {} in stint {}: {}",
                            compound, stint_index, err
                        );
                        bundle.fallback_quantiles.unwrap_or_else(generic_fallback)
                    }
                }
            }
            None => {
                self.diagnostics
                    .missing_model_fallbacks
                    .fetch_add(1, Ordering::Relaxed);
                debug!("No survival model for {}, using generic stint quantiles", compound);
                generic_fallback()
            }
        };
        // Stored fallbacks are not validated at load time; a non-finite
        // value resets the whole triple to the generic one.
        let raw = if raw.iter().all(|v| v.is_finite()) {
            raw
        } else {
            generic_fallback()
        };
        finalize(raw, total_laps)
    }
}

fn generic_fallback() -> [f64; 3] {
    [
        f64::from(FALLBACK_QUANTILES.q25),
        f64::from(FALLBACK_QUANTILES.q50),
        f64::from(FALLBACK_QUANTILES.q75),
    ]
}

fn model_quantiles(bundle: &SurvivalBundle, row: &FeatureRow) -> tire_degradation::Result<[f64; 3]> {
    Ok([
        bundle.percentile(row, 0.25)?,
        bundle.percentile(row, 0.50)?,
        bundle.percentile(row, 0.75)?,
    ])
}

/// Encode the request context against a bundle's training schema.
/// Rainfall-style features a dry-race request cannot supply stay at zero.
fn build_row(
    bundle: &SurvivalBundle,
    stint_index: u32,
    circuit: &str,
    track_temp: f64,
    air_temp: f64,
    total_laps: u32,
) -> FeatureRow {
    let mut row = FeatureRow::new();
    for name in &bundle.numeric_features {
        let value = match name.as_str() {
            "track_temp" => track_temp,
            "air_temp" => air_temp,
            "total_laps" => f64::from(total_laps),
            "stint_index" => f64::from(stint_index),
            _ => 0.0,
        };
        row = row.numeric(name, value);
    }
    for column in &bundle.categorical_features {
        if column == "circuit" {
            row = row.categorical(column, circuit);
        }
    }
    row
}

/// Round to whole laps, clamp to `[5, max(6, total_laps - 1)]`, and widen
/// any interquartile spread narrower than [`MIN_QUANTILE_SPREAD`] around
/// its midpoint. The output is always sorted.
fn finalize(mut raw: [f64; 3], total_laps: u32) -> StintQuantiles {
    raw.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let hi_cap = total_laps.saturating_sub(1).max(QUANTILE_FLOOR_LAPS + 1);
    let cap = |v: f64| v.round().max(f64::from(QUANTILE_FLOOR_LAPS)).min(f64::from(hi_cap)) as u32;

    let mut q25 = cap(raw[0]);
    let mut q50 = cap(raw[1]);
    let mut q75 = cap(raw[2]);
    if q75 - q25 < MIN_QUANTILE_SPREAD {
        let mid = (q25 + q75) / 2;
        q25 = mid.saturating_sub(3).max(QUANTILE_FLOOR_LAPS);
        q75 = (q25 + MIN_QUANTILE_SPREAD).min(hi_cap);
        q50 = q50.min(q75.saturating_sub(1)).max(q25);
    }
    let mut ordered = [q25, q50, q75];
    ordered.sort_unstable();
    StintQuantiles {
        q25: ordered[0],
        q50: ordered[1],
        q75: ordered[2],
    }
}
