//! Prediction pipeline counters
//!
//! Lock-free counters shared across a predictor's lifetime. They answer the
//! questions that come up when a ranking looks off in production: how often
//! did the quantile cache hit, how many templates were gated or dropped, and
//! how many simulations bailed out early.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// Shared counters incremented throughout a prediction run
#[derive(Debug, Default)]
pub struct Diagnostics {
    /// Quantile lookups served from cache
    pub quantile_cache_hits: AtomicU64,
    /// Quantile estimates produced without a survival model for the compound
    pub missing_model_fallbacks: AtomicU64,
    /// Quantile estimates where the model failed and stored fallbacks were used
    pub model_query_fallbacks: AtomicU64,
    /// Transitions priced at the floor prior because no classifier answered
    pub prior_fallbacks: AtomicU64,
    /// Templates handed to simulation by enumeration
    pub templates_enumerated: AtomicU64,
    /// Templates rejected by durability gating
    pub templates_gated: AtomicU64,
    /// Templates whose simulation produced no valid run
    pub templates_dropped: AtomicU64,
    /// Simulations stopped before the full sample count
    pub early_stops: AtomicU64,
    /// Templates skipped because the time budget ran out
    pub budget_skips: AtomicU64,
}

impl Diagnostics {
    /// Capture a point-in-time copy of all counters
    pub fn snapshot(&self) -> DiagnosticsSnapshot {
        DiagnosticsSnapshot {
            quantile_cache_hits: self.quantile_cache_hits.load(Ordering::Relaxed),
            missing_model_fallbacks: self.missing_model_fallbacks.load(Ordering::Relaxed),
            model_query_fallbacks: self.model_query_fallbacks.load(Ordering::Relaxed),
            prior_fallbacks: self.prior_fallbacks.load(Ordering::Relaxed),
            templates_enumerated: self.templates_enumerated.load(Ordering::Relaxed),
            templates_gated: self.templates_gated.load(Ordering::Relaxed),
            templates_dropped: self.templates_dropped.load(Ordering::Relaxed),
            early_stops: self.early_stops.load(Ordering::Relaxed),
            budget_skips: self.budget_skips.load(Ordering::Relaxed),
        }
    }
}

/// Serializable copy of [`Diagnostics`] counters
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DiagnosticsSnapshot {
    pub quantile_cache_hits: u64,
    pub missing_model_fallbacks: u64,
    pub model_query_fallbacks: u64,
    pub prior_fallbacks: u64,
    pub templates_enumerated: u64,
    pub templates_gated: u64,
    pub templates_dropped: u64,
    pub early_stops: u64,
    pub budget_skips: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_reflects_increments() {
        let diagnostics = Diagnostics::default();
        diagnostics.templates_enumerated.fetch_add(12, Ordering::Relaxed);
        diagnostics.early_stops.fetch_add(3, Ordering::Relaxed);

        let snapshot = diagnostics.snapshot();
        assert_eq!(snapshot.templates_enumerated, 12);
        assert_eq!(snapshot.early_stops, 3);
        assert_eq!(snapshot.templates_gated, 0);
    }

    #[test]
    fn test_snapshot_serializes() {
        let snapshot = Diagnostics::default().snapshot();
        let json = serde_json::to_string(&snapshot).unwrap();
        let back: DiagnosticsSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(snapshot, back);
    }
}
