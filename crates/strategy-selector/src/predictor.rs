//! Strategy prediction service
//!
//! Owns the loaded artifacts and runs the full pipeline for a request:
//! enumerate templates, gate and simulate each one, price its historical
//! prior, rank the survivors, and convert the winners' pit windows into
//! concrete stint plans. Sampling is reseeded per request, so identical
//! requests produce identical recommendations.

use std::collections::HashMap;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Instant;

use rand::rngs::StdRng;
use rand::SeedableRng;
use tire_degradation::{SurvivalBundle, TransitionModel};
use tracing::{debug, info};

use crate::circuits::CircuitCatalog;
use crate::diagnostics::{Diagnostics, DiagnosticsSnapshot};
use crate::durability::DurabilityLimits;
use crate::quantiles::QuantileEstimator;
use crate::ranking::{self, SimulatedStrategy};
use crate::simulate::{self, SimulationContext};
use crate::templates;
use crate::windows;
use crate::{prior, SearchConfig, StrategyCandidate, StrategyRequest};

/// Everything a predictor needs: fitted models plus the static tables
pub struct StrategyArtifacts {
    pub survival: HashMap<String, SurvivalBundle>,
    pub classifier: Option<Box<dyn TransitionModel>>,
    pub circuits: CircuitCatalog,
    pub durability: DurabilityLimits,
}

impl StrategyArtifacts {
    /// No fitted models, default circuit and durability tables. Every
    /// quantile query degrades to the generic fallback triple.
    pub fn with_defaults() -> Self {
        Self {
            survival: HashMap::new(),
            classifier: None,
            circuits: CircuitCatalog::with_defaults(),
            durability: DurabilityLimits::with_defaults(),
        }
    }
}

/// Ready-to-serve strategy recommendation engine
pub struct StrategyPredictor {
    estimator: QuantileEstimator,
    classifier: Option<Box<dyn TransitionModel>>,
    circuits: CircuitCatalog,
    durability: DurabilityLimits,
    config: SearchConfig,
    diagnostics: Arc<Diagnostics>,
}

impl StrategyPredictor {
    pub fn new(artifacts: StrategyArtifacts, config: SearchConfig) -> Self {
        let diagnostics = Arc::new(Diagnostics::default());
        Self {
            estimator: QuantileEstimator::new(artifacts.survival, Arc::clone(&diagnostics)),
            classifier: artifacts.classifier,
            circuits: artifacts.circuits,
            durability: artifacts.durability,
            config,
            diagnostics,
        }
    }

    /// Point-in-time copy of the pipeline counters
    pub fn diagnostics(&self) -> DiagnosticsSnapshot {
        self.diagnostics.snapshot()
    }

    /// Rank strategies for one race. Returns at most `request.top_k`
    /// candidates, best first, or an empty list when nothing is viable.
    pub fn predict(&self, request: &StrategyRequest) -> Vec<StrategyCandidate> {
        let params = self.circuits.resolve(&request.circuit);
        let seed = request.seed.unwrap_or(self.config.seed);
        let mut rng = StdRng::seed_from_u64(seed);
        let deadline = self.config.time_budget.map(|budget| Instant::now() + budget);

        let templates =
            templates::enumerate_templates(&request.compounds, request.max_stops, request.fia_rule);
        self.diagnostics
            .templates_enumerated
            .fetch_add(templates.len() as u64, Ordering::Relaxed);
        info!(
            "Simulating {} templates for {} ({} laps, seed {})",
            templates.len(),
            request.circuit,
            params.total_laps,
            seed
        );

        let ctx = SimulationContext {
            circuit: request.circuit.as_str(),
            params,
            track_temp: request.track_temp,
            air_temp: request.air_temp,
        };

        let total = templates.len();
        let mut simulated: Vec<SimulatedStrategy> = Vec::new();
        for (idx, template) in templates.into_iter().enumerate() {
            if let Some(deadline) = deadline {
                if Instant::now() >= deadline {
                    self.diagnostics
                        .budget_skips
                        .fetch_add((total - idx) as u64, Ordering::Relaxed);
                    debug!("Time budget exhausted after {} of {} templates", idx, total);
                    break;
                }
            }
            let outcome = match simulate::simulate_template(
                &template,
                &ctx,
                &self.estimator,
                &self.durability,
                &self.config,
                &mut rng,
                &self.diagnostics,
            ) {
                Some(outcome) => outcome,
                None => continue,
            };
            let prior = prior::transition_prior(
                &template,
                &request.circuit,
                request.track_temp,
                request.air_temp,
                self.classifier.as_deref(),
                &self.diagnostics,
            );
            simulated.push(SimulatedStrategy {
                template,
                windows: outcome.windows,
                mean_time_s: outcome.mean_time_s,
                prior,
                prob: 0.0,
            });
        }

        if simulated.is_empty() {
            info!("No viable strategy for {}", request.circuit);
            return Vec::new();
        }

        ranking::assign_probabilities(&mut simulated);
        let top = ranking::select_top(simulated, request.top_k);

        let mut candidates = Vec::with_capacity(top.len());
        for strategy in top {
            let stints =
                windows::windows_to_stints(&strategy.template, &strategy.windows, params.total_laps);
            if stints.is_empty() {
                debug!(
                    "Skipping {}: pit windows do not fit the race",
                    strategy.template.join("-")
                );
                continue;
            }
            candidates.push(StrategyCandidate {
                template: strategy.template,
                stints,
                windows: strategy.windows,
                expected_total_race_time: strategy.mean_time_s,
                prob: strategy.prob,
            });
        }
        info!("Returning {} ranked strategies for {}", candidates.len(), request.circuit);
        candidates
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn default_predictor() -> StrategyPredictor {
        StrategyPredictor::new(StrategyArtifacts::with_defaults(), SearchConfig::default())
    }

    #[test]
    fn test_identical_requests_get_identical_answers() {
        let predictor = default_predictor();
        let request = StrategyRequest::new("Monza", 35.0, 24.0);
        let first = predictor.predict(&request);
        let second = predictor.predict(&request);
        assert!(!first.is_empty());
        assert_eq!(first, second);
    }

    #[test]
    fn test_request_seed_overrides_config_seed() {
        let predictor = default_predictor();
        let mut request = StrategyRequest::new("Monza", 35.0, 24.0);
        request.seed = Some(SearchConfig::default().seed);
        let seeded = predictor.predict(&request);
        request.seed = None;
        let defaulted = predictor.predict(&request);
        assert_eq!(seeded, defaulted);
    }

    #[test]
    fn test_empty_compound_list_yields_nothing() {
        let predictor = default_predictor();
        let mut request = StrategyRequest::new("Monza", 35.0, 24.0);
        request.compounds = Vec::new();
        assert!(predictor.predict(&request).is_empty());
        assert_eq!(predictor.diagnostics().templates_enumerated, 0);
    }

    #[test]
    fn test_stints_cover_the_race_distance() {
        let predictor = default_predictor();
        let candidates = predictor.predict(&StrategyRequest::new("Monza", 35.0, 24.0));
        assert!(!candidates.is_empty());

        for candidate in &candidates {
            assert_eq!(candidate.stints.iter().map(|s| s.laps()).sum::<u32>(), 53);
            assert_eq!(candidate.stints[0].start_lap, 1);
            assert_eq!(candidate.stints.last().unwrap().end_lap, 54);
            for pair in candidate.stints.windows(2) {
                assert_eq!(pair[0].end_lap, pair[1].start_lap);
            }
            assert_eq!(candidate.windows.len(), candidate.stints.len() - 1);
        }
    }

    #[test]
    fn test_compound_rule_is_enforced() {
        let predictor = default_predictor();
        let mut request = StrategyRequest::new("Monza", 35.0, 24.0);
        request.top_k = 50;
        let candidates = predictor.predict(&request);

        for candidate in &candidates {
            let first = &candidate.template[0];
            assert!(candidate.template.iter().any(|c| c != first));
        }
    }

    #[test]
    fn test_probabilities_sum_over_generated_set() {
        let predictor = default_predictor();
        let mut request = StrategyRequest::new("Silverstone", 35.0, 24.0);
        request.fia_rule = false;
        request.top_k = 200;
        let candidates = predictor.predict(&request);

        // 3 compounds over 2 or 3 stints is 36 orderings; soft medians
        // exceed the 20-lap limit, so every template planning softs
        // before the final stint is gated and 18 survive.
        assert_eq!(candidates.len(), 18);
        let total: f64 = candidates.iter().map(|c| c.prob).sum();
        assert!((total - 1.0).abs() < 1e-6);
        for pair in candidates.windows(2) {
            assert!(pair[0].prob >= pair[1].prob);
        }
    }

    #[test]
    fn test_soft_never_plans_a_nonfinal_stint_generically() {
        let predictor = default_predictor();
        let mut request = StrategyRequest::new("Monza", 35.0, 24.0);
        request.top_k = 50;
        let candidates = predictor.predict(&request);

        assert_eq!(candidates.len(), 14);
        for candidate in &candidates {
            for compound in &candidate.template[..candidate.template.len() - 1] {
                assert_ne!(compound, "SOFT");
            }
        }
    }

    #[test]
    fn test_monaco_override_admits_soft_stints() {
        let predictor = default_predictor();
        let mut request = StrategyRequest::new("Monaco", 35.0, 24.0);
        request.top_k = 50;
        let candidates = predictor.predict(&request);

        // The Monaco durability override lifts the soft limit above the
        // fallback median, so nothing is gated.
        assert_eq!(candidates.len(), 30);
        assert!(candidates.iter().any(|c| c.template[0] == "SOFT"));
    }

    #[test]
    fn test_zero_max_stops_still_plans_one_stop() {
        let predictor = default_predictor();
        let mut request = StrategyRequest::new("Monza", 35.0, 24.0);
        request.max_stops = 0;
        let candidates = predictor.predict(&request);

        assert!(!candidates.is_empty());
        for candidate in &candidates {
            assert_eq!(candidate.template.len(), 2);
            assert_eq!(candidate.stints.len(), 2);
        }
    }

    #[test]
    fn test_unknown_circuit_runs_on_default_params() {
        let artifacts = StrategyArtifacts {
            survival: HashMap::new(),
            classifier: None,
            circuits: CircuitCatalog::new(),
            durability: DurabilityLimits::with_defaults(),
        };
        let predictor = StrategyPredictor::new(artifacts, SearchConfig::default());
        let mut request = StrategyRequest::new("Silverstone", 35.0, 24.0);
        request.fia_rule = false;
        request.top_k = 3;
        let candidates = predictor.predict(&request);

        assert!(!candidates.is_empty() && candidates.len() <= 3);
        for candidate in &candidates {
            assert!(candidate.template.len() >= 2 && candidate.template.len() <= 3);
            assert_eq!(candidate.stints.iter().map(|s| s.laps()).sum::<u32>(), 60);
            assert!(candidate.expected_total_race_time > 0.0);
        }
        for pair in candidates.windows(2) {
            assert!(pair[0].prob >= pair[1].prob);
        }
    }

    #[test]
    fn test_exhausted_time_budget_returns_empty() {
        let config = SearchConfig {
            time_budget: Some(std::time::Duration::ZERO),
            ..SearchConfig::default()
        };
        let predictor = StrategyPredictor::new(StrategyArtifacts::with_defaults(), config);
        let candidates = predictor.predict(&StrategyRequest::new("Monza", 35.0, 24.0));

        assert!(candidates.is_empty());
        assert!(predictor.diagnostics().budget_skips > 0);
    }
}
