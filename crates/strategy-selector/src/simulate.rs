//! Monte Carlo race simulation for a single strategy template
//!
//! Each run draws stint lengths uniformly from the compound's estimated
//! interquartile range, charges lap time with linear per-lap degradation,
//! and adds a fixed pit loss per stop. The final stint is never drawn: it
//! absorbs whatever race distance the earlier stints left over, and a run
//! whose earlier draws overshoot the race distance is discarded.
//!
//! Simulation of a template stops early once enough runs are in and the
//! running mean has drifted past the template's own best run by more than
//! the configured margin. The breaking run still counts toward the mean
//! but not toward the pit-window samples.

use std::sync::atomic::Ordering;

use rand::rngs::StdRng;
use rand::Rng;
use tire_degradation::pace;
use tracing::debug;

use crate::diagnostics::Diagnostics;
use crate::durability::DurabilityLimits;
use crate::quantiles::QuantileEstimator;
use crate::stats;
use crate::{CircuitParams, PitWindow, SearchConfig};

/// Request context shared by every template simulated for one prediction
pub struct SimulationContext<'a> {
    pub circuit: &'a str,
    pub params: CircuitParams,
    pub track_temp: f64,
    pub air_temp: f64,
}

/// Aggregate result of simulating one template
#[derive(Debug, Clone)]
pub struct SimulationOutcome {
    /// Mean total race time over the valid runs, in seconds
    pub mean_time_s: f64,
    /// Pit-stop lap windows, one per stop
    pub windows: Vec<PitWindow>,
    /// Number of runs that finished on the exact race distance
    pub valid_runs: usize,
}

/// Simulate one template. Returns `None` when a non-final stint fails the
/// durability gate or when no run fits the race distance.
pub fn simulate_template(
    template: &[String],
    ctx: &SimulationContext,
    estimator: &QuantileEstimator,
    durability: &DurabilityLimits,
    config: &SearchConfig,
    rng: &mut StdRng,
    diagnostics: &Diagnostics,
) -> Option<SimulationOutcome> {
    let mut stint_quantiles = Vec::with_capacity(template.len());
    for (i, compound) in template.iter().enumerate() {
        let quantiles = estimator.estimate(
            compound,
            (i + 1) as u32,
            ctx.circuit,
            ctx.track_temp,
            ctx.air_temp,
            ctx.params.total_laps,
        );
        // The final stint runs to the flag, so only planned stints are gated.
        if i + 1 < template.len() && !durability.check(compound, ctx.circuit, &quantiles) {
            diagnostics.templates_gated.fetch_add(1, Ordering::Relaxed);
            debug!(
                "Gated template {}: {} cannot cover stint {}",
                template.join("-"),
                compound,
                i + 1
            );
            return None;
        }
        stint_quantiles.push(quantiles);
    }

    let rates: Vec<f64> = template
        .iter()
        .map(|c| pace::effective_rate(pace::base_degradation_rate(c), ctx.params.abrasion))
        .collect();

    let early_stop_after = (config.sims as f64 * config.early_stop_fraction).trunc() as usize;
    let mut times: Vec<f64> = Vec::with_capacity(config.sims);
    let mut pit_lap_runs: Vec<Vec<u32>> = Vec::with_capacity(config.sims);
    let mut best: Option<f64> = None;

    for attempt in 0..config.sims {
        let mut laps_left = i64::from(ctx.params.total_laps);
        let mut cumulative: i64 = 0;
        let mut pit_laps: Vec<u32> = Vec::with_capacity(template.len() - 1);
        let mut race_time_s = ctx.params.pit_loss_s * (template.len() - 1) as f64;
        let mut valid = true;

        for (i, quantiles) in stint_quantiles.iter().enumerate() {
            let laps = if i + 1 < stint_quantiles.len() {
                let drawn = i64::from(rng.gen_range(quantiles.q25..=quantiles.q75));
                let laps = drawn.clamp(1, (laps_left - 1).max(1));
                cumulative += laps;
                pit_laps.push(cumulative as u32);
                laps
            } else {
                laps_left
            };
            if laps < 0 {
                valid = false;
                break;
            }
            laps_left -= laps;
            race_time_s += pace::stint_time_s(ctx.params.base_pace_s, rates[i], laps as u32);
        }
        if !valid {
            continue;
        }

        times.push(race_time_s);
        if let Some(best_time) = best {
            if attempt + 1 >= early_stop_after
                && stats::mean(&times) > best_time + config.early_stop_margin_s
            {
                diagnostics.early_stops.fetch_add(1, Ordering::Relaxed);
                break;
            }
        }
        pit_lap_runs.push(pit_laps);
        if best.map_or(true, |b| race_time_s < b) {
            best = Some(race_time_s);
        }
    }

    if times.is_empty() {
        diagnostics.templates_dropped.fetch_add(1, Ordering::Relaxed);
        debug!("Dropped template {}: no run fit the race distance", template.join("-"));
        return None;
    }

    Some(SimulationOutcome {
        mean_time_s: stats::mean(&times),
        windows: aggregate_windows(&pit_lap_runs, template.len()),
        valid_runs: times.len(),
    })
}

/// Collapse per-run pit laps into (p25, p50, p75) windows per stop
fn aggregate_windows(pit_lap_runs: &[Vec<u32>], stints: usize) -> Vec<PitWindow> {
    let mut windows = Vec::with_capacity(stints.saturating_sub(1));
    for stop in 0..stints.saturating_sub(1) {
        let samples: Vec<f64> = pit_lap_runs
            .iter()
            .map(|laps| f64::from(laps[stop]))
            .collect();
        windows.push(PitWindow {
            p25: stats::percentile(&samples, 25.0) as u32,
            p50: stats::percentile(&samples, 50.0) as u32,
            p75: stats::percentile(&samples, 75.0) as u32,
        });
    }
    windows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::Diagnostics;
    use crate::quantiles::QuantileEstimator;
    use rand::SeedableRng;
    use std::collections::HashMap;
    use std::sync::Arc;

    fn template(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn fallback_estimator() -> QuantileEstimator {
        QuantileEstimator::new(HashMap::new(), Arc::new(Diagnostics::default()))
    }

    fn context(params: CircuitParams) -> SimulationContext<'static> {
        SimulationContext {
            circuit: "Monza",
            params,
            track_temp: 35.0,
            air_temp: 24.0,
        }
    }

    fn config(sims: usize, early_stop_fraction: f64, early_stop_margin_s: f64) -> SearchConfig {
        SearchConfig {
            sims,
            early_stop_fraction,
            early_stop_margin_s,
            ..SearchConfig::default()
        }
    }

    #[test]
    fn test_valid_template_yields_windows_in_draw_range() {
        let diagnostics = Diagnostics::default();
        let mut rng = StdRng::seed_from_u64(42);
        let outcome = simulate_template(
            &template(&["MEDIUM", "HARD"]),
            &context(CircuitParams::default()),
            &fallback_estimator(),
            &DurabilityLimits::with_defaults(),
            &config(120, 0.18, 8.0),
            &mut rng,
            &diagnostics,
        )
        .unwrap();

        assert!(outcome.valid_runs > 0);
        assert!(outcome.mean_time_s > 0.0);
        assert_eq!(outcome.windows.len(), 1);
        let w = outcome.windows[0];
        // Draws come from the fallback interquartile range 15..=35.
        assert!(w.p25 >= 15 && w.p75 <= 35);
        assert!(w.p25 <= w.p50 && w.p50 <= w.p75);
    }

    #[test]
    fn test_soft_first_stint_is_gated() {
        let diagnostics = Diagnostics::default();
        let mut rng = StdRng::seed_from_u64(42);
        // Fallback median of 22 laps exceeds the generic 20-lap soft limit.
        let outcome = simulate_template(
            &template(&["SOFT", "MEDIUM"]),
            &context(CircuitParams::default()),
            &fallback_estimator(),
            &DurabilityLimits::with_defaults(),
            &config(120, 0.18, 8.0),
            &mut rng,
            &diagnostics,
        );
        assert!(outcome.is_none());
        assert_eq!(diagnostics.snapshot().templates_gated, 1);
        assert_eq!(diagnostics.snapshot().templates_dropped, 0);
    }

    #[test]
    fn test_early_stop_breaks_at_armed_attempt() {
        let diagnostics = Diagnostics::default();
        let mut rng = StdRng::seed_from_u64(7);
        // A hugely negative margin makes the armed check fire immediately,
        // so the simulation breaks on the sixth attempt of sixty.
        let outcome = simulate_template(
            &template(&["MEDIUM", "HARD"]),
            &context(CircuitParams::default()),
            &fallback_estimator(),
            &DurabilityLimits::with_defaults(),
            &config(60, 0.1, -1e9),
            &mut rng,
            &diagnostics,
        )
        .unwrap();

        assert_eq!(outcome.valid_runs, 6);
        assert_eq!(diagnostics.snapshot().early_stops, 1);
        // The breaking run contributes its time but not its pit laps.
        assert_eq!(outcome.windows.len(), 1);
    }

    #[test]
    fn test_short_race_clamps_draws_to_distance() {
        let diagnostics = Diagnostics::default();
        let mut rng = StdRng::seed_from_u64(42);
        let params = CircuitParams {
            total_laps: 20,
            ..CircuitParams::default()
        };
        // Non-final draws are clamped against the laps remaining, so
        // every run stays on the race distance.
        let outcome = simulate_template(
            &template(&["MEDIUM", "MEDIUM", "HARD"]),
            &context(params),
            &fallback_estimator(),
            &DurabilityLimits::with_defaults(),
            &config(80, 0.18, 1e9),
            &mut rng,
            &diagnostics,
        )
        .unwrap();

        assert_eq!(outcome.valid_runs, 80);
        assert_eq!(outcome.windows.len(), 2);
        for w in &outcome.windows {
            assert!(w.p25 <= w.p50 && w.p50 <= w.p75);
            assert!(w.p75 <= 20);
        }
    }
}
