//! Strategy scoring and top-K selection
//!
//! Simulated templates are ranked by a pseudo-posterior: the historical
//! prior raised to [`PRIOR_EXPONENT`] times an exponential decay in the
//! template's race time, normalized against the fastest template in the
//! batch. Scores are then normalized to probabilities over the batch.

use crate::stats;
use crate::{PitWindow, NORM_EPSILON, PRIOR_EXPONENT, TIME_DECAY};

/// A template that survived simulation, ready for ranking
#[derive(Debug, Clone)]
pub struct SimulatedStrategy {
    pub template: Vec<String>,
    pub windows: Vec<PitWindow>,
    pub mean_time_s: f64,
    pub prior: f64,
    pub prob: f64,
}

/// Score every strategy and normalize scores into probabilities.
///
/// Race times are centered on the batch minimum and scaled by the batch's
/// population standard deviation, so the decay is insensitive to circuit
/// length. A batch whose scores all collapse to zero gets a uniform
/// distribution instead.
pub fn assign_probabilities(strategies: &mut [SimulatedStrategy]) {
    if strategies.is_empty() {
        return;
    }
    let times: Vec<f64> = strategies.iter().map(|s| s.mean_time_s).collect();
    let t_min = times.iter().cloned().fold(f64::INFINITY, f64::min);
    let spread = stats::population_std(&times) + NORM_EPSILON;

    let mut total = 0.0;
    for strategy in strategies.iter_mut() {
        let norm_time = (strategy.mean_time_s - t_min) / spread;
        strategy.prob = strategy.prior.powf(PRIOR_EXPONENT) * (-norm_time * TIME_DECAY).exp();
        total += strategy.prob;
    }
    if total > 0.0 {
        for strategy in strategies.iter_mut() {
            strategy.prob /= total;
        }
    } else {
        let uniform = 1.0 / strategies.len() as f64;
        for strategy in strategies.iter_mut() {
            strategy.prob = uniform;
        }
    }
}

/// Sort by probability, best first, and keep the top `top_k`.
/// The sort is stable, so equal probabilities keep enumeration order.
pub fn select_top(
    mut strategies: Vec<SimulatedStrategy>,
    top_k: usize,
) -> Vec<SimulatedStrategy> {
    strategies.sort_by(|a, b| b.prob.partial_cmp(&a.prob).unwrap_or(std::cmp::Ordering::Equal));
    strategies.truncate(top_k);
    strategies
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strategy(name: &str, mean_time_s: f64, prior: f64) -> SimulatedStrategy {
        SimulatedStrategy {
            template: vec![name.to_string()],
            windows: Vec::new(),
            mean_time_s,
            prior,
            prob: 0.0,
        }
    }

    #[test]
    fn test_time_decay_favors_faster_template() {
        let mut batch = vec![strategy("fast", 100.0, 0.5), strategy("slow", 110.0, 0.5)];
        assign_probabilities(&mut batch);

        // Population std of [100, 110] is 5, so the slow template sits two
        // normalized units behind the fast one.
        let w_fast = 0.5_f64.powf(3.0);
        let w_slow = 0.5_f64.powf(3.0) * (-2.0 * 0.4_f64).exp();
        assert!((batch[0].prob - w_fast / (w_fast + w_slow)).abs() < 1e-6);
        assert!((batch[1].prob - w_slow / (w_fast + w_slow)).abs() < 1e-6);
        assert!((batch[0].prob + batch[1].prob - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_prior_dominates_at_equal_times() {
        let mut batch = vec![strategy("common", 100.0, 0.8), strategy("rare", 100.0, 0.2)];
        assign_probabilities(&mut batch);

        // Cubing the prior turns a 4x prior ratio into 64x.
        let expected = 0.8_f64.powi(3) / (0.8_f64.powi(3) + 0.2_f64.powi(3));
        assert!((batch[0].prob - expected).abs() < 1e-9);
    }

    #[test]
    fn test_zero_priors_fall_back_to_uniform() {
        let mut batch = vec![
            strategy("a", 100.0, 0.0),
            strategy("b", 105.0, 0.0),
            strategy("c", 110.0, 0.0),
        ];
        assign_probabilities(&mut batch);
        for s in &batch {
            assert!((s.prob - 1.0 / 3.0).abs() < 1e-12);
        }
    }

    #[test]
    fn test_select_top_sorts_and_truncates() {
        let mut batch = vec![
            strategy("c", 110.0, 0.1),
            strategy("a", 100.0, 0.9),
            strategy("b", 105.0, 0.5),
        ];
        assign_probabilities(&mut batch);
        let top = select_top(batch, 2);
        assert_eq!(top.len(), 2);
        assert_eq!(top[0].template, vec!["a".to_string()]);
        assert!(top[0].prob >= top[1].prob);
    }

    #[test]
    fn test_ties_keep_enumeration_order() {
        let mut batch = vec![strategy("first", 100.0, 0.5), strategy("second", 100.0, 0.5)];
        assign_probabilities(&mut batch);
        let top = select_top(batch, 2);
        assert_eq!(top[0].template, vec!["first".to_string()]);
        assert!(select_top(Vec::new(), 5).is_empty());
    }
}
