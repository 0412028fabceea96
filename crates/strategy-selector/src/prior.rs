//! Historical plausibility prior
//!
//! Scores how often real races have run a template's compound sequence.
//! Each stint-to-stint transition is priced by the transition classifier
//! and the per-transition probabilities are combined as a geometric mean,
//! so template length does not bias the prior. Any transition the
//! classifier cannot price drops to a small floor instead of zeroing the
//! whole template out.

use std::sync::atomic::Ordering;

use tire_degradation::{FeatureRow, TransitionModel};

use crate::diagnostics::Diagnostics;
use crate::{PRIOR_FLOOR, PROBA_EPSILON};

/// Geometric-mean transition probability for a template, in (0, 1]
pub fn transition_prior(
    template: &[String],
    circuit: &str,
    track_temp: f64,
    air_temp: f64,
    classifier: Option<&dyn TransitionModel>,
    diagnostics: &Diagnostics,
) -> f64 {
    if template.len() <= 1 {
        return PRIOR_FLOOR;
    }
    let mut log_sum = 0.0;
    for i in 0..template.len() - 1 {
        let priced = classifier.and_then(|model| {
            transition_log_proba(
                model,
                &template[i],
                &template[i + 1],
                (i + 1) as u32,
                circuit,
                track_temp,
                air_temp,
            )
        });
        match priced {
            Some(log_p) => log_sum += log_p,
            None => {
                diagnostics.prior_fallbacks.fetch_add(1, Ordering::Relaxed);
                log_sum += PRIOR_FLOOR.ln();
            }
        }
    }
    (log_sum / (template.len() - 1) as f64).exp()
}

fn transition_log_proba(
    model: &dyn TransitionModel,
    cur_compound: &str,
    next_compound: &str,
    stint_index: u32,
    circuit: &str,
    track_temp: f64,
    air_temp: f64,
) -> Option<f64> {
    let row = build_row(model, cur_compound, stint_index, circuit, track_temp, air_temp);
    let proba = model.predict_proba(&row).ok()?;
    let class_idx = model.classes().iter().position(|c| c == next_compound)?;
    let p = proba.get(class_idx).copied()?;
    Some((p + PROBA_EPSILON).ln())
}

fn build_row(
    model: &dyn TransitionModel,
    cur_compound: &str,
    stint_index: u32,
    circuit: &str,
    track_temp: f64,
    air_temp: f64,
) -> FeatureRow {
    let mut row = FeatureRow::new();
    for name in model.numeric_features() {
        let value = match name.as_str() {
            "track_temp" => track_temp,
            "air_temp" => air_temp,
            "stint_index" => f64::from(stint_index),
            _ => 0.0,
        };
        row = row.numeric(name, value);
    }
    for column in model.categorical_features() {
        match column.as_str() {
            "circuit" => row = row.categorical(column, circuit),
            "cur_compound" => row = row.categorical(column, cur_compound),
            _ => {}
        }
    }
    row
}
