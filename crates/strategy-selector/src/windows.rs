//! Pit-window to stint-plan conversion
//!
//! The headline plan in a recommendation is the deterministic stint table
//! built from each stop's p25 lap. Cut laps are clamped inside the race,
//! forced strictly increasing when stops crowd together, and the whole
//! plan is rejected if the forced cuts no longer fit the race distance.

use crate::{PitWindow, Stint};

/// Build a lap-numbered stint plan from per-stop pit windows.
///
/// Returns an empty plan when the windows cannot cover the template or
/// the cuts cannot fit the race.
pub fn windows_to_stints(
    template: &[String],
    windows: &[PitWindow],
    total_laps: u32,
) -> Vec<Stint> {
    let n = template.len();
    if n == 0 {
        return Vec::new();
    }
    if n == 1 {
        return vec![Stint {
            compound: template[0].clone(),
            start_lap: 1,
            end_lap: total_laps + 1,
        }];
    }
    if windows.len() < n - 1 {
        return Vec::new();
    }

    let total = i64::from(total_laps);
    let mut cuts: Vec<i64> = Vec::with_capacity(n + 1);
    cuts.push(1);
    for window in windows.iter().take(n - 1) {
        cuts.push(i64::from(window.p25).max(2).min(total - 1));
    }
    cuts.push(total + 1);

    // Crowded stops collapse onto the same lap; push each cut past its
    // predecessor and reject the plan if that overruns the race.
    for i in 1..cuts.len() {
        if cuts[i] <= cuts[i - 1] {
            cuts[i] = cuts[i - 1] + 1;
        }
    }
    if cuts[n] != total + 1 {
        return Vec::new();
    }

    template
        .iter()
        .enumerate()
        .map(|(i, compound)| Stint {
            compound: compound.clone(),
            start_lap: cuts[i] as u32,
            end_lap: cuts[i + 1] as u32,
        })
        .collect()
}
