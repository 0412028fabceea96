//! Deterministic stint pace model
//!
//! Lap time within a stint grows linearly with tire age. The growth rate
//! depends on the compound and on the track's surface abrasion.

/// Base degradation rates in seconds per lap of tire age
pub const DEG_RATE_SOFT: f64 = 0.040;
pub const DEG_RATE_MEDIUM: f64 = 0.025;
pub const DEG_RATE_HARD: f64 = 0.015;
pub const DEG_RATE_DEFAULT: f64 = 0.020;

/// Abrasion factor at which the base rates apply unchanged
pub const ABRASION_BASELINE: f64 = 0.5;
/// Rate sensitivity to abrasion above or below the baseline
pub const ABRASION_GAIN: f64 = 0.7;

/// Base degradation rate for a compound. Canonical compound names are
/// uppercase; anything unrecognized gets the default rate.
pub fn base_degradation_rate(compound: &str) -> f64 {
    match compound {
        "SOFT" => DEG_RATE_SOFT,
        "MEDIUM" => DEG_RATE_MEDIUM,
        "HARD" => DEG_RATE_HARD,
        _ => DEG_RATE_DEFAULT,
    }
}

/// Degradation rate adjusted for track abrasion
pub fn effective_rate(base_rate: f64, abrasion: f64) -> f64 {
    base_rate * (1.0 + ABRASION_GAIN * (abrasion - ABRASION_BASELINE))
}

/// Total stint time in seconds.
///
/// Lap `k` of the stint (0-based tire age) costs
/// `base_pace_s + rate_per_lap * k`, so the stint sums to
/// `laps * base_pace_s + rate_per_lap * laps * (laps - 1) / 2`.
pub fn stint_time_s(base_pace_s: f64, rate_per_lap: f64, laps: u32) -> f64 {
    let n = laps as f64;
    n * base_pace_s + rate_per_lap * n * (n - 1.0) / 2.0
}
