//! Compound durability limits
//!
//! A strategy that plans a stint beyond what a compound can physically
//! deliver is not worth simulating. Limits are expressed as a maximum
//! stint length per compound, with per-circuit overrides for tracks whose
//! low abrasion stretches tire life well past the generic numbers.

use std::collections::HashMap;

use crate::StintQuantiles;

/// Maximum stint length assumed for compounds without a configured limit
pub const DEFAULT_MAX_STINT_LAPS: u32 = 60;

/// Per-compound maximum stint lengths with circuit-specific overrides
#[derive(Debug, Clone, Default)]
pub struct DurabilityLimits {
    base: HashMap<String, u32>,
    overrides: HashMap<String, HashMap<String, u32>>,
}

impl DurabilityLimits {
    /// Create an empty limit table
    pub fn new() -> Self {
        Self {
            base: HashMap::new(),
            overrides: HashMap::new(),
        }
    }

    /// Create a table pre-populated with generic limits and the known
    /// low-abrasion street-circuit overrides
    pub fn with_defaults() -> Self {
        let mut limits = Self::new();
        limits.load_default_data();
        limits
    }

    fn load_default_data(&mut self) {
        self.set_limit("SOFT", 20);
        self.set_limit("MEDIUM", 32);
        self.set_limit("HARD", 48);

        self.set_override("Monaco", "SOFT", 30);
        self.set_override("Monaco", "MEDIUM", 40);
        self.set_override("Monaco", "HARD", 55);

        self.set_override("Zandvoort", "SOFT", 28);
        self.set_override("Zandvoort", "MEDIUM", 38);
        self.set_override("Zandvoort", "HARD", 54);
    }

    /// Set the generic limit for a compound
    pub fn set_limit(&mut self, compound: &str, max_laps: u32) {
        self.base.insert(compound.to_string(), max_laps);
    }

    /// Set a circuit-specific limit for a compound
    pub fn set_override(&mut self, circuit: &str, compound: &str, max_laps: u32) {
        self.overrides
            .entry(circuit.to_string())
            .or_default()
            .insert(compound.to_string(), max_laps);
    }

    /// Resolve the effective limit: circuit override, then generic limit,
    /// then [`DEFAULT_MAX_STINT_LAPS`]
    pub fn max_stint_laps(&self, compound: &str, circuit: &str) -> u32 {
        if let Some(per_circuit) = self.overrides.get(circuit) {
            if let Some(limit) = per_circuit.get(compound) {
                return *limit;
            }
        }
        self.base
            .get(compound)
            .copied()
            .unwrap_or(DEFAULT_MAX_STINT_LAPS)
    }

    /// A stint plan passes when its median length fits within the limit and
    /// its interquartile spread is no wider than the limit
    pub fn check(&self, compound: &str, circuit: &str, quantiles: &StintQuantiles) -> bool {
        let max_laps = self.max_stint_laps(compound, circuit);
        quantiles.q50 <= max_laps && quantiles.q75 - quantiles.q25 <= max_laps
    }
}
