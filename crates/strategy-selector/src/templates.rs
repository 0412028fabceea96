//! Strategy template enumeration
//!
//! A template is an ordered list of compounds, one per stint. Enumeration
//! is the cartesian product of the requested compounds over every stint
//! count from two up to `max_stops + 1`, so downstream gating and
//! simulation see every candidate order exactly once.

/// Enumerate every compound ordering with two to `max_stops + 1` stints.
///
/// The one-stop class is always produced, so `max_stops = 0` behaves like
/// `max_stops = 1`. Zero-stop (single stint) strategies are never
/// enumerated. With `require_two_compounds` set, templates running a
/// single compound for the whole race are filtered out.
pub fn enumerate_templates(
    compounds: &[String],
    max_stops: u32,
    require_two_compounds: bool,
) -> Vec<Vec<String>> {
    if compounds.is_empty() {
        return Vec::new();
    }
    let longest = max_stops.max(1) as usize + 1;
    let mut templates = Vec::new();
    for len in 2..=longest {
        let mut indices = vec![0usize; len];
        'outer: loop {
            let template: Vec<String> = indices.iter().map(|&i| compounds[i].clone()).collect();
            if !require_two_compounds || template.iter().any(|c| c != &template[0]) {
                templates.push(template);
            }
            // Advance like an odometer, last stint fastest.
            let mut pos = len;
            while pos > 0 {
                pos -= 1;
                indices[pos] += 1;
                if indices[pos] < compounds.len() {
                    continue 'outer;
                }
                indices[pos] = 0;
            }
            break;
        }
    }
    templates
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compounds(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_counts_without_compound_rule() {
        // 2 compounds over 2 and 3 stints: 4 + 8 orderings.
        let templates = enumerate_templates(&compounds(&["SOFT", "MEDIUM"]), 2, false);
        assert_eq!(templates.len(), 12);
    }

    #[test]
    fn test_compound_rule_drops_single_compound_runs() {
        let templates = enumerate_templates(&compounds(&["SOFT", "MEDIUM"]), 2, true);
        // SS, MM, SSS and MMM are gone.
        assert_eq!(templates.len(), 8);
        assert!(templates
            .iter()
            .all(|t| t.iter().any(|c| c != &t[0])));
    }

    #[test]
    fn test_zero_max_stops_keeps_one_stop_class() {
        let templates = enumerate_templates(&compounds(&["SOFT", "MEDIUM", "HARD"]), 0, false);
        assert_eq!(templates.len(), 9);
        assert!(templates.iter().all(|t| t.len() == 2));
    }

    #[test]
    fn test_enumeration_order_is_odometer() {
        let templates = enumerate_templates(&compounds(&["SOFT", "MEDIUM"]), 1, false);
        assert_eq!(
            templates,
            vec![
                compounds(&["SOFT", "SOFT"]),
                compounds(&["SOFT", "MEDIUM"]),
                compounds(&["MEDIUM", "SOFT"]),
                compounds(&["MEDIUM", "MEDIUM"]),
            ]
        );
    }

    #[test]
    fn test_empty_compounds_yield_nothing() {
        assert!(enumerate_templates(&[], 2, false).is_empty());
    }

    #[test]
    fn test_single_compound_with_rule_yields_nothing() {
        assert!(enumerate_templates(&compounds(&["HARD"]), 2, true).is_empty());
    }
}
