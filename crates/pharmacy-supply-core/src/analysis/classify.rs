//! Classification and rounding helpers shared by both engines.

use crate::models::{AbcClass, Criticality};

/// Cumulative share of total consumption up to which a drug is class A.
pub const ABC_A_THRESHOLD: f64 = 0.80;
/// Cumulative share up to which a drug is class B.
pub const ABC_B_THRESHOLD: f64 = 0.95;

pub const HIGH_MISSING_FRACTION: f64 = 0.75;
pub const MEDIUM_MISSING_FRACTION: f64 = 0.50;
pub const LOW_MISSING_FRACTION: f64 = 0.25;

/// Round to two decimal places.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Classify supply criticality from the share of the desired quantity that is missing.
pub fn classify_criticality(adjusted_required: f64, desired: f64) -> Criticality {
    if desired == 0.0 {
        return Criticality::NotCritical;
    }
    let missing_fraction = adjusted_required / desired;
    if missing_fraction >= HIGH_MISSING_FRACTION {
        Criticality::High
    } else if missing_fraction >= MEDIUM_MISSING_FRACTION {
        Criticality::Medium
    } else if missing_fraction >= LOW_MISSING_FRACTION {
        Criticality::Low
    } else {
        Criticality::NotCritical
    }
}

/// ABC ranking of a whole table.
#[derive(Debug, Clone, PartialEq)]
pub struct AbcRanking {
    /// Input positions sorted by consumption, highest first (stable)
    pub order: Vec<usize>,
    /// Running consumption total, indexed by input position
    pub cumulative: Vec<f64>,
    /// Class, indexed by input position
    pub classes: Vec<AbcClass>,
}

/// Rank items by consumption and assign Pareto classes.
///
/// Items are sorted by consumption descending (ties keep input order) and a
/// running total is accumulated in that order. An item is `A` while the
/// running total stays within 80% of the grand total, `B` within 95%, and
/// `C` beyond.
pub fn rank_abc(consumption: &[f64]) -> AbcRanking {
    let mut order: Vec<usize> = (0..consumption.len()).collect();
    order.sort_by(|&a, &b| consumption[b].total_cmp(&consumption[a]));

    let total: f64 = consumption.iter().sum();
    let a_limit = total * ABC_A_THRESHOLD;
    let b_limit = total * ABC_B_THRESHOLD;

    let mut cumulative = vec![0.0; consumption.len()];
    let mut classes = vec![AbcClass::C; consumption.len()];
    let mut running = 0.0;
    for &idx in &order {
        running += consumption[idx];
        cumulative[idx] = running;
        classes[idx] = if running <= a_limit {
            AbcClass::A
        } else if running <= b_limit {
            AbcClass::B
        } else {
            AbcClass::C
        };
    }

    AbcRanking {
        order,
        cumulative,
        classes,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round2() {
        assert_eq!(round2(1.234), 1.23);
        assert_eq!(round2(1.235_1), 1.24);
        assert_eq!(round2(-2.0), -2.0);
        assert_eq!(round2(600.0), 600.0);
    }

    #[test]
    fn test_criticality_tiers() {
        assert_eq!(classify_criticality(450.0, 600.0), Criticality::High);
        assert_eq!(classify_criticality(600.0, 600.0), Criticality::High);
        assert_eq!(classify_criticality(300.0, 600.0), Criticality::Medium);
        assert_eq!(classify_criticality(250.0, 600.0), Criticality::Low);
        assert_eq!(classify_criticality(150.0, 600.0), Criticality::Low);
        assert_eq!(classify_criticality(149.0, 600.0), Criticality::NotCritical);
        assert_eq!(classify_criticality(0.0, 600.0), Criticality::NotCritical);
    }

    #[test]
    fn test_criticality_with_nothing_desired() {
        assert_eq!(classify_criticality(0.0, 0.0), Criticality::NotCritical);
        assert_eq!(classify_criticality(10.0, 0.0), Criticality::NotCritical);
    }

    #[test]
    fn test_abc_thresholds() {
        // Total 100: cumulative 70, 85, 95, 100
        let ranking = rank_abc(&[15.0, 70.0, 5.0, 10.0]);
        assert_eq!(ranking.order, vec![1, 0, 3, 2]);
        assert_eq!(ranking.classes[1], AbcClass::A);
        assert_eq!(ranking.classes[0], AbcClass::B);
        // Exactly 95% is still B
        assert_eq!(ranking.classes[3], AbcClass::B);
        assert_eq!(ranking.classes[2], AbcClass::C);
        assert_eq!(ranking.cumulative[3], 95.0);
    }

    #[test]
    fn test_abc_boundary_is_inclusive() {
        // Cumulative 80 out of 100 lands exactly on the A limit
        let ranking = rank_abc(&[80.0, 20.0]);
        assert_eq!(ranking.classes, vec![AbcClass::A, AbcClass::C]);
    }

    #[test]
    fn test_abc_ties_keep_input_order() {
        let ranking = rank_abc(&[10.0, 30.0, 10.0, 30.0]);
        assert_eq!(ranking.order, vec![1, 3, 0, 2]);
    }

    #[test]
    fn test_abc_empty_and_zero_tables() {
        let ranking = rank_abc(&[]);
        assert!(ranking.order.is_empty());

        // No consumption at all: every running total equals the limit
        let ranking = rank_abc(&[0.0, 0.0]);
        assert_eq!(ranking.classes, vec![AbcClass::A, AbcClass::A]);
    }
}
