//! Property-based tests for the statistical routines

use super::{
    cohens_d, levene, mann_whitney_less, reduction_percent, shapiro_wilk, student_t_less, two_way_anova,
    Comparison, Summary,
};
use proptest::collection::vec;
use proptest::prelude::*;

/// Latency-like samples: positive, bounded, with repeats
fn sample(min_len: usize) -> impl Strategy<Value = Vec<f64>> {
    vec((1u32..5000).prop_map(|v| v as f64 / 10.0), min_len..40)
}

proptest! {
    #[test]
    fn prop_summary_orders_location(values in sample(1)) {
        let s = Summary::from_values(&values).unwrap();
        prop_assert_eq!(s.count, values.len());
        prop_assert!(s.min <= s.median && s.median <= s.max);
        prop_assert!(s.min <= s.mean + 1e-9 && s.mean <= s.max + 1e-9);
        if let Some(std) = s.std {
            prop_assert!(std >= 0.0);
        }
    }

    #[test]
    fn prop_shapiro_wilk_bounds(values in sample(3)) {
        let outcome = shapiro_wilk(&values).unwrap();
        prop_assert!(outcome.statistic > 0.0 && outcome.statistic <= 1.0);
        prop_assert!((0.0..=1.0).contains(&outcome.p_value));
    }

    #[test]
    fn prop_shapiro_wilk_is_location_scale_invariant(values in sample(3), shift in -100.0f64..100.0, scale in 0.5f64..20.0) {
        let moved: Vec<f64> = values.iter().map(|v| v * scale + shift).collect();
        let a = shapiro_wilk(&values).unwrap();
        let b = shapiro_wilk(&moved).unwrap();
        prop_assert!((a.statistic - b.statistic).abs() < 1e-6);
    }

    #[test]
    fn prop_mann_whitney_p_in_unit_interval(a in sample(1), b in sample(1)) {
        let outcome = mann_whitney_less(&b, &a).unwrap();
        prop_assert!((0.0..=1.0).contains(&outcome.p_value));
        prop_assert!(outcome.statistic >= 0.0);
        prop_assert!(outcome.statistic <= (a.len() * b.len()) as f64);
    }

    #[test]
    fn prop_rank_statistics_are_complementary(a in sample(1), b in sample(1)) {
        let b_vs_a = mann_whitney_less(&b, &a).unwrap();
        let a_vs_b = mann_whitney_less(&a, &b).unwrap();
        let total = (a.len() * b.len()) as f64;
        prop_assert!((b_vs_a.statistic + a_vs_b.statistic - total).abs() < 1e-9);
    }

    #[test]
    fn prop_effect_size_sign_matches_difference(a in sample(2), b in sample(2)) {
        let comparison = Comparison::compute(&a, &b, 0.05).unwrap();
        let d = comparison.cohens_d;
        if comparison.difference != 0.0 {
            // d uses meanB - meanA, the reported difference meanA - meanB
            prop_assert_eq!(d < 0.0, comparison.difference > 0.0);
        }
    }

    #[test]
    fn prop_effect_size_recomputes_from_summaries(a in sample(2), b in sample(2)) {
        let d = cohens_d(&b, &a);
        let sa = Summary::from_values(&a).unwrap();
        let sb = Summary::from_values(&b).unwrap();
        let (na, nb) = (sa.count as f64, sb.count as f64);
        let pooled = ((nb - 1.0) * sb.std.unwrap().powi(2) + (na - 1.0) * sa.std.unwrap().powi(2)) / (na + nb - 2.0);
        if pooled > 0.0 {
            let recomputed = (sb.mean - sa.mean) / pooled.sqrt();
            prop_assert!((d - recomputed).abs() <= 1e-6 * d.abs().max(1.0));
        }
    }

    #[test]
    fn prop_t_test_p_in_unit_interval(a in sample(2), b in sample(2)) {
        let outcome = student_t_less(&b, &a).unwrap();
        if outcome.is_defined() {
            prop_assert!((0.0..=1.0).contains(&outcome.p_value));
        }
    }

    #[test]
    fn prop_levene_is_symmetric(a in sample(2), b in sample(2)) {
        let ab = levene(&[&a, &b]).unwrap();
        let ba = levene(&[&b, &a]).unwrap();
        if ab.is_defined() {
            prop_assert!((ab.statistic - ba.statistic).abs() < 1e-9 * ab.statistic.abs().max(1.0));
            prop_assert!(ab.statistic >= 0.0);
        }
    }

    #[test]
    fn prop_reduction_of_identical_means_is_zero(mean in 1.0f64..1e6) {
        prop_assert_eq!(reduction_percent(mean, mean), 0.0);
    }

    #[test]
    fn prop_anova_partitions_total_variance_when_balanced(cells in vec(vec(1u32..1000, 3), 4)) {
        // 2 x 2 balanced design, three replicates per cell
        let mut rows = Vec::new();
        for (index, cell) in cells.iter().enumerate() {
            for v in cell {
                rows.push(((index / 2) as u8, (index % 2) as u8, *v as f64));
            }
        }
        let table = two_way_anova(&rows, "a", "b").unwrap();
        let explained: f64 = table.rows.iter().map(|r| r.sum_sq).sum();

        let mean = rows.iter().map(|r| r.2).sum::<f64>() / rows.len() as f64;
        let total: f64 = rows.iter().map(|r| (r.2 - mean).powi(2)).sum();
        prop_assert!((explained - total).abs() <= 1e-6 * total.max(1.0));
    }
}
