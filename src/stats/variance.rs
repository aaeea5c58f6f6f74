//! Levene's test for equal variances, median-centred (Brown-Forsythe)

use super::{descriptive::median, distributions::f_sf, TestOutcome};
use crate::error::{AppError, Result};

/// Levene statistic over `groups`. Degenerate inputs (no within-group
/// spread, or no residual degrees of freedom) yield a NaN outcome.
pub fn levene(groups: &[&[f64]]) -> Result<TestOutcome> {
    let k = groups.len();
    if k < 2 {
        return Err(AppError::statistics("Levene's test needs at least two groups"));
    }
    if let Some(empty) = groups.iter().position(|g| g.is_empty()) {
        return Err(AppError::statistics(format!("Levene's test group {} is empty", empty)));
    }

    let deviations: Vec<Vec<f64>> = groups
        .iter()
        .map(|g| {
            let center = median(g).unwrap_or(0.0);
            g.iter().map(|v| (v - center).abs()).collect()
        })
        .collect();

    let total: usize = groups.iter().map(|g| g.len()).sum();
    if total <= k {
        return Ok(TestOutcome::undefined());
    }

    let group_means: Vec<f64> = deviations
        .iter()
        .map(|z| z.iter().sum::<f64>() / z.len() as f64)
        .collect();
    let grand_mean = deviations.iter().flatten().sum::<f64>() / total as f64;

    let between: f64 = deviations
        .iter()
        .zip(&group_means)
        .map(|(z, m)| z.len() as f64 * (m - grand_mean).powi(2))
        .sum();
    let within: f64 = deviations
        .iter()
        .zip(&group_means)
        .map(|(z, m)| z.iter().map(|v| (v - m).powi(2)).sum::<f64>())
        .sum();

    if within == 0.0 {
        return Ok(TestOutcome::undefined());
    }

    let df_between = (k - 1) as f64;
    let df_within = (total - k) as f64;
    let statistic = (df_within / df_between) * between / within;

    Ok(TestOutcome::new(statistic, f_sf(statistic, df_between, df_within)?))
}
