//! One-sided two-sample comparisons of paradigm B against paradigm A
//!
//! Every test here uses the alternative "B < A".

use super::{
    descriptive::{average_ranks, mean, sample_std, sample_variance, tie_groups},
    distributions::{normal_sf, students_t_cdf},
    TestOutcome,
};
use crate::error::{AppError, Result};

/// Pooled-variance Student t-test
pub fn student_t_less(b: &[f64], a: &[f64]) -> Result<TestOutcome> {
    let (nb, na) = (b.len(), a.len());
    if nb == 0 || na == 0 {
        return Err(AppError::insufficient_sample(1, nb.min(na)));
    }

    let df = (na + nb) as f64 - 2.0;
    let pooled = pooled_variance(b, a);
    let (Some(mean_b), Some(mean_a), Some(pooled)) = (mean(b), mean(a), pooled) else {
        return Ok(TestOutcome::undefined());
    };
    if df <= 0.0 {
        return Ok(TestOutcome::undefined());
    }
    if pooled <= 0.0 {
        // Constant samples: any gap between the means is infinitely many standard errors
        let t = separation(mean_b - mean_a);
        return Ok(match t {
            t if t.is_nan() => TestOutcome::undefined(),
            t if t < 0.0 => TestOutcome::new(t, 0.0),
            t => TestOutcome::new(t, 1.0),
        });
    }

    let se = (pooled * (1.0 / nb as f64 + 1.0 / na as f64)).sqrt();
    let t = (mean_b - mean_a) / se;
    Ok(TestOutcome::new(t, students_t_cdf(t, df)?))
}

/// Mann-Whitney U with the normal approximation, tie correction and
/// continuity correction. The reported statistic is U of `b`.
pub fn mann_whitney_less(b: &[f64], a: &[f64]) -> Result<TestOutcome> {
    let (nb, na) = (b.len(), a.len());
    if nb == 0 || na == 0 {
        return Err(AppError::insufficient_sample(1, nb.min(na)));
    }

    let combined: Vec<f64> = b.iter().chain(a).copied().collect();
    let ranks = average_ranks(&combined);
    let rank_sum_b: f64 = ranks[..nb].iter().sum();

    let (nb_f, na_f) = (nb as f64, na as f64);
    let n = nb_f + na_f;
    let u_b = rank_sum_b - nb_f * (nb_f + 1.0) / 2.0;
    let u_a = nb_f * na_f - u_b;
    let mu = nb_f * na_f / 2.0;

    let tie_term: f64 = tie_groups(&combined)
        .iter()
        .map(|&t| (t as f64).powi(3) - t as f64)
        .sum();
    let sigma = (nb_f * na_f / 12.0 * ((n + 1.0) - tie_term / (n * (n - 1.0)))).sqrt();

    // Every value tied: no evidence either way
    if sigma.is_nan() || sigma <= 0.0 {
        return Ok(TestOutcome::new(u_b, 1.0));
    }

    let z = (u_a - mu - 0.5) / sigma;
    Ok(TestOutcome::new(u_b, normal_sf(z)?.clamp(0.0, 1.0)))
}

fn pooled_variance(b: &[f64], a: &[f64]) -> Option<f64> {
    let (nb, na) = (b.len() as f64, a.len() as f64);
    let df = nb + na - 2.0;
    if df <= 0.0 {
        return None;
    }
    let var_b = sample_variance(b).unwrap_or(0.0);
    let var_a = sample_variance(a).unwrap_or(0.0);
    Some(((nb - 1.0) * var_b + (na - 1.0) * var_a) / df)
}

/// Signed infinity for a nonzero gap over zero spread, NaN for no gap
fn separation(gap: f64) -> f64 {
    if gap == 0.0 || gap.is_nan() {
        f64::NAN
    } else {
        f64::INFINITY.copysign(gap)
    }
}

/// Cohen's d of B relative to A, pooled standard deviation.
/// Zero spread gives a signed infinity; NaN when the means are equal too.
pub fn cohens_d(b: &[f64], a: &[f64]) -> f64 {
    match (mean(b), mean(a), pooled_variance(b, a)) {
        (Some(mb), Some(ma), Some(pooled)) if pooled > 0.0 => (mb - ma) / pooled.sqrt(),
        (Some(mb), Some(ma), Some(_)) => separation(mb - ma),
        _ => f64::NAN,
    }
}

/// Relative reduction of B's mean against A's, in percent
pub fn reduction_percent(mean_a: f64, mean_b: f64) -> f64 {
    if mean_a == 0.0 {
        f64::NAN
    } else {
        (mean_a - mean_b) * 100.0 / mean_a
    }
}

/// One comparison scope of a research question
#[derive(Debug, Clone, PartialEq)]
pub struct Comparison {
    pub n_a: usize,
    pub n_b: usize,
    pub mean_a: f64,
    pub std_a: f64,
    pub mean_b: f64,
    pub std_b: f64,
    /// `mean_a - mean_b`
    pub difference: f64,
    pub reduction_percent: f64,
    pub t_test: TestOutcome,
    pub mann_whitney: TestOutcome,
    pub cohens_d: f64,
    /// Rank-test decision at the given level
    pub significant: bool,
}

impl Comparison {
    /// Compare B against A; both sides must be non-empty
    pub fn compute(a: &[f64], b: &[f64], alpha: f64) -> Result<Self> {
        let (Some(mean_a), Some(mean_b)) = (mean(a), mean(b)) else {
            return Err(AppError::insufficient_sample(1, a.len().min(b.len())));
        };

        let t_test = student_t_less(b, a)?;
        let mann_whitney = mann_whitney_less(b, a)?;

        Ok(Self {
            n_a: a.len(),
            n_b: b.len(),
            mean_a,
            std_a: sample_std(a).unwrap_or(f64::NAN),
            mean_b,
            std_b: sample_std(b).unwrap_or(f64::NAN),
            difference: mean_a - mean_b,
            reduction_percent: reduction_percent(mean_a, mean_b),
            significant: mann_whitney.below(alpha),
            t_test,
            mann_whitney,
            cohens_d: cohens_d(b, a),
        })
    }
}
