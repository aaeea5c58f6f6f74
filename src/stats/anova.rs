//! Two-way ANOVA with interaction, type-II sums of squares
//!
//! Both factors are dummy coded against their first level and every model
//! is fitted by least squares. Rank-deficient designs (empty cells) drop
//! the dependent columns, so degrees of freedom follow the actual rank.

use super::distributions::f_sf;
use crate::error::{AppError, Result};
use std::collections::BTreeSet;

const RANK_TOLERANCE: f64 = 1e-10;

pub const RESIDUAL_TERM: &str = "Residual";

/// One row of an ANOVA table; `f` and `p_value` are NaN for the residual row
#[derive(Debug, Clone, PartialEq)]
pub struct AnovaRow {
    pub term: String,
    pub sum_sq: f64,
    pub df: f64,
    pub f: f64,
    pub p_value: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnovaTable {
    pub rows: Vec<AnovaRow>,
}

impl AnovaTable {
    pub fn row(&self, term: &str) -> Option<&AnovaRow> {
        self.rows.iter().find(|r| r.term == term)
    }

    pub fn residual(&self) -> Option<&AnovaRow> {
        self.row(RESIDUAL_TERM)
    }
}

/// Fit `y ~ A + B + A:B` over `(a, b, y)` observations.
/// Rows are named `first`, `second`, `first:second` and `Residual`.
pub fn two_way_anova<A, B>(observations: &[(A, B, f64)], first: &str, second: &str) -> Result<AnovaTable>
where
    A: Ord + Copy,
    B: Ord + Copy,
{
    let n = observations.len();
    if n == 0 {
        return Err(AppError::insufficient_sample(1, 0));
    }

    let a_levels: Vec<A> = observations.iter().map(|o| o.0).collect::<BTreeSet<_>>().into_iter().collect();
    let b_levels: Vec<B> = observations.iter().map(|o| o.1).collect::<BTreeSet<_>>().into_iter().collect();
    let y: Vec<f64> = observations.iter().map(|o| o.2).collect();

    let intercept = vec![1.0; n];
    let a_dummies: Vec<Vec<f64>> = a_levels[1..]
        .iter()
        .map(|level| observations.iter().map(|o| indicator(o.0 == *level)).collect())
        .collect();
    let b_dummies: Vec<Vec<f64>> = b_levels[1..]
        .iter()
        .map(|level| observations.iter().map(|o| indicator(o.1 == *level)).collect())
        .collect();
    let interactions: Vec<Vec<f64>> = a_dummies
        .iter()
        .flat_map(|a| b_dummies.iter().map(move |b| a.iter().zip(b).map(|(x, z)| x * z).collect()))
        .collect();

    let design = |parts: &[&[Vec<f64>]]| -> Vec<Vec<f64>> {
        std::iter::once(intercept.clone())
            .chain(parts.iter().flat_map(|p| p.iter().cloned()))
            .collect()
    };

    let (a_cols, b_cols, ab_cols) = (a_dummies.as_slice(), b_dummies.as_slice(), interactions.as_slice());
    let a_only = least_squares(&design(&[a_cols]), &y);
    let b_only = least_squares(&design(&[b_cols]), &y);
    let additive = least_squares(&design(&[a_cols, b_cols]), &y);
    let full = least_squares(&design(&[a_cols, b_cols, ab_cols]), &y);

    let df_resid = (n - full.rank) as f64;
    let terms = [
        (first.to_string(), b_only.rss - additive.rss, additive.rank.saturating_sub(b_only.rank)),
        (second.to_string(), a_only.rss - additive.rss, additive.rank.saturating_sub(a_only.rank)),
        (format!("{}:{}", first, second), additive.rss - full.rss, full.rank.saturating_sub(additive.rank)),
    ];

    let mut rows = Vec::with_capacity(4);
    for (term, sum_sq, df) in terms {
        let sum_sq = sum_sq.max(0.0);
        let df = df as f64;
        let (f, p_value) = f_test(sum_sq, df, full.rss, df_resid)?;
        rows.push(AnovaRow { term, sum_sq, df, f, p_value });
    }
    rows.push(AnovaRow {
        term: RESIDUAL_TERM.to_string(),
        sum_sq: full.rss,
        df: df_resid,
        f: f64::NAN,
        p_value: f64::NAN,
    });

    Ok(AnovaTable { rows })
}

fn f_test(sum_sq: f64, df: f64, rss: f64, df_resid: f64) -> Result<(f64, f64)> {
    if df <= 0.0 || df_resid <= 0.0 || rss <= 0.0 {
        return Ok((f64::NAN, f64::NAN));
    }
    let f = (sum_sq / df) / (rss / df_resid);
    Ok((f, f_sf(f, df, df_resid)?))
}

fn indicator(condition: bool) -> f64 {
    if condition {
        1.0
    } else {
        0.0
    }
}

struct Fit {
    rss: f64,
    rank: usize,
}

/// Residual sum of squares and rank via modified Gram-Schmidt
fn least_squares(columns: &[Vec<f64>], y: &[f64]) -> Fit {
    let mut basis: Vec<Vec<f64>> = Vec::with_capacity(columns.len());

    for column in columns {
        let original_norm = dot(column, column).sqrt();
        if original_norm == 0.0 {
            continue;
        }

        let mut v = column.clone();
        // Second pass restores orthogonality lost to rounding
        for _ in 0..2 {
            for q in &basis {
                let c = dot(q, &v);
                v.iter_mut().zip(q).for_each(|(vi, qi)| *vi -= c * qi);
            }
        }

        let norm = dot(&v, &v).sqrt();
        if norm <= RANK_TOLERANCE * original_norm {
            continue;
        }
        v.iter_mut().for_each(|vi| *vi /= norm);
        basis.push(v);
    }

    let mut residual = y.to_vec();
    for q in &basis {
        let c = dot(q, &residual);
        residual.iter_mut().zip(q).for_each(|(ri, qi)| *ri -= c * qi);
    }

    Fit {
        rss: dot(&residual, &residual),
        rank: basis.len(),
    }
}

fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn balanced() -> Vec<(u8, char, f64)> {
        vec![
            (0, 's', 1.0),
            (0, 's', 3.0),
            (0, 'f', 5.0),
            (0, 'f', 7.0),
            (1, 's', 2.0),
            (1, 's', 4.0),
            (1, 'f', 10.0),
            (1, 'f', 12.0),
        ]
    }

    #[test]
    fn test_balanced_design_matches_hand_computation() {
        let table = two_way_anova(&balanced(), "api_type", "query_type").unwrap();
        let terms: Vec<&str> = table.rows.iter().map(|r| r.term.as_str()).collect();
        assert_eq!(terms, vec!["api_type", "query_type", "api_type:query_type", "Residual"]);

        let api = table.row("api_type").unwrap();
        assert!((api.sum_sq - 18.0).abs() < 1e-9);
        assert_eq!(api.df, 1.0);
        assert!((api.f - 9.0).abs() < 1e-9);
        assert!((api.p_value - 0.039942).abs() < 1e-5);

        let query = table.row("query_type").unwrap();
        assert!((query.sum_sq - 72.0).abs() < 1e-9);
        assert!((query.f - 36.0).abs() < 1e-9);

        let interaction = table.row("api_type:query_type").unwrap();
        assert!((interaction.sum_sq - 8.0).abs() < 1e-9);
        assert!((interaction.f - 4.0).abs() < 1e-9);

        let residual = table.residual().unwrap();
        assert!((residual.sum_sq - 8.0).abs() < 1e-9);
        assert_eq!(residual.df, 4.0);
        assert!(residual.f.is_nan());
    }

    #[test]
    fn test_empty_cell_reduces_interaction_df() {
        let mut rows = balanced();
        rows.extend([(0, 'p', 6.0), (0, 'p', 8.0)]);
        let table = two_way_anova(&rows, "a", "b").unwrap();

        // Cell (1, 'p') is empty: 5 estimable cell means instead of 6
        assert_eq!(table.row("a:b").unwrap().df, 1.0);
        assert_eq!(table.row("b").unwrap().df, 2.0);
        assert_eq!(table.residual().unwrap().df, 5.0);
    }

    #[test]
    fn test_single_level_factor_has_zero_df() {
        let rows = vec![(0, 's', 1.0), (0, 's', 2.0), (0, 'f', 3.0), (0, 'f', 5.0)];
        let table = two_way_anova(&rows, "a", "b").unwrap();
        let a = table.row("a").unwrap();
        assert_eq!(a.df, 0.0);
        assert!(a.f.is_nan());
        assert!(table.row("b").unwrap().f > 0.0);
    }

    #[test]
    fn test_empty_input_rejected() {
        let rows: Vec<(u8, u8, f64)> = Vec::new();
        assert!(two_way_anova(&rows, "a", "b").is_err());
    }
}
