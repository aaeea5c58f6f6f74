//! Statistical routines of the analysis pipeline
//!
//! Distribution tails come from `statrs`; the tests themselves follow the
//! conventions of the usual scientific Python stack (scipy / statsmodels).

pub mod anova;
pub mod descriptive;
pub mod distributions;
pub mod hypothesis;
pub mod normality;
pub mod variance;

#[cfg(test)]
mod comprehensive_tests;

pub use anova::{two_way_anova, AnovaRow, AnovaTable};
pub use descriptive::Summary;
pub use hypothesis::{cohens_d, mann_whitney_less, reduction_percent, student_t_less, Comparison};
pub use normality::shapiro_wilk;
pub use variance::levene;

/// Statistic and p-value of one test
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TestOutcome {
    pub statistic: f64,
    pub p_value: f64,
}

impl TestOutcome {
    pub fn new(statistic: f64, p_value: f64) -> Self {
        Self { statistic, p_value }
    }

    /// Test that could not be computed on degenerate input
    pub fn undefined() -> Self {
        Self::new(f64::NAN, f64::NAN)
    }

    pub fn is_defined(&self) -> bool {
        !self.p_value.is_nan()
    }

    /// `p < alpha`; false when undefined
    pub fn below(&self, alpha: f64) -> bool {
        self.p_value < alpha
    }

    /// `p > alpha`; false when undefined
    pub fn exceeds(&self, alpha: f64) -> bool {
        self.p_value > alpha
    }
}
