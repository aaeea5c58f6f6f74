//! Tail probabilities backed by `statrs`

use crate::error::{AppError, Result};
use statrs::distribution::{ContinuousCDF, FisherSnedecor, Normal, StudentsT};

fn standard_normal() -> Result<Normal> {
    Normal::new(0.0, 1.0).map_err(|e| AppError::statistics(e.to_string()))
}

/// P(Z > z)
pub fn normal_sf(z: f64) -> Result<f64> {
    Ok(standard_normal()?.sf(z))
}

/// Quantile of the standard normal
pub fn normal_ppf(p: f64) -> Result<f64> {
    if !(0.0..=1.0).contains(&p) {
        return Err(AppError::statistics(format!("probability {} outside [0, 1]", p)));
    }
    Ok(standard_normal()?.inverse_cdf(p))
}

/// P(T <= t) with `df` degrees of freedom
pub fn students_t_cdf(t: f64, df: f64) -> Result<f64> {
    let dist = StudentsT::new(0.0, 1.0, df).map_err(|e| AppError::statistics(e.to_string()))?;
    Ok(dist.cdf(t))
}

/// P(F > f) with (`d1`, `d2`) degrees of freedom
pub fn f_sf(f: f64, d1: f64, d2: f64) -> Result<f64> {
    let dist = FisherSnedecor::new(d1, d2).map_err(|e| AppError::statistics(e.to_string()))?;
    Ok(dist.sf(f))
}
