//! Shapiro-Wilk normality test (Royston 1995, AS R94)

use super::{
    descriptive::sorted,
    distributions::{normal_ppf, normal_sf},
    TestOutcome,
};
use crate::error::{AppError, Result};

const SMALL: f64 = 1e-19;

const G: [f64; 2] = [-2.273, 0.459];
const C1: [f64; 6] = [0.0, 0.221157, -0.147981, -2.07119, 4.434685, -2.706056];
const C2: [f64; 6] = [0.0, 0.042981, -0.293762, -1.752461, 5.682633, -3.582633];
const C3: [f64; 4] = [0.544, -0.39978, 0.025054, -6.714e-4];
const C4: [f64; 4] = [1.3822, -0.77857, 0.062767, -0.0020322];
const C5: [f64; 4] = [-1.5861, -0.31082, -0.083751, 0.0038915];
const C6: [f64; 3] = [-0.4803, -0.082676, 0.0030302];

pub const MIN_SAMPLE: usize = 3;

fn poly(coefficients: &[f64], x: f64) -> f64 {
    coefficients.iter().rev().fold(0.0, |acc, c| acc * x + c)
}

/// Upper-half coefficients a_1..a_{n/2}, all positive
fn coefficients(n: usize) -> Result<Vec<f64>> {
    let half = n / 2;
    if n == 3 {
        return Ok(vec![0.5f64.sqrt()]);
    }

    let an = n as f64;
    let m = (1..=half)
        .map(|i| normal_ppf((i as f64 - 0.375) / (an + 0.25)))
        .collect::<Result<Vec<f64>>>()?;

    let summ2 = 2.0 * m.iter().map(|v| v * v).sum::<f64>();
    let ssumm2 = summ2.sqrt();
    let rsn = 1.0 / an.sqrt();
    let a1 = poly(&C1, rsn) - m[0] / ssumm2;

    let mut a = Vec::with_capacity(half);
    let (first, fac) = if n > 5 {
        let a2 = -m[1] / ssumm2 + poly(&C2, rsn);
        let fac = ((summ2 - 2.0 * m[0].powi(2) - 2.0 * m[1].powi(2))
            / (1.0 - 2.0 * a1.powi(2) - 2.0 * a2.powi(2)))
        .sqrt();
        a.push(a1);
        a.push(a2);
        (2, fac)
    } else {
        let fac = ((summ2 - 2.0 * m[0].powi(2)) / (1.0 - 2.0 * a1.powi(2))).sqrt();
        a.push(a1);
        (1, fac)
    };

    a.extend(m[first..].iter().map(|mi| -mi / fac));
    Ok(a)
}

/// W statistic and p-value; fails with `InsufficientSample` below three values
pub fn shapiro_wilk(values: &[f64]) -> Result<TestOutcome> {
    let n = values.len();
    if n < MIN_SAMPLE {
        return Err(AppError::insufficient_sample(MIN_SAMPLE, n));
    }

    let x = sorted(values);
    let range = x[n - 1] - x[0];
    if range < SMALL {
        // Constant sample
        return Ok(TestOutcome::new(1.0, 1.0));
    }

    let half = coefficients(n)?;
    let mut a = vec![0.0; n];
    for (i, ai) in half.iter().enumerate() {
        a[i] = -ai;
        a[n - 1 - i] = *ai;
    }

    let mean = x.iter().sum::<f64>() / n as f64;
    let sax: f64 = a.iter().zip(&x).map(|(ai, xi)| ai * (xi - mean) / range).sum();
    let ssa: f64 = a.iter().map(|ai| ai * ai).sum();
    let ssx: f64 = x.iter().map(|xi| ((xi - mean) / range).powi(2)).sum();
    let w = (sax * sax / (ssa * ssx)).clamp(0.0, 1.0);

    Ok(TestOutcome::new(w, p_value(w, n)?))
}

fn p_value(w: f64, n: usize) -> Result<f64> {
    if n == 3 {
        // Exact for n = 3
        let p = 6.0 / std::f64::consts::PI * (w.sqrt().asin() - std::f64::consts::FRAC_PI_3);
        return Ok(p.clamp(0.0, 1.0));
    }

    let w1 = 1.0 - w;
    if w1 <= 0.0 {
        return Ok(1.0);
    }

    let an = n as f64;
    let mut y = w1.ln();
    let (m, s) = if n <= 11 {
        let gamma = poly(&G, an);
        // AS R94 floor; W this small is out of reach of a real sample
        if y >= gamma {
            return Ok(SMALL);
        }
        y = -(gamma - y).ln();
        (poly(&C3, an), poly(&C4, an).exp())
    } else {
        let xx = an.ln();
        (poly(&C5, xx), poly(&C6, xx).exp())
    };

    normal_sf((y - m) / s)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_poly_is_ascending_powers() {
        assert_eq!(poly(&[1.0, 2.0, 3.0], 2.0), 1.0 + 4.0 + 12.0);
    }

    #[test]
    fn test_small_sample_floor() {
        assert_eq!(p_value(0.1, 4).unwrap(), SMALL);

        let outlier = shapiro_wilk(&[0.0, 0.0, 0.0, 1.0]).unwrap();
        assert!(outlier.p_value > SMALL && outlier.p_value < 0.05);
    }

    #[test]
    fn test_reference_sample() {
        let data = [148.0, 154.0, 158.0, 160.0, 161.0, 162.0, 166.0, 170.0, 182.0, 195.0, 236.0];
        let outcome = shapiro_wilk(&data).unwrap();
        assert!((outcome.statistic - 0.788815).abs() < 1e-5);
        assert!((outcome.p_value - 0.006704).abs() < 1e-5);
    }

    #[test]
    fn test_three_values_use_exact_p() {
        let outcome = shapiro_wilk(&[1.0, 2.0, 4.0]).unwrap();
        assert!((outcome.statistic - 0.964286).abs() < 1e-5);
        assert!((outcome.p_value - 0.636887).abs() < 1e-5);

        let linear = shapiro_wilk(&[100.0, 110.0, 120.0]).unwrap();
        assert!((linear.p_value - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_larger_sample_branch() {
        let data = [2.1, 3.4, 1.9, 5.6, 4.4, 3.3, 2.8, 3.9, 4.1, 3.0, 2.5, 3.6, 4.8, 3.1];
        let outcome = shapiro_wilk(&data).unwrap();
        assert!((outcome.statistic - 0.980440).abs() < 1e-5);
        assert!(outcome.p_value > 0.9);
    }

    #[test]
    fn test_outlier_rejects_normality() {
        let data = [1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 100.0];
        let outcome = shapiro_wilk(&data).unwrap();
        assert!((outcome.statistic - 0.365721).abs() < 1e-5);
        assert!(outcome.p_value < 0.001);
    }

    #[test]
    fn test_small_and_constant_samples() {
        let error = shapiro_wilk(&[1.0, 2.0]).unwrap_err();
        assert!(matches!(error, AppError::InsufficientSample { needed: 3, got: 2 }));

        let constant = shapiro_wilk(&[5.0; 6]).unwrap();
        assert_eq!(constant.p_value, 1.0);
    }
}
