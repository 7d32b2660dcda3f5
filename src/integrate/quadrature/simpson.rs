//! Composite Simpson's rule for sampled data.
//!
//! Each pair of adjacent intervals `[x_i, x_{i+2}]` is integrated with the
//! parabola through its three samples. With `h0 = x_{i+1} − x_i` and
//! `h1 = x_{i+2} − x_{i+1}`:
//!
//! ```text
//! (h0 + h1)/6 · [ (2 − h1/h0)·y_i + (h0 + h1)²/(h0·h1)·y_{i+1} + (2 − h0/h1)·y_{i+2} ]
//! ```
//!
//! which reduces to `h/3 · (y_i + 4·y_{i+1} + y_{i+2})` on uniform spacing.
//!
//! # Exactness
//!
//! - Any spacing, any count ≥ 3: exact for polynomials of degree ≤ 2.
//! - Uniform spacing, odd count: exact for degree ≤ 3.
//!
//! # Even sample count
//!
//! An even number of samples leaves one unpaired interval at the end. It is
//! integrated over the parabola through the last three samples, so the
//! degree-2 exactness above holds for every count. On uniform data this
//! last-interval weight set is `h/12 · (−y_{n−3} + 8·y_{n−2} + 5·y_{n−1})`.

use super::trapezoid::{validate_samples, validate_spacing, validate_values};
use crate::integrate::error::IntegrateResult;

/// Simpson's rule over the sample series `(x, y)`.
///
/// # Arguments
///
/// * `y` - Function values
/// * `x` - Strictly increasing sample points, any spacing
///
/// # Errors
///
/// [`IntegrateError::InvalidInput`](crate::integrate::IntegrateError::InvalidInput)
/// if the arrays differ in length, hold fewer than 3 points, contain
/// non-finite values, or `x` is not strictly increasing.
///
/// # Example
///
/// ```
/// use numint::integrate::simpson;
///
/// // Irregular samples of a parabola are integrated exactly
/// let x = [0.0, 0.1, 0.5, 0.6, 1.3, 2.0];
/// let y: Vec<f64> = x.iter().map(|&v| 3.0 * v * v - v + 2.0).collect();
/// let result = simpson(&y, &x).unwrap();
/// assert!((result - 10.0).abs() < 1e-12);
/// ```
pub fn simpson(y: &[f64], x: &[f64]) -> IntegrateResult<f64> {
    validate_samples("simpson", y, x, 3, true)?;
    Ok(composite(y, |i| x[i + 1] - x[i]))
}

/// Simpson's rule for samples spaced `dx` apart.
///
/// # Example
///
/// ```
/// use numint::integrate::simpson_uniform;
///
/// // x³ on [0, 2] with 5 samples is exact
/// let y: Vec<f64> = (0..5).map(|i| (0.5 * i as f64).powi(3)).collect();
/// assert!((simpson_uniform(&y, 0.5).unwrap() - 4.0).abs() < 1e-12);
/// ```
pub fn simpson_uniform(y: &[f64], dx: f64) -> IntegrateResult<f64> {
    validate_values("simpson_uniform", y, 3)?;
    validate_spacing("simpson_uniform", dx)?;
    Ok(composite(y, |_| dx))
}

/// `h(i)` is the width of interval `i`, i.e. `x[i+1] − x[i]`.
fn composite<H>(y: &[f64], h: H) -> f64
where
    H: Fn(usize) -> f64,
{
    let n = y.len();
    let paired = if n % 2 == 1 { n } else { n - 1 };

    let mut total = 0.0;
    for i in (0..paired - 2).step_by(2) {
        let (h0, h1) = (h(i), h(i + 1));
        let hsum = h0 + h1;
        total += hsum / 6.0
            * ((2.0 - h1 / h0) * y[i]
                + hsum * hsum / (h0 * h1) * y[i + 1]
                + (2.0 - h0 / h1) * y[i + 2]);
    }

    if paired < n {
        total += last_interval(y, h(n - 3), h(n - 2));
    }
    total
}

/// Integral over `[x_{n−2}, x_{n−1}]` of the parabola through the last
/// three samples.
fn last_interval(y: &[f64], h0: f64, h1: f64) -> f64 {
    let n = y.len();
    let hsum = h0 + h1;
    let w_last = (2.0 * h1 * h1 + 3.0 * h0 * h1) / (6.0 * hsum);
    let w_mid = (h1 * h1 + 3.0 * h0 * h1) / (6.0 * h0);
    let w_first = h1 * h1 * h1 / (6.0 * h0 * hsum);
    w_last * y[n - 1] + w_mid * y[n - 2] - w_first * y[n - 3]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    fn uniform(n: usize, a: f64, b: f64) -> Vec<f64> {
        (0..n)
            .map(|i| a + (b - a) * i as f64 / (n - 1) as f64)
            .collect()
    }

    #[test]
    fn test_uniform_odd_exact_for_cubics() {
        let x = uniform(7, -1.0, 2.0);
        for (coeffs, exact) in [
            ([1.0, 0.0, 0.0, 0.0], 3.0),
            ([0.0, 1.0, 0.0, 0.0], 1.5),
            ([0.0, 0.0, 1.0, 0.0], 3.0),
            ([0.0, 0.0, 0.0, 1.0], 3.75),
            ([2.0, -1.0, 0.5, -0.25], 6.0 - 1.5 + 1.5 - 0.9375),
        ] {
            let y: Vec<f64> = x
                .iter()
                .map(|&v| coeffs[0] + coeffs[1] * v + coeffs[2] * v * v + coeffs[3] * v.powi(3))
                .collect();
            let result = simpson(&y, &x).unwrap();
            assert!(
                (result - exact).abs() < 1e-12,
                "{:?}: {} vs {}",
                coeffs,
                result,
                exact
            );
        }
    }

    #[test]
    fn test_irregular_exact_for_quadratics() {
        let f = |v: f64| 1.0 - 2.0 * v + 0.75 * v * v;
        // ∫₀³ f = 3 − 9 + 6.75
        let exact = 0.75;
        let odd = [0.0, 0.2, 0.9, 1.0, 1.8, 2.1, 3.0];
        let even = [0.0, 0.4, 0.5, 1.6, 2.2, 3.0];
        for x in [&odd[..], &even[..]] {
            let y: Vec<f64> = x.iter().map(|&v| f(v)).collect();
            let result = simpson(&y, x).unwrap();
            assert!((result - exact).abs() < 1e-12, "n = {}: {}", x.len(), result);
        }
    }

    #[test]
    fn test_even_count_policy_on_uniform_data() {
        // Last interval uses h/12 · (−y₀ + 8y₁ + 5y₂)
        let y = [1.0, 4.0, 2.0, 7.0];
        let dx = 0.5;
        let expected = dx / 3.0 * (1.0 + 16.0 + 2.0) + dx / 12.0 * (-4.0 + 16.0 + 35.0);
        assert!((simpson_uniform(&y, dx).unwrap() - expected).abs() < 1e-14);
    }

    #[test]
    fn test_even_count_cubic_is_close_but_not_exact() {
        let x = uniform(8, 0.0, 1.0);
        let y: Vec<f64> = x.iter().map(|&v| v.powi(3)).collect();
        let result = simpson(&y, &x).unwrap();
        let err = (result - 0.25).abs();
        assert!(err < 1e-3);
        assert!(err > 1e-12);
    }

    #[test]
    fn test_three_points() {
        let y = [0.0, 1.0, 4.0];
        assert!((simpson_uniform(&y, 1.0).unwrap() - 8.0 / 3.0).abs() < 1e-14);
    }

    #[test]
    fn test_simpson_sin() {
        let x = uniform(101, 0.0, PI);
        let y: Vec<f64> = x.iter().map(|&v| v.sin()).collect();
        assert!((simpson(&y, &x).unwrap() - 2.0).abs() < 1e-7);
    }

    #[test]
    fn test_simpson_errors() {
        assert!(simpson(&[1.0, 2.0], &[0.0, 1.0, 2.0]).is_err());
        assert!(simpson(&[1.0, 2.0], &[0.0, 1.0]).is_err());
        assert!(simpson(&[1.0, 2.0, 3.0], &[0.0, 2.0, 1.0]).is_err());
        assert!(simpson(&[1.0, 2.0, 3.0], &[0.0, 1.0, 1.0]).is_err());
        assert!(simpson(&[1.0, f64::NAN, 3.0], &[0.0, 1.0, 2.0]).is_err());
        assert!(simpson_uniform(&[1.0, 2.0, 3.0], -1.0).is_err());
    }
}
