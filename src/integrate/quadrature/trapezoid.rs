//! Trapezoidal rule for sampled data.
//!
//! Exact for piecewise-linear data, `O(h²)` for smooth functions. Samples
//! may be irregularly spaced; decreasing `x` integrates backwards.

use crate::integrate::error::{IntegrateError, IntegrateResult};

/// Check a `(y, x)` sample series before integrating it.
///
/// Fails with [`IntegrateError::InvalidInput`] on a length mismatch, fewer
/// than `min_points` samples or any non-finite value. With `increasing`, `x`
/// must also be strictly increasing.
pub(super) fn validate_samples(
    name: &str,
    y: &[f64],
    x: &[f64],
    min_points: usize,
    increasing: bool,
) -> IntegrateResult<()> {
    if y.len() != x.len() {
        return Err(IntegrateError::InvalidInput {
            context: format!(
                "{name}: x and y must have same length (got {} and {})",
                x.len(),
                y.len()
            ),
        });
    }
    validate_values(name, y, min_points)?;
    if let Some(i) = x.iter().position(|v| !v.is_finite()) {
        return Err(IntegrateError::InvalidInput {
            context: format!("{name}: x[{i}] is not finite"),
        });
    }
    if increasing {
        if let Some(i) = x.windows(2).position(|w| w[1] <= w[0]) {
            return Err(IntegrateError::InvalidInput {
                context: format!("{name}: x must be strictly increasing (x[{}] >= x[{}])", i, i + 1),
            });
        }
    }
    Ok(())
}

/// Check sample count and finiteness of `y`.
pub(super) fn validate_values(name: &str, y: &[f64], min_points: usize) -> IntegrateResult<()> {
    if y.len() < min_points {
        return Err(IntegrateError::InvalidInput {
            context: format!("{name}: need at least {min_points} points, got {}", y.len()),
        });
    }
    if let Some(i) = y.iter().position(|v| !v.is_finite()) {
        return Err(IntegrateError::InvalidInput {
            context: format!("{name}: y[{i}] is not finite"),
        });
    }
    Ok(())
}

/// Check a uniform sample spacing.
pub(super) fn validate_spacing(name: &str, dx: f64) -> IntegrateResult<()> {
    if !dx.is_finite() || dx <= 0.0 {
        return Err(IntegrateError::InvalidInput {
            context: format!("{name}: dx must be finite and positive, got {dx}"),
        });
    }
    Ok(())
}

/// Integrate sampled data with the composite trapezoidal rule.
///
/// Computes `Σ (x[i+1] − x[i]) · (y[i] + y[i+1]) / 2`.
///
/// # Errors
///
/// [`IntegrateError::InvalidInput`] if the arrays differ in length, hold
/// fewer than 2 points, or contain non-finite values.
///
/// # Example
///
/// ```
/// use numint::integrate::trapezoid;
///
/// // Piecewise-linear data is integrated exactly
/// let x = [0.0, 0.5, 2.0, 3.0];
/// let y = [1.0, 2.0, 2.0, 0.0];
/// let result = trapezoid(&y, &x).unwrap();
/// assert!((result - (0.75 + 3.0 + 1.0)).abs() < 1e-12);
/// ```
pub fn trapezoid(y: &[f64], x: &[f64]) -> IntegrateResult<f64> {
    validate_samples("trapezoid", y, x, 2, false)?;
    Ok(x.windows(2)
        .zip(y.windows(2))
        .map(|(xs, ys)| 0.5 * (xs[1] - xs[0]) * (ys[0] + ys[1]))
        .sum())
}

/// Trapezoidal rule for samples spaced `dx` apart.
///
/// # Example
///
/// ```
/// use numint::integrate::trapezoid_uniform;
///
/// let y = [0.0, 1.0, 2.0, 3.0];
/// assert!((trapezoid_uniform(&y, 0.5).unwrap() - 2.25).abs() < 1e-12);
/// ```
pub fn trapezoid_uniform(y: &[f64], dx: f64) -> IntegrateResult<f64> {
    validate_values("trapezoid_uniform", y, 2)?;
    validate_spacing("trapezoid_uniform", dx)?;
    let n = y.len();
    let interior: f64 = y[1..n - 1].iter().sum();
    Ok(dx * (0.5 * (y[0] + y[n - 1]) + interior))
}

/// Running trapezoidal integral.
///
/// Element `i` of the result is the integral from `x[0]` to `x[i]`; the first
/// element is always zero.
///
/// # Example
///
/// ```
/// use numint::integrate::cumulative_trapezoid;
///
/// // Cumulative integral of y = 2x is x²
/// let x = [0.0, 1.0, 2.0, 3.0];
/// let y = [0.0, 2.0, 4.0, 6.0];
/// let result = cumulative_trapezoid(&y, &x).unwrap();
/// assert_eq!(result, vec![0.0, 1.0, 4.0, 9.0]);
/// ```
pub fn cumulative_trapezoid(y: &[f64], x: &[f64]) -> IntegrateResult<Vec<f64>> {
    validate_samples("cumulative_trapezoid", y, x, 2, false)?;
    let mut total = 0.0;
    let mut out = Vec::with_capacity(y.len());
    out.push(0.0);
    for (xs, ys) in x.windows(2).zip(y.windows(2)) {
        total += 0.5 * (xs[1] - xs[0]) * (ys[0] + ys[1]);
        out.push(total);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    #[test]
    fn test_trapezoid_piecewise_linear_exact() {
        // Tent function on irregular samples
        let x = [0.0, 0.3, 1.0, 1.7, 2.0];
        let y: Vec<f64> = x.iter().map(|&v: &f64| 1.0 - (v - 1.0).abs()).collect();
        let result = trapezoid(&y, &x).unwrap();
        assert!((result - 1.0).abs() < 1e-14);
    }

    #[test]
    fn test_trapezoid_sin() {
        let n = 1001;
        let x: Vec<f64> = (0..n).map(|i| PI * i as f64 / (n - 1) as f64).collect();
        let y: Vec<f64> = x.iter().map(|&xi| xi.sin()).collect();
        let result = trapezoid(&y, &x).unwrap();
        assert!((result - 2.0).abs() < 1e-5);
    }

    #[test]
    fn test_trapezoid_decreasing_x() {
        let x = [2.0, 1.0, 0.0];
        let y = [2.0, 1.0, 0.0];
        assert!((trapezoid(&y, &x).unwrap() + 2.0).abs() < 1e-14);
    }

    #[test]
    fn test_trapezoid_uniform_matches_general() {
        let n = 101;
        let dx = 0.01;
        let x: Vec<f64> = (0..n).map(|i| i as f64 * dx).collect();
        let y: Vec<f64> = x.iter().map(|&v| v * v).collect();
        let a = trapezoid_uniform(&y, dx).unwrap();
        let b = trapezoid(&y, &x).unwrap();
        assert!((a - b).abs() < 1e-12);
        assert!((a - 1.0 / 3.0).abs() < 1e-4);
    }

    #[test]
    fn test_cumulative_trapezoid_irregular() {
        let x = [0.0, 0.5, 1.0, 1.5, 2.0];
        let y: Vec<f64> = x.iter().map(|&xi| 2.0 * xi).collect();
        let result = cumulative_trapezoid(&y, &x).unwrap();
        for (r, xi) in result.iter().zip(&x) {
            assert!((r - xi * xi).abs() < 1e-12);
        }
    }

    #[test]
    fn test_trapezoid_errors() {
        assert!(trapezoid(&[1.0, 2.0], &[0.0, 1.0, 2.0]).is_err());
        assert!(trapezoid(&[1.0], &[0.0]).is_err());
        assert!(trapezoid(&[1.0, f64::NAN], &[0.0, 1.0]).is_err());
        assert!(trapezoid(&[1.0, 2.0], &[0.0, f64::INFINITY]).is_err());
        assert!(trapezoid_uniform(&[1.0, 2.0], 0.0).is_err());
        assert!(cumulative_trapezoid(&[1.0], &[0.0]).is_err());
    }
}
