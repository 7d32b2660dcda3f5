//! Dense output for ODE solvers using Hermite interpolation.
//!
//! For a completed step from `(t_old, y_old)` to `(t_new, y_new)` with
//! derivatives `f_old` and `f_new`, the cubic Hermite interpolant is
//!
//! ```text
//! θ = (t − t_old) / h,  h = t_new − t_old,  dy = y_new − y_old
//! y(θ) = y_old + θ·h·f_old + θ²·a + θ³·b
//! a = 3·dy − h·(2·f_old + f_new)
//! b = −2·dy + h·(f_old + f_new)
//! ```
//!
//! It matches the state and derivative at both ends, so consecutive
//! segments join continuously. `h` is negative for a backward solve and the
//! formulas hold unchanged.

/// Endpoint data of one accepted step.
#[derive(Debug, Clone)]
pub struct DenseOutputStep {
    /// Start time of the step.
    pub t_old: f64,

    /// End time of the step.
    pub t_new: f64,

    /// State at start of step.
    pub y_old: Vec<f64>,

    /// State at end of step.
    pub y_new: Vec<f64>,

    /// Derivative at start of step: f(t_old, y_old).
    pub f_old: Vec<f64>,

    /// Derivative at end of step: f(t_new, y_new).
    pub f_new: Vec<f64>,
}

impl DenseOutputStep {
    /// Signed step size.
    pub fn h(&self) -> f64 {
        self.t_new - self.t_old
    }

    /// Check if a time is within this step.
    pub fn contains(&self, t: f64) -> bool {
        let (lo, hi) = if self.t_old <= self.t_new {
            (self.t_old, self.t_new)
        } else {
            (self.t_new, self.t_old)
        };
        t >= lo && t <= hi
    }

    /// Evaluate the interpolant at `t`, clamped to the step.
    pub fn eval(&self, t: f64) -> Vec<f64> {
        let h = self.h();
        let theta = if h != 0.0 { (t - self.t_old) / h } else { 0.0 };
        if theta <= 0.0 {
            return self.y_old.clone();
        }
        if theta >= 1.0 {
            return self.y_new.clone();
        }

        let theta_sq = theta * theta;
        let theta_cu = theta_sq * theta;
        (0..self.y_old.len())
            .map(|i| {
                let dy = self.y_new[i] - self.y_old[i];
                let hf_old = h * self.f_old[i];
                let hf_new = h * self.f_new[i];
                let a = 3.0 * dy - 2.0 * hf_old - hf_new;
                let b = -2.0 * dy + hf_old + hf_new;
                self.y_old[i] + theta * hf_old + theta_sq * a + theta_cu * b
            })
            .collect()
    }
}

/// Piecewise interpolant over every accepted step of a solve.
#[derive(Debug, Clone, Default)]
pub struct DenseOutput {
    steps: Vec<DenseOutputStep>,
}

impl DenseOutput {
    pub(crate) fn push(&mut self, step: DenseOutputStep) {
        self.steps.push(step);
    }

    /// Number of stored segments.
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Time range covered as `(start, end)` in the order of integration,
    /// `None` before the first accepted step.
    pub fn span(&self) -> Option<(f64, f64)> {
        Some((self.steps.first()?.t_old, self.steps.last()?.t_new))
    }

    /// Evaluate at `t`, or `None` outside the covered range.
    pub fn eval(&self, t: f64) -> Option<Vec<f64>> {
        let (start, end) = self.span()?;
        let forward = end >= start;
        let inside = if forward {
            t >= start && t <= end
        } else {
            t <= start && t >= end
        };
        if !inside {
            return None;
        }
        // First segment whose end reaches t
        let idx = self
            .steps
            .partition_point(|s| if forward { s.t_new < t } else { s.t_new > t });
        self.steps.get(idx).map(|s| s.eval(t))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cubic_step(t_old: f64, t_new: f64) -> DenseOutputStep {
        // y = t³ − t, y' = 3t² − 1
        let y = |t: f64| t * t * t - t;
        let f = |t: f64| 3.0 * t * t - 1.0;
        DenseOutputStep {
            t_old,
            t_new,
            y_old: vec![y(t_old)],
            y_new: vec![y(t_new)],
            f_old: vec![f(t_old)],
            f_new: vec![f(t_new)],
        }
    }

    #[test]
    fn test_hermite_reproduces_cubic() {
        let step = cubic_step(0.5, 2.0);
        for t in [0.5, 0.75, 1.0, 1.3, 2.0] {
            let exact = t * t * t - t;
            assert!((step.eval(t)[0] - exact).abs() < 1e-12, "t = {}", t);
        }
        assert!(step.contains(1.0));
        assert!(!step.contains(2.5));
    }

    #[test]
    fn test_dense_output_lookup() {
        let mut dense = DenseOutput::default();
        assert!(dense.eval(0.0).is_none());

        dense.push(cubic_step(0.0, 1.0));
        dense.push(cubic_step(1.0, 2.5));
        assert_eq!(dense.len(), 2);
        assert_eq!(dense.span(), Some((0.0, 2.5)));

        for t in [0.0, 0.4, 1.0, 1.7, 2.5] {
            let y = dense.eval(t).unwrap();
            assert!((y[0] - (t * t * t - t)).abs() < 1e-12);
        }
        assert!(dense.eval(-0.1).is_none());
        assert!(dense.eval(2.6).is_none());
        assert!(dense.eval(f64::NAN).is_none());
    }

    #[test]
    fn test_backward_segments() {
        let step = cubic_step(2.0, 0.5);
        assert!(step.h() < 0.0);
        assert!(step.contains(1.0));
        assert!(!step.contains(2.5));
        for t in [2.0, 1.3, 0.75, 0.5] {
            assert!((step.eval(t)[0] - (t * t * t - t)).abs() < 1e-12, "t = {}", t);
        }

        let mut dense = DenseOutput::default();
        dense.push(cubic_step(2.5, 1.0));
        dense.push(cubic_step(1.0, 0.0));
        assert_eq!(dense.span(), Some((2.5, 0.0)));
        for t in [2.5, 1.7, 1.0, 0.4, 0.0] {
            let y = dense.eval(t).unwrap();
            assert!((y[0] - (t * t * t - t)).abs() < 1e-12, "t = {}", t);
        }
        assert!(dense.eval(2.6).is_none());
        assert!(dense.eval(-0.1).is_none());
    }
}
