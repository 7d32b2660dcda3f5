//! Variable substitutions that map unbounded intervals onto finite ones.
//!
//! | Domain | Substitution | `dx/dt` | `t` range |
//! |--------|--------------|---------|-----------|
//! | `[a, ∞)` | `x = a + t/(1−t)` | `1/(1−t)²` | `[0, 1)` |
//! | `(−∞, b]` | `x = b − t/(1−t)` | `1/(1−t)²` | `[0, 1)` |
//! | `(−∞, ∞)` | `x = t/(1−t²)` | `(1+t²)/(1−t²)²` | `(−1, 1)` |
//!
//! Gauss-Kronrod nodes are strictly interior to every cell, so the singular
//! endpoints `t = ±1` are never evaluated.

/// Integration domain with `a < b`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum Domain {
    Finite { a: f64, b: f64 },
    UpperInfinite { a: f64 },
    LowerInfinite { b: f64 },
    Whole,
}

impl Domain {
    /// Classify an ordered, non-empty interval.
    pub(crate) fn new(a: f64, b: f64) -> Self {
        debug_assert!(a < b);
        match (a.is_infinite(), b.is_infinite()) {
            (false, false) => Self::Finite { a, b },
            (false, true) => Self::UpperInfinite { a },
            (true, false) => Self::LowerInfinite { b },
            (true, true) => Self::Whole,
        }
    }

    /// Bounds of the integration variable after substitution.
    pub(crate) fn t_bounds(&self) -> (f64, f64) {
        match *self {
            Self::Finite { a, b } => (a, b),
            Self::UpperInfinite { .. } | Self::LowerInfinite { .. } => (0.0, 1.0),
            Self::Whole => (-1.0, 1.0),
        }
    }

    /// Map `t` to `(x, dx/dt)`.
    pub(crate) fn map(&self, t: f64) -> (f64, f64) {
        match *self {
            Self::Finite { .. } => (t, 1.0),
            Self::UpperInfinite { a } => {
                let s = 1.0 - t;
                (a + t / s, 1.0 / (s * s))
            }
            Self::LowerInfinite { b } => {
                let s = 1.0 - t;
                (b - t / s, 1.0 / (s * s))
            }
            Self::Whole => {
                let s = 1.0 - t * t;
                (t / s, (1.0 + t * t) / (s * s))
            }
        }
    }

    /// Image of `t` in the original variable, used for diagnostics.
    pub(crate) fn x_at(&self, t: f64) -> f64 {
        match *self {
            Self::UpperInfinite { .. } if t >= 1.0 => f64::INFINITY,
            Self::LowerInfinite { .. } if t >= 1.0 => f64::NEG_INFINITY,
            Self::Whole if t <= -1.0 => f64::NEG_INFINITY,
            Self::Whole if t >= 1.0 => f64::INFINITY,
            _ => self.map(t).0,
        }
    }
}
