//! Per-call evaluation bookkeeping for adaptive quadrature.

use std::cell::Cell;
use std::fmt;
use std::time::Instant;

use super::adaptive::QuadOptions;

/// Why subdivision stopped before every cell met its tolerance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum StopReason {
    Limit,
    Depth,
    EvalBudget,
    Deadline,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Limit => write!(f, "subdivision limit reached"),
            Self::Depth => write!(f, "maximum bisection depth reached"),
            Self::EvalBudget => write!(f, "evaluation budget exhausted"),
            Self::Deadline => write!(f, "deadline passed"),
        }
    }
}

/// Counter and budget shared by every level of one top-level call.
///
/// Integrand closures only get `&self`, so the counter is a [`Cell`].
/// A context is never shared between independent invocations.
#[derive(Debug)]
pub(crate) struct EvalContext {
    neval: Cell<usize>,
    max_evals: Option<usize>,
    deadline: Option<Instant>,
}

impl EvalContext {
    pub(crate) fn new(options: &QuadOptions) -> Self {
        Self {
            neval: Cell::new(0),
            max_evals: options.max_evals,
            deadline: options.deadline,
        }
    }

    /// Count one integrand evaluation.
    pub(crate) fn record(&self) {
        self.neval.set(self.neval.get() + 1);
    }

    pub(crate) fn neval(&self) -> usize {
        self.neval.get()
    }

    /// Evaluation budget or deadline hit, checked between cells.
    pub(crate) fn exhausted(&self) -> Option<StopReason> {
        if self.max_evals.is_some_and(|max| self.neval.get() >= max) {
            return Some(StopReason::EvalBudget);
        }
        if self.deadline.is_some_and(|d| Instant::now() >= d) {
            return Some(StopReason::Deadline);
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_eval_budget() {
        let opts = QuadOptions::default().with_max_evals(3);
        let ctx = EvalContext::new(&opts);
        ctx.record();
        ctx.record();
        assert_eq!(ctx.exhausted(), None);
        ctx.record();
        assert_eq!(ctx.neval(), 3);
        assert_eq!(ctx.exhausted(), Some(StopReason::EvalBudget));
    }

    #[test]
    fn test_deadline() {
        let past = Instant::now() - Duration::from_millis(1);
        let ctx = EvalContext::new(&QuadOptions::default().with_deadline(past));
        assert_eq!(ctx.exhausted(), Some(StopReason::Deadline));
    }
}
