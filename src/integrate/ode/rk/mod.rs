//! Explicit Runge-Kutta steppers.
//!
//! Implements RK23 (Bogacki-Shampine) and RK45 (Dormand-Prince). Both are
//! first-same-as-last: the derivative at the end of an accepted step is the
//! first stage of the next one.

mod rk23;
mod rk45;

pub(crate) use rk23::rk23_step;
pub(crate) use rk45::rk45_step;
