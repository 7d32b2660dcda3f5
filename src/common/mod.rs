//! Utilities shared across numint modules.

pub mod jacobian;

pub use jacobian::{banded_jacobian, dense_jacobian};
