//! Checks compiled elementwise operators against host reference functions
//! on every backend that is available in the current process.

pub mod allclose;
pub mod harness;
pub mod random;
pub mod reference;

pub use allclose::{allclose, assert_allclose};
pub use harness::{check_unary, check_unary_with_inputs, default_cases, HarnessConfig, HarnessReport, UnaryCase};
