//! Single-position arm selectors
//!
//! Each selector implements [`crate::ArmSelector`] over a fixed arm-index
//! space and commits a pull on every `select` call.

pub mod thompson;
pub mod ucb;

pub use thompson::ThompsonSampling;
pub use ucb::{ConfidenceBound, TunedBound, Ucb, Ucb1, Ucb1Bound, UcbTuned};
