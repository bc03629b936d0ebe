//! # Algorithms
//!
//! Pure coordinator election, no I/O.

pub mod election;

pub use election::{eligible_sorted, select_coordinator};
