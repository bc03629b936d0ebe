//! # Shared Types Crate
//!
//! Cross-subsystem entities and contracts for the Universal Validator
//! coordination layer.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: chain configuration and validator entities
//!   are defined once and consumed by the cache, registry, coordinator and
//!   broadcaster crates.
//! - **Closed enumerations**: VM type and validator status are
//!   tagged enums; raw integers are converted with `TryFrom` and rejected
//!   when unknown.
//! - **Explicit lifecycles**: background workers receive a [`RunContext`]
//!   instead of spawning themselves from constructors.

pub mod chain;
pub mod client;
pub mod errors;
pub mod lifecycle;
pub mod validator;

pub use chain::*;
pub use client::*;
pub use errors::*;
pub use lifecycle::{ContextError, RunContext, RunHandle};
pub use validator::*;
