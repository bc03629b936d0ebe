//! # UV-03 Coordinator
//!
//! Maintains the cached Universal Validator set and elects, per block, the
//! validator that coordinates threshold-signing rounds.
//!
//! **Architecture:** Hexagonal (DDD + Ports/Adapters)
//!
//! ## Election
//!
//! Selection is a pure function of `(block, eligible set, range size)`:
//! eligible validators (Active, PendingJoin) are sorted by address and the
//! coordinator for a block is `eligible[(block / range) % len]`. Every node
//! holding the same set agrees without an extra consensus round.
//!
//! ## Module Structure
//!
//! ```text
//! uv-03-coordinator/
//! ├── domain/          # CoordinatorError
//! ├── algorithms/      # select_coordinator, eligible_sorted
//! ├── ports/           # ValidatorSetSource + mock
//! ├── application/     # UvManager (cache + refresh loop)
//! └── config.rs        # CoordinatorConfig
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod algorithms;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;

// Re-exports
pub use algorithms::{eligible_sorted, select_coordinator};
pub use application::UvManager;
pub use config::CoordinatorConfig;
pub use domain::CoordinatorError;
pub use ports::{MockValidatorSetSource, StaticValidatorSet, ValidatorSetSource};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
