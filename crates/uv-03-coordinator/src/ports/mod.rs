//! # Ports Layer

pub mod outbound;

pub use outbound::{MockValidatorSetSource, StaticValidatorSet, ValidatorSetSource};
