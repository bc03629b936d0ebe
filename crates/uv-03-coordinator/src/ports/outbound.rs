//! # Outbound Ports
//!
//! Validator-set query against the on-chain validator registry.

use async_trait::async_trait;
use parking_lot::Mutex;
use shared_types::UniversalValidator;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::domain::CoordinatorError;

/// Source of the Universal Validator set.
#[async_trait]
pub trait ValidatorSetSource: Send + Sync {
    /// Validators as published by the registry. The manager applies its own
    /// eligibility filter, so ineligible entries may be included.
    async fn get_eligible_validators(&self) -> Result<Vec<UniversalValidator>, CoordinatorError>;
}

/// Fixed validator set, e.g. loaded from configuration.
#[derive(Debug, Clone, Default)]
pub struct StaticValidatorSet {
    validators: Vec<UniversalValidator>,
}

impl StaticValidatorSet {
    /// Source always answering `validators`.
    pub fn new(validators: Vec<UniversalValidator>) -> Self {
        Self { validators }
    }
}

#[async_trait]
impl ValidatorSetSource for StaticValidatorSet {
    async fn get_eligible_validators(&self) -> Result<Vec<UniversalValidator>, CoordinatorError> {
        Ok(self.validators.clone())
    }
}

// =============================================================================
// Mock Implementations for Testing
// =============================================================================

/// Mock validator set source with scripted failures.
#[derive(Default)]
pub struct MockValidatorSetSource {
    validators: Mutex<Vec<UniversalValidator>>,
    failures: Mutex<VecDeque<String>>,
    calls: AtomicUsize,
}

impl MockValidatorSetSource {
    /// Source answering `validators`.
    pub fn new(validators: Vec<UniversalValidator>) -> Self {
        Self {
            validators: Mutex::new(validators),
            ..Default::default()
        }
    }

    /// Replace the answer.
    pub fn set_validators(&self, validators: Vec<UniversalValidator>) {
        *self.validators.lock() = validators;
    }

    /// Fail the next call.
    pub fn push_failure(&self, message: &str) {
        self.failures.lock().push_back(message.to_string());
    }

    /// Calls so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ValidatorSetSource for MockValidatorSetSource {
    async fn get_eligible_validators(&self) -> Result<Vec<UniversalValidator>, CoordinatorError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let failure = self.failures.lock().pop_front();
        if let Some(msg) = failure {
            return Err(CoordinatorError::Source(msg));
        }
        Ok(self.validators.lock().clone())
    }
}
