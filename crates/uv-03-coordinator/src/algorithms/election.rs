//! # Coordinator Election
//!
//! `coordinator(block) = eligible_sorted[(block / range_size) % len]`

use shared_types::UniversalValidator;

use crate::domain::CoordinatorError;

/// Coordinator-eligible validators sorted by address ascending.
pub fn eligible_sorted(validators: &[UniversalValidator]) -> Vec<&UniversalValidator> {
    let mut eligible: Vec<&UniversalValidator> = validators
        .iter()
        .filter(|v| v.status.is_coordinator_eligible())
        .collect();
    eligible.sort_by(|a, b| a.validator_address.cmp(&b.validator_address));
    eligible
}

/// Elect the coordinator for `block_num`.
///
/// # Errors
///
/// - [`CoordinatorError::InvalidBlockNumber`] for negative blocks
/// - [`CoordinatorError::NoEligibleValidators`] when nobody is Active or PendingJoin
/// - [`CoordinatorError::InvalidConfig`] for a zero range size
pub fn select_coordinator(
    block_num: i64,
    validators: &[UniversalValidator],
    range_size: u64,
) -> Result<&UniversalValidator, CoordinatorError> {
    if block_num < 0 {
        return Err(CoordinatorError::InvalidBlockNumber(block_num));
    }
    if range_size == 0 {
        return Err(CoordinatorError::InvalidConfig(
            "coordinator_range_size must be > 0".to_string(),
        ));
    }

    let eligible = eligible_sorted(validators);
    if eligible.is_empty() {
        return Err(CoordinatorError::NoEligibleValidators);
    }

    let epoch = block_num as u64 / range_size;
    let index = (epoch % eligible.len() as u64) as usize;
    Ok(eligible[index])
}
