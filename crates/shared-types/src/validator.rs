//! # Universal Validator Entities

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::errors::SharedError;

/// Lifecycle status of a Universal Validator in the on-chain registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UvStatus {
    /// Not set.
    #[default]
    Unspecified,
    /// Fully participating.
    Active,
    /// Admitted, waiting for the next key rotation.
    PendingJoin,
    /// Leaving at the next key rotation.
    PendingLeave,
    /// Not participating.
    Inactive,
}

impl UvStatus {
    /// Only active and joining validators may coordinate a signing round.
    pub fn is_coordinator_eligible(self) -> bool {
        match self {
            UvStatus::Active | UvStatus::PendingJoin => true,
            UvStatus::Unspecified | UvStatus::PendingLeave | UvStatus::Inactive => false,
        }
    }
}

impl TryFrom<i32> for UvStatus {
    type Error = SharedError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(UvStatus::Unspecified),
            1 => Ok(UvStatus::Active),
            2 => Ok(UvStatus::PendingJoin),
            3 => Ok(UvStatus::PendingLeave),
            4 => Ok(UvStatus::Inactive),
            other => Err(SharedError::UnknownValidatorStatus(other)),
        }
    }
}

impl fmt::Display for UvStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            UvStatus::Unspecified => "UNSPECIFIED",
            UvStatus::Active => "ACTIVE",
            UvStatus::PendingJoin => "PENDING_JOIN",
            UvStatus::PendingLeave => "PENDING_LEAVE",
            UvStatus::Inactive => "INACTIVE",
        };
        f.write_str(s)
    }
}

/// An off-chain validator process taking part in threshold signing.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct UniversalValidator {
    /// Operator address (bech32). Total order for coordinator election.
    pub validator_address: String,
    /// TSS public key, hex.
    #[serde(default)]
    pub pubkey: String,
    /// Registry status.
    pub status: UvStatus,
    /// Peer network address (multiaddr or ip:port).
    #[serde(default)]
    pub network_ip: String,
    /// Push chain block at which the validator joined.
    #[serde(default)]
    pub joined_at_block: i64,
}

impl UniversalValidator {
    /// Convenience constructor used by tests and static validator sets.
    pub fn new(validator_address: impl Into<String>, status: UvStatus) -> Self {
        Self {
            validator_address: validator_address.into(),
            status,
            ..Default::default()
        }
    }
}
