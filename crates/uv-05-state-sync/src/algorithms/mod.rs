//! # Algorithms
//!
//! Candidate generation and RPC response parsing. No I/O.

pub mod candidates;
pub mod parse;

pub use candidates::candidate_heights;
pub use parse::{normalize_hash, parse_block_hash, parse_commit_hash, parse_latest_height};
