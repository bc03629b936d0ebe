//! # Universal Validator Test Suite
//!
//! Unified test crate for flows that span more than one subsystem crate.
//!
//! ## Structure
//!
//! ```text
//! tests/
//! ├── src/integration/
//! │   ├── chain_sync_flow.rs   # cache job → cache → registry job → registry
//! │   ├── broadcast_flow.rs    # registry → broadcaster → event store
//! │   └── transport_flow.rs    # mock and libp2p peers exchanging frames
//! └── benches/
//!     └── uv_benchmarks.rs     # election, candidate heights, frame codec
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p uv-tests
//! cargo test -p uv-tests integration::transport_flow
//! cargo bench -p uv-tests
//! ```

#![allow(dead_code)]

pub mod integration;

use std::time::Duration;

/// Poll `check` every 20ms for up to 5s.
pub async fn eventually<F: Fn() -> bool>(check: F) -> bool {
    for _ in 0..250 {
        if check() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    check()
}
