//! # UV-01 Transport
//!
//! Point-to-point delivery of protocol messages between Universal
//! Validators.
//!
//! **Architecture:** Hexagonal (DDD + Ports/Adapters)
//!
//! ## Wire Format
//!
//! One message per stream on protocol `/push/tss/1.0.0` (configurable):
//!
//! ```text
//! ┌──────────────────┬──────────────────────────┐
//! │ length: u32 (BE) │ payload: length bytes    │
//! └──────────────────┴──────────────────────────┘
//! ```
//!
//! ## Backends
//!
//! | Backend | Identity | Delivery |
//! |---------|----------|----------|
//! | [`Libp2pTransport`] | Ed25519 keypair | TCP + Noise + Yamux, one stream per frame |
//! | [`MockTransport`] | arbitrary string | direct handler call on a spawned task |
//!
//! ## Module Structure
//!
//! ```text
//! uv-01-transport/
//! ├── domain/          # TransportError, peer address normalisation
//! ├── ports/           # Transport trait, MessageHandler
//! ├── adapters/
//! │   ├── codec.rs     # length-prefixed frames
//! │   ├── identity.rs  # keypair load/generate
//! │   ├── libp2p/      # Libp2pTransport + swarm task
//! │   └── memory.rs    # MockNetwork, MockTransport
//! └── config.rs        # TransportConfig
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod adapters;
pub mod config;
pub mod domain;
pub mod ports;

// Re-exports
pub use adapters::codec::{read_frame, write_frame, MAX_FRAME_LEN};
pub use adapters::identity::{generate_private_key_base64, load_keypair};
pub use adapters::libp2p::Libp2pTransport;
pub use adapters::memory::{MockNetwork, MockTransport};
pub use config::TransportConfig;
pub use domain::TransportError;
pub use ports::{MessageHandler, Transport};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
