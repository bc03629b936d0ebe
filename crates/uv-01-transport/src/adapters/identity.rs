//! Node identity.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use libp2p::identity::Keypair;

use crate::domain::TransportError;

/// Decode a base64 protobuf-encoded private key, or generate a fresh
/// Ed25519 key when none is configured.
pub fn load_keypair(private_key_base64: Option<&str>) -> Result<Keypair, TransportError> {
    let encoded = match private_key_base64.map(str::trim).filter(|s| !s.is_empty()) {
        Some(encoded) => encoded,
        None => return Ok(Keypair::generate_ed25519()),
    };
    let raw = STANDARD
        .decode(encoded)
        .map_err(|e| TransportError::Identity(format!("decode private key: {}", e)))?;
    Keypair::from_protobuf_encoding(&raw)
        .map_err(|e| TransportError::Identity(format!("unmarshal private key: {}", e)))
}

/// A new Ed25519 private key in the format [`load_keypair`] accepts.
pub fn generate_private_key_base64() -> Result<String, TransportError> {
    let raw = Keypair::generate_ed25519()
        .to_protobuf_encoding()
        .map_err(|e| TransportError::Identity(e.to_string()))?;
    Ok(STANDARD.encode(raw))
}
