//! Peer address normalisation.

use libp2p::multiaddr::Protocol;
use libp2p::{Multiaddr, PeerId};

use super::errors::TransportError;

/// Parse `raw` into dialable multiaddrs for `expected`.
///
/// Blank entries are skipped. A trailing `/p2p/<id>` must name `expected`
/// and is stripped.
pub fn normalize_addrs(raw: &[String], expected: &PeerId) -> Result<Vec<Multiaddr>, TransportError> {
    let mut out = Vec::with_capacity(raw.len());
    for addr in raw {
        let addr = addr.trim();
        if addr.is_empty() {
            continue;
        }
        let mut maddr: Multiaddr = addr.parse().map_err(|e: libp2p::multiaddr::Error| {
            TransportError::InvalidMultiaddr {
                addr: addr.to_string(),
                reason: e.to_string(),
            }
        })?;

        let embedded = match maddr.iter().last() {
            Some(Protocol::P2p(id)) => Some(id),
            _ => None,
        };
        if let Some(id) = embedded {
            if id != *expected {
                return Err(TransportError::PeerMismatch {
                    expected: expected.to_string(),
                    got: id.to_string(),
                });
            }
            maddr.pop();
        }
        out.push(maddr);
    }

    if out.is_empty() {
        return Err(TransportError::NoUsableAddresses);
    }
    Ok(out)
}

/// True when the address binds an unspecified IP (`0.0.0.0` or `::`).
pub fn is_unspecified(addr: &Multiaddr) -> bool {
    addr.iter().any(|p| match p {
        Protocol::Ip4(ip) => ip.is_unspecified(),
        Protocol::Ip6(ip) => ip.is_unspecified(),
        _ => false,
    })
}
