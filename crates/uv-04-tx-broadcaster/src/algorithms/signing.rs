//! Rebuild the signing request and signature from persisted [`SigningData`].

use shared_types::UnsignedOutboundTxReq;

use crate::domain::{BroadcastError, SigningData};

/// Decode hex with an optional `0x` prefix.
pub fn decode_hex(field: &'static str, value: &str) -> Result<Vec<u8>, BroadcastError> {
    let trimmed = value
        .strip_prefix("0x")
        .or_else(|| value.strip_prefix("0X"))
        .unwrap_or(value);
    hex::decode(trimmed).map_err(|e| BroadcastError::InvalidHex {
        field,
        reason: e.to_string(),
    })
}

/// Fit a signature to the length the destination accepts. A recoverable
/// signature one byte longer has its trailing recovery byte dropped.
pub fn normalize_signature(
    mut signature: Vec<u8>,
    expected_len: usize,
) -> Result<Vec<u8>, BroadcastError> {
    if signature.len() == expected_len + 1 {
        signature.truncate(expected_len);
    }
    if signature.len() != expected_len {
        return Err(BroadcastError::InvalidSignatureLength {
            expected: expected_len,
            actual: signature.len(),
        });
    }
    Ok(signature)
}

/// Rebuild the unsigned request handed to the tx builder.
pub fn reconstruct_signing_req(data: &SigningData) -> Result<UnsignedOutboundTxReq, BroadcastError> {
    let signing_hash = decode_hex("signing_hash", &data.signing_hash)?;
    let gas_price = if data.gas_price.is_empty() {
        0
    } else {
        data.gas_price
            .parse::<u128>()
            .map_err(|_| BroadcastError::InvalidGasPrice(data.gas_price.clone()))?
    };

    Ok(UnsignedOutboundTxReq {
        signing_hash,
        nonce: data.nonce,
        gas_price,
    })
}
