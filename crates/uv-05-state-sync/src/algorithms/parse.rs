//! JSON extraction for `/status`, `/block` and `/commit` responses.

use serde_json::Value;

/// Why a body could not be used.
pub type ParseResult<T> = Result<T, String>;

fn parse_json(body: &[u8]) -> ParseResult<Value> {
    serde_json::from_slice(body).map_err(|e| format!("invalid JSON: {}", e))
}

fn lookup<'a>(value: &'a Value, path: &[&str]) -> ParseResult<&'a Value> {
    path.iter()
        .try_fold(value, |v, key| v.get(*key))
        .ok_or_else(|| format!("missing field {}", path.join(".")))
}

/// Height encoded as a JSON string or number.
fn as_height(value: &Value) -> ParseResult<u64> {
    match value {
        Value::String(s) => s
            .trim()
            .parse::<u64>()
            .map_err(|_| format!("invalid height {:?}", s)),
        Value::Number(n) => n.as_u64().ok_or_else(|| format!("invalid height {}", n)),
        other => Err(format!("invalid height {}", other)),
    }
}

/// Validate hex and uppercase it.
pub fn normalize_hash(hash: &str) -> ParseResult<String> {
    let trimmed = hash.trim();
    let trimmed = trimmed.strip_prefix("0x").unwrap_or(trimmed);
    if trimmed.is_empty() {
        return Err("empty hash".to_string());
    }
    hex::decode(trimmed).map_err(|e| format!("invalid hash {:?}: {}", hash, e))?;
    Ok(trimmed.to_ascii_uppercase())
}

fn hash_at(body: &[u8], path: &[&str]) -> ParseResult<String> {
    let json = parse_json(body)?;
    let hash = lookup(&json, path)?
        .as_str()
        .ok_or_else(|| format!("{} is not a string", path.join(".")))?;
    normalize_hash(hash)
}

/// `result.sync_info.latest_block_height` from `/status`.
pub fn parse_latest_height(body: &[u8]) -> ParseResult<u64> {
    let json = parse_json(body)?;
    as_height(lookup(&json, &["result", "sync_info", "latest_block_height"])?)
}

/// `result.block_id.hash` from `/block`.
pub fn parse_block_hash(body: &[u8]) -> ParseResult<String> {
    hash_at(body, &["result", "block_id", "hash"])
}

/// `result.signed_header.commit.block_id.hash` from `/commit`.
pub fn parse_commit_hash(body: &[u8]) -> ParseResult<String> {
    hash_at(body, &["result", "signed_header", "commit", "block_id", "hash"])
}
