//! Hex canonicalization and parsing
//!
//! Test fixtures and client nodes disagree freely about `0x` prefixes, letter
//! case and zero padding. Every equality check in the verification protocol
//! goes through one of these helpers.

use crate::error::{ModelError, ModelResult};
use primitive_types::U256;

/// Canonical form used for hash comparisons: lower-case, no `0x` prefix.
///
/// ```
/// use probe_model::canonicalize;
/// assert_eq!(canonicalize("0xAB"), "ab");
/// assert_eq!(canonicalize("ab"), "ab");
/// ```
pub fn canonicalize(value: &str) -> String {
    strip_hex_prefix(value).to_ascii_lowercase()
}

/// Strip a single optional `0x`/`0X` prefix
pub fn strip_hex_prefix(value: &str) -> &str {
    value
        .strip_prefix("0x")
        .or_else(|| value.strip_prefix("0X"))
        .unwrap_or(value)
}

/// Left-pad a hex word to 64 digits and prefix it with `0x`.
///
/// Values already longer than 64 digits are only prefixed.
pub fn pad_hash(value: &str) -> String {
    format!("0x{:0>64}", strip_hex_prefix(value))
}

/// Prefix `0x` when it is missing (empty strings are left alone)
pub fn ensure_hex_prefix(value: &str) -> String {
    if value.is_empty() || value.starts_with("0x") {
        value.to_string()
    } else {
        format!("0x{}", value)
    }
}

/// Parse a hex quantity (prefix optional, empty means zero)
pub fn parse_hex_u256(value: &str) -> ModelResult<U256> {
    let digits = strip_hex_prefix(value.trim());
    if digits.is_empty() {
        return Ok(U256::zero());
    }
    U256::from_str_radix(digits, 16).map_err(|e| ModelError::Hex(format!("`{}`: {}", value, e)))
}

/// Parse a hex quantity that must fit in 64 bits
pub fn parse_hex_u64(value: &str) -> ModelResult<u64> {
    let digits = strip_hex_prefix(value.trim());
    if digits.is_empty() {
        return Ok(0);
    }
    u64::from_str_radix(digits, 16).map_err(|e| ModelError::Hex(format!("`{}`: {}", value, e)))
}

/// Decode a hex byte string (prefix optional)
pub fn decode_hex_bytes(value: &str) -> ModelResult<Vec<u8>> {
    let digits = strip_hex_prefix(value.trim());
    if digits.is_empty() {
        return Ok(Vec::new());
    }
    Ok(hex::decode(digits)?)
}

/// Keep only the trailing 64 characters of a canonical hash
pub fn low_word(canonical: &str) -> &str {
    let start = canonical.len().saturating_sub(64);
    canonical.get(start..).unwrap_or(canonical)
}
