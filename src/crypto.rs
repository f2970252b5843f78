//! Cryptographic primitives (C1): hashing, fixed-width integer encoding,
//! hex/base32 codecs, and secure randomness.
//!
//! Every function here is pure with respect to its explicit inputs; the only
//! stateful dependency in the whole core lives in `secure_random_u64` and
//! `secure_random_uniform`, which draw from the OS CSPRNG.

use hmac::{Hmac, Mac};
use rand::rngs::OsRng;
use rand::Rng;
use sha2::{Digest, Sha256};

use crate::error::{PolError, Result};

type HmacSha256 = Hmac<Sha256>;

/// SHA-256 of `bytes`.
pub fn sha256(bytes: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hasher.finalize().into()
}

/// HMAC-SHA-256 of `msg` keyed by `key`.
///
/// `Hmac::new_from_slice` only fails for key lengths the underlying block
/// cipher rejects, which never happens for SHA-256 (it accepts any key
/// length); callers never observe that failure mode here.
pub fn hmac_sha256(key: &[u8], msg: &[u8]) -> [u8; 32] {
    let mut mac =
        HmacSha256::new_from_slice(key).expect("HMAC-SHA256 accepts keys of any length");
    mac.update(msg);
    mac.finalize().into_bytes().into()
}

/// Little-endian 8-byte encoding of a 64-bit integer.
pub fn le64(x: u64) -> [u8; 8] {
    x.to_le_bytes()
}

/// Hex-encode `bytes` as lowercase.
pub fn hex_encode_lower(bytes: &[u8]) -> String {
    hex::encode(bytes)
}

/// Decode a strictly lowercase hex string. Uppercase characters are rejected.
pub fn hex_decode_lower(s: &str) -> Result<Vec<u8>> {
    if s.is_empty() {
        return Err(PolError::InvalidInput("empty hex string".to_string()));
    }
    if s.chars().any(|c| c.is_ascii_uppercase()) {
        return Err(PolError::InvalidInput(format!(
            "hex string contains uppercase characters: {s}"
        )));
    }
    hex::decode(s).map_err(|e| PolError::InvalidInput(format!("invalid hex: {e}")))
}

/// Decode an unpadded RFC 4648 base32 string into the big-endian integer it
/// represents. Used only by the external CLI to parse `account_uid` strings.
pub fn base32_decode_unpadded(s: &str) -> Result<u64> {
    let bytes = base32::decode(base32::Alphabet::Rfc4648 { padding: false }, s)
        .ok_or_else(|| PolError::InvalidInput(format!("invalid base32 string: {s}")))?;

    if bytes.len() > 8 {
        return Err(PolError::InvalidInput(format!(
            "base32 string decodes to more than 8 bytes: {s}"
        )));
    }

    Ok(bytes.iter().fold(0u64, |acc, b| (acc << 8) | u64::from(*b)))
}

/// A cryptographically secure random `u64` in `[0, 2^64)`.
pub fn secure_random_u64() -> u64 {
    let mut rng = OsRng;
    rng.gen::<u64>()
}

/// A cryptographically secure, uniformly distributed random integer in
/// `[1, n]`. `n` must be at least 1. Uses rand's unbiased range sampling,
/// not a naive modulo reduction, which would skew the distribution for
/// large `n`.
pub fn secure_random_uniform(n: u64) -> Result<u64> {
    if n < 1 {
        return Err(PolError::InvalidInput(
            "secure_random_uniform requires n >= 1".to_string(),
        ));
    }
    let mut rng = OsRng;
    Ok(rng.gen_range(1..=n))
}
