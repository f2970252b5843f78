//! Configuration consumed by the core (spec §6.4).

use crate::error::{PolError, Result};

/// Parameters for building an attestation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildConfig {
    /// Maximum permitted per-leaf amount after splitting, in satoshis.
    pub threshold: u64,
    /// Identifies the attestation epoch.
    pub block_height: u64,
}

impl BuildConfig {
    /// Rejects `threshold == 0`: every nonzero liability would split
    /// forever trying (and failing) to reach zero, which is not a hang —
    /// `split_below` always terminates — but is nonsensical input this
    /// rejects early rather than accepting silently.
    pub fn new(threshold: u64, block_height: u64) -> Result<Self> {
        if threshold == 0 {
            return Err(PolError::InvalidInput(
                "threshold must be positive".to_string(),
            ));
        }
        Ok(Self {
            threshold,
            block_height,
        })
    }
}

/// Parameters for verifying an attestation and recovering balances.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VerifyConfig {
    pub block_height: u64,
}

impl VerifyConfig {
    pub fn new(block_height: u64) -> Self {
        Self { block_height }
    }
}
