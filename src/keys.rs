//! Key derivation (C2): `account_subkey` and `attestation_key`.
//!
//! Both derivations are pure SHA-256 of a fixed concatenation (spec §3, §6.2)
//! and must stay byte-identical across implementations — this is the part of
//! the core a custodian and a user's independent reimplementation both rely
//! on producing the same output for.

use crate::crypto::{le64, sha256};

/// `SHA256(account_key ‖ email ‖ LE64(account_id))`.
pub fn account_subkey(account_key: &[u8; 32], email: &[u8], account_id: u64) -> [u8; 32] {
    let mut msg = Vec::with_capacity(32 + email.len() + 8);
    msg.extend_from_slice(account_key);
    msg.extend_from_slice(email);
    msg.extend_from_slice(&le64(account_id));
    sha256(&msg)
}

/// `SHA256(account_subkey ‖ LE64(block_height) ‖ LE64(account_id))`.
pub fn attestation_key(account_subkey: &[u8; 32], block_height: u64, account_id: u64) -> [u8; 32] {
    let mut msg = Vec::with_capacity(32 + 8 + 8);
    msg.extend_from_slice(account_subkey);
    msg.extend_from_slice(&le64(block_height));
    msg.extend_from_slice(&le64(account_id));
    sha256(&msg)
}
