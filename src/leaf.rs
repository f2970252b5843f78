//! Leaf construction (C3): map a liability at a given position into a
//! Merkle Sum Tree leaf node.

use crate::crypto::{hmac_sha256, le64};
use crate::keys::attestation_key;
use crate::liability::Liability;
use crate::tree::Node;

/// Build the leaf node for `liability` at `leaf_index` within attestation
/// `block_height`.
///
/// `leaf_index` is the liability's zero-based position in the final
/// (post-split, post-shuffle) leaf level — it is baked into the hash, so a
/// leaf only verifies at the position it was built for.
pub fn liability_to_leaf(block_height: u64, leaf_index: u64, liability: &Liability) -> Node {
    let key = attestation_key(&liability.account_subkey, block_height, liability.account_id);
    let mut msg = Vec::with_capacity(16);
    msg.extend_from_slice(&le64(liability.amount));
    msg.extend_from_slice(&le64(leaf_index));
    let hash = hmac_sha256(&key, &msg);
    Node::new(hash, liability.amount)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn leaf_hash_is_sensitive_to_index() {
        let liability = Liability::new(1234, [0xab; 32], 2);
        let a = liability_to_leaf(1000, 0, &liability);
        let b = liability_to_leaf(1000, 1, &liability);
        assert_ne!(a.hash, b.hash);
        assert_eq!(a.value, 2);
        assert_eq!(b.value, 2);
    }

    #[test]
    fn leaf_hash_is_sensitive_to_block_height() {
        let liability = Liability::new(1234, [0xab; 32], 2);
        let a = liability_to_leaf(1000, 0, &liability);
        let b = liability_to_leaf(1001, 0, &liability);
        assert_ne!(a.hash, b.hash);
    }

    #[test]
    fn leaf_hash_matches_direct_attestation_key_computation() {
        let liability = Liability::new(7, [0x01; 32], 99);
        let key = attestation_key(&liability.account_subkey, 42, liability.account_id);
        let expected = hmac_sha256(&key, &[le64(99), le64(3)].concat());
        let leaf = liability_to_leaf(42, 3, &liability);
        assert_eq!(leaf.hash, expected);
    }
}
