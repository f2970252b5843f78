//! Account-balance recovery (C6): given a published leaf set, recompute
//! which leaves belong to a caller's account and sum their values.

use rayon::prelude::*;

use crate::keys::attestation_key;
use crate::crypto::{hmac_sha256, le64};
use crate::tree::Node;

/// Minimum size of a leaf range handed to one worker in the parallel path.
/// Below this, partitioning overhead isn't worth it.
const PARALLEL_CHUNK_FLOOR: usize = 1024;

/// One account's identity as supplied by the user side (spec §4.6 / §6.3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccountQuery {
    pub account_id: u64,
    pub account_subkey: [u8; 32],
}

impl AccountQuery {
    pub fn new(account_id: u64, account_subkey: [u8; 32]) -> Self {
        Self {
            account_id,
            account_subkey,
        }
    }
}

/// The recovered balance for one account, in the same order the queries
/// were supplied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountBalance {
    pub account_id: u64,
    pub balance: u64,
    pub attestation_key: [u8; 32],
}

/// Leaves belonging to a single account, for `find_leaves`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchedLeaf {
    pub index: usize,
    pub leaf: Node,
}

fn leaf_matches(key: &[u8; 32], leaf: &Node, index: u64) -> bool {
    let mut msg = Vec::with_capacity(16);
    msg.extend_from_slice(&le64(leaf.value));
    msg.extend_from_slice(&le64(index));
    hmac_sha256(key, &msg) == leaf.hash
}

/// All leaves (with their absolute index) whose hash matches `account_id`'s
/// attestation key at `block_height`, scanning `leaves` starting at
/// `base_index` (the leaves' absolute position within the full tree).
pub fn find_leaves(
    leaves: &[Node],
    base_index: usize,
    block_height: u64,
    account_id: u64,
    account_subkey: &[u8; 32],
) -> Vec<MatchedLeaf> {
    let key = attestation_key(account_subkey, block_height, account_id);
    leaves
        .iter()
        .enumerate()
        .filter(|(i, leaf)| leaf_matches(&key, leaf, (base_index + i) as u64))
        .map(|(i, leaf)| MatchedLeaf {
            index: base_index + i,
            leaf: leaf.clone(),
        })
        .collect()
}

/// The sum of every leaf value matching `account_id`'s attestation key.
pub fn get_balance(
    leaves: &[Node],
    block_height: u64,
    account_id: u64,
    account_subkey: &[u8; 32],
) -> u64 {
    let key = attestation_key(account_subkey, block_height, account_id);
    leaves
        .iter()
        .enumerate()
        .filter(|(i, leaf)| leaf_matches(&key, leaf, *i as u64))
        .map(|(_, leaf)| leaf.value)
        .sum()
}

/// Recover balances for every account in `queries`, in the same order.
/// `O(|leaves| * |queries|)` HMAC computations (spec §4.6).
pub fn recover_accounts(
    leaves: &[Node],
    block_height: u64,
    queries: &[AccountQuery],
) -> Vec<AccountBalance> {
    let keys: Vec<[u8; 32]> = queries
        .iter()
        .map(|q| attestation_key(&q.account_subkey, block_height, q.account_id))
        .collect();

    let mut totals = vec![0u64; queries.len()];
    for (index, leaf) in leaves.iter().enumerate() {
        for (k, key) in keys.iter().enumerate() {
            if leaf_matches(key, leaf, index as u64) {
                totals[k] += leaf.value;
            }
        }
    }

    queries
        .iter()
        .zip(keys)
        .zip(totals)
        .map(|((q, key), balance)| AccountBalance {
            account_id: q.account_id,
            balance,
            attestation_key: key,
        })
        .collect()
}

/// Equivalent to [`recover_accounts`] but partitions the leaf slice into
/// contiguous ranges processed in parallel via rayon, forwarding each
/// range's absolute starting index so recovered balances are identical to
/// the sequential path regardless of partition granularity (spec §5).
pub fn recover_accounts_parallel(
    leaves: &[Node],
    block_height: u64,
    queries: &[AccountQuery],
) -> Vec<AccountBalance> {
    if leaves.len() < PARALLEL_CHUNK_FLOOR {
        return recover_accounts(leaves, block_height, queries);
    }

    let keys: Vec<[u8; 32]> = queries
        .iter()
        .map(|q| attestation_key(&q.account_subkey, block_height, q.account_id))
        .collect();

    let chunk_size = (leaves.len() / rayon::current_num_threads().max(1)).max(PARALLEL_CHUNK_FLOOR);

    let partial_totals: Vec<Vec<u64>> = leaves
        .par_chunks(chunk_size)
        .enumerate()
        .map(|(chunk_idx, chunk)| {
            let base_index = chunk_idx * chunk_size;
            tracing::debug!(
                base_index,
                chunk_len = chunk.len(),
                "recover: scanning leaf batch"
            );
            let mut totals = vec![0u64; keys.len()];
            for (offset, leaf) in chunk.iter().enumerate() {
                let absolute_index = (base_index + offset) as u64;
                for (k, key) in keys.iter().enumerate() {
                    if leaf_matches(key, leaf, absolute_index) {
                        totals[k] += leaf.value;
                    }
                }
            }
            totals
        })
        .collect();

    let mut totals = vec![0u64; keys.len()];
    for partial in partial_totals {
        for (k, v) in partial.into_iter().enumerate() {
            totals[k] += v;
        }
    }

    queries
        .iter()
        .zip(keys)
        .zip(totals)
        .map(|((q, key), balance)| AccountBalance {
            account_id: q.account_id,
            balance,
            attestation_key: key,
        })
        .collect()
}
