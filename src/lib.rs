//! Proof of Liabilities core.
//!
//! A custodian commits to the sum of user balances at a point in time via a
//! BitMEX-style obfuscated Merkle Sum Tree: liabilities are split and padded
//! (see [`split`]) into a leaf set whose size is a power of two, hashed into
//! a [`tree::MerkleSumTree`], and published. Each user independently
//! recomputes their attestation key (see [`keys`]) and scans the published
//! leaves (see [`recovery`]) to confirm their own balance is included,
//! without learning anyone else's.
//!
//! This crate is the algorithmic core only. Parsing command-line flags,
//! reading liability data from a file or database, and formatting a
//! human-readable report are the caller's concern — the contract with this
//! crate is: hand it a sequence of [`liability::Liability`] plus a
//! [`config::BuildConfig`] to build, or a tree serialization plus a set of
//! account identities plus a [`config::VerifyConfig`] to verify.

pub mod config;
pub mod crypto;
pub mod error;
pub mod keys;
pub mod leaf;
pub mod liability;
pub mod recovery;
pub mod split;
pub mod tree;

pub use config::{BuildConfig, VerifyConfig};
pub use error::{PolError, Result};
pub use liability::Liability;
pub use recovery::{AccountBalance, AccountQuery, MatchedLeaf};
pub use tree::{MerkleSumTree, Node};

/// Build an attestation tree from raw liabilities: split and pad (§4.4),
/// hash each resulting item into a leaf (§4.3), and merkleize (§4.5).
pub fn build_tree(liabilities: &[Liability], config: BuildConfig) -> Result<MerkleSumTree> {
    tracing::info!(
        block_height = config.block_height,
        threshold = config.threshold,
        liability_count = liabilities.len(),
        "building proof-of-liabilities tree"
    );

    let padded = split::split_and_pad(liabilities, config.threshold);
    let leaves: Vec<Node> = padded
        .iter()
        .enumerate()
        .map(|(i, l)| leaf::liability_to_leaf(config.block_height, i as u64, l))
        .collect();

    let tree = MerkleSumTree::build(leaves)?;

    tracing::info!(
        leaf_count = tree.leaves().len(),
        height = tree.height(),
        "built proof-of-liabilities tree"
    );

    Ok(tree)
}

/// Identical to [`build_tree`], but the tree's internal merges run in
/// parallel via rayon (§5, §4.10). Produces a byte-identical tree.
pub fn build_tree_parallel(
    liabilities: &[Liability],
    config: BuildConfig,
) -> Result<MerkleSumTree> {
    tracing::info!(
        block_height = config.block_height,
        threshold = config.threshold,
        liability_count = liabilities.len(),
        "building proof-of-liabilities tree (parallel)"
    );

    let padded = split::split_and_pad(liabilities, config.threshold);
    let leaves: Vec<Node> = padded
        .iter()
        .enumerate()
        .map(|(i, l)| leaf::liability_to_leaf(config.block_height, i as u64, l))
        .collect();

    MerkleSumTree::build_parallel(leaves)
}

/// Recover balances for each queried account from an already-built or
/// already-parsed tree's leaves.
pub fn recover_accounts(
    tree: &MerkleSumTree,
    config: VerifyConfig,
    queries: &[AccountQuery],
) -> Vec<AccountBalance> {
    recovery::recover_accounts(tree.leaves(), config.block_height, queries)
}

/// Parallel equivalent of [`recover_accounts`] (§4.10).
pub fn recover_accounts_parallel(
    tree: &MerkleSumTree,
    config: VerifyConfig,
    queries: &[AccountQuery],
) -> Vec<AccountBalance> {
    recovery::recover_accounts_parallel(tree.leaves(), config.block_height, queries)
}

/// Serialize `tree` with the per-user on-disk header (spec §4.6): a leading
/// `"block_height:<N>\n"` line followed by the level-ordered tree text.
pub fn serialize_with_header(tree: &MerkleSumTree, block_height: u64) -> String {
    format!("block_height:{block_height}\n{}", tree.serialize())
}

/// Parse the per-user on-disk format produced by
/// [`serialize_with_header`], returning the `block_height` and the tree.
pub fn parse_with_header(text: &str) -> Result<(u64, MerkleSumTree)> {
    let mut lines = text.lines();
    let header = lines
        .next()
        .ok_or_else(|| PolError::InvalidInput("empty input: missing block_height header".into()))?;

    let block_height_str = header.strip_prefix("block_height:").ok_or_else(|| {
        PolError::InvalidInput(format!("missing block_height header, got: {header}"))
    })?;
    let block_height: u64 = block_height_str
        .trim()
        .parse()
        .map_err(|e| PolError::InvalidInput(format!("invalid block_height: {e}")))?;

    let tree = MerkleSumTree::parse(lines)?;
    Ok((block_height, tree))
}
