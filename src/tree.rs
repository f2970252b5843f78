//! The Merkle Sum Tree (C5): construction, root/leaves access, verification,
//! and the level-ordered text serialization.

use std::fmt;

use rayon::prelude::*;

use crate::crypto::{hex_decode_lower, hex_encode_lower, le64, sha256};
use crate::error::{PolError, Result};

/// A single tree node: a 32-byte hash and the summed value of its subtree
/// (for a leaf, its own amount).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub hash: [u8; 32],
    pub value: u64,
}

impl Node {
    pub fn new(hash: [u8; 32], value: u64) -> Self {
        Self { hash, value }
    }
}

impl fmt::Display for Node {
    /// An abbreviated, human-readable form: the first 8 hex characters of
    /// the hash and the value. Never the full hash — this is for log lines
    /// and debug output, not the wire format (`Tree::serialize` owns that).
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}…:{}", &hex_encode_lower(&self.hash)[..8], self.value)
    }
}

/// Combine two sibling nodes into their parent.
///
/// `value` is the sum of both children's values; `hash` is
/// `SHA256(left.hash ‖ LE64(left.value) ‖ right.hash ‖ LE64(right.value))`.
/// Node values are `u64` so the "both children non-negative" precondition in
/// spec §4.5.1 is enforced by the type itself rather than checked here.
pub fn merge(left: &Node, right: &Node) -> Node {
    let mut msg = Vec::with_capacity(32 + 8 + 32 + 8);
    msg.extend_from_slice(&left.hash);
    msg.extend_from_slice(&le64(left.value));
    msg.extend_from_slice(&right.hash);
    msg.extend_from_slice(&le64(right.value));
    Node::new(sha256(&msg), left.value + right.value)
}

/// An ordered sequence of levels, root-first. `levels[0]` (if present) holds
/// the single root node; the last level holds the leaves. An empty tree has
/// no levels at all.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MerkleSumTree {
    levels: Vec<Vec<Node>>,
}

impl MerkleSumTree {
    /// Build a tree from a leaf-level node list.
    ///
    /// Fails with `ShapeError` if `leaves` is non-empty and its length is not
    /// a power of two. An empty input produces the empty tree.
    pub fn build(leaves: Vec<Node>) -> Result<Self> {
        if leaves.is_empty() {
            return Ok(Self { levels: vec![] });
        }
        if !leaves.len().is_power_of_two() {
            return Err(PolError::ShapeError(format!(
                "number of leaves is not a power of two: {}",
                leaves.len()
            )));
        }

        let mut levels_bottom_up = vec![leaves];
        while levels_bottom_up.last().unwrap().len() > 1 {
            let current = levels_bottom_up.last().unwrap();
            let next: Vec<Node> = current
                .chunks(2)
                .map(|pair| merge(&pair[0], &pair[1]))
                .collect();
            levels_bottom_up.push(next);
        }

        levels_bottom_up.reverse();
        Ok(Self {
            levels: levels_bottom_up,
        })
    }

    /// Identical to [`build`](Self::build) except the merges within each
    /// level run in parallel over chunk pairs via rayon. Pairing order is
    /// preserved, so the result is byte-identical to the sequential build.
    pub fn build_parallel(leaves: Vec<Node>) -> Result<Self> {
        if leaves.is_empty() {
            return Ok(Self { levels: vec![] });
        }
        if !leaves.len().is_power_of_two() {
            return Err(PolError::ShapeError(format!(
                "number of leaves is not a power of two: {}",
                leaves.len()
            )));
        }

        let mut levels_bottom_up = vec![leaves];
        while levels_bottom_up.last().unwrap().len() > 1 {
            let current = levels_bottom_up.last().unwrap();
            let next: Vec<Node> = current
                .par_chunks(2)
                .map(|pair| merge(&pair[0], &pair[1]))
                .collect();
            levels_bottom_up.push(next);
        }

        levels_bottom_up.reverse();
        Ok(Self {
            levels: levels_bottom_up,
        })
    }

    /// The root node, or `None` for an empty tree.
    ///
    /// Fails with `ShapeError` if the top level holds more than one node —
    /// that can only happen via [`parse`](Self::parse) on a malformed or
    /// hand-assembled tree, never via `build`.
    pub fn root(&self) -> Result<Option<&Node>> {
        match self.levels.first() {
            None => Ok(None),
            Some(level) if level.len() == 1 => Ok(Some(&level[0])),
            Some(level) => Err(PolError::ShapeError(format!(
                "top level has {} nodes, expected 1",
                level.len()
            ))),
        }
    }

    /// The leaf level, or an empty slice for an empty tree.
    pub fn leaves(&self) -> &[Node] {
        self.levels.last().map(Vec::as_slice).unwrap_or(&[])
    }

    /// All levels, root-first.
    pub fn levels(&self) -> &[Vec<Node>] {
        &self.levels
    }

    /// The number of levels (tree height + 1 for the leaf level), 0 for an
    /// empty tree.
    pub fn height(&self) -> usize {
        self.levels.len()
    }

    /// Rebuild the tree from its own leaves and check that the result has
    /// the same number of levels and an equal root. Returns `false` (not an
    /// error) on mismatch — per spec §7 this is a user-visible outcome, not a
    /// defect the core raises.
    pub fn verify(&self) -> bool {
        let rebuilt = match Self::build(self.leaves().to_vec()) {
            Ok(t) => t,
            Err(_) => return false,
        };
        if rebuilt.levels.len() != self.levels.len() {
            return false;
        }
        matches!((rebuilt.root(), self.root()), (Ok(a), Ok(b)) if a == b)
    }

    /// Emit each level top-to-bottom, one node per line as
    /// `"<hex_hash>,<value>\n"`. No header.
    pub fn serialize(&self) -> String {
        let mut out = String::new();
        for level in &self.levels {
            for node in level {
                out.push_str(&hex_encode_lower(&node.hash));
                out.push(',');
                out.push_str(&node.value.to_string());
                out.push('\n');
            }
        }
        out
    }

    /// Parse a level-ordered serialization back into a tree. Reads `2^k`
    /// consecutive lines as level `k`, starting at `k = 0` and doubling,
    /// terminating when the line stream is exhausted.
    pub fn parse<'a, I>(lines: I) -> Result<Self>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut lines = lines.into_iter().filter(|l| !l.is_empty()).peekable();
        if lines.peek().is_none() {
            return Ok(Self { levels: vec![] });
        }

        let mut levels = Vec::new();
        let mut want = 1usize;

        loop {
            let mut level = Vec::with_capacity(want);
            for _ in 0..want {
                let Some(line) = lines.next() else {
                    return Err(PolError::IncompleteTree {
                        level: levels.len(),
                        expected: want,
                        got: level.len(),
                    });
                };
                level.push(parse_node_line(line)?);
            }
            levels.push(level);
            if lines.peek().is_none() {
                break;
            }
            want *= 2;
        }

        Ok(Self { levels })
    }
}

fn parse_node_line(line: &str) -> Result<Node> {
    let (hash_hex, value_str) = line.split_once(',').ok_or_else(|| {
        PolError::InvalidInput(format!("malformed node line (missing comma): {line}"))
    })?;

    let hash_bytes = hex_decode_lower(hash_hex)?;
    if hash_bytes.len() != 32 {
        return Err(PolError::InvalidInput(format!(
            "hash is {} bytes, expected 32: {hash_hex}",
            hash_bytes.len()
        )));
    }
    let mut hash = [0u8; 32];
    hash.copy_from_slice(&hash_bytes);

    let value: u64 = value_str
        .trim()
        .parse()
        .map_err(|e| PolError::InvalidInput(format!("invalid value '{value_str}': {e}")))?;

    Ok(Node::new(hash, value))
}
