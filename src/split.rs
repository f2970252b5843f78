//! Liability splitting and padding (C4).
//!
//! Transforms the custodian's raw liability list into an obfuscated,
//! power-of-two-sized leaf set: every non-dummy amount bounded by
//! `threshold`, every original liability represented by at least two output
//! items unless its amount was exactly 1, and the whole list randomly
//! shuffled. See spec §4.4 for the three-stage algorithm this implements
//! stage-for-stage.

use crate::crypto::{secure_random_u64, secure_random_uniform};
use crate::liability::Liability;

/// Draw `r` uniformly from `[1, L.amount - 1]` and return two liabilities
/// with `L`'s identity and amounts `r` and `L.amount - r`. A no-op for
/// `L.amount <= 1`.
fn split_once(l: &Liability) -> Vec<Liability> {
    if l.amount <= 1 {
        return vec![l.clone()];
    }
    let r = secure_random_uniform(l.amount - 1).expect("amount - 1 >= 1 when amount > 1");
    vec![
        Liability::new(l.account_id, l.account_subkey, r),
        Liability::new(l.account_id, l.account_subkey, l.amount - r),
    ]
}

/// Recursively split `l` until every resulting item's amount is at most
/// `threshold`. Terminates because `split_once` never produces a zero
/// amount, so each recursive call strictly decreases a positive integer.
fn split_below(l: Liability, threshold: u64) -> Vec<Liability> {
    if l.amount <= threshold {
        return vec![l];
    }
    let children = split_once(&l);
    if children.len() == 1 {
        // amount <= 1, which can only happen if threshold < 1; nothing more
        // to do, matching the "amount 1 passes through unchanged" rule.
        return children;
    }
    let mut out = split_below(children[0].clone(), threshold);
    out.extend(split_below(children[1].clone(), threshold));
    out
}

/// Stage 1 (spec §4.4.3): mandatory first split of every input liability,
/// followed by recursive below-threshold splitting of each resulting child.
fn stage1(liabilities: &[Liability], threshold: u64) -> Vec<Liability> {
    let mut out = Vec::new();
    for l in liabilities {
        for child in split_once(l) {
            out.extend(split_below(child, threshold));
        }
    }
    out
}

/// `next_power_of_two(0) = 0`, matching the source's degenerate case so the
/// empty-input path is preserved (spec §9 open question).
fn next_power_of_two(n: usize) -> usize {
    if n == 0 {
        0
    } else {
        n.next_power_of_two()
    }
}

/// Stage 2's recursive growth primitive (spec §4.4.4). Attempts to obtain
/// `d` additional items by splitting the first `d` items of `list`; the
/// shortfall (if unit-amount liabilities resist splitting) recurses into the
/// remainder.
fn grow(mut list: Vec<Liability>, d: usize) -> Vec<Liability> {
    if d == 0 {
        return list;
    }

    let tail = list.split_off(d);
    let head = list;

    let mut split_head = Vec::with_capacity(head.len() * 2);
    for l in &head {
        split_head.extend(split_once(l));
    }

    let deficit = 2 * d - split_head.len();
    let next_d = deficit.min(tail.len());
    let tail_grown = grow(tail, next_d);

    split_head.extend(tail_grown);
    split_head
}

/// Stage 2 (spec §4.4.4): grow the list to the next power of two via `grow`,
/// then pad with dummy liabilities if unit-amount items prevented reaching
/// the target exactly. This dummy padding is intentional and preserved even
/// though it leaks the presence of unit liabilities (spec §9).
fn stage2(list: Vec<Liability>) -> Vec<Liability> {
    let n = list.len();
    let target = next_power_of_two(n);
    let d = target - n;
    let mut grown = grow(list, d);
    while grown.len() < target {
        grown.push(Liability::dummy());
    }
    grown
}

/// Stage 3 (spec §4.4.5): a cryptographically random permutation. Each
/// element is tagged with an independent secure random `u64` and the list is
/// sorted by tag; a stable sort breaks ties deterministically (a collision
/// has probability ~2^-64 per pair and is not a correctness concern).
fn shuffle(list: Vec<Liability>) -> Vec<Liability> {
    let mut tagged: Vec<(u64, Liability)> = list
        .into_iter()
        .map(|l| (secure_random_u64(), l))
        .collect();
    tagged.sort_by_key(|(tag, _)| *tag);
    tagged.into_iter().map(|(_, l)| l).collect()
}

/// Run all three stages: split every liability below `threshold`, grow and
/// pad to a power of two, then shuffle. `threshold` must be positive —
/// callers normally get that guarantee from [`crate::config::BuildConfig`].
pub fn split_and_pad(liabilities: &[Liability], threshold: u64) -> Vec<Liability> {
    let split = stage1(liabilities, threshold);
    tracing::debug!(
        input_count = liabilities.len(),
        stage1_count = split.len(),
        threshold,
        "split: stage 1 (mandatory split) complete"
    );

    let padded = stage2(split);
    tracing::debug!(stage2_count = padded.len(), "split: stage 2 (grow/pad to power of two) complete");

    let shuffled = shuffle(padded);
    tracing::debug!(output_count = shuffled.len(), "split: stage 3 (shuffle) complete");
    shuffled
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sum(list: &[Liability]) -> u64 {
        list.iter().map(|l| l.amount).sum()
    }

    #[test]
    fn next_power_of_two_matches_degenerate_zero_case() {
        assert_eq!(next_power_of_two(0), 0);
        assert_eq!(next_power_of_two(1), 1);
        assert_eq!(next_power_of_two(2), 2);
        assert_eq!(next_power_of_two(3), 4);
        assert_eq!(next_power_of_two(5), 8);
    }

    #[test]
    fn splitting_order_scenario_matches_spec() {
        // amounts [1, 2, 3], threshold 100000 -> eight items, six amount-1
        // and two dummy zeros, pre-shuffle.
        let liabilities = vec![
            Liability::new(1, [1; 32], 1),
            Liability::new(2, [2; 32], 2),
            Liability::new(3, [3; 32], 3),
        ];

        let stage1_out = stage1(&liabilities, 100_000);
        let padded = stage2(stage1_out);

        assert_eq!(padded.len(), 8);
        let mut amounts: Vec<u64> = padded.iter().map(|l| l.amount).collect();
        amounts.sort_unstable();
        assert_eq!(amounts, vec![0, 0, 1, 1, 1, 1, 1, 1]);
        assert_eq!(sum(&padded), 6);
        assert_eq!(padded.iter().filter(|l| l.is_dummy()).count(), 2);
    }

    #[test]
    fn singleton_requiring_multiple_splits() {
        // amount 10_000_001, threshold 5_000_000 -> at least 4 leaves, all
        // <= threshold, summing to the original amount.
        let liabilities = vec![Liability::new(1, [9; 32], 10_000_001)];
        let out = split_and_pad(&liabilities, 5_000_000);

        assert!(out.len() >= 4);
        assert!(out.len().is_power_of_two());
        assert_eq!(sum(&out), 10_000_001);
        for l in &out {
            if !l.is_dummy() {
                assert!(l.amount <= 5_000_000);
                assert!(l.amount >= 1);
            }
        }
    }

    #[test]
    fn output_length_is_always_a_power_of_two() {
        for n in 0..12 {
            let liabilities: Vec<Liability> = (0..n)
                .map(|i| Liability::new(i as u64, [i as u8; 32], i as u64 + 1))
                .collect();
            let out = split_and_pad(&liabilities, 1000);
            assert!(
                out.len() == 0 || out.len().is_power_of_two(),
                "n={n} produced {} items",
                out.len()
            );
        }
    }

    #[test]
    fn sum_is_preserved() {
        let liabilities = vec![
            Liability::new(1, [1; 32], 500),
            Liability::new(2, [2; 32], 7_000_000),
            Liability::new(3, [3; 32], 1),
            Liability::new(4, [4; 32], 42),
        ];
        let total: u64 = liabilities.iter().map(|l| l.amount).sum();
        let out = split_and_pad(&liabilities, 1_000_000);
        assert_eq!(sum(&out), total);
    }

    #[test]
    fn every_non_dummy_item_is_at_most_threshold() {
        let liabilities = vec![
            Liability::new(1, [1; 32], 9_999_999),
            Liability::new(2, [2; 32], 3),
        ];
        let out = split_and_pad(&liabilities, 5_000_000);
        for l in &out {
            if !l.is_dummy() {
                assert!(l.amount <= 5_000_000);
            }
        }
    }

    #[test]
    fn all_unit_amounts_pad_with_dummies() {
        // Input entirely amount-1 liabilities cannot be split further, so
        // growth falls short and dummies make up the rest.
        let liabilities: Vec<Liability> = (0..3)
            .map(|i| Liability::new(i as u64, [i as u8; 32], 1))
            .collect();
        let out = split_and_pad(&liabilities, 1000);

        assert!(out.len().is_power_of_two());
        assert!(out.iter().any(|l| l.is_dummy()));
        assert_eq!(sum(&out), 3);
    }

    #[test]
    fn split_once_never_produces_zero_amount_children() {
        let l = Liability::new(1, [1; 32], 2);
        for _ in 0..200 {
            let children = split_once(&l);
            assert_eq!(children.len(), 2);
            assert!(children.iter().all(|c| c.amount >= 1));
            assert_eq!(children[0].amount + children[1].amount, 2);
        }
    }

    #[test]
    fn each_original_liability_contributes_at_least_two_items_unless_amount_one() {
        let liabilities = vec![
            Liability::new(1, [1; 32], 1),
            Liability::new(2, [2; 32], 5),
        ];
        let out = stage1(&liabilities, 1_000_000);
        let from_first: Vec<_> = out.iter().filter(|l| l.account_id == 1).collect();
        let from_second: Vec<_> = out.iter().filter(|l| l.account_id == 2).collect();
        assert_eq!(from_first.len(), 1);
        assert!(from_second.len() >= 2);
    }
}
