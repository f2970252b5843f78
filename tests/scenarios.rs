//! End-to-end scenarios from the proof-of-liabilities specification: build
//! an attestation, serialize it, parse it back, and recover balances the
//! way an independent user-side verifier would.

use pol_core::{
    build_tree, parse_with_header, recover_accounts, serialize_with_header, AccountQuery,
    BuildConfig, Liability, VerifyConfig,
};

fn fake(account_id: u64, amount: u64) -> Liability {
    Liability::new(account_id, [0xde; 32], amount)
}

#[test]
fn custodian_publishes_and_user_verifies_inclusion() {
    let block_height = 123_456;
    let threshold = 5_000_000;
    let config = BuildConfig::new(threshold, block_height).unwrap();

    let real_key = [0x13; 32];
    let real_account_id = 90210;
    let real_amount = 12_345_678;

    let liabilities = vec![
        fake(1, 500),
        fake(2, 7_000_000),
        Liability::new(real_account_id, real_key, real_amount),
        fake(3, 1),
        fake(4, 999),
    ];
    let total: u64 = liabilities.iter().map(|l| l.amount).sum();

    // Custodian side: build, verify internally, publish.
    let tree = build_tree(&liabilities, config).unwrap();
    assert!(tree.verify());
    assert_eq!(tree.root().unwrap().unwrap().value, total);

    let published = serialize_with_header(&tree, block_height);

    // User side: parse the published file independently.
    let (parsed_block_height, parsed_tree) = parse_with_header(&published).unwrap();
    assert_eq!(parsed_block_height, block_height);
    assert!(parsed_tree.verify());
    assert_eq!(parsed_tree.root().unwrap(), tree.root().unwrap());

    let queries = vec![AccountQuery::new(real_account_id, real_key)];
    let balances = recover_accounts(&parsed_tree, VerifyConfig::new(block_height), &queries);
    assert_eq!(balances[0].account_id, real_account_id);
    assert_eq!(balances[0].balance, real_amount);
}

#[test]
fn a_stranger_account_key_recovers_nothing() {
    let block_height = 1;
    let config = BuildConfig::new(1_000_000, block_height).unwrap();
    let liabilities: Vec<Liability> = (0..20).map(|i| fake(i, i * 137 + 1)).collect();

    let tree = build_tree(&liabilities, config).unwrap();
    let stranger = vec![AccountQuery::new(424242, [0x99; 32])];
    let balances = recover_accounts(&tree, VerifyConfig::new(block_height), &stranger);
    assert_eq!(balances[0].balance, 0);
}

#[test]
fn empty_attestation_round_trips() {
    let config = BuildConfig::new(5_000_000, 1).unwrap();
    let tree = build_tree(&[], config).unwrap();
    assert!(tree.verify());
    assert!(tree.root().unwrap().is_none());

    let published = serialize_with_header(&tree, config.block_height);
    assert_eq!(published, "block_height:1\n");

    let (block_height, parsed) = parse_with_header(&published).unwrap();
    assert_eq!(block_height, 1);
    assert!(parsed.leaves().is_empty());
}

#[test]
fn multiple_accounts_recovered_in_one_pass() {
    let block_height = 7;
    let config = BuildConfig::new(2_000_000, block_height).unwrap();
    let key_a = [0x0a; 32];
    let key_b = [0x0b; 32];

    let liabilities = vec![
        fake(1, 300),
        Liability::new(10, key_a, 2_500_000),
        Liability::new(20, key_b, 1),
        fake(2, 300),
    ];

    let tree = build_tree(&liabilities, config).unwrap();
    let queries = vec![AccountQuery::new(10, key_a), AccountQuery::new(20, key_b)];
    let balances = recover_accounts(&tree, VerifyConfig::new(block_height), &queries);

    assert_eq!(balances[0].balance, 2_500_000);
    assert_eq!(balances[1].balance, 1);
}

#[test]
fn non_power_of_two_leaf_build_is_rejected() {
    use pol_core::tree::MerkleSumTree;
    use pol_core::Node;

    let leaves = vec![
        Node::new([1; 32], 1),
        Node::new([2; 32], 2),
        Node::new([3; 32], 3),
    ];
    assert!(MerkleSumTree::build(leaves).is_err());
}
