//! The liability input record (spec §3).

/// An input record: a custodian's obligation to one account for a given
/// amount, expressed in satoshis.
///
/// A liability with `amount == 0` and a zeroed `account_subkey` is a
/// **dummy**, used purely to pad the leaf set to a power of two; it cannot be
/// attributed to any real account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Liability {
    pub account_id: u64,
    pub account_subkey: [u8; 32],
    pub amount: u64,
}

impl Liability {
    pub fn new(account_id: u64, account_subkey: [u8; 32], amount: u64) -> Self {
        Self {
            account_id,
            account_subkey,
            amount,
        }
    }

    /// A zero-amount padding entry: `account_id = 0`, `account_subkey` all
    /// zero bytes, `amount = 0`.
    pub fn dummy() -> Self {
        Self {
            account_id: 0,
            account_subkey: [0u8; 32],
            amount: 0,
        }
    }

    pub fn is_dummy(&self) -> bool {
        self.amount == 0 && self.account_subkey == [0u8; 32] && self.account_id == 0
    }
}
