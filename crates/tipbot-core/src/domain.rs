use std::fmt;

/// Chat platform user id (numeric).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct UserId(pub i64);

/// Chat id (numeric). A user's private chat shares the user's numeric id.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ChatId(pub i64);

/// Ledger key for a user.
///
/// Both the `accounts` and `balances` tables are keyed by this string. The chat
/// adapter decides how platform identities map onto it.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AccountId(pub String);

impl AccountId {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Pending on-chain transaction returned by a payout.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TxHandle {
    /// `0x`-prefixed transaction hash.
    pub hash: String,
}
