//! Ledger store port and the in-memory backend.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::{domain::AccountId, Result};

/// Two independently upserted tables: payout addresses and balances.
///
/// Every call is its own unit of work; nothing spans two calls, so a
/// read-compute-write sequence in a handler is not atomic.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Registered payout address, `None` if the user never registered.
    async fn address(&self, account: &AccountId) -> Result<Option<String>>;

    /// Stored balance, `None` if no balance row exists yet.
    async fn balance(&self, account: &AccountId) -> Result<Option<i64>>;

    /// Insert or overwrite the payout address.
    async fn set_address(&self, account: &AccountId, address: &str) -> Result<()>;

    /// Insert or overwrite the balance.
    async fn set_balance(&self, account: &AccountId, balance: i64) -> Result<()>;

    /// Address or empty string when unregistered.
    async fn get_address(&self, account: &AccountId) -> Result<String> {
        Ok(self.address(account).await?.unwrap_or_default())
    }

    /// Balance or zero when no row exists (indistinguishable from a real zero).
    async fn get_balance(&self, account: &AccountId) -> Result<i64> {
        Ok(self.balance(account).await?.unwrap_or_default())
    }
}

/// Process-local ledger. Contents are lost on restart.
#[derive(Debug, Default)]
pub struct MemoryLedger {
    accounts: Mutex<HashMap<AccountId, String>>,
    balances: Mutex<HashMap<AccountId, i64>>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LedgerStore for MemoryLedger {
    async fn address(&self, account: &AccountId) -> Result<Option<String>> {
        Ok(self.accounts.lock().await.get(account).cloned())
    }

    async fn balance(&self, account: &AccountId) -> Result<Option<i64>> {
        Ok(self.balances.lock().await.get(account).copied())
    }

    async fn set_address(&self, account: &AccountId, address: &str) -> Result<()> {
        self.accounts
            .lock()
            .await
            .insert(account.clone(), address.to_string());
        Ok(())
    }

    async fn set_balance(&self, account: &AccountId, balance: i64) -> Result<()> {
        self.balances.lock().await.insert(account.clone(), balance);
        Ok(())
    }
}
