use std::time::Duration;

use async_trait::async_trait;

use crate::{domain::TxHandle, errors::Error, Result};

/// On-chain token transfer.
///
/// Implementations collapse every internal stage (connect, contract binding,
/// signing, submission) into a single error; callers only branch on success.
#[async_trait]
pub trait PayoutGateway: Send + Sync {
    async fn transfer(&self, address: &str, amount: i64) -> Result<TxHandle>;
}

/// Run a transfer, failing with `Error::Payout` once `timeout` elapses.
///
/// The underlying request is dropped on timeout; whether the network already
/// accepted the transaction is unknown at that point.
pub async fn transfer_within(
    gateway: &dyn PayoutGateway,
    address: &str,
    amount: i64,
    timeout: Duration,
) -> Result<TxHandle> {
    match tokio::time::timeout(timeout, gateway.transfer(address, amount)).await {
        Ok(res) => res,
        Err(_) => Err(Error::Payout(format!(
            "transfer timed out after {}s",
            timeout.as_secs()
        ))),
    }
}
