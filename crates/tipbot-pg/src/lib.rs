//! Postgres ledger adapter.
//!
//! Keeps the `accounts` / `balances` layout (keyed by `slack_user_id`) so an
//! existing tip database can be pointed at directly.

use std::time::Duration;

use async_trait::async_trait;
use sqlx::{postgres::PgPoolOptions, PgPool};
use tracing::info;

use tipbot_core::{domain::AccountId, errors::Error, ledger::LedgerStore, Result};

const CREATE_ACCOUNTS: &str = "CREATE TABLE IF NOT EXISTS accounts (
    slack_user_id TEXT NOT NULL UNIQUE,
    ethereum_address TEXT NOT NULL
)";

const CREATE_BALANCES: &str = "CREATE TABLE IF NOT EXISTS balances (
    slack_user_id TEXT NOT NULL UNIQUE,
    balance BIGINT NOT NULL DEFAULT 0
)";

const SELECT_ADDRESS: &str =
    "SELECT ethereum_address FROM accounts WHERE slack_user_id = $1 LIMIT 1";

// Cast so older INTEGER columns decode as i64.
const SELECT_BALANCE: &str =
    "SELECT balance::BIGINT FROM balances WHERE slack_user_id = $1 LIMIT 1";

const UPSERT_ADDRESS: &str = "INSERT INTO accounts (slack_user_id, ethereum_address) VALUES ($1, $2)
    ON CONFLICT (slack_user_id) DO UPDATE SET ethereum_address = EXCLUDED.ethereum_address";

const UPSERT_BALANCE: &str = "INSERT INTO balances (slack_user_id, balance) VALUES ($1, $2)
    ON CONFLICT (slack_user_id) DO UPDATE SET balance = EXCLUDED.balance";

#[derive(Clone, Debug)]
pub struct PgLedger {
    pool: PgPool,
}

impl PgLedger {
    /// Connect a small pool. Each ledger call checks out its own connection.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(10))
            .connect(database_url)
            .await
            .map_err(map_err)?;
        Ok(Self { pool })
    }

    /// Create both tables if they are missing.
    pub async fn migrate(&self) -> Result<()> {
        for stmt in [CREATE_ACCOUNTS, CREATE_BALANCES] {
            sqlx::query(stmt)
                .execute(&self.pool)
                .await
                .map_err(map_err)?;
        }
        info!("ledger schema ready");
        Ok(())
    }
}

fn map_err(e: sqlx::Error) -> Error {
    Error::Ledger(e.to_string())
}

#[async_trait]
impl LedgerStore for PgLedger {
    async fn address(&self, account: &AccountId) -> Result<Option<String>> {
        sqlx::query_scalar::<_, String>(SELECT_ADDRESS)
            .bind(account.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(map_err)
    }

    async fn balance(&self, account: &AccountId) -> Result<Option<i64>> {
        sqlx::query_scalar::<_, i64>(SELECT_BALANCE)
            .bind(account.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(map_err)
    }

    async fn set_address(&self, account: &AccountId, address: &str) -> Result<()> {
        sqlx::query(UPSERT_ADDRESS)
            .bind(account.as_str())
            .bind(address)
            .execute(&self.pool)
            .await
            .map_err(map_err)?;
        Ok(())
    }

    async fn set_balance(&self, account: &AccountId, balance: i64) -> Result<()> {
        sqlx::query(UPSERT_BALANCE)
            .bind(account.as_str())
            .bind(balance)
            .execute(&self.pool)
            .await
            .map_err(map_err)?;
        Ok(())
    }
}
