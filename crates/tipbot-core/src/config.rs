use std::{env, time::Duration};

use crate::{errors::Error, Result};

pub const DEFAULT_STATUS_PORT: u16 = 20020;

/// Tipping policy shared by every command handler.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Policy {
    /// Balance granted on a user's first registration.
    pub registration_bonus: i64,
    /// Balance required before a withdraw is attempted.
    pub min_withdrawal: i64,
    /// Smallest accepted tip.
    pub min_tip: i64,
    /// Display name of the point currency.
    pub currency: String,
}

impl Default for Policy {
    fn default() -> Self {
        Self {
            registration_bonus: 10,
            min_withdrawal: 15,
            min_tip: 1,
            currency: "CULT".to_string(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LedgerBackend {
    Postgres,
    Memory,
}

/// Typed configuration, built once at startup and shared behind an `Arc`.
#[derive(Clone, Debug)]
pub struct Config {
    // Chat
    pub telegram_bot_token: String,
    pub bot_username: Option<String>,
    /// Recognized for compatibility; reaction tipping is not wired up.
    pub tip_reaction: Option<String>,
    /// Recognized for compatibility; reaction tipping is not wired up.
    pub tip_amount: Option<String>,

    // Token network
    pub token_address: String,
    pub eth_api_endpoint: String,
    pub eth_key_json: String,
    pub eth_password: String,
    pub payout_timeout: Duration,

    // Ledger
    pub ledger_backend: LedgerBackend,
    pub database_url: Option<String>,

    // Behavior
    pub policy: Policy,

    // Status endpoint
    pub status_port: u16,
}

impl Config {
    /// Load from the process environment, reading `.env` first if present.
    ///
    /// Values already set in the environment win over `.env`.
    pub fn load() -> Result<Self> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from an arbitrary key lookup (the environment in production).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| lookup(key).and_then(non_empty);

        let telegram_bot_token = require(&get, "TELEGRAM_BOT_TOKEN")?;
        let bot_username = get("BOT_USERNAME").map(|s| s.trim_start_matches('@').to_string());
        let tip_reaction = get("TIP_REACTION");
        let tip_amount = get("TIP_AMOUNT");

        let token_address = require(&get, "ERC20_TOKEN_ADDRESS")?;
        let eth_api_endpoint = require(&get, "ETH_API_ENDPOINT")?;
        let eth_key_json = require(&get, "ETH_KEY_JSON")?;
        // An empty password is a valid keystore password.
        let eth_password = lookup("ETH_PASSWORD").unwrap_or_default();
        let payout_timeout = Duration::from_secs(parse_u64(&get, "PAYOUT_TIMEOUT_SECS")?.unwrap_or(60));

        let ledger_backend = match get("LEDGER_BACKEND").as_deref().map(str::to_lowercase) {
            None => LedgerBackend::Postgres,
            Some(v) if v == "postgres" || v == "pg" => LedgerBackend::Postgres,
            Some(v) if v == "memory" => LedgerBackend::Memory,
            Some(other) => {
                return Err(Error::Config(format!(
                    "LEDGER_BACKEND must be `postgres` or `memory`, got `{other}`"
                )))
            }
        };
        let database_url = get("DATABASE_URL");
        if ledger_backend == LedgerBackend::Postgres && database_url.is_none() {
            return Err(Error::Config(
                "DATABASE_URL environment variable is required".to_string(),
            ));
        }

        let defaults = Policy::default();
        let policy = Policy {
            registration_bonus: parse_i64(&get, "REGISTRATION_BONUS")?
                .unwrap_or(defaults.registration_bonus),
            min_withdrawal: parse_i64(&get, "MIN_WITHDRAWAL")?.unwrap_or(defaults.min_withdrawal),
            min_tip: defaults.min_tip,
            currency: get("CURRENCY_SYMBOL").unwrap_or(defaults.currency),
        };

        Ok(Self {
            telegram_bot_token,
            bot_username,
            tip_reaction,
            tip_amount,
            token_address,
            eth_api_endpoint,
            eth_key_json,
            eth_password,
            payout_timeout,
            ledger_backend,
            database_url,
            policy,
            status_port: DEFAULT_STATUS_PORT,
        })
    }
}

fn require(get: &impl Fn(&str) -> Option<String>, key: &str) -> Result<String> {
    get(key).ok_or_else(|| Error::Config(format!("{key} environment variable is required")))
}

fn parse_i64(get: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<i64>> {
    get(key)
        .map(|s| {
            s.trim()
                .parse::<i64>()
                .map_err(|e| Error::Config(format!("{key} must be an integer: {e}")))
        })
        .transpose()
}

fn parse_u64(get: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<u64>> {
    get(key)
        .map(|s| {
            s.trim()
                .parse::<u64>()
                .map_err(|e| Error::Config(format!("{key} must be a positive integer: {e}")))
        })
        .transpose()
}

fn non_empty(s: String) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s)
    }
}
