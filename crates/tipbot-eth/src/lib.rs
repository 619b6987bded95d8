//! Ethereum payout adapter.
//!
//! Pays withdrawals out as ERC-20 `transfer` calls. The keystore is decrypted
//! locally, the transaction is signed here, and the node only ever sees the
//! raw signed bytes.

use async_trait::async_trait;
use serde_json::json;
use tracing::{error, info};

use tipbot_core::{
    config::Config, domain::TxHandle, errors::Error, payout::PayoutGateway, Result,
};

pub mod abi;
pub mod keystore;
pub mod rpc;
pub mod tx;

use abi::{encode_transfer, format_address, parse_address, parse_quantity, to_hex};
use keystore::Transactor;
use rpc::RpcClient;
use tx::LegacyTx;

pub struct EthPayoutGateway {
    rpc: RpcClient,
    token_address: String,
    key_json: String,
    password: String,
}

impl EthPayoutGateway {
    pub fn new(cfg: &Config) -> Result<Self> {
        Ok(Self {
            rpc: RpcClient::new(cfg.eth_api_endpoint.clone(), cfg.payout_timeout)?,
            token_address: cfg.token_address.clone(),
            key_json: cfg.eth_key_json.clone(),
            password: cfg.eth_password.clone(),
        })
    }

    async fn quantity(&self, method: &str, params: serde_json::Value) -> Result<u64> {
        let raw: String = self.rpc.call(method, params).await?;
        parse_quantity(&raw)
    }

    /// Key derivation is CPU-bound; run it on the blocking pool.
    async fn authorize(&self) -> Result<Transactor> {
        let key_json = self.key_json.clone();
        let password = self.password.clone();
        tokio::task::spawn_blocking(move || Transactor::from_keystore(&key_json, &password))
            .await
            .map_err(|e| Error::Payout(format!("keystore task failed: {e}")))?
    }

    async fn try_transfer(&self, address: &str, amount: i64) -> Result<TxHandle> {
        // Dial.
        let chain_id = self
            .quantity("eth_chainId", json!([]))
            .await
            .map_err(|e| stage("failed to reach token network", e))?;

        // Bind the token contract.
        let token = parse_address(&self.token_address)
            .map_err(|e| stage("failed to instantiate token contract", e))?;
        let code: String = self
            .rpc
            .call("eth_getCode", json!([format_address(&token), "latest"]))
            .await
            .map_err(|e| stage("failed to instantiate token contract", e))?;
        if code.trim_start_matches("0x").is_empty() {
            return Err(stage(
                "failed to instantiate token contract",
                Error::Payout(format!("no contract at {}", format_address(&token))),
            ));
        }

        // Authorize.
        let signer = self
            .authorize()
            .await
            .map_err(|e| stage("failed to create authorized transactor", e))?;

        // Submit.
        self.submit(chain_id, &token, &signer, address, amount)
            .await
            .map_err(|e| stage("failed to request token transfer", e))
    }

    async fn submit(
        &self,
        chain_id: u64,
        token: &abi::Address,
        signer: &Transactor,
        address: &str,
        amount: i64,
    ) -> Result<TxHandle> {
        let to = parse_address(address)?;
        let units = u64::try_from(amount)
            .map_err(|_| Error::Payout(format!("amount out of range: {amount}")))?;
        let data = encode_transfer(&to, units);
        let from = format_address(&signer.from);

        let nonce = self
            .quantity("eth_getTransactionCount", json!([from, "pending"]))
            .await?;
        let gas_price = self.quantity("eth_gasPrice", json!([])).await?;
        let gas = self
            .quantity(
                "eth_estimateGas",
                json!([{"from": from, "to": format_address(token), "data": to_hex(&data)}]),
            )
            .await?;

        let raw = LegacyTx {
            nonce,
            gas_price,
            gas,
            to: *token,
            value: 0,
            data,
            chain_id,
        }
        .sign(signer)?;
        let hash: String = self
            .rpc
            .call("eth_sendRawTransaction", json!([to_hex(&raw)]))
            .await?;

        info!(chain_id, nonce, to = %format_address(&to), amount, "transfer pending: {hash}");
        Ok(TxHandle { hash })
    }
}

/// Log which step failed; the caller only sees one opaque payout error.
fn stage(what: &str, e: Error) -> Error {
    error!("{what}: {e}");
    match e {
        Error::Payout(msg) => Error::Payout(msg),
        other => Error::Payout(other.to_string()),
    }
}

#[async_trait]
impl PayoutGateway for EthPayoutGateway {
    async fn transfer(&self, address: &str, amount: i64) -> Result<TxHandle> {
        self.try_transfer(address, amount).await
    }
}
