//! JSON-RPC 2.0 over HTTP.

use std::{
    sync::atomic::{AtomicU64, Ordering},
    time::Duration,
};

use serde::{de::DeserializeOwned, Deserialize};
use serde_json::{json, Value};

use tipbot_core::{errors::Error, Result};

#[derive(Debug, Deserialize)]
struct RpcErrorBody {
    code: i64,
    message: String,
}

#[derive(Debug, Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<RpcErrorBody>,
}

#[derive(Debug)]
pub struct RpcClient {
    url: String,
    http: reqwest::Client,
    next_id: AtomicU64,
}

impl RpcClient {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Payout(format!("http client error: {e}")))?;
        Ok(Self {
            url: url.into(),
            http,
            next_id: AtomicU64::new(1),
        })
    }

    pub async fn call<T: DeserializeOwned>(&self, method: &str, params: Value) -> Result<T> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let body = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });

        let resp = self
            .http
            .post(&self.url)
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::Payout(format!("{method} request error: {e}")))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            return Err(Error::Payout(format!(
                "{method} failed: {status} {}",
                text.chars().take(200).collect::<String>()
            )));
        }

        let v: Value = resp
            .json()
            .await
            .map_err(|e| Error::Payout(format!("{method} json error: {e}")))?;
        decode_response(method, v)
    }
}

fn decode_response<T: DeserializeOwned>(method: &str, v: Value) -> Result<T> {
    let resp: RpcResponse = serde_json::from_value(v)?;
    if let Some(err) = resp.error {
        return Err(Error::Payout(format!(
            "{method}: {} (code {})",
            err.message, err.code
        )));
    }
    let Some(result) = resp.result else {
        return Err(Error::Payout(format!("{method}: response has no result")));
    };
    serde_json::from_value(result)
        .map_err(|e| Error::Payout(format!("{method}: unexpected result: {e}")))
}
