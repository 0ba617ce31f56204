//! JSON-RPC client for a Soroban node. Maps the node's wire shapes onto the
//! crate DTOs and nothing more; interpretation happens in the pipeline.

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use tracing::trace;

use crate::error::{Error, Result};
use crate::rpc::{LedgerRpc, SimulateResponse, SubmitResponse, TxStatus};

pub struct SorobanServer {
    http: reqwest::Client,
    url: String,
    next_id: AtomicU64,
}

impl SorobanServer {
    pub fn new(url: impl Into<String>) -> SorobanServer {
        SorobanServer {
            http: reqwest::Client::new(),
            url: url.into(),
            next_id: AtomicU64::new(1),
        }
    }

    async fn call<R: DeserializeOwned>(
        &self,
        method: &str,
        params: serde_json::Value,
    ) -> Result<R> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let body = json!({ "jsonrpc": "2.0", "id": id, "method": method, "params": params });
        trace!(method, id, "rpc call");
        let reply: RpcReply<R> = self
            .http
            .post(&self.url)
            .json(&body)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        if let Some(err) = reply.error {
            return Err(Error::Rpc(format!("{} (code {})", err.message, err.code)));
        }
        reply.result.ok_or_else(|| Error::Rpc(format!("{method} returned no result")))
    }
}

#[async_trait]
impl LedgerRpc for SorobanServer {
    async fn simulate(&self, envelope_xdr: &str) -> Result<SimulateResponse> {
        let raw: SimulateRaw = self
            .call("simulateTransaction", json!({ "transaction": envelope_xdr }))
            .await?;
        let first = raw.results.into_iter().next();
        Ok(SimulateResponse {
            transaction_data: raw.transaction_data,
            min_resource_fee: raw.min_resource_fee.and_then(|fee| fee.parse().ok()).unwrap_or(0),
            return_value: first.as_ref().and_then(|r| r.xdr.clone()),
            auth: first.map(|r| r.auth).unwrap_or_default(),
            error: raw.error,
        })
    }

    async fn submit(&self, envelope_xdr: &str) -> Result<SubmitResponse> {
        let raw: SendRaw = self
            .call("sendTransaction", json!({ "transaction": envelope_xdr }))
            .await?;
        let error = if raw.status == "ERROR" {
            Some(raw
                .error_result_xdr
                .unwrap_or_else(|| "rejected by the network".to_string()))
        } else {
            None
        };
        Ok(SubmitResponse { hash: raw.hash, error })
    }

    async fn transaction_status(&self, hash: &str) -> Result<TxStatus> {
        let raw: GetTxRaw = self.call("getTransaction", json!({ "hash": hash })).await?;
        Ok(match raw.status.as_str() {
            "NOT_FOUND" => TxStatus::NotFound,
            "SUCCESS" => TxStatus::Success { return_value: raw.return_value },
            other => TxStatus::Failed {
                detail: raw.result_xdr.unwrap_or_else(|| format!("status {other}")),
            },
        })
    }
}

// No `#[serde(default)]` on `result`: the derive would demand `R: Default`
// for the whole reply, and a missing optional field reads as `None` anyway.
#[derive(Deserialize)]
pub(crate) struct RpcReply<R> {
    pub(crate) result: Option<R>,
    pub(crate) error: Option<RpcErrorBody>,
}

#[derive(Deserialize)]
pub(crate) struct RpcErrorBody {
    #[serde(default)]
    pub(crate) code: i64,
    #[serde(default)]
    pub(crate) message: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SimulateRaw {
    #[serde(default)]
    transaction_data: Option<String>,
    #[serde(default)]
    min_resource_fee: Option<String>,
    #[serde(default)]
    results: Vec<SimulateResultRaw>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SimulateResultRaw {
    #[serde(default)]
    xdr: Option<String>,
    #[serde(default)]
    auth: Vec<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SendRaw {
    #[serde(default)]
    status: String,
    #[serde(default)]
    hash: String,
    #[serde(default)]
    error_result_xdr: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GetTxRaw {
    #[serde(default)]
    status: String,
    #[serde(default)]
    return_value: Option<String>,
    #[serde(default)]
    result_xdr: Option<String>,
}
