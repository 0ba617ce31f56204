//! Horizon REST client. Serves two roles: the account source for sequence
//! numbers and balances, and the ledger backend for classic XLM payments.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::amount::Amount;
use crate::error::{Error, Result};
use crate::rpc::{AccountSource, LedgerRpc, SimulateResponse, SubmitResponse, TxStatus};
use crate::types::AccountEntry;

pub struct HorizonServer {
    http: reqwest::Client,
    url: String,
}

impl HorizonServer {
    pub fn new(url: impl Into<String>) -> HorizonServer {
        let url = url.into();
        HorizonServer {
            http: reqwest::Client::new(),
            url: url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl AccountSource for HorizonServer {
    async fn load_account(&self, address: &str) -> Result<AccountEntry> {
        let response = self
            .http
            .get(format!("{}/accounts/{}", self.url, address))
            .send()
            .await?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(Error::AccountNotFound { address: address.to_string() });
        }
        let raw: AccountRaw = response.error_for_status()?.json().await?;
        let sequence = raw
            .sequence
            .parse()
            .map_err(|_| Error::Rpc(format!("bad account sequence {:?}", raw.sequence)))?;
        let native_balance = raw
            .balances
            .iter()
            .find(|b| b.asset_type == "native")
            .and_then(|b| Amount::parse(&b.balance).ok());
        Ok(AccountEntry { address: address.to_string(), sequence, native_balance })
    }
}

#[async_trait]
impl LedgerRpc for HorizonServer {
    /// Classic operations have no dry run. Report an empty simulation so
    /// the pipeline proceeds straight to signing.
    async fn simulate(&self, _envelope_xdr: &str) -> Result<SimulateResponse> {
        Ok(SimulateResponse::default())
    }

    async fn submit(&self, envelope_xdr: &str) -> Result<SubmitResponse> {
        let response = self
            .http
            .post(format!("{}/transactions", self.url))
            .form(&[("tx", envelope_xdr)])
            .send()
            .await?;
        if response.status().is_client_error() {
            let failure: SubmitFailureRaw = response.json().await.unwrap_or_default();
            let reason =
                describe_result_codes(failure.extras.and_then(|extras| extras.result_codes));
            return Ok(SubmitResponse { hash: String::new(), error: Some(reason) });
        }
        let raw: SubmitOkRaw = response.error_for_status()?.json().await?;
        Ok(SubmitResponse { hash: raw.hash, error: None })
    }

    async fn transaction_status(&self, hash: &str) -> Result<TxStatus> {
        let response = self
            .http
            .get(format!("{}/transactions/{}", self.url, hash))
            .send()
            .await?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(TxStatus::NotFound);
        }
        let raw: TxRecordRaw = response.error_for_status()?.json().await?;
        Ok(if raw.successful {
            TxStatus::Success { return_value: None }
        } else {
            TxStatus::Failed {
                detail: raw.result_xdr.unwrap_or_else(|| "marked failed by horizon".to_string()),
            }
        })
    }
}

/// Renders horizon result codes as a message a user can act on. Unknown
/// combinations fall back to the raw codes.
pub(crate) fn describe_result_codes(codes: Option<ResultCodes>) -> String {
    let Some(codes) = codes else {
        return "transaction rejected".to_string();
    };
    if codes.operations.iter().any(|code| code == "op_no_destination") {
        return "the recipient account does not exist on the network; it needs funding first"
            .to_string();
    }
    if codes.operations.iter().any(|code| code == "op_underfunded") {
        return "insufficient XLM balance for this transaction".to_string();
    }
    if codes
        .transaction
        .as_deref()
        .map_or(false, |code| code.contains("tx_bad_auth"))
    {
        return "the transaction signature is invalid".to_string();
    }
    let raw = serde_json::to_string(&codes).unwrap_or_default();
    format!("transaction failed: {raw}")
}

#[derive(Deserialize)]
struct AccountRaw {
    sequence: String,
    #[serde(default)]
    balances: Vec<BalanceRaw>,
}

#[derive(Deserialize)]
struct BalanceRaw {
    #[serde(default)]
    asset_type: String,
    #[serde(default)]
    balance: String,
}

#[derive(Default, Deserialize)]
struct SubmitFailureRaw {
    #[serde(default)]
    extras: Option<ExtrasRaw>,
}

#[derive(Deserialize)]
struct ExtrasRaw {
    #[serde(default)]
    result_codes: Option<ResultCodes>,
}

#[derive(Default, Deserialize, Serialize)]
pub(crate) struct ResultCodes {
    #[serde(default)]
    pub(crate) transaction: Option<String>,
    #[serde(default)]
    pub(crate) operations: Vec<String>,
}

#[derive(Deserialize)]
struct SubmitOkRaw {
    hash: String,
}

#[derive(Deserialize)]
struct TxRecordRaw {
    #[serde(default)]
    successful: bool,
    #[serde(default)]
    result_xdr: Option<String>,
}
