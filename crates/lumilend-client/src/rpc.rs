//! Boundary traits for everything the client talks to. Production code wires
//! in [`crate::server::SorobanServer`] and [`crate::horizon::HorizonServer`];
//! tests substitute in-memory fakes.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{Error, PoolError, Result};
use crate::types::AccountEntry;

/// Outcome of a transaction dry run. XDR payloads stay base64-encoded here;
/// the pipeline decodes them where they are consumed.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct SimulateResponse {
    /// Resource footprint to splice into the transaction before signing.
    pub transaction_data: Option<String>,
    /// Resource fee in stroops, added on top of the base fee.
    pub min_resource_fee: u64,
    /// Return value of the invoked function, when there is one.
    pub return_value: Option<String>,
    /// Authorization entries the invocation requires, one per signer.
    #[serde(default)]
    pub auth: Vec<String>,
    /// Raw diagnostic payload when the host rejected the invocation.
    pub error: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SubmitResponse {
    pub hash: String,
    /// Set when the network refused the transaction synchronously.
    pub error: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TxStatus {
    /// Not in a closed ledger yet, keep polling.
    NotFound,
    Success { return_value: Option<String> },
    Failed { detail: String },
}

#[async_trait]
pub trait LedgerRpc: Send + Sync {
    async fn simulate(&self, envelope_xdr: &str) -> Result<SimulateResponse>;
    async fn submit(&self, envelope_xdr: &str) -> Result<SubmitResponse>;
    async fn transaction_status(&self, hash: &str) -> Result<TxStatus>;
}

#[async_trait]
pub trait AccountSource: Send + Sync {
    /// Loads the current account snapshot, including the sequence number.
    /// Fails with [`Error::AccountNotFound`] for unfunded accounts.
    async fn load_account(&self, address: &str) -> Result<AccountEntry>;
}

/// The connected wallet. Signing may suspend for as long as the user keeps
/// the approval prompt open; dismissal surfaces as [`Error::UserRejected`].
#[async_trait]
pub trait WalletSigner: Send + Sync {
    async fn address(&self) -> Result<String>;
    async fn sign(&self, envelope_xdr: &str, network_passphrase: &str) -> Result<String>;
}

/// Maps a raw simulation diagnostic to the failure taxonomy. Contract
/// failures embed a code as `Error(Contract, #N)`; codes outside the pool's
/// table and payloads with no code at all are preserved as
/// [`PoolError::Unrecognized`].
pub fn decode_simulation_error(raw: &str) -> Error {
    let pool_error = extract_contract_code(raw)
        .and_then(PoolError::from_code)
        .unwrap_or_else(|| PoolError::Unrecognized { raw: raw.to_string() });
    Error::SimulationRejected(pool_error)
}

fn extract_contract_code(raw: &str) -> Option<u32> {
    let marker = "Error(Contract, #";
    let start = raw.find(marker)? + marker.len();
    let digits: String = raw[start..].chars().take_while(|c| c.is_ascii_digit()).collect();
    digits.parse().ok()
}
