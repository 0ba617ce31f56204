use serde::{Deserialize, Serialize};

use crate::amount::Amount;
use crate::constants::{
    BASE_FEE, TESTNET_HORIZON_URL, TESTNET_PASSPHRASE, TESTNET_RPC_URL, TX_VALID_SECS,
};

/// Pool-wide aggregates as reported by `get_pool_stats`.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct PoolStats {
    pub total_deposited: Amount,
    pub total_lent: Amount,
    pub available: Amount,
    pub interest_rate_bps: u32,
}

/// Per-lender position as reported by `get_lender_info`. The contract
/// returns a zeroed record for addresses that never deposited.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct LenderInfo {
    pub amount: Amount,
    pub deposit_timestamp: u64,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum LoanStatus {
    Active,
    Repaid,
    Defaulted,
}

impl LoanStatus {
    pub fn is_active(self) -> bool {
        self == LoanStatus::Active
    }
}

/// A loan record joined with the id it was fetched under.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Loan {
    pub loan_id: u64,
    pub borrower: String,
    pub principal: Amount,
    pub interest_owed: Amount,
    pub due_timestamp: u64,
    pub status: LoanStatus,
}

impl Loan {
    /// Principal plus flat interest, the amount `repay_loan` expects.
    pub fn total_due(&self) -> Amount {
        self.principal.saturating_add(self.interest_owed)
    }
}

/// A ledger account snapshot. `sequence` is the current on-chain value; the
/// next transaction must use `sequence + 1`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AccountEntry {
    pub address: String,
    pub sequence: i64,
    pub native_balance: Option<Amount>,
}

/// Endpoints and network parameters the client operates against.
#[derive(Clone, Debug)]
pub struct Network {
    pub rpc_url: String,
    pub horizon_url: String,
    pub network_passphrase: String,
    pub contract_id: String,
    pub base_fee: u32,
    pub tx_valid_secs: u64,
}

impl Network {
    pub fn testnet(contract_id: impl Into<String>) -> Network {
        Network {
            rpc_url: TESTNET_RPC_URL.to_string(),
            horizon_url: TESTNET_HORIZON_URL.to_string(),
            network_passphrase: TESTNET_PASSPHRASE.to_string(),
            contract_id: contract_id.into(),
            base_fee: BASE_FEE,
            tx_valid_secs: TX_VALID_SECS,
        }
    }

    /// Testnet defaults with `LUMILEND_*` environment overrides.
    pub fn from_env() -> Network {
        let mut network = Network::testnet(
            std::env::var("LUMILEND_CONTRACT_ID").unwrap_or_default(),
        );
        if let Ok(url) = std::env::var("LUMILEND_RPC_URL") {
            network.rpc_url = url;
        }
        if let Ok(url) = std::env::var("LUMILEND_HORIZON_URL") {
            network.horizon_url = url;
        }
        if let Ok(passphrase) = std::env::var("LUMILEND_NETWORK_PASSPHRASE") {
            network.network_passphrase = passphrase;
        }
        network
    }
}
