//! Drives a transaction from intent to terminal outcome:
//! build, simulate, sign, submit, then poll until the ledger settles it.

use std::time::Duration;

use stellar_xdr::curr as xdr;
use tokio::time::{sleep, Instant};
use tracing::{debug, warn};

use crate::codec;
use crate::constants::{POLL_INTERVAL, SIMULATION_ACCOUNT, SIMULATION_SEQUENCE};
use crate::error::{Error, Result};
use crate::events::{PhaseObserver, TxPhase};
use crate::rpc::{self, AccountSource, LedgerRpc, WalletSigner};
use crate::tx::{self, ContractCall, TxIntent};
use crate::types::{AccountEntry, Network};

/// Knobs for a single pipeline run.
#[derive(Clone, Debug, Default)]
pub struct SubmitOptions {
    /// Give up polling after this long and report the outcome as unknown.
    /// `None` polls until the ledger answers.
    pub poll_timeout: Option<Duration>,
}

/// A confirmed transaction and whatever the invocation returned.
#[derive(Clone, Debug)]
pub struct Confirmation {
    pub hash: String,
    pub return_value: Option<xdr::ScVal>,
}

pub struct TxPipeline<'a> {
    network: &'a Network,
    ledger: &'a dyn LedgerRpc,
    accounts: &'a dyn AccountSource,
    wallet: &'a dyn WalletSigner,
    observer: &'a dyn PhaseObserver,
}

impl<'a> TxPipeline<'a> {
    pub fn new(
        network: &'a Network,
        ledger: &'a dyn LedgerRpc,
        accounts: &'a dyn AccountSource,
        wallet: &'a dyn WalletSigner,
        observer: &'a dyn PhaseObserver,
    ) -> TxPipeline<'a> {
        TxPipeline { network, ledger, accounts, wallet, observer }
    }

    /// Runs `intent` to a terminal outcome on behalf of `signer`.
    ///
    /// The account is re-loaded on every run so the sequence number is
    /// current. Submission happens at most once; failures after it carry
    /// the transaction hash so the caller can tell fee-consuming failures
    /// apart from free ones.
    pub async fn run(
        &self,
        signer: &str,
        intent: &TxIntent,
        options: &SubmitOptions,
    ) -> Result<Confirmation> {
        debug!(op = intent.label(), signer, "transaction started");
        self.observer.on_phase(&TxPhase::Building);
        let account = self.accounts.load_account(signer).await?;
        let mut envelope =
            tx::build_envelope(self.network, &account, intent, tx::deadline(self.network.tx_valid_secs))?;

        let sim = self.ledger.simulate(&tx::envelope_to_base64(&envelope)?).await?;
        self.observer.on_phase(&TxPhase::Simulated);
        if let Some(raw) = &sim.error {
            let err = rpc::decode_simulation_error(raw);
            warn!(op = intent.label(), %err, "simulation rejected");
            return Err(err);
        }
        tx::attach_simulation(&mut envelope, &sim)?;

        self.observer.on_phase(&TxPhase::AwaitingSignature);
        let signed_xdr = match self
            .wallet
            .sign(&tx::envelope_to_base64(&envelope)?, &self.network.network_passphrase)
            .await
        {
            Ok(signed) => signed,
            Err(Error::UserRejected) => {
                self.observer.on_phase(&TxPhase::Rejected);
                debug!(op = intent.label(), "signing dismissed");
                return Err(Error::UserRejected);
            }
            Err(other) => return Err(other),
        };
        // round-trip through the codec so a malformed wallet response fails
        // here instead of at the network
        let signed = tx::envelope_from_base64(&signed_xdr)?;

        let submit = self.ledger.submit(&tx::envelope_to_base64(&signed)?).await?;
        if let Some(reason) = submit.error {
            warn!(op = intent.label(), %reason, "submission refused");
            return Err(Error::SubmissionFailed { reason });
        }
        let hash = submit.hash;
        self.observer.on_phase(&TxPhase::Submitted { hash: hash.clone() });

        let started = Instant::now();
        let mut attempt: u32 = 0;
        loop {
            match self.ledger.transaction_status(&hash).await? {
                rpc::TxStatus::Success { return_value } => {
                    self.observer.on_phase(&TxPhase::Confirmed { hash: hash.clone() });
                    debug!(op = intent.label(), %hash, "transaction confirmed");
                    let decoded = match return_value {
                        Some(encoded) => Some(codec::scval_from_base64(&encoded)?),
                        None => None,
                    };
                    return Ok(Confirmation { hash, return_value: decoded });
                }
                rpc::TxStatus::Failed { detail } => {
                    self.observer.on_phase(&TxPhase::Failed { hash: hash.clone() });
                    warn!(op = intent.label(), %hash, %detail, "transaction failed on ledger");
                    return Err(Error::LedgerFailed { hash, detail });
                }
                rpc::TxStatus::NotFound => {
                    if let Some(limit) = options.poll_timeout {
                        if started.elapsed() >= limit {
                            warn!(op = intent.label(), %hash, "gave up polling");
                            return Err(Error::PollingTimedOut { hash });
                        }
                    }
                    attempt += 1;
                    self.observer.on_phase(&TxPhase::Polling { hash: hash.clone(), attempt });
                    sleep(POLL_INTERVAL).await;
                }
            }
        }
    }
}

/// Read-only invocation: build against the fixed simulation account, dry
/// run, and return the decoded result without touching a wallet. Contract
/// failures still surface as typed errors.
pub async fn simulate_call(
    network: &Network,
    ledger: &dyn LedgerRpc,
    call: &ContractCall,
) -> Result<Option<xdr::ScVal>> {
    let account = AccountEntry {
        address: SIMULATION_ACCOUNT.to_string(),
        sequence: SIMULATION_SEQUENCE,
        native_balance: None,
    };
    let envelope = tx::build_envelope(
        network,
        &account,
        &TxIntent::Invoke(call.clone()),
        tx::deadline(network.tx_valid_secs),
    )?;
    let sim = ledger.simulate(&tx::envelope_to_base64(&envelope)?).await?;
    if let Some(raw) = &sim.error {
        return Err(rpc::decode_simulation_error(raw));
    }
    match sim.return_value {
        Some(encoded) => Ok(Some(codec::scval_from_base64(&encoded)?)),
        None => Ok(None),
    }
}
