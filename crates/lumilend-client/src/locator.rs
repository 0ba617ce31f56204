//! Finds a borrower's active loan. The contract exposes loans by id only,
//! so the client remembers the last known id per wallet and falls back to
//! probing ids from the bottom of the range when the hint is missing or
//! stale.

use tracing::debug;

use crate::codec;
use crate::constants::{LOAN_SCAN_BOUND, LOAN_SCAN_START};
use crate::error::{Error, PoolError, Result};
use crate::pipeline;
use crate::rpc::LedgerRpc;
use crate::storage::{self, KeyValueStore};
use crate::tx::ContractCall;
use crate::types::{Loan, Network};

pub struct LoanLocator<'a> {
    network: &'a Network,
    ledger: &'a dyn LedgerRpc,
    hints: &'a dyn KeyValueStore,
}

impl<'a> LoanLocator<'a> {
    pub fn new(
        network: &'a Network,
        ledger: &'a dyn LedgerRpc,
        hints: &'a dyn KeyValueStore,
    ) -> LoanLocator<'a> {
        LoanLocator { network, ledger, hints }
    }

    /// Returns the borrower's active loan, or `None` when there is none in
    /// the probed range. The hint is verified before use: a loan that is
    /// gone, no longer active or owned by someone else clears it and the
    /// scan runs instead. Probe failures never surface to the caller.
    pub async fn locate_active_loan(&self, borrower: &str) -> Option<Loan> {
        if let Some(hinted_id) = storage::read_loan_hint(self.hints, borrower) {
            match self.probe(hinted_id).await {
                Ok(Some(loan)) if Self::belongs_to(&loan, borrower) => {
                    debug!(borrower, loan_id = loan.loan_id, "loan hint verified");
                    return Some(loan);
                }
                Ok(_) => {
                    debug!(borrower, hinted_id, "loan hint stale, rescanning");
                    storage::clear_loan_hint(self.hints, borrower);
                }
                // transport trouble says nothing about the hint itself
                Err(err) => debug!(borrower, hinted_id, %err, "loan hint probe failed"),
            }
        }
        for loan_id in LOAN_SCAN_START..=LOAN_SCAN_BOUND {
            match self.probe(loan_id).await {
                Ok(Some(loan)) if Self::belongs_to(&loan, borrower) => {
                    storage::write_loan_hint(self.hints, borrower, loan_id);
                    debug!(borrower, loan_id, "active loan found by scan");
                    return Some(loan);
                }
                Ok(_) => {}
                Err(err) => debug!(loan_id, %err, "loan probe failed"),
            }
        }
        debug!(borrower, "no active loan in scanned range");
        None
    }

    /// Fetches one loan by id via simulation. `Ok(None)` means the id is
    /// authoritatively unused; transport and decode trouble is an `Err`.
    async fn probe(&self, loan_id: u64) -> Result<Option<Loan>> {
        let call = ContractCall::new(self.network.contract_id.clone(), "get_loan")
            .arg(codec::u64_to_scval(loan_id));
        match pipeline::simulate_call(self.network, self.ledger, &call).await {
            Ok(Some(val)) => Ok(Some(codec::loan_from_scval(loan_id, &val)?)),
            Ok(None) => Ok(None),
            Err(Error::SimulationRejected(PoolError::LoanNotFound)) => Ok(None),
            Err(other) => Err(other),
        }
    }

    fn belongs_to(loan: &Loan, borrower: &str) -> bool {
        loan.status.is_active() && loan.borrower == borrower
    }
}
