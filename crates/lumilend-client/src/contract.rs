//! The lending pool client. Wraps the pipeline, the read caches and the
//! loan locator behind the operations the pool contract offers, plus plain
//! XLM payments over the same lifecycle.

use std::sync::Arc;

use tracing::debug;

use crate::amount::Amount;
use crate::cache::TtlCache;
use crate::codec;
use crate::constants::{PER_ADDRESS_TTL, POOL_STATS_CACHE_KEY, POOL_STATS_TTL};
use crate::error::{Error, Result};
use crate::events::{NoopObserver, PhaseObserver};
use crate::horizon::HorizonServer;
use crate::locator::LoanLocator;
use crate::pipeline::{self, Confirmation, SubmitOptions, TxPipeline};
use crate::rpc::{AccountSource, LedgerRpc, WalletSigner};
use crate::server::SorobanServer;
use crate::storage::{self, KeyValueStore};
use crate::tx::{ContractCall, PaymentIntent, TxIntent};
use crate::types::{LenderInfo, Loan, Network, PoolStats};

/// Everything the client talks to, injected so tests can swap in fakes.
pub struct Collaborators {
    pub ledger: Arc<dyn LedgerRpc>,
    /// Backend for classic payments; horizon in production.
    pub payments: Arc<dyn LedgerRpc>,
    pub accounts: Arc<dyn AccountSource>,
    pub wallet: Arc<dyn WalletSigner>,
    pub hints: Arc<dyn KeyValueStore>,
    pub observer: Arc<dyn PhaseObserver>,
}

/// Outcome of a loan request: the confirming transaction plus the loan id
/// the contract handed back, when the node reported one.
#[derive(Clone, Debug)]
pub struct LoanReceipt {
    pub hash: String,
    pub loan_id: Option<u64>,
}

pub struct LumiLendClient {
    network: Network,
    ledger: Arc<dyn LedgerRpc>,
    payments: Arc<dyn LedgerRpc>,
    accounts: Arc<dyn AccountSource>,
    wallet: Arc<dyn WalletSigner>,
    hints: Arc<dyn KeyValueStore>,
    observer: Arc<dyn PhaseObserver>,
    stats_cache: TtlCache<Option<PoolStats>>,
    lender_cache: TtlCache<Option<LenderInfo>>,
    balance_cache: TtlCache<Option<Amount>>,
    loan_cache: TtlCache<Option<Loan>>,
}

impl LumiLendClient {
    pub fn new(network: Network, collaborators: Collaborators) -> LumiLendClient {
        let Collaborators { ledger, payments, accounts, wallet, hints, observer } = collaborators;
        LumiLendClient {
            network,
            ledger,
            payments,
            accounts,
            wallet,
            hints,
            observer,
            stats_cache: TtlCache::new(),
            lender_cache: TtlCache::new(),
            balance_cache: TtlCache::new(),
            loan_cache: TtlCache::new(),
        }
    }

    /// Client wired to the live endpoints named in `network`.
    pub fn online(
        network: Network,
        wallet: Arc<dyn WalletSigner>,
        hints: Arc<dyn KeyValueStore>,
    ) -> LumiLendClient {
        let horizon = Arc::new(HorizonServer::new(network.horizon_url.clone()));
        let collaborators = Collaborators {
            ledger: Arc::new(SorobanServer::new(network.rpc_url.clone())),
            payments: horizon.clone(),
            accounts: horizon,
            wallet,
            hints,
            observer: Arc::new(NoopObserver),
        };
        LumiLendClient::new(network, collaborators)
    }

    pub fn network(&self) -> &Network {
        &self.network
    }

    /// Address of the connected wallet.
    pub async fn wallet_address(&self) -> Result<String> {
        self.wallet.address().await
    }

    /// Deposits XLM into the pool from the connected wallet.
    pub async fn deposit(&self, amount: Amount, options: &SubmitOptions) -> Result<Confirmation> {
        let lender = self.wallet.address().await?;
        let call = self
            .pool_call("deposit")
            .arg(codec::address_to_scval(&lender)?)
            .arg(codec::i128_to_scval(amount.stroops()));
        let confirmation = self.pipeline().run(&lender, &TxIntent::Invoke(call), options).await?;
        self.invalidate_after_write(&lender);
        Ok(confirmation)
    }

    /// Withdraws part of the caller's deposited balance.
    pub async fn withdraw(&self, amount: Amount, options: &SubmitOptions) -> Result<Confirmation> {
        let lender = self.wallet.address().await?;
        let call = self
            .pool_call("withdraw")
            .arg(codec::address_to_scval(&lender)?)
            .arg(codec::i128_to_scval(amount.stroops()));
        let confirmation = self.pipeline().run(&lender, &TxIntent::Invoke(call), options).await?;
        self.invalidate_after_write(&lender);
        Ok(confirmation)
    }

    /// Requests a loan and remembers the returned id for the locator.
    pub async fn request_loan(
        &self,
        amount: Amount,
        duration_days: u32,
        options: &SubmitOptions,
    ) -> Result<LoanReceipt> {
        let borrower = self.wallet.address().await?;
        let call = self
            .pool_call("request_loan")
            .arg(codec::address_to_scval(&borrower)?)
            .arg(codec::i128_to_scval(amount.stroops()))
            .arg(codec::u32_to_scval(duration_days));
        let confirmation = self.pipeline().run(&borrower, &TxIntent::Invoke(call), options).await?;
        let loan_id = confirmation
            .return_value
            .as_ref()
            .and_then(|val| codec::u64_from_scval(val).ok());
        match loan_id {
            Some(id) => storage::write_loan_hint(self.hints.as_ref(), &borrower, id),
            None => debug!(%borrower, "loan confirmed without an id in the result"),
        }
        self.invalidate_after_write(&borrower);
        Ok(LoanReceipt { hash: confirmation.hash, loan_id })
    }

    /// Repays a loan in full and drops the remembered id.
    pub async fn repay_loan(&self, loan_id: u64, options: &SubmitOptions) -> Result<Confirmation> {
        let borrower = self.wallet.address().await?;
        let call = self
            .pool_call("repay_loan")
            .arg(codec::address_to_scval(&borrower)?)
            .arg(codec::u64_to_scval(loan_id));
        let confirmation = self.pipeline().run(&borrower, &TxIntent::Invoke(call), options).await?;
        storage::clear_loan_hint(self.hints.as_ref(), &borrower);
        self.invalidate_after_write(&borrower);
        Ok(confirmation)
    }

    /// What repaying `loan` costs: principal plus the flat interest the
    /// contract fixed when the loan was issued.
    pub fn repay_preview(&self, loan: &Loan) -> Amount {
        loan.total_due()
    }

    /// Sends a classic XLM payment through the same lifecycle as contract
    /// calls. Destination and amount are validated before anything is built.
    pub async fn send_payment(
        &self,
        payment: PaymentIntent,
        options: &SubmitOptions,
    ) -> Result<Confirmation> {
        let sender = self.wallet.address().await?;
        if payment.destination == sender {
            return Err(Error::invalid_address(&payment.destination, "cannot pay yourself"));
        }
        let destination = payment.destination.clone();
        let confirmation = self
            .payment_pipeline()
            .run(&sender, &TxIntent::Payment(payment), options)
            .await?;
        self.balance_cache.invalidate(&sender);
        self.balance_cache.invalidate(&destination);
        Ok(confirmation)
    }

    /// Pool aggregates, cached briefly. `None` when the pool cannot be
    /// reached; absence is also cached so an outage does not hammer the
    /// node.
    pub async fn pool_stats(&self) -> Option<PoolStats> {
        self.stats_cache
            .get_or_fetch(POOL_STATS_CACHE_KEY, POOL_STATS_TTL, || async move {
                swallow("pool stats", self.fetch_pool_stats().await)
            })
            .await
    }

    /// The lender position for `address`, or `None` on any failure.
    pub async fn lender_info(&self, address: &str) -> Option<LenderInfo> {
        self.lender_cache
            .get_or_fetch(address, PER_ADDRESS_TTL, || async move {
                swallow("lender info", self.fetch_lender_info(address).await)
            })
            .await
    }

    /// Native balance for `address`, or `None` when the account is missing
    /// or the network fails.
    pub async fn xlm_balance(&self, address: &str) -> Option<Amount> {
        self.balance_cache
            .get_or_fetch(address, PER_ADDRESS_TTL, || async move {
                swallow("xlm balance", self.accounts.load_account(address).await)
                    .and_then(|entry| entry.native_balance)
            })
            .await
    }

    /// The borrower's active loan, located via hint or bounded scan.
    pub async fn active_loan(&self, borrower: &str) -> Option<Loan> {
        self.loan_cache
            .get_or_fetch(borrower, PER_ADDRESS_TTL, || async move {
                LoanLocator::new(&self.network, self.ledger.as_ref(), self.hints.as_ref())
                    .locate_active_loan(borrower)
                    .await
            })
            .await
    }

    /// Drops every cached read, for wallet switches and disconnects.
    pub fn reset_caches(&self) {
        self.stats_cache.clear();
        self.lender_cache.clear();
        self.balance_cache.clear();
        self.loan_cache.clear();
    }

    async fn fetch_pool_stats(&self) -> Result<PoolStats> {
        let call = self.pool_call("get_pool_stats");
        let val = pipeline::simulate_call(&self.network, self.ledger.as_ref(), &call)
            .await?
            .ok_or_else(|| Error::Rpc("get_pool_stats returned nothing".to_string()))?;
        codec::pool_stats_from_scval(&val)
    }

    async fn fetch_lender_info(&self, address: &str) -> Result<LenderInfo> {
        let call = self
            .pool_call("get_lender_info")
            .arg(codec::address_to_scval(address)?);
        let val = pipeline::simulate_call(&self.network, self.ledger.as_ref(), &call)
            .await?
            .ok_or_else(|| Error::Rpc("get_lender_info returned nothing".to_string()))?;
        codec::lender_info_from_scval(&val)
    }

    fn pool_call(&self, function: &str) -> ContractCall {
        ContractCall::new(self.network.contract_id.clone(), function)
    }

    fn pipeline(&self) -> TxPipeline<'_> {
        TxPipeline::new(
            &self.network,
            self.ledger.as_ref(),
            self.accounts.as_ref(),
            self.wallet.as_ref(),
            self.observer.as_ref(),
        )
    }

    fn payment_pipeline(&self) -> TxPipeline<'_> {
        TxPipeline::new(
            &self.network,
            self.payments.as_ref(),
            self.accounts.as_ref(),
            self.wallet.as_ref(),
            self.observer.as_ref(),
        )
    }

    /// A confirmed write moves pool liquidity and the caller's balances, so
    /// every related cached read goes stale at once.
    fn invalidate_after_write(&self, address: &str) {
        self.stats_cache.invalidate(POOL_STATS_CACHE_KEY);
        self.lender_cache.invalidate(address);
        self.balance_cache.invalidate(address);
        self.loan_cache.invalidate(address);
    }
}

fn swallow<T>(what: &'static str, result: Result<T>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(err) => {
            debug!(what, %err, "read failed, reporting absent");
            None
        }
    }
}
