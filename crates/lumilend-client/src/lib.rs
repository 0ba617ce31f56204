//! Client for the LumiLend XLM lending pool on Soroban.
//!
//! Contract calls and classic payments run through one pipeline
//! (build, simulate, sign, submit, poll); reads go through short-lived
//! caches and come back as `Option` so display layers degrade gracefully
//! instead of failing. All network and wallet access sits behind traits.

pub mod amount;
pub mod cache;
pub mod codec;
pub mod constants;
pub mod contract;
pub mod error;
pub mod events;
pub mod horizon;
pub mod locator;
pub mod pipeline;
pub mod rpc;
pub mod server;
pub mod storage;
pub mod tx;
pub mod types;

pub use amount::Amount;
pub use contract::{Collaborators, LoanReceipt, LumiLendClient};
pub use error::{Error, PoolError, Result};
pub use events::{NoopObserver, PhaseObserver, TxPhase};
pub use horizon::HorizonServer;
pub use locator::LoanLocator;
pub use pipeline::{Confirmation, SubmitOptions, TxPipeline};
pub use rpc::{
    AccountSource, LedgerRpc, SimulateResponse, SubmitResponse, TxStatus, WalletSigner,
};
pub use server::SorobanServer;
pub use storage::{JsonFileStore, KeyValueStore, MemoryStore};
pub use tx::{ContractCall, PaymentIntent, TxIntent};
pub use types::{AccountEntry, LenderInfo, Loan, LoanStatus, Network, PoolStats};
