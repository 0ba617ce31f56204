use thiserror::Error;

/// Failure codes defined by the lending pool contract. Simulation diagnostics
/// carry them as `Error(Contract, #N)`; [`PoolError::from_code`] is the only
/// place raw codes are turned into variants.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PoolError {
    #[error("pool is already initialized")]
    AlreadyInitialized,
    #[error("the pool does not have enough liquidity for this loan")]
    InsufficientPoolLiquidity,
    #[error("deposited balance is too low for this withdrawal")]
    InsufficientBalance,
    #[error("an active loan already exists for this address")]
    LoanAlreadyActive,
    #[error("no loan exists with this id")]
    LoanNotFound,
    #[error("the loan is not active")]
    LoanNotActive,
    #[error("repayment is below the outstanding amount")]
    RepaymentTooLow,
    #[error("the loan has not defaulted yet")]
    NotYetDefaulted,
    #[error("caller is not authorized for this action")]
    Unauthorized,
    /// Anything the closed code table does not cover, kept verbatim so the
    /// original diagnostic is not lost.
    #[error("unrecognized contract failure: {raw}")]
    Unrecognized { raw: String },
}

impl PoolError {
    pub fn from_code(code: u32) -> Option<PoolError> {
        match code {
            1 => Some(PoolError::AlreadyInitialized),
            2 => Some(PoolError::InsufficientPoolLiquidity),
            3 => Some(PoolError::InsufficientBalance),
            4 => Some(PoolError::LoanAlreadyActive),
            5 => Some(PoolError::LoanNotFound),
            6 => Some(PoolError::LoanNotActive),
            7 => Some(PoolError::RepaymentTooLow),
            8 => Some(PoolError::NotYetDefaulted),
            9 => Some(PoolError::Unauthorized),
            _ => None,
        }
    }

    pub fn code(&self) -> Option<u32> {
        match self {
            PoolError::AlreadyInitialized => Some(1),
            PoolError::InsufficientPoolLiquidity => Some(2),
            PoolError::InsufficientBalance => Some(3),
            PoolError::LoanAlreadyActive => Some(4),
            PoolError::LoanNotFound => Some(5),
            PoolError::LoanNotActive => Some(6),
            PoolError::RepaymentTooLow => Some(7),
            PoolError::NotYetDefaulted => Some(8),
            PoolError::Unauthorized => Some(9),
            PoolError::Unrecognized { .. } => None,
        }
    }
}

/// Client-side failure taxonomy. Every operation returns one of these so
/// callers can map failures to user-facing outcomes without string matching.
#[derive(Error, Debug)]
pub enum Error {
    #[error("no wallet is connected")]
    WalletUnavailable,
    #[error("signing request was dismissed in the wallet")]
    UserRejected,
    #[error("account {address} not found on the network; it may need funding")]
    AccountNotFound { address: String },
    #[error("simulation rejected the transaction: {0}")]
    SimulationRejected(PoolError),
    #[error("the network did not accept the transaction: {reason}")]
    SubmissionFailed { reason: String },
    #[error("transaction {hash} was included but failed on the ledger: {detail}")]
    LedgerFailed { hash: String, detail: String },
    #[error("transaction {hash} was not confirmed in time; its outcome is unknown")]
    PollingTimedOut { hash: String },
    #[error("invalid address {address}: {reason}")]
    InvalidAddress { address: String, reason: String },
    #[error("invalid amount {input:?}: {reason}")]
    InvalidAmount { input: String, reason: String },
    #[error("memo rejected: {reason}")]
    InvalidMemo { reason: String },
    #[error("xdr encoding failed: {0}")]
    Xdr(String),
    #[error("rpc transport failure: {0}")]
    Rpc(String),
}

impl Error {
    pub fn invalid_address(address: &str, reason: &str) -> Error {
        Error::InvalidAddress { address: address.to_string(), reason: reason.to_string() }
    }

    pub fn invalid_amount(input: &str, reason: &str) -> Error {
        Error::InvalidAmount { input: input.to_string(), reason: reason.to_string() }
    }

    /// True when the failure is known to have happened before the
    /// transaction was handed to the network, so retrying cannot
    /// double-submit. Transport and decode failures stay `false` because
    /// they can surface at any stage.
    pub fn is_pre_submission(&self) -> bool {
        matches!(
            self,
            Error::WalletUnavailable
                | Error::UserRejected
                | Error::AccountNotFound { .. }
                | Error::SimulationRejected(_)
                | Error::InvalidAddress { .. }
                | Error::InvalidAmount { .. }
                | Error::InvalidMemo { .. }
        )
    }
}

impl From<stellar_xdr::curr::Error> for Error {
    fn from(err: stellar_xdr::curr::Error) -> Error {
        Error::Xdr(err.to_string())
    }
}

impl From<base64::DecodeError> for Error {
    fn from(err: base64::DecodeError) -> Error {
        Error::Xdr(format!("invalid base64: {err}"))
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Error {
        Error::Rpc(err.to_string())
    }
}

pub type Result<T> = core::result::Result<T, Error>;
