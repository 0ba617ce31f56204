use std::time::Duration;

pub const STROOPS_PER_XLM: i128 = 10_000_000; // 7 decimal places
pub const AMOUNT_DECIMALS: u32 = 7;
pub const BPS_DENOMINATOR: i128 = 10_000; // 100% in basis points

pub const BASE_FEE: u32 = 100; // stroops, before simulation resource fees
pub const TX_VALID_SECS: u64 = 30; // upper time bound on built transactions
pub const POLL_INTERVAL: Duration = Duration::from_secs(2);

pub const POOL_STATS_TTL: Duration = Duration::from_secs(30);
pub const PER_ADDRESS_TTL: Duration = Duration::from_secs(10);
pub const POOL_STATS_CACHE_KEY: &str = "pool_stats";

pub const LOAN_SCAN_START: u64 = 1; // loan ids are issued from 1
pub const LOAN_SCAN_BOUND: u64 = 20;
pub const LOAN_HINT_PREFIX: &str = "lumilend_loan_";

pub const MEMO_TEXT_MAX: usize = 28; // classic memo text limit in bytes

pub const TESTNET_RPC_URL: &str = "https://soroban-testnet.stellar.org";
pub const TESTNET_HORIZON_URL: &str = "https://horizon-testnet.stellar.org";
pub const TESTNET_PASSPHRASE: &str = "Test SDF Network ; September 2015";

// Read-only simulations do not consume a sequence number, so they all run
// against the zero account instead of loading the caller's account first.
pub const SIMULATION_ACCOUNT: &str =
    "GAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAWHF";
pub const SIMULATION_SEQUENCE: i64 = 1;
