/// Observable lifecycle of a submitted transaction. Phases are reported in
/// order; `Confirmed`, `Rejected` and `Failed` are terminal. A pipeline
/// run that errors before signing ends at the last phase it reported.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TxPhase {
    /// Loading the account and assembling the envelope.
    Building,
    /// Dry run finished; on success the footprint has been attached.
    Simulated,
    /// Waiting on the wallet. May last as long as the prompt stays open.
    AwaitingSignature,
    Submitted { hash: String },
    /// One poll round completed without a final status.
    Polling { hash: String, attempt: u32 },
    Confirmed { hash: String },
    /// The user dismissed the signing prompt. Nothing reached the network.
    Rejected,
    /// Included in a ledger but failed; the fee was consumed.
    Failed { hash: String },
}

impl TxPhase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, TxPhase::Confirmed { .. } | TxPhase::Rejected | TxPhase::Failed { .. })
    }
}

/// Receives phase transitions as they happen, for progress UIs and logs.
pub trait PhaseObserver: Send + Sync {
    fn on_phase(&self, phase: &TxPhase);
}

/// Drops all notifications.
pub struct NoopObserver;

impl PhaseObserver for NoopObserver {
    fn on_phase(&self, _phase: &TxPhase) {}
}
