//! Settlement oracle interface. The engine never prices a path itself; it
//! hands candidates to an external calculator and ranks what comes back.

use crate::engine::path::Path;
use crate::ledger::LedgerView;
use crate::types::{AccountId, Amount};

/// Outcome category of one settlement evaluation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SettlementStatus {
    Success,
    /// Transient failure; the candidate is dropped, the request continues.
    Temporary,
    /// The path cannot deliver the requested threshold.
    PathDry,
    /// The source cannot supply anything at all.
    NoLiquidity,
    /// The calculator lost its snapshot; the whole request fails.
    Fatal,
}

/// What a settlement evaluation delivered, and at what quality. Higher
/// quality is better; ties are broken by the ranker.
#[derive(Clone, Debug)]
pub struct SettlementOutcome {
    pub delivered: Amount,
    pub quality: u64,
    pub status: SettlementStatus,
}

impl SettlementOutcome {
    pub fn success(delivered: Amount, quality: u64) -> Self {
        SettlementOutcome {
            delivered,
            quality,
            status: SettlementStatus::Success,
        }
    }

    pub fn failure(status: SettlementStatus, delivered: Amount) -> Self {
        SettlementOutcome {
            delivered,
            quality: 0,
            status,
        }
    }
}

/// External settlement calculator, passed in as a capability. May run a
/// scratch copy of the ledger internally but must leave the engine's
/// snapshot untouched. The empty path denotes the default direct path.
pub trait SettlementOracle: Send + Sync {
    fn evaluate(
        &self,
        ledger: &dyn LedgerView,
        src: &AccountId,
        dst: &AccountId,
        dst_amount: &Amount,
        path: &Path,
    ) -> SettlementOutcome;
}
