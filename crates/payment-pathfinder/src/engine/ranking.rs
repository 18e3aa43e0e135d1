//! Candidate ranking: measure each path through the settlement oracle and
//! order the survivors.

use std::cmp::Ordering;

use rust_decimal::Decimal;
use tracing::debug;

use crate::engine::path::{Path, PathSet};
use crate::engine::settlement::{SettlementOracle, SettlementStatus};
use crate::ledger::LedgerView;
use crate::types::{AccountId, Amount, PathfinderError, Result};

/// Measured standing of one candidate path.
#[derive(Clone, Debug)]
pub struct PathRank {
    pub quality: u64,
    pub length: usize,
    pub liquidity: Amount,
    pub index: usize,
}

/// Quality first, then shorter, then more liquid, then insertion order.
pub(crate) fn compare_ranks(a: &PathRank, b: &PathRank) -> Ordering {
    b.quality
        .cmp(&a.quality)
        .then(a.length.cmp(&b.length))
        .then(b.liquidity.value().cmp(&a.liquidity.value()))
        .then(a.index.cmp(&b.index))
}

/// Paths delivering less than a small fraction of what is still owed are not
/// worth keeping.
pub(crate) fn keep_threshold(remaining: &Amount, dst_amount: &Amount, max_paths: usize) -> Amount {
    let base = if remaining.is_positive() {
        remaining
    } else {
        dst_amount
    };
    Amount::new(
        base.value() / Decimal::from(max_paths as u64 + 2),
        *base.issue(),
    )
}

pub(crate) enum LiquidityFailure {
    /// Candidate dropped, search continues.
    Dropped(SettlementStatus),
    /// The snapshot is gone, the whole request fails.
    Fatal,
}

/// Measure one candidate. Success below the keep-threshold counts as a dry
/// path.
pub(crate) fn path_liquidity(
    oracle: &dyn SettlementOracle,
    ledger: &dyn LedgerView,
    src: &AccountId,
    dst: &AccountId,
    dst_amount: &Amount,
    path: &Path,
    min_dst: &Amount,
) -> std::result::Result<(Amount, u64), LiquidityFailure> {
    let outcome = oracle.evaluate(ledger, src, dst, dst_amount, path);
    match outcome.status {
        SettlementStatus::Success => {
            if outcome.delivered.value() >= min_dst.value() {
                Ok((outcome.delivered, outcome.quality))
            } else {
                Err(LiquidityFailure::Dropped(SettlementStatus::PathDry))
            }
        }
        SettlementStatus::Temporary
        | SettlementStatus::PathDry
        | SettlementStatus::NoLiquidity => Err(LiquidityFailure::Dropped(outcome.status)),
        SettlementStatus::Fatal => Err(LiquidityFailure::Fatal),
    }
}

/// Rank every candidate in insertion order, dropping the ones the oracle
/// rejects, and sort the survivors.
#[allow(clippy::too_many_arguments)]
pub(crate) fn rank_paths(
    oracle: &dyn SettlementOracle,
    ledger: &dyn LedgerView,
    src: &AccountId,
    dst: &AccountId,
    dst_amount: &Amount,
    remaining: &Amount,
    paths: &PathSet,
    max_paths: usize,
) -> Result<Vec<PathRank>> {
    let min_dst = keep_threshold(remaining, dst_amount, max_paths);
    let mut ranks = Vec::with_capacity(paths.len());
    for (index, path) in paths.iter().enumerate() {
        match path_liquidity(oracle, ledger, src, dst, dst_amount, path, &min_dst) {
            Ok((liquidity, quality)) => ranks.push(PathRank {
                quality,
                length: path.len(),
                liquidity,
                index,
            }),
            Err(LiquidityFailure::Dropped(status)) => {
                debug!(%path, ?status, "candidate dropped");
            }
            Err(LiquidityFailure::Fatal) => return Err(PathfinderError::SnapshotLost),
        }
    }
    ranks.sort_by(compare_ranks);
    Ok(ranks)
}
