//! Shared fixtures: account/currency shorthands and a scripted oracle.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;

use rust_decimal::Decimal;

use payment_pathfinder::{
    init_path_table, AccountId, Amount, Currency, EngineConfig, Issue, LedgerSnapshot, LedgerView,
    LineCache, LoadMonitor, Path, PathElement, Pathfinder, SettlementOracle, SettlementOutcome,
    SettlementStatus,
};

pub fn acct(n: u8) -> AccountId {
    AccountId::new([n; 20])
}

pub fn usd() -> Currency {
    "USD".parse().unwrap()
}

pub fn eur() -> Currency {
    "EUR".parse().unwrap()
}

pub fn lim() -> Decimal {
    Decimal::from(1_000_000)
}

pub fn hop(account: AccountId) -> PathElement {
    PathElement::Account(account)
}

pub fn book_hop(issue: Issue) -> PathElement {
    PathElement::Book(issue)
}

/// Oracle returning scripted outcomes per exact hop sequence. Anything not
/// scripted reports no liquidity; the empty sequence scripts the default
/// direct path.
#[derive(Default)]
pub struct MockOracle {
    outcomes: HashMap<Vec<PathElement>, (Decimal, u64, SettlementStatus)>,
}

impl MockOracle {
    pub fn new() -> Self {
        MockOracle::default()
    }

    pub fn script(mut self, elements: Vec<PathElement>, delivered: i64, quality: u64) -> Self {
        self.outcomes.insert(
            elements,
            (Decimal::from(delivered), quality, SettlementStatus::Success),
        );
        self
    }

    pub fn script_status(mut self, elements: Vec<PathElement>, status: SettlementStatus) -> Self {
        self.outcomes.insert(elements, (Decimal::ZERO, 0, status));
        self
    }
}

impl SettlementOracle for MockOracle {
    fn evaluate(
        &self,
        _ledger: &dyn LedgerView,
        _src: &AccountId,
        _dst: &AccountId,
        dst_amount: &Amount,
        path: &Path,
    ) -> SettlementOutcome {
        match self.outcomes.get(&path.elements()) {
            Some((delivered, quality, SettlementStatus::Success)) => SettlementOutcome::success(
                Amount::new(*delivered, *dst_amount.issue()),
                *quality,
            ),
            Some((_, _, status)) => {
                SettlementOutcome::failure(*status, Amount::zero(*dst_amount.issue()))
            }
            None => SettlementOutcome::failure(
                SettlementStatus::NoLiquidity,
                Amount::zero(*dst_amount.issue()),
            ),
        }
    }
}

/// A pathfinder over a fresh cache with default config.
pub fn engine(
    ledger: Arc<LedgerSnapshot>,
    oracle: MockOracle,
    src: AccountId,
    dst: AccountId,
    src_currency: Currency,
    dst_amount: Amount,
) -> Pathfinder {
    init_path_table();
    let cache = LineCache::new(ledger);
    let monitor = LoadMonitor::new();
    Pathfinder::new(
        cache,
        Arc::new(oracle),
        &monitor,
        EngineConfig::default(),
        src,
        dst,
        src_currency,
        dst_amount,
    )
    .unwrap()
}
