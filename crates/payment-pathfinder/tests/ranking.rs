//! Ranking and best-path selection against a scripted settlement oracle.

mod common;

use std::sync::Arc;

use payment_pathfinder::{
    init_path_table, Amount, EngineConfig, Issue, LedgerBuilder, LedgerSnapshot, LineCache,
    LoadMonitor, PathfinderError, Pathfinder, SettlementStatus,
};
use rust_decimal::Decimal;

use common::*;

/// src trusts three gateways, each of which the destination trusts too.
fn fan_ledger() -> Arc<LedgerSnapshot> {
    let (src, dst) = (acct(1), acct(9));
    LedgerBuilder::new(1)
        .trust_line(src, acct(11), usd(), lim(), lim())
        .trust_line(src, acct(12), usd(), lim(), lim())
        .trust_line(src, acct(13), usd(), lim(), lim())
        .trust_line(acct(11), dst, usd(), lim(), lim())
        .trust_line(acct(12), dst, usd(), lim(), lim())
        .trust_line(acct(13), dst, usd(), lim(), lim())
        .build()
}

fn fan_engine(oracle: MockOracle, dst_value: i64) -> Pathfinder {
    let dst_amount = Amount::new(Decimal::from(dst_value), Issue::issued(usd(), acct(9)));
    engine(fan_ledger(), oracle, acct(1), acct(9), usd(), dst_amount)
}

fn via(gateway: u8) -> Vec<payment_pathfinder::PathElement> {
    vec![hop(acct(gateway)), hop(acct(9))]
}

#[test]
fn ranks_order_by_quality() {
    let oracle = MockOracle::new()
        .script(via(11), 100, 40)
        .script(via(12), 100, 90)
        .script(via(13), 100, 60);
    let mut finder = fan_engine(oracle, 100);
    finder.find_paths(7).unwrap();
    finder.compute_ranks(4).unwrap();

    let qualities: Vec<u64> = finder.ranks().iter().map(|r| r.quality).collect();
    assert_eq!(qualities, vec![90, 60, 40]);

    let best = finder.best_paths(4, None);
    assert_eq!(best.paths[0].elements(), via(12));
}

#[test]
fn candidates_below_keep_threshold_are_dropped() {
    // threshold is 100 / (4 + 2)
    let oracle = MockOracle::new()
        .script(via(11), 10, 99)
        .script(via(12), 60, 50);
    let mut finder = fan_engine(oracle, 100);
    finder.find_paths(7).unwrap();
    finder.compute_ranks(4).unwrap();

    assert_eq!(finder.ranks().len(), 1);
    assert_eq!(finder.ranks()[0].quality, 50);
}

#[test]
fn oracle_failures_drop_candidates_but_not_the_request() {
    let oracle = MockOracle::new()
        .script_status(via(11), SettlementStatus::Temporary)
        .script_status(via(12), SettlementStatus::PathDry)
        .script(via(13), 100, 30);
    let mut finder = fan_engine(oracle, 100);
    finder.find_paths(7).unwrap();
    finder.compute_ranks(4).unwrap();

    assert_eq!(finder.ranks().len(), 1);
    let best = finder.best_paths(4, None);
    assert_eq!(best.paths.len(), 1);
    assert_eq!(best.paths[0].elements(), via(13));
}

#[test]
fn fatal_oracle_failure_aborts_ranking() {
    let oracle = MockOracle::new()
        .script(via(11), 100, 90)
        .script_status(via(12), SettlementStatus::Fatal);
    let mut finder = fan_engine(oracle, 100);
    finder.find_paths(7).unwrap();

    assert!(matches!(
        finder.compute_ranks(4),
        Err(PathfinderError::SnapshotLost)
    ));
}

#[test]
fn default_path_liquidity_reduces_what_paths_must_cover() {
    // src also holds the destination's own line, so direct settlement is
    // probed first and delivers 80 of 100
    let (src, dst) = (acct(1), acct(9));
    let ledger = LedgerBuilder::new(1)
        .trust_line(src, acct(11), usd(), lim(), lim())
        .trust_line(src, acct(12), usd(), lim(), lim())
        .trust_line(acct(11), dst, usd(), lim(), lim())
        .trust_line(acct(12), dst, usd(), lim(), lim())
        .trust_line(src, dst, usd(), lim(), lim())
        .build();
    let dst_amount = Amount::new(Decimal::from(100), Issue::issued(usd(), dst));
    let oracle = MockOracle::new()
        .script(vec![], 80, 95)
        .script(via(11), 20, 90)
        .script(via(12), 50, 50);
    let mut finder = engine(ledger, oracle, src, dst, usd(), dst_amount);
    finder.find_paths(7).unwrap();
    finder.compute_ranks(4).unwrap();

    let best = finder.best_paths(4, None);
    // the first path covers the remaining 20, the second is surplus
    assert_eq!(best.paths.len(), 1);
    assert_eq!(best.paths[0].elements(), via(11));
    assert!(best.full_liquidity.is_none());
    assert_eq!(best.extras.len(), 1);
}

#[test]
fn two_paths_together_cover_an_oversized_request() {
    let oracle = MockOracle::new()
        .script(via(11), 60, 90)
        .script(via(12), 60, 80);
    let mut finder = fan_engine(oracle, 100);
    finder.find_paths(7).unwrap();
    finder.compute_ranks(2).unwrap();

    let best = finder.best_paths(2, None);
    assert_eq!(best.paths.len(), 2);
    assert_eq!(best.paths[0].elements(), via(11));
    assert_eq!(best.paths[1].elements(), via(12));
    assert!(best.full_liquidity.is_none());
    assert!(best.extras.is_empty());
}

#[test]
fn full_liquidity_slot_is_filled_and_disjoint() {
    let oracle = MockOracle::new()
        .script(via(11), 50, 100)
        .script(via(12), 100, 90)
        .script(via(13), 35, 80);
    let mut finder = fan_engine(oracle, 100);
    finder.find_paths(7).unwrap();
    finder.compute_ranks(1).unwrap();

    let best = finder.best_paths(1, None);
    assert_eq!(best.paths.len(), 1);
    assert_eq!(best.paths[0].elements(), via(11));

    // one remaining path can cover the 50 deficit alone and is not repeated
    // in the primary list
    let full = best.full_liquidity.expect("full liquidity path");
    assert_eq!(full.elements(), via(12));
    assert!(!best.paths.contains(&full));
    assert_eq!(best.extras.len(), 1);
    assert_eq!(best.extras[0].elements(), via(13));
}

#[test]
fn best_paths_respects_the_cap() {
    let oracle = MockOracle::new()
        .script(via(11), 60, 90)
        .script(via(12), 60, 80)
        .script(via(13), 55, 70);
    let mut finder = fan_engine(oracle, 200);
    finder.find_paths(7).unwrap();
    finder.compute_ranks(2).unwrap();

    let best = finder.best_paths(2, None);
    assert_eq!(best.paths.len(), 2);
    // the leftover cannot cover the 80 deficit, so it stays an extra
    assert!(best.full_liquidity.is_none());
    assert_eq!(best.extras.len(), 1);
}

#[test]
fn requested_source_issuer_filters_first_hops() {
    let (src, i1, i2, dst) = (acct(1), acct(11), acct(12), acct(9));
    let ledger = LedgerBuilder::new(1)
        .trust_line(src, i1, usd(), lim(), lim())
        .trust_line(src, i2, usd(), lim(), lim())
        .trust_line(i1, dst, usd(), lim(), lim())
        .trust_line(i2, dst, usd(), lim(), lim())
        .build();
    let dst_amount = Amount::new(Decimal::from(100), Issue::issued(usd(), dst));
    let oracle = MockOracle::new()
        .script(vec![hop(i1), hop(dst)], 100, 50)
        .script(vec![hop(i2), hop(dst)], 100, 90);

    init_path_table();
    let cache = LineCache::new(ledger);
    let monitor = LoadMonitor::new();
    let mut finder = Pathfinder::with_source_issuer(
        cache,
        Arc::new(oracle),
        &monitor,
        EngineConfig::default(),
        src,
        dst,
        usd(),
        i1,
        dst_amount,
    )
    .unwrap();
    finder.find_paths(7).unwrap();
    finder.compute_ranks(4).unwrap();

    // the higher-quality path starts at the wrong issuer and is skipped
    let best = finder.best_paths(4, Some(i1));
    assert_eq!(best.paths.len(), 1);
    assert_eq!(best.paths[0].elements(), vec![hop(i1), hop(dst)]);
    assert!(best.extras.is_empty());
}

#[test]
fn shared_cache_serves_later_requests_from_memory() {
    let ledger = fan_ledger();
    init_path_table();
    let cache = LineCache::new(ledger);
    let monitor = LoadMonitor::new();
    let dst_amount = Amount::new(Decimal::from(100), Issue::issued(usd(), acct(9)));

    let mut first = Pathfinder::new(
        cache.clone(),
        Arc::new(MockOracle::new()),
        &monitor,
        EngineConfig::default(),
        acct(1),
        acct(9),
        usd(),
        dst_amount.clone(),
    )
    .unwrap();
    first.find_paths(7).unwrap();
    let misses_after_first = cache.metrics().line_misses;
    drop(first);

    let mut second = Pathfinder::new(
        cache.clone(),
        Arc::new(MockOracle::new()),
        &monitor,
        EngineConfig::default(),
        acct(1),
        acct(9),
        usd(),
        dst_amount,
    )
    .unwrap();
    second.find_paths(7).unwrap();

    // same snapshot, same accounts: nothing new to materialize
    assert_eq!(cache.metrics().line_misses, misses_after_first);
    assert_eq!(monitor.active(), 1);
    assert_eq!(monitor.completed(), 1);
}

#[test]
fn invalid_requests_are_rejected_at_construction() {
    let ledger = fan_ledger();
    let cache = LineCache::new(ledger);
    let monitor = LoadMonitor::new();

    let zero = Amount::zero(Issue::issued(usd(), acct(9)));
    assert!(matches!(
        Pathfinder::new(
            cache.clone(),
            Arc::new(MockOracle::new()),
            &monitor,
            EngineConfig::default(),
            acct(1),
            acct(9),
            usd(),
            zero,
        ),
        Err(PathfinderError::InvalidRequest(_))
    ));

    let amount = Amount::new(Decimal::from(10), Issue::native());
    assert!(matches!(
        Pathfinder::with_source_issuer(
            cache,
            Arc::new(MockOracle::new()),
            &monitor,
            EngineConfig::default(),
            acct(1),
            acct(9),
            payment_pathfinder::Currency::native(),
            acct(11),
            amount,
        ),
        Err(PathfinderError::InvalidRequest(_))
    ));
}
