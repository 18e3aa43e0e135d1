//! Per-snapshot memoization of trust-line lookups and fan-out scores.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};

use crate::ledger::{LedgerView, TrustLine};
use crate::types::{AccountId, Currency, Issue};

/// Bonus applied to a cell with a direct line to the payment destination.
const DESTINATION_LINE_BONUS: usize = 10_000;

/// Snapshot of cache hit/miss counters.
#[derive(Debug)]
pub struct CacheMetrics {
    pub line_hits: usize,
    pub line_misses: usize,
    pub score_hits: usize,
    pub score_misses: usize,
}

/// Shared memoization of per-account trust-line enumeration over one ledger
/// snapshot. Entries are installed once and never invalidated; the snapshot
/// is frozen for the cache's lifetime.
pub struct LineCache {
    ledger: Arc<dyn LedgerView>,
    lines: RwLock<HashMap<AccountId, Arc<Vec<TrustLine>>>>,
    scores: RwLock<HashMap<(Issue, AccountId, bool), usize>>,
    line_hits: AtomicUsize,
    line_misses: AtomicUsize,
    score_hits: AtomicUsize,
    score_misses: AtomicUsize,
}

impl LineCache {
    pub fn new(ledger: Arc<dyn LedgerView>) -> Arc<Self> {
        Arc::new(LineCache {
            ledger,
            lines: RwLock::new(HashMap::new()),
            scores: RwLock::new(HashMap::new()),
            line_hits: AtomicUsize::new(0),
            line_misses: AtomicUsize::new(0),
            score_hits: AtomicUsize::new(0),
            score_misses: AtomicUsize::new(0),
        })
    }

    pub fn ledger(&self) -> &Arc<dyn LedgerView> {
        &self.ledger
    }

    /// Outgoing trust lines of `account`. The first lookup runs a single
    /// ledger query; later lookups return the same shared vector.
    pub fn lines(&self, account: &AccountId) -> Arc<Vec<TrustLine>> {
        if let Some(lines) = self.lines.read().unwrap().get(account) {
            self.line_hits.fetch_add(1, Ordering::Relaxed);
            return lines.clone();
        }
        self.line_misses.fetch_add(1, Ordering::Relaxed);

        // Re-check under the write lock so racing readers serialize and
        // exactly one performs the ledger query.
        let mut map = self.lines.write().unwrap();
        if let Some(lines) = map.get(account) {
            return lines.clone();
        }
        let fetched = Arc::new(self.ledger.trust_lines_out(account));
        map.insert(*account, fetched.clone());
        fetched
    }

    /// Budgeted fan-out score for the (currency, account) cell: how many
    /// useful outgoing hops leave it. Opaque to callers; the expander only
    /// compares scores.
    pub fn paths_out(
        &self,
        currency: &Currency,
        account: &AccountId,
        is_dest_currency: bool,
        dest: &AccountId,
    ) -> usize {
        let cell = Issue::issued(*currency, *account);
        let key = (cell, *dest, is_dest_currency);
        if let Some(&score) = self.scores.read().unwrap().get(&key) {
            self.score_hits.fetch_add(1, Ordering::Relaxed);
            return score;
        }
        self.score_misses.fetch_add(1, Ordering::Relaxed);

        let mut score = self.ledger.book_count_from(&cell);
        for line in self.lines(account).iter() {
            if line.currency != *currency || !line.is_usable() {
                continue;
            }
            if is_dest_currency && line.peer == *dest {
                score += DESTINATION_LINE_BONUS;
            } else if line.peer_no_ripple {
                // peer refuses pass-through, not a useful hop out
            } else {
                score += 1;
            }
        }

        let mut map = self.scores.write().unwrap();
        *map.entry(key).or_insert(score)
    }

    pub fn metrics(&self) -> CacheMetrics {
        CacheMetrics {
            line_hits: self.line_hits.load(Ordering::Relaxed),
            line_misses: self.line_misses.load(Ordering::Relaxed),
            score_hits: self.score_hits.load(Ordering::Relaxed),
            score_misses: self.score_misses.load(Ordering::Relaxed),
        }
    }
}
