//! The pathfinding engine: template-driven candidate generation plus
//! oracle-backed ranking and best-path selection.

mod expander;
pub mod path;
pub mod ranking;
pub mod settlement;
pub mod templates;

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tracing::debug;

use crate::cache::LineCache;
use crate::config::EngineConfig;
use crate::load::{LoadEvent, LoadMonitor};
use crate::types::{AccountId, Amount, Currency, Issue, PathfinderError, Result};
use expander::{flags_for, PathExpander};
use path::{Path, PathSet};
use ranking::{rank_paths, PathRank};
use settlement::{SettlementOracle, SettlementStatus};
pub use templates::init_path_table;
use templates::{classify, templates_for, NodeType, PathType, MAX_SEARCH_LEVEL};

/// Result of best-path selection: up to `max_paths` primaries, at most one
/// disjoint path able to cover the outstanding amount on its own, and any
/// remaining qualifying paths.
#[derive(Clone, Debug, Default)]
pub struct BestPaths {
    pub paths: PathSet,
    pub full_liquidity: Option<Path>,
    pub extras: PathSet,
}

/// Discovers and ranks payment paths for one request. Created per request,
/// computes once, answers `best_paths` calls, then is dropped.
pub struct Pathfinder {
    cache: Arc<LineCache>,
    oracle: Arc<dyn SettlementOracle>,
    config: EngineConfig,
    src_account: AccountId,
    dst_account: AccountId,
    src_issue: Issue,
    requested_issuer: Option<AccountId>,
    dst_amount: Amount,
    remaining: Amount,
    complete_paths: PathSet,
    complete_index: HashSet<Path>,
    paths_by_type: HashMap<PathType, PathSet>,
    path_ranks: Vec<PathRank>,
    _load: LoadEvent,
}

impl Pathfinder {
    /// Construct a pathfinder using the source's own issue.
    pub fn new(
        cache: Arc<LineCache>,
        oracle: Arc<dyn SettlementOracle>,
        monitor: &LoadMonitor,
        config: EngineConfig,
        src_account: AccountId,
        dst_account: AccountId,
        src_currency: Currency,
        dst_amount: Amount,
    ) -> Result<Self> {
        Self::build(
            cache,
            oracle,
            monitor,
            config,
            src_account,
            dst_account,
            src_currency,
            None,
            dst_amount,
        )
    }

    /// Construct a pathfinder that must draw the source currency from an
    /// explicit issuer.
    #[allow(clippy::too_many_arguments)]
    pub fn with_source_issuer(
        cache: Arc<LineCache>,
        oracle: Arc<dyn SettlementOracle>,
        monitor: &LoadMonitor,
        config: EngineConfig,
        src_account: AccountId,
        dst_account: AccountId,
        src_currency: Currency,
        src_issuer: AccountId,
        dst_amount: Amount,
    ) -> Result<Self> {
        Self::build(
            cache,
            oracle,
            monitor,
            config,
            src_account,
            dst_account,
            src_currency,
            Some(src_issuer),
            dst_amount,
        )
    }

    #[allow(clippy::too_many_arguments)]
    fn build(
        cache: Arc<LineCache>,
        oracle: Arc<dyn SettlementOracle>,
        monitor: &LoadMonitor,
        config: EngineConfig,
        src_account: AccountId,
        dst_account: AccountId,
        src_currency: Currency,
        src_issuer: Option<AccountId>,
        dst_amount: Amount,
    ) -> Result<Self> {
        if !dst_amount.is_positive() {
            return Err(PathfinderError::InvalidRequest(
                "destination amount must be positive".into(),
            ));
        }
        if src_currency.is_native() && src_issuer.is_some() {
            return Err(PathfinderError::InvalidRequest(
                "native source currency cannot name an issuer".into(),
            ));
        }
        let src_issue = if src_currency.is_native() {
            Issue::native()
        } else {
            let issuer = src_issuer
                .or_else(|| {
                    cache
                        .ledger()
                        .default_issuer_for(&src_account, &src_currency)
                })
                .unwrap_or(src_account);
            Issue::issued(src_currency, issuer)
        };
        let remaining = dst_amount.clone();
        Ok(Pathfinder {
            cache,
            oracle,
            config,
            src_account,
            dst_account,
            src_issue,
            requested_issuer: src_issuer,
            dst_amount,
            remaining,
            complete_paths: PathSet::new(),
            complete_index: HashSet::new(),
            paths_by_type: HashMap::new(),
            path_ranks: Vec::new(),
            _load: monitor.track("pathfind"),
        })
    }

    /// Enumerate candidate paths at the given search level. Returns whether
    /// any complete path was found. Calling it again recomputes from scratch
    /// and yields an identical set.
    pub fn find_paths(&mut self, level: u8) -> Result<bool> {
        if level > MAX_SEARCH_LEVEL {
            return Err(PathfinderError::SearchLevelOutOfRange(level));
        }
        let ledger = self.cache.ledger().clone();
        if !ledger.account_exists(&self.dst_account) {
            return Err(PathfinderError::UnknownDestination(self.dst_account));
        }

        self.complete_paths.clear();
        self.complete_index.clear();
        self.paths_by_type.clear();
        self.path_ranks.clear();

        if self.src_account == self.dst_account {
            // a self-payment needs no paths
            return Ok(false);
        }
        if !ledger.account_exists(&self.src_account) {
            debug!(account = %self.src_account, "source account not in ledger");
            return Ok(false);
        }

        let payment_type = classify(&self.src_issue.currency, &self.dst_amount.issue().currency);
        let expander = PathExpander::new(
            self.cache.clone(),
            &self.config,
            self.src_account,
            self.dst_account,
            self.src_issue,
            *self.dst_amount.issue(),
            self.requested_issuer,
        );
        let templates = templates_for(payment_type, level);
        debug!(
            ?payment_type,
            level,
            templates = templates.len(),
            "starting path search"
        );
        for template in templates {
            self.paths_for_type(&expander, template);
        }
        debug!(complete = self.complete_paths.len(), "path search finished");
        Ok(!self.complete_paths.is_empty())
    }

    /// Expand one template, reusing memoized results for shared prefixes.
    /// Complete paths are harvested at every level, so a path finishing
    /// early in a longer template is still collected.
    fn paths_for_type(&mut self, expander: &PathExpander, template: &[NodeType]) -> PathSet {
        if let Some(paths) = self.paths_by_type.get(template) {
            return paths.clone();
        }
        if template.is_empty() {
            self.paths_by_type.insert(Vec::new(), PathSet::new());
            return PathSet::new();
        }

        let parent = &template[..template.len() - 1];
        let parent_paths = self.paths_for_type(expander, parent);

        let node = template[template.len() - 1];
        let mut out = PathSet::new();
        match node {
            NodeType::Source => out.push(Path::empty()),
            _ => expander.add_links(&parent_paths, &mut out, flags_for(node)),
        }

        for path in &out {
            if expander.is_complete(path) && self.complete_index.insert(path.clone()) {
                self.complete_paths.push(path.clone());
            }
        }

        self.paths_by_type.insert(template.to_vec(), out.clone());
        out
    }

    /// Measure the candidates against the settlement oracle and rank them.
    /// The default direct path is evaluated first and its delivery reduces
    /// what the ranked paths still have to cover.
    pub fn compute_ranks(&mut self, max_paths: usize) -> Result<()> {
        let ledger = self.cache.ledger().clone();
        self.remaining = self.dst_amount.clone();

        if self.default_path_viable() {
            let default_outcome = self.oracle.evaluate(
                ledger.as_ref(),
                &self.src_account,
                &self.dst_account,
                &self.dst_amount,
                &Path::empty(),
            );
            match default_outcome.status {
                SettlementStatus::Success => {
                    debug!(delivered = %default_outcome.delivered, "default path liquidity");
                    self.remaining -= &default_outcome.delivered;
                }
                SettlementStatus::Fatal => return Err(PathfinderError::SnapshotLost),
                _ => {}
            }
        }

        self.path_ranks = rank_paths(
            self.oracle.as_ref(),
            ledger.as_ref(),
            &self.src_account,
            &self.dst_account,
            &self.dst_amount,
            &self.remaining,
            &self.complete_paths,
            max_paths,
        )?;
        Ok(())
    }

    /// Direct settlement is worth probing when both ends sit on the
    /// destination issuer's books in the destination currency.
    fn default_path_viable(&self) -> bool {
        let dst_issue = *self.dst_amount.issue();
        if dst_issue.is_native() {
            return self.src_issue.is_native();
        }
        if self.src_issue.currency != dst_issue.currency {
            return false;
        }
        let Some(issuer) = dst_issue.issuer else {
            return false;
        };
        let linked = |account: &AccountId| {
            *account == issuer
                || self.cache.lines(account).iter().any(|line| {
                    line.currency == dst_issue.currency
                        && line.peer == issuer
                        && line.is_usable()
                })
        };
        linked(&self.src_account) && linked(&self.dst_account)
    }

    /// Select up to `max_paths` of the ranked paths, honouring an explicit
    /// source issuer. When the primaries fall short, the first remaining
    /// path able to cover the deficit alone fills the full-liquidity slot.
    pub fn best_paths(&self, max_paths: usize, src_issuer: Option<AccountId>) -> BestPaths {
        let mut best = BestPaths::default();
        let issuer_is_sender = self.src_issue.is_native()
            || src_issuer.is_none()
            || src_issuer == Some(self.src_account);
        let mut remaining = self.remaining.clone();

        for rank in &self.path_ranks {
            let path = &self.complete_paths[rank.index];
            if path.is_empty() {
                continue;
            }
            if !issuer_is_sender && path.first_hop_issuer() != src_issuer {
                debug!(%path, "skipped, first hop conflicts with requested issuer");
                continue;
            }
            if remaining.is_positive() && best.paths.len() < max_paths {
                remaining -= &rank.liquidity;
                best.paths.push(path.clone());
            } else if remaining.is_positive()
                && rank.liquidity.value() >= remaining.value()
                && best.full_liquidity.is_none()
            {
                best.full_liquidity = Some(path.clone());
            } else {
                best.extras.push(path.clone());
            }
        }
        best
    }

    pub fn complete_paths(&self) -> &PathSet {
        &self.complete_paths
    }

    pub fn ranks(&self) -> &[PathRank] {
        &self.path_ranks
    }
}
