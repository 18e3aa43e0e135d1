//! One-hop path expansion: given a partial path and a flag set, emit every
//! permissible extension through trust lines or order books.

use std::sync::Arc;

use tracing::trace;

use crate::cache::LineCache;
use crate::config::EngineConfig;
use crate::engine::path::{Path, PathElement, PathSet};
use crate::engine::templates::NodeType;
use crate::types::{AccountId, Issue};

/// Emit account-to-account hops through trust lines.
pub const ADD_ACCOUNTS: u32 = 0x001;
/// Emit hops through order books.
pub const ADD_BOOKS: u32 = 0x002;
/// Restrict book output to the native currency.
pub const OB_NATIVE: u32 = 0x010;
/// The next book must land on the destination issue.
pub const OB_LAST: u32 = 0x040;
/// The next account hop must land on the destination account.
pub const AC_LAST: u32 = 0x080;

/// Sorts a destination candidate ahead of every scored one.
const TOP_PRIORITY: usize = usize::MAX;

/// Flag set driving expansion for one template node.
pub fn flags_for(node: NodeType) -> u32 {
    match node {
        NodeType::Source => 0,
        NodeType::Accounts => ADD_ACCOUNTS,
        NodeType::Books => ADD_BOOKS,
        NodeType::NativeBook => ADD_BOOKS | OB_NATIVE,
        NodeType::DestBook => ADD_BOOKS | OB_LAST,
        NodeType::Destination => ADD_ACCOUNTS | AC_LAST,
    }
}

/// Where a partial path currently stands: the account holding the value (if
/// any) and the issue it is denominated in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EndState {
    pub account: Option<AccountId>,
    pub issue: Issue,
}

pub struct PathExpander {
    cache: Arc<LineCache>,
    src_account: AccountId,
    dst_account: AccountId,
    src_issue: Issue,
    dst_issue: Issue,
    requested_issuer: Option<AccountId>,
    fan_out: usize,
    source_fan_out: usize,
    strict_no_ripple: bool,
}

impl PathExpander {
    pub fn new(
        cache: Arc<LineCache>,
        config: &EngineConfig,
        src_account: AccountId,
        dst_account: AccountId,
        src_issue: Issue,
        dst_issue: Issue,
        requested_issuer: Option<AccountId>,
    ) -> Self {
        PathExpander {
            cache,
            src_account,
            dst_account,
            src_issue,
            dst_issue,
            requested_issuer,
            fan_out: config.fan_out,
            source_fan_out: config.source_fan_out,
            strict_no_ripple: config.strict_no_ripple,
        }
    }

    /// Account and issue at the end of `path`. An account hop keeps the
    /// running currency and makes the hop target the issuer; a book hop
    /// switches to the book's output issue and lands on its issuer.
    pub fn end_state(&self, path: &Path) -> EndState {
        match path.last() {
            None => EndState {
                account: Some(self.src_account),
                issue: self.src_issue,
            },
            Some(PathElement::Account(account)) => {
                let currency = path
                    .iter_rev()
                    .find_map(|elem| match elem {
                        PathElement::Book(issue) => Some(issue.currency),
                        PathElement::Account(_) => None,
                    })
                    .unwrap_or(self.src_issue.currency);
                let issue = if currency.is_native() {
                    Issue::native()
                } else {
                    Issue::issued(currency, *account)
                };
                EndState {
                    account: Some(*account),
                    issue,
                }
            }
            Some(PathElement::Book(issue)) => EndState {
                account: issue.issuer,
                issue: *issue,
            },
        }
    }

    /// A path is complete once it hands the destination account value in the
    /// destination currency.
    pub fn is_complete(&self, path: &Path) -> bool {
        if path.is_empty() {
            return false;
        }
        let end = self.end_state(path);
        end.account == Some(self.dst_account) && end.issue.currency == self.dst_issue.currency
    }

    pub fn add_links(&self, current: &PathSet, incomplete: &mut PathSet, flags: u32) {
        for path in current {
            self.add_link(path, incomplete, flags);
        }
    }

    /// Push every permissible one-hop extension of `path` onto `incomplete`.
    pub fn add_link(&self, path: &Path, incomplete: &mut PathSet, flags: u32) {
        // a path that already reached the destination is done; extending it
        // could never return there
        if self.is_complete(path) {
            return;
        }
        let end = self.end_state(path);
        if flags & ADD_ACCOUNTS != 0 {
            self.add_account_links(path, &end, incomplete, flags);
        }
        if flags & ADD_BOOKS != 0 {
            self.add_book_links(path, &end, incomplete, flags);
        }
    }

    fn add_account_links(&self, path: &Path, end: &EndState, out: &mut PathSet, flags: u32) {
        if end.issue.is_native() {
            // on the native ledger there are no trust lines; the only hop
            // left is delivery to a native destination
            if self.dst_issue.is_native() && !path.is_empty() {
                out.push(path.push(PathElement::Account(self.dst_account)));
            }
            return;
        }
        let Some(end_account) = end.account else {
            return;
        };
        if !self.cache.ledger().account_exists(&end_account) {
            trace!(account = %end_account, "dead end, account not in ledger");
            return;
        }

        let dest_only = flags & AC_LAST != 0;
        let currency = end.issue.currency;
        let is_dst_currency = currency == self.dst_issue.currency;
        let pass_through = matches!(path.last(), Some(PathElement::Account(_)));
        let entered_flagged = pass_through && self.is_no_ripple_out(path);

        let mut candidates: Vec<(usize, AccountId)> = Vec::new();
        for line in self.cache.lines(&end_account).iter() {
            if line.currency != currency || !line.is_usable() {
                continue;
            }
            let peer = line.peer;
            if pass_through && self.blocks_pass_through(entered_flagged, line.no_ripple) {
                continue;
            }
            if peer == self.src_account {
                // looping back to the source never helps
                continue;
            }
            if peer == self.dst_account {
                // the destination is always worth trying, even when it was
                // crossed earlier in another currency: a hop in the
                // destination currency finishes the path (one-hop direct
                // delivery stays with the default path), any other currency
                // queues it ahead of every scored candidate so a book
                // anchored at the destination can finish later
                if is_dst_currency {
                    if !path.is_empty() {
                        out.push(path.push(PathElement::Account(peer)));
                    }
                } else if !dest_only {
                    candidates.push((TOP_PRIORITY, peer));
                }
                continue;
            }
            if peer == end_account || path.contains_account(&peer) {
                continue;
            }
            if dest_only {
                continue;
            }
            let score = self
                .cache
                .paths_out(&currency, &peer, is_dst_currency, &self.dst_account);
            if score > 0 {
                candidates.push((score, peer));
            }
        }

        // stable sort keeps trust-line enumeration order among equal scores
        candidates.sort_by(|a, b| b.0.cmp(&a.0));
        let cap = if end_account == self.src_account {
            self.source_fan_out
        } else {
            self.fan_out
        };
        for (_, peer) in candidates.into_iter().take(cap) {
            out.push(path.push(PathElement::Account(peer)));
        }
    }

    fn add_book_links(&self, path: &Path, end: &EndState, out: &mut PathSet, flags: u32) {
        let dest_only = flags & OB_LAST != 0;
        let native_only = flags & OB_NATIVE != 0;

        for issue_out in self.cache.ledger().books_from(&end.issue) {
            if native_only && !issue_out.is_native() {
                continue;
            }
            // a plain book node covers issued outputs; the native output has
            // its own node role
            if !native_only && !dest_only && issue_out.is_native() {
                continue;
            }
            if dest_only && issue_out != self.dst_issue {
                continue;
            }
            if self.issue_matches_origin(&issue_out) {
                continue;
            }
            if path.contains_book(&issue_out) {
                continue;
            }
            if let Some(issuer) = issue_out.issuer {
                if issuer != self.dst_account
                    && (path.contains_account(&issuer) || Some(issuer) == end.account)
                {
                    continue;
                }
            }
            out.push(path.push(PathElement::Book(issue_out)));
        }
    }

    /// Converting back into the source's own issue only builds loops.
    fn issue_matches_origin(&self, issue: &Issue) -> bool {
        if issue.is_native() != self.src_issue.is_native() {
            return false;
        }
        if issue.is_native() {
            return true;
        }
        issue.currency == self.src_issue.currency
            && (issue.issuer == Some(self.src_account) || issue.issuer == self.requested_issuer)
    }

    /// Pass-through admissibility under the no-ripple rule. Strict mode
    /// blocks when the intermediary flagged either side; the historical
    /// variant requires both.
    fn blocks_pass_through(&self, entered_flagged: bool, leaving_flagged: bool) -> bool {
        if self.strict_no_ripple {
            entered_flagged || leaving_flagged
        } else {
            entered_flagged && leaving_flagged
        }
    }

    /// Whether the path's final account set no-ripple on the link it was
    /// entered through.
    fn is_no_ripple_out(&self, path: &Path) -> bool {
        let mut hops = path.iter_rev();
        let Some(PathElement::Account(to)) = hops.next() else {
            return false;
        };
        let from = match hops.next() {
            Some(PathElement::Account(account)) => *account,
            Some(PathElement::Book(issue)) => match issue.issuer {
                Some(issuer) => issuer,
                None => return false,
            },
            None => self.src_account,
        };
        let end = self.end_state(path);
        self.is_no_ripple(&from, to, &end.issue)
    }

    /// The flag `to` set on its side of the line from `from`, in the given
    /// currency.
    fn is_no_ripple(&self, from: &AccountId, to: &AccountId, issue: &Issue) -> bool {
        self.cache
            .lines(from)
            .iter()
            .find(|line| line.peer == *to && line.currency == issue.currency)
            .map(|line| line.peer_no_ripple)
            .unwrap_or(false)
    }
}
