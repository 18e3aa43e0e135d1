//! Read-only accessors over a frozen ledger snapshot.

pub mod books;

use std::collections::HashMap;
use std::sync::Arc;

use indexmap::IndexMap;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::{AccountId, Currency, Issue};
use books::BookDirectory;

/// A directed credit relationship as seen from its owning account.
///
/// `no_ripple` is the owning account's flag on its side of the line,
/// `peer_no_ripple` the flag set by the peer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrustLine {
    pub peer: AccountId,
    pub currency: Currency,
    pub limit: Decimal,
    pub peer_limit: Decimal,
    pub no_ripple: bool,
    pub peer_no_ripple: bool,
}

impl TrustLine {
    /// A line with no credit on either side cannot carry value.
    pub fn is_usable(&self) -> bool {
        self.limit > Decimal::ZERO || self.peer_limit > Decimal::ZERO
    }
}

/// Pure accessors over one ledger snapshot. All methods are safe to call
/// concurrently; the snapshot never changes underneath them.
pub trait LedgerView: Send + Sync {
    fn sequence(&self) -> u64;

    fn account_exists(&self, account: &AccountId) -> bool;

    /// The issuer assumed when a payment names an account and a currency but
    /// no issuer. Defaults to the account itself.
    fn default_issuer_for(&self, account: &AccountId, currency: &Currency) -> Option<AccountId>;

    /// Outgoing trust lines of `account`, in ledger directory order.
    fn trust_lines_out(&self, account: &AccountId) -> Vec<TrustLine>;

    /// Output issues reachable from `issue` through a single order book.
    fn books_from(&self, issue: &Issue) -> Vec<Issue>;

    fn book_exists(&self, from: &Issue, to: &Issue) -> bool;

    fn book_count_from(&self, issue: &Issue) -> usize;
}

#[derive(Default)]
struct AccountEntry {
    lines: Vec<TrustLine>,
    default_issuers: HashMap<Currency, AccountId>,
}

/// In-memory ledger snapshot, built once and then immutable.
pub struct LedgerSnapshot {
    sequence: u64,
    accounts: IndexMap<AccountId, AccountEntry>,
    books: BookDirectory,
}

impl LedgerView for LedgerSnapshot {
    fn sequence(&self) -> u64 {
        self.sequence
    }

    fn account_exists(&self, account: &AccountId) -> bool {
        self.accounts.contains_key(account)
    }

    fn default_issuer_for(&self, account: &AccountId, currency: &Currency) -> Option<AccountId> {
        let entry = self.accounts.get(account)?;
        Some(
            entry
                .default_issuers
                .get(currency)
                .copied()
                .unwrap_or(*account),
        )
    }

    fn trust_lines_out(&self, account: &AccountId) -> Vec<TrustLine> {
        self.accounts
            .get(account)
            .map(|entry| entry.lines.clone())
            .unwrap_or_default()
    }

    fn books_from(&self, issue: &Issue) -> Vec<Issue> {
        self.books.books_from(issue)
    }

    fn book_exists(&self, from: &Issue, to: &Issue) -> bool {
        self.books.contains(from, to)
    }

    fn book_count_from(&self, issue: &Issue) -> usize {
        self.books.count_from(issue)
    }
}

/// Builder for [`LedgerSnapshot`] fixtures and bootstraps.
pub struct LedgerBuilder {
    sequence: u64,
    accounts: IndexMap<AccountId, AccountEntry>,
    books: BookDirectory,
}

impl LedgerBuilder {
    pub fn new(sequence: u64) -> Self {
        LedgerBuilder {
            sequence,
            accounts: IndexMap::new(),
            books: BookDirectory::new(),
        }
    }

    fn entry(&mut self, account: AccountId) -> &mut AccountEntry {
        self.accounts.entry(account).or_default()
    }

    pub fn account(mut self, account: AccountId) -> Self {
        self.entry(account);
        self
    }

    /// Install a trust line between `a` and `b` with no no-ripple flags.
    /// `limit_a` is the credit `a` extends toward `b` and vice versa.
    pub fn trust_line(
        self,
        a: AccountId,
        b: AccountId,
        currency: Currency,
        limit_a: Decimal,
        limit_b: Decimal,
    ) -> Self {
        self.trust_line_flagged(a, b, currency, limit_a, limit_b, false, false)
    }

    /// Install a trust line carrying per-endpoint no-ripple flags. The
    /// mirrored record lands on both accounts.
    #[allow(clippy::too_many_arguments)]
    pub fn trust_line_flagged(
        mut self,
        a: AccountId,
        b: AccountId,
        currency: Currency,
        limit_a: Decimal,
        limit_b: Decimal,
        no_ripple_a: bool,
        no_ripple_b: bool,
    ) -> Self {
        self.entry(a).lines.push(TrustLine {
            peer: b,
            currency,
            limit: limit_a,
            peer_limit: limit_b,
            no_ripple: no_ripple_a,
            peer_no_ripple: no_ripple_b,
        });
        self.entry(b).lines.push(TrustLine {
            peer: a,
            currency,
            limit: limit_b,
            peer_limit: limit_a,
            no_ripple: no_ripple_b,
            peer_no_ripple: no_ripple_a,
        });
        self
    }

    pub fn default_issuer(
        mut self,
        account: AccountId,
        currency: Currency,
        issuer: AccountId,
    ) -> Self {
        self.entry(account).default_issuers.insert(currency, issuer);
        self
    }

    pub fn book(mut self, from: Issue, to: Issue) -> Self {
        self.books.add_book(from, to);
        self
    }

    pub fn build(self) -> Arc<LedgerSnapshot> {
        Arc::new(LedgerSnapshot {
            sequence: self.sequence,
            accounts: self.accounts,
            books: self.books,
        })
    }
}
