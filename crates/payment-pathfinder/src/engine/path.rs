//! Path and path-element model. Partial paths share their prefixes, so a
//! one-hop extension is O(1) and expansion never copies whole sequences.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use itertools::Itertools;
use serde::de::SeqAccess;
use serde::ser::SerializeSeq;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::types::{AccountId, Issue};

/// A single hop: either an account transfer in the running currency, or an
/// order-book crossing into a new issue.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PathElement {
    Account(AccountId),
    Book(Issue),
}

impl fmt::Display for PathElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathElement::Account(account) => write!(f, "{account}"),
            PathElement::Book(issue) => write!(f, "[{issue}]"),
        }
    }
}

struct Node {
    elem: PathElement,
    prev: Option<Arc<Node>>,
}

/// An ordered hop sequence, rooted at the request's source. The empty path
/// is the source anchor alone. Pushing returns a new path whose prefix is
/// shared with the original.
#[derive(Clone, Default)]
pub struct Path {
    head: Option<Arc<Node>>,
    len: usize,
}

impl Path {
    pub fn empty() -> Self {
        Path::default()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Extend by one hop, sharing this path as the prefix.
    pub fn push(&self, elem: PathElement) -> Path {
        Path {
            head: Some(Arc::new(Node {
                elem,
                prev: self.head.clone(),
            })),
            len: self.len + 1,
        }
    }

    /// Hops in reverse order, last first.
    pub fn iter_rev(&self) -> impl Iterator<Item = &PathElement> {
        let mut node = self.head.as_deref();
        std::iter::from_fn(move || {
            let current = node?;
            node = current.prev.as_deref();
            Some(&current.elem)
        })
    }

    pub fn last(&self) -> Option<&PathElement> {
        self.head.as_deref().map(|node| &node.elem)
    }

    /// Hops in forward order.
    pub fn elements(&self) -> Vec<PathElement> {
        let mut out: Vec<PathElement> = self.iter_rev().copied().collect();
        out.reverse();
        out
    }

    /// Whether `account` already appears on the path, either as an account
    /// hop or as the issuer landed on after a book crossing.
    pub fn contains_account(&self, account: &AccountId) -> bool {
        self.iter_rev().any(|elem| match elem {
            PathElement::Account(a) => a == account,
            PathElement::Book(issue) => issue.issuer.as_ref() == Some(account),
        })
    }

    pub fn contains_book(&self, issue: &Issue) -> bool {
        self.iter_rev()
            .any(|elem| matches!(elem, PathElement::Book(b) if b == issue))
    }

    /// The issuer of the first hop, used to honour an explicit source-issuer
    /// request when selecting best paths.
    pub fn first_hop_issuer(&self) -> Option<AccountId> {
        match self.elements().first() {
            Some(PathElement::Account(a)) => Some(*a),
            Some(PathElement::Book(issue)) => issue.issuer,
            None => None,
        }
    }
}

impl PartialEq for Path {
    fn eq(&self, other: &Self) -> bool {
        self.len == other.len && self.iter_rev().eq(other.iter_rev())
    }
}

impl Eq for Path {}

impl Hash for Path {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.len.hash(state);
        for elem in self.iter_rev() {
            elem.hash(state);
        }
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return write!(f, "(direct)");
        }
        write!(f, "{}", self.elements().iter().map(|e| e.to_string()).join(" -> "))
    }
}

impl fmt::Debug for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Path({self})")
    }
}

impl Serialize for Path {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let elements = self.elements();
        let mut seq = serializer.serialize_seq(Some(elements.len()))?;
        for elem in &elements {
            seq.serialize_element(elem)?;
        }
        seq.end()
    }
}

impl<'de> Deserialize<'de> for Path {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct PathVisitor;

        impl<'de> serde::de::Visitor<'de> for PathVisitor {
            type Value = Path;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a sequence of path elements")
            }

            fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Path, A::Error> {
                let mut path = Path::empty();
                while let Some(elem) = seq.next_element::<PathElement>()? {
                    path = path.push(elem);
                }
                Ok(path)
            }
        }

        deserializer.deserialize_seq(PathVisitor)
    }
}

/// A collection of paths in insertion order.
pub type PathSet = Vec<Path>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Currency;

    fn acct(n: u8) -> AccountId {
        AccountId::new([n; 20])
    }

    fn book(code: &str, issuer: u8) -> PathElement {
        PathElement::Book(Issue::issued(code.parse().unwrap(), acct(issuer)))
    }

    #[test]
    fn push_shares_prefix() {
        let base = Path::empty().push(PathElement::Account(acct(1)));
        let left = base.push(PathElement::Account(acct(2)));
        let right = base.push(PathElement::Account(acct(3)));

        assert_eq!(left.len(), 2);
        assert_eq!(right.len(), 2);
        // both extensions still see the shared first hop
        assert_eq!(left.elements()[0], PathElement::Account(acct(1)));
        assert_eq!(right.elements()[0], PathElement::Account(acct(1)));
        assert_ne!(left, right);
    }

    #[test]
    fn elements_are_forward_ordered() {
        let path = Path::empty()
            .push(PathElement::Account(acct(1)))
            .push(book("USD", 2))
            .push(PathElement::Account(acct(3)));
        assert_eq!(
            path.elements(),
            vec![
                PathElement::Account(acct(1)),
                book("USD", 2),
                PathElement::Account(acct(3)),
            ]
        );
    }

    #[test]
    fn contains_account_sees_book_issuers() {
        let path = Path::empty().push(book("USD", 2));
        assert!(path.contains_account(&acct(2)));
        assert!(!path.contains_account(&acct(3)));
        assert!(path.contains_book(&Issue::issued("USD".parse().unwrap(), acct(2))));
    }

    #[test]
    fn equality_and_hash_follow_elements() {
        use std::collections::HashSet;

        let a = Path::empty().push(PathElement::Account(acct(1)));
        let b = Path::empty().push(PathElement::Account(acct(1)));
        let c = Path::empty().push(PathElement::Account(acct(2)));
        assert_eq!(a, b);
        assert_ne!(a, c);

        let mut set = HashSet::new();
        assert!(set.insert(a));
        assert!(!set.insert(b));
        assert!(set.insert(c));
    }

    #[test]
    fn native_currency_display() {
        let path = Path::empty().push(PathElement::Book(Issue::native()));
        assert_eq!(path.to_string(), format!("[{}]", Currency::native()));
        assert_eq!(Path::empty().to_string(), "(direct)");
    }

    #[test]
    fn first_hop_issuer() {
        let via_account = Path::empty().push(PathElement::Account(acct(4)));
        assert_eq!(via_account.first_hop_issuer(), Some(acct(4)));
        let via_book = Path::empty().push(book("EUR", 5));
        assert_eq!(via_book.first_hop_issuer(), Some(acct(5)));
        assert_eq!(Path::empty().first_hop_issuer(), None);
    }
}
