//! Expansion templates. Each payment type carries a fixed, costed list of
//! hop-role sequences; the search level selects how many of them run.

use std::collections::HashMap;

use once_cell::sync::Lazy;

use crate::types::Currency;

pub const MAX_SEARCH_LEVEL: u8 = 10;

/// Role of one hop inside a template.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum NodeType {
    /// The source anchor, always first.
    Source,
    /// Expand through trust lines of the running currency.
    Accounts,
    /// Expand through order books with non-native output.
    Books,
    /// Expand through a book whose output is the native currency.
    NativeBook,
    /// Expand through a book landing on the destination issue.
    DestBook,
    /// The destination account, always last.
    Destination,
}

/// An ordered list of node roles, driven front to back by the generator.
pub type PathType = Vec<NodeType>;

/// Shape of a payment request, from the source and destination currencies.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PaymentType {
    NativeToNative,
    NativeToIssued,
    IssuedToNative,
    IssuedToSame,
    IssuedToCross,
}

struct CostedPath {
    cost: u8,
    nodes: PathType,
}

fn template(cost: u8, mnemonic: &str) -> CostedPath {
    let nodes = mnemonic
        .bytes()
        .map(|b| match b {
            b's' => NodeType::Source,
            b'a' => NodeType::Accounts,
            b'b' => NodeType::Books,
            b'n' => NodeType::NativeBook,
            b'f' => NodeType::DestBook,
            b'd' => NodeType::Destination,
            other => panic!("unknown node mnemonic: {}", other as char),
        })
        .collect();
    CostedPath { cost, nodes }
}

// Direct transfers are handled by the default path, never by a template, so
// the native-to-native list stays empty and no template encodes source to
// destination alone.
static PATH_TABLE: Lazy<HashMap<PaymentType, Vec<CostedPath>>> = Lazy::new(|| {
    let mut table = HashMap::new();
    table.insert(PaymentType::NativeToNative, Vec::new());
    table.insert(
        PaymentType::NativeToIssued,
        vec![
            template(1, "sfd"),
            template(3, "sfad"),
            template(5, "sfaad"),
            template(6, "sbfd"),
            template(8, "sbafd"),
            template(9, "sbfad"),
            template(10, "sbafad"),
        ],
    );
    table.insert(
        PaymentType::IssuedToNative,
        vec![
            template(1, "snd"),
            template(2, "sand"),
            template(6, "saand"),
            template(7, "sbnd"),
            template(8, "sabnd"),
            template(9, "saband"),
        ],
    );
    table.insert(
        PaymentType::IssuedToSame,
        vec![
            template(1, "sad"),
            template(1, "sfd"),
            template(4, "safd"),
            template(4, "sfad"),
            template(5, "saad"),
            template(5, "sbfd"),
            template(6, "snfad"),
            template(6, "safad"),
            template(6, "sanfd"),
            template(6, "sanfad"),
            template(6, "sabfd"),
            template(7, "saaad"),
        ],
    );
    table.insert(
        PaymentType::IssuedToCross,
        vec![
            template(1, "sfad"),
            template(1, "safd"),
            template(3, "safad"),
            template(4, "snfd"),
            template(5, "sanfd"),
            template(5, "snfad"),
            template(5, "sbfd"),
            template(6, "sanfad"),
            template(6, "sabfd"),
            template(7, "saafd"),
            template(8, "saafad"),
            template(9, "safaad"),
        ],
    );
    table
});

/// Force the one-time construction of the template table. Call at process
/// start; later lookups are lock-free reads.
pub fn init_path_table() {
    Lazy::force(&PATH_TABLE);
}

/// Classify a request from its source and destination currencies.
pub fn classify(src: &Currency, dst: &Currency) -> PaymentType {
    match (src.is_native(), dst.is_native()) {
        (true, true) => PaymentType::NativeToNative,
        (true, false) => PaymentType::NativeToIssued,
        (false, true) => PaymentType::IssuedToNative,
        (false, false) if src == dst => PaymentType::IssuedToSame,
        (false, false) => PaymentType::IssuedToCross,
    }
}

/// Templates to run for a payment type at the given search level, cheapest
/// first. Higher levels always return a superset.
pub fn templates_for(payment_type: PaymentType, level: u8) -> Vec<&'static PathType> {
    PATH_TABLE
        .get(&payment_type)
        .map(|paths| {
            paths
                .iter()
                .filter(|p| p.cost <= level)
                .map(|p| &p.nodes)
                .collect()
        })
        .unwrap_or_default()
}
