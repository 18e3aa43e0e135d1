//! Order-book directory: which Issue-to-Issue conversions the ledger offers.

use indexmap::IndexMap;
use petgraph::prelude::NodeIndex;
use petgraph::stable_graph::StableDiGraph;
use petgraph::visit::EdgeRef;

use crate::types::Issue;

/// Directed graph of order books between issues. Nodes are issues, an edge
/// from X to Y means the ledger carries offers converting X into Y.
#[derive(Default)]
pub struct BookDirectory {
    graph: StableDiGraph<Issue, ()>,
    issue_indices: IndexMap<Issue, NodeIndex>,
}

impl BookDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    fn node(&mut self, issue: Issue) -> NodeIndex {
        if let Some(&idx) = self.issue_indices.get(&issue) {
            return idx;
        }
        let idx = self.graph.add_node(issue);
        self.issue_indices.insert(issue, idx);
        idx
    }

    /// Register a book converting `from` into `to`. Self-conversions and
    /// duplicates are ignored.
    pub fn add_book(&mut self, from: Issue, to: Issue) {
        if from == to {
            return;
        }
        let a = self.node(from);
        let b = self.node(to);
        if self.graph.find_edge(a, b).is_none() {
            self.graph.add_edge(a, b, ());
        }
    }

    /// Output issues reachable from `from` through a single book, in
    /// registration order.
    pub fn books_from(&self, from: &Issue) -> Vec<Issue> {
        let Some(&idx) = self.issue_indices.get(from) else {
            return Vec::new();
        };
        // petgraph yields the most recently added edge first
        let mut out: Vec<Issue> = self
            .graph
            .edges(idx)
            .filter_map(|e| self.graph.node_weight(e.target()).copied())
            .collect();
        out.reverse();
        out
    }

    pub fn contains(&self, from: &Issue, to: &Issue) -> bool {
        match (self.issue_indices.get(from), self.issue_indices.get(to)) {
            (Some(&a), Some(&b)) => self.graph.find_edge(a, b).is_some(),
            _ => false,
        }
    }

    pub fn count_from(&self, from: &Issue) -> usize {
        self.issue_indices
            .get(from)
            .map_or(0, |&idx| self.graph.edges(idx).count())
    }
}
