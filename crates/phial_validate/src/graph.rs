//! Directed reference graphs and cycle reachability.

use indexmap::IndexMap;
use std::collections::HashSet;

/// A directed graph over string keys, built up from reference lists.
///
/// Used for the parameter graph and the combined service + tag graph. The
/// check of interest is not bare cycle membership: every key that can
/// *reach* a cycle is reported, since resolving it would recurse forever.
#[derive(Clone, Debug, Default)]
pub struct ReferenceGraph {
    edges: IndexMap<String, Vec<String>>,
}

impl ReferenceGraph {
    /// Creates an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends references from `key` to each entry of `references`.
    pub fn add_references<I, S>(&mut self, key: &str, references: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.edges
            .entry(key.to_string())
            .or_default()
            .extend(references.into_iter().map(Into::into));
    }

    /// The keys that have outgoing references, in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.edges.keys().map(String::as_str)
    }

    /// Returns `true` if no references were recorded.
    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    /// Computes every node that lies on or can reach a cycle.
    ///
    /// Works by repeatedly discarding nodes with no remaining outgoing
    /// edges; whatever survives necessarily walks into a cycle.
    pub fn nodes_reaching_cycles(&self) -> HashSet<String> {
        // out-degree per node and reverse adjacency, over all mentioned nodes
        let mut out_degree: IndexMap<&str, usize> = IndexMap::new();
        let mut incoming: IndexMap<&str, Vec<&str>> = IndexMap::new();

        for (node, targets) in &self.edges {
            out_degree.entry(node).or_insert(0);
            for target in targets {
                *out_degree.entry(node).or_insert(0) += 1;
                out_degree.entry(target).or_insert(0);
                incoming.entry(target).or_default().push(node);
            }
        }

        let mut queue: Vec<&str> = out_degree
            .iter()
            .filter(|(_, degree)| **degree == 0)
            .map(|(node, _)| *node)
            .collect();
        let mut remaining: HashSet<&str> = out_degree.keys().copied().collect();

        while let Some(node) = queue.pop() {
            remaining.remove(node);
            for &predecessor in incoming.get(node).into_iter().flatten() {
                if let Some(degree) = out_degree.get_mut(predecessor) {
                    *degree -= 1;
                    if *degree == 0 {
                        queue.push(predecessor);
                    }
                }
            }
        }

        remaining.into_iter().map(str::to_string).collect()
    }
}
