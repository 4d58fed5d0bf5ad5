//! The reference/dependency graph over named schemas.

use indexmap::{IndexMap, IndexSet};

/// One node per named schema.
#[derive(Debug, Clone, Default)]
pub struct GraphNode {
    pub contains_oneof: bool,
    /// Ordered variant type names, populated when `contains_oneof`.
    pub variants_of: Vec<String>,
    /// Outgoing `owner -> target` edges (internal `$ref`s reached while
    /// walking properties, array items, and inline objects).
    pub edges: IndexSet<String>,
}

/// Directed graph over schema names. May contain cycles.
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    pub nodes: IndexMap<String, GraphNode>,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ensure_node(&mut self, name: &str) -> &mut GraphNode {
        self.nodes.entry(name.to_string()).or_default()
    }

    pub fn add_edge(&mut self, from: &str, to: &str) {
        self.ensure_node(from).edges.insert(to.to_string());
    }

    pub fn mark_oneof(&mut self, owner: &str, variants: Vec<String>) {
        let node = self.ensure_node(owner);
        node.contains_oneof = true;
        node.variants_of = variants;
    }
}
