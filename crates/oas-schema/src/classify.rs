//! Transitive-closure classification into `StructSet` / `ProtoSet`.

use indexmap::{IndexMap, IndexSet};
use std::collections::VecDeque;

use crate::graph::DependencyGraph;

/// Where a schema's generated code ends up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Location {
    Proto,
    StructCode,
}

#[derive(Debug, Clone)]
pub struct TypeMapEntry {
    pub location: Location,
    pub reason: String,
}

/// The result of classifying every node in a [`DependencyGraph`].
#[derive(Debug, Clone, Default)]
pub struct Classification {
    pub struct_set: IndexSet<String>,
    pub proto_set: IndexSet<String>,
    pub reasons: IndexMap<String, String>,
}

impl Classification {
    pub fn type_map(&self) -> IndexMap<String, TypeMapEntry> {
        let mut map = IndexMap::new();
        for name in &self.struct_set {
            map.insert(
                name.clone(),
                TypeMapEntry {
                    location: Location::StructCode,
                    reason: self.reasons.get(name).cloned().unwrap_or_default(),
                },
            );
        }
        for name in &self.proto_set {
            map.insert(
                name.clone(),
                TypeMapEntry {
                    location: Location::Proto,
                    reason: String::new(),
                },
            );
        }
        map
    }
}

/// Partition every node in `graph` into `StructSet` (contains a
/// discriminated union, is a variant of one, or transitively references
/// the `StructSet`) and `ProtoSet` (everything else).
pub fn classify(graph: &DependencyGraph) -> Classification {
    let mut struct_set = IndexSet::new();
    let mut reasons = IndexMap::new();

    // Seed: schemas that directly contain a oneOf.
    for (name, node) in &graph.nodes {
        if node.contains_oneof {
            struct_set.insert(name.clone());
            reasons.insert(name.clone(), "contains oneOf".to_string());
        }
    }

    // Seed: every variant of a union.
    for (owner, node) in &graph.nodes {
        if !node.contains_oneof {
            continue;
        }
        for variant in &node.variants_of {
            if struct_set.insert(variant.clone()) {
                reasons.insert(
                    variant.clone(),
                    format!("variant of union type {owner}"),
                );
            }
        }
    }

    // Reverse-edge BFS: whatever references a StructSet member joins it too.
    let mut reverse_edges: IndexMap<String, Vec<String>> = IndexMap::new();
    for (from, node) in &graph.nodes {
        for to in &node.edges {
            reverse_edges
                .entry(to.clone())
                .or_default()
                .push(from.clone());
        }
    }

    let mut queue: VecDeque<String> = struct_set.iter().cloned().collect();
    let mut visited: IndexSet<String> = struct_set.iter().cloned().collect();

    while let Some(to) = queue.pop_front() {
        let Some(referrers) = reverse_edges.get(&to) else {
            continue;
        };
        for from in referrers {
            if visited.insert(from.clone()) {
                struct_set.insert(from.clone());
                reasons
                    .entry(from.clone())
                    .or_insert_with(|| format!("references union type {to}"));
                queue.push_back(from.clone());
            }
        }
    }

    let proto_set: IndexSet<String> = graph
        .nodes
        .keys()
        .filter(|name| !struct_set.contains(*name))
        .cloned()
        .collect();

    Classification {
        struct_set,
        proto_set,
        reasons,
    }
}
