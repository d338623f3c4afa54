//! Normalization of dependency graphs before layout.

use std::collections::HashMap;

use tracing::warn;

use crate::data::{DependencyGraph, GraphEdge, GraphNode};

/// Why an edge was left out of the layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    UnknownSource,
    UnknownTarget,
}

impl DropReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            DropReason::UnknownSource => "unknown source",
            DropReason::UnknownTarget => "unknown target",
        }
    }
}

/// An edge that did not make it into the validated graph.
#[derive(Debug, Clone, PartialEq)]
pub struct DroppedEdge {
    pub edge: GraphEdge,
    pub reason: DropReason,
}

/// Link between two validated nodes, by index.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Link {
    pub source: usize,
    pub target: usize,
    pub call_count: u64,
}

/// A graph whose edges all reference existing nodes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidatedGraph {
    pub nodes: Vec<GraphNode>,
    pub links: Vec<Link>,
    pub dropped: Vec<DroppedEdge>,
    index: HashMap<String, usize>,
}

impl ValidatedGraph {
    /// Index of the node with `id`.
    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.index.get(id).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Largest call count among the kept links, 0 without links.
    pub fn max_call_count(&self) -> u64 {
        self.links.iter().map(|l| l.call_count).max().unwrap_or(0)
    }

    /// Number of links touching each node.
    pub fn degrees(&self) -> Vec<usize> {
        let mut degrees = vec![0; self.nodes.len()];
        for link in &self.links {
            degrees[link.source] += 1;
            degrees[link.target] += 1;
        }
        degrees
    }
}

/// Resolve edges against node ids.
///
/// Duplicate node ids keep their first occurrence. Edges with an unknown
/// endpoint are dropped and logged. Self loops are kept.
pub fn validate(graph: &DependencyGraph) -> ValidatedGraph {
    let mut nodes = Vec::with_capacity(graph.nodes.len());
    let mut index = HashMap::with_capacity(graph.nodes.len());
    for node in &graph.nodes {
        if index.contains_key(&node.id) {
            warn!(node = %node.id, "duplicate node id in dependency graph");
            continue;
        }
        index.insert(node.id.clone(), nodes.len());
        nodes.push(node.clone());
    }

    let mut links = Vec::with_capacity(graph.edges.len());
    let mut dropped = Vec::new();
    for edge in &graph.edges {
        let resolved = match (index.get(&edge.source), index.get(&edge.target)) {
            (None, _) => Err(DropReason::UnknownSource),
            (_, None) => Err(DropReason::UnknownTarget),
            (Some(&source), Some(&target)) => Ok(Link {
                source,
                target,
                call_count: edge.call_count,
            }),
        };
        match resolved {
            Ok(link) => links.push(link),
            Err(reason) => {
                warn!(
                    source = %edge.source,
                    target = %edge.target,
                    reason = reason.as_str(),
                    "dropping dependency edge"
                );
                dropped.push(DroppedEdge {
                    edge: edge.clone(),
                    reason,
                });
            }
        }
    }

    ValidatedGraph {
        nodes,
        links,
        dropped,
        index,
    }
}
