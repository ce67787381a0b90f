//! Reference in-memory graph: petgraph structure with a DashMap id index.
//!
//! Serves as the [`GraphPort`] implementation for the CLI, tests, and
//! embedded use. Upholds the data-model invariants at insert time: edges
//! must reference existing nodes and trust scores are clamped.

use std::collections::BTreeMap;
use std::sync::RwLock;

use dashmap::DashMap;
use petgraph::Direction as PgDirection;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use serde::{Deserialize, Serialize};

use crate::error::GraphError;
use crate::graph::port::{GraphPort, PortResult};
use crate::graph::{Direction, Edge, GraphStats, Node, RelationType};

/// Edge payload stored on petgraph edges.
#[derive(Debug, Clone)]
struct EdgeRecord {
    relation: RelationType,
    trust: f64,
    weight: f64,
}

/// A serializable whole-graph snapshot, as produced by ingestion.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GraphSnapshot {
    #[serde(default)]
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub edges: Vec<Edge>,
}

/// In-memory knowledge graph backed by petgraph with an id index.
pub struct MemoryGraph {
    /// The directed graph: node weights are ids, edges carry EdgeRecord.
    graph: RwLock<DiGraph<String, EdgeRecord>>,
    /// id -> NodeIndex for O(1) lookups.
    index: DashMap<String, NodeIndex>,
    /// id -> node attributes.
    nodes: DashMap<String, Node>,
}

impl MemoryGraph {
    /// Create an empty graph.
    pub fn new() -> Self {
        Self {
            graph: RwLock::new(DiGraph::new()),
            index: DashMap::new(),
            nodes: DashMap::new(),
        }
    }

    /// Build a graph from a snapshot, validating every edge.
    pub fn from_snapshot(snapshot: GraphSnapshot) -> PortResult<Self> {
        let g = Self::new();
        for node in snapshot.nodes {
            g.insert_node(node)?;
        }
        for edge in snapshot.edges {
            g.insert_edge(edge)?;
        }
        Ok(g)
    }

    /// Parse a JSON snapshot (`{"nodes": [...], "edges": [...]}`).
    pub fn from_json(json: &str) -> PortResult<Self> {
        let snapshot: GraphSnapshot =
            serde_json::from_str(json).map_err(|e| GraphError::StoreUnavailable {
                message: format!("invalid graph snapshot: {e}"),
            })?;
        Self::from_snapshot(snapshot)
    }

    /// Insert or update a node. The id is the identity; attributes of an
    /// existing node are replaced.
    pub fn insert_node(&self, mut node: Node) -> PortResult<()> {
        node.trust = node.trust.clamp(0.0, 1.0);
        if !self.index.contains_key(&node.id) {
            let mut graph = self.graph.write().expect("graph lock poisoned");
            // Double-check after acquiring the write lock.
            if !self.index.contains_key(&node.id) {
                let idx = graph.add_node(node.id.clone());
                self.index.insert(node.id.clone(), idx);
            }
        }
        self.nodes.insert(node.id.clone(), node);
        Ok(())
    }

    /// Insert an edge. Both endpoints must already exist.
    pub fn insert_edge(&self, edge: Edge) -> PortResult<()> {
        let (src, dst) = match (self.index.get(&edge.source), self.index.get(&edge.target)) {
            (Some(s), Some(d)) => (*s.value(), *d.value()),
            _ => {
                return Err(GraphError::DanglingEdge {
                    from: edge.source,
                    to: edge.target,
                });
            }
        };
        let record = EdgeRecord {
            relation: edge.relation,
            trust: edge.trust.clamp(0.0, 1.0),
            weight: edge.weight,
        };
        let mut graph = self.graph.write().expect("graph lock poisoned");
        graph.add_edge(src, dst, record);
        Ok(())
    }

    /// Number of nodes.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of stored edges.
    pub fn edge_count(&self) -> usize {
        self.graph.read().expect("graph lock poisoned").edge_count()
    }

    fn relation_matches(relations: Option<&[RelationType]>, rel: RelationType) -> bool {
        relations.is_none_or(|set| set.contains(&rel))
    }
}

impl Default for MemoryGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl GraphPort for MemoryGraph {
    fn get_node(&self, id: &str) -> PortResult<Node> {
        self.nodes
            .get(id)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| GraphError::NotFound { id: id.to_string() })
    }

    fn edges(
        &self,
        id: &str,
        relations: Option<&[RelationType]>,
        direction: Direction,
    ) -> PortResult<Vec<Edge>> {
        let idx = match self.index.get(id) {
            Some(idx) => *idx.value(),
            None => return Err(GraphError::NotFound { id: id.to_string() }),
        };
        let graph = self.graph.read().expect("graph lock poisoned");

        let mut out: Vec<Edge> = Vec::new();
        let mut push = |edge_ref: petgraph::graph::EdgeReference<'_, EdgeRecord>| {
            let record = edge_ref.weight();
            let source = graph[edge_ref.source()].clone();
            let target = graph[edge_ref.target()].clone();
            out.push(Edge {
                source,
                relation: record.relation,
                target,
                trust: record.trust,
                weight: record.weight,
            });
        };

        // Stored edges leaving / entering the node; symmetric relation
        // types are direction-transparent per the port contract.
        for edge_ref in graph.edges_directed(idx, PgDirection::Outgoing) {
            let rel = edge_ref.weight().relation;
            if !Self::relation_matches(relations, rel) {
                continue;
            }
            let wanted = match direction {
                Direction::Outgoing | Direction::Both => true,
                Direction::Incoming => rel.is_symmetric(),
            };
            if wanted {
                push(edge_ref);
            }
        }
        for edge_ref in graph.edges_directed(idx, PgDirection::Incoming) {
            if edge_ref.source() == edge_ref.target() {
                continue; // self-loop already seen as outgoing
            }
            let rel = edge_ref.weight().relation;
            if !Self::relation_matches(relations, rel) {
                continue;
            }
            let wanted = match direction {
                Direction::Incoming | Direction::Both => true,
                Direction::Outgoing => rel.is_symmetric(),
            };
            if wanted {
                push(edge_ref);
            }
        }

        // Deterministic order for reproducible downstream tie-breaks.
        out.sort_by(|a, b| {
            (a.relation, &a.source, &a.target)
                .cmp(&(b.relation, &b.source, &b.target))
                .then(a.trust.partial_cmp(&b.trust).unwrap_or(std::cmp::Ordering::Equal))
        });
        Ok(out)
    }

    fn stats(&self) -> PortResult<GraphStats> {
        let node_count = self.nodes.len();
        let edge_count = self.edge_count();
        let mut trust_sum = 0.0;
        let mut categories: BTreeMap<String, usize> = BTreeMap::new();
        for entry in self.nodes.iter() {
            let node = entry.value();
            trust_sum += node.trust;
            if !node.category.is_empty() {
                *categories.entry(node.category.clone()).or_default() += 1;
            }
        }
        let average_trust = if node_count == 0 {
            0.0
        } else {
            trust_sum / node_count as f64
        };
        Ok(GraphStats {
            node_count,
            edge_count,
            average_trust,
            categories: categories.into_iter().collect(),
        })
    }
}

impl std::fmt::Debug for MemoryGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryGraph")
            .field("nodes", &self.node_count())
            .field("edges", &self.edge_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn graph_with(nodes: &[&str], edges: &[(&str, RelationType, &str, f64)]) -> MemoryGraph {
        let g = MemoryGraph::new();
        for id in nodes {
            g.insert_node(Node::new(*id, id.to_uppercase())).unwrap();
        }
        for (s, rel, t, trust) in edges {
            g.insert_edge(Edge::new(*s, *rel, *t).with_trust(*trust)).unwrap();
        }
        g
    }

    #[test]
    fn insert_and_get() {
        let g = MemoryGraph::new();
        g.insert_node(Node::new("redis", "Redis").with_category("database"))
            .unwrap();
        let node = g.get_node("redis").unwrap();
        assert_eq!(node.name, "Redis");
        assert!(matches!(
            g.get_node("postgres"),
            Err(GraphError::NotFound { .. })
        ));
    }

    #[test]
    fn dangling_edge_rejected() {
        let g = MemoryGraph::new();
        g.insert_node(Node::new("a", "A")).unwrap();
        let err = g
            .insert_edge(Edge::new("a", RelationType::DependsOn, "ghost"))
            .unwrap_err();
        assert!(matches!(err, GraphError::DanglingEdge { .. }));
    }

    #[test]
    fn directed_edges_respect_direction() {
        let g = graph_with(
            &["a", "b"],
            &[("a", RelationType::DependsOn, "b", 0.8)],
        );
        assert_eq!(g.edges("a", None, Direction::Outgoing).unwrap().len(), 1);
        assert_eq!(g.edges("a", None, Direction::Incoming).unwrap().len(), 0);
        assert_eq!(g.edges("b", None, Direction::Incoming).unwrap().len(), 1);
        assert_eq!(g.edges("b", None, Direction::Outgoing).unwrap().len(), 0);
    }

    #[test]
    fn symmetric_edges_visible_from_both_ends() {
        let g = graph_with(
            &["a", "b"],
            &[("a", RelationType::AlternativeTo, "b", 0.8)],
        );
        // Visible as outgoing from both endpoints, once each.
        assert_eq!(g.edges("a", None, Direction::Outgoing).unwrap().len(), 1);
        assert_eq!(g.edges("b", None, Direction::Outgoing).unwrap().len(), 1);
        assert_eq!(g.edges("b", None, Direction::Both).unwrap().len(), 1);
    }

    #[test]
    fn relation_filter() {
        let g = graph_with(
            &["a", "b", "c"],
            &[
                ("a", RelationType::DependsOn, "b", 0.8),
                ("a", RelationType::IntegratesWith, "c", 0.8),
            ],
        );
        let deps = g
            .edges("a", Some(&[RelationType::DependsOn]), Direction::Outgoing)
            .unwrap();
        assert_eq!(deps.len(), 1);
        assert_eq!(deps[0].target, "b");
    }

    #[test]
    fn snapshot_round_trip() {
        let snapshot: GraphSnapshot = serde_json::from_str(
            r#"{
                "nodes": [
                    {"id": "a", "name": "A", "category": "db", "trust": 0.9},
                    {"id": "b", "name": "B"}
                ],
                "edges": [
                    {"source": "a", "relation": "DEPENDS_ON", "target": "b", "trust": 0.7}
                ]
            }"#,
        )
        .unwrap();
        let g = MemoryGraph::from_snapshot(snapshot).unwrap();
        assert_eq!(g.node_count(), 2);
        assert_eq!(g.edge_count(), 1);
    }

    #[test]
    fn stats_aggregates() {
        let g = MemoryGraph::new();
        g.insert_node(Node::new("a", "A").with_category("db").with_trust(1.0))
            .unwrap();
        g.insert_node(Node::new("b", "B").with_category("db").with_trust(0.5))
            .unwrap();
        g.insert_node(Node::new("c", "C").with_trust(0.0)).unwrap();
        let stats = g.stats().unwrap();
        assert_eq!(stats.node_count, 3);
        assert!((stats.average_trust - 0.5).abs() < 1e-9);
        assert_eq!(stats.categories, vec![("db".to_string(), 2)]);
    }
}
