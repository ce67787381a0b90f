//! # tekhne
//!
//! A trust-aware reasoning engine over technology knowledge graphs.
//!
//! tekhne answers structured questions about a technology landscape —
//! "what depends on X", "what can replace Y", "how are A and B related" —
//! by reasoning over a graph of typed, trust-scored relationships.
//!
//! ## Architecture
//!
//! - **Graph access** (`graph`): data model, the [`graph::port::GraphPort`]
//!   read abstraction, and a reference in-memory implementation
//! - **Trust aggregation** (`trust`): signal combination and threshold filtering
//! - **Dependency resolution** (`resolve`): install-order chains with cycle detection
//! - **Path finding** (`pathfind`): ranked, explained paths between nodes
//! - **Relation inference** (`infer`): composing known edges into probable relations
//! - **Recommendations** (`recommend`): similar / alternative / complement rankings
//!
//! ## Library usage
//!
//! ```
//! use tekhne::engine::Engine;
//! use tekhne::config::EngineConfig;
//! use tekhne::graph::memory::MemoryGraph;
//! use tekhne::graph::{Edge, Node, RelationType};
//! use std::sync::Arc;
//!
//! let graph = MemoryGraph::new();
//! graph.insert_node(Node::new("tokio", "Tokio").with_category("runtime")).unwrap();
//! graph.insert_node(Node::new("axum", "Axum").with_category("framework")).unwrap();
//! graph
//!     .insert_edge(Edge::new("axum", RelationType::DependsOn, "tokio").with_trust(0.95))
//!     .unwrap();
//!
//! let engine = Engine::new(Arc::new(graph), EngineConfig::default()).unwrap();
//! let chain = engine.resolve_dependencies("axum", Default::default()).unwrap();
//! assert_eq!(chain.nodes[0].node.id, "tokio");
//! ```

pub mod budget;
pub mod cache;
pub mod config;
pub mod engine;
pub mod error;
pub mod graph;
pub mod infer;
pub mod pathfind;
pub mod provenance;
pub mod recommend;
pub mod resolve;
pub mod trust;
