//! Lazy bounded-depth breadth-first traversal behind the port.
//!
//! Depth and visited-set bookkeeping lives here, not in the reasoning
//! algorithms: components consume a finite stream of (node, path-so-far)
//! steps and never recurse over the graph themselves. The walk is iterative
//! (explicit frontier queue), so adversarial or malformed graphs cannot
//! overflow the stack.

use std::collections::{HashSet, VecDeque};

use crate::error::GraphError;
use crate::graph::port::GraphPort;
use crate::graph::{Direction, Edge, Node, RelationType};

/// Configuration for a traversal.
#[derive(Debug, Clone)]
pub struct TraversalOptions {
    /// Maximum hop depth from the start node.
    pub max_depth: usize,
    /// Only follow edges with these relation types (`None` = follow all).
    pub relations: Option<Vec<RelationType>>,
    /// Edge direction to follow (symmetric types traverse both ways
    /// regardless, per the port contract).
    pub direction: Direction,
    /// Edges below this trust score are not traversed.
    pub min_trust: f64,
}

impl Default for TraversalOptions {
    fn default() -> Self {
        Self {
            max_depth: 3,
            relations: None,
            direction: Direction::Outgoing,
            min_trust: 0.0,
        }
    }
}

/// One step of a traversal: a discovered node and the edges that led to it.
#[derive(Debug, Clone)]
pub struct TraversalStep {
    /// The discovered node.
    pub node: Node,
    /// Edges from the start node to this node, in order. Empty for the
    /// start node itself.
    pub path: Vec<Edge>,
    /// Hop count from the start node.
    pub depth: usize,
}

/// Lazy BFS traversal over a [`GraphPort`].
///
/// Yields the start node first (depth 0, empty path), then each newly
/// discovered node exactly once in breadth-first order. Port failures are
/// yielded as errors and end the traversal.
pub struct Traversal<'a> {
    port: &'a dyn GraphPort,
    opts: TraversalOptions,
    queue: VecDeque<(String, Vec<Edge>, usize)>,
    visited: HashSet<String>,
    failed: bool,
}

impl<'a> Traversal<'a> {
    /// Begin a traversal from `start`.
    pub fn new(port: &'a dyn GraphPort, start: &str, opts: TraversalOptions) -> Self {
        let mut queue = VecDeque::new();
        let mut visited = HashSet::new();
        visited.insert(start.to_string());
        queue.push_back((start.to_string(), Vec::new(), 0));
        Self {
            port,
            opts,
            queue,
            visited,
            failed: false,
        }
    }
}

impl Iterator for Traversal<'_> {
    type Item = Result<TraversalStep, GraphError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }

        let (id, path, depth) = self.queue.pop_front()?;

        let node = match self.port.get_node(&id) {
            Ok(node) => node,
            Err(err) => {
                self.failed = true;
                return Some(Err(err));
            }
        };

        if depth < self.opts.max_depth {
            let edges = match self.port.edges(
                &id,
                self.opts.relations.as_deref(),
                self.opts.direction,
            ) {
                Ok(edges) => edges,
                Err(err) => {
                    self.failed = true;
                    return Some(Err(err));
                }
            };

            for edge in edges {
                if edge.trust < self.opts.min_trust {
                    continue;
                }
                let Some(next) = edge.other_end(&id) else {
                    continue;
                };
                if self.visited.insert(next.to_string()) {
                    let mut next_path = path.clone();
                    let next = next.to_string();
                    next_path.push(edge);
                    self.queue.push_back((next, next_path, depth + 1));
                }
            }
        }

        Some(Ok(TraversalStep { node, path, depth }))
    }
}
