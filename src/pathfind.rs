//! Ranked path search between two nodes across mixed relation types.
//!
//! Bounded-depth breadth-first search over simple paths. For small hop
//! bounds the search runs from the source only; at larger bounds it runs
//! bidirectionally — expanding half-depth frontiers from both ends and
//! joining them where they meet — which bounds work to roughly the square
//! root of the unidirectional frontier on dense graphs.
//!
//! A path's aggregate trust is the **minimum** edge trust along it: a chain
//! of different facts is only as trustworthy as its weakest link. (Contrast
//! with [`crate::trust::combine_signals`], which max-combines multiple
//! claims about the *same* fact.)

use std::collections::{HashMap, HashSet, VecDeque};

use serde::{Deserialize, Serialize};

use crate::budget::Budget;
use crate::error::TekhneError;
use crate::graph::port::GraphPort;
use crate::graph::{Direction, Edge, Node, RelationType};

/// One hop of a path: the edge taken and the node arrived at.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathStep {
    pub edge: Edge,
    pub node: Node,
}

/// An explained path from `source` to `target`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Path {
    pub source: String,
    pub target: String,
    pub steps: Vec<PathStep>,
    /// Minimum edge trust along the path; 1.0 for the zero-length path.
    pub trust: f64,
    /// Sum of edge weights.
    pub weight: f64,
}

impl Path {
    /// Number of hops.
    pub fn hops(&self) -> usize {
        self.steps.len()
    }

    /// Node id sequence including both endpoints.
    pub fn node_ids(&self) -> Vec<&str> {
        let mut ids = vec![self.source.as_str()];
        ids.extend(self.steps.iter().map(|s| s.node.id.as_str()));
        ids
    }
}

/// Options for a path search. Unset bounds fall back to the engine
/// configuration.
#[derive(Debug, Clone, Default)]
pub struct PathOptions {
    pub max_hops: Option<usize>,
    pub relations: Option<Vec<RelationType>>,
    pub min_trust: Option<f64>,
    pub max_paths: Option<usize>,
}

/// Find paths from `source` to `target`, ranked by (trust desc, hops asc).
///
/// An empty result means the nodes are unconnected within `max_hops` —
/// a valid answer, not an error.
#[allow(clippy::too_many_arguments)]
pub fn find_paths(
    port: &dyn GraphPort,
    source: &str,
    target: &str,
    max_hops: usize,
    relations: Option<&[RelationType]>,
    min_trust: f64,
    max_paths: usize,
    bidirectional_from: usize,
    budget: &mut Budget,
) -> Result<Vec<Path>, TekhneError> {
    // Both endpoints must exist; an absent node is NotFound, never an
    // empty graph.
    port.get_node(source)?;
    port.get_node(target)?;

    if source == target {
        return Ok(vec![Path {
            source: source.to_string(),
            target: target.to_string(),
            steps: Vec::new(),
            trust: 1.0,
            weight: 0.0,
        }]);
    }

    tracing::debug!(source, target, max_hops, "finding paths");

    let edge_lists = if max_hops >= bidirectional_from {
        bidirectional(port, source, target, max_hops, relations, min_trust, budget)?
    } else {
        unidirectional(port, source, target, max_hops, relations, min_trust, budget)?
    };

    // Rank before materializing nodes so only the returned paths cost
    // node fetches.
    let mut ranked: Vec<(Vec<String>, Vec<Edge>, f64)> = edge_lists
        .into_iter()
        .map(|edges| {
            let ids = node_sequence(source, &edges);
            let trust = edges.iter().map(|e| e.trust).fold(f64::INFINITY, f64::min);
            (ids, edges, trust)
        })
        .collect();
    ranked.sort_by(|a, b| {
        b.2.partial_cmp(&a.2)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.1.len().cmp(&b.1.len()))
            .then_with(|| a.0.cmp(&b.0))
    });
    ranked.truncate(max_paths);

    let mut paths = Vec::with_capacity(ranked.len());
    for (ids, edges, trust) in ranked {
        let weight = edges.iter().map(|e| e.weight).sum();
        let mut steps = Vec::with_capacity(edges.len());
        for (edge, id) in edges.into_iter().zip(ids.into_iter().skip(1)) {
            let node = port.get_node(&id)?;
            steps.push(PathStep { edge, node });
        }
        paths.push(Path {
            source: source.to_string(),
            target: target.to_string(),
            steps,
            trust,
            weight,
        });
    }
    Ok(paths)
}

/// Node id sequence of an edge list starting at `source`.
fn node_sequence(source: &str, edges: &[Edge]) -> Vec<String> {
    let mut ids = vec![source.to_string()];
    let mut current = source.to_string();
    for edge in edges {
        let next = edge
            .other_end(&current)
            .expect("edge list is a connected walk")
            .to_string();
        ids.push(next.clone());
        current = next;
    }
    ids
}

/// BFS over simple paths from the source only.
fn unidirectional(
    port: &dyn GraphPort,
    source: &str,
    target: &str,
    max_hops: usize,
    relations: Option<&[RelationType]>,
    min_trust: f64,
    budget: &mut Budget,
) -> Result<Vec<Vec<Edge>>, TekhneError> {
    let mut found: Vec<Vec<Edge>> = Vec::new();
    // Queue entries: (current node, edges so far, nodes on the path).
    let mut queue: VecDeque<(String, Vec<Edge>, HashSet<String>)> = VecDeque::new();
    queue.push_back((
        source.to_string(),
        Vec::new(),
        HashSet::from([source.to_string()]),
    ));

    while let Some((current, edges_so_far, on_path)) = queue.pop_front() {
        if edges_so_far.len() >= max_hops {
            continue;
        }
        budget.charge()?;
        for edge in port.edges(&current, relations, Direction::Outgoing)? {
            if edge.trust < min_trust {
                continue;
            }
            let Some(next) = edge.other_end(&current).map(str::to_string) else {
                continue;
            };
            if on_path.contains(&next) {
                continue;
            }
            let mut edges = edges_so_far.clone();
            edges.push(edge);
            if next == target {
                found.push(edges);
                continue;
            }
            let mut on_path = on_path.clone();
            on_path.insert(next.clone());
            queue.push_back((next, edges, on_path));
        }
    }
    Ok(found)
}

/// Meet-in-the-middle search: half-depth frontiers from both endpoints.
fn bidirectional(
    port: &dyn GraphPort,
    source: &str,
    target: &str,
    max_hops: usize,
    relations: Option<&[RelationType]>,
    min_trust: f64,
    budget: &mut Budget,
) -> Result<Vec<Vec<Edge>>, TekhneError> {
    let forward_depth = max_hops.div_ceil(2);
    let backward_depth = max_hops / 2;

    // Endpoint node -> list of partial simple paths reaching it.
    let forward = expand(
        port, source, forward_depth, relations, min_trust, Direction::Outgoing, budget,
    )?;
    let backward = expand(
        port, target, backward_depth, relations, min_trust, Direction::Incoming, budget,
    )?;

    let mut seen: HashSet<Vec<String>> = HashSet::new();
    let mut found: Vec<Vec<Edge>> = Vec::new();

    for (meeting, fwd_paths) in &forward {
        let Some(bwd_paths) = backward.get(meeting) else {
            continue;
        };
        for fwd in fwd_paths {
            for bwd in bwd_paths {
                if fwd.edges.len() + bwd.edges.len() > max_hops
                    || fwd.edges.is_empty() && bwd.edges.is_empty()
                {
                    continue;
                }
                // Segments must not share nodes except the meeting point,
                // or the joined walk is not a simple path.
                if fwd.nodes.iter().any(|n| n != meeting && bwd.nodes.contains(n)) {
                    continue;
                }
                let mut edges = fwd.edges.clone();
                // Backward segments store edges from the meeting node to
                // the target in order already.
                edges.extend(bwd.edges.iter().cloned());
                let ids = node_sequence(source, &edges);
                if *ids.last().expect("non-empty") != target {
                    continue;
                }
                if seen.insert(ids) {
                    found.push(edges);
                }
            }
        }
    }
    Ok(found)
}

/// A partial path used during bidirectional expansion.
struct Segment {
    /// Edges in source-to-target order.
    edges: Vec<Edge>,
    /// All node ids on the segment.
    nodes: HashSet<String>,
}

/// Expand all simple partial paths up to `depth` from `start`.
///
/// For `Outgoing`, segments run from `start` outward; for `Incoming`, they
/// run from the far node back to `start`, with edges kept in walk order so
/// joining is a plain concatenation.
fn expand(
    port: &dyn GraphPort,
    start: &str,
    depth: usize,
    relations: Option<&[RelationType]>,
    min_trust: f64,
    direction: Direction,
    budget: &mut Budget,
) -> Result<HashMap<String, Vec<Segment>>, TekhneError> {
    let mut reached: HashMap<String, Vec<Segment>> = HashMap::new();
    reached.entry(start.to_string()).or_default().push(Segment {
        edges: Vec::new(),
        nodes: HashSet::from([start.to_string()]),
    });

    let mut queue: VecDeque<(String, Vec<Edge>, HashSet<String>)> = VecDeque::new();
    queue.push_back((
        start.to_string(),
        Vec::new(),
        HashSet::from([start.to_string()]),
    ));

    while let Some((current, edges_so_far, on_path)) = queue.pop_front() {
        if edges_so_far.len() >= depth {
            continue;
        }
        budget.charge()?;
        for edge in port.edges(&current, relations, direction)? {
            if edge.trust < min_trust {
                continue;
            }
            let Some(next) = edge.other_end(&current).map(str::to_string) else {
                continue;
            };
            if on_path.contains(&next) {
                continue;
            }
            let mut edges = edges_so_far.clone();
            match direction {
                Direction::Outgoing | Direction::Both => edges.push(edge),
                // Walking backwards: prepend so the segment stays in
                // forward walk order.
                Direction::Incoming => edges.insert(0, edge),
            }
            let mut nodes = on_path.clone();
            nodes.insert(next.clone());
            reached.entry(next.clone()).or_default().push(Segment {
                edges: edges.clone(),
                nodes: nodes.clone(),
            });
            queue.push_back((next, edges, nodes));
        }
    }
    Ok(reached)
}
