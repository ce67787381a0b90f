//! Dependency resolution: trust-filtered install-order chains.
//!
//! Walks DEPENDS_ON edges outward from a root, excludes low-trust edges
//! before traversal, and produces a topologically valid install order —
//! dependencies before their dependents. Cycles are never silently
//! truncated: they are reported as [`ResolveError::CycleDetected`] with the
//! offending node sequence, or — on request — the acyclic part of the chain
//! is returned with the cycle attached.

use std::collections::{HashMap, VecDeque};

use serde::{Deserialize, Serialize};

use crate::budget::Budget;
use crate::error::ResolveError;
use crate::graph::port::GraphPort;
use crate::graph::{Direction, Edge, Node, RelationType};

/// What to do when the DEPENDS_ON subgraph contains a cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CyclePolicy {
    /// Fail the chain computation with the cycle contents.
    #[default]
    Fail,
    /// Return the orderable (acyclic) part of the chain and attach the
    /// cycle for the caller to inspect.
    AcyclicPrefix,
}

/// Options for a dependency resolution. Unset bounds fall back to the
/// engine configuration; depth never becomes unbounded.
#[derive(Debug, Clone, Default)]
pub struct ResolveOptions {
    pub max_depth: Option<usize>,
    pub min_trust: Option<f64>,
    pub cycle_policy: CyclePolicy,
}

/// One resolved dependency in install order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolvedDependency {
    pub node: Node,
    /// Minimum hop distance from the resolution root.
    pub depth: usize,
    /// Strongest DEPENDS_ON edge pointing at this node within the chain.
    /// The root carries its own node trust.
    pub trust: f64,
}

/// An ordered dependency chain: dependencies first, the root last.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DependencyChain {
    pub root: String,
    pub nodes: Vec<ResolvedDependency>,
    /// Present only under [`CyclePolicy::AcyclicPrefix`] when a cycle was
    /// found; the node sequence starts and ends at the same id.
    pub cycle: Option<Vec<String>>,
}

/// Resolve the dependency chain of `root`.
pub fn resolve_dependencies(
    port: &dyn GraphPort,
    root: &str,
    max_depth: usize,
    min_trust: f64,
    cycle_policy: CyclePolicy,
    budget: &mut Budget,
) -> Result<DependencyChain, ResolveError> {
    let root_node = port.get_node(root)?;
    tracing::debug!(root, max_depth, min_trust, "resolving dependencies");

    // Collect the trust-filtered DEPENDS_ON subgraph reachable from the
    // root, breadth-first within the depth bound.
    let mut adjacency: HashMap<String, Vec<Edge>> = HashMap::new();
    let mut depths: HashMap<String, usize> = HashMap::new();
    let mut incoming_trust: HashMap<String, f64> = HashMap::new();
    let mut queue: VecDeque<(String, usize)> = VecDeque::new();

    depths.insert(root.to_string(), 0);
    queue.push_back((root.to_string(), 0));

    while let Some((id, depth)) = queue.pop_front() {
        if depth >= max_depth {
            continue;
        }
        budget.charge()?;
        let edges = port.edges(&id, Some(&[RelationType::DependsOn]), Direction::Outgoing)?;
        for edge in edges {
            if edge.trust < min_trust {
                continue;
            }
            let dep = edge.target.clone();
            // Strongest claim wins when several chain members need the
            // same dependency.
            let slot = incoming_trust.entry(dep.clone()).or_insert(edge.trust);
            *slot = slot.max(edge.trust);
            adjacency.entry(id.clone()).or_default().push(edge);
            if !depths.contains_key(&dep) {
                depths.insert(dep.clone(), depth + 1);
                queue.push_back((dep, depth + 1));
            }
        }
    }

    // Cycle check before ordering. Iterative DFS with an explicit stack;
    // a node revisited while still on the stack closes a cycle.
    let cycle = find_cycle(root, &adjacency);
    if let Some(ref cycle) = cycle {
        tracing::warn!(root, cycle = ?cycle, "dependency cycle detected");
        if cycle_policy == CyclePolicy::Fail {
            return Err(ResolveError::CycleDetected { cycle: cycle.clone() });
        }
    }

    // Kahn's algorithm emitting dependencies before dependents. Among the
    // ready nodes, ties break by trust descending then id ascending for
    // reproducible output.
    let mut pending_deps: HashMap<&str, usize> = HashMap::new();
    let mut dependents: HashMap<&str, Vec<&str>> = HashMap::new();
    for id in depths.keys() {
        pending_deps.entry(id).or_insert(0);
    }
    for (source, edges) in &adjacency {
        for edge in edges {
            *pending_deps.entry(source).or_insert(0) += 1;
            dependents.entry(&edge.target).or_default().push(source);
        }
    }

    let trust_of = |id: &str| -> f64 {
        if id == root {
            root_node.trust
        } else {
            incoming_trust.get(id).copied().unwrap_or(0.0)
        }
    };

    let mut ready: Vec<&str> = pending_deps
        .iter()
        .filter(|&(_, &n)| n == 0)
        .map(|(&id, _)| id)
        .collect();
    let mut ordered: Vec<String> = Vec::with_capacity(depths.len());

    while !ready.is_empty() {
        ready.sort_by(|a, b| {
            trust_of(b)
                .partial_cmp(&trust_of(a))
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.cmp(b))
        });
        let id = ready.remove(0);
        ordered.push(id.to_string());
        for &dependent in dependents.get(id).map(Vec::as_slice).unwrap_or(&[]) {
            let n = pending_deps.get_mut(dependent).expect("dependent tracked");
            *n -= 1;
            if *n == 0 {
                ready.push(dependent);
            }
        }
    }

    let mut nodes = Vec::with_capacity(ordered.len());
    for id in ordered {
        let node = port.get_node(&id)?;
        let depth = depths.get(&id).copied().unwrap_or(0);
        let trust = trust_of(&id);
        nodes.push(ResolvedDependency { node, depth, trust });
    }

    Ok(DependencyChain {
        root: root.to_string(),
        nodes,
        cycle,
    })
}

/// Find one DEPENDS_ON cycle reachable from `root` in the collected
/// subgraph, as a node sequence starting and ending at the same id.
fn find_cycle(root: &str, adjacency: &HashMap<String, Vec<Edge>>) -> Option<Vec<String>> {
    #[derive(Clone, Copy, PartialEq)]
    enum Color {
        InProgress,
        Done,
    }

    let mut colors: HashMap<&str, Color> = HashMap::new();
    let mut path: Vec<&str> = Vec::new();
    // (node, next child index) frames instead of recursion.
    let mut stack: Vec<(&str, usize)> = vec![(root, 0)];
    colors.insert(root, Color::InProgress);
    path.push(root);

    while let Some(&mut (id, ref mut child)) = stack.last_mut() {
        let edges = adjacency.get(id).map(Vec::as_slice).unwrap_or(&[]);
        if *child < edges.len() {
            let next = edges[*child].target.as_str();
            *child += 1;
            match colors.get(next) {
                Some(Color::InProgress) => {
                    let pos = path.iter().position(|&p| p == next).expect("on path");
                    let mut cycle: Vec<String> =
                        path[pos..].iter().map(|s| s.to_string()).collect();
                    cycle.push(next.to_string());
                    return Some(cycle);
                }
                Some(Color::Done) => {}
                None => {
                    colors.insert(next, Color::InProgress);
                    path.push(next);
                    stack.push((next, 0));
                }
            }
        } else {
            colors.insert(id, Color::Done);
            path.pop();
            stack.pop();
        }
    }
    None
}
