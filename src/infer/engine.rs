//! The inference engine: direct-edge short-circuit plus rule composition.

use std::collections::HashMap;

use crate::budget::Budget;
use crate::error::TekhneError;
use crate::graph::port::GraphPort;
use crate::graph::{Direction, Edge, RelationType};
use crate::infer::rules::{self, RuleKind};
use crate::infer::Inference;
use crate::pathfind::{Path, PathStep};
use crate::provenance::DerivationKind;
use crate::trust;

/// Infer the probable relation(s) between `a` and `b`.
///
/// Direct edges are returned as asserted findings at their own trust.
/// Otherwise two-hop connecting paths are matched against the rule table
/// (plus three-hop chains for the transitive-alternative rule), confidence
/// decaying per hop beyond the first. Distinct paths supporting the same
/// claim combine by max — evidence is probability-like, never summed.
pub fn infer_relation(
    port: &dyn GraphPort,
    a: &str,
    b: &str,
    min_trust: f64,
    decay_per_hop: f64,
    integration_penalty: f64,
    budget: &mut Budget,
) -> Result<Vec<Inference>, TekhneError> {
    port.get_node(a)?;
    port.get_node(b)?;
    tracing::debug!(a, b, min_trust, "inferring relation");

    let mut results: Vec<Inference> = Vec::new();

    // Asserted facts first: stored edges directly connecting the pair.
    for edge in port.edges(a, None, Direction::Both)? {
        if edge.other_end(a) != Some(b) {
            continue;
        }
        let forward = edge.source == a || edge.relation.is_symmetric();
        let (source, target) = if forward { (a, b) } else { (b, a) };
        results.push(Inference {
            source: source.to_string(),
            target: target.to_string(),
            relation: edge.relation,
            confidence: edge.trust,
            kind: DerivationKind::Asserted,
            rule: None,
            paths: vec![materialize_path(port, a, std::slice::from_ref(&edge))?],
        });
    }

    // Composed claims, grouped by (relation, direction) with max-combined
    // confidence and every justifying path retained.
    type Key = (RelationType, String, String);
    let mut composed: HashMap<Key, (f64, RuleKind, Vec<(f64, Path)>)> = HashMap::new();
    let mut record = |key: Key, rule: RuleKind, confidence: f64, path: Path| {
        let entry = composed.entry(key).or_insert((0.0, rule, Vec::new()));
        entry.0 = trust::combine_evidence(entry.0, confidence);
        entry.2.push((confidence, path));
    };

    let a_edges = port.edges(a, None, Direction::Both)?;
    for ea in &a_edges {
        let Some(x) = ea.other_end(a) else { continue };
        if x == b || x == a {
            continue;
        }
        budget.charge().map_err(TekhneError::from)?;
        for eb in port.edges(x, None, Direction::Both)? {
            if eb.other_end(x) != Some(b) {
                continue;
            }
            let Some(m) = rules::compose(a, ea, x, &eb, b) else {
                continue;
            };
            let confidence = trust::clamp(
                ea.trust * eb.trust * decay_per_hop * m.rule.penalty(integration_penalty),
            );
            let relation = m.rule.licenses();
            let (source, target) = if m.forward || relation.is_symmetric() {
                (a.to_string(), b.to_string())
            } else {
                (b.to_string(), a.to_string())
            };
            let path = materialize_path(port, a, &[ea.clone(), eb.clone()])?;
            record((relation, source, target), m.rule, confidence, path);
        }
    }

    // Third hop for alternative-of-alternative chains only.
    let alt = [RelationType::AlternativeTo];
    for ea in port.edges(a, Some(&alt), Direction::Both)? {
        let Some(x) = ea.other_end(a) else { continue };
        if x == b || x == a {
            continue;
        }
        budget.charge().map_err(TekhneError::from)?;
        for ex in port.edges(x, Some(&alt), Direction::Both)? {
            let Some(y) = ex.other_end(x) else { continue };
            if y == a || y == b || y == x {
                continue;
            }
            for eb in port.edges(y, Some(&alt), Direction::Both)? {
                if eb.other_end(y) != Some(b) {
                    continue;
                }
                let confidence = trust::clamp(
                    ea.trust * ex.trust * eb.trust * decay_per_hop * decay_per_hop,
                );
                let path =
                    materialize_path(port, a, &[ea.clone(), ex.clone(), eb.clone()])?;
                record(
                    (RelationType::AlternativeTo, a.to_string(), b.to_string()),
                    RuleKind::TransitiveAlternative,
                    confidence,
                    path,
                );
            }
        }
    }

    for ((relation, source, target), (confidence, rule, mut paths)) in composed {
        paths.sort_by(|x, y| {
            y.0.partial_cmp(&x.0)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| {
                    x.1.node_ids()
                        .join("/")
                        .cmp(&y.1.node_ids().join("/"))
                })
        });
        results.push(Inference {
            source,
            target,
            relation,
            confidence,
            kind: DerivationKind::Composed,
            rule: Some(rule),
            paths: paths.into_iter().map(|(_, p)| p).collect(),
        });
    }

    results.retain(|inf| trust::passes_threshold(inf.confidence, min_trust));
    results.sort_by(|x, y| {
        y.confidence
            .partial_cmp(&x.confidence)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| {
                // Asserted facts outrank composed claims at equal confidence.
                let rank = |k: DerivationKind| u8::from(k != DerivationKind::Asserted);
                rank(x.kind).cmp(&rank(y.kind))
            })
            .then_with(|| x.relation.cmp(&y.relation))
            .then_with(|| (&x.source, &x.target).cmp(&(&y.source, &y.target)))
    });
    Ok(results)
}

/// Turn an edge walk starting at `start` into a [`Path`] with node data.
fn materialize_path(
    port: &dyn GraphPort,
    start: &str,
    edges: &[Edge],
) -> Result<Path, TekhneError> {
    let mut steps = Vec::with_capacity(edges.len());
    let mut current = start.to_string();
    let mut trust = f64::INFINITY;
    let mut weight = 0.0;
    for edge in edges {
        let next = edge
            .other_end(&current)
            .expect("edge walk is connected")
            .to_string();
        trust = trust.min(edge.trust);
        weight += edge.weight;
        steps.push(PathStep {
            edge: edge.clone(),
            node: port.get_node(&next)?,
        });
        current = next;
    }
    Ok(Path {
        source: start.to_string(),
        target: current,
        steps,
        trust: if trust.is_finite() { trust } else { 1.0 },
        weight,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::memory::MemoryGraph;
    use crate::graph::Node;

    const DECAY: f64 = 0.8;
    const PENALTY: f64 = 0.75;

    fn graph(nodes: &[&str], edges: &[(&str, RelationType, &str, f64)]) -> MemoryGraph {
        let g = MemoryGraph::new();
        for id in nodes {
            g.insert_node(Node::new(*id, id.to_uppercase())).unwrap();
        }
        for (s, rel, t, trust) in edges {
            g.insert_edge(Edge::new(*s, *rel, *t).with_trust(*trust)).unwrap();
        }
        g
    }

    fn infer(g: &MemoryGraph, a: &str, b: &str, min_trust: f64) -> Vec<Inference> {
        infer_relation(g, a, b, min_trust, DECAY, PENALTY, &mut Budget::unlimited()).unwrap()
    }

    #[test]
    fn shared_dependency_yields_similar_to() {
        let g = graph(
            &["a", "b", "x"],
            &[
                ("a", RelationType::DependsOn, "x", 0.9),
                ("b", RelationType::DependsOn, "x", 0.8),
            ],
        );
        let results = infer(&g, "a", "b", 0.0);
        assert_eq!(results.len(), 1);
        let inf = &results[0];
        assert_eq!(inf.relation, RelationType::SimilarTo);
        assert_eq!(inf.kind, DerivationKind::Composed);
        let expected = 0.9 * 0.8 * DECAY;
        assert!((inf.confidence - expected).abs() < 1e-9);
        // Bounded by the weakest edge and by single-hop decay.
        assert!(inf.confidence <= 0.8);
        assert!(inf.confidence <= DECAY);
        assert_eq!(inf.paths.len(), 1);
        assert_eq!(inf.paths[0].node_ids(), vec!["a", "x", "b"]);
    }

    #[test]
    fn direct_edge_short_circuits_as_asserted() {
        let g = graph(
            &["a", "b"],
            &[("a", RelationType::IntegratesWith, "b", 0.85)],
        );
        let results = infer(&g, "a", "b", 0.0);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].kind, DerivationKind::Asserted);
        assert!((results[0].confidence - 0.85).abs() < 1e-9);
        assert!(results[0].rule.is_none());
    }

    #[test]
    fn multiple_paths_combine_by_max_not_sum() {
        // Two shared dependencies; each alone licenses SIMILAR_TO.
        let g = graph(
            &["a", "b", "x", "y"],
            &[
                ("a", RelationType::DependsOn, "x", 0.9),
                ("b", RelationType::DependsOn, "x", 0.9),
                ("a", RelationType::DependsOn, "y", 0.6),
                ("b", RelationType::DependsOn, "y", 0.6),
            ],
        );
        let results = infer(&g, "a", "b", 0.0);
        assert_eq!(results.len(), 1);
        let expected_max = 0.9 * 0.9 * DECAY;
        assert!((results[0].confidence - expected_max).abs() < 1e-9);
        // Both justifying paths retained, strongest first.
        assert_eq!(results[0].paths.len(), 2);
        assert_eq!(results[0].paths[0].node_ids(), vec!["a", "x", "b"]);
    }

    #[test]
    fn transitive_alternative_across_three_hops() {
        let g = graph(
            &["a", "x", "y", "b"],
            &[
                ("a", RelationType::AlternativeTo, "x", 0.9),
                ("x", RelationType::AlternativeTo, "y", 0.9),
                ("y", RelationType::AlternativeTo, "b", 0.9),
            ],
        );
        let results = infer(&g, "a", "b", 0.0);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].relation, RelationType::AlternativeTo);
        let expected = 0.9 * 0.9 * 0.9 * DECAY * DECAY;
        assert!((results[0].confidence - expected).abs() < 1e-9);
    }

    #[test]
    fn integration_rule_is_penalized_below_shared_dependency() {
        let g = graph(
            &["a", "b", "x"],
            &[
                ("a", RelationType::IntegratesWith, "x", 0.9),
                ("b", RelationType::DependsOn, "x", 0.9),
            ],
        );
        let results = infer(&g, "a", "b", 0.0);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].relation, RelationType::IntegratesWith);
        let expected = 0.9 * 0.9 * DECAY * PENALTY;
        assert!((results[0].confidence - expected).abs() < 1e-9);
    }

    #[test]
    fn min_trust_drops_weak_inferences() {
        let g = graph(
            &["a", "b", "x"],
            &[
                ("a", RelationType::DependsOn, "x", 0.6),
                ("b", RelationType::DependsOn, "x", 0.6),
            ],
        );
        assert!(infer(&g, "a", "b", 0.7).is_empty());
        assert_eq!(infer(&g, "a", "b", 0.0).len(), 1);
    }

    #[test]
    fn unrelated_pair_yields_nothing() {
        let g = graph(
            &["a", "b", "x"],
            &[("a", RelationType::DependsOn, "x", 0.9)],
        );
        assert!(infer(&g, "a", "b", 0.0).is_empty());
    }

    #[test]
    fn step_budget_aborts_inference() {
        // Two shared dependencies: a has two edges to expand, the budget
        // allows one.
        let g = graph(
            &["a", "b", "x", "y"],
            &[
                ("a", RelationType::DependsOn, "x", 0.9),
                ("b", RelationType::DependsOn, "x", 0.9),
                ("a", RelationType::DependsOn, "y", 0.9),
                ("b", RelationType::DependsOn, "y", 0.9),
            ],
        );
        let err = infer_relation(
            &g,
            "a",
            "b",
            0.0,
            DECAY,
            PENALTY,
            &mut Budget::unlimited().with_max_steps(1),
        )
        .unwrap_err();
        assert!(matches!(err, TekhneError::Budget(_)));
    }

    #[test]
    fn missing_node_is_not_found() {
        let g = graph(&["a"], &[]);
        let err = infer_relation(&g, "a", "ghost", 0.0, DECAY, PENALTY, &mut Budget::unlimited())
            .unwrap_err();
        assert!(matches!(
            err,
            TekhneError::Graph(crate::error::GraphError::NotFound { .. })
        ));
    }
}
