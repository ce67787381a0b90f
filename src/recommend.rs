//! Recommendation and similarity rankings with explainable scores.
//!
//! Three intents: `similar` (tag/category overlap plus trust, with direct
//! SIMILAR_TO edges short-circuiting at a fixed high score), `alternative`
//! (direct ALTERNATIVE_TO edges, topping up from the same-category similar
//! heuristic when short), and `complement` (outgoing INTEGRATES_WITH
//! edges). Every candidate carries its full signal breakdown; rankings are
//! stable with ties broken by id ascending.

use std::collections::{BTreeSet, HashSet};
use std::str::FromStr;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::budget::Budget;
use crate::config::SimilarityWeights;
use crate::error::{EngineError, TekhneError};
use crate::graph::port::GraphPort;
use crate::graph::traverse::{Traversal, TraversalOptions};
use crate::graph::{Direction, Node, RelationType};
use crate::provenance::{Breakdown, DerivationKind};
use crate::trust;

/// What the caller is asking for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    Similar,
    Alternative,
    Complement,
}

impl FromStr for Intent {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "similar" => Ok(Intent::Similar),
            "alternative" => Ok(Intent::Alternative),
            "complement" => Ok(Intent::Complement),
            other => Err(EngineError::InvalidIntent { given: other.to_string() }),
        }
    }
}

/// A ranked candidate with its contributing signals.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recommendation {
    pub node: Node,
    pub score: f64,
    pub breakdown: Breakdown,
}

/// Default number of recommendations returned when the caller sets no
/// limit.
pub const DEFAULT_LIMIT: usize = 5;

/// Options for a recommendation query. Unset values fall back to the
/// engine configuration.
#[derive(Debug, Clone, Default)]
pub struct RecommendOptions {
    pub limit: Option<usize>,
    pub min_trust: Option<f64>,
}

/// Optional filters for similarity queries.
#[derive(Debug, Clone, Default)]
pub struct SimilarFilter {
    /// Restrict candidates to this category.
    pub category: Option<String>,
    /// Require at least one of these tags on a candidate.
    pub tags: Option<Vec<String>>,
}

/// Rank candidates for `node` under the given intent.
#[allow(clippy::too_many_arguments)]
pub fn recommend(
    port: &dyn GraphPort,
    id: &str,
    intent: Intent,
    limit: usize,
    min_trust: f64,
    weights: &SimilarityWeights,
    neighborhood_depth: usize,
    budget: &mut Budget,
) -> Result<Vec<Recommendation>, TekhneError> {
    tracing::debug!(id, ?intent, limit, min_trust, "recommending");
    match intent {
        Intent::Similar => find_similar(
            port,
            id,
            &SimilarFilter::default(),
            limit,
            min_trust,
            weights,
            neighborhood_depth,
            budget,
        ),
        Intent::Alternative => {
            alternatives(port, id, limit, min_trust, weights, neighborhood_depth, budget)
        }
        Intent::Complement => complements(port, id, limit, min_trust),
    }
}

/// Similarity ranking: direct SIMILAR_TO edges first, then scored
/// neighborhood candidates.
#[allow(clippy::too_many_arguments)]
pub fn find_similar(
    port: &dyn GraphPort,
    id: &str,
    filter: &SimilarFilter,
    limit: usize,
    min_trust: f64,
    weights: &SimilarityWeights,
    neighborhood_depth: usize,
    budget: &mut Budget,
) -> Result<Vec<Recommendation>, TekhneError> {
    let subject = port.get_node(id)?;
    let mut out: Vec<Recommendation> = Vec::new();
    let mut included: HashSet<String> = HashSet::from([id.to_string()]);

    // Asserted similarity outranks any derived heuristic.
    for edge in port.edges(id, Some(&[RelationType::SimilarTo]), Direction::Both)? {
        if !trust::passes_threshold(edge.trust, min_trust) {
            continue;
        }
        let Some(other) = edge.other_end(id) else { continue };
        if !included.insert(other.to_string()) {
            continue;
        }
        let node = port.get_node(other)?;
        if !matches_filter(&node, filter) {
            continue;
        }
        out.push(Recommendation {
            node,
            score: weights.direct_edge_score,
            breakdown: Breakdown::new(DerivationKind::Asserted).with(
                "direct_similar_edge",
                edge.trust,
                1.0,
            ),
        });
    }

    // Candidates from the bounded neighborhood: graph proximity is the
    // candidate generator, tag/category overlap the scorer.
    let mut candidates: Vec<Node> = Vec::new();
    let walk = Traversal::new(
        port,
        id,
        TraversalOptions {
            max_depth: neighborhood_depth,
            relations: None,
            direction: Direction::Both,
            min_trust,
        },
    );
    for step in walk {
        let step = step?;
        budget.charge()?;
        if included.contains(&step.node.id) {
            continue;
        }
        if !matches_filter(&step.node, filter) {
            continue;
        }
        if !trust::passes_threshold(step.node.trust, min_trust) {
            continue;
        }
        // No overlap, no similarity basis.
        let shares_category =
            !subject.category.is_empty() && step.node.category == subject.category;
        if !shares_category && step.node.tags.is_disjoint(&subject.tags) {
            continue;
        }
        candidates.push(step.node);
    }

    let mut scored: Vec<Recommendation> = candidates
        .into_par_iter()
        .map(|node| {
            let jaccard = tag_jaccard(&subject.tags, &node.tags);
            let same_category = if !subject.category.is_empty()
                && node.category == subject.category
            {
                1.0
            } else {
                0.0
            };
            let breakdown = Breakdown::new(DerivationKind::Heuristic)
                .with("tag_jaccard", jaccard, weights.tag_jaccard)
                .with("same_category", same_category, weights.same_category)
                .with("node_trust", node.trust, weights.node_trust);
            let score = breakdown.total();
            Recommendation { node, score, breakdown }
        })
        .collect();

    out.append(&mut scored);
    sort_stable(&mut out);
    out.truncate(limit);
    Ok(out)
}

/// Direct alternatives by edge trust, topped up from the same-category
/// similar heuristic when fewer than `limit` exist.
fn alternatives(
    port: &dyn GraphPort,
    id: &str,
    limit: usize,
    min_trust: f64,
    weights: &SimilarityWeights,
    neighborhood_depth: usize,
    budget: &mut Budget,
) -> Result<Vec<Recommendation>, TekhneError> {
    let subject = port.get_node(id)?;
    let mut out: Vec<Recommendation> = Vec::new();
    let mut included: HashSet<String> = HashSet::from([id.to_string()]);

    for edge in port.edges(id, Some(&[RelationType::AlternativeTo]), Direction::Both)? {
        if !trust::passes_threshold(edge.trust, min_trust) {
            continue;
        }
        let Some(other) = edge.other_end(id) else { continue };
        if !included.insert(other.to_string()) {
            continue;
        }
        out.push(Recommendation {
            node: port.get_node(other)?,
            score: edge.trust,
            breakdown: Breakdown::new(DerivationKind::Asserted).with(
                "alternative_edge",
                edge.trust,
                1.0,
            ),
        });
    }
    sort_stable(&mut out);

    if out.len() < limit && !subject.category.is_empty() {
        tracing::debug!(id, have = out.len(), limit, "padding alternatives from similarity");
        let filter = SimilarFilter {
            category: Some(subject.category.clone()),
            tags: None,
        };
        let similar = find_similar(
            port,
            id,
            &filter,
            limit,
            min_trust,
            weights,
            neighborhood_depth,
            budget,
        )?;
        for mut rec in similar {
            if out.len() >= limit {
                break;
            }
            if !included.insert(rec.node.id.clone()) {
                continue;
            }
            // Heuristic stand-ins are explicitly lower-confidence.
            rec.breakdown.kind = DerivationKind::Fallback;
            out.push(rec);
        }
    }

    out.truncate(limit);
    Ok(out)
}

/// Integration partners by edge trust, then candidate trust.
fn complements(
    port: &dyn GraphPort,
    id: &str,
    limit: usize,
    min_trust: f64,
) -> Result<Vec<Recommendation>, TekhneError> {
    port.get_node(id)?;
    let mut out: Vec<Recommendation> = Vec::new();
    let mut included: HashSet<String> = HashSet::from([id.to_string()]);

    for edge in port.edges(id, Some(&[RelationType::IntegratesWith]), Direction::Outgoing)? {
        if !trust::passes_threshold(edge.trust, min_trust) {
            continue;
        }
        let Some(other) = edge.other_end(id) else { continue };
        if !included.insert(other.to_string()) {
            continue;
        }
        let node = port.get_node(other)?;
        let candidate_trust = node.trust;
        out.push(Recommendation {
            node,
            score: edge.trust,
            breakdown: Breakdown::new(DerivationKind::Asserted)
                .with("integration_edge", edge.trust, 1.0)
                .with("candidate_trust", candidate_trust, 0.0),
        });
    }

    out.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| {
                b.node
                    .trust
                    .partial_cmp(&a.node.trust)
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
            .then_with(|| a.node.id.cmp(&b.node.id))
    });
    out.truncate(limit);
    Ok(out)
}

fn matches_filter(node: &Node, filter: &SimilarFilter) -> bool {
    if let Some(ref category) = filter.category
        && node.category != *category
    {
        return false;
    }
    if let Some(ref tags) = filter.tags
        && !tags.iter().any(|t| node.tags.contains(t))
    {
        return false;
    }
    true
}

/// Jaccard overlap of two tag sets; 0.0 when both are empty.
fn tag_jaccard(a: &BTreeSet<String>, b: &BTreeSet<String>) -> f64 {
    let union = a.union(b).count();
    if union == 0 {
        return 0.0;
    }
    a.intersection(b).count() as f64 / union as f64
}

/// Score descending, id ascending.
fn sort_stable(recs: &mut [Recommendation]) {
    recs.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.node.id.cmp(&b.node.id))
    });
}
