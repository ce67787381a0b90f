//! Graph data model and access layer.
//!
//! The reasoning engine reads a labeled-property graph of technology nodes
//! connected by typed, trust-scored edges. Access goes through the
//! [`port::GraphPort`] trait; [`memory::MemoryGraph`] is the reference
//! in-memory implementation used by the CLI, tests, and embedded callers.

pub mod memory;
pub mod port;
pub mod traverse;

use std::collections::BTreeSet;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::GraphError;

/// The closed set of relation types between nodes.
///
/// New relation types must be added here explicitly; behavior (symmetry,
/// participation in inference composition) is an exhaustive `match`, never
/// derived from string matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RelationType {
    DependsOn,
    AlternativeTo,
    IntegratesWith,
    SimilarTo,
    Recommends,
    IncompatibleWith,
}

impl RelationType {
    /// All relation types, in declaration order.
    pub const ALL: [RelationType; 6] = [
        RelationType::DependsOn,
        RelationType::AlternativeTo,
        RelationType::IntegratesWith,
        RelationType::SimilarTo,
        RelationType::Recommends,
        RelationType::IncompatibleWith,
    ];

    /// Whether this relation is logically symmetric.
    ///
    /// Symmetric relations are traversed in both directions even when stored
    /// as a single directed edge.
    pub fn is_symmetric(self) -> bool {
        match self {
            RelationType::AlternativeTo
            | RelationType::SimilarTo
            | RelationType::IncompatibleWith => true,
            RelationType::DependsOn
            | RelationType::IntegratesWith
            | RelationType::Recommends => false,
        }
    }

    /// Whether edges of this type may contribute to relation inference.
    pub fn composes(self) -> bool {
        match self {
            RelationType::DependsOn
            | RelationType::AlternativeTo
            | RelationType::IntegratesWith => true,
            RelationType::SimilarTo
            | RelationType::Recommends
            | RelationType::IncompatibleWith => false,
        }
    }

    /// Wire name, e.g. `DEPENDS_ON`.
    pub fn as_str(self) -> &'static str {
        match self {
            RelationType::DependsOn => "DEPENDS_ON",
            RelationType::AlternativeTo => "ALTERNATIVE_TO",
            RelationType::IntegratesWith => "INTEGRATES_WITH",
            RelationType::SimilarTo => "SIMILAR_TO",
            RelationType::Recommends => "RECOMMENDS",
            RelationType::IncompatibleWith => "INCOMPATIBLE_WITH",
        }
    }
}

impl FromStr for RelationType {
    type Err = GraphError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RelationType::ALL
            .into_iter()
            .find(|r| r.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| GraphError::InvalidRelationType { given: s.to_string() })
    }
}

impl std::fmt::Display for RelationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Edge direction selector for port queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Outgoing,
    Incoming,
    Both,
}

/// Trust banding for presentation. Derived from a score, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrustLevel {
    Verified,
    High,
    Medium,
    Low,
    Unverified,
}

impl TrustLevel {
    /// Band a trust score: verified >= 0.9, high >= 0.7, medium >= 0.5,
    /// low >= 0.3, else unverified.
    pub fn from_score(score: f64) -> Self {
        if score >= 0.9 {
            TrustLevel::Verified
        } else if score >= 0.7 {
            TrustLevel::High
        } else if score >= 0.5 {
            TrustLevel::Medium
        } else if score >= 0.3 {
            TrustLevel::Low
        } else {
            TrustLevel::Unverified
        }
    }
}

/// A technology or concept node in the knowledge graph.
///
/// Read-only to the reasoning engine; ingestion owns creation and updates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// Unique, immutable identifier.
    pub id: String,
    /// Human-readable display name.
    pub name: String,
    /// Category, e.g. "database", "framework", "library".
    #[serde(default)]
    pub category: String,
    /// Free-form tags. A sorted set so serialized output is stable.
    #[serde(default)]
    pub tags: BTreeSet<String>,
    /// Aggregated trust score in [0, 1].
    #[serde(default = "default_trust")]
    pub trust: f64,
    /// Provenance source references (URLs, ingestion run ids, ...).
    #[serde(default)]
    pub sources: Vec<String>,
    /// Optional free-form description.
    #[serde(default)]
    pub description: String,
}

fn default_trust() -> f64 {
    0.5
}

impl Node {
    /// Create a node with the default trust score of 0.5 and no metadata.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            category: String::new(),
            tags: BTreeSet::new(),
            trust: default_trust(),
            sources: Vec::new(),
            description: String::new(),
        }
    }

    /// Set the category.
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    /// Add tags.
    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags.extend(tags.into_iter().map(Into::into));
        self
    }

    /// Set the trust score, clamped to [0, 1].
    pub fn with_trust(mut self, trust: f64) -> Self {
        self.trust = trust.clamp(0.0, 1.0);
        self
    }

    /// Add a provenance source reference.
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.sources.push(source.into());
        self
    }

    /// Trust band for this node's score.
    pub fn trust_level(&self) -> TrustLevel {
        TrustLevel::from_score(self.trust)
    }
}

/// A directed, typed, trust-scored edge between two node identifiers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    /// Source node identifier.
    pub source: String,
    /// Relation type.
    pub relation: RelationType,
    /// Target node identifier.
    pub target: String,
    /// Trust score in [0, 1].
    #[serde(default = "default_trust")]
    pub trust: f64,
    /// Traversal cost. Defaults to 1.0.
    #[serde(default = "default_weight")]
    pub weight: f64,
}

fn default_weight() -> f64 {
    1.0
}

impl Edge {
    /// Create an edge with default trust (0.5) and weight (1.0).
    pub fn new(
        source: impl Into<String>,
        relation: RelationType,
        target: impl Into<String>,
    ) -> Self {
        Self {
            source: source.into(),
            relation,
            target: target.into(),
            trust: default_trust(),
            weight: default_weight(),
        }
    }

    /// Set the trust score, clamped to [0, 1].
    pub fn with_trust(mut self, trust: f64) -> Self {
        self.trust = trust.clamp(0.0, 1.0);
        self
    }

    /// Set the traversal weight.
    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = weight;
        self
    }

    /// The endpoint opposite to `id`, if `id` is an endpoint at all.
    pub fn other_end(&self, id: &str) -> Option<&str> {
        if self.source == id {
            Some(&self.target)
        } else if self.target == id {
            Some(&self.source)
        } else {
            None
        }
    }
}

/// Aggregate graph statistics, backing the `stats` query.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GraphStats {
    pub node_count: usize,
    pub edge_count: usize,
    pub average_trust: f64,
    /// Node counts per category, sorted by category name.
    pub categories: Vec<(String, usize)>,
}
