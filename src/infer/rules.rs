//! The closed composition rule table.
//!
//! Each rule matches a two-hop pattern `a — x — b` by relation type and
//! edge orientation, and names the relation it licenses between the pair.
//! The table is exhaustive by construction: adding a rule means adding a
//! variant here, not extending string dispatch somewhere else.

use serde::{Deserialize, Serialize};

use crate::graph::{Edge, RelationType};

/// The composition rules the engine knows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleKind {
    /// `a DEPENDS_ON x` and `b DEPENDS_ON x` => `a SIMILAR_TO b`.
    SharedDependency,
    /// `a ALTERNATIVE_TO x` and `x ALTERNATIVE_TO b` => `a ALTERNATIVE_TO b`
    /// (also matched transitively over a third hop, with further decay).
    TransitiveAlternative,
    /// `a INTEGRATES_WITH x` and `b DEPENDS_ON x` => `a INTEGRATES_WITH b`,
    /// at reduced confidence: a shared integration point is weaker evidence
    /// than a shared dependency.
    CommonIntegration,
}

impl RuleKind {
    /// The relation this rule licenses.
    pub fn licenses(self) -> RelationType {
        match self {
            RuleKind::SharedDependency => RelationType::SimilarTo,
            RuleKind::TransitiveAlternative => RelationType::AlternativeTo,
            RuleKind::CommonIntegration => RelationType::IntegratesWith,
        }
    }

    /// Extra multiplicative penalty on top of hop decay.
    pub fn penalty(self, integration_penalty: f64) -> f64 {
        match self {
            RuleKind::SharedDependency | RuleKind::TransitiveAlternative => 1.0,
            RuleKind::CommonIntegration => integration_penalty,
        }
    }
}

/// A successful two-hop match: the rule plus the orientation of the
/// licensed relation between the queried pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Composition {
    pub rule: RuleKind,
    /// True when the licensed relation runs `a -> b`, false for `b -> a`.
    /// Symmetric licensed relations always report forward.
    pub forward: bool,
}

/// Match the pattern `a —ea— x —eb— b` against the rule table.
///
/// `ea` connects `a` and `x`; `eb` connects `x` and `b`. Orientation is
/// taken from the stored edges, so directed patterns (shared dependency,
/// common integration) only fire when the arrows actually line up.
pub fn compose(a: &str, ea: &Edge, x: &str, eb: &Edge, b: &str) -> Option<Composition> {
    if !ea.relation.composes() || !eb.relation.composes() {
        return None;
    }

    let a_depends_on_x = ea.relation == RelationType::DependsOn && ea.source == a && ea.target == x;
    let b_depends_on_x = eb.relation == RelationType::DependsOn && eb.source == b && eb.target == x;
    let a_integrates_x =
        ea.relation == RelationType::IntegratesWith && ea.source == a && ea.target == x;
    let b_integrates_x =
        eb.relation == RelationType::IntegratesWith && eb.source == b && eb.target == x;

    if a_depends_on_x && b_depends_on_x {
        return Some(Composition { rule: RuleKind::SharedDependency, forward: true });
    }
    if ea.relation == RelationType::AlternativeTo && eb.relation == RelationType::AlternativeTo {
        return Some(Composition { rule: RuleKind::TransitiveAlternative, forward: true });
    }
    if a_integrates_x && b_depends_on_x {
        return Some(Composition { rule: RuleKind::CommonIntegration, forward: true });
    }
    if b_integrates_x && a_depends_on_x {
        // Mirrored match: the licensed INTEGRATES_WITH runs b -> a.
        return Some(Composition { rule: RuleKind::CommonIntegration, forward: false });
    }
    None
}
