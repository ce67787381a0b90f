//! Relation inference: composing known edges into probable relations.
//!
//! When two nodes have no direct edge, short connecting paths are matched
//! against a closed rule table ([`rules`]) and composed into an
//! [`Inference`] with decayed confidence. Direct edges short-circuit as
//! asserted findings. Every inference retains the path(s) that justify it.

pub mod engine;
pub mod rules;

use serde::{Deserialize, Serialize};

use crate::graph::RelationType;
use crate::pathfind::Path;
use crate::provenance::DerivationKind;
use crate::infer::rules::RuleKind;

/// A claimed relation between two nodes, with confidence and justification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Inference {
    /// Subject of the claimed relation.
    pub source: String,
    /// Object of the claimed relation.
    pub target: String,
    /// The claimed relation type.
    pub relation: RelationType,
    /// Probability-like confidence in [0, 1].
    pub confidence: f64,
    /// Asserted (read from a stored edge) or composed by a rule.
    pub kind: DerivationKind,
    /// The rule that produced a composed inference.
    pub rule: Option<RuleKind>,
    /// The path(s) justifying this claim, strongest first.
    pub paths: Vec<Path>,
}

/// Options for an inference query. Unset values fall back to the engine
/// configuration.
#[derive(Debug, Clone, Default)]
pub struct InferOptions {
    pub min_trust: Option<f64>,
}
