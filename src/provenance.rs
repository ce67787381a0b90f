//! Provenance for derived results.
//!
//! Every answer the engine produces — a path, an inference, a
//! recommendation — carries the facts and signals that produced it as
//! first-class values, so "why was this answer given" is reconstructable
//! without re-querying the store.

use serde::{Deserialize, Serialize};

/// How a derived result was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DerivationKind {
    /// Read directly from a stored edge.
    Asserted,
    /// Composed from multiple stored edges by an inference rule.
    Composed,
    /// Computed by a scoring heuristic (tag overlap, category match, ...).
    Heuristic,
    /// Produced by a lower-confidence fallback after the primary signal
    /// came up short.
    Fallback,
}

/// One contributing signal in a composite score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    /// Signal name, e.g. "tag_jaccard", "same_category", "edge_trust".
    pub name: String,
    /// Raw signal value in [0, 1].
    pub value: f64,
    /// Weight applied to the value.
    pub weight: f64,
}

impl Signal {
    pub fn new(name: impl Into<String>, value: f64, weight: f64) -> Self {
        Self { name: name.into(), value, weight }
    }

    /// This signal's contribution to the composite score.
    pub fn contribution(&self) -> f64 {
        self.value * self.weight
    }
}

/// An explainable score: the composite value plus every contributing signal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Breakdown {
    pub kind: DerivationKind,
    pub signals: Vec<Signal>,
}

impl Breakdown {
    pub fn new(kind: DerivationKind) -> Self {
        Self { kind, signals: Vec::new() }
    }

    /// Record a signal and return self for chaining.
    pub fn with(mut self, name: impl Into<String>, value: f64, weight: f64) -> Self {
        self.signals.push(Signal::new(name, value, weight));
        self
    }

    /// Weighted sum of all signals.
    pub fn total(&self) -> f64 {
        self.signals.iter().map(Signal::contribution).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn breakdown_totals_weighted_signals() {
        let b = Breakdown::new(DerivationKind::Heuristic)
            .with("tag_jaccard", 0.5, 0.5)
            .with("same_category", 1.0, 0.3)
            .with("node_trust", 0.8, 0.2);
        assert!((b.total() - (0.25 + 0.3 + 0.16)).abs() < 1e-9);
        assert_eq!(b.signals.len(), 3);
    }
}
