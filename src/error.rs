//! Rich diagnostic error types for the tekhne engine.
//!
//! Each subsystem defines its own error type with miette `#[diagnostic]`
//! derives, providing error codes and help text so callers know exactly what
//! went wrong and how to fix it. The taxonomy is deliberately small: graph
//! access failures, structural findings (cycles), exhausted budgets, and
//! configuration mistakes.

use std::sync::Arc;

use miette::Diagnostic;
use thiserror::Error;

/// Top-level error type for the tekhne engine.
///
/// Each variant wraps a subsystem-specific error, preserving the full
/// diagnostic chain (error codes, help text) through to the caller.
#[derive(Debug, Error, Diagnostic)]
pub enum TekhneError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Graph(#[from] GraphError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Resolve(#[from] ResolveError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Budget(#[from] BudgetError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Engine(#[from] EngineError),

    /// A failure observed by a caller whose query was coalesced onto
    /// another caller's in-flight computation of the same cache key.
    #[error(transparent)]
    Shared(Arc<TekhneError>),
}

impl TekhneError {
    /// Unwrap a shared error when this caller holds the last reference,
    /// otherwise keep it behind the `Arc`.
    pub fn from_shared(err: Arc<TekhneError>) -> Self {
        match Arc::try_unwrap(err) {
            Ok(err) => err,
            Err(err) => TekhneError::Shared(err),
        }
    }
}

// ---------------------------------------------------------------------------
// Graph access errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum GraphError {
    #[error("node not found: {id}")]
    #[diagnostic(
        code(tekhne::graph::not_found),
        help(
            "No node with this identifier exists in the graph. \
             Identifiers are exact and case-sensitive; check the spelling, \
             or list known nodes through your store's catalog."
        )
    )]
    NotFound { id: String },

    #[error("invalid relation type: {given}")]
    #[diagnostic(
        code(tekhne::graph::invalid_relation),
        help(
            "Relation filters must name members of the closed relation set: \
             DEPENDS_ON, ALTERNATIVE_TO, INTEGRATES_WITH, SIMILAR_TO, \
             RECOMMENDS, INCOMPATIBLE_WITH."
        )
    )]
    InvalidRelationType { given: String },

    // Field names avoid `source`, which thiserror reserves for error
    // chaining.
    #[error("edge references missing node: {from} -> {to}")]
    #[diagnostic(
        code(tekhne::graph::dangling_edge),
        help(
            "An edge must connect two existing nodes. \
             Insert both endpoint nodes before inserting the edge."
        )
    )]
    DanglingEdge { from: String, to: String },

    #[error("graph store unavailable: {message}")]
    #[diagnostic(
        code(tekhne::graph::store_unavailable),
        help(
            "The underlying graph store could not serve the request. \
             The engine does not retry; check store connectivity and retry \
             from the transport layer."
        )
    )]
    StoreUnavailable { message: String },
}

// ---------------------------------------------------------------------------
// Dependency resolution errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum ResolveError {
    #[error("dependency cycle detected: {}", cycle.join(" -> "))]
    #[diagnostic(
        code(tekhne::resolve::cycle),
        help(
            "The DEPENDS_ON edges reachable from the resolution root form a \
             cycle, so no valid install order exists. The reported sequence \
             starts and ends at the same node. Either fix the offending \
             edges, or re-run with CyclePolicy::AcyclicPrefix to get the \
             orderable part of the chain."
        )
    )]
    CycleDetected { cycle: Vec<String> },

    #[error(transparent)]
    #[diagnostic(transparent)]
    Graph(#[from] GraphError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Budget(#[from] BudgetError),
}

// ---------------------------------------------------------------------------
// Budget errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum BudgetError {
    #[error("deadline exceeded after {elapsed_ms} ms")]
    #[diagnostic(
        code(tekhne::budget::deadline),
        help(
            "The query hit its deadline before completing. No partial result \
             is returned; increase the deadline or narrow the query \
             (lower max_depth / max_hops, raise min_trust)."
        )
    )]
    DeadlineExceeded { elapsed_ms: u64 },

    #[error("step budget exhausted after {max_steps} traversal steps")]
    #[diagnostic(
        code(tekhne::budget::steps),
        help(
            "The query consumed its traversal-step budget before completing. \
             No partial result is returned; raise max_steps or narrow the \
             query."
        )
    )]
    StepsExhausted { max_steps: u64 },
}

// ---------------------------------------------------------------------------
// Engine errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum EngineError {
    #[error("invalid configuration: {message}")]
    #[diagnostic(
        code(tekhne::engine::invalid_config),
        help("Check the EngineConfig fields. {message}")
    )]
    InvalidConfig { message: String },

    #[error("invalid intent: {given}")]
    #[diagnostic(
        code(tekhne::engine::invalid_intent),
        help("Valid intents are: similar, alternative, complement.")
    )]
    InvalidIntent { given: String },

    #[error("failed to read config file {path}: {source}")]
    #[diagnostic(
        code(tekhne::engine::config_io),
        help("Ensure the config file exists and is readable.")
    )]
    ConfigIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    #[diagnostic(
        code(tekhne::engine::config_parse),
        help("The config file must be valid TOML matching the EngineConfig schema.")
    )]
    ConfigParse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
}

/// Convenience alias for functions returning tekhne results.
pub type TekhneResult<T> = std::result::Result<T, TekhneError>;
