//! The Graph Access Port: the engine's only window onto the graph store.
//!
//! Every reasoning component issues reads through [`GraphPort`] and nothing
//! else, so the engine stays free of storage concerns. Implementations wrap
//! whatever store actually holds the graph (the in-memory reference
//! implementation lives in [`super::memory`]); failures surface as
//! [`GraphError::StoreUnavailable`] and are not retried here.

use crate::error::GraphError;
use crate::graph::traverse::{Traversal, TraversalOptions};
use crate::graph::{Direction, Edge, GraphStats, Node, RelationType};

/// Result type for port operations.
pub type PortResult<T> = std::result::Result<T, GraphError>;

/// Read-only access to the knowledge graph.
///
/// Contract for `edges`: symmetric relation types are transparent to
/// direction — an `Outgoing` query for node `n` also returns stored
/// symmetric edges that merely *end* at `n` (and `Incoming` mirrors this).
/// Callers use [`Edge::other_end`] to find the far endpoint. A `Both` query
/// returns each stored edge touching `n` exactly once.
pub trait GraphPort: Send + Sync {
    /// Fetch a node by identifier.
    fn get_node(&self, id: &str) -> PortResult<Node>;

    /// Fetch edges of a node, optionally restricted to a set of relation
    /// types, honoring the symmetry contract above.
    fn edges(
        &self,
        id: &str,
        relations: Option<&[RelationType]>,
        direction: Direction,
    ) -> PortResult<Vec<Edge>>;

    /// Aggregate statistics over the whole graph.
    fn stats(&self) -> PortResult<GraphStats>;

    /// Lazy bounded-depth breadth-first traversal from `start`.
    ///
    /// Finite (depth- and visited-bounded) and restartable: dropping the
    /// iterator and calling `traverse` again replays from the start.
    fn traverse<'a>(&'a self, start: &'a str, opts: TraversalOptions) -> Traversal<'a>
    where
        Self: Sized,
    {
        Traversal::new(self, start, opts)
    }
}
