//! The engine facade: configured entry point for every reasoning query.
//!
//! [`Engine`] owns a [`GraphPort`], an [`EngineConfig`], and the query
//! cache. Per-request options override the configured defaults; anything
//! unset falls back to the config, so callers with no opinion pass
//! `Default::default()`. The engine is `Send + Sync` and all query methods
//! take `&self`, so one instance serves concurrent callers directly.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::budget::Budget;
use crate::cache::{QueryCache, QueryKey, QueryValue};
use crate::config::EngineConfig;
use crate::error::{TekhneError, TekhneResult};
use crate::graph::port::GraphPort;
use crate::graph::{Direction, GraphStats, Node, RelationType};
use crate::infer::{self, InferOptions, Inference};
use crate::pathfind::{self, Path, PathOptions};
use crate::recommend::{self, Intent, Recommendation, RecommendOptions, SimilarFilter};
use crate::resolve::{self, DependencyChain, ResolveOptions};
use crate::trust;

/// A node's immediate relations, grouped by type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeContext {
    pub node: Node,
    pub relations: Vec<RelationGroup>,
}

/// All neighbors reached through one relation type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelationGroup {
    pub relation: RelationType,
    pub neighbors: Vec<NeighborRef>,
}

/// One neighbor with the connecting edge's trust and orientation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NeighborRef {
    pub node: Node,
    pub trust: f64,
    /// True when the stored edge runs from the queried node to this one.
    /// For symmetric relation types the orientation is storage detail.
    pub outgoing: bool,
}

/// Configured reasoning engine over a graph port.
pub struct Engine {
    port: Arc<dyn GraphPort>,
    config: EngineConfig,
    cache: QueryCache,
}

impl Engine {
    /// Build an engine. Fails on an invalid configuration.
    pub fn new(port: Arc<dyn GraphPort>, config: EngineConfig) -> TekhneResult<Self> {
        config.validate().map_err(TekhneError::from)?;
        let cache = QueryCache::new(&config.cache);
        Ok(Self { port, config, cache })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Drop all cached query results, e.g. after mutating the graph.
    pub fn invalidate_cache(&self) {
        self.cache.invalidate_all();
    }

    fn min_trust(&self, requested: Option<f64>) -> f64 {
        trust::clamp(requested.unwrap_or(self.config.min_trust))
    }

    /// Trust-filtered install-order chain for `root`.
    pub fn resolve_dependencies(
        &self,
        root: &str,
        opts: ResolveOptions,
    ) -> TekhneResult<Arc<DependencyChain>> {
        self.resolve_dependencies_with_budget(root, opts, &mut Budget::unlimited())
    }

    pub fn resolve_dependencies_with_budget(
        &self,
        root: &str,
        opts: ResolveOptions,
        budget: &mut Budget,
    ) -> TekhneResult<Arc<DependencyChain>> {
        let max_depth = opts.max_depth.unwrap_or(self.config.max_depth);
        let min_trust = self.min_trust(opts.min_trust);
        let key = QueryKey::Resolve {
            root: root.to_string(),
            max_depth,
            min_trust_bits: min_trust.to_bits(),
            cycle_policy: opts.cycle_policy,
        };
        let value = self.cache.get_or_compute(key, || {
            let chain = resolve::resolve_dependencies(
                self.port.as_ref(),
                root,
                max_depth,
                min_trust,
                opts.cycle_policy,
                budget,
            )?;
            Ok(QueryValue::Chain(Arc::new(chain)))
        })?;
        match value {
            QueryValue::Chain(chain) => Ok(chain),
            _ => unreachable!("resolve key maps to chain values"),
        }
    }

    /// Ranked paths between two nodes. Empty when unconnected within the
    /// hop bound.
    pub fn find_paths(
        &self,
        source: &str,
        target: &str,
        opts: PathOptions,
    ) -> TekhneResult<Arc<Vec<Path>>> {
        self.find_paths_with_budget(source, target, opts, &mut Budget::unlimited())
    }

    pub fn find_paths_with_budget(
        &self,
        source: &str,
        target: &str,
        opts: PathOptions,
        budget: &mut Budget,
    ) -> TekhneResult<Arc<Vec<Path>>> {
        let max_hops = opts.max_hops.unwrap_or(self.config.max_hops);
        let min_trust = self.min_trust(opts.min_trust);
        let max_paths = opts.max_paths.unwrap_or(self.config.max_paths);
        let key = QueryKey::Paths {
            source: source.to_string(),
            target: target.to_string(),
            max_hops,
            relations: opts.relations.clone().map(|mut r| {
                r.sort();
                r.dedup();
                r
            }),
            min_trust_bits: min_trust.to_bits(),
            max_paths,
        };
        let value = self.cache.get_or_compute(key, || {
            let paths = pathfind::find_paths(
                self.port.as_ref(),
                source,
                target,
                max_hops,
                opts.relations.as_deref(),
                min_trust,
                max_paths,
                self.config.bidirectional_from_hops,
                budget,
            )?;
            Ok(QueryValue::Paths(Arc::new(paths)))
        })?;
        match value {
            QueryValue::Paths(paths) => Ok(paths),
            _ => unreachable!("path key maps to path values"),
        }
    }

    /// Probable relation(s) between two nodes, with justification.
    pub fn infer_relation(
        &self,
        a: &str,
        b: &str,
        opts: InferOptions,
    ) -> TekhneResult<Arc<Vec<Inference>>> {
        self.infer_relation_with_budget(a, b, opts, &mut Budget::unlimited())
    }

    pub fn infer_relation_with_budget(
        &self,
        a: &str,
        b: &str,
        opts: InferOptions,
        budget: &mut Budget,
    ) -> TekhneResult<Arc<Vec<Inference>>> {
        let min_trust = self.min_trust(opts.min_trust);
        let key = QueryKey::Infer {
            a: a.to_string(),
            b: b.to_string(),
            min_trust_bits: min_trust.to_bits(),
        };
        let value = self.cache.get_or_compute(key, || {
            let inferences = infer::engine::infer_relation(
                self.port.as_ref(),
                a,
                b,
                min_trust,
                self.config.decay_per_hop,
                self.config.integration_penalty,
                budget,
            )?;
            Ok(QueryValue::Inferences(Arc::new(inferences)))
        })?;
        match value {
            QueryValue::Inferences(inferences) => Ok(inferences),
            _ => unreachable!("infer key maps to inference values"),
        }
    }

    /// Ranked candidates for `id` under the given intent.
    pub fn recommend(
        &self,
        id: &str,
        intent: Intent,
        opts: RecommendOptions,
    ) -> TekhneResult<Arc<Vec<Recommendation>>> {
        self.recommend_with_budget(id, intent, opts, &mut Budget::unlimited())
    }

    pub fn recommend_with_budget(
        &self,
        id: &str,
        intent: Intent,
        opts: RecommendOptions,
        budget: &mut Budget,
    ) -> TekhneResult<Arc<Vec<Recommendation>>> {
        let limit = opts.limit.unwrap_or(recommend::DEFAULT_LIMIT);
        let min_trust = self.min_trust(opts.min_trust);
        let key = QueryKey::Recommend {
            id: id.to_string(),
            intent,
            limit,
            min_trust_bits: min_trust.to_bits(),
        };
        let value = self.cache.get_or_compute(key, || {
            let recs = recommend::recommend(
                self.port.as_ref(),
                id,
                intent,
                limit,
                min_trust,
                &self.config.similarity,
                self.config.neighborhood_depth,
                budget,
            )?;
            Ok(QueryValue::Recommendations(Arc::new(recs)))
        })?;
        match value {
            QueryValue::Recommendations(recs) => Ok(recs),
            _ => unreachable!("recommend key maps to recommendation values"),
        }
    }

    /// Similarity ranking with optional category and tag filters.
    pub fn find_similar(
        &self,
        id: &str,
        filter: SimilarFilter,
        opts: RecommendOptions,
    ) -> TekhneResult<Arc<Vec<Recommendation>>> {
        self.find_similar_with_budget(id, filter, opts, &mut Budget::unlimited())
    }

    pub fn find_similar_with_budget(
        &self,
        id: &str,
        filter: SimilarFilter,
        opts: RecommendOptions,
        budget: &mut Budget,
    ) -> TekhneResult<Arc<Vec<Recommendation>>> {
        let limit = opts.limit.unwrap_or(recommend::DEFAULT_LIMIT);
        let min_trust = self.min_trust(opts.min_trust);
        let key = QueryKey::Similar {
            id: id.to_string(),
            category: filter.category.clone(),
            tags: filter.tags.clone().map(|mut t| {
                t.sort();
                t.dedup();
                t
            }),
            limit,
            min_trust_bits: min_trust.to_bits(),
        };
        let value = self.cache.get_or_compute(key, || {
            let recs = recommend::find_similar(
                self.port.as_ref(),
                id,
                &filter,
                limit,
                min_trust,
                &self.config.similarity,
                self.config.neighborhood_depth,
                budget,
            )?;
            Ok(QueryValue::Recommendations(Arc::new(recs)))
        })?;
        match value {
            QueryValue::Recommendations(recs) => Ok(recs),
            _ => unreachable!("similar key maps to recommendation values"),
        }
    }

    /// Aggregate graph statistics.
    pub fn stats(&self) -> TekhneResult<Arc<GraphStats>> {
        let value = self.cache.get_or_compute(QueryKey::Stats, || {
            Ok(QueryValue::Stats(Arc::new(self.port.stats()?)))
        })?;
        match value {
            QueryValue::Stats(stats) => Ok(stats),
            _ => unreachable!("stats key maps to stats values"),
        }
    }

    /// A node and its immediate relations, grouped by relation type.
    /// Not cached; a single-node read is as cheap as the cache lookup.
    pub fn node_context(&self, id: &str) -> TekhneResult<NodeContext> {
        let node = self.port.get_node(id)?;
        let mut groups: Vec<RelationGroup> = Vec::new();
        for relation in RelationType::ALL {
            let edges = self.port.edges(id, Some(&[relation]), Direction::Both)?;
            if edges.is_empty() {
                continue;
            }
            let mut neighbors = Vec::with_capacity(edges.len());
            for edge in edges {
                let Some(other) = edge.other_end(id) else { continue };
                neighbors.push(NeighborRef {
                    node: self.port.get_node(other)?,
                    trust: edge.trust,
                    outgoing: edge.source == id,
                });
            }
            groups.push(RelationGroup { relation, neighbors });
        }
        Ok(NodeContext { node, relations: groups })
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("config", &self.config)
            .field("cache", &self.cache)
            .finish()
    }
}
