//! Read-through query cache.
//!
//! Query results are cached keyed by the full parameter set, so two calls
//! differing only in a threshold never share an entry. Population is
//! single-flight: concurrent misses for one key collapse onto a single
//! underlying computation, and the waiters share its result. Only
//! successes are cached; a failed computation is reported to every
//! coalesced caller and the next request recomputes. Entries expire on a
//! short TTL rather than by invalidation, which keeps graph mutation
//! cheap.

use std::sync::Arc;
use std::time::Duration;

use crate::config::CacheConfig;
use crate::error::TekhneError;
use crate::graph::{GraphStats, RelationType};
use crate::infer::Inference;
use crate::pathfind::Path;
use crate::recommend::{Intent, Recommendation};
use crate::resolve::{CyclePolicy, DependencyChain};

/// Full identity of a query. Float thresholds are keyed by their bit
/// pattern; the engine only ever passes values already clamped to [0, 1].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum QueryKey {
    Resolve {
        root: String,
        max_depth: usize,
        min_trust_bits: u64,
        cycle_policy: CyclePolicy,
    },
    Paths {
        source: String,
        target: String,
        max_hops: usize,
        relations: Option<Vec<RelationType>>,
        min_trust_bits: u64,
        max_paths: usize,
    },
    Infer {
        a: String,
        b: String,
        min_trust_bits: u64,
    },
    Recommend {
        id: String,
        intent: Intent,
        limit: usize,
        min_trust_bits: u64,
    },
    Similar {
        id: String,
        category: Option<String>,
        tags: Option<Vec<String>>,
        limit: usize,
        min_trust_bits: u64,
    },
    Stats,
}

/// A cached query result.
#[derive(Debug, Clone)]
pub enum QueryValue {
    Chain(Arc<DependencyChain>),
    Paths(Arc<Vec<Path>>),
    Inferences(Arc<Vec<Inference>>),
    Recommendations(Arc<Vec<Recommendation>>),
    Stats(Arc<GraphStats>),
}

/// TTL-bounded query cache. Disabled configurations get a no-op cache so
/// call sites never branch.
pub struct QueryCache {
    inner: Option<moka::sync::Cache<QueryKey, QueryValue>>,
}

impl QueryCache {
    pub fn new(config: &CacheConfig) -> Self {
        let inner = config.enabled.then(|| {
            moka::sync::Cache::builder()
                .max_capacity(config.capacity)
                .time_to_live(Duration::from_secs(config.ttl_secs))
                .build()
        });
        Self { inner }
    }

    /// Return the cached value for `key`, computing and caching it with
    /// `init` on a miss. Concurrent misses for the same key run `init`
    /// once; the other callers wait and share the outcome. Errors are
    /// never cached.
    pub fn get_or_compute<F>(&self, key: QueryKey, init: F) -> Result<QueryValue, TekhneError>
    where
        F: FnOnce() -> Result<QueryValue, TekhneError>,
    {
        match &self.inner {
            Some(cache) => cache
                .try_get_with(key, init)
                .map_err(TekhneError::from_shared),
            None => init(),
        }
    }

    /// Drop all entries, e.g. after a batch of graph mutations.
    pub fn invalidate_all(&self) {
        if let Some(ref cache) = self.inner {
            cache.invalidate_all();
        }
    }
}

impl std::fmt::Debug for QueryCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryCache")
            .field("enabled", &self.inner.is_some())
            .finish()
    }
}
