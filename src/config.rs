//! Engine configuration.
//!
//! Every policy constant the reasoning algorithms use lives here — trust
//! thresholds, depth bounds, decay factors, similarity weights, cache
//! sizing — so deployments can tune them without touching the algorithms.
//! Loadable from TOML; unspecified fields take their defaults.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::trust::DEFAULT_MIN_TRUST;

/// Weights for the similarity composite score plus the short-circuit score
/// for directly asserted SIMILAR_TO edges.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimilarityWeights {
    /// Weight of tag Jaccard overlap.
    pub tag_jaccard: f64,
    /// Weight of the same-category boolean.
    pub same_category: f64,
    /// Weight of the candidate's own trust score.
    pub node_trust: f64,
    /// Fixed score for candidates connected by a direct SIMILAR_TO edge; an
    /// asserted fact outranks any derived heuristic.
    pub direct_edge_score: f64,
}

impl Default for SimilarityWeights {
    fn default() -> Self {
        Self {
            tag_jaccard: 0.5,
            same_category: 0.3,
            node_trust: 0.2,
            direct_edge_score: 0.95,
        }
    }
}

/// Query cache sizing and lifetime.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Whether the read-through query cache is used at all.
    pub enabled: bool,
    /// Maximum number of cached query results.
    pub capacity: u64,
    /// Entry time-to-live in seconds. Graph facts change infrequently
    /// relative to query volume, so a short TTL is enough.
    pub ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            capacity: 1024,
            ttl_secs: 30,
        }
    }
}

/// Configuration for the tekhne engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Default minimum trust threshold, overridable per request.
    pub min_trust: f64,
    /// Default dependency-resolution depth bound. An unset per-request
    /// bound falls back to this; traversal is never unbounded.
    pub max_depth: usize,
    /// Default path-search hop bound.
    pub max_hops: usize,
    /// Hop bound at or above which path search switches to bidirectional
    /// meet-in-the-middle.
    pub bidirectional_from_hops: usize,
    /// Maximum number of paths returned per path query.
    pub max_paths: usize,
    /// Confidence decay per inference hop beyond the first.
    pub decay_per_hop: f64,
    /// Extra confidence penalty for the common-integration-point rule.
    pub integration_penalty: f64,
    /// Neighborhood radius (hops) for similarity candidate gathering.
    pub neighborhood_depth: usize,
    /// Similarity composite weights.
    pub similarity: SimilarityWeights,
    /// Query cache settings.
    pub cache: CacheConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            min_trust: DEFAULT_MIN_TRUST,
            max_depth: 5,
            max_hops: 4,
            bidirectional_from_hops: 4,
            max_paths: 5,
            decay_per_hop: 0.8,
            integration_penalty: 0.75,
            neighborhood_depth: 2,
            similarity: SimilarityWeights::default(),
            cache: CacheConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, EngineError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| EngineError::ConfigIo {
            path: path.display().to_string(),
            source,
        })?;
        let config: Self = toml::from_str(&raw).map_err(|source| EngineError::ConfigParse {
            path: path.display().to_string(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Validate value ranges.
    pub fn validate(&self) -> Result<(), EngineError> {
        let unit = |name: &str, v: f64| {
            if (0.0..=1.0).contains(&v) {
                Ok(())
            } else {
                Err(EngineError::InvalidConfig {
                    message: format!("{name} must be in [0, 1], got {v}"),
                })
            }
        };
        unit("min_trust", self.min_trust)?;
        unit("decay_per_hop", self.decay_per_hop)?;
        unit("integration_penalty", self.integration_penalty)?;
        unit("similarity.tag_jaccard", self.similarity.tag_jaccard)?;
        unit("similarity.same_category", self.similarity.same_category)?;
        unit("similarity.node_trust", self.similarity.node_trust)?;
        unit("similarity.direct_edge_score", self.similarity.direct_edge_score)?;
        if self.max_depth == 0 {
            return Err(EngineError::InvalidConfig {
                message: "max_depth must be > 0".into(),
            });
        }
        if self.max_hops == 0 {
            return Err(EngineError::InvalidConfig {
                message: "max_hops must be > 0".into(),
            });
        }
        Ok(())
    }
}
