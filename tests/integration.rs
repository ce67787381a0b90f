//! End-to-end tests through the engine facade, on a realistic technology
//! graph.

use std::sync::Arc;

use tekhne::config::EngineConfig;
use tekhne::engine::Engine;
use tekhne::error::TekhneError;
use tekhne::graph::memory::MemoryGraph;
use tekhne::graph::{Edge, Node, RelationType};
use tekhne::infer::InferOptions;
use tekhne::pathfind::PathOptions;
use tekhne::provenance::DerivationKind;
use tekhne::recommend::{Intent, RecommendOptions, SimilarFilter};
use tekhne::resolve::{CyclePolicy, ResolveOptions};

/// A small but connected technology landscape: caches, databases, web
/// frameworks and their runtimes.
fn landscape() -> Arc<MemoryGraph> {
    let g = MemoryGraph::new();

    let nodes = [
        ("redis", "database", &["cache", "kv", "in-memory"][..], 0.95),
        ("memcached", "database", &["cache", "kv", "in-memory"], 0.85),
        ("valkey", "database", &["cache", "kv", "in-memory"], 0.8),
        ("postgres", "database", &["sql", "relational"], 0.95),
        ("mysql", "database", &["sql", "relational"], 0.9),
        ("django", "framework", &["web", "python"], 0.9),
        ("flask", "framework", &["web", "python"], 0.85),
        ("python", "language", &[][..], 0.95),
        ("celery", "queue", &["tasks", "python"], 0.8),
    ];
    for (id, category, tags, trust) in nodes {
        g.insert_node(
            Node::new(id, id.to_uppercase())
                .with_category(category)
                .with_tags(tags.iter().copied())
                .with_trust(trust),
        )
        .unwrap();
    }

    let edges = [
        ("django", RelationType::DependsOn, "python", 0.95),
        ("flask", RelationType::DependsOn, "python", 0.95),
        ("celery", RelationType::DependsOn, "python", 0.9),
        ("celery", RelationType::DependsOn, "redis", 0.85),
        ("django", RelationType::IntegratesWith, "postgres", 0.9),
        ("django", RelationType::IntegratesWith, "redis", 0.8),
        ("flask", RelationType::IntegratesWith, "redis", 0.75),
        ("redis", RelationType::AlternativeTo, "memcached", 0.9),
        ("redis", RelationType::AlternativeTo, "valkey", 0.95),
        ("postgres", RelationType::AlternativeTo, "mysql", 0.85),
        ("django", RelationType::AlternativeTo, "flask", 0.8),
    ];
    for (s, rel, t, trust) in edges {
        g.insert_edge(Edge::new(s, rel, t).with_trust(trust)).unwrap();
    }

    Arc::new(g)
}

fn engine() -> Engine {
    Engine::new(landscape(), EngineConfig::default()).unwrap()
}

#[test]
fn dependency_chain_is_topologically_valid() {
    let engine = engine();
    let chain = engine.resolve_dependencies("celery", Default::default()).unwrap();
    let ids: Vec<&str> = chain.nodes.iter().map(|d| d.node.id.as_str()).collect();
    let pos = |id: &str| ids.iter().position(|&x| x == id).unwrap();
    assert!(pos("python") < pos("celery"));
    assert!(pos("redis") < pos("celery"));
    assert_eq!(*ids.last().unwrap(), "celery");
    // No node appears twice.
    let mut sorted = ids.clone();
    sorted.sort();
    sorted.dedup();
    assert_eq!(sorted.len(), ids.len());
}

#[test]
fn dependency_cycle_is_reported_with_sequence() {
    let g = MemoryGraph::new();
    for id in ["a", "b"] {
        g.insert_node(Node::new(id, id.to_uppercase())).unwrap();
    }
    g.insert_edge(Edge::new("a", RelationType::DependsOn, "b").with_trust(0.9))
        .unwrap();
    g.insert_edge(Edge::new("b", RelationType::DependsOn, "a").with_trust(0.9))
        .unwrap();
    let engine = Engine::new(Arc::new(g), EngineConfig::default()).unwrap();

    let err = engine.resolve_dependencies("a", Default::default()).unwrap_err();
    match err {
        TekhneError::Resolve(tekhne::error::ResolveError::CycleDetected { cycle }) => {
            assert_eq!(cycle, vec!["a", "b", "a"]);
        }
        other => panic!("expected cycle error, got {other:?}"),
    }

    let chain = engine
        .resolve_dependencies(
            "a",
            ResolveOptions {
                cycle_policy: CyclePolicy::AcyclicPrefix,
                ..Default::default()
            },
        )
        .unwrap();
    assert!(chain.cycle.is_some());
}

#[test]
fn direct_edge_path_carries_edge_trust() {
    let engine = engine();
    let paths = engine.find_paths("celery", "redis", Default::default()).unwrap();
    assert!(!paths.is_empty());
    assert_eq!(paths[0].hops(), 1);
    assert!((paths[0].trust - 0.85).abs() < 1e-9);
}

#[test]
fn reflexive_path_query_is_trivial() {
    let engine = engine();
    let paths = engine.find_paths("redis", "redis", Default::default()).unwrap();
    assert_eq!(paths.len(), 1);
    assert_eq!(paths[0].hops(), 0);
    assert_eq!(paths[0].trust, 1.0);
}

#[test]
fn unconnected_within_one_hop_is_empty_not_error() {
    let engine = engine();
    let paths = engine
        .find_paths(
            "memcached",
            "postgres",
            PathOptions {
                max_hops: Some(1),
                min_trust: Some(0.0),
                ..Default::default()
            },
        )
        .unwrap();
    assert!(paths.is_empty());
}

#[test]
fn shared_dependency_inference_is_bounded() {
    let engine = engine();
    // django and flask both depend on python.
    let inferences = engine
        .infer_relation("django", "flask", InferOptions { min_trust: Some(0.0) })
        .unwrap();
    let similar = inferences
        .iter()
        .find(|i| i.relation == RelationType::SimilarTo)
        .expect("shared dependency should license SIMILAR_TO");
    assert_eq!(similar.kind, DerivationKind::Composed);
    // Confidence never exceeds the weakest supporting edge, nor 1.0.
    assert!(similar.confidence <= 0.95);
    assert!(similar.confidence < 1.0);
    assert!(!similar.paths.is_empty());
    // The direct ALTERNATIVE_TO edge is also reported, as asserted.
    let asserted = inferences
        .iter()
        .find(|i| i.kind == DerivationKind::Asserted)
        .expect("direct edge should be reported");
    assert_eq!(asserted.relation, RelationType::AlternativeTo);
    assert!((asserted.confidence - 0.8).abs() < 1e-9);
}

#[test]
fn recommend_never_returns_the_subject() {
    let engine = engine();
    for intent in [Intent::Similar, Intent::Alternative, Intent::Complement] {
        let recs = engine
            .recommend(
                "redis",
                intent,
                RecommendOptions {
                    limit: Some(5),
                    min_trust: Some(0.0),
                },
            )
            .unwrap();
        assert!(
            recs.iter().all(|r| r.node.id != "redis"),
            "subject returned for {intent:?}"
        );
    }
}

#[test]
fn alternatives_rank_by_edge_trust() {
    let engine = engine();
    let recs = engine
        .recommend("redis", Intent::Alternative, Default::default())
        .unwrap();
    let direct: Vec<&str> = recs
        .iter()
        .filter(|r| r.breakdown.kind == DerivationKind::Asserted)
        .map(|r| r.node.id.as_str())
        .collect();
    // valkey's edge (0.95) outranks memcached's (0.9).
    assert_eq!(direct, vec!["valkey", "memcached"]);
}

#[test]
fn similarity_scores_are_explained() {
    let engine = engine();
    let recs = engine
        .find_similar(
            "redis",
            SimilarFilter::default(),
            RecommendOptions {
                limit: Some(10),
                min_trust: Some(0.0),
            },
        )
        .unwrap();
    assert!(!recs.is_empty());
    for rec in recs.iter() {
        assert!(!rec.breakdown.signals.is_empty(), "unexplained score");
        assert!((0.0..=1.0).contains(&rec.score));
    }
}

#[test]
fn category_filter_restricts_similarity() {
    let engine = engine();
    let recs = engine
        .find_similar(
            "django",
            SimilarFilter {
                category: Some("framework".into()),
                tags: None,
            },
            RecommendOptions {
                limit: Some(10),
                min_trust: Some(0.0),
            },
        )
        .unwrap();
    assert!(recs.iter().all(|r| r.node.category == "framework"));
}

#[test]
fn raising_min_trust_is_monotone_across_operations() {
    let engine = engine();

    let chain_count = |t: f64| {
        engine
            .resolve_dependencies(
                "celery",
                ResolveOptions {
                    min_trust: Some(t),
                    ..Default::default()
                },
            )
            .unwrap()
            .nodes
            .len()
    };
    assert!(chain_count(0.9) <= chain_count(0.5));

    let path_count = |t: f64| {
        engine
            .find_paths(
                "django",
                "redis",
                PathOptions {
                    min_trust: Some(t),
                    ..Default::default()
                },
            )
            .unwrap()
            .len()
    };
    assert!(path_count(0.9) <= path_count(0.5));

    let rec_count = |t: f64| {
        engine
            .recommend(
                "redis",
                Intent::Similar,
                RecommendOptions {
                    limit: Some(10),
                    min_trust: Some(t),
                },
            )
            .unwrap()
            .len()
    };
    assert!(rec_count(0.9) <= rec_count(0.5));
}

#[test]
fn ranked_output_is_deterministic() {
    let engine = engine();
    let run = || {
        engine
            .find_paths(
                "django",
                "redis",
                PathOptions {
                    min_trust: Some(0.0),
                    ..Default::default()
                },
            )
            .unwrap()
            .iter()
            .map(|p| {
                p.node_ids()
                    .iter()
                    .map(|s| s.to_string())
                    .collect::<Vec<_>>()
            })
            .collect::<Vec<_>>()
    };
    assert_eq!(run(), run());
}

#[test]
fn missing_node_is_a_not_found_error_everywhere() {
    let engine = engine();
    assert!(engine.resolve_dependencies("ghost", Default::default()).is_err());
    assert!(engine.find_paths("ghost", "redis", Default::default()).is_err());
    assert!(engine
        .infer_relation("ghost", "redis", Default::default())
        .is_err());
    assert!(engine
        .recommend("ghost", Intent::Similar, Default::default())
        .is_err());
    assert!(engine.node_context("ghost").is_err());
}

#[test]
fn stats_reflect_the_landscape() {
    let engine = engine();
    let stats = engine.stats().unwrap();
    assert_eq!(stats.node_count, 9);
    assert_eq!(stats.edge_count, 11);
    assert!(stats.average_trust > 0.0);
    let databases = stats
        .categories
        .iter()
        .find(|(c, _)| c == "database")
        .map(|&(_, n)| n);
    assert_eq!(databases, Some(5));
}

#[test]
fn snapshot_json_round_trips_through_the_engine() {
    let json = r#"{
        "nodes": [
            {"id": "nginx", "name": "NGINX", "category": "proxy", "trust": 0.95},
            {"id": "haproxy", "name": "HAProxy", "category": "proxy", "trust": 0.9}
        ],
        "edges": [
            {"source": "nginx", "relation": "ALTERNATIVE_TO", "target": "haproxy", "trust": 0.9}
        ]
    }"#;
    let graph = MemoryGraph::from_json(json).unwrap();
    let engine = Engine::new(Arc::new(graph), EngineConfig::default()).unwrap();
    let recs = engine
        .recommend("nginx", Intent::Alternative, Default::default())
        .unwrap();
    assert_eq!(recs[0].node.id, "haproxy");
}
