//! tekhne CLI: trust-aware reasoning over a technology knowledge graph.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use miette::{IntoDiagnostic, Result};

use tekhne::budget::Budget;
use tekhne::config::EngineConfig;
use tekhne::engine::Engine;
use tekhne::graph::memory::MemoryGraph;
use tekhne::graph::RelationType;
use tekhne::infer::InferOptions;
use tekhne::pathfind::PathOptions;
use tekhne::provenance::DerivationKind;
use tekhne::recommend::{Intent, RecommendOptions, SimilarFilter};
use tekhne::resolve::{CyclePolicy, ResolveOptions};

#[derive(Parser)]
#[command(name = "tekhne", version, about = "Trust-aware technology graph reasoning")]
struct Cli {
    /// Path to a JSON graph snapshot ({"nodes": [...], "edges": [...]}).
    #[arg(long, global = true)]
    graph: Option<PathBuf>,

    /// Path to a TOML engine configuration file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Minimum trust threshold, overriding the configured default.
    #[arg(long, global = true)]
    min_trust: Option<f64>,

    /// Query deadline in milliseconds.
    #[arg(long, global = true)]
    timeout_ms: Option<u64>,

    /// Maximum traversal steps per query.
    #[arg(long, global = true)]
    max_steps: Option<u64>,

    /// Emit results as pretty-printed JSON instead of text.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve the dependency chain of a node in install order.
    Deps {
        /// Node identifier.
        node: String,

        /// Maximum resolution depth.
        #[arg(long)]
        max_depth: Option<usize>,

        /// On a dependency cycle, return the orderable part instead of
        /// failing.
        #[arg(long)]
        acyclic_prefix: bool,
    },

    /// Find ranked paths between two nodes.
    Path {
        /// Source node identifier.
        source: String,

        /// Target node identifier.
        target: String,

        /// Maximum path length in hops.
        #[arg(long)]
        max_hops: Option<usize>,

        /// Only follow these relation types (comma-separated, e.g.
        /// "DEPENDS_ON,INTEGRATES_WITH").
        #[arg(long)]
        relations: Option<String>,

        /// Maximum number of paths to return.
        #[arg(long)]
        max_paths: Option<usize>,
    },

    /// Infer the probable relation(s) between two nodes.
    Infer {
        /// First node identifier.
        a: String,

        /// Second node identifier.
        b: String,
    },

    /// Recommend candidates for a node under an intent.
    Recommend {
        /// Node identifier.
        node: String,

        /// Intent: similar, alternative, or complement.
        #[arg(long, default_value = "similar")]
        intent: String,

        /// Number of results to return.
        #[arg(long, default_value = "5")]
        limit: usize,
    },

    /// Find nodes similar to a node, with optional filters.
    Similar {
        /// Node identifier.
        node: String,

        /// Restrict candidates to this category.
        #[arg(long)]
        category: Option<String>,

        /// Require at least one of these tags (comma-separated).
        #[arg(long)]
        tags: Option<String>,

        /// Number of results to return.
        #[arg(long, default_value = "5")]
        limit: usize,
    },

    /// Show a node and its immediate relations.
    Context {
        /// Node identifier.
        node: String,
    },

    /// Show graph statistics.
    Stats,
}

fn main() -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(3)
                .build(),
        )
    }))
    .ok(); // Ignore error if hook already set (e.g., in tests)

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => EngineConfig::from_toml_file(path)?,
        None => EngineConfig::default(),
    };
    if let Some(min_trust) = cli.min_trust {
        config.min_trust = min_trust;
    }
    let min_trust = cli.min_trust;

    let graph_path = cli
        .graph
        .as_ref()
        .ok_or_else(|| miette::miette!("--graph <FILE> is required"))?;
    let content = std::fs::read_to_string(graph_path).into_diagnostic()?;
    let graph = MemoryGraph::from_json(&content)?;
    let engine = Engine::new(Arc::new(graph), config)?;

    let mut budget = Budget::unlimited();
    if let Some(ms) = cli.timeout_ms {
        budget = budget.with_deadline(Duration::from_millis(ms));
    }
    if let Some(steps) = cli.max_steps {
        budget = budget.with_max_steps(steps);
    }

    match cli.command {
        Commands::Deps {
            node,
            max_depth,
            acyclic_prefix,
        } => {
            let opts = ResolveOptions {
                max_depth,
                min_trust,
                cycle_policy: if acyclic_prefix {
                    CyclePolicy::AcyclicPrefix
                } else {
                    CyclePolicy::Fail
                },
            };
            let chain = engine.resolve_dependencies_with_budget(&node, opts, &mut budget)?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&*chain).into_diagnostic()?);
            } else {
                println!("Install order for \"{node}\" ({} nodes):", chain.nodes.len());
                for (i, dep) in chain.nodes.iter().enumerate() {
                    println!(
                        "  {}. {} (depth {}, trust {:.2})",
                        i + 1,
                        dep.node.id,
                        dep.depth,
                        dep.trust
                    );
                }
                if let Some(cycle) = &chain.cycle {
                    println!("Cycle excluded: {}", cycle.join(" -> "));
                }
            }
        }

        Commands::Path {
            source,
            target,
            max_hops,
            relations,
            max_paths,
        } => {
            let relations = relations
                .map(|list| {
                    list.split(',')
                        .map(|s| s.trim().parse::<RelationType>())
                        .collect::<std::result::Result<Vec<_>, _>>()
                })
                .transpose()?;
            let opts = PathOptions {
                max_hops,
                relations,
                min_trust,
                max_paths,
            };
            let paths = engine.find_paths_with_budget(&source, &target, opts, &mut budget)?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&*paths).into_diagnostic()?);
            } else if paths.is_empty() {
                println!("No path from \"{source}\" to \"{target}\" within bounds.");
            } else {
                println!("Paths from \"{source}\" to \"{target}\" ({}):", paths.len());
                for (i, path) in paths.iter().enumerate() {
                    let mut route = path.source.clone();
                    for step in &path.steps {
                        route.push_str(&format!(" -[{}]-> {}", step.edge.relation, step.node.id));
                    }
                    println!(
                        "  {}. {route} (trust {:.2}, {} hops)",
                        i + 1,
                        path.trust,
                        path.hops()
                    );
                }
            }
        }

        Commands::Infer { a, b } => {
            let inferences = engine.infer_relation_with_budget(
                &a,
                &b,
                InferOptions { min_trust },
                &mut budget,
            )?;
            if cli.json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&*inferences).into_diagnostic()?
                );
            } else if inferences.is_empty() {
                println!("No relation inferred between \"{a}\" and \"{b}\".");
            } else {
                println!("Inferred relations between \"{a}\" and \"{b}\":");
                for inf in inferences.iter() {
                    let kind = match inf.kind {
                        DerivationKind::Asserted => "asserted",
                        _ => "inferred",
                    };
                    println!(
                        "  {} {} {} (confidence {:.4}, {kind}, {} path(s))",
                        inf.source,
                        inf.relation,
                        inf.target,
                        inf.confidence,
                        inf.paths.len()
                    );
                }
            }
        }

        Commands::Recommend { node, intent, limit } => {
            let intent: Intent = intent.parse()?;
            let opts = RecommendOptions {
                limit: Some(limit),
                min_trust,
            };
            let recs = engine.recommend_with_budget(&node, intent, opts, &mut budget)?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&*recs).into_diagnostic()?);
            } else if recs.is_empty() {
                println!("No {intent:?} candidates for \"{node}\".");
            } else {
                println!("Candidates for \"{node}\" ({intent:?}):");
                for (i, rec) in recs.iter().enumerate() {
                    println!(
                        "  {}. {} (score {:.4}, {:?})",
                        i + 1,
                        rec.node.id,
                        rec.score,
                        rec.breakdown.kind
                    );
                }
            }
        }

        Commands::Similar {
            node,
            category,
            tags,
            limit,
        } => {
            let filter = SimilarFilter {
                category,
                tags: tags.map(|t| t.split(',').map(|s| s.trim().to_string()).collect()),
            };
            let opts = RecommendOptions {
                limit: Some(limit),
                min_trust,
            };
            let recs = engine.find_similar_with_budget(&node, filter, opts, &mut budget)?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&*recs).into_diagnostic()?);
            } else if recs.is_empty() {
                println!("No similar nodes for \"{node}\".");
            } else {
                println!("Similar to \"{node}\":");
                for (i, rec) in recs.iter().enumerate() {
                    let signals: Vec<String> = rec
                        .breakdown
                        .signals
                        .iter()
                        .map(|s| format!("{}={:.2}", s.name, s.value))
                        .collect();
                    println!(
                        "  {}. {} (score {:.4}; {})",
                        i + 1,
                        rec.node.id,
                        rec.score,
                        signals.join(", ")
                    );
                }
            }
        }

        Commands::Context { node } => {
            let ctx = engine.node_context(&node)?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&ctx).into_diagnostic()?);
            } else {
                println!("{} ({})", ctx.node.name, ctx.node.id);
                if !ctx.node.category.is_empty() {
                    println!("  category: {}", ctx.node.category);
                }
                println!("  trust:    {:.2} ({:?})", ctx.node.trust, ctx.node.trust_level());
                for group in &ctx.relations {
                    println!("  {}:", group.relation);
                    for n in &group.neighbors {
                        let arrow = if n.outgoing { "->" } else { "<-" };
                        println!("    {arrow} {} (trust {:.2})", n.node.id, n.trust);
                    }
                }
            }
        }

        Commands::Stats => {
            let stats = engine.stats()?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&*stats).into_diagnostic()?);
            } else {
                println!("Nodes:         {}", stats.node_count);
                println!("Edges:         {}", stats.edge_count);
                println!("Average trust: {:.3}", stats.average_trust);
                if !stats.categories.is_empty() {
                    println!("Categories:");
                    for (category, count) in &stats.categories {
                        println!("  {category}: {count}");
                    }
                }
            }
        }
    }

    Ok(())
}
