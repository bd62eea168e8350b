//! Driver binary: load schema, build the graph, load transformations,
//! apply rules, report final stats (§10.3).

mod args;
mod error;

use clap::Parser;
use lpg_expr_lang::SystemClock;
use lpg_rule_engine::{NeverCancelled, RuleEngine};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use args::Args;
use error::CliError;

fn main() {
    let args = Args::parse();
    init_tracing(args.verbose);

    let exit_code = match run(&args) {
        Ok(()) => 0,
        Err(err) => {
            tracing::error!(error = %err, "run failed");
            err.exit_code()
        }
    };
    std::process::exit(exit_code);
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("lpg={default_level}")));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn run(args: &Args) -> Result<(), CliError> {
    let loader = lpg_metadata_loader::MetadataLoader::new();
    let schema = loader.load_schema(&args.schema)?;
    let doc = loader.load_transformations(&args.transformations)?;

    let clock = SystemClock;
    let mut graph = lpg_builder::GraphBuilder::new(&args.base_path, &clock).build(&schema)?;

    let engine = RuleEngine::new(&clock);
    let outcomes = engine.apply_all(&mut graph, &doc, &NeverCancelled)?;

    let stats = graph.stats();
    tracing::info!(
        total_nodes = stats.total_nodes,
        total_edges = stats.total_edges,
        rules_applied = outcomes.len(),
        "run complete"
    );
    println!("nodes: {}", stats.total_nodes);
    for (label, count) in &stats.nodes_by_label {
        println!("  {label}: {count}");
    }
    println!("edges: {}", stats.total_edges);
    for (label, count) in &stats.edges_by_label {
        println!("  {label}: {count}");
    }
    println!("rules applied: {}", outcomes.len());

    Ok(())
}
