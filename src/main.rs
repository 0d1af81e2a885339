use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Instant;

use clap::Parser;
use serde::Serialize;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use edge_boundary::config::BoundaryConfig;
use edge_boundary::{
    BoundaryError, EdgeBoundaryAlgo, EdgeBoundaryConfig, EdgeBoundaryController, PartitionedGraph,
};

#[derive(Parser, Debug, Serialize)]
#[command(author, version, about)]
struct Args {
    /// Graph file, or the name of a graph under data/ (data/<name>.graph).
    #[arg(short, long, default_value_t = String::from("example"))]
    dataset: String,

    /// JSON array of source vertex ids.
    #[arg(long)]
    nbunch1: String,

    /// JSON array of target vertex ids. Without it, edges leaving nbunch1 are reported.
    #[arg(long)]
    nbunch2: Option<String>,

    /// Number of fragments, overrides the config file.
    #[arg(short, long)]
    fragment_num: Option<usize>,

    /// Coordinator fragment id, overrides the config file.
    #[arg(long)]
    coordinator: Option<usize>,

    /// YAML config file.
    #[arg(short, long)]
    config: Option<String>,
}

fn run(args: Args) -> Result<(), BoundaryError> {
    let mut config = match args.config.as_deref() {
        Some(config_path) => BoundaryConfig::from_yaml_file(config_path)?,
        None => BoundaryConfig::default(),
    };
    if let Some(fragment_num) = args.fragment_num {
        config.fragment_num = fragment_num;
    }
    if let Some(coordinator) = args.coordinator {
        config.coordinator = coordinator;
    }
    config.validate()?;

    let graph_path = if Path::new(&args.dataset).is_file() {
        args.dataset.clone()
    } else {
        format!("data/{}.graph", args.dataset)
    };

    // Step 1. Load and partition the graph.
    let start = Instant::now();
    let graph = PartitionedGraph::from_graph_file(&graph_path, config.fragment_num)?;
    info!(
        path = %graph_path,
        fnum = graph.fnum(),
        elapsed_us = start.elapsed().as_micros() as u64,
        "graph partitioned"
    );

    // Step 2. Compute the boundary.
    let controller = EdgeBoundaryController::new(Arc::new(graph));
    let start = Instant::now();
    let matrix = controller.edge_boundary(
        &args.nbunch1,
        args.nbunch2.as_deref(),
        EdgeBoundaryConfig {
            coordinator: config.coordinator,
        },
    )?;
    info!(
        edges = matrix.edge_count(),
        elapsed_us = start.elapsed().as_micros() as u64,
        "edge boundary computed"
    );

    println!("{}", serde_json::to_string(&matrix).map_err(std::io::Error::from)?);
    Ok(())
}

fn main() -> ExitCode {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let args: Args = Args::parse();
    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(error = %err, "edge boundary failed");
            ExitCode::FAILURE
        }
    }
}
