use std::path::PathBuf;
use std::process::ExitCode;

use tracing_subscriber::EnvFilter;

use track_router::cache::SegmentCache;
use track_router::graph::{DestinationTiles, LayoutError, LayoutFile};
use track_router::planner::{Origin, Planner, RoutePlan, SearchConfig, SearchError, SearchRequest};

/// Errors surfaced by the command line front-end.
#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Layout(#[from] LayoutError),

    /// Config file could not be read
    #[error("failed to read {path}: {source}")]
    ReadConfig {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Config file is not valid
    #[error("failed to parse {path}: {source}")]
    ParseConfig {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("layout has no destinations")]
    NoDestinations,

    #[error(transparent)]
    Search(#[from] SearchError),
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let (layout_path, config_path) = match args.as_slice() {
        [layout] => (layout, None),
        [layout, config] => (layout, Some(config)),
        _ => {
            eprintln!("Usage: track-router <layout.json> [config.json]");
            return ExitCode::from(2);
        }
    };

    match run(layout_path, config_path) {
        Ok(plan) => {
            print_plan(&plan);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(layout_path: &str, config_path: Option<&String>) -> Result<RoutePlan, CliError> {
    let file = LayoutFile::load(layout_path)?;
    let config = match config_path {
        Some(path) => load_config(path)?,
        None => SearchConfig::default(),
    };

    if file.destinations.is_empty() {
        return Err(CliError::NoDestinations);
    }

    let layout = file.build();
    let destination = DestinationTiles::new(file.destinations.iter().copied());
    let origins: Vec<Origin> = file
        .origins
        .iter()
        .map(|o| Origin::new(o.pos, o.cost))
        .collect();

    let planner = Planner::new(&layout, &layout, &config);
    let request = SearchRequest::new(&origins, &destination);
    let mut cache = SegmentCache::default();

    Ok(planner.search(&request, &mut cache)?)
}

fn load_config(path: &str) -> Result<SearchConfig, CliError> {
    let json = std::fs::read_to_string(path).map_err(|source| CliError::ReadConfig {
        path: path.into(),
        source,
    })?;
    SearchConfig::from_json(&json).map_err(|source| CliError::ParseConfig {
        path: path.into(),
        source,
    })
}

fn print_plan(plan: &RoutePlan) {
    println!("Route from {} costing {}:", plan.origin, plan.cost);
    for pos in &plan.path {
        println!("  {pos}");
    }
    if let Some(choice) = plan.first_choice {
        println!("First choice: {choice}");
    }
    println!(
        "Nodes: {} created, {} expanded. Segment cache: {} hits, {} misses.",
        plan.stats.nodes_created,
        plan.stats.nodes_closed,
        plan.stats.cache_hits,
        plan.stats.cache_misses
    );
}
