//! rentscope - Swiss Rental Price & Salary Survey Explorer
//!
//! Loads the rent and salary survey tables and prints the statistics of one
//! dashboard page as text tables or JSON.

mod cli;
mod config;
mod data;
mod pages;
mod stats;

use anyhow::{Context, Result};
use cli::Args;
use config::Config;
use data::DataStore;
use pages::{PageRenderer, PageRequest};
use stats::MetricsEngine;
use tracing::{debug, error, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

fn main() {
    let args = Args::parse_args();
    init_logging(&args);

    info!("rentscope v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);

    if let Err(e) = run(args) {
        error!("{:#}", e);
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

/// Initialize logging; `RUST_LOG` takes precedence over `-v` / `-q`.
fn init_logging(args: &Args) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(args.log_level().to_string().to_lowercase()));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .finish();

    if tracing::subscriber::set_global_default(subscriber).is_err() {
        eprintln!("Warning: logging was already initialized");
    }
}

fn run(args: Args) -> Result<()> {
    let mut config = Config::load(args.config.as_deref())?;
    config.merge_with_args(&args);
    debug!("Configuration: {:?}", config);

    let store = DataStore::new(&config.data.rent_file, &config.data.salary_file);
    let rent = store.rent().context("Could not load the rent table")?;
    let salary = store.salary().context("Could not load the salary table")?;
    info!(
        "Loaded {} rent rows and {} salary rows",
        rent.len(),
        salary.len()
    );
    if rent.is_empty() || salary.is_empty() {
        warn!("A survey table has no data rows; pages will show no data");
    }

    let engine = MetricsEngine::new(rent, salary);
    let request = PageRequest {
        page: args.page,
        region: args.region.clone(),
        cantons: args.cantons.clone(),
        change_from_year: config.view.change_from_year,
        change_to_year: config.view.change_to_year,
        default_canton_count: config.view.default_canton_count,
        normalize: config.view.normalize,
    };

    let view = pages::build_page(&engine, &request);
    let output = PageRenderer::render(&view, args.format).context("Failed to render page")?;
    println!("{output}");
    Ok(())
}
