//! SurfsUp Climate Service - HTTP API
//!
//! Serves precipitation, station, temperature observation and trip
//! statistics from a read-only PostgreSQL copy of the Hawaii climate
//! dataset.
//!
//! Startup:
//! 1. Load configuration (surfsup.toml, optional) and DATABASE_URL (.env)
//! 2. Check the live tables against the declared dataset layout
//! 3. Resolve the dataset's date window
//! 4. Serve HTTP until the listener closes
//!
//! Usage:
//!   cargo run --release                      # Serve on the configured port
//!   cargo run --release -- --port 8080       # Override the port
//!   cargo run --release -- --check-schema    # Verify the dataset and exit
//!
//! Environment:
//!   DATABASE_URL - PostgreSQL connection string

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use surfsup_service::config::ServiceConfig;
use surfsup_service::db;
use surfsup_service::endpoint;
use surfsup_service::schema::SCHEMA_VERSION;
use surfsup_service::service::QueryService;
use surfsup_service::store::PgStore;

/// Hawaii climate data API
#[derive(Parser, Debug)]
#[command(name = "surfsup_service")]
#[command(about = "Read-only HTTP API over the Hawaii climate dataset")]
struct Args {
    /// Configuration file (defaults to ./surfsup.toml when present)
    #[arg(short, long, env = "SURFSUP_CONFIG")]
    config: Option<PathBuf>,

    /// Listen port, overrides server.port
    #[arg(short, long, env = "SURFSUP_PORT")]
    port: Option<u16>,

    /// Request worker threads, overrides server.workers
    #[arg(long, env = "SURFSUP_WORKERS")]
    workers: Option<usize>,

    /// Verify the dataset layout and exit
    #[arg(long)]
    check_schema: bool,

    /// Log level
    #[arg(long, default_value = "info", env = "RUST_LOG")]
    log_level: String,
}

fn main() -> ExitCode {
    dotenv::dotenv().ok();
    let args = Args::parse();

    let filter = EnvFilter::try_new(&args.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = ServiceConfig::load(args.config.as_deref())?;
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(workers) = args.workers {
        config.server.workers = workers;
    }
    config.validate()?;

    info!(schema_version = SCHEMA_VERSION, schema = %config.dataset.schema, "verifying dataset layout");
    let db_config = db::config_from_env()?;
    db::connect_and_verify(&db_config, &config.dataset.schema)?;

    if args.check_schema {
        info!("dataset layout matches schema version {}", SCHEMA_VERSION);
        return Ok(());
    }

    let store = PgStore::new(db_config, config.dataset.schema.clone());
    let service = Arc::new(QueryService::new(store, &config.dataset)?);

    endpoint::start_endpoint_server(&config.listen_address(), config.server.workers, service)?;
    Ok(())
}
