use std::net::SocketAddr;
use std::path::PathBuf;

use binnacle_core::{Archive, Config, GeneSchema, Metrics};
use binnacle_server::{app_router, AppState};
use clap::Parser;
use tokio::net::TcpListener;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Central archive server for the binnacle optimizer")]
struct Args {
    #[arg(long, default_value = "config.yml")]
    config: PathBuf,

    #[arg(long)]
    log_level: Option<String>,
}

fn main() {
    let args = Args::parse();

    let config = match Config::from_file(&args.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("failed to load config from {}: {e}", args.config.display());
            std::process::exit(1);
        }
    };

    let filter = args
        .log_level
        .or_else(|| config.log_level.clone())
        .unwrap_or_else(|| "info".to_string());
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(&filter).unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(runtime) => runtime,
        Err(e) => {
            error!(error = %e, "failed to start tokio runtime");
            std::process::exit(1);
        }
    };

    if let Err(e) = runtime.block_on(run(config)) {
        error!(error = %e, "server exited with an error");
        std::process::exit(1);
    }
}

async fn run(config: Config) -> Result<(), binnacle_error::BinnacleError> {
    config.work_dir.ensure_subdirs()?;

    // Parsed for its fatal-on-malformed-schema side effect; the server itself
    // only bins on `fitness`, but should refuse to start against a broken schema.
    GeneSchema::from_file(&config.gene_template)?;
    let metrics = Metrics::from_config(&config.fitness);
    let archive = Archive::new(
        metrics,
        config.run.optimization_strategy_maximize,
        config.run.individuals_per_bin,
    );

    let host = config.server.host.clone();
    let port = config.server.port;
    let state = AppState::new(config, archive);

    tokio::spawn(binnacle_server::snapshot::run(state.clone()));

    let app = app_router(state);

    let addr: SocketAddr = format!("{host}:{port}")
        .parse()
        .map_err(|e| binnacle_error::BinnacleError::InvalidParameter {
            message: format!("invalid server bind address {host}:{port}: {e}").into(),
        })?;

    let listener = TcpListener::bind(addr).await?;
    info!(%addr, "binnacle server listening");

    axum::serve(listener, app)
        .await
        .map_err(|e| binnacle_error::BinnacleError::Io {
            message: format!("server loop exited: {e}").into(),
            source: Some(e),
        })
}
