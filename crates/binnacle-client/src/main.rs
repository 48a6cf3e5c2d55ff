mod evaluator;
mod pipeline;
mod transport;

use std::path::PathBuf;
use std::time::Duration;

use binnacle_core::config::Config;
use binnacle_core::{Archive, GeneSchema, Metrics};
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use evaluator::Evaluator;
use transport::ServerTransport;

#[derive(Parser, Debug)]
#[command(author, version, about = "Candidate-generation and evaluation client")]
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

    if let Err(e) = run(config) {
        error!(error = %e, "client exited with an error");
        std::process::exit(1);
    }
}

fn run(config: Config) -> Result<(), binnacle_error::BinnacleError> {
    config.work_dir.ensure_subdirs()?;

    let schema = GeneSchema::from_file(&config.gene_template)?;
    let metrics = Metrics::from_config(&config.fitness);
    let weights = config.mutators.to_weights();
    let archive = Archive::new(
        metrics.clone(),
        config.run.optimization_strategy_maximize,
        config.run.individuals_per_bin,
    );
    let evaluator = Evaluator::new(
        config.command.clone(),
        config.environment.clone(),
        config.work_dir.workdir_dir(),
        config.metrics_location.clone(),
        Duration::from_secs(config.workers.max_run_time_secs),
    );
    let transport = ServerTransport::new(&config.server.host, config.server.port);

    info!(host = %config.server.host, port = config.server.port, "starting client pipeline");

    let runtime = tokio::runtime::Runtime::new().map_err(|e| binnacle_error::BinnacleError::Io {
        message: format!("failed to start tokio runtime: {e}").into(),
        source: Some(e),
    })?;

    runtime.block_on(async move {
        pipeline::run(config, metrics, schema, weights, archive, evaluator, transport, shutdown_signal()).await;
    });

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c().await.ok();
    };

    #[cfg(unix)]
    let terminate = async {
        if let Ok(mut signal) = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            signal.recv().await;
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
