//! The event loop: a producer/heartbeat task keeps a bounded ready queue full
//! and dispatches into a fixed-size worker pool; a sync task periodically pulls
//! the server frontier into the local archive.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use binnacle_core::config::Config;
use binnacle_core::{Archive, GeneSchema, Metrics, MutatorWeights};
use tokio::sync::{mpsc, Mutex, Semaphore};
use tracing::{info, instrument, warn};

use crate::evaluator::Evaluator;
use crate::transport::ServerTransport;

const PRODUCER_INTERVAL: Duration = Duration::from_millis(200);
const SYNC_INTERVAL: Duration = Duration::from_secs(360);

struct Shared {
    archive: Mutex<Archive>,
    trials_since_last_hi: AtomicU64,
    schema: GeneSchema,
    weights: MutatorWeights,
    evaluator: Evaluator,
    transport: ServerTransport,
    pool: Semaphore,
    metrics: Metrics,
    maximize: bool,
    amount_per_bin: usize,
}

/// Drives the client loop until `shutdown` resolves (a ctrl-c / SIGTERM future).
pub async fn run(
    config: Config,
    metrics: Metrics,
    schema: GeneSchema,
    weights: MutatorWeights,
    archive: Archive,
    evaluator: Evaluator,
    transport: ServerTransport,
    shutdown: impl std::future::Future<Output = ()>,
) {
    let queue_capacity = config.workers.over_fill_executor.max(1);
    let pool_size = config.workers.max_workers.max(1);
    let maximize = config.run.optimization_strategy_maximize;
    let amount_per_bin = config.run.individuals_per_bin;

    let shared = Arc::new(Shared {
        archive: Mutex::new(archive),
        trials_since_last_hi: AtomicU64::new(0),
        schema,
        weights,
        evaluator,
        transport,
        pool: Semaphore::new(pool_size),
        metrics,
        maximize,
        amount_per_bin,
    });

    let (ready_tx, ready_rx) = mpsc::channel(queue_capacity);
    let inflight = Arc::new(AtomicU64::new(0));
    let pool_size_u64 = pool_size as u64;
    let queue_capacity_u64 = queue_capacity as u64;

    let producer = tokio::spawn(producer_loop(
        shared.clone(),
        ready_tx,
        inflight.clone(),
        pool_size_u64 + queue_capacity_u64,
    ));
    let dispatcher = tokio::spawn(dispatch_loop(shared.clone(), ready_rx, inflight));
    let syncer = tokio::spawn(sync_loop(shared.clone()));

    shutdown.await;
    info!("shutdown signal received, cancelling client tasks");
    producer.abort();
    dispatcher.abort();
    syncer.abort();
}

async fn producer_loop(
    shared: Arc<Shared>,
    ready_tx: mpsc::Sender<binnacle_core::Individual>,
    inflight: Arc<AtomicU64>,
    inflight_ceiling: u64,
) {
    let mut ticker = tokio::time::interval(PRODUCER_INTERVAL);
    loop {
        ticker.tick().await;
        if ready_tx.capacity() == 0 {
            continue;
        }
        if inflight.load(Ordering::SeqCst) >= inflight_ceiling {
            continue;
        }
        match binnacle_core::sampler::create_individual(&shared.schema, &shared.archive.lock().await, &shared.weights) {
            Ok(individual) => {
                if ready_tx.try_send(individual).is_err() {
                    // queue full this tick; next producer tick will retry
                }
            }
            Err(e) => warn!(error = %e, "failed to build candidate individual"),
        }
    }
}

async fn dispatch_loop(
    shared: Arc<Shared>,
    mut ready_rx: mpsc::Receiver<binnacle_core::Individual>,
    inflight: Arc<AtomicU64>,
) {
    while let Some(individual) = ready_rx.recv().await {
        inflight.fetch_add(1, Ordering::SeqCst);
        let shared = shared.clone();
        let inflight = inflight.clone();
        tokio::spawn(async move {
            let _permit = match shared.pool.acquire().await {
                Ok(permit) => permit,
                Err(_) => return,
            };
            run_sample(&shared, individual).await;
            inflight.fetch_sub(1, Ordering::SeqCst);
        });
    }
}

#[instrument(skip(shared, individual), fields(uuid = %individual.uuid, mutator = ?individual.lineage.mutator))]
async fn run_sample(shared: &Shared, mut individual: binnacle_core::Individual) {
    let metrics = shared.evaluator.run(&individual).await;
    for (name, value) in metrics {
        individual.metrics.insert(name, value);
    }

    let retained = {
        let mut archive = shared.archive.lock().await;
        archive.insert(individual.clone())
    };

    let trials = shared.trials_since_last_hi.fetch_add(1, Ordering::SeqCst) + 1;

    if retained {
        individual.trials = Some(trials);
        shared.trials_since_last_hi.store(0, Ordering::SeqCst);
        info!(uuid = %individual.uuid, trials, "was recorded as a high performing individual");
        if let Err(e) = shared.transport.submit(&individual).await {
            warn!(error = %e, "failed to submit high performer to server");
        }
    }
}

async fn sync_loop(shared: Arc<Shared>) {
    let mut ticker = tokio::time::interval(SYNC_INTERVAL);
    loop {
        ticker.tick().await;
        sync_once(&shared).await;
    }
}

#[instrument(skip(shared))]
async fn sync_once(shared: &Shared) {
    info!("requesting state update from server");
    match shared.transport.pull_state().await {
        Ok(wire) => {
            let remote = Archive::from_wire(&wire, shared.metrics.clone(), shared.maximize, shared.amount_per_bin);
            let mut archive = shared.archive.lock().await;
            archive.merge(&remote);
            info!("merged server frontier into local archive");
        }
        Err(e) => warn!(error = %e, "failed to sync with server"),
    }
}
