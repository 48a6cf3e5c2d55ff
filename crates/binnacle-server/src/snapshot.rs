//! Periodic disk snapshot of the archive's retained individuals.

use std::time::Duration;

use tracing::{info, instrument, warn};

use crate::state::AppState;

const SNAPSHOT_INTERVAL: Duration = Duration::from_secs(600);

pub async fn run(state: AppState) {
    let mut ticker = tokio::time::interval(SNAPSHOT_INTERVAL);
    loop {
        ticker.tick().await;
        snapshot_once(&state).await;
    }
}

#[instrument(skip(state))]
async fn snapshot_once(state: &AppState) {
    let best_dir = state.config.work_dir.best_dir();
    if let Err(e) = tokio::fs::remove_dir_all(&best_dir).await {
        if e.kind() != std::io::ErrorKind::NotFound {
            warn!(error = %e, "failed to wipe best/ before snapshot");
        }
    }
    if let Err(e) = tokio::fs::create_dir_all(&best_dir).await {
        warn!(error = %e, "failed to recreate best/ directory");
        return;
    }

    let individuals: Vec<_> = {
        let archive = state.archive.read().await;
        archive
            .non_empty_bins()
            .into_iter()
            .flat_map(|path| archive.bin(path).to_vec())
            .collect()
    };

    let mut written = 0usize;
    for individual in &individuals {
        let name = snapshot_filename(individual);
        let path = best_dir.join(name);
        match serde_yaml::to_string(individual) {
            Ok(text) => {
                if let Err(e) = tokio::fs::write(&path, text).await {
                    warn!(error = %e, path = %path.display(), "failed to write snapshot file");
                } else {
                    written += 1;
                }
            }
            Err(e) => warn!(error = %e, "failed to serialize individual for snapshot"),
        }
    }
    info!(written, "completed periodic archive snapshot");
}

fn snapshot_filename(individual: &binnacle_core::Individual) -> String {
    let metrics_part: String = individual
        .metrics
        .iter()
        .map(|(name, value)| format!("{name}={}", value.map(|v| format!("{v:.4}")).unwrap_or_else(|| "null".to_string())))
        .collect::<Vec<_>>()
        .join("_");
    format!("{metrics_part}_uuid_{}.yml", individual.uuid)
}
