//! HTTP handlers: `PUT /submit` and `GET /get_state`.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use binnacle_core::archive::ArchiveWire;
use binnacle_core::Individual;
use serde::Serialize;
use tokio::io::AsyncWriteExt;
use tracing::{info, instrument, warn};

use crate::state::AppState;

async fn append_history_log(path: &std::path::Path, line: &str) -> std::io::Result<()> {
    let mut file = tokio::fs::OpenOptions::new().create(true).append(true).open(path).await?;
    file.write_all(line.as_bytes()).await
}

#[derive(Serialize)]
struct SubmitResponse {
    individual: uuid::Uuid,
    status: &'static str,
}

#[instrument(skip(state, individual), fields(uuid = %individual.uuid))]
pub async fn submit_individual(State(state): State<AppState>, Json(individual): Json<Individual>) -> impl IntoResponse {
    let trials = individual.trials.unwrap_or(0);
    {
        let mut count = state.trial_count.lock().await;
        *count += trials;
    }

    let uuid = individual.uuid;
    let metrics = individual.metrics.clone();
    let retained = {
        let mut archive = state.archive.write().await;
        archive.insert(individual)
    };

    if retained {
        info!(%uuid, "was recorded as a high performing individual");
        if let Some(history_log) = &state.config.history_log {
            let total_trials = *state.trial_count.lock().await;
            let line = format!("{} {total_trials}: {metrics:?}\n", chrono::Utc::now().to_rfc3339());
            if let Err(e) = append_history_log(history_log, &line).await {
                warn!(error = %e, "failed to append to history log");
            }
        }
    }

    (
        StatusCode::OK,
        Json(SubmitResponse {
            individual: uuid,
            status: "successfully stored",
        }),
    )
}

#[instrument(skip(state))]
pub async fn get_state(State(state): State<AppState>) -> Json<ArchiveWire> {
    let archive = state.archive.read().await;
    Json(archive.to_wire())
}
