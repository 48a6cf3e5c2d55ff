//! Shared state handed to every axum handler: the archive and the trial counter.

use std::sync::Arc;

use binnacle_core::{Archive, Config};
use tokio::sync::{Mutex, RwLock};

#[derive(Clone)]
pub struct AppState {
    pub archive: Arc<RwLock<Archive>>,
    pub trial_count: Arc<Mutex<u64>>,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(config: Config, archive: Archive) -> AppState {
        AppState {
            archive: Arc::new(RwLock::new(archive)),
            trial_count: Arc::new(Mutex::new(0)),
            config: Arc::new(config),
        }
    }
}
