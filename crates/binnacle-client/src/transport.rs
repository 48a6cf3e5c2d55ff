//! HTTP calls to the central server: submit a high performer, pull the frontier.

use binnacle_core::archive::ArchiveWire;
use binnacle_core::Individual;
use binnacle_error::{BinnacleError, BinnacleResult};

#[derive(Clone)]
pub struct ServerTransport {
    client: reqwest::Client,
    base_url: String,
}

impl ServerTransport {
    pub fn new(host: &str, port: u16) -> ServerTransport {
        ServerTransport {
            client: reqwest::Client::new(),
            base_url: format!("http://{host}:{port}"),
        }
    }

    pub async fn submit(&self, individual: &Individual) -> BinnacleResult<()> {
        let url = format!("{}/submit", self.base_url);
        let response = self
            .client
            .put(&url)
            .json(individual)
            .send()
            .await
            .map_err(|e| BinnacleError::Transport {
                message: format!("submit request failed: {e}").into(),
            })?;

        if !response.status().is_success() {
            return Err(BinnacleError::Transport {
                message: format!("submit rejected with status {}", response.status()).into(),
            });
        }
        Ok(())
    }

    pub async fn pull_state(&self) -> BinnacleResult<ArchiveWire> {
        let url = format!("{}/get_state", self.base_url);
        self.client
            .get(&url)
            .send()
            .await
            .map_err(|e| BinnacleError::Transport {
                message: format!("get_state request failed: {e}").into(),
            })?
            .json::<ArchiveWire>()
            .await
            .map_err(|e| BinnacleError::Transport {
                message: format!("get_state response was not valid archive JSON: {e}").into(),
            })
    }
}
