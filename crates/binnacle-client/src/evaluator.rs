//! Invokes the external program once per individual, under a subprocess timeout,
//! and reads back whatever metrics CSV it produced.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use binnacle_core::config::{CommandConfig, EnvironmentConfig};
use binnacle_core::Individual;
use tracing::{info, warn};

#[derive(Clone)]
pub struct Evaluator {
    command: CommandConfig,
    environment: EnvironmentConfig,
    workdir_root: PathBuf,
    metrics_location: String,
    max_run_time: Duration,
}

impl Evaluator {
    pub fn new(
        command: CommandConfig,
        environment: EnvironmentConfig,
        workdir_root: PathBuf,
        metrics_location: String,
        max_run_time: Duration,
    ) -> Evaluator {
        Evaluator {
            command,
            environment,
            workdir_root,
            metrics_location,
            max_run_time,
        }
    }

    /// Run the evaluator for `individual`. Never returns `Err` for evaluator-side
    /// failures (non-zero exit, timeout, missing output) — those come back as an
    /// empty metrics map, which the archive's fill-invalid rule turns into the
    /// worst feasible value rather than dropping the individual.
    pub async fn run(&self, individual: &Individual) -> BTreeMap<String, Option<f64>> {
        let workdir = self.workdir_root.join(individual.uuid.to_string());
        if let Err(e) = tokio::fs::create_dir_all(&workdir).await {
            warn!(uuid = %individual.uuid, error = %e, "could not create work directory");
            return BTreeMap::new();
        }

        let gene_path = workdir.join("gene.yml");
        match serde_yaml::to_string(&individual.genetics) {
            Ok(text) => {
                if let Err(e) = tokio::fs::write(&gene_path, text).await {
                    warn!(uuid = %individual.uuid, error = %e, "could not serialize genome");
                    return BTreeMap::new();
                }
            }
            Err(e) => {
                warn!(uuid = %individual.uuid, error = %e, "could not serialize genome");
                return BTreeMap::new();
            }
        }

        let command_line = self.make_run_command(&gene_path);
        info!(uuid = %individual.uuid, %command_line, "evaluating individual");

        let mut child = match tokio::process::Command::new("sh")
            .arg("-c")
            .arg(&command_line)
            .current_dir(&workdir)
            .kill_on_drop(true)
            .spawn()
        {
            Ok(child) => child,
            Err(e) => {
                warn!(uuid = %individual.uuid, error = %e, "failed to spawn evaluator");
                self.cleanup(&workdir).await;
                return BTreeMap::new();
            }
        };

        match tokio::time::timeout(self.max_run_time, child.wait()).await {
            Ok(Ok(status)) if !status.success() => {
                warn!(uuid = %individual.uuid, ?status, "evaluator exited non-zero");
            }
            Ok(Err(e)) => {
                warn!(uuid = %individual.uuid, error = %e, "evaluator process error");
            }
            Err(_) => {
                warn!(uuid = %individual.uuid, "evaluator timed out, killing process tree");
                let _ = child.kill().await;
            }
            Ok(Ok(_)) => {}
        }

        let metrics_path = workdir.join(&self.metrics_location);
        let metrics = self.read_metrics(&metrics_path).await;
        self.cleanup(&workdir).await;
        metrics
    }

    fn make_run_command(&self, gene_path: &std::path::Path) -> String {
        format!(
            "{}{} {} {} {}",
            self.environment.shell_prefix(),
            self.command.cmd,
            self.command.gene_arg,
            gene_path.display(),
            self.command.static_args,
        )
    }

    async fn read_metrics(&self, path: &std::path::Path) -> BTreeMap<String, Option<f64>> {
        let Ok(text) = tokio::fs::read_to_string(path).await else {
            warn!(path = %path.display(), "metrics file missing, filling worst values");
            return BTreeMap::new();
        };

        let mut reader = csv::Reader::from_reader(text.as_bytes());
        let headers: Vec<String> = match reader.headers() {
            Ok(h) => h.iter().map(str::to_string).collect(),
            Err(_) => return BTreeMap::new(),
        };

        let mut sums = vec![0.0f64; headers.len()];
        let mut counts = vec![0u64; headers.len()];
        for record in reader.records().flatten() {
            for (i, field) in record.iter().enumerate() {
                if let Ok(v) = field.parse::<f64>() {
                    sums[i] += v;
                    counts[i] += 1;
                }
            }
        }

        headers
            .into_iter()
            .enumerate()
            .map(|(i, name)| {
                let value = if counts[i] > 0 {
                    Some(sums[i] / counts[i] as f64)
                } else {
                    None
                };
                (name, value)
            })
            .collect()
    }

    async fn cleanup(&self, workdir: &std::path::Path) {
        if let Err(e) = tokio::fs::remove_dir_all(workdir).await {
            warn!(path = %workdir.display(), error = %e, "failed to clean up work directory");
        }
    }
}
