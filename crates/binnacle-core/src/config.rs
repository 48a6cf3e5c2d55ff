//! Typed, explicit configuration. A single [`Config`] value is loaded once and
//! passed into the constructors of the sampler, the client pipeline, and the
//! server — never stashed behind a global singleton.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use binnacle_error::BinnacleResult;

use crate::gene::GeneType;
use crate::metric::MetricsConfig;
use crate::mutate::{MutatorTag, MutatorWeights};
use crate::schema::ParamType;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MutatorsConfig {
    pub scale: BTreeMap<MutatorTag, f64>,
    #[serde(rename = "type")]
    pub by_type: BTreeMap<ParamType, BTreeMap<MutatorTag, f64>>,
}

impl MutatorsConfig {
    pub fn to_weights(&self) -> MutatorWeights {
        let global = self.scale.iter().map(|(t, w)| (*t, *w)).collect();
        let per_type = self
            .by_type
            .iter()
            .map(|(param_type, weights)| {
                let gene_type: GeneType = param_type.gene_type();
                let weights = weights.iter().map(|(t, w)| (*t, *w)).collect();
                (gene_type, weights)
            })
            .collect();
        MutatorWeights { global, per_type }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RunConfig {
    pub optimization_strategy_maximize: bool,
    pub individuals_per_bin: usize,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WorkDirConfig {
    pub base_dir: PathBuf,
}

impl WorkDirConfig {
    pub fn best_dir(&self) -> PathBuf {
        self.base_dir.join("best")
    }
    pub fn graph_dir(&self) -> PathBuf {
        self.base_dir.join("graph")
    }
    pub fn random_config_dir(&self) -> PathBuf {
        self.base_dir.join("random_config")
    }
    pub fn workdir_dir(&self) -> PathBuf {
        self.base_dir.join("workdir")
    }
    pub fn generation_log_dir(&self) -> PathBuf {
        self.base_dir.join("generation_log")
    }

    pub fn ensure_subdirs(&self) -> BinnacleResult<()> {
        for dir in [
            self.best_dir(),
            self.graph_dir(),
            self.random_config_dir(),
            self.workdir_dir(),
            self.generation_log_dir(),
        ] {
            std::fs::create_dir_all(dir)?;
        }
        Ok(())
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CommandConfig {
    pub cmd: String,
    pub gene_arg: String,
    #[serde(default)]
    pub static_args: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WorkersConfig {
    pub max_workers: usize,
    pub max_run_time_secs: u64,
    pub over_fill_executor: usize,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct EnvironmentConfig {
    #[serde(default)]
    pub conda_env: Option<String>,
}

impl EnvironmentConfig {
    /// Best-effort shell prefix; activation itself is out of scope.
    pub fn shell_prefix(&self) -> String {
        match &self.conda_env {
            Some(env) => format!("conda run -n {env} "),
            None => String::new(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    pub mutators: MutatorsConfig,
    pub fitness: MetricsConfig,
    pub run: RunConfig,
    pub server: ServerConfig,
    pub work_dir: WorkDirConfig,
    pub command: CommandConfig,
    pub workers: WorkersConfig,
    pub gene_template: PathBuf,
    pub metrics_location: String,
    #[serde(default)]
    pub history_log: Option<PathBuf>,
    #[serde(default)]
    pub log_level: Option<String>,
    #[serde(default)]
    pub environment: EnvironmentConfig,
}

impl Config {
    pub fn from_yaml_str(text: &str) -> BinnacleResult<Config> {
        Ok(serde_yaml::from_str(text)?)
    }

    pub fn from_file(path: &std::path::Path) -> BinnacleResult<Config> {
        let text = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const YAML: &str = r#"
        mutators:
          scale:
            crossover: 3
            random: 1
            partial: 2
          type:
            float:
              crossover: 3
              random: 1
            int:
              crossover: 3
              random: 1
        fitness:
          sinc:
            fixed_axis: false
            range: [-0.5, 0.5]
            index: 1
          banana:
            fixed_axis: true
            range: [0, 400]
            partitions: 5
            index: 0
        run:
          optimization_strategy_maximize: false
          individuals_per_bin: 5
        server:
          host: "0.0.0.0"
          port: 8080
        work_dir:
          base_dir: "/tmp/binnacle-out"
        command:
          cmd: "run_trial"
          gene_arg: "--gene"
          static_args: "--seed 0"
        workers:
          max_workers: 4
          max_run_time_secs: 120
          over_fill_executor: 8
        gene_template: "schema.yml"
        metrics_location: "metrics.csv"
    "#;

    #[test]
    fn parses_full_config() {
        let config = Config::from_yaml_str(YAML).unwrap();
        assert_eq!(config.workers.max_workers, 4);
        assert_eq!(config.server.port, 8080);
        let weights = config.mutators.to_weights();
        assert_eq!(weights.global.len(), 3);
    }
}
