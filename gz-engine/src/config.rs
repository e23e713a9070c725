//! Evaluation service configuration.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Configuration for one evaluation factory (one engine per process).
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EvalConfig {
    /// Inference engine tag: "fake", "remote", "ort", or "tract"
    /// (the latter two only when compiled in).
    pub engine: String,
    /// Path to the model artifact; interpretation is up to the backend.
    #[serde(default)]
    pub model: PathBuf,
    /// Maximum batch size. Every engine invocation runs at exactly this
    /// batch dimension.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    /// Number of accelerator devices; 0 auto-detects.
    #[serde(default)]
    pub num_devices: usize,
    /// Worker threads per device. Two keeps a device busy while the other
    /// worker's batch is being staged.
    #[serde(default = "default_workers_per_device")]
    pub workers_per_device: usize,
    /// Device kind for accelerator backends: "cpu" or "cuda".
    #[serde(default = "default_device")]
    pub device: String,
    /// Remote-backend settings; ignored by local engines.
    #[serde(default)]
    pub remote: RemoteConfig,
    /// Optional NDJSON sink for init/teardown stats events.
    #[serde(default)]
    pub stats_path: Option<PathBuf>,
}

fn default_batch_size() -> usize {
    1024
}

fn default_workers_per_device() -> usize {
    2
}

fn default_device() -> String {
    "cpu".to_string()
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RemoteConfig {
    /// Address of the remote inference worker.
    #[serde(default = "default_remote_addr")]
    pub addr: String,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        RemoteConfig {
            addr: default_remote_addr(),
        }
    }
}

fn default_remote_addr() -> String {
    "127.0.0.1:50051".to_string()
}

impl EvalConfig {
    /// A minimal config for the given engine tag, defaults everywhere else.
    pub fn for_engine(engine: &str, batch_size: usize) -> EvalConfig {
        EvalConfig {
            engine: engine.to_string(),
            model: PathBuf::new(),
            batch_size,
            num_devices: 0,
            workers_per_device: default_workers_per_device(),
            device: default_device(),
            remote: RemoteConfig::default(),
            stats_path: None,
        }
    }

    /// Load configuration from a YAML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<EvalConfig, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Ok(serde_yaml::from_str(&contents)?)
    }

    /// Load configuration from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<EvalConfig, ConfigError> {
        Ok(serde_yaml::from_str(yaml)?)
    }
}
