//! Runtime configuration.
//!
//! Loaded from the first JSON file found (see [`config_paths`]), then overridden
//! by environment variables:
//!
//! | Variable                    | Field            | Default          |
//! |-----------------------------|------------------|------------------|
//! | `KUBEPULSE_NAMESPACE`       | `namespace`      | all namespaces   |
//! | `KUBEPULSE_CLUSTER_NAME`    | `clusterName`    | none             |
//! | `KUBEPULSE_LISTEN_ADDR`     | `listenAddr`     | `0.0.0.0:8080`   |
//! | `KUBEPULSE_KUBECONFIG`      | `kubeconfig`     | inferred         |
//! | `KUBEPULSE_CONTEXT`         | `context`        | current context  |
//! | `KUBEPULSE_BUSY_POLL_SECS`  | `busyPollSecs`   | `5`              |
//! | `KUBEPULSE_IDLE_POLL_SECS`  | `idlePollSecs`   | `30`             |
//! | `KUBEPULSE_LOG_DIR`         | `logDir`         | stderr           |

use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tokio::fs;

use crate::sync::scheduler::PollIntervals;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Config {
    /// Restrict every list call to this namespace. Empty means all namespaces.
    pub namespace: Option<String>,
    /// Cluster identity attached to every describe result.
    pub cluster_name: Option<String>,
    pub listen_addr: String,
    pub kubeconfig: Option<String>,
    pub context: Option<String>,
    pub busy_poll_secs: u64,
    pub idle_poll_secs: u64,
    pub log_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            namespace: None,
            cluster_name: None,
            listen_addr: "0.0.0.0:8080".to_string(),
            kubeconfig: None,
            context: None,
            busy_poll_secs: 5,
            idle_poll_secs: 30,
            log_dir: None,
        }
    }
}

/// Config file locations, in priority order.
pub fn config_paths() -> Vec<PathBuf> {
    let mut paths = vec![PathBuf::from(".kubepulse.json")];
    if let Some(home) = dirs::home_dir() {
        paths.push(home.join(".kubepulse.json"));
    }
    if let Some(config_dir) = dirs::config_dir() {
        paths.push(config_dir.join("kubepulse").join("config.json"));
    }
    paths
}

/// A loaded [`Config`] with the file diagnostics gathered along the way.
///
/// Loading runs before the logger exists (the log directory is itself config),
/// so messages are kept here and emitted by [`LoadedConfig::log_diagnostics`].
#[derive(Debug, Clone, Default)]
pub struct LoadedConfig {
    pub config: Config,
    pub source: Option<PathBuf>,
    pub warnings: Vec<String>,
}

impl LoadedConfig {
    pub fn log_diagnostics(&self) {
        for warning in &self.warnings {
            warn!("{}", warning);
        }
        match &self.source {
            Some(path) => info!("Loaded config from {:?}", path),
            None => info!("No config file found, using defaults"),
        }
    }
}

impl Config {
    /// File config (first readable, parseable path) with environment overrides applied.
    pub async fn load() -> LoadedConfig {
        let mut loaded = Self::from_paths(&config_paths()).await;
        loaded.config.apply_env(|key| std::env::var(key).ok());
        loaded.config.normalize();
        loaded
    }

    pub async fn from_paths(paths: &[PathBuf]) -> LoadedConfig {
        let mut warnings = Vec::new();
        for path in paths {
            if !path.exists() {
                continue;
            }
            match fs::read_to_string(path).await {
                Ok(content) => match serde_json::from_str::<Config>(&content) {
                    Ok(config) => {
                        return LoadedConfig {
                            config,
                            source: Some(path.clone()),
                            warnings,
                        };
                    }
                    Err(e) => warnings.push(format!("Failed to parse {:?}: {}", path, e)),
                },
                Err(e) => warnings.push(format!("Failed to read {:?}: {}", path, e)),
            }
        }
        LoadedConfig {
            warnings,
            ..Default::default()
        }
    }

    pub fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(v) = var("KUBEPULSE_NAMESPACE") {
            self.namespace = Some(v);
        }
        if let Some(v) = var("KUBEPULSE_CLUSTER_NAME") {
            self.cluster_name = Some(v);
        }
        if let Some(v) = var("KUBEPULSE_LISTEN_ADDR") {
            self.listen_addr = v;
        }
        if let Some(v) = var("KUBEPULSE_KUBECONFIG") {
            self.kubeconfig = Some(v);
        }
        if let Some(v) = var("KUBEPULSE_CONTEXT") {
            self.context = Some(v);
        }
        if let Some(v) = var("KUBEPULSE_BUSY_POLL_SECS").and_then(|v| v.parse().ok()) {
            self.busy_poll_secs = v;
        }
        if let Some(v) = var("KUBEPULSE_IDLE_POLL_SECS").and_then(|v| v.parse().ok()) {
            self.idle_poll_secs = v;
        }
        if let Some(v) = var("KUBEPULSE_LOG_DIR") {
            self.log_dir = Some(PathBuf::from(v));
        }
    }

    /// Blank optional strings mean "unset".
    pub fn normalize(&mut self) {
        for field in [&mut self.namespace, &mut self.cluster_name, &mut self.kubeconfig, &mut self.context] {
            if field.as_deref().map_or(false, |v| v.trim().is_empty()) {
                *field = None;
            }
        }
    }

    pub fn poll_intervals(&self) -> PollIntervals {
        PollIntervals {
            busy: Duration::from_secs(self.busy_poll_secs.max(1)),
            idle: Duration::from_secs(self.idle_poll_secs.max(1)),
        }
    }
}
