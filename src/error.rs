use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Kube Error: {0}")]
    KubeError(#[from] kube::Error),

    #[error("Kubeconfig error: {0}")]
    KubeconfigError(#[from] kube::config::KubeconfigError),

    #[error("Kube config inference error: {0}")]
    InferConfigError(#[from] kube::config::InferConfigError),

    #[error("Failed to list {resource}: {source}")]
    AggregationError {
        resource: &'static str,
        #[source]
        source: Box<Error>,
    },

    #[error("Restart not supported for kind {0}")]
    UnsupportedWorkloadKind(String),

    #[error("Broadcast error: {0}")]
    BroadcastError(String),

    #[error("Config error: {0}")]
    ConfigError(String),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Cancelled by shutdown")]
    Cancelled,
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

impl Error {
    pub fn aggregation(resource: &'static str, source: Error) -> Self {
        Error::AggregationError {
            resource,
            source: Box::new(source),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Error::Cancelled)
    }
}
