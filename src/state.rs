use std::sync::Arc;

use crate::broadcast::SubscriberRegistry;
use crate::describe::Describer;
use crate::reader::ClusterReader;
use crate::shutdown::Shutdown;
use crate::sync::SnapshotCache;
use crate::utils::normalize_namespace;

/// Shared by every request handler. Cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub reader: Arc<dyn ClusterReader>,
    pub cache: Arc<SnapshotCache>,
    pub registry: Arc<SubscriberRegistry>,
    pub describer: Describer,
    pub shutdown: Shutdown,
    /// Configured namespace restriction; stands in for the all-namespaces token.
    pub namespace: Option<String>,
}

impl AppState {
    pub fn new(
        reader: Arc<dyn ClusterReader>,
        cache: Arc<SnapshotCache>,
        registry: Arc<SubscriberRegistry>,
        cluster_name: Option<String>,
        shutdown: Shutdown,
    ) -> Self {
        Self {
            describer: Describer::new(reader.clone(), cluster_name),
            reader,
            cache,
            registry,
            shutdown,
            namespace: None,
        }
    }

    pub fn with_namespace(mut self, namespace: Option<String>) -> Self {
        self.namespace = namespace;
        self
    }

    /// The namespace a single-namespace view should use for a path token: the
    /// token itself, else the configured restriction, else `default`.
    pub fn concrete_namespace(&self, namespace: &str) -> String {
        normalize_namespace(namespace)
            .or_else(|| self.namespace.clone())
            .unwrap_or_else(|| "default".to_string())
    }

    /// Like [`AppState::concrete_namespace`] but `None` when neither the token
    /// nor the configuration names a namespace.
    pub fn scoped_namespace(&self, namespace: &str) -> Option<String> {
        normalize_namespace(namespace).or_else(|| self.namespace.clone())
    }
}
