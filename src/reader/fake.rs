use async_trait::async_trait;
use k8s_openapi::api::apps::v1::{DaemonSet, Deployment, ReplicaSet, StatefulSet};
use k8s_openapi::api::core::v1::{Endpoints, Event, Node, Pod, Service};
use k8s_openapi::api::discovery::v1::EndpointSlice;
use k8s_openapi::api::networking::v1::Ingress;
use serde::de::DeserializeOwned;
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use super::{ClusterObject, ClusterReader};
use crate::error::{Error, Result};
use crate::models::{ResourceKind, WorkloadKind};

/// Build a k8s object from a JSON fixture.
pub fn obj<K: DeserializeOwned>(value: serde_json::Value) -> K {
    serde_json::from_value(value).expect("valid fixture")
}

pub fn api_error(code: u16) -> Error {
    Error::KubeError(kube::Error::Api(kube::core::ErrorResponse {
        status: "Failure".into(),
        message: "injected failure".into(),
        reason: "InternalError".into(),
        code,
    }))
}

/// In-memory [`ClusterReader`] with injectable failures and recorded calls.
#[derive(Default)]
pub struct FakeReader {
    pub pods: Vec<Pod>,
    pub services: Vec<Service>,
    pub deployments: Vec<Deployment>,
    pub stateful_sets: Vec<StatefulSet>,
    pub daemon_sets: Vec<DaemonSet>,
    pub ingresses: Vec<Ingress>,
    pub nodes: Vec<Node>,
    pub objects: Vec<ClusterObject>,
    pub events: Vec<Event>,
    pub endpoint_slices: Vec<EndpointSlice>,
    pub endpoints: Vec<Endpoints>,
    pub replica_sets: Vec<ReplicaSet>,
    pub logs: String,
    /// Operation names that fail with a 500.
    pub failing: HashSet<&'static str>,
    /// Delay applied to every list call.
    pub list_delay: Option<Duration>,
    pub list_pod_calls: AtomicUsize,
    pub selectors: Mutex<Vec<String>>,
    pub patches: Mutex<Vec<(WorkloadKind, String, String, serde_json::Value)>>,
}

impl FakeReader {
    pub fn failing(mut self, op: &'static str) -> Self {
        self.failing.insert(op);
        self
    }

    async fn guard(&self, op: &'static str) -> Result<()> {
        if let Some(delay) = self.list_delay {
            tokio::time::sleep(delay).await;
        }
        if self.failing.contains(op) {
            return Err(api_error(500));
        }
        Ok(())
    }

    fn record_selector(&self, selector: &str) {
        self.selectors.lock().unwrap().push(selector.to_string());
    }
}

fn find_by_name<'a, K: kube::Resource>(items: &'a [K], namespace: &str, name: &str) -> Option<&'a K> {
    items.iter().find(|o| {
        o.meta().name.as_deref() == Some(name) && o.meta().namespace.as_deref().unwrap_or_default() == namespace
    })
}

#[async_trait]
impl ClusterReader for FakeReader {
    async fn list_pods(&self) -> Result<Vec<Pod>> {
        self.list_pod_calls.fetch_add(1, Ordering::SeqCst);
        self.guard("pods").await?;
        Ok(self.pods.clone())
    }

    async fn list_services(&self) -> Result<Vec<Service>> {
        self.guard("services").await?;
        Ok(self.services.clone())
    }

    async fn list_deployments(&self) -> Result<Vec<Deployment>> {
        self.guard("deployments").await?;
        Ok(self.deployments.clone())
    }

    async fn list_stateful_sets(&self) -> Result<Vec<StatefulSet>> {
        self.guard("statefulsets").await?;
        Ok(self.stateful_sets.clone())
    }

    async fn list_daemon_sets(&self) -> Result<Vec<DaemonSet>> {
        self.guard("daemonsets").await?;
        Ok(self.daemon_sets.clone())
    }

    async fn list_ingresses(&self) -> Result<Vec<Ingress>> {
        self.guard("ingresses").await?;
        Ok(self.ingresses.clone())
    }

    async fn list_nodes(&self) -> Result<Vec<Node>> {
        self.guard("nodes").await?;
        Ok(self.nodes.clone())
    }

    async fn get(&self, kind: ResourceKind, namespace: Option<&str>, name: &str) -> Result<Option<ClusterObject>> {
        if self.failing.contains("get") {
            return Err(api_error(500));
        }
        let namespace = if kind.is_namespaced() { namespace.unwrap_or("default") } else { "" };
        Ok(self
            .objects
            .iter()
            .find(|o| {
                let meta = o.meta();
                o.kind() == kind
                    && meta.name.as_deref() == Some(name)
                    && meta.namespace.as_deref().unwrap_or_default() == namespace
            })
            .cloned())
    }

    async fn list_events(&self, _namespace: Option<&str>, field_selector: &str) -> Result<Vec<Event>> {
        self.record_selector(field_selector);
        if self.failing.contains("events") {
            return Err(api_error(500));
        }
        Ok(self.events.clone())
    }

    async fn list_endpoint_slices(&self, _namespace: &str, label_selector: &str) -> Result<Vec<EndpointSlice>> {
        self.record_selector(label_selector);
        if self.failing.contains("endpointslices") {
            return Err(api_error(503));
        }
        Ok(self.endpoint_slices.clone())
    }

    async fn get_endpoints(&self, namespace: &str, name: &str) -> Result<Option<Endpoints>> {
        Ok(find_by_name(&self.endpoints, namespace, name).cloned())
    }

    async fn list_replica_sets(&self, _namespace: &str, label_selector: &str) -> Result<Vec<ReplicaSet>> {
        self.record_selector(label_selector);
        Ok(self.replica_sets.clone())
    }

    async fn pod_logs(&self, _namespace: &str, _name: &str, _container: Option<String>, _tail_lines: Option<i64>) -> Result<String> {
        Ok(self.logs.clone())
    }

    async fn patch_workload(&self, kind: WorkloadKind, namespace: &str, name: &str, patch: serde_json::Value) -> Result<()> {
        self.patches
            .lock()
            .unwrap()
            .push((kind, namespace.to_string(), name.to_string(), patch));
        Ok(())
    }
}
