use async_trait::async_trait;
use k8s_openapi::api::apps::v1::{DaemonSet, Deployment, ReplicaSet, StatefulSet};
use k8s_openapi::api::batch::v1::{CronJob, Job};
use k8s_openapi::api::core::v1::{Endpoints, Event, Node, Pod, Service};
use k8s_openapi::api::discovery::v1::EndpointSlice;
use k8s_openapi::api::networking::v1::Ingress;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use k8s_openapi::NamespaceResourceScope;
use kube::api::{Api, ListParams, LogParams, Patch, PatchParams};
use kube::Client;
use serde::de::DeserializeOwned;
use std::fmt::Debug;

use crate::error::Result;
use crate::models::{ResourceKind, WorkloadKind};

#[cfg(test)]
pub mod fake;

/// One object fetched for the describe view, tagged by kind.
#[derive(Debug, Clone)]
pub enum ClusterObject {
    Pod(Pod),
    Service(Service),
    Ingress(Ingress),
    Deployment(Deployment),
    StatefulSet(StatefulSet),
    DaemonSet(DaemonSet),
    ReplicaSet(ReplicaSet),
    Job(Job),
    CronJob(CronJob),
    Node(Node),
}

macro_rules! each_object {
    ($obj:expr, $inner:ident => $body:expr) => {
        match $obj {
            ClusterObject::Pod($inner) => $body,
            ClusterObject::Service($inner) => $body,
            ClusterObject::Ingress($inner) => $body,
            ClusterObject::Deployment($inner) => $body,
            ClusterObject::StatefulSet($inner) => $body,
            ClusterObject::DaemonSet($inner) => $body,
            ClusterObject::ReplicaSet($inner) => $body,
            ClusterObject::Job($inner) => $body,
            ClusterObject::CronJob($inner) => $body,
            ClusterObject::Node($inner) => $body,
        }
    };
}

fn type_meta<K: k8s_openapi::Resource>(_: &K) -> (&'static str, &'static str) {
    (K::KIND, K::API_VERSION)
}

impl ClusterObject {
    pub fn kind(&self) -> ResourceKind {
        match self {
            ClusterObject::Pod(_) => ResourceKind::Pod,
            ClusterObject::Service(_) => ResourceKind::Service,
            ClusterObject::Ingress(_) => ResourceKind::Ingress,
            ClusterObject::Deployment(_) => ResourceKind::Deployment,
            ClusterObject::StatefulSet(_) => ResourceKind::StatefulSet,
            ClusterObject::DaemonSet(_) => ResourceKind::DaemonSet,
            ClusterObject::ReplicaSet(_) => ResourceKind::ReplicaSet,
            ClusterObject::Job(_) => ResourceKind::Job,
            ClusterObject::CronJob(_) => ResourceKind::CronJob,
            ClusterObject::Node(_) => ResourceKind::Node,
        }
    }

    /// Object metadata, independent of the kind-specific payload.
    pub fn meta(&self) -> &ObjectMeta {
        each_object!(self, o => kube::Resource::meta(o))
    }

    /// `(kind, apiVersion)` as the API server reports them.
    pub fn type_meta(&self) -> (&'static str, &'static str) {
        each_object!(self, o => type_meta(o))
    }

    pub fn to_json_value(&self) -> Result<serde_json::Value> {
        Ok(each_object!(self, o => serde_json::to_value(o)?))
    }
}

/// Read (and restart-patch) access to the cluster. Everything the engine knows about
/// the cluster comes through here.
#[async_trait]
pub trait ClusterReader: Send + Sync {
    async fn list_pods(&self) -> Result<Vec<Pod>>;
    async fn list_services(&self) -> Result<Vec<Service>>;
    async fn list_deployments(&self) -> Result<Vec<Deployment>>;
    async fn list_stateful_sets(&self) -> Result<Vec<StatefulSet>>;
    async fn list_daemon_sets(&self) -> Result<Vec<DaemonSet>>;
    async fn list_ingresses(&self) -> Result<Vec<Ingress>>;
    async fn list_nodes(&self) -> Result<Vec<Node>>;

    /// Fetch one object; `Ok(None)` when it does not exist.
    async fn get(&self, kind: ResourceKind, namespace: Option<&str>, name: &str) -> Result<Option<ClusterObject>>;

    async fn list_events(&self, namespace: Option<&str>, field_selector: &str) -> Result<Vec<Event>>;
    async fn list_endpoint_slices(&self, namespace: &str, label_selector: &str) -> Result<Vec<EndpointSlice>>;
    async fn get_endpoints(&self, namespace: &str, name: &str) -> Result<Option<Endpoints>>;
    async fn list_replica_sets(&self, namespace: &str, label_selector: &str) -> Result<Vec<ReplicaSet>>;

    async fn pod_logs(&self, namespace: &str, name: &str, container: Option<String>, tail_lines: Option<i64>) -> Result<String>;

    /// Strategic merge patch against one workload.
    async fn patch_workload(&self, kind: WorkloadKind, namespace: &str, name: &str, patch: serde_json::Value) -> Result<()>;
}

/// [`ClusterReader`] backed by the Kubernetes API.
#[derive(Clone)]
pub struct KubeReader {
    client: Client,
    namespace: Option<String>,
}

impl KubeReader {
    /// `namespace` restricts every read that is not given an explicit namespace;
    /// `None` lists across all namespaces.
    pub fn new(client: Client, namespace: Option<String>) -> Self {
        Self { client, namespace }
    }

    fn scoped_api<K>(&self) -> Api<K>
    where
        K: kube::Resource<Scope = NamespaceResourceScope>,
        <K as kube::Resource>::DynamicType: Default,
    {
        match &self.namespace {
            Some(ns) => Api::namespaced(self.client.clone(), ns),
            None => Api::all(self.client.clone()),
        }
    }

    /// Explicit namespace, else the configured restriction.
    fn target_namespace<'a>(&'a self, namespace: Option<&'a str>) -> Option<&'a str> {
        namespace.or(self.namespace.as_deref())
    }

    fn namespaced_api<K>(&self, namespace: Option<&str>) -> Api<K>
    where
        K: kube::Resource<Scope = NamespaceResourceScope>,
        <K as kube::Resource>::DynamicType: Default,
    {
        match self.target_namespace(namespace) {
            Some(ns) => Api::namespaced(self.client.clone(), ns),
            None => Api::default_namespaced(self.client.clone()),
        }
    }

    async fn get_namespaced<K>(&self, namespace: Option<&str>, name: &str) -> Result<Option<K>>
    where
        K: kube::Resource<Scope = NamespaceResourceScope> + Clone + DeserializeOwned + Debug,
        <K as kube::Resource>::DynamicType: Default,
    {
        Ok(self.namespaced_api::<K>(namespace).get_opt(name).await?)
    }
}

async fn list_items<K>(api: Api<K>, lp: &ListParams) -> Result<Vec<K>>
where
    K: Clone + DeserializeOwned + Debug,
{
    Ok(api.list(lp).await?.items)
}

#[async_trait]
impl ClusterReader for KubeReader {
    async fn list_pods(&self) -> Result<Vec<Pod>> {
        list_items(self.scoped_api(), &ListParams::default()).await
    }

    async fn list_services(&self) -> Result<Vec<Service>> {
        list_items(self.scoped_api(), &ListParams::default()).await
    }

    async fn list_deployments(&self) -> Result<Vec<Deployment>> {
        list_items(self.scoped_api(), &ListParams::default()).await
    }

    async fn list_stateful_sets(&self) -> Result<Vec<StatefulSet>> {
        list_items(self.scoped_api(), &ListParams::default()).await
    }

    async fn list_daemon_sets(&self) -> Result<Vec<DaemonSet>> {
        list_items(self.scoped_api(), &ListParams::default()).await
    }

    async fn list_ingresses(&self) -> Result<Vec<Ingress>> {
        list_items(self.scoped_api(), &ListParams::default()).await
    }

    async fn list_nodes(&self) -> Result<Vec<Node>> {
        // Nodes are cluster-scoped; the namespace restriction does not apply
        list_items(Api::all(self.client.clone()), &ListParams::default()).await
    }

    async fn get(&self, kind: ResourceKind, namespace: Option<&str>, name: &str) -> Result<Option<ClusterObject>> {
        let obj = match kind {
            ResourceKind::Pod => self.get_namespaced(namespace, name).await?.map(ClusterObject::Pod),
            ResourceKind::Service => self.get_namespaced(namespace, name).await?.map(ClusterObject::Service),
            ResourceKind::Ingress => self.get_namespaced(namespace, name).await?.map(ClusterObject::Ingress),
            ResourceKind::Deployment => self.get_namespaced(namespace, name).await?.map(ClusterObject::Deployment),
            ResourceKind::StatefulSet => self.get_namespaced(namespace, name).await?.map(ClusterObject::StatefulSet),
            ResourceKind::DaemonSet => self.get_namespaced(namespace, name).await?.map(ClusterObject::DaemonSet),
            ResourceKind::ReplicaSet => self.get_namespaced(namespace, name).await?.map(ClusterObject::ReplicaSet),
            ResourceKind::Job => self.get_namespaced(namespace, name).await?.map(ClusterObject::Job),
            ResourceKind::CronJob => self.get_namespaced(namespace, name).await?.map(ClusterObject::CronJob),
            ResourceKind::Node => Api::<Node>::all(self.client.clone())
                .get_opt(name)
                .await?
                .map(ClusterObject::Node),
        };
        Ok(obj)
    }

    async fn list_events(&self, namespace: Option<&str>, field_selector: &str) -> Result<Vec<Event>> {
        let api: Api<Event> = match self.target_namespace(namespace) {
            Some(ns) => Api::namespaced(self.client.clone(), ns),
            None => Api::all(self.client.clone()),
        };
        list_items(api, &ListParams::default().fields(field_selector)).await
    }

    async fn list_endpoint_slices(&self, namespace: &str, label_selector: &str) -> Result<Vec<EndpointSlice>> {
        let api: Api<EndpointSlice> = Api::namespaced(self.client.clone(), namespace);
        list_items(api, &ListParams::default().labels(label_selector)).await
    }

    async fn get_endpoints(&self, namespace: &str, name: &str) -> Result<Option<Endpoints>> {
        self.get_namespaced(Some(namespace), name).await
    }

    async fn list_replica_sets(&self, namespace: &str, label_selector: &str) -> Result<Vec<ReplicaSet>> {
        let api: Api<ReplicaSet> = Api::namespaced(self.client.clone(), namespace);
        list_items(api, &ListParams::default().labels(label_selector)).await
    }

    async fn pod_logs(&self, namespace: &str, name: &str, container: Option<String>, tail_lines: Option<i64>) -> Result<String> {
        let pods: Api<Pod> = Api::namespaced(self.client.clone(), namespace);
        let lp = LogParams {
            container,
            tail_lines,
            ..LogParams::default()
        };
        Ok(pods.logs(name, &lp).await?)
    }

    async fn patch_workload(&self, kind: WorkloadKind, namespace: &str, name: &str, patch: serde_json::Value) -> Result<()> {
        let pp = PatchParams::default();
        let patch = Patch::Strategic(&patch);
        match kind {
            WorkloadKind::Deployment => {
                Api::<Deployment>::namespaced(self.client.clone(), namespace).patch(name, &pp, &patch).await?;
            }
            WorkloadKind::StatefulSet => {
                Api::<StatefulSet>::namespaced(self.client.clone(), namespace).patch(name, &pp, &patch).await?;
            }
            WorkloadKind::DaemonSet => {
                Api::<DaemonSet>::namespaced(self.client.clone(), namespace).patch(name, &pp, &patch).await?;
            }
        }
        Ok(())
    }
}
