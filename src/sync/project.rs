use k8s_openapi::api::apps::v1::{DaemonSet, Deployment, StatefulSet};
use k8s_openapi::api::core::v1::{Node, Pod, Service};
use k8s_openapi::api::networking::v1::Ingress;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use std::collections::BTreeMap;

use crate::models::{IngressSummary, NodeSummary, PodSummary, ServiceSummary, WorkloadKind, WorkloadSummary};
use crate::utils::{derive_node_status, node_roles, pod_ready, pod_restarts};

fn name_of(meta: &ObjectMeta) -> String {
    meta.name.clone().unwrap_or_default()
}

fn namespace_of(meta: &ObjectMeta) -> String {
    meta.namespace.clone().unwrap_or_default()
}

fn labels_of(meta: &ObjectMeta) -> BTreeMap<String, String> {
    meta.labels.clone().unwrap_or_default()
}

impl From<&Pod> for PodSummary {
    fn from(pod: &Pod) -> Self {
        let status = pod.status.as_ref();
        PodSummary {
            namespace: namespace_of(&pod.metadata),
            name: name_of(&pod.metadata),
            phase: status.and_then(|s| s.phase.clone()).unwrap_or_default(),
            ready: pod_ready(pod),
            restarts: pod_restarts(pod),
            node: pod.spec.as_ref().and_then(|s| s.node_name.clone()).unwrap_or_default(),
            pod_ip: status.and_then(|s| s.pod_ip.clone()).unwrap_or_default(),
            created_at: pod.metadata.creation_timestamp.as_ref().map(|t| t.0.to_rfc3339()).unwrap_or_default(),
            labels: labels_of(&pod.metadata),
        }
    }
}

impl From<&Service> for ServiceSummary {
    fn from(svc: &Service) -> Self {
        let spec = svc.spec.as_ref();
        let ports = spec
            .and_then(|s| s.ports.as_ref())
            .map(|ports| {
                ports
                    .iter()
                    .map(|p| match p.node_port {
                        Some(node_port) => format!("{}:{}/{}", p.port, node_port, p.protocol.as_deref().unwrap_or("TCP")),
                        None => format!("{}/{}", p.port, p.protocol.as_deref().unwrap_or("TCP")),
                    })
                    .collect()
            })
            .unwrap_or_default();

        ServiceSummary {
            namespace: namespace_of(&svc.metadata),
            name: name_of(&svc.metadata),
            type_: spec.and_then(|s| s.type_.clone()).unwrap_or_else(|| "ClusterIP".into()),
            cluster_ip: spec.and_then(|s| s.cluster_ip.clone()).unwrap_or_default(),
            external_ips: spec.and_then(|s| s.external_ips.clone()).unwrap_or_default(),
            ports,
            selector: spec.and_then(|s| s.selector.clone()).unwrap_or_default(),
            labels: labels_of(&svc.metadata),
        }
    }
}

impl From<&Deployment> for WorkloadSummary {
    fn from(d: &Deployment) -> Self {
        WorkloadSummary {
            kind: WorkloadKind::Deployment,
            namespace: namespace_of(&d.metadata),
            name: name_of(&d.metadata),
            desired: d.spec.as_ref().and_then(|s| s.replicas),
            ready: d.status.as_ref().and_then(|s| s.ready_replicas),
            labels: labels_of(&d.metadata),
        }
    }
}

impl From<&StatefulSet> for WorkloadSummary {
    fn from(st: &StatefulSet) -> Self {
        WorkloadSummary {
            kind: WorkloadKind::StatefulSet,
            namespace: namespace_of(&st.metadata),
            name: name_of(&st.metadata),
            desired: st.spec.as_ref().and_then(|s| s.replicas),
            ready: st.status.as_ref().and_then(|s| s.ready_replicas),
            labels: labels_of(&st.metadata),
        }
    }
}

impl From<&DaemonSet> for WorkloadSummary {
    fn from(ds: &DaemonSet) -> Self {
        WorkloadSummary {
            kind: WorkloadKind::DaemonSet,
            namespace: namespace_of(&ds.metadata),
            name: name_of(&ds.metadata),
            desired: ds.status.as_ref().map(|s| s.desired_number_scheduled),
            ready: ds.status.as_ref().map(|s| s.number_ready),
            labels: labels_of(&ds.metadata),
        }
    }
}

impl From<&Ingress> for IngressSummary {
    fn from(ing: &Ingress) -> Self {
        let spec = ing.spec.as_ref();
        let hosts = spec
            .and_then(|s| s.rules.as_ref())
            .map(|rules| rules.iter().filter_map(|r| r.host.clone()).collect())
            .unwrap_or_default();
        let addresses = ing
            .status
            .as_ref()
            .and_then(|s| s.load_balancer.as_ref())
            .and_then(|lb| lb.ingress.as_ref())
            .map(|entries| {
                entries
                    .iter()
                    .filter_map(|e| e.ip.clone().or_else(|| e.hostname.clone()))
                    .collect()
            })
            .unwrap_or_default();

        IngressSummary {
            namespace: namespace_of(&ing.metadata),
            name: name_of(&ing.metadata),
            class_name: spec.and_then(|s| s.ingress_class_name.clone()).unwrap_or_default(),
            hosts,
            addresses,
            labels: labels_of(&ing.metadata),
        }
    }
}

impl From<&Node> for NodeSummary {
    fn from(node: &Node) -> Self {
        let status = node.status.as_ref();
        let internal_ip = status
            .and_then(|s| s.addresses.as_ref())
            .and_then(|addrs| addrs.iter().find(|a| a.type_ == "InternalIP"))
            .map(|a| a.address.clone())
            .unwrap_or_default();

        NodeSummary {
            name: name_of(&node.metadata),
            status: derive_node_status(node),
            roles: node_roles(node),
            kubelet_version: status
                .and_then(|s| s.node_info.as_ref())
                .map(|i| i.kubelet_version.clone())
                .unwrap_or_default(),
            internal_ip,
            labels: labels_of(&node.metadata),
        }
    }
}
