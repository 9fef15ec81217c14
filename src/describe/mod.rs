//! Resource normalizer: one heterogeneous cluster object in, one uniform
//! [`DescribeResource`] out, plus the auxiliary describe views.

use std::sync::Arc;

use crate::error::Result;
use crate::models::{DescribeOwnerReference, DescribeResource, ResourceKind};
use crate::reader::{ClusterObject, ClusterReader};
use crate::utils::{node_ready_condition, pod_termination_reason};

mod endpoints;
mod events;
mod replicasets;

pub use events::resolve_event_time;

type StatusFn = fn(&ClusterObject) -> (Option<String>, Option<String>);

/// Kinds whose shape defines a status/reason. Everything else describes without one.
const STATUS_DERIVERS: &[(ResourceKind, StatusFn)] = &[
    (ResourceKind::Pod, pod_status),
    (ResourceKind::Node, node_status),
];

fn pod_status(obj: &ClusterObject) -> (Option<String>, Option<String>) {
    match obj {
        ClusterObject::Pod(pod) => (
            pod.status.as_ref().and_then(|s| s.phase.clone()),
            pod_termination_reason(pod),
        ),
        _ => (None, None),
    }
}

fn node_status(obj: &ClusterObject) -> (Option<String>, Option<String>) {
    match obj {
        ClusterObject::Node(node) => match node_ready_condition(node) {
            Some(c) => (Some(c.status.clone()), c.reason.clone()),
            None => (None, None),
        },
        _ => (None, None),
    }
}

fn derive_status(obj: &ClusterObject) -> (Option<String>, Option<String>) {
    STATUS_DERIVERS
        .iter()
        .find(|(kind, _)| *kind == obj.kind())
        .map(|(_, derive)| derive(obj))
        .unwrap_or((None, None))
}

#[derive(Clone)]
pub struct Describer {
    reader: Arc<dyn ClusterReader>,
    cluster_name: Option<String>,
}

impl Describer {
    pub fn new(reader: Arc<dyn ClusterReader>, cluster_name: Option<String>) -> Self {
        Self { reader, cluster_name }
    }

    /// `Ok(None)` for an unknown kind or a missing object.
    pub async fn describe(&self, kind: &str, namespace: Option<&str>, name: &str) -> Result<Option<DescribeResource>> {
        let Some(kind) = ResourceKind::parse(kind) else {
            return Ok(None);
        };
        let namespace = if kind.is_namespaced() { namespace } else { None };

        match self.reader.get(kind, namespace, name).await? {
            Some(obj) => Ok(Some(self.normalize(&obj)?)),
            None => Ok(None),
        }
    }

    pub fn normalize(&self, obj: &ClusterObject) -> Result<DescribeResource> {
        let meta = obj.meta();
        let (kind, api_version) = obj.type_meta();

        let value = obj.to_json_value()?;
        let raw_json = serde_json::to_string_pretty(&value)?;
        let raw_yaml = serde_yaml::to_string(&value)?;

        let owner_references = meta
            .owner_references
            .as_ref()
            .map(|refs| {
                refs.iter()
                    .map(|r| DescribeOwnerReference {
                        kind: r.kind.clone(),
                        name: r.name.clone(),
                        uid: r.uid.clone(),
                        controller: r.controller.unwrap_or(false),
                    })
                    .collect()
            })
            .unwrap_or_default();

        let (status, reason) = derive_status(obj);

        Ok(DescribeResource {
            kind: kind.to_string(),
            api_version: api_version.to_string(),
            name: meta.name.clone().unwrap_or_default(),
            namespace: meta.namespace.clone().unwrap_or_default(),
            uid: meta.uid.clone().unwrap_or_default(),
            creation_timestamp: meta.creation_timestamp.as_ref().map(|t| t.0),
            labels: meta.labels.clone().unwrap_or_default(),
            annotations: meta.annotations.clone().unwrap_or_default(),
            owner_references,
            raw_json,
            raw_yaml,
            status,
            reason,
            cluster: self.cluster_name.clone(),
        })
    }
}
