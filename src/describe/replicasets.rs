use chrono::Utc;
use k8s_openapi::api::apps::v1::ReplicaSet;

use super::Describer;
use crate::error::Result;
use crate::models::{DescribeReplicaSetRow, ResourceKind, NOT_SET};
use crate::reader::ClusterObject;
use crate::utils::{format_age, label_selector};

const REVISION_ANNOTATION: &str = "deployment.kubernetes.io/revision";

fn to_row(rs: &ReplicaSet, now: chrono::DateTime<Utc>) -> DescribeReplicaSetRow {
    let meta = &rs.metadata;
    DescribeReplicaSetRow {
        name: meta.name.clone().unwrap_or_default(),
        desired: rs
            .spec
            .as_ref()
            .and_then(|s| s.replicas)
            .map(|r| r.to_string())
            .unwrap_or_else(|| NOT_SET.to_string()),
        ready: rs
            .status
            .as_ref()
            .and_then(|s| s.ready_replicas)
            .unwrap_or(0)
            .to_string(),
        age: meta
            .creation_timestamp
            .as_ref()
            .map(|t| format_age(t.0, now))
            .unwrap_or_default(),
        revision: meta
            .annotations
            .as_ref()
            .and_then(|a| a.get(REVISION_ANNOTATION).cloned())
            .unwrap_or_else(|| NOT_SET.to_string()),
    }
}

impl Describer {
    /// Replica sets selected by the deployment's `matchLabels`, newest first.
    pub async fn deployment_replica_sets(&self, namespace: &str, deployment: &str) -> Result<Vec<DescribeReplicaSetRow>> {
        let Some(ClusterObject::Deployment(deploy)) = self
            .reader
            .get(ResourceKind::Deployment, Some(namespace), deployment)
            .await?
        else {
            return Ok(Vec::new());
        };

        let match_labels = deploy
            .spec
            .as_ref()
            .and_then(|s| s.selector.match_labels.clone())
            .unwrap_or_default();
        if match_labels.is_empty() {
            return Ok(Vec::new());
        }

        let mut sets = self
            .reader
            .list_replica_sets(namespace, &label_selector(&match_labels))
            .await?;
        sets.sort_by(|a, b| b.metadata.creation_timestamp.cmp(&a.metadata.creation_timestamp));

        let now = Utc::now();
        Ok(sets.iter().map(|rs| to_row(rs, now)).collect())
    }
}
