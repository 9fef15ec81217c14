use chrono::Utc;
use log::info;
use serde_json::json;

use crate::error::{Error, Result};
use crate::models::WorkloadKind;
use crate::reader::ClusterReader;

pub const RESTARTED_AT_ANNOTATION: &str = "kubectl.kubernetes.io/restartedAt";

/// Pod-template patch that forces a rolling restart, same as `kubectl rollout restart`.
pub fn restart_patch(now: chrono::DateTime<Utc>) -> serde_json::Value {
    json!({
        "spec": {
            "template": {
                "metadata": {
                    "annotations": {
                        RESTARTED_AT_ANNOTATION: now.to_rfc3339()
                    }
                }
            }
        }
    })
}

/// Trigger a rollout of a deployment, statefulset or daemonset. Returns once the
/// patch is accepted; the rollout itself is not awaited.
pub async fn restart_workload(reader: &dyn ClusterReader, kind: &str, namespace: &str, name: &str) -> Result<()> {
    let kind = WorkloadKind::parse(kind).ok_or_else(|| Error::UnsupportedWorkloadKind(kind.to_string()))?;

    reader
        .patch_workload(kind, namespace, name, restart_patch(Utc::now()))
        .await?;
    info!("Restarted {} {}/{}", kind, namespace, name);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::fake::FakeReader;

    #[tokio::test]
    async fn test_restart_rejects_non_workload_kinds() {
        let reader = FakeReader::default();
        for kind in ["job", "Pod", "replicaset", ""] {
            let err = restart_workload(&reader, kind, "shop", "api").await.unwrap_err();
            assert!(matches!(err, Error::UnsupportedWorkloadKind(_)), "{kind}");
        }
        assert!(reader.patches.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_restart_patches_template_annotation() {
        let reader = FakeReader::default();
        let before = Utc::now();
        restart_workload(&reader, "StatefulSet", "shop", "db").await.unwrap();

        let patches = reader.patches.lock().unwrap();
        assert_eq!(patches.len(), 1);
        let (kind, ns, name, patch) = &patches[0];
        assert_eq!(*kind, WorkloadKind::StatefulSet);
        assert_eq!(ns, "shop");
        assert_eq!(name, "db");

        let stamp = patch["spec"]["template"]["metadata"]["annotations"][RESTARTED_AT_ANNOTATION]
            .as_str()
            .unwrap();
        let parsed = chrono::DateTime::parse_from_rfc3339(stamp).unwrap();
        assert!(parsed.timestamp() >= before.timestamp());
    }
}
