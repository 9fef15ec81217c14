use chrono::{DateTime, Utc};
use k8s_openapi::api::core::v1 as k8s_core;
use std::collections::BTreeMap;

pub mod logging;

/// Path value meaning "every namespace".
pub const ALL_NAMESPACES: &str = "-";

/// Map the boundary's namespace token to an optional restriction.
pub fn normalize_namespace(namespace: &str) -> Option<String> {
    let ns = namespace.trim();
    if ns.is_empty() || ns == ALL_NAMESPACES {
        None
    } else {
        Some(ns.to_string())
    }
}

/// `k1=v1,k2=v2` equality selector; keys come out sorted.
pub fn label_selector(labels: &BTreeMap<String, String>) -> String {
    labels
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join(",")
}

/// Compact kubectl-style age: 45s, 12m, 3h, 5d.
pub fn format_age(created: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let secs = (now - created).num_seconds().max(0);
    if secs < 60 {
        format!("{}s", secs)
    } else if secs < 3600 {
        format!("{}m", secs / 60)
    } else if secs < 86_400 {
        format!("{}h", secs / 3600)
    } else {
        format!("{}d", secs / 86_400)
    }
}

pub fn pod_ready(pod: &k8s_core::Pod) -> String {
    match pod.status.as_ref().and_then(|s| s.container_statuses.as_ref()) {
        Some(statuses) => {
            let ready = statuses.iter().filter(|c| c.ready).count();
            format!("{}/{}", ready, statuses.len())
        }
        None => {
            let total = pod.spec.as_ref().map(|s| s.containers.len()).unwrap_or(0);
            format!("0/{}", total)
        }
    }
}

pub fn pod_restarts(pod: &k8s_core::Pod) -> Option<i32> {
    pod.status
        .as_ref()
        .and_then(|s| s.container_statuses.as_ref())
        .map(|statuses| statuses.iter().map(|c| c.restart_count).sum())
}

/// Why the pod (or one of its containers) stopped, if it did.
pub fn pod_termination_reason(pod: &k8s_core::Pod) -> Option<String> {
    let status = pod.status.as_ref()?;
    if let Some(reason) = &status.reason {
        return Some(reason.clone());
    }
    status.container_statuses.as_ref()?.iter().find_map(|c| {
        let current = c.state.as_ref().and_then(|s| s.terminated.as_ref());
        let last = c.last_state.as_ref().and_then(|s| s.terminated.as_ref());
        current.or(last).and_then(|t| t.reason.clone())
    })
}

pub fn node_ready_condition(node: &k8s_core::Node) -> Option<&k8s_core::NodeCondition> {
    node.status
        .as_ref()
        .and_then(|s| s.conditions.as_ref())
        .and_then(|conds| conds.iter().find(|c| c.type_ == "Ready"))
}

pub fn derive_node_status(node: &k8s_core::Node) -> String {
    match node_ready_condition(node) {
        Some(c) if c.status == "True" => "Ready".into(),
        Some(_) => "NotReady".into(),
        None => "Unknown".into(),
    }
}

pub fn node_roles(node: &k8s_core::Node) -> Vec<String> {
    node.metadata
        .labels
        .as_ref()
        .map(|labels| {
            labels
                .keys()
                .filter_map(|k| k.strip_prefix("node-role.kubernetes.io/"))
                .filter(|r| !r.is_empty())
                .map(|r| r.to_string())
                .collect()
        })
        .unwrap_or_default()
}
