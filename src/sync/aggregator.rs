use log::debug;

use crate::error::{Error, Result};
use crate::models::{ClusterSnapshot, IngressSummary, NodeSummary, PodSummary, ServiceSummary, WorkloadSummary};
use crate::reader::ClusterReader;
use crate::shutdown::Shutdown;

/// Read every tracked collection concurrently and assemble one snapshot.
///
/// All-or-nothing: the first failing read aborts the cycle with
/// [`Error::AggregationError`]; a shutdown aborts it with [`Error::Cancelled`].
pub async fn build_snapshot(reader: &dyn ClusterReader, shutdown: &Shutdown) -> Result<ClusterSnapshot> {
    let fetch = async {
        tokio::try_join!(
            async { reader.list_pods().await.map_err(|e| Error::aggregation("pods", e)) },
            async { reader.list_services().await.map_err(|e| Error::aggregation("services", e)) },
            async { reader.list_deployments().await.map_err(|e| Error::aggregation("deployments", e)) },
            async { reader.list_stateful_sets().await.map_err(|e| Error::aggregation("statefulsets", e)) },
            async { reader.list_daemon_sets().await.map_err(|e| Error::aggregation("daemonsets", e)) },
            async { reader.list_ingresses().await.map_err(|e| Error::aggregation("ingresses", e)) },
            async { reader.list_nodes().await.map_err(|e| Error::aggregation("nodes", e)) },
        )
    };

    let (pods, services, deployments, stateful_sets, daemon_sets, ingresses, nodes) = tokio::select! {
        biased;
        _ = shutdown.cancelled() => return Err(Error::Cancelled),
        res = fetch => res?,
    };

    debug!(
        "Fetched {} pods, {} services, {} deployments, {} statefulsets, {} daemonsets, {} ingresses, {} nodes",
        pods.len(),
        services.len(),
        deployments.len(),
        stateful_sets.len(),
        daemon_sets.len(),
        ingresses.len(),
        nodes.len()
    );

    let mut pods: Vec<PodSummary> = pods.iter().map(PodSummary::from).collect();
    pods.sort_by(|a, b| (&a.namespace, &a.name).cmp(&(&b.namespace, &b.name)));

    let mut services: Vec<ServiceSummary> = services.iter().map(ServiceSummary::from).collect();
    services.sort_by(|a, b| (&a.namespace, &a.name).cmp(&(&b.namespace, &b.name)));

    let workloads = merge_workloads(
        deployments.iter().map(WorkloadSummary::from).collect(),
        stateful_sets.iter().map(WorkloadSummary::from).collect(),
        daemon_sets.iter().map(WorkloadSummary::from).collect(),
    );

    let mut ingresses: Vec<IngressSummary> = ingresses.iter().map(IngressSummary::from).collect();
    ingresses.sort_by(|a, b| (&a.namespace, &a.name).cmp(&(&b.namespace, &b.name)));

    let mut nodes: Vec<NodeSummary> = nodes.iter().map(NodeSummary::from).collect();
    nodes.sort_by(|a, b| a.name.cmp(&b.name));

    Ok(ClusterSnapshot {
        pods,
        services,
        workloads,
        ingresses,
        nodes,
    })
}

/// Merge the three workload lists, ordered by (namespace, name, kind name), ordinal.
pub fn merge_workloads(
    deployments: Vec<WorkloadSummary>,
    stateful_sets: Vec<WorkloadSummary>,
    daemon_sets: Vec<WorkloadSummary>,
) -> Vec<WorkloadSummary> {
    let mut merged: Vec<WorkloadSummary> = deployments
        .into_iter()
        .chain(stateful_sets)
        .chain(daemon_sets)
        .collect();
    merged.sort_by(|a, b| {
        (a.namespace.as_str(), a.name.as_str(), a.kind.as_str()).cmp(&(b.namespace.as_str(), b.name.as_str(), b.kind.as_str()))
    });
    merged
}
