use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::json;

use crate::actions::restart_workload;
use crate::models::{DescribeEndpointRow, DescribeEvent, DescribeReplicaSetRow};
use crate::server::ApiResult;
use crate::state::AppState;

const DEFAULT_TAIL_LINES: i64 = 1000;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogQuery {
    pub container: Option<String>,
    pub tail_lines: Option<i64>,
}

pub async fn pod_logs(
    State(state): State<AppState>,
    Path((namespace, name)): Path<(String, String)>,
    Query(query): Query<LogQuery>,
) -> ApiResult<String> {
    let namespace = state.concrete_namespace(&namespace);
    let tail = query.tail_lines.unwrap_or(DEFAULT_TAIL_LINES);
    let logs = state
        .reader
        .pod_logs(&namespace, &name, query.container, Some(tail))
        .await?;
    Ok(logs)
}

pub async fn describe(
    State(state): State<AppState>,
    Path((kind, namespace, name)): Path<(String, String, String)>,
) -> ApiResult<Response> {
    let namespace = state.scoped_namespace(&namespace);
    match state.describer.describe(&kind, namespace.as_deref(), &name).await? {
        Some(resource) => Ok(Json(resource).into_response()),
        None => Ok((
            StatusCode::NOT_FOUND,
            Json(json!({ "error": format!("{} {} not found", kind, name) })),
        )
            .into_response()),
    }
}

pub async fn events(
    State(state): State<AppState>,
    Path((namespace, uid)): Path<(String, String)>,
) -> ApiResult<Json<Vec<DescribeEvent>>> {
    let namespace = state.scoped_namespace(&namespace);
    Ok(Json(state.describer.events(namespace.as_deref(), &uid).await?))
}

pub async fn service_endpoints(
    State(state): State<AppState>,
    Path((namespace, name)): Path<(String, String)>,
) -> ApiResult<Json<Vec<DescribeEndpointRow>>> {
    let namespace = state.concrete_namespace(&namespace);
    Ok(Json(state.describer.service_endpoints(&namespace, &name).await?))
}

pub async fn deployment_replica_sets(
    State(state): State<AppState>,
    Path((namespace, name)): Path<(String, String)>,
) -> ApiResult<Json<Vec<DescribeReplicaSetRow>>> {
    let namespace = state.concrete_namespace(&namespace);
    Ok(Json(state.describer.deployment_replica_sets(&namespace, &name).await?))
}

/// Accepted as soon as the patch lands; the rollout is not awaited.
pub async fn restart(
    State(state): State<AppState>,
    Path((kind, namespace, name)): Path<(String, String, String)>,
) -> ApiResult<StatusCode> {
    let namespace = state.concrete_namespace(&namespace);
    restart_workload(state.reader.as_ref(), &kind, &namespace, &name).await?;
    Ok(StatusCode::ACCEPTED)
}
