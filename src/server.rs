//! HTTP surface: snapshot queries, describe views, restart and the SSE stream.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use std::future::Future;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::commands::{cluster, resources};
use crate::error::Error;
use crate::state::AppState;

/// Error returned by handlers, rendered as `{"error": "..."}`.
pub struct ApiError(pub Error);

impl From<Error> for ApiError {
    fn from(e: Error) -> Self {
        ApiError(e)
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match &self.0 {
            Error::UnsupportedWorkloadKind(_) => StatusCode::BAD_REQUEST,
            Error::KubeError(kube::Error::Api(resp)) if resp.code == 404 => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            log::error!("Request failed: {}", self.0);
        }
        (status, Json(json!({ "error": self.0.to_string() }))).into_response()
    }
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(cluster::health))
        .route("/api/snapshot", get(cluster::snapshot))
        .route("/api/pods", get(cluster::pods))
        .route("/api/services", get(cluster::services))
        .route("/api/workloads", get(cluster::workloads))
        .route("/api/ingresses", get(cluster::ingresses))
        .route("/api/nodes", get(cluster::nodes))
        .route("/api/stream", get(cluster::stream))
        .route("/api/pods/{namespace}/{name}/logs", get(resources::pod_logs))
        .route("/api/describe/{kind}/{namespace}/{name}", get(resources::describe))
        .route("/api/events/{namespace}/{uid}", get(resources::events))
        .route("/api/services/{namespace}/{name}/endpoints", get(resources::service_endpoints))
        .route("/api/deployments/{namespace}/{name}/replicasets", get(resources::deployment_replica_sets))
        .route("/api/restart/{kind}/{namespace}/{name}", post(resources::restart))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

/// Serve until `signal` resolves, then drain in-flight requests. Open SSE
/// streams end once the state's shutdown handle fires.
pub async fn serve<F>(listener: TcpListener, state: AppState, signal: F) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    if let Ok(addr) = listener.local_addr() {
        log::info!("Listening on http://{}", addr);
    }
    axum::serve(listener, router(state))
        .with_graceful_shutdown(signal)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::broadcast::{Broadcaster, SubscriberRegistry, SNAPSHOT_EVENT};
    use crate::models::{ClusterSnapshot, NodeSummary, PodSummary};
    use crate::reader::fake::{obj, FakeReader};
    use crate::reader::ClusterObject;
    use crate::shutdown::{self, ShutdownTrigger};
    use crate::sync::SnapshotCache;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use futures::StreamExt;
    use serde_json::Value;
    use std::sync::Arc;
    use std::time::Duration;
    use tower::ServiceExt;

    fn state_with(reader: Arc<FakeReader>) -> (AppState, ShutdownTrigger) {
        let (trigger, shutdown) = shutdown::channel();
        let state = AppState::new(
            reader,
            Arc::new(SnapshotCache::new()),
            Arc::new(SubscriberRegistry::new()),
            Some("test-cluster".into()),
            shutdown,
        );
        (state, trigger)
    }

    async fn call(app: Router, method: &str, uri: &str) -> (StatusCode, Value) {
        let req = Request::builder().method(method).uri(uri).body(Body::empty()).unwrap();
        let res = app.oneshot(req).await.unwrap();
        let status = res.status();
        let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap() };
        (status, body)
    }

    #[tokio::test]
    async fn test_health() {
        let (state, _trigger) = state_with(Arc::new(FakeReader::default()));
        let (status, body) = call(router(state), "GET", "/api/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["viewers"], 0);
        assert_eq!(body["hasSnapshot"], false);
    }

    #[tokio::test]
    async fn test_snapshot_before_first_cycle() {
        let (state, _trigger) = state_with(Arc::new(FakeReader::default()));
        let app = router(state);
        let (status, _) = call(app.clone(), "GET", "/api/snapshot").await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (status, body) = call(app, "GET", "/api/pods").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, serde_json::json!([]));
    }

    #[tokio::test]
    async fn test_pods_served_from_cache() {
        let (state, _trigger) = state_with(Arc::new(FakeReader::default()));
        state.cache.set(Arc::new(ClusterSnapshot {
            pods: vec![PodSummary { namespace: "shop".into(), name: "web".into(), ..Default::default() }],
            ..Default::default()
        }));
        let app = router(state);

        let (status, body) = call(app.clone(), "GET", "/api/pods").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body[0]["name"], "web");

        let (status, body) = call(app, "GET", "/api/snapshot").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["pods"][0]["namespace"], "shop");
    }

    #[tokio::test]
    async fn test_describe_missing_is_404() {
        let (state, _trigger) = state_with(Arc::new(FakeReader::default()));
        let (status, body) = call(router(state), "GET", "/api/describe/pod/default/ghost").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn test_describe_found() {
        let reader = FakeReader {
            objects: vec![ClusterObject::Pod(obj(serde_json::json!({
                "metadata": {"name": "web", "namespace": "shop", "uid": "u-1"},
                "status": {"phase": "Running"}
            })))],
            ..Default::default()
        };
        let (state, _trigger) = state_with(Arc::new(reader));
        let (status, body) = call(router(state), "GET", "/api/describe/Pod/shop/web").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["uid"], "u-1");
        assert_eq!(body["status"], "Running");
        assert_eq!(body["cluster"], "test-cluster");
    }

    #[tokio::test]
    async fn test_restart_unsupported_kind_is_400() {
        let reader = Arc::new(FakeReader::default());
        let (state, _trigger) = state_with(reader.clone());
        let (status, body) = call(router(state), "POST", "/api/restart/job/shop/backup").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("job"));
        assert!(reader.patches.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_restart_deployment_accepted() {
        let reader = Arc::new(FakeReader::default());
        let (state, _trigger) = state_with(reader.clone());
        let (status, _) = call(router(state), "POST", "/api/restart/Deployment/shop/api").await;
        assert_eq!(status, StatusCode::ACCEPTED);

        let patches = reader.patches.lock().unwrap();
        assert_eq!(patches.len(), 1);
        assert_eq!(patches[0].1, "shop");
        assert_eq!(patches[0].2, "api");
    }

    #[tokio::test]
    async fn test_restart_all_namespaces_token_uses_configured_namespace() {
        let reader = Arc::new(FakeReader::default());
        let (state, _trigger) = state_with(reader.clone());
        let app = router(state.with_namespace(Some("shop".into())));
        let (status, _) = call(app, "POST", "/api/restart/deployment/-/api").await;
        assert_eq!(status, StatusCode::ACCEPTED);

        let patches = reader.patches.lock().unwrap();
        assert_eq!(patches[0].1, "shop");
    }

    #[tokio::test]
    async fn test_cluster_failure_is_500_json() {
        let (state, _trigger) = state_with(Arc::new(FakeReader::default().failing("get")));
        let (status, body) = call(router(state), "GET", "/api/describe/pod/shop/web").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn test_logs_returned_as_text() {
        let reader = FakeReader { logs: "line1\nline2\n".into(), ..Default::default() };
        let (state, _trigger) = state_with(Arc::new(reader));
        let req = Request::builder()
            .uri("/api/pods/shop/web/logs?container=app&tailLines=50")
            .body(Body::empty())
            .unwrap();
        let res = router(state).oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], b"line1\nline2\n");
    }

    #[tokio::test]
    async fn test_stream_sends_cached_then_broadcasts_until_shutdown() {
        let (state, trigger) = state_with(Arc::new(FakeReader::default()));
        state.cache.set(Arc::new(ClusterSnapshot {
            nodes: vec![NodeSummary { name: "cached-node".into(), ..Default::default() }],
            ..Default::default()
        }));
        let registry = state.registry.clone();

        let req = Request::builder().uri("/api/stream").body(Body::empty()).unwrap();
        let res = router(state).oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(registry.active_connection_count(), 1);
        let mut body = res.into_body().into_data_stream();

        let first = body.next().await.unwrap().unwrap();
        let first = String::from_utf8_lossy(&first);
        assert!(first.contains("event: snapshot"));
        assert!(first.contains("cached-node"));

        let pushed = ClusterSnapshot {
            nodes: vec![NodeSummary { name: "fresh-node".into(), ..Default::default() }],
            ..Default::default()
        };
        assert_eq!(registry.push_to_all(SNAPSHOT_EVENT, Arc::new(pushed)).unwrap(), 1);
        let second = body.next().await.unwrap().unwrap();
        assert!(String::from_utf8_lossy(&second).contains("fresh-node"));

        trigger.trigger();
        let end = tokio::time::timeout(Duration::from_secs(1), body.next())
            .await
            .expect("stream should end on shutdown");
        assert!(end.is_none());
        drop(body);
        assert_eq!(registry.active_connection_count(), 0);
    }
}
