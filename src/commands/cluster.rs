use axum::{
    extract::State,
    http::StatusCode,
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse, Response,
    },
    Json,
};
use futures::{stream, Stream, StreamExt};
use serde_json::json;

use crate::broadcast::{Broadcaster, SnapshotEvent, SNAPSHOT_EVENT};
use crate::models::{ClusterSnapshot, IngressSummary, NodeSummary, PodSummary, ServiceSummary, WorkloadSummary};
use crate::state::AppState;

fn from_cache<T: Clone>(state: &AppState, pick: impl Fn(&ClusterSnapshot) -> &Vec<T>) -> Json<Vec<T>> {
    Json(state.cache.get().map(|s| pick(s.as_ref()).clone()).unwrap_or_default())
}

pub async fn health(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "viewers": state.registry.active_connection_count(),
        "hasSnapshot": state.cache.get().is_some(),
    }))
}

/// Latest snapshot, or 204 before the first successful cycle.
pub async fn snapshot(State(state): State<AppState>) -> Response {
    match state.cache.get() {
        Some(snapshot) => Json(snapshot.as_ref()).into_response(),
        None => StatusCode::NO_CONTENT.into_response(),
    }
}

pub async fn pods(State(state): State<AppState>) -> Json<Vec<PodSummary>> {
    from_cache(&state, |s| &s.pods)
}

pub async fn services(State(state): State<AppState>) -> Json<Vec<ServiceSummary>> {
    from_cache(&state, |s| &s.services)
}

pub async fn workloads(State(state): State<AppState>) -> Json<Vec<WorkloadSummary>> {
    from_cache(&state, |s| &s.workloads)
}

pub async fn ingresses(State(state): State<AppState>) -> Json<Vec<IngressSummary>> {
    from_cache(&state, |s| &s.ingresses)
}

pub async fn nodes(State(state): State<AppState>) -> Json<Vec<NodeSummary>> {
    from_cache(&state, |s| &s.nodes)
}

fn to_sse(event: &SnapshotEvent) -> Result<Event, axum::Error> {
    Event::default().event(&event.name).json_data(event.snapshot.as_ref())
}

/// Server-sent snapshot stream. A new viewer gets the cached snapshot first,
/// then every broadcast until it disconnects or the server shuts down.
pub async fn stream(State(state): State<AppState>) -> Sse<impl Stream<Item = Result<Event, axum::Error>>> {
    // Subscribe before reading the cache so nothing pushed in between is missed
    let subscription = state.registry.subscribe();
    let initial = state.cache.get().map(|snapshot| SnapshotEvent {
        name: SNAPSHOT_EVENT.to_string(),
        snapshot,
    });

    let events = stream::unfold((subscription, initial), |(mut sub, pending)| async move {
        let event = match pending {
            Some(event) => event,
            None => sub.recv().await?,
        };
        Some((to_sse(&event), (sub, None)))
    });

    let shutdown = state.shutdown.clone();
    Sse::new(events.take_until(async move { shutdown.cancelled().await })).keep_alive(KeepAlive::default())
}
