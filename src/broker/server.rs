use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context as _, Result};
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use futures::{SinkExt, StreamExt};
use serde_json::json;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::broker::state::Broker;
use crate::report::TaskPatch;

pub const DEFAULT_PORT: u16 = 2048;

pub fn router(broker: Arc<Broker>) -> Router {
    Router::new()
        .route("/", get(root_handler))
        .route("/info", get(info_handler))
        .route("/update/{id}", get(update_handler))
        .route("/ws", get(ws_handler))
        .with_state(broker)
}

/// Liveness probe.
async fn root_handler() -> &'static str {
    "Butler progress broker"
}

async fn info_handler() -> Json<serde_json::Value> {
    let name = gethostname::gethostname().to_string_lossy().into_owned();
    Json(json!({ "name": name }))
}

/// Pull-style ingress: apply the supplied query fields to one task. A
/// progress value that does not parse (an empty `progress=` included) is
/// ignored, not a request error.
async fn update_handler(
    State(broker): State<Arc<Broker>>,
    Path(id): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> &'static str {
    broker.apply(&id, &patch_from_query(&params));
    "OK"
}

fn patch_from_query(params: &HashMap<String, String>) -> TaskPatch {
    let mut patch = TaskPatch::new();
    if let Some(title) = params.get("title") {
        patch = patch.title(title.as_str());
    }
    if let Some(description) = params.get("description") {
        patch = patch.description(description.as_str());
    }
    if let Some(progress) = params.get("progress").and_then(|raw| raw.parse().ok()) {
        patch = patch.progress(progress);
    }
    patch
}

async fn ws_handler(State(broker): State<Arc<Broker>>, ws: WebSocketUpgrade) -> impl IntoResponse {
    ws.on_upgrade(move |socket| observer_loop(socket, broker))
}

/// One observer connection: full snapshot on connect, full snapshot again
/// after every update from any source, inbound frames applied as updates.
async fn observer_loop(socket: WebSocket, broker: Arc<Broker>) {
    let mut changes = broker.subscribe();
    let (mut sink, mut stream) = socket.split();

    if sink
        .send(Message::Text(broker.snapshot_json().into()))
        .await
        .is_err()
    {
        return;
    }
    debug!("observer connected");

    loop {
        tokio::select! {
            snapshot = changes.recv() => match snapshot {
                Ok(payload) => {
                    if sink.send(Message::Text(payload.into())).await.is_err() {
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    // Dropped intermediate snapshots don't matter, the latest
                    // table state does.
                    debug!(skipped, "observer lagged, resyncing");
                    if sink.send(Message::Text(broker.snapshot_json().into())).await.is_err() {
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Closed) => break,
            },
            message = stream.next() => match message {
                Some(Ok(Message::Text(text))) => {
                    if text.as_str() == "close" {
                        let _ = sink.send(Message::Close(None)).await;
                        break;
                    }
                    match serde_json::from_str::<HashMap<String, TaskPatch>>(text.as_str()) {
                        Ok(updates) => broker.apply_many(&updates),
                        Err(err) => warn!(%err, "ignoring malformed observer update"),
                    }
                }
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => {}
                Some(Err(err)) => {
                    debug!(%err, "observer connection error");
                    break;
                }
            },
        }
    }

    debug!("observer disconnected");
}

pub async fn serve(broker: Arc<Broker>, port: u16) -> Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind broker on {addr}"))?;
    info!(%addr, "broker listening");
    axum::serve(listener, router(broker))
        .await
        .context("broker server stopped")?;
    Ok(())
}
