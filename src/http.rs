//! Inbound HTTP shim.
//!
//! A thin axum front for the request-driven flow: `GET /update` carries the
//! four raw battery parameters as query values. The handler forwards them to
//! the pipeline through a bounded channel and acks immediately; the response
//! never depends on the publish outcome.

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::pipeline::TriggerParams;

pub const ACK_TEXT: &str = "Data received and published via MQTT";

pub fn router(triggers: mpsc::Sender<TriggerParams>) -> Router {
    Router::new()
        .route("/update", get(update))
        .with_state(triggers)
}

pub async fn serve(
    listener: TcpListener,
    triggers: mpsc::Sender<TriggerParams>,
) -> std::io::Result<()> {
    info!("update endpoint listening on {}", listener.local_addr()?);
    axum::serve(listener, router(triggers)).await
}

async fn update(
    State(triggers): State<mpsc::Sender<TriggerParams>>,
    Query(params): Query<TriggerParams>,
) -> (StatusCode, &'static str) {
    // the ack must not wait on the pipeline, so a full channel drops the
    // trigger rather than blocking the handler
    if let Err(err) = triggers.try_send(params) {
        warn!("trigger dropped: {err}");
    }
    (StatusCode::OK, ACK_TEXT)
}
