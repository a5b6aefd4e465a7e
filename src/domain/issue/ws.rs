//! `GET /ws/issues`: live resolution notifications

use crate::monitoring::Subscriber;
use crate::state::AppState;
use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::IntoResponse,
};
use std::sync::Arc;
use tracing::{debug, warn};

#[utoipa::path(
    get,
    path = "/ws/issues",
    tag = "Resolutions",
    responses(
        (status = 101, description = "WebSocket upgrade; every message is a formatted notification")
    )
)]
pub async fn issues_ws(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(mut socket: WebSocket, state: AppState) {
    let hub = Arc::clone(state.hub());
    let Subscriber { id, mut receiver } = hub.subscribe().await;

    loop {
        tokio::select! {
            outgoing = receiver.recv() => match outgoing {
                Some(text) => {
                    if let Err(e) = socket.send(Message::Text(text)).await {
                        warn!(subscriber_id = %id, error = %e, "Failed to push notification");
                        break;
                    }
                }
                None => break,
            },
            incoming = socket.recv() => match incoming {
                Some(Ok(Message::Close(_))) | None => break,
                // Observers are receive-only
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    debug!(subscriber_id = %id, error = %e, "WebSocket receive error");
                    break;
                }
            },
        }
    }

    hub.unsubscribe(id).await;
}
