//! Status Stream - WebSocket Observer Sessions
//!
//! Each connection is one hub observer. Updates are forwarded as JSON
//! text frames in publish order. A lagging connection loses the updates
//! it could not keep up with and carries on.

use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::Response;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, warn};

use super::AppState;
use crate::domain::order::OrderUpdate;

/// `GET /ws`
///
/// The hub subscription is taken before the upgrade completes, so the
/// observer receives every update published after its handshake.
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    let updates = state.hub.subscribe();
    ws.on_upgrade(move |socket| stream_updates(socket, updates))
}

async fn stream_updates(socket: WebSocket, mut updates: broadcast::Receiver<OrderUpdate>) {
    let (mut sink, mut incoming) = socket.split();
    info!("Observer connected");

    loop {
        tokio::select! {
            update = updates.recv() => match update {
                Ok(update) => {
                    let text = match serde_json::to_string(&update) {
                        Ok(text) => text,
                        Err(e) => {
                            warn!(error = %e, order_id = %update.order_id, "Failed to encode update");
                            continue;
                        }
                    };
                    if sink.send(Message::Text(text)).await.is_err() {
                        break;
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Observer lagging, updates dropped");
                }
                Err(RecvError::Closed) => break,
            },
            message = incoming.next() => match message {
                Some(Ok(Message::Text(text))) => debug!(message = %text, "Observer message ignored"),
                Some(Ok(Message::Close(_)) | Err(_)) | None => break,
                Some(Ok(_)) => {}
            },
        }
    }

    info!("Observer disconnected");
}
