//! WebSocket subscription endpoint.

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use axum::{
    extract::{
        State, WebSocketUpgrade,
        ws::{Message, WebSocket},
    },
    response::IntoResponse,
};
use focus_agent_core::{BroadcastHub, Subscriber, SubscriberError};
use futures::{SinkExt, StreamExt, stream::SplitSink};
use tokio::sync::Mutex;

use crate::http::AppState;

/// A peer that cannot take a frame within this window is dropped.
const SEND_TIMEOUT: Duration = Duration::from_secs(10);

/// Write half of an upgraded socket, registered with the hub.
struct WsSubscriber {
    sink: Mutex<SplitSink<WebSocket, Message>>,
}

#[async_trait]
impl Subscriber for WsSubscriber {
    async fn send(&self, message: &str) -> Result<(), SubscriberError> {
        let mut sink = self.sink.lock().await;
        tokio::time::timeout(SEND_TIMEOUT, sink.send(Message::Text(message.to_owned().into())))
            .await
            .map_err(|_| SubscriberError::Send("timed out".to_string()))?
            .map_err(|e| SubscriberError::Send(e.to_string()))
    }
}

/// WebSocket upgrade handler.
///
/// The upgrade completes before the socket joins the hub.
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_socket(socket, state.hub))
}

async fn handle_socket(socket: WebSocket, hub: Arc<BroadcastHub>) {
    let (sender, mut receiver) = socket.split();
    let id = hub
        .connect(Arc::new(WsSubscriber {
            sink: Mutex::new(sender),
        }))
        .await;
    tracing::info!("WebSocket {id} connected");

    // Clients send nothing meaningful; any frame just proves liveness.
    while let Some(msg) = receiver.next().await {
        match msg {
            Ok(Message::Close(_)) => break,
            Ok(_) => tracing::trace!("WebSocket {id} alive"),
            Err(e) => {
                tracing::error!("WebSocket error: {e}");
                break;
            }
        }
    }

    hub.disconnect(id).await;
    tracing::info!("WebSocket {id} disconnected");
}
