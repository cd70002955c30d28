//! WebSocket handler for the human chat room
//!
//! Every connected client joins one shared room. Text frames are stored
//! and relayed to all other participants, prefixed with the sender label.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Path, State,
    },
    response::Response,
};
use futures_util::{SinkExt, StreamExt};
use tracing::{debug, error, info, warn};

use crate::chat::models::{NewMessage, Sender, HUMAN_CHAT_SESSION};
use crate::state::AppState;

/// Interval between server pings
const PING_INTERVAL_SECS: u64 = 30;

/// WebSocket upgrade handler for `/ws/:client_id`
///
/// # Arguments
/// * `ws` - WebSocket upgrade request
/// * `client_id` - Client-chosen identifier used as the display label
/// * `state` - Application state
///
/// # Returns
/// * `Response` - HTTP response initiating WebSocket connection
pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    Path(client_id): Path<String>,
    State(state): State<AppState>,
) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, client_id, state))
}

// Handle WebSocket connection
async fn handle_socket(socket: WebSocket, client_id: String, state: AppState) {
    let (mut sender, mut receiver) = socket.split();

    // Broadcasts reach this socket through the registry's queue
    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel::<String>();
    let connection_id = state.registry.connect(tx).await;

    info!(client_id = %client_id, connection_id = %connection_id, "WebSocket client connected");

    // Outbound frames: broadcasts and pings
    let (out_tx, mut out_rx) = tokio::sync::mpsc::unbounded_channel::<Message>();

    // Task to forward messages from channels to sender
    let mut send_task = tokio::spawn(async move {
        loop {
            let msg = tokio::select! {
                Some(text) = rx.recv() => Message::Text(text),
                Some(msg) = out_rx.recv() => msg,
                else => break,
            };
            if let Err(e) = sender.send(msg).await {
                error!("Failed to send message: {}", e);
                break;
            }
        }
    });

    // Task to send periodic pings
    let ping_tx = out_tx.clone();
    let mut ping_task = tokio::spawn(async move {
        loop {
            tokio::time::sleep(tokio::time::Duration::from_secs(PING_INTERVAL_SECS)).await;
            if ping_tx.send(Message::Ping(vec![])).is_err() {
                break;
            }
        }
    });

    // Receive messages
    let recv_state = state.clone();
    let recv_client_id = client_id.clone();
    let mut recv_task = tokio::spawn(async move {
        let sender_tag = Sender::Human(recv_client_id.clone());

        while let Some(msg) = receiver.next().await {
            match msg {
                Ok(Message::Text(text)) => {
                    relay_message(&recv_state, &sender_tag, connection_id, &text).await;
                }
                Ok(Message::Close(_)) => {
                    info!(client_id = %recv_client_id, "WebSocket client disconnected");
                    break;
                }
                Ok(Message::Pong(_)) | Ok(Message::Ping(_)) => {
                    // Keepalive traffic, pings are answered by axum
                }
                Ok(Message::Binary(_)) => {
                    warn!(client_id = %recv_client_id, "Ignoring binary WebSocket frame");
                }
                Err(e) => {
                    error!(client_id = %recv_client_id, "WebSocket error: {}", e);
                    break;
                }
            }
        }
    });

    // Wait for any task to complete
    tokio::select! {
        _ = &mut send_task => {
            ping_task.abort();
            recv_task.abort();
        }
        _ = &mut ping_task => {
            send_task.abort();
            recv_task.abort();
        }
        _ = &mut recv_task => {
            send_task.abort();
            ping_task.abort();
        }
    }
    drop(out_tx);

    state.registry.disconnect(connection_id).await;
    let notice = format!("{} left the chat", Sender::Human(client_id.clone()).label());
    state.registry.broadcast(&notice, None).await;

    info!(client_id = %client_id, connection_id = %connection_id, "WebSocket connection closed");
}

/// Store one inbound frame and relay it to every other participant
///
/// A failed write is logged and the frame is relayed anyway.
async fn relay_message(
    state: &AppState,
    sender: &Sender,
    connection_id: crate::chat::ConnectionId,
    text: &str,
) {
    let label = sender.label();

    if let Err(e) = state
        .db
        .add_message(&NewMessage::text(text, sender, HUMAN_CHAT_SESSION))
        .await
    {
        error!(sender = %label, error = %e, "Failed to save chat message");
    }

    let delivered = state
        .registry
        .broadcast(&format!("{}: {}", label, text), Some(connection_id))
        .await;

    debug!(sender = %label, delivered, "Relayed chat message");
}
