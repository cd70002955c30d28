//! Integration tests for the human chat room WebSocket
//!
//! A real server is started on an ephemeral port and driven with
//! tokio-tungstenite clients.

use chat_app_backend::app;
use chat_app_backend::chat::{ChatDb, ConversationBridge, HUMAN_CHAT_SESSION};
use chat_app_backend::state::AppState;
use futures_util::{SinkExt, StreamExt};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};

type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

const WAIT: Duration = Duration::from_secs(5);

/// Start the application on a random local port
async fn spawn_server() -> (SocketAddr, AppState, tempfile::TempDir) {
    let static_dir = tempfile::tempdir().expect("Failed to create temp dir");
    std::fs::write(static_dir.path().join("index.html"), "<h1>chat</h1>")
        .expect("Failed to write index.html");

    let db = ChatDb::new("sqlite::memory:").await.unwrap();
    let state = AppState::new(db, ConversationBridge::unconfigured());
    let router = app::router(state.clone(), static_dir.path());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    (addr, state, static_dir)
}

async fn connect(addr: SocketAddr, client_id: &str) -> Client {
    let (socket, _) = connect_async(format!("ws://{}/ws/{}", addr, client_id))
        .await
        .expect("Failed to connect WebSocket");
    socket
}

/// Wait until the registry holds exactly `count` channels
async fn wait_for_connections(state: &AppState, count: usize) {
    timeout(WAIT, async {
        while state.registry.len().await != count {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("Timed out waiting for registry");
}

/// Next text frame, skipping keepalive traffic
async fn next_text(client: &mut Client) -> String {
    timeout(WAIT, async {
        loop {
            match client.next().await {
                Some(Ok(Message::Text(text))) => return text,
                Some(Ok(_)) => continue,
                other => panic!("Expected text frame, got: {:?}", other),
            }
        }
    })
    .await
    .expect("Timed out waiting for a message")
}

#[tokio::test]
async fn test_message_is_relayed_to_others_and_stored() {
    let (addr, state, _static_dir) = spawn_server().await;

    let mut alice = connect(addr, "alice").await;
    let mut bob = connect(addr, "bob").await;
    let mut carol = connect(addr, "carol").await;
    wait_for_connections(&state, 3).await;

    alice.send(Message::Text("hello".into())).await.unwrap();

    assert_eq!(next_text(&mut bob).await, "User alice: hello");
    assert_eq!(next_text(&mut carol).await, "User alice: hello");

    // The sender does not get its own message back
    let echoed = timeout(Duration::from_millis(200), alice.next()).await;
    assert!(echoed.is_err(), "sender received its own message: {:?}", echoed);

    let messages = state.db.get_messages(HUMAN_CHAT_SESSION).await.unwrap();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].sender, "User alice");
    assert_eq!(messages[0].content, "hello");
    assert_eq!(messages[0].kind, "text");
}

#[tokio::test]
async fn test_messages_from_one_sender_keep_their_order() {
    let (addr, state, _static_dir) = spawn_server().await;

    let mut alice = connect(addr, "alice").await;
    let mut bob = connect(addr, "bob").await;
    wait_for_connections(&state, 2).await;

    for text in ["one", "two", "three"] {
        alice.send(Message::Text(text.into())).await.unwrap();
    }

    assert_eq!(next_text(&mut bob).await, "User alice: one");
    assert_eq!(next_text(&mut bob).await, "User alice: two");
    assert_eq!(next_text(&mut bob).await, "User alice: three");

    let contents: Vec<_> = state
        .db
        .get_messages(HUMAN_CHAT_SESSION)
        .await
        .unwrap()
        .into_iter()
        .map(|m| m.content)
        .collect();
    assert_eq!(contents, vec!["one", "two", "three"]);
}

#[tokio::test]
async fn test_message_is_relayed_when_store_is_down() {
    let (addr, state, _static_dir) = spawn_server().await;

    let mut alice = connect(addr, "alice").await;
    let mut bob = connect(addr, "bob").await;
    wait_for_connections(&state, 2).await;

    state.db.pool().close().await;
    alice.send(Message::Text("hello".into())).await.unwrap();

    assert_eq!(next_text(&mut bob).await, "User alice: hello");
}

#[tokio::test]
async fn test_disconnect_announces_departure() {
    let (addr, state, _static_dir) = spawn_server().await;

    let mut alice = connect(addr, "alice").await;
    let mut bob = connect(addr, "bob").await;
    wait_for_connections(&state, 2).await;

    alice.close(None).await.unwrap();

    assert_eq!(next_text(&mut bob).await, "User alice left the chat");
    wait_for_connections(&state, 1).await;
}

#[tokio::test]
async fn test_entry_page_is_served() {
    let (addr, _state, _static_dir) = spawn_server().await;

    let body = reqwest::get(format!("http://{}/", addr))
        .await
        .unwrap()
        .text()
        .await
        .unwrap();

    assert_eq!(body, "<h1>chat</h1>");
}
