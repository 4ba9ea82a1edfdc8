//! Shared helpers for the integration tests: a real server on a random port
//! backed by a throwaway data directory, plus WebSocket read helpers.

#![allow(dead_code)]

use futures_util::StreamExt;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

use hospital_server::triage::TriageClassifier;
use hospital_server::ws::{ConnectionRegistry, KeepAlive};

pub type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

pub struct TestServer {
    pub base_url: String,
    pub addr: SocketAddr,
    pub clinical: ConnectionRegistry,
    pub biomedical: ConnectionRegistry,
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub fn ws_url(&self, path_and_query: &str) -> String {
        format!("ws://{}{}", self.addr, path_and_query)
    }
}

/// Start the server on a random port with 15-minute consultations and
/// rule-based triage.
pub async fn start_test_server() -> TestServer {
    start_test_server_with(KeepAlive::default()).await
}

/// Same as `start_test_server` with a custom ping cadence.
pub async fn start_test_server_with(keepalive: KeepAlive) -> TestServer {
    let tmp_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let data_dir = tmp_dir.path().to_str().unwrap().to_string();

    let db = hospital_server::db::init_db(&data_dir).expect("Failed to init DB");
    let clinical = ConnectionRegistry::new();
    let biomedical = ConnectionRegistry::new();

    let state = hospital_server::state::AppState {
        db,
        clinical: clinical.clone(),
        biomedical: biomedical.clone(),
        triage: Arc::new(TriageClassifier::rules_only()),
        avg_consultation_minutes: 15,
        keepalive,
    };

    let app = hospital_server::routes::build_router(state);
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
        .unwrap();
        let _keep = tmp_dir;
    });

    TestServer {
        base_url: format!("http://{}", addr),
        addr,
        clinical,
        biomedical,
    }
}

/// Open a socket and wait for the registration acknowledgement.
pub async fn connect(server: &TestServer, path_and_query: &str) -> WsStream {
    let (mut ws, _) = tokio_tungstenite::connect_async(server.ws_url(path_and_query))
        .await
        .expect("WebSocket connect failed");
    let ack = next_json(&mut ws).await;
    assert!(
        ack["type"].as_str().unwrap().ends_with("registered"),
        "expected registration ack, got {}",
        ack
    );
    ws
}

/// Next JSON text frame, skipping control frames. Panics after 2 seconds.
pub async fn next_json<S>(ws: &mut S) -> serde_json::Value
where
    S: futures_util::Stream<Item = Result<Message, tokio_tungstenite::tungstenite::Error>>
        + Unpin,
{
    let deadline = Duration::from_secs(2);
    loop {
        let msg = tokio::time::timeout(deadline, ws.next())
            .await
            .expect("Timed out waiting for a WebSocket message")
            .expect("WebSocket stream ended")
            .expect("WebSocket error");
        match msg {
            Message::Text(text) => {
                return serde_json::from_str(text.as_str()).expect("Invalid JSON frame");
            }
            Message::Ping(_) | Message::Pong(_) => continue,
            other => panic!("Unexpected frame: {:?}", other),
        }
    }
}

/// Next frame with the given `type`, skipping others.
pub async fn next_of_type<S>(ws: &mut S, kind: &str) -> serde_json::Value
where
    S: futures_util::Stream<Item = Result<Message, tokio_tungstenite::tungstenite::Error>>
        + Unpin,
{
    loop {
        let value = next_json(ws).await;
        if value["type"] == kind {
            return value;
        }
    }
}

/// Assert nothing arrives for a short while.
pub async fn assert_silent<S>(ws: &mut S)
where
    S: futures_util::Stream<Item = Result<Message, tokio_tungstenite::tungstenite::Error>>
        + Unpin,
{
    if let Ok(Some(Ok(Message::Text(text)))) =
        tokio::time::timeout(Duration::from_millis(200), ws.next()).await
    {
        panic!("Expected no message, got {}", text);
    }
}

/// Poll until `check` holds; registry updates race the HTTP side slightly.
pub async fn wait_until(mut check: impl FnMut() -> bool) {
    for _ in 0..50 {
        if check() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("Condition not reached in time");
}
