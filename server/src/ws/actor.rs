use axum::extract::ws::{CloseFrame, Message, WebSocket};
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{interval, timeout};

use crate::ws::protocol::{self, ConnectionContext};
use crate::ws::{ActorKey, ConnectionHandle, ConnectionRegistry, ConnectionSender, RegistryScope};

/// Ping interval: server sends WebSocket ping every 30 seconds.
/// Prevents connection leaks from abrupt disconnects.
const PING_INTERVAL: Duration = Duration::from_secs(30);

/// Pong timeout: if pong not received within 10 seconds after ping, close.
const PONG_TIMEOUT: Duration = Duration::from_secs(10);

/// Ping cadence and pong deadline for one socket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeepAlive {
    pub ping_interval: Duration,
    pub pong_timeout: Duration,
}

impl Default for KeepAlive {
    fn default() -> Self {
        Self {
            ping_interval: PING_INTERVAL,
            pong_timeout: PONG_TIMEOUT,
        }
    }
}

/// Drive one socket until it closes.
///
/// The sink is owned by a writer task fed through the handle's channel, so
/// registry pushes from REST handlers never touch the socket directly. A
/// keep-alive task pings on a timer; this task reads frames until the peer
/// leaves or stops answering pings, then unbinds the socket from the registry.
///
/// With `initial` set (ids in the query string) the socket is bound right
/// away; otherwise it waits for a `register` message.
pub async fn run_connection(
    socket: WebSocket,
    registry: ConnectionRegistry,
    scope: RegistryScope,
    initial: Option<ActorKey>,
    keepalive: KeepAlive,
) {
    let (sink, stream) = socket.split();
    let (out_tx, out_rx) = mpsc::unbounded_channel::<Message>();
    let (pong_tx, pong_rx) = mpsc::unbounded_channel::<()>();

    let ctx = ConnectionContext {
        handle: ConnectionHandle::new(out_tx.clone()),
        registry,
        scope,
    };
    let connection_id = ctx.handle.id;
    tracing::info!(connection_id = %connection_id, scope = ?scope, "Socket opened");

    let writer = tokio::spawn(write_frames(sink, out_rx));
    let mut pinger = tokio::spawn(keep_alive(out_tx.clone(), pong_rx, keepalive));

    if let Some(key) = initial {
        protocol::bind(&ctx, key);
    }

    // A silent peer never sends the frame the reader is waiting for, so the
    // keep-alive task ending (pong timeout or dead writer) also ends the read.
    tokio::select! {
        _ = read_frames(stream, &ctx, &out_tx, &pong_tx) => {}
        _ = &mut pinger => {
            tracing::info!(connection_id = %connection_id, "Keep-alive gave up on socket");
        }
    }

    let released = ctx.registry.remove_connection(connection_id);
    writer.abort();
    pinger.abort();

    tracing::info!(
        connection_id = %connection_id,
        actor = ?released.map(|key| key.to_string()),
        "Socket closed"
    );
}

/// Reader half: dispatch text frames, answer pings, note pongs.
async fn read_frames(
    mut stream: SplitStream<WebSocket>,
    ctx: &ConnectionContext,
    out_tx: &ConnectionSender,
    pong_tx: &mpsc::UnboundedSender<()>,
) {
    let connection_id = ctx.handle.id;
    while let Some(frame) = stream.next().await {
        let msg = match frame {
            Ok(msg) => msg,
            Err(e) => {
                tracing::warn!(connection_id = %connection_id, error = %e, "Socket read failed");
                return;
            }
        };

        match msg {
            Message::Text(text) => protocol::handle_text_message(text.as_str(), ctx),
            Message::Ping(payload) => {
                let _ = out_tx.send(Message::Pong(payload));
            }
            Message::Pong(_) => {
                let _ = pong_tx.send(());
            }
            Message::Binary(data) => {
                tracing::debug!(
                    connection_id = %connection_id,
                    bytes = data.len(),
                    "Binary frame ignored"
                );
            }
            Message::Close(frame) => {
                tracing::info!(connection_id = %connection_id, frame = ?frame, "Peer closed socket");
                return;
            }
        }
    }
    tracing::debug!(connection_id = %connection_id, "Socket stream ended");
}

/// Ping on a timer; close the socket if a pong does not come back in time.
async fn keep_alive(
    out_tx: ConnectionSender,
    mut pong_rx: mpsc::UnboundedReceiver<()>,
    settings: KeepAlive,
) {
    let mut ticker = interval(settings.ping_interval);
    // first tick fires immediately
    ticker.tick().await;

    loop {
        ticker.tick().await;
        if out_tx.send(Message::Ping(Vec::new().into())).is_err() {
            return;
        }

        if !matches!(timeout(settings.pong_timeout, pong_rx.recv()).await, Ok(Some(()))) {
            tracing::warn!("Pong timeout, closing connection");
            let _ = out_tx.send(Message::Close(Some(CloseFrame {
                code: 1001,
                reason: "Pong timeout".into(),
            })));
            return;
        }
    }
}

/// Writer half: the only place the sink is written.
async fn write_frames(mut sink: SplitSink<WebSocket, Message>, mut out_rx: mpsc::UnboundedReceiver<Message>) {
    while let Some(msg) = out_rx.recv().await {
        if sink.send(msg).await.is_err() {
            return;
        }
    }
}
