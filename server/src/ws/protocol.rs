use axum::extract::ws::Message;

use super::events::{ClientMessage, Envelope, ServerEvent};
use super::{ActorKey, ConnectionHandle, ConnectionRegistry, RegistryScope};

/// Everything the reader loop needs to act on one socket's messages.
#[derive(Clone)]
pub struct ConnectionContext {
    pub handle: ConnectionHandle,
    pub registry: ConnectionRegistry,
    pub scope: RegistryScope,
}

/// Handle an incoming text (JSON) message.
/// Malformed or unknown messages are logged and ignored.
pub fn handle_text_message(text: &str, ctx: &ConnectionContext) {
    let message = match serde_json::from_str::<ClientMessage>(text) {
        Ok(msg) => msg,
        Err(e) => {
            tracing::debug!(
                connection_id = %ctx.handle.id,
                error = %e,
                "Ignoring malformed client message: {}",
                text.chars().take(100).collect::<String>()
            );
            return;
        }
    };

    match message {
        ClientMessage::Register(ids) => match ids.resolve(ctx.scope) {
            Some(key) => bind(ctx, key),
            None => {
                tracing::debug!(
                    connection_id = %ctx.handle.id,
                    scope = ?ctx.scope,
                    "Register message carried no id usable on this endpoint"
                );
            }
        },
        ClientMessage::Ping => send_direct(ctx, &Envelope::now(ServerEvent::Pong)),
    }
}

/// Register the socket under `key` and acknowledge.
pub fn bind(ctx: &ConnectionContext, key: ActorKey) {
    ctx.registry.register(key.clone(), ctx.handle.clone());
    send_direct(ctx, &Envelope::now(ServerEvent::registered(&key)));
    tracing::info!(
        actor = %key,
        connection_id = %ctx.handle.id,
        "Socket bound to actor"
    );
}

/// Reply on this socket only, bypassing the registry.
fn send_direct(ctx: &ConnectionContext, envelope: &Envelope) {
    match serde_json::to_string(envelope) {
        Ok(text) => {
            let _ = ctx.handle.sender.send(Message::Text(text.into()));
        }
        Err(e) => {
            tracing::warn!(error = %e, "Failed to serialize reply");
        }
    }
}
