//! Push helpers used by the REST handlers after a write commits.
//! Delivery is best-effort; the HTTP response never depends on it.

use super::events::{Envelope, ServerEvent};
use super::{ActorKey, ConnectionRegistry};

/// Push an event to every socket of one actor.
pub fn send_to_actor(registry: &ConnectionRegistry, key: &ActorKey, event: ServerEvent) -> usize {
    let kind = event.kind();
    let delivered = registry.send(key, &Envelope::now(event));
    tracing::debug!(actor = %key, event = kind, delivered, "Event pushed");
    delivered
}

/// Push an event to every connected socket of the registry.
pub fn broadcast_to_all(registry: &ConnectionRegistry, event: ServerEvent) -> usize {
    let kind = event.kind();
    let delivered = registry.broadcast_all(&Envelope::now(event));
    tracing::debug!(event = kind, delivered, "Event broadcast");
    delivered
}
