//! Connection registry: which live sockets speak for which actor.
//!
//! An actor can have several sockets at once (tabs, devices). A socket is
//! bound to at most one actor per registry, and an actor with no sockets left
//! is removed. Delivery is best-effort: nothing is queued for actors that are
//! not connected.

use axum::extract::ws::{Message, Utf8Bytes};
use dashmap::DashMap;
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

use super::{ActorKey, ConnectionId, ConnectionSender};

/// One live socket: its id plus the channel feeding its writer task.
#[derive(Debug, Clone)]
pub struct ConnectionHandle {
    pub id: ConnectionId,
    pub sender: ConnectionSender,
}

impl ConnectionHandle {
    pub fn new(sender: ConnectionSender) -> Self {
        Self {
            id: Uuid::now_v7(),
            sender,
        }
    }

    /// The writer task is still draining this channel.
    pub fn is_open(&self) -> bool {
        !self.sender.is_closed()
    }
}

#[derive(Default)]
struct RegistryInner {
    connections: DashMap<ActorKey, Vec<ConnectionHandle>>,
    /// Reverse index: which actor each socket is bound to.
    owners: DashMap<ConnectionId, ActorKey>,
}

/// Cheap to clone; clones share the same maps.
#[derive(Clone, Default)]
pub struct ConnectionRegistry {
    inner: Arc<RegistryInner>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `handle` to `key`. Registering the same socket twice is a no-op;
    /// registering it under a different key moves it there.
    pub fn register(&self, key: ActorKey, handle: ConnectionHandle) {
        let id = handle.id;
        if let Some(previous) = self.inner.owners.insert(id, key.clone()) {
            if previous != key {
                self.detach(&previous, id);
            }
        }

        let count = {
            let mut handles = self.inner.connections.entry(key.clone()).or_default();
            if !handles.iter().any(|h| h.id == id) {
                handles.push(handle);
            }
            handles.len()
        };

        tracing::debug!(
            actor = %key,
            connection_id = %id,
            connections = count,
            "Connection registered"
        );
    }

    /// Remove one socket from `key`. Unknown keys or sockets are ignored.
    pub fn unregister(&self, key: &ActorKey, id: ConnectionId) {
        self.inner.owners.remove_if(&id, |_, owner| owner == key);
        self.detach(key, id);
    }

    /// Remove a socket from whichever actor it is bound to.
    pub fn remove_connection(&self, id: ConnectionId) -> Option<ActorKey> {
        let (_, key) = self.inner.owners.remove(&id)?;
        self.detach(&key, id);
        Some(key)
    }

    fn detach(&self, key: &ActorKey, id: ConnectionId) {
        let now_empty = match self.inner.connections.get_mut(key) {
            Some(mut handles) => {
                handles.retain(|h| h.id != id);
                handles.is_empty()
            }
            None => return,
        };

        if now_empty {
            self.inner
                .connections
                .remove_if(key, |_, handles| handles.is_empty());
        }

        tracing::debug!(actor = %key, connection_id = %id, "Connection unregistered");
    }

    /// Serialize `payload` once and write it to every open socket of `key`.
    /// Returns the number of sockets written to.
    pub fn send<T: Serialize>(&self, key: &ActorKey, payload: &T) -> usize {
        let Some(text) = encode(payload) else {
            return 0;
        };
        match self.inner.connections.get(key) {
            Some(handles) => deliver(handles.value(), &text),
            None => 0,
        }
    }

    /// Write `payload` to every open socket of every actor.
    pub fn broadcast_all<T: Serialize>(&self, payload: &T) -> usize {
        let Some(text) = encode(payload) else {
            return 0;
        };
        self.inner
            .connections
            .iter()
            .map(|entry| deliver(entry.value(), &text))
            .sum()
    }

    pub fn contains(&self, key: &ActorKey) -> bool {
        self.inner.connections.contains_key(key)
    }

    pub fn connection_count(&self, key: &ActorKey) -> usize {
        self.inner
            .connections
            .get(key)
            .map(|handles| handles.len())
            .unwrap_or(0)
    }

    /// Number of actors with at least one socket.
    pub fn actor_count(&self) -> usize {
        self.inner.connections.len()
    }

    pub fn total_connections(&self) -> usize {
        self.inner.owners.len()
    }

    pub fn actors(&self) -> Vec<ActorKey> {
        self.inner
            .connections
            .iter()
            .map(|entry| entry.key().clone())
            .collect()
    }
}

fn encode<T: Serialize>(payload: &T) -> Option<Utf8Bytes> {
    match serde_json::to_string(payload) {
        Ok(text) => Some(Utf8Bytes::from(text)),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to serialize push payload");
            None
        }
    }
}

/// Closed sockets are skipped here and cleaned up by their own close path.
fn deliver(handles: &[ConnectionHandle], text: &Utf8Bytes) -> usize {
    let mut delivered = 0;
    for handle in handles.iter().filter(|h| h.is_open()) {
        match handle.sender.send(Message::Text(text.clone())) {
            Ok(()) => delivered += 1,
            Err(_) => {
                tracing::debug!(connection_id = %handle.id, "Push to closing connection dropped");
            }
        }
    }
    delivered
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tokio::sync::mpsc;

    fn handle() -> (ConnectionHandle, mpsc::UnboundedReceiver<Message>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (ConnectionHandle::new(tx), rx)
    }

    fn drain(rx: &mut mpsc::UnboundedReceiver<Message>) -> Vec<serde_json::Value> {
        let mut out = Vec::new();
        while let Ok(msg) = rx.try_recv() {
            match msg {
                Message::Text(text) => out.push(serde_json::from_str(text.as_str()).unwrap()),
                other => panic!("unexpected frame {:?}", other),
            }
        }
        out
    }

    #[test]
    fn test_send_delivers_exactly_one_copy() {
        let registry = ConnectionRegistry::new();
        let key = ActorKey::patient("p1");
        let (h, mut rx) = handle();
        registry.register(key.clone(), h);

        let payload = json!({"type": "notification", "data": {"title": "hi"}});
        assert_eq!(registry.send(&key, &payload), 1);
        assert_eq!(drain(&mut rx), vec![payload]);
    }

    #[test]
    fn test_duplicate_register_is_idempotent() {
        let registry = ConnectionRegistry::new();
        let key = ActorKey::doctor("d1");
        let (h, mut rx) = handle();
        registry.register(key.clone(), h.clone());
        registry.register(key.clone(), h);

        assert_eq!(registry.connection_count(&key), 1);
        assert_eq!(registry.send(&key, &json!({"n": 1})), 1);
        assert_eq!(drain(&mut rx).len(), 1);
    }

    #[test]
    fn test_multiple_sockets_per_actor() {
        let registry = ConnectionRegistry::new();
        let key = ActorKey::patient("p1");
        let (h1, mut rx1) = handle();
        let (h2, mut rx2) = handle();
        registry.register(key.clone(), h1);
        registry.register(key.clone(), h2);

        assert_eq!(registry.send(&key, &json!({"n": 1})), 2);
        assert_eq!(drain(&mut rx1).len(), 1);
        assert_eq!(drain(&mut rx2).len(), 1);
        assert_eq!(registry.actor_count(), 1);
        assert_eq!(registry.total_connections(), 2);
    }

    #[test]
    fn test_unregister_stops_delivery_and_drops_empty_key() {
        let registry = ConnectionRegistry::new();
        let key = ActorKey::patient("p1");
        let (h1, mut rx1) = handle();
        let (h2, mut rx2) = handle();
        let (id1, id2) = (h1.id, h2.id);
        registry.register(key.clone(), h1);
        registry.register(key.clone(), h2);

        registry.unregister(&key, id1);
        assert_eq!(registry.send(&key, &json!({"n": 1})), 1);
        assert!(drain(&mut rx1).is_empty());
        assert_eq!(drain(&mut rx2).len(), 1);
        assert!(registry.contains(&key));

        registry.unregister(&key, id2);
        assert!(!registry.contains(&key));
        assert!(registry.actors().is_empty());
        assert_eq!(registry.total_connections(), 0);
    }

    #[test]
    fn test_unknown_key_and_socket_are_noops() {
        let registry = ConnectionRegistry::new();
        let key = ActorKey::pharmacist("ph1");
        assert_eq!(registry.send(&key, &json!({"n": 1})), 0);
        registry.unregister(&key, Uuid::now_v7());
        assert_eq!(registry.remove_connection(Uuid::now_v7()), None);
        assert_eq!(registry.actor_count(), 0);
    }

    #[test]
    fn test_register_under_new_key_moves_socket() {
        let registry = ConnectionRegistry::new();
        let first = ActorKey::patient("p1");
        let second = ActorKey::patient("p2");
        let (h, mut rx) = handle();
        registry.register(first.clone(), h.clone());
        registry.register(second.clone(), h);

        assert!(!registry.contains(&first));
        assert_eq!(registry.send(&first, &json!({"n": 1})), 0);
        assert_eq!(registry.send(&second, &json!({"n": 2})), 1);
        assert_eq!(drain(&mut rx), vec![json!({"n": 2})]);
    }

    #[test]
    fn test_unregister_with_wrong_key_keeps_binding() {
        let registry = ConnectionRegistry::new();
        let key = ActorKey::patient("p1");
        let (h, _rx) = handle();
        let id = h.id;
        registry.register(key.clone(), h);

        registry.unregister(&ActorKey::patient("other"), id);
        assert_eq!(registry.remove_connection(id), Some(key.clone()));
        assert!(!registry.contains(&key));
    }

    #[test]
    fn test_closed_sockets_are_skipped_not_removed() {
        let registry = ConnectionRegistry::new();
        let key = ActorKey::biomedical("b1");
        let (open, mut open_rx) = handle();
        let (closed, closed_rx) = handle();
        registry.register(key.clone(), open);
        registry.register(key.clone(), closed);
        drop(closed_rx);

        assert_eq!(registry.send(&key, &json!({"n": 1})), 1);
        assert_eq!(drain(&mut open_rx).len(), 1);
        assert_eq!(registry.connection_count(&key), 2);
    }

    #[test]
    fn test_broadcast_all_reaches_every_actor() {
        let registry = ConnectionRegistry::new();
        let (h1, mut rx1) = handle();
        let (h2, mut rx2) = handle();
        let (h3, mut rx3) = handle();
        registry.register(ActorKey::patient("p1"), h1);
        registry.register(ActorKey::doctor("d1"), h2);
        registry.register(ActorKey::doctor("d1"), h3);

        assert_eq!(registry.broadcast_all(&json!({"type": "medicine-added"})), 3);
        for rx in [&mut rx1, &mut rx2, &mut rx3] {
            assert_eq!(drain(rx).len(), 1);
        }
    }

    #[test]
    fn test_clones_share_state() {
        let registry = ConnectionRegistry::new();
        let clone = registry.clone();
        let (h, _rx) = handle();
        clone.register(ActorKey::patient("p1"), h);
        assert!(registry.contains(&ActorKey::patient("p1")));
    }
}
