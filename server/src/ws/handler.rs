use axum::{
    extract::{ws::WebSocketUpgrade, Query, State},
    response::Response,
};

use crate::state::AppState;
use crate::ws::{actor, ActorIds, RegistryScope};

/// GET /ws?patientId=…|doctorId=…|pharmacistId=…
/// Clinical socket. The actor may also be named later with a `register`
/// message, so a missing id is not an error.
pub async fn clinical_ws_upgrade(
    State(state): State<AppState>,
    Query(ids): Query<ActorIds>,
    ws: WebSocketUpgrade,
) -> Response {
    let initial = ids.resolve(RegistryScope::Clinical);
    tracing::debug!(actor = ?initial.as_ref().map(|k| k.to_string()), "Clinical WebSocket upgrade");

    let registry = state.clinical.clone();
    let keepalive = state.keepalive;
    ws.on_upgrade(move |socket| {
        actor::run_connection(socket, registry, RegistryScope::Clinical, initial, keepalive)
    })
}

/// GET /ws/biomedical?biomedicalUserId=…
/// Socket for biomedical staff (equipment, waste and collection pushes).
pub async fn biomedical_ws_upgrade(
    State(state): State<AppState>,
    Query(ids): Query<ActorIds>,
    ws: WebSocketUpgrade,
) -> Response {
    let initial = ids.resolve(RegistryScope::Biomedical);
    tracing::debug!(actor = ?initial.as_ref().map(|k| k.to_string()), "Biomedical WebSocket upgrade");

    let registry = state.biomedical.clone();
    let keepalive = state.keepalive;
    ws.on_upgrade(move |socket| {
        actor::run_connection(socket, registry, RegistryScope::Biomedical, initial, keepalive)
    })
}
