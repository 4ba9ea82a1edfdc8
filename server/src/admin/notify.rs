use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};

use crate::db::ApiError;
use crate::state::AppState;
use crate::ws::broadcast::{broadcast_to_all, send_to_actor};
use crate::ws::events::{Notification, NotificationLevel, ServerEvent};
use crate::ws::{ActorKey, ActorRole};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotifyRequest {
    pub role: ActorRole,
    /// When absent, every socket of the role's registry is notified.
    #[serde(default)]
    pub actor_id: Option<String>,
    pub title: String,
    pub message: String,
    #[serde(default)]
    pub level: NotificationLevel,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct NotifyResponse {
    pub delivered: usize,
}

/// POST /api/notifications — Push a notification to one actor or to a whole registry.
pub async fn send_notification(
    State(state): State<AppState>,
    Json(req): Json<NotifyRequest>,
) -> Result<Json<NotifyResponse>, ApiError> {
    if req.title.trim().is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            "Notification title cannot be empty".to_string(),
        ));
    }

    let registry = state.registry_for(req.role);
    let event = ServerEvent::Notification {
        data: Notification {
            title: req.title,
            message: req.message,
            level: req.level,
        },
    };

    let delivered = match req.actor_id.as_deref().map(str::trim) {
        Some(id) if !id.is_empty() => {
            send_to_actor(registry, &ActorKey::new(req.role, id), event)
        }
        _ => broadcast_to_all(registry, event),
    };

    tracing::info!(
        role = req.role.as_str(),
        actor_id = ?req.actor_id,
        delivered,
        "Notification sent"
    );

    Ok(Json(NotifyResponse { delivered }))
}
