use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::state::AppState;
use crate::ws::ConnectionRegistry;

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistryStats {
    pub actors: usize,
    pub connections: usize,
}

impl RegistryStats {
    fn of(registry: &ConnectionRegistry) -> Self {
        Self {
            actors: registry.actor_count(),
            connections: registry.total_connections(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RealtimeStats {
    pub clinical: RegistryStats,
    pub biomedical: RegistryStats,
}

/// GET /api/realtime/stats — Live socket counts per registry.
pub async fn realtime_stats(State(state): State<AppState>) -> Json<RealtimeStats> {
    Json(RealtimeStats {
        clinical: RegistryStats::of(&state.clinical),
        biomedical: RegistryStats::of(&state.biomedical),
    })
}
