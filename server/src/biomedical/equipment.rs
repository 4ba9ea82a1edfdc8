use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use rusqlite::{params, Connection};
use serde::Deserialize;
use uuid::Uuid;

use crate::db::models::{Equipment, EquipmentStatus};
use crate::db::{internal_error, not_found_or_internal, with_conn, ApiError};
use crate::state::AppState;
use crate::ws::broadcast::broadcast_to_all;
use crate::ws::events::{RecordAction, ServerEvent};

#[derive(Debug, Deserialize)]
pub struct CreateEquipmentRequest {
    pub name: String,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub status: Option<EquipmentStatus>,
}

#[derive(Debug, Deserialize)]
pub struct EquipmentStatusRequest {
    pub status: EquipmentStatus,
}

fn load_equipment(conn: &Connection, id: &str) -> Result<Equipment, ApiError> {
    conn.query_row(
        &format!("SELECT {} FROM equipment WHERE id = ?1", Equipment::COLUMNS),
        [id],
        Equipment::from_row,
    )
    .map_err(|e| not_found_or_internal("Equipment", e))
}

fn push_update(state: &AppState, action: RecordAction, equipment: &Equipment) {
    broadcast_to_all(
        &state.biomedical,
        ServerEvent::EquipmentUpdate {
            action,
            data: equipment.clone(),
        },
    );
}

/// GET /api/biomedical/equipment
pub async fn list_equipment(
    State(state): State<AppState>,
) -> Result<Json<Vec<Equipment>>, ApiError> {
    let equipment = with_conn(&state.db, |conn| {
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {} FROM equipment ORDER BY name COLLATE NOCASE ASC",
                Equipment::COLUMNS
            ))
            .map_err(|e| internal_error("equipment query", e))?;
        let rows = stmt
            .query_map([], Equipment::from_row)
            .map_err(|e| internal_error("equipment query", e))?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(|e| internal_error("equipment row", e))?;
        Ok(rows)
    })
    .await?;

    Ok(Json(equipment))
}

/// POST /api/biomedical/equipment
pub async fn create_equipment(
    State(state): State<AppState>,
    Json(req): Json<CreateEquipmentRequest>,
) -> Result<(StatusCode, Json<Equipment>), ApiError> {
    if req.name.trim().is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            "Equipment name cannot be empty".to_string(),
        ));
    }
    let status = req.status.unwrap_or(EquipmentStatus::Operational);

    let equipment = with_conn(&state.db, move |conn| {
        let id = Uuid::now_v7().to_string();
        let now = Utc::now().to_rfc3339();
        conn.execute(
            "INSERT INTO equipment (id, name, location, status, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
            params![id, req.name.trim(), req.location, status.as_str(), now],
        )
        .map_err(|e| internal_error("equipment insert", e))?;
        load_equipment(conn, &id)
    })
    .await?;

    push_update(&state, RecordAction::Created, &equipment);
    tracing::info!(equipment_id = %equipment.id, name = %equipment.name, "Equipment registered");

    Ok((StatusCode::CREATED, Json(equipment)))
}

/// PUT /api/biomedical/equipment/{id}/status
pub async fn update_equipment_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<EquipmentStatusRequest>,
) -> Result<Json<Equipment>, ApiError> {
    let equipment = with_conn(&state.db, move |conn| {
        let changed = conn
            .execute(
                "UPDATE equipment SET status = ?1, updated_at = ?2 WHERE id = ?3",
                params![req.status.as_str(), Utc::now().to_rfc3339(), id],
            )
            .map_err(|e| internal_error("equipment update", e))?;
        if changed == 0 {
            return Err((StatusCode::NOT_FOUND, "Equipment not found".to_string()));
        }
        load_equipment(conn, &id)
    })
    .await?;

    push_update(&state, RecordAction::Updated, &equipment);
    tracing::info!(
        equipment_id = %equipment.id,
        status = equipment.status.as_str(),
        "Equipment status changed"
    );

    Ok(Json(equipment))
}
