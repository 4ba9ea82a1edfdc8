use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use rusqlite::{params, Connection};
use serde::Deserialize;
use uuid::Uuid;

use crate::db::models::{WasteRecord, WasteStatus};
use crate::db::{internal_error, not_found_or_internal, with_conn, ApiError};
use crate::state::AppState;
use crate::ws::broadcast::broadcast_to_all;
use crate::ws::events::{RecordAction, ServerEvent};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateWasteRequest {
    pub category: String,
    pub weight_kg: f64,
    #[serde(default)]
    pub source_location: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct WasteStatusRequest {
    pub status: WasteStatus,
}

#[derive(Debug, Deserialize)]
pub struct DispatchRequest {
    pub destination: String,
    #[serde(default)]
    pub vehicle: Option<String>,
}

pub(crate) fn load_waste(conn: &Connection, id: &str) -> Result<WasteRecord, ApiError> {
    conn.query_row(
        &format!("SELECT {} FROM waste_records WHERE id = ?1", WasteRecord::COLUMNS),
        [id],
        WasteRecord::from_row,
    )
    .map_err(|e| not_found_or_internal("Waste record", e))
}

/// Set the status of a waste record. Returns false when no row matched.
fn set_waste_status(
    conn: &Connection,
    id: &str,
    status: WasteStatus,
) -> Result<bool, ApiError> {
    let changed = conn
        .execute(
            "UPDATE waste_records SET status = ?1, updated_at = ?2 WHERE id = ?3",
            params![status.as_str(), Utc::now().to_rfc3339(), id],
        )
        .map_err(|e| internal_error("waste update", e))?;
    Ok(changed > 0)
}

/// Move a waste record from `from` to `to`. Returns false when the record is
/// missing or not currently in `from`.
pub(crate) fn advance_waste_status(
    conn: &Connection,
    id: &str,
    from: WasteStatus,
    to: WasteStatus,
) -> Result<bool, ApiError> {
    let changed = conn
        .execute(
            "UPDATE waste_records SET status = ?1, updated_at = ?2 WHERE id = ?3 AND status = ?4",
            params![to.as_str(), Utc::now().to_rfc3339(), id, from.as_str()],
        )
        .map_err(|e| internal_error("waste update", e))?;
    Ok(changed > 0)
}

/// GET /api/biomedical/waste — Newest first.
pub async fn list_waste(State(state): State<AppState>) -> Result<Json<Vec<WasteRecord>>, ApiError> {
    let records = with_conn(&state.db, |conn| {
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {} FROM waste_records ORDER BY created_at DESC, id DESC",
                WasteRecord::COLUMNS
            ))
            .map_err(|e| internal_error("waste query", e))?;
        let rows = stmt
            .query_map([], WasteRecord::from_row)
            .map_err(|e| internal_error("waste query", e))?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(|e| internal_error("waste row", e))?;
        Ok(rows)
    })
    .await?;

    Ok(Json(records))
}

/// POST /api/biomedical/waste
pub async fn create_waste(
    State(state): State<AppState>,
    Json(req): Json<CreateWasteRequest>,
) -> Result<(StatusCode, Json<WasteRecord>), ApiError> {
    if req.category.trim().is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            "Waste category cannot be empty".to_string(),
        ));
    }
    if !req.weight_kg.is_finite() || req.weight_kg <= 0.0 {
        return Err((
            StatusCode::BAD_REQUEST,
            "Weight must be a positive number".to_string(),
        ));
    }

    let record = with_conn(&state.db, move |conn| {
        let id = Uuid::now_v7().to_string();
        let now = Utc::now().to_rfc3339();
        conn.execute(
            "INSERT INTO waste_records (id, category, weight_kg, source_location, status, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)",
            params![
                id,
                req.category.trim(),
                req.weight_kg,
                req.source_location,
                WasteStatus::Pending.as_str(),
                now
            ],
        )
        .map_err(|e| internal_error("waste insert", e))?;
        load_waste(conn, &id)
    })
    .await?;

    broadcast_to_all(
        &state.biomedical,
        ServerEvent::WasteUpdate {
            action: RecordAction::Created,
            data: record.clone(),
        },
    );
    tracing::info!(waste_id = %record.id, category = %record.category, "Waste recorded");

    Ok((StatusCode::CREATED, Json(record)))
}

/// PUT /api/biomedical/waste/{id}/status
pub async fn update_waste_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<WasteStatusRequest>,
) -> Result<Json<WasteRecord>, ApiError> {
    let record = with_conn(&state.db, move |conn| {
        if !set_waste_status(conn, &id, req.status)? {
            return Err((StatusCode::NOT_FOUND, "Waste record not found".to_string()));
        }
        load_waste(conn, &id)
    })
    .await?;

    broadcast_to_all(
        &state.biomedical,
        ServerEvent::WasteUpdate {
            action: RecordAction::Updated,
            data: record.clone(),
        },
    );

    Ok(Json(record))
}

/// POST /api/biomedical/waste/{id}/dispatch — Hand the waste to a carrier.
pub async fn dispatch_waste(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<DispatchRequest>,
) -> Result<Json<WasteRecord>, ApiError> {
    let destination = req.destination.trim().to_string();
    if destination.is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            "Destination cannot be empty".to_string(),
        ));
    }

    let record = with_conn(&state.db, move |conn| {
        let current = load_waste(conn, &id)?;
        if current.status == WasteStatus::Disposed {
            return Err((
                StatusCode::CONFLICT,
                "Waste has already been disposed".to_string(),
            ));
        }
        conn.execute(
            "UPDATE waste_records SET status = ?1, destination = ?2, vehicle = ?3, updated_at = ?4
             WHERE id = ?5",
            params![
                WasteStatus::Dispatched.as_str(),
                destination,
                req.vehicle,
                Utc::now().to_rfc3339(),
                id
            ],
        )
        .map_err(|e| internal_error("waste dispatch", e))?;
        load_waste(conn, &id)
    })
    .await?;

    broadcast_to_all(
        &state.biomedical,
        ServerEvent::DispatchUpdate {
            action: RecordAction::Dispatched,
            data: record.clone(),
        },
    );
    tracing::info!(
        waste_id = %record.id,
        destination = ?record.destination,
        "Waste dispatched"
    );

    Ok(Json(record))
}
