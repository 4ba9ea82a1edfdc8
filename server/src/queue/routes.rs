use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::wait_time::estimate_waits;
use crate::db::models::{QueueEntry, QueueStatus};
use crate::db::{internal_error, not_found_or_internal, with_conn, ApiError};
use crate::state::AppState;
use crate::ws::broadcast::send_to_actor;
use crate::ws::events::{
    NavigationUpdate, Notification, NotificationLevel, ServerEvent, StatusUpdate, WaitTimeUpdate,
};
use crate::ws::ActorKey;

// --- Request types ---

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckInRequest {
    pub patient_id: String,
    pub doctor_id: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: QueueStatus,
}

#[derive(Debug, Deserialize)]
pub struct NavigationRequest {
    pub destination: String,
    #[serde(default)]
    pub instructions: Option<String>,
}

// --- Response types ---

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueuePositionResponse {
    pub entry: QueueEntry,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimated_wait_minutes: Option<u32>,
}

impl QueuePositionResponse {
    fn new(entry: QueueEntry, wait: Option<&WaitTimeUpdate>) -> Self {
        Self {
            entry,
            position: wait.map(|w| w.position),
            estimated_wait_minutes: wait.map(|w| w.estimated_wait_minutes),
        }
    }
}

// --- Queries ---

fn load_entry(conn: &Connection, id: &str) -> Result<QueueEntry, ApiError> {
    conn.query_row(
        &format!("SELECT {} FROM queue_entries WHERE id = ?1", QueueEntry::COLUMNS),
        [id],
        QueueEntry::from_row,
    )
    .map_err(|e| not_found_or_internal("Queue entry", e))
}

/// Active entries of one doctor, in arrival order.
fn load_doctor_queue(conn: &Connection, doctor_id: &str) -> Result<Vec<QueueEntry>, ApiError> {
    let mut stmt = conn
        .prepare(&format!(
            "SELECT {} FROM queue_entries
             WHERE doctor_id = ?1 AND status IN ('waiting', 'in-consultation')
             ORDER BY created_at ASC, id ASC",
            QueueEntry::COLUMNS
        ))
        .map_err(|e| internal_error("queue query", e))?;

    let entries = stmt
        .query_map([doctor_id], QueueEntry::from_row)
        .map_err(|e| internal_error("queue query", e))?
        .collect::<rusqlite::Result<Vec<_>>>()
        .map_err(|e| internal_error("queue row", e))?;
    Ok(entries)
}

/// Push the current position and wait to every waiting patient of a doctor.
fn push_wait_times(state: &AppState, queue: &[QueueEntry]) {
    let waits = estimate_waits(queue, state.avg_consultation_minutes);
    let active = queue.iter().filter(|e| e.status.is_active());
    for (entry, wait) in active.zip(waits) {
        if entry.status == QueueStatus::Waiting {
            send_to_actor(
                &state.clinical,
                &ActorKey::patient(&entry.patient_id),
                ServerEvent::WaitTimeUpdate { data: wait },
            );
        }
    }
}

// --- Handlers ---

/// POST /api/queue — Check a patient in to a doctor's queue.
pub async fn check_in(
    State(state): State<AppState>,
    Json(req): Json<CheckInRequest>,
) -> Result<(StatusCode, Json<QueuePositionResponse>), ApiError> {
    let patient_id = req.patient_id.trim().to_string();
    let doctor_id = req.doctor_id.trim().to_string();
    if patient_id.is_empty() || doctor_id.is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            "patientId and doctorId are required".to_string(),
        ));
    }

    let (entry, queue) = with_conn(&state.db, move |conn| {
        let already_queued: Option<String> = conn
            .query_row(
                "SELECT id FROM queue_entries
                 WHERE patient_id = ?1 AND doctor_id = ?2
                   AND status IN ('waiting', 'in-consultation')",
                params![patient_id, doctor_id],
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| internal_error("queue lookup", e))?;
        if already_queued.is_some() {
            return Err((
                StatusCode::CONFLICT,
                "Patient is already in this doctor's queue".to_string(),
            ));
        }

        let id = Uuid::now_v7().to_string();
        let now = Utc::now().to_rfc3339();
        conn.execute(
            "INSERT INTO queue_entries (id, patient_id, doctor_id, status, created_at, updated_at)
             VALUES (?1, ?2, ?3, 'waiting', ?4, ?4)",
            params![id, patient_id, doctor_id, now],
        )
        .map_err(|e| internal_error("queue insert", e))?;

        let entry = load_entry(conn, &id)?;
        let queue = load_doctor_queue(conn, &doctor_id)?;
        Ok((entry, queue))
    })
    .await?;

    let waits = estimate_waits(&queue, state.avg_consultation_minutes);
    let wait = waits.iter().find(|w| w.queue_entry_id == entry.id).cloned();

    if let Some(ref wait) = wait {
        send_to_actor(
            &state.clinical,
            &ActorKey::patient(&entry.patient_id),
            ServerEvent::WaitTimeUpdate { data: wait.clone() },
        );
    }
    send_to_actor(
        &state.clinical,
        &ActorKey::doctor(&entry.doctor_id),
        ServerEvent::Notification {
            data: Notification {
                title: "Patient checked in".to_string(),
                message: format!("Patient {} joined your queue", entry.patient_id),
                level: NotificationLevel::Info,
            },
        },
    );

    tracing::info!(
        queue_entry_id = %entry.id,
        doctor_id = %entry.doctor_id,
        position = ?wait.as_ref().map(|w| w.position),
        "Patient checked in"
    );

    Ok((
        StatusCode::CREATED,
        Json(QueuePositionResponse::new(entry, wait.as_ref())),
    ))
}

/// GET /api/queue/doctor/{doctor_id} — Active queue with positions.
pub async fn list_doctor_queue(
    State(state): State<AppState>,
    Path(doctor_id): Path<String>,
) -> Result<Json<Vec<QueuePositionResponse>>, ApiError> {
    let queue = with_conn(&state.db, move |conn| load_doctor_queue(conn, &doctor_id)).await?;

    let waits = estimate_waits(&queue, state.avg_consultation_minutes);
    let response = queue
        .into_iter()
        .zip(waits.iter())
        .map(|(entry, wait)| QueuePositionResponse::new(entry, Some(wait)))
        .collect();
    Ok(Json(response))
}

/// PUT /api/queue/{id}/status — Move an entry through the consultation flow.
/// Completed and cancelled entries are final.
pub async fn update_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<UpdateStatusRequest>,
) -> Result<Json<QueuePositionResponse>, ApiError> {
    let new_status = req.status;

    let (previous, entry, queue) = with_conn(&state.db, move |conn| {
        let current = load_entry(conn, &id)?;
        if !current.status.is_active() && current.status != new_status {
            return Err((
                StatusCode::CONFLICT,
                format!("Queue entry is already {}", current.status.as_str()),
            ));
        }

        conn.execute(
            "UPDATE queue_entries SET status = ?1, updated_at = ?2 WHERE id = ?3",
            params![new_status.as_str(), Utc::now().to_rfc3339(), id],
        )
        .map_err(|e| internal_error("queue update", e))?;

        let entry = load_entry(conn, &id)?;
        let queue = load_doctor_queue(conn, &entry.doctor_id)?;
        Ok((current.status, entry, queue))
    })
    .await?;

    send_to_actor(
        &state.clinical,
        &ActorKey::patient(&entry.patient_id),
        ServerEvent::StatusUpdate {
            data: StatusUpdate {
                queue_entry_id: entry.id.clone(),
                status: entry.status,
                previous_status: previous,
            },
        },
    );
    push_wait_times(&state, &queue);

    tracing::info!(
        queue_entry_id = %entry.id,
        from = previous.as_str(),
        to = entry.status.as_str(),
        "Queue status changed"
    );

    let waits = estimate_waits(&queue, state.avg_consultation_minutes);
    let wait = waits.into_iter().find(|w| w.queue_entry_id == entry.id);
    Ok(Json(QueuePositionResponse::new(entry, wait.as_ref())))
}

/// POST /api/queue/{id}/navigation — Direct the patient to a room or department.
pub async fn navigate(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<NavigationRequest>,
) -> Result<Json<QueueEntry>, ApiError> {
    let destination = req.destination.trim().to_string();
    if destination.is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            "Destination cannot be empty".to_string(),
        ));
    }
    let instructions = req.instructions.filter(|i| !i.trim().is_empty());

    let stored_instructions = instructions.clone();
    let stored_destination = destination.clone();
    let entry = with_conn(&state.db, move |conn| {
        let changed = conn
            .execute(
                "UPDATE queue_entries SET destination = ?1, instructions = ?2, updated_at = ?3
                 WHERE id = ?4",
                params![
                    stored_destination,
                    stored_instructions,
                    Utc::now().to_rfc3339(),
                    id
                ],
            )
            .map_err(|e| internal_error("queue update", e))?;
        if changed == 0 {
            return Err((StatusCode::NOT_FOUND, "Queue entry not found".to_string()));
        }
        load_entry(conn, &id)
    })
    .await?;

    send_to_actor(
        &state.clinical,
        &ActorKey::patient(&entry.patient_id),
        ServerEvent::NavigationUpdate {
            data: NavigationUpdate {
                queue_entry_id: entry.id.clone(),
                patient_id: entry.patient_id.clone(),
                destination,
                instructions,
            },
        },
    );

    Ok(Json(entry))
}
