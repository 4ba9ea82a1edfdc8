use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use rusqlite::{params, Connection};
use serde::Deserialize;
use uuid::Uuid;

use super::waste::{advance_waste_status, load_waste};
use crate::db::models::{CollectionTask, TaskStatus, WasteRecord, WasteStatus};
use crate::db::{internal_error, not_found_or_internal, with_conn, ApiError};
use crate::state::AppState;
use crate::ws::broadcast::{broadcast_to_all, send_to_actor};
use crate::ws::events::{RecordAction, ServerEvent};
use crate::ws::ActorKey;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTaskRequest {
    pub waste_id: String,
    pub assigned_to: String,
}

#[derive(Debug, Deserialize)]
pub struct TaskStatusRequest {
    pub status: TaskStatus,
}

fn load_task(conn: &Connection, id: &str) -> Result<CollectionTask, ApiError> {
    conn.query_row(
        &format!("SELECT {} FROM collection_tasks WHERE id = ?1", CollectionTask::COLUMNS),
        [id],
        CollectionTask::from_row,
    )
    .map_err(|e| not_found_or_internal("Collection task", e))
}

fn push_to_assignee(state: &AppState, action: RecordAction, task: &CollectionTask) {
    send_to_actor(
        &state.biomedical,
        &ActorKey::biomedical(&task.assigned_to),
        ServerEvent::CollectionTaskUpdate {
            action,
            data: task.clone(),
        },
    );
}

/// POST /api/biomedical/collection-tasks — Assign a waste pickup.
pub async fn create_task(
    State(state): State<AppState>,
    Json(req): Json<CreateTaskRequest>,
) -> Result<(StatusCode, Json<CollectionTask>), ApiError> {
    let assigned_to = req.assigned_to.trim().to_string();
    if assigned_to.is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            "assignedTo cannot be empty".to_string(),
        ));
    }

    let task = with_conn(&state.db, move |conn| {
        // 404 before insert rather than a foreign key failure
        load_waste(conn, &req.waste_id)?;

        let id = Uuid::now_v7().to_string();
        let now = Utc::now().to_rfc3339();
        conn.execute(
            "INSERT INTO collection_tasks (id, waste_id, assigned_to, status, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
            params![id, req.waste_id, assigned_to, TaskStatus::Assigned.as_str(), now],
        )
        .map_err(|e| internal_error("collection task insert", e))?;
        load_task(conn, &id)
    })
    .await?;

    push_to_assignee(&state, RecordAction::Created, &task);
    tracing::info!(
        task_id = %task.id,
        waste_id = %task.waste_id,
        assigned_to = %task.assigned_to,
        "Collection task assigned"
    );

    Ok((StatusCode::CREATED, Json(task)))
}

/// PUT /api/biomedical/collection-tasks/{id}/status
/// Completing a task marks its waste record `collected` if it is still
/// `pending`; waste already dispatched or disposed keeps its status.
pub async fn update_task_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<TaskStatusRequest>,
) -> Result<Json<CollectionTask>, ApiError> {
    let status = req.status;

    let (task, collected): (CollectionTask, Option<WasteRecord>) =
        with_conn(&state.db, move |conn| {
            let tx = conn
                .unchecked_transaction()
                .map_err(|e| internal_error("collection task transaction", e))?;

            let current = load_task(&tx, &id)?;
            if current.status == TaskStatus::Completed && status != TaskStatus::Completed {
                return Err((
                    StatusCode::CONFLICT,
                    "Collection task is already completed".to_string(),
                ));
            }

            tx.execute(
                "UPDATE collection_tasks SET status = ?1, updated_at = ?2 WHERE id = ?3",
                params![status.as_str(), Utc::now().to_rfc3339(), id],
            )
            .map_err(|e| internal_error("collection task update", e))?;

            let completing =
                status == TaskStatus::Completed && current.status != TaskStatus::Completed;
            let collected = if completing
                && advance_waste_status(
                    &tx,
                    &current.waste_id,
                    WasteStatus::Pending,
                    WasteStatus::Collected,
                )? {
                Some(load_waste(&tx, &current.waste_id)?)
            } else {
                None
            };

            let task = load_task(&tx, &id)?;
            tx.commit()
                .map_err(|e| internal_error("collection task commit", e))?;
            Ok((task, collected))
        })
        .await?;

    let action = if task.status == TaskStatus::Completed {
        RecordAction::Completed
    } else {
        RecordAction::Updated
    };
    push_to_assignee(&state, action, &task);

    if let Some(waste) = collected {
        broadcast_to_all(
            &state.biomedical,
            ServerEvent::WasteUpdate {
                action: RecordAction::Updated,
                data: waste,
            },
        );
    }

    Ok(Json(task))
}
