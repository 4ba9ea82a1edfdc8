use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use rusqlite::{params, Connection};
use serde::Deserialize;
use uuid::Uuid;

use crate::db::models::Medicine;
use crate::db::{internal_error, not_found_or_internal, with_conn, ApiError};
use crate::state::AppState;
use crate::ws::broadcast::{broadcast_to_all, send_to_actor};
use crate::ws::events::{MedicineDispensed, Notification, NotificationLevel, ServerEvent};
use crate::ws::ActorKey;

// --- Request types ---

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateMedicineRequest {
    pub name: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub quantity: i64,
    #[serde(default)]
    pub unit_price: f64,
    #[serde(default)]
    pub expiry_date: Option<String>,
}

/// Partial update; absent fields keep their value.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateMedicineRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub quantity: Option<i64>,
    #[serde(default)]
    pub unit_price: Option<f64>,
    #[serde(default)]
    pub expiry_date: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DispenseRequest {
    pub quantity: i64,
    #[serde(default)]
    pub patient_id: Option<String>,
}

fn load_medicine(conn: &Connection, id: &str) -> Result<Medicine, ApiError> {
    conn.query_row(
        &format!("SELECT {} FROM medicines WHERE id = ?1", Medicine::COLUMNS),
        [id],
        Medicine::from_row,
    )
    .map_err(|e| not_found_or_internal("Medicine", e))
}

fn validate_stock(quantity: i64, unit_price: f64) -> Result<(), ApiError> {
    if quantity < 0 {
        return Err((
            StatusCode::BAD_REQUEST,
            "Quantity cannot be negative".to_string(),
        ));
    }
    if !unit_price.is_finite() || unit_price < 0.0 {
        return Err((
            StatusCode::BAD_REQUEST,
            "Unit price must be a non-negative number".to_string(),
        ));
    }
    Ok(())
}

// --- Handlers ---

/// GET /api/medicines — Full inventory ordered by name.
pub async fn list_medicines(
    State(state): State<AppState>,
) -> Result<Json<Vec<Medicine>>, ApiError> {
    let medicines = with_conn(&state.db, |conn| {
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {} FROM medicines ORDER BY name COLLATE NOCASE ASC",
                Medicine::COLUMNS
            ))
            .map_err(|e| internal_error("medicine query", e))?;
        let medicines = stmt
            .query_map([], Medicine::from_row)
            .map_err(|e| internal_error("medicine query", e))?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(|e| internal_error("medicine row", e))?;
        Ok(medicines)
    })
    .await?;

    Ok(Json(medicines))
}

/// POST /api/medicines — Add a medicine to the inventory.
pub async fn create_medicine(
    State(state): State<AppState>,
    Json(req): Json<CreateMedicineRequest>,
) -> Result<(StatusCode, Json<Medicine>), ApiError> {
    if req.name.trim().is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            "Medicine name cannot be empty".to_string(),
        ));
    }
    validate_stock(req.quantity, req.unit_price)?;

    let medicine = with_conn(&state.db, move |conn| {
        let id = Uuid::now_v7().to_string();
        let now = Utc::now().to_rfc3339();
        conn.execute(
            "INSERT INTO medicines (id, name, category, quantity, unit_price, expiry_date, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)",
            params![
                id,
                req.name.trim(),
                req.category,
                req.quantity,
                req.unit_price,
                req.expiry_date,
                now
            ],
        )
        .map_err(|e| internal_error("medicine insert", e))?;
        load_medicine(conn, &id)
    })
    .await?;

    broadcast_to_all(
        &state.clinical,
        ServerEvent::MedicineAdded {
            data: medicine.clone(),
        },
    );
    tracing::info!(medicine_id = %medicine.id, name = %medicine.name, "Medicine added");

    Ok((StatusCode::CREATED, Json(medicine)))
}

/// PUT /api/medicines/{id} — Update name, category, stock, price or expiry.
pub async fn update_medicine(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<UpdateMedicineRequest>,
) -> Result<Json<Medicine>, ApiError> {
    if req.name.as_deref().is_some_and(|n| n.trim().is_empty()) {
        return Err((
            StatusCode::BAD_REQUEST,
            "Medicine name cannot be empty".to_string(),
        ));
    }

    let medicine = with_conn(&state.db, move |conn| {
        let current = load_medicine(conn, &id)?;
        let name = req.name.map(|n| n.trim().to_string()).unwrap_or(current.name);
        let category = req.category.or(current.category);
        let quantity = req.quantity.unwrap_or(current.quantity);
        let unit_price = req.unit_price.unwrap_or(current.unit_price);
        let expiry_date = req.expiry_date.or(current.expiry_date);
        validate_stock(quantity, unit_price)?;

        conn.execute(
            "UPDATE medicines
             SET name = ?1, category = ?2, quantity = ?3, unit_price = ?4, expiry_date = ?5, updated_at = ?6
             WHERE id = ?7",
            params![
                name,
                category,
                quantity,
                unit_price,
                expiry_date,
                Utc::now().to_rfc3339(),
                id
            ],
        )
        .map_err(|e| internal_error("medicine update", e))?;
        load_medicine(conn, &id)
    })
    .await?;

    broadcast_to_all(
        &state.clinical,
        ServerEvent::MedicineUpdated {
            data: medicine.clone(),
        },
    );

    Ok(Json(medicine))
}

/// POST /api/medicines/{id}/dispense — Take stock out for a patient.
/// Fails with 409 when stock is insufficient; nothing is changed then.
pub async fn dispense_medicine(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<DispenseRequest>,
) -> Result<Json<Medicine>, ApiError> {
    if req.quantity <= 0 {
        return Err((
            StatusCode::BAD_REQUEST,
            "Quantity must be positive".to_string(),
        ));
    }
    let quantity = req.quantity;
    let patient_id = req.patient_id.filter(|p| !p.trim().is_empty());

    let medicine = with_conn(&state.db, move |conn| {
        let changed = conn
            .execute(
                "UPDATE medicines SET quantity = quantity - ?1, updated_at = ?2
                 WHERE id = ?3 AND quantity >= ?1",
                params![quantity, Utc::now().to_rfc3339(), id],
            )
            .map_err(|e| internal_error("medicine dispense", e))?;

        if changed == 0 {
            // Either the medicine is unknown (404) or stock is short (409)
            let current = load_medicine(conn, &id)?;
            return Err((
                StatusCode::CONFLICT,
                format!(
                    "Insufficient stock: {} available, {} requested",
                    current.quantity, quantity
                ),
            ));
        }
        load_medicine(conn, &id)
    })
    .await?;

    broadcast_to_all(
        &state.clinical,
        ServerEvent::MedicineDispensed {
            data: MedicineDispensed {
                medicine: medicine.clone(),
                quantity,
                patient_id: patient_id.clone(),
            },
        },
    );

    if let Some(patient_id) = patient_id.as_deref() {
        send_to_actor(
            &state.clinical,
            &ActorKey::patient(patient_id),
            ServerEvent::Notification {
                data: Notification {
                    title: "Medicine dispensed".to_string(),
                    message: format!("{} x {} is ready for collection", quantity, medicine.name),
                    level: NotificationLevel::Info,
                },
            },
        );
    }

    tracing::info!(
        medicine_id = %medicine.id,
        quantity,
        remaining = medicine.quantity,
        "Medicine dispensed"
    );

    Ok(Json(medicine))
}
