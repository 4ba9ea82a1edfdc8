use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use rusqlite::params;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::models::VitalsRecord;
use crate::db::{internal_error, with_conn, ApiError};
use crate::state::AppState;
use crate::triage::{TriageAssessment, TriageLabel, VitalSigns};
use crate::ws::broadcast::send_to_actor;
use crate::ws::events::{Notification, NotificationLevel, ServerEvent};
use crate::ws::ActorKey;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordVitalsRequest {
    pub patient_id: String,
    #[serde(default)]
    pub doctor_id: Option<String>,
    #[serde(default)]
    pub recorded_by: Option<String>,
    #[serde(flatten)]
    pub vitals: VitalSigns,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VitalsResponse {
    pub record: VitalsRecord,
    pub assessment: TriageAssessment,
}

fn notification_level(label: TriageLabel) -> NotificationLevel {
    match label {
        TriageLabel::Red => NotificationLevel::Critical,
        TriageLabel::Yellow => NotificationLevel::Warning,
        TriageLabel::Green | TriageLabel::Blue => NotificationLevel::Info,
    }
}

/// POST /api/triage/classify — Classify vitals without storing them.
pub async fn classify(
    State(state): State<AppState>,
    Json(vitals): Json<VitalSigns>,
) -> Json<TriageAssessment> {
    Json(state.triage.assess(&vitals))
}

/// POST /api/vitals — Store a set of vitals with its triage colour and alert
/// the treating doctor, if any.
pub async fn record_vitals(
    State(state): State<AppState>,
    Json(req): Json<RecordVitalsRequest>,
) -> Result<(StatusCode, Json<VitalsResponse>), ApiError> {
    let patient_id = req.patient_id.trim().to_string();
    if patient_id.is_empty() {
        return Err((StatusCode::BAD_REQUEST, "patientId is required".to_string()));
    }

    let assessment = state.triage.assess(&req.vitals);

    let record = VitalsRecord {
        id: Uuid::now_v7().to_string(),
        patient_id,
        doctor_id: req
            .doctor_id
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty()),
        recorded_by: req.recorded_by,
        height: req.vitals.height,
        weight: req.vitals.weight,
        temperature: req.vitals.temperature,
        blood_pressure: req.vitals.blood_pressure.clone(),
        heart_rate: req.vitals.heart_rate,
        respiratory_rate: req.vitals.respiratory_rate,
        pulse: req.vitals.pulse,
        triage_label: assessment.label,
        triage_method: assessment.method,
        created_at: Utc::now().to_rfc3339(),
    };

    let row = record.clone();
    with_conn(&state.db, move |conn| {
        conn.execute(
            &format!(
                "INSERT INTO vitals ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
                VitalsRecord::COLUMNS
            ),
            params![
                row.id,
                row.patient_id,
                row.doctor_id,
                row.recorded_by,
                row.height,
                row.weight,
                row.temperature,
                row.blood_pressure,
                row.heart_rate,
                row.respiratory_rate,
                row.pulse,
                row.triage_label.as_str(),
                row.triage_method.as_str(),
                row.created_at,
            ],
        )
        .map_err(|e| internal_error("vitals insert", e))?;
        Ok(())
    })
    .await?;

    tracing::info!(
        vitals_id = %record.id,
        patient_id = %record.patient_id,
        label = %assessment.label,
        method = assessment.method.as_str(),
        "Vitals recorded"
    );

    if assessment.label.is_urgent() && record.doctor_id.is_none() {
        tracing::warn!(
            vitals_id = %record.id,
            patient_id = %record.patient_id,
            label = %assessment.label,
            "Urgent triage recorded with no doctor to alert"
        );
    }

    if let Some(doctor_id) = record.doctor_id.as_deref() {
        send_to_actor(
            &state.clinical,
            &ActorKey::doctor(doctor_id),
            ServerEvent::Notification {
                data: Notification {
                    title: format!("Triage: {}", assessment.label),
                    message: format!(
                        "New vitals for patient {} classified {}",
                        record.patient_id, assessment.label
                    ),
                    level: notification_level(assessment.label),
                },
            },
        );
    }

    Ok((
        StatusCode::CREATED,
        Json(VitalsResponse { record, assessment }),
    ))
}

/// GET /api/vitals/patient/{patient_id} — Vitals history, newest first.
pub async fn list_patient_vitals(
    State(state): State<AppState>,
    Path(patient_id): Path<String>,
) -> Result<Json<Vec<VitalsRecord>>, ApiError> {
    let records = with_conn(&state.db, move |conn| {
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {} FROM vitals WHERE patient_id = ?1 ORDER BY created_at DESC, id DESC",
                VitalsRecord::COLUMNS
            ))
            .map_err(|e| internal_error("vitals query", e))?;
        let records = stmt
            .query_map([&patient_id], VitalsRecord::from_row)
            .map_err(|e| internal_error("vitals query", e))?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(|e| internal_error("vitals row", e))?;
        Ok(records)
    })
    .await?;

    Ok(Json(records))
}
