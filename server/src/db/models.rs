//! Database row types for all tables.
//! These correspond 1:1 to the SQLite schema defined in migrations.rs and are
//! also the JSON shapes used by the REST API and the push events.

use rusqlite::types::Type;
use rusqlite::Row;
use serde::{Deserialize, Serialize};

use crate::triage::{TriageLabel, TriageMethod};

/// Read a TEXT column and parse it into one of the status enums below.
fn parse_column<T>(row: &Row, idx: usize, parse: fn(&str) -> Option<T>) -> rusqlite::Result<T> {
    let raw: String = row.get(idx)?;
    parse(&raw).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            idx,
            Type::Text,
            format!("unexpected value '{}'", raw).into(),
        )
    })
}

// --- Queue ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum QueueStatus {
    Waiting,
    InConsultation,
    Completed,
    Cancelled,
}

impl QueueStatus {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "waiting" => Some(Self::Waiting),
            "in-consultation" => Some(Self::InConsultation),
            "completed" => Some(Self::Completed),
            "cancelled" => Some(Self::Cancelled),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Waiting => "waiting",
            Self::InConsultation => "in-consultation",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }

    /// Entries that still occupy a place in the doctor's queue.
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Waiting | Self::InConsultation)
    }
}

/// One patient waiting for (or seeing) one doctor.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueEntry {
    pub id: String,
    pub patient_id: String,
    pub doctor_id: String,
    pub status: QueueStatus,
    pub destination: Option<String>,
    pub instructions: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl QueueEntry {
    pub const COLUMNS: &'static str =
        "id, patient_id, doctor_id, status, destination, instructions, created_at, updated_at";

    pub fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            patient_id: row.get(1)?,
            doctor_id: row.get(2)?,
            status: parse_column(row, 3, QueueStatus::parse)?,
            destination: row.get(4)?,
            instructions: row.get(5)?,
            created_at: row.get(6)?,
            updated_at: row.get(7)?,
        })
    }
}

// --- Vitals ---

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VitalsRecord {
    pub id: String,
    pub patient_id: String,
    pub doctor_id: Option<String>,
    pub recorded_by: Option<String>,
    pub height: f64,
    pub weight: f64,
    pub temperature: f64,
    pub blood_pressure: String,
    pub heart_rate: f64,
    pub respiratory_rate: f64,
    pub pulse: f64,
    pub triage_label: TriageLabel,
    pub triage_method: TriageMethod,
    pub created_at: String,
}

impl VitalsRecord {
    pub const COLUMNS: &'static str = "id, patient_id, doctor_id, recorded_by, height, weight, \
        temperature, blood_pressure, heart_rate, respiratory_rate, pulse, triage_label, \
        triage_method, created_at";

    pub fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            patient_id: row.get(1)?,
            doctor_id: row.get(2)?,
            recorded_by: row.get(3)?,
            height: row.get(4)?,
            weight: row.get(5)?,
            temperature: row.get(6)?,
            blood_pressure: row.get(7)?,
            heart_rate: row.get(8)?,
            respiratory_rate: row.get(9)?,
            pulse: row.get(10)?,
            triage_label: parse_column(row, 11, TriageLabel::parse)?,
            triage_method: parse_column(row, 12, TriageMethod::parse)?,
            created_at: row.get(13)?,
        })
    }
}

// --- Pharmacy ---

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Medicine {
    pub id: String,
    pub name: String,
    pub category: Option<String>,
    pub quantity: i64,
    pub unit_price: f64,
    pub expiry_date: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl Medicine {
    pub const COLUMNS: &'static str =
        "id, name, category, quantity, unit_price, expiry_date, created_at, updated_at";

    pub fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            name: row.get(1)?,
            category: row.get(2)?,
            quantity: row.get(3)?,
            unit_price: row.get(4)?,
            expiry_date: row.get(5)?,
            created_at: row.get(6)?,
            updated_at: row.get(7)?,
        })
    }
}

// --- Biomedical ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EquipmentStatus {
    Operational,
    Maintenance,
    Faulty,
    Decommissioned,
}

impl EquipmentStatus {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "operational" => Some(Self::Operational),
            "maintenance" => Some(Self::Maintenance),
            "faulty" => Some(Self::Faulty),
            "decommissioned" => Some(Self::Decommissioned),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Operational => "operational",
            Self::Maintenance => "maintenance",
            Self::Faulty => "faulty",
            Self::Decommissioned => "decommissioned",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Equipment {
    pub id: String,
    pub name: String,
    pub location: Option<String>,
    pub status: EquipmentStatus,
    pub created_at: String,
    pub updated_at: String,
}

impl Equipment {
    pub const COLUMNS: &'static str = "id, name, location, status, created_at, updated_at";

    pub fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            name: row.get(1)?,
            location: row.get(2)?,
            status: parse_column(row, 3, EquipmentStatus::parse)?,
            created_at: row.get(4)?,
            updated_at: row.get(5)?,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WasteStatus {
    Pending,
    Collected,
    Dispatched,
    Disposed,
}

impl WasteStatus {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "collected" => Some(Self::Collected),
            "dispatched" => Some(Self::Dispatched),
            "disposed" => Some(Self::Disposed),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Collected => "collected",
            Self::Dispatched => "dispatched",
            Self::Disposed => "disposed",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WasteRecord {
    pub id: String,
    pub category: String,
    pub weight_kg: f64,
    pub source_location: Option<String>,
    pub status: WasteStatus,
    pub destination: Option<String>,
    pub vehicle: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl WasteRecord {
    pub const COLUMNS: &'static str = "id, category, weight_kg, source_location, status, \
        destination, vehicle, created_at, updated_at";

    pub fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            category: row.get(1)?,
            weight_kg: row.get(2)?,
            source_location: row.get(3)?,
            status: parse_column(row, 4, WasteStatus::parse)?,
            destination: row.get(5)?,
            vehicle: row.get(6)?,
            created_at: row.get(7)?,
            updated_at: row.get(8)?,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TaskStatus {
    Assigned,
    InProgress,
    Completed,
}

impl TaskStatus {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "assigned" => Some(Self::Assigned),
            "in-progress" => Some(Self::InProgress),
            "completed" => Some(Self::Completed),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Assigned => "assigned",
            Self::InProgress => "in-progress",
            Self::Completed => "completed",
        }
    }
}

/// Waste pickup assigned to one biomedical user.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionTask {
    pub id: String,
    pub waste_id: String,
    pub assigned_to: String,
    pub status: TaskStatus,
    pub created_at: String,
    pub updated_at: String,
}

impl CollectionTask {
    pub const COLUMNS: &'static str = "id, waste_id, assigned_to, status, created_at, updated_at";

    pub fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            waste_id: row.get(1)?,
            assigned_to: row.get(2)?,
            status: parse_column(row, 3, TaskStatus::parse)?,
            created_at: row.get(4)?,
            updated_at: row.get(5)?,
        })
    }
}
