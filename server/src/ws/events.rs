//! JSON wire format for pushes and client socket messages.
//!
//! Server → client frames are `{ "type": ..., "data"?: ..., "action"?: ...,
//! "timestamp": RFC 3339 }`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{ActorIds, ActorKey, ActorRole};
use crate::db::models::{CollectionTask, Equipment, Medicine, QueueStatus, WasteRecord};

#[derive(Debug, Clone, Serialize)]
pub struct Envelope {
    #[serde(flatten)]
    pub event: ServerEvent,
    pub timestamp: DateTime<Utc>,
}

impl Envelope {
    pub fn now(event: ServerEvent) -> Self {
        Self {
            event,
            timestamp: Utc::now(),
        }
    }
}

impl From<ServerEvent> for Envelope {
    fn from(event: ServerEvent) -> Self {
        Self::now(event)
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ServerEvent {
    NavigationUpdate { data: NavigationUpdate },
    WaitTimeUpdate { data: WaitTimeUpdate },
    StatusUpdate { data: StatusUpdate },
    MedicineAdded { data: Medicine },
    MedicineUpdated { data: Medicine },
    MedicineDispensed { data: MedicineDispensed },
    EquipmentUpdate { action: RecordAction, data: Equipment },
    WasteUpdate { action: RecordAction, data: WasteRecord },
    CollectionTaskUpdate { action: RecordAction, data: CollectionTask },
    DispatchUpdate { action: RecordAction, data: WasteRecord },
    Notification { data: Notification },
    Registered { data: RegistrationAck },
    DoctorRegistered { data: RegistrationAck },
    PharmacistRegistered { data: RegistrationAck },
    Pong,
}

impl ServerEvent {
    /// Acknowledgement sent after a socket binds to `key`.
    pub fn registered(key: &ActorKey) -> Self {
        let data = RegistrationAck {
            role: key.role,
            actor_id: key.id.clone(),
        };
        match key.role {
            ActorRole::Doctor => Self::DoctorRegistered { data },
            ActorRole::Pharmacist => Self::PharmacistRegistered { data },
            ActorRole::Patient | ActorRole::Biomedical => Self::Registered { data },
        }
    }

    /// The `type` string on the wire.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NavigationUpdate { .. } => "navigation-update",
            Self::WaitTimeUpdate { .. } => "wait-time-update",
            Self::StatusUpdate { .. } => "status-update",
            Self::MedicineAdded { .. } => "medicine-added",
            Self::MedicineUpdated { .. } => "medicine-updated",
            Self::MedicineDispensed { .. } => "medicine-dispensed",
            Self::EquipmentUpdate { .. } => "equipment-update",
            Self::WasteUpdate { .. } => "waste-update",
            Self::CollectionTaskUpdate { .. } => "collection-task-update",
            Self::DispatchUpdate { .. } => "dispatch-update",
            Self::Notification { .. } => "notification",
            Self::Registered { .. } => "registered",
            Self::DoctorRegistered { .. } => "doctor-registered",
            Self::PharmacistRegistered { .. } => "pharmacist-registered",
            Self::Pong => "pong",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordAction {
    Created,
    Updated,
    Dispatched,
    Completed,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NavigationUpdate {
    pub queue_entry_id: String,
    pub patient_id: String,
    pub destination: String,
    pub instructions: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WaitTimeUpdate {
    pub queue_entry_id: String,
    pub doctor_id: String,
    /// 1-based place in the doctor's queue.
    pub position: u32,
    pub estimated_wait_minutes: u32,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusUpdate {
    pub queue_entry_id: String,
    pub status: QueueStatus,
    pub previous_status: QueueStatus,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MedicineDispensed {
    pub medicine: Medicine,
    pub quantity: i64,
    pub patient_id: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationLevel {
    #[default]
    Info,
    Warning,
    Critical,
}

#[derive(Debug, Clone, Serialize)]
pub struct Notification {
    pub title: String,
    pub message: String,
    pub level: NotificationLevel,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationAck {
    pub role: ActorRole,
    pub actor_id: String,
}

/// Client → server text frames.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ClientMessage {
    Register(ActorIds),
    Ping,
}
