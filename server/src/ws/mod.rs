pub mod actor;
pub mod broadcast;
pub mod events;
pub mod handler;
pub mod protocol;
pub mod registry;

use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::mpsc;
use uuid::Uuid;

pub use actor::KeepAlive;
pub use registry::{ConnectionHandle, ConnectionRegistry};

/// Type alias for the sender half of a WebSocket connection's channel.
/// Other parts of the system can clone this to push messages to a specific client.
pub type ConnectionSender = mpsc::UnboundedSender<axum::extract::ws::Message>;

/// Process-unique id of one socket.
pub type ConnectionId = Uuid;

/// Kind of actor a socket speaks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActorRole {
    Patient,
    Doctor,
    Pharmacist,
    Biomedical,
}

impl ActorRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Patient => "patient",
            Self::Doctor => "doctor",
            Self::Pharmacist => "pharmacist",
            Self::Biomedical => "biomedical",
        }
    }

    /// The registry that owns sockets of this role.
    pub fn scope(&self) -> RegistryScope {
        match self {
            Self::Patient | Self::Doctor | Self::Pharmacist => RegistryScope::Clinical,
            Self::Biomedical => RegistryScope::Biomedical,
        }
    }
}

/// Logical identity a socket is registered under, e.g. `patient:66a1…`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ActorKey {
    pub role: ActorRole,
    pub id: String,
}

impl ActorKey {
    pub fn new(role: ActorRole, id: impl Into<String>) -> Self {
        Self {
            role,
            id: id.into(),
        }
    }

    pub fn patient(id: impl Into<String>) -> Self {
        Self::new(ActorRole::Patient, id)
    }

    pub fn doctor(id: impl Into<String>) -> Self {
        Self::new(ActorRole::Doctor, id)
    }

    pub fn pharmacist(id: impl Into<String>) -> Self {
        Self::new(ActorRole::Pharmacist, id)
    }

    pub fn biomedical(id: impl Into<String>) -> Self {
        Self::new(ActorRole::Biomedical, id)
    }
}

impl fmt::Display for ActorKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.role.as_str(), self.id)
    }
}

/// The two independent registries: patients/doctors/pharmacists on `/ws`,
/// biomedical staff on `/ws/biomedical`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistryScope {
    Clinical,
    Biomedical,
}

impl RegistryScope {
    /// Roles that may bind to a socket of this scope.
    pub fn allows(&self, role: ActorRole) -> bool {
        role.scope() == *self
    }
}

/// Actor ids a client may present, either as `/ws` query parameters or in a
/// `register` message.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActorIds {
    #[serde(default)]
    pub patient_id: Option<String>,
    #[serde(default)]
    pub doctor_id: Option<String>,
    #[serde(default)]
    pub pharmacist_id: Option<String>,
    #[serde(default)]
    pub biomedical_user_id: Option<String>,
}

impl ActorIds {
    /// First non-empty id allowed in `scope`, in the order patient, doctor,
    /// pharmacist, biomedical user.
    pub fn resolve(&self, scope: RegistryScope) -> Option<ActorKey> {
        [
            (ActorRole::Patient, &self.patient_id),
            (ActorRole::Doctor, &self.doctor_id),
            (ActorRole::Pharmacist, &self.pharmacist_id),
            (ActorRole::Biomedical, &self.biomedical_user_id),
        ]
        .into_iter()
        .filter(|(role, _)| scope.allows(*role))
        .find_map(|(role, id)| {
            id.as_deref()
                .map(str::trim)
                .filter(|id| !id.is_empty())
                .map(|id| ActorKey::new(role, id))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_prefers_patient_then_doctor() {
        let ids = ActorIds {
            patient_id: Some("p1".to_string()),
            doctor_id: Some("d1".to_string()),
            ..ActorIds::default()
        };
        assert_eq!(ids.resolve(RegistryScope::Clinical), Some(ActorKey::patient("p1")));

        let ids = ActorIds {
            patient_id: Some("  ".to_string()),
            pharmacist_id: Some("ph1".to_string()),
            ..ActorIds::default()
        };
        assert_eq!(ids.resolve(RegistryScope::Clinical), Some(ActorKey::pharmacist("ph1")));
    }

    #[test]
    fn test_resolve_respects_scope() {
        let ids = ActorIds {
            patient_id: Some("p1".to_string()),
            biomedical_user_id: Some("b1".to_string()),
            ..ActorIds::default()
        };
        assert_eq!(ids.resolve(RegistryScope::Biomedical), Some(ActorKey::biomedical("b1")));

        let ids = ActorIds {
            biomedical_user_id: Some("b1".to_string()),
            ..ActorIds::default()
        };
        assert_eq!(ids.resolve(RegistryScope::Clinical), None);
    }

    #[test]
    fn test_actor_key_display() {
        assert_eq!(ActorKey::doctor("42").to_string(), "doctor:42");
    }
}
