use std::sync::Arc;

use crate::db::DbPool;
use crate::triage::TriageClassifier;
use crate::ws::{ActorRole, ConnectionRegistry, KeepAlive, RegistryScope};

/// Shared application state passed to all handlers via axum State extractor.
#[derive(Clone)]
pub struct AppState {
    /// SQLite connection wrapped in Arc<Mutex>
    pub db: DbPool,
    /// Sockets of patients, doctors and pharmacists
    pub clinical: ConnectionRegistry,
    /// Sockets of biomedical staff
    pub biomedical: ConnectionRegistry,
    /// Vitals → triage colour
    pub triage: Arc<TriageClassifier>,
    /// Minutes per consultation used for wait-time estimates
    pub avg_consultation_minutes: u32,
    /// Ping cadence for every socket
    pub keepalive: KeepAlive,
}

impl AppState {
    pub fn registry(&self, scope: RegistryScope) -> &ConnectionRegistry {
        match scope {
            RegistryScope::Clinical => &self.clinical,
            RegistryScope::Biomedical => &self.biomedical,
        }
    }

    pub fn registry_for(&self, role: ActorRole) -> &ConnectionRegistry {
        self.registry(role.scope())
    }
}
