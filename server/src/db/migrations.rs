use rusqlite_migration::{Migrations, M};

/// Define all schema migrations.
/// Uses SQLite user_version pragma for tracking — no migration table needed.
pub fn migrations() -> Migrations<'static> {
    Migrations::new(vec![
        M::up(
            "-- Migration 1: Outpatient queue and vitals

CREATE TABLE queue_entries (
    id TEXT PRIMARY KEY,
    patient_id TEXT NOT NULL,
    doctor_id TEXT NOT NULL,
    status TEXT NOT NULL DEFAULT 'waiting',
    destination TEXT,
    instructions TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE INDEX idx_queue_doctor_status ON queue_entries(doctor_id, status);

CREATE TABLE vitals (
    id TEXT PRIMARY KEY,
    patient_id TEXT NOT NULL,
    doctor_id TEXT,
    recorded_by TEXT,
    height REAL NOT NULL,
    weight REAL NOT NULL,
    temperature REAL NOT NULL,
    blood_pressure TEXT NOT NULL,
    heart_rate REAL NOT NULL,
    respiratory_rate REAL NOT NULL,
    pulse REAL NOT NULL,
    triage_label TEXT NOT NULL,
    triage_method TEXT NOT NULL,
    created_at TEXT NOT NULL
);

CREATE INDEX idx_vitals_patient ON vitals(patient_id, created_at);
",
        ),
        M::up(
            "-- Migration 2: Pharmacy inventory

CREATE TABLE medicines (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    category TEXT,
    quantity INTEGER NOT NULL DEFAULT 0 CHECK (quantity >= 0),
    unit_price REAL NOT NULL DEFAULT 0,
    expiry_date TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE INDEX idx_medicines_name ON medicines(name);
",
        ),
        M::up(
            "-- Migration 3: Biomedical equipment and waste

CREATE TABLE equipment (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    location TEXT,
    status TEXT NOT NULL DEFAULT 'operational',
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE TABLE waste_records (
    id TEXT PRIMARY KEY,
    category TEXT NOT NULL,
    weight_kg REAL NOT NULL,
    source_location TEXT,
    status TEXT NOT NULL DEFAULT 'pending',
    destination TEXT,
    vehicle TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE TABLE collection_tasks (
    id TEXT PRIMARY KEY,
    waste_id TEXT NOT NULL,
    assigned_to TEXT NOT NULL,
    status TEXT NOT NULL DEFAULT 'assigned',
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    FOREIGN KEY (waste_id) REFERENCES waste_records(id) ON DELETE CASCADE
);

CREATE INDEX idx_collection_tasks_assignee ON collection_tasks(assigned_to);
",
        ),
    ])
}
