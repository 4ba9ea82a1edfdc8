pub mod migrations;
pub mod models;

use axum::http::StatusCode;
use rusqlite::Connection;
use std::path::Path;
use std::sync::{Arc, Mutex};

/// Type alias for the shared database connection.
/// rusqlite is synchronous — we wrap in Arc<Mutex> for thread safety
/// with tokio::task::spawn_blocking for DB operations.
pub type DbPool = Arc<Mutex<Connection>>;

/// Error half of every REST handler result: status plus plain-text message.
pub type ApiError = (StatusCode, String);

/// Initialize the SQLite database: create data directory if needed,
/// open (or create) the database file, enable WAL mode, and run migrations.
pub fn init_db(data_dir: &str) -> Result<DbPool, Box<dyn std::error::Error>> {
    // Ensure data directory exists
    std::fs::create_dir_all(data_dir)?;

    let db_path = Path::new(data_dir).join("hospital.db");
    let mut conn = Connection::open(&db_path)?;

    // Enable WAL mode for better concurrent read performance
    conn.pragma_update(None, "journal_mode", "WAL")?;
    // Enable foreign key enforcement
    conn.pragma_update(None, "foreign_keys", "ON")?;

    migrations::migrations().to_latest(&mut conn)?;

    tracing::info!("Database initialized at {}", db_path.display());

    Ok(Arc::new(Mutex::new(conn)))
}

/// Run `f` against the locked connection on the blocking pool.
pub async fn with_conn<T, F>(db: &DbPool, f: F) -> Result<T, ApiError>
where
    T: Send + 'static,
    F: FnOnce(&Connection) -> Result<T, ApiError> + Send + 'static,
{
    let db = db.clone();
    tokio::task::spawn_blocking(move || {
        let conn = db
            .lock()
            .map_err(|_| (StatusCode::INTERNAL_SERVER_ERROR, "DB lock".to_string()))?;
        f(&conn)
    })
    .await
    .map_err(|e| internal_error("task join", e))?
}

/// Log an unexpected failure and map it to a 500.
pub fn internal_error(context: &str, err: impl std::fmt::Display) -> ApiError {
    tracing::error!(error = %err, "{} failed", context);
    (StatusCode::INTERNAL_SERVER_ERROR, format!("{} failed", context))
}

/// Map a missing row to 404 and anything else to 500.
pub fn not_found_or_internal(what: &str, err: rusqlite::Error) -> ApiError {
    match err {
        rusqlite::Error::QueryReturnedNoRows => (StatusCode::NOT_FOUND, format!("{} not found", what)),
        other => internal_error(what, other),
    }
}
