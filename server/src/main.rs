use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use hospital_server::config::{generate_config_template, Config};
use hospital_server::triage::TriageClassifier;
use hospital_server::ws::{ConnectionRegistry, KeepAlive};
use hospital_server::{db, routes, state};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load config with layered precedence: defaults < TOML < env < CLI
    let config = Config::load()?;

    // Handle --generate-config: print template and exit
    if config.generate_config {
        print!("{}", generate_config_template());
        return Ok(());
    }

    // Initialize tracing/logging
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("hospital_server=info"));
    if config.json_logs {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().pretty().with_env_filter(filter).init();
    }

    tracing::info!("Hospital server v{} starting", env!("CARGO_PKG_VERSION"));

    // Initialize SQLite database
    let db = db::init_db(&config.data_dir)?;

    // Triage model is optional; a bad model file leaves the rules in charge
    let triage = TriageClassifier::from_config(&config.triage());
    tracing::info!(model = ?triage.model_name(), "Triage classifier ready");

    let app_state = state::AppState {
        db,
        clinical: ConnectionRegistry::new(),
        biomedical: ConnectionRegistry::new(),
        triage: Arc::new(triage),
        avg_consultation_minutes: config.queue().avg_consultation_minutes,
        keepalive: KeepAlive::default(),
    };

    // Build router
    let app = routes::build_router(app_state);

    // Bind and serve
    let addr = format!("{}:{}", config.bind_address, config.port);
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("Listening on {}", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
