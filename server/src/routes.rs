use axum::routing::{get, post, put};
use axum::Router;
use std::sync::Arc;
use std::time::Duration;
use tower_governor::key_extractor::PeerIpKeyExtractor;
use tower_governor::{governor::GovernorConfigBuilder, GovernorLayer};

use crate::admin::{notify, stats};
use crate::biomedical::{equipment, tasks, waste};
use crate::pharmacy::medicines;
use crate::queue::routes as queue;
use crate::state::AppState;
use crate::vitals::routes as vitals;
use crate::ws::handler as ws_handler;

/// Build the full axum Router with all routes and middleware.
///
/// The notification route is rate limited per peer IP, so the router must be
/// served with `into_make_service_with_connect_info::<SocketAddr>()`.
pub fn build_router(state: AppState) -> Router {
    // Rate limiting for operator notifications: 10 requests per minute per IP
    let notify_routes =
        Router::new().route("/api/notifications", post(notify::send_notification));
    let notify_routes = match GovernorConfigBuilder::default()
        .key_extractor(PeerIpKeyExtractor)
        .per_second(6) // 1 token every 6 seconds = 10 per minute
        .burst_size(10)
        .finish()
    {
        Some(config) => {
            let config = Arc::new(config);

            // Spawn background task to clean up rate limiter state
            let limiter = config.limiter().clone();
            tokio::spawn(async move {
                loop {
                    tokio::time::sleep(Duration::from_secs(60)).await;
                    limiter.retain_recent();
                }
            });

            notify_routes.layer(GovernorLayer { config })
        }
        None => {
            tracing::warn!("Invalid rate limit settings, notifications are not rate limited");
            notify_routes
        }
    };

    let queue_routes = Router::new()
        .route("/api/queue", post(queue::check_in))
        .route("/api/queue/doctor/{doctor_id}", get(queue::list_doctor_queue))
        .route("/api/queue/{id}/status", put(queue::update_status))
        .route("/api/queue/{id}/navigation", post(queue::navigate));

    let vitals_routes = Router::new()
        .route("/api/triage/classify", post(vitals::classify))
        .route("/api/vitals", post(vitals::record_vitals))
        .route(
            "/api/vitals/patient/{patient_id}",
            get(vitals::list_patient_vitals),
        );

    let pharmacy_routes = Router::new()
        .route(
            "/api/medicines",
            get(medicines::list_medicines).post(medicines::create_medicine),
        )
        .route("/api/medicines/{id}", put(medicines::update_medicine))
        .route(
            "/api/medicines/{id}/dispense",
            post(medicines::dispense_medicine),
        );

    let biomedical_routes = Router::new()
        .route(
            "/api/biomedical/equipment",
            get(equipment::list_equipment).post(equipment::create_equipment),
        )
        .route(
            "/api/biomedical/equipment/{id}/status",
            put(equipment::update_equipment_status),
        )
        .route(
            "/api/biomedical/waste",
            get(waste::list_waste).post(waste::create_waste),
        )
        .route(
            "/api/biomedical/waste/{id}/status",
            put(waste::update_waste_status),
        )
        .route(
            "/api/biomedical/waste/{id}/dispatch",
            post(waste::dispatch_waste),
        )
        .route(
            "/api/biomedical/collection-tasks",
            post(tasks::create_task),
        )
        .route(
            "/api/biomedical/collection-tasks/{id}/status",
            put(tasks::update_task_status),
        );

    // WebSocket endpoints (actor named via query param or a register message)
    let ws_routes = Router::new()
        .route("/ws", get(ws_handler::clinical_ws_upgrade))
        .route("/ws/biomedical", get(ws_handler::biomedical_ws_upgrade));

    let public_routes = Router::new()
        .route("/health", get(health_check))
        .route("/api/realtime/stats", get(stats::realtime_stats));

    Router::new()
        .merge(notify_routes)
        .merge(queue_routes)
        .merge(vitals_routes)
        .merge(pharmacy_routes)
        .merge(biomedical_routes)
        .merge(ws_routes)
        .merge(public_routes)
        .with_state(state)
}

/// Basic health check endpoint
async fn health_check() -> &'static str {
    "ok"
}
