pub mod handlers;
pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route("/api/v1/catalog", get(handlers::handle_catalog))
        .route("/api/v1/requirements", post(handlers::handle_requirements))
        // Sessions
        .route("/api/v1/sessions", post(handlers::handle_create_session))
        .route("/api/v1/sessions/:id", get(handlers::handle_get_session))
        .route(
            "/api/v1/sessions/:id/analysis",
            post(handlers::handle_start_analysis),
        )
        .route("/api/v1/sessions/:id/reveal", post(handlers::handle_reveal))
        .route("/api/v1/sessions/:id/courses", get(handlers::handle_courses))
        .route("/api/v1/sessions/:id/what-if", post(handlers::handle_what_if))
        .route(
            "/api/v1/sessions/:id/what-if/promote",
            post(handlers::handle_promote),
        )
        // Snapshots
        .route(
            "/api/v1/sessions/:id/snapshot",
            get(handlers::handle_snapshot_status).post(handlers::handle_save_snapshot),
        )
        .route(
            "/api/v1/sessions/:id/snapshot/load",
            post(handlers::handle_load_snapshot),
        )
        .with_state(state)
}
