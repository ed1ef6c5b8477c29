pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::pipeline::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Runs API
        .route("/api/v1/runs", post(handlers::handle_submit_run))
        .route("/api/v1/runs/:id", get(handlers::handle_get_run))
        .route("/api/v1/runs/:id/events", get(handlers::handle_run_events))
        .route("/api/v1/runs/:id/cancel", post(handlers::handle_cancel_run))
        .route(
            "/api/v1/runs/:id/document",
            get(handlers::handle_download_document),
        )
        .with_state(state)
}
