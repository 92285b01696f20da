use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::{convert, formats, handlers, history, jobs, middleware::metrics_middleware, settings, ws};
use crate::state::AppState;

/// Room for multipart boundaries and the small text fields around a file.
const MULTIPART_OVERHEAD_BYTES: u64 = 1024 * 1024;

fn body_limit(bytes: u64) -> usize {
    usize::try_from(bytes.saturating_add(MULTIPART_OVERHEAD_BYTES)).unwrap_or(usize::MAX)
}

pub fn create_router(state: Arc<AppState>) -> Router {
    let limits = &state.config().limits;
    let upload_limit = body_limit(limits.max_file_size_bytes);
    // A batch body carries up to `max_batch_files` files, each checked on its own
    let batch_limit =
        body_limit(limits.max_file_size_bytes.saturating_mul(limits.max_batch_files));

    let api_routes = Router::new()
        // Health and config
        .route("/health", get(handlers::health))
        .route("/config", get(handlers::get_config))
        // Formats
        .route("/formats", get(formats::list_formats))
        .route("/formats/detect", post(formats::detect_format))
        .route("/formats/{ext}", get(formats::get_format))
        .route("/formats/{input}/supports/{output}", get(formats::supports))
        // Conversions
        .route("/convert", post(convert::convert))
        .route(
            "/batch",
            post(convert::submit_batch).layer(DefaultBodyLimit::max(batch_limit)),
        )
        .route("/batch/status", get(jobs::batch_status))
        // Jobs
        .route("/jobs", get(jobs::list_jobs))
        .route("/jobs/clear-completed", post(jobs::clear_completed))
        .route("/jobs/{id}", get(jobs::get_job).delete(jobs::delete_job))
        .route("/jobs/{id}/retry", post(jobs::retry_job))
        .route("/jobs/{id}/result", get(jobs::download_result))
        // Settings
        .route(
            "/settings/retention",
            get(settings::get_retention).put(settings::update_retention),
        )
        // History
        .route(
            "/history",
            get(history::list_history).delete(history::clear_history),
        )
        // Live updates
        .route("/ws", get(ws::ws_handler))
        .layer(DefaultBodyLimit::max(upload_limit))
        .with_state(state.clone());

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .nest("/api/v1", api_routes)
        .route("/metrics", get(handlers::metrics))
        .with_state(state)
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}
