use axum::{
    Router,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

use crate::AppState;
use crate::handlers;

/// Create share routes
pub fn share_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::index))
        // Health check
        .route("/health", get(handlers::health))
        // Served tree
        .route("/files", get(handlers::files_redirect))
        .route("/files/", get(handlers::list_root))
        .route("/files/{*path}", get(handlers::get_path))
        // Host-only features
        .route(
            "/settings",
            get(handlers::get_settings).post(handlers::update_settings),
        )
        .route("/opendir", get(handlers::open_dir))
        // Link sharing
        .route("/qr", post(handlers::qr_code))
}

/// Full application router with the tracing layer applied.
///
/// Same-origin only: no CORS layer.
pub fn router(state: AppState) -> Router {
    Router::new()
        .merge(share_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
