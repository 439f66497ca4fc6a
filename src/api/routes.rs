//! Router configuration

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

use super::handlers::{self, AppState};

/// Build the service router
///
/// `max_body_bytes` bounds both the raw body and the `Json` extractor.
pub fn build_router(state: AppState, max_body_bytes: usize) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/metrics", get(handlers::metrics))
        .route("/api/user-suggestions/:user_id", get(handlers::get_user_suggestions))
        .route("/api/v1/rank", post(handlers::rank_records))
        .route("/api/v1/actions", post(handlers::record_action))
        .route("/api/v1/users/:user_id/records", get(handlers::get_user_records))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(DefaultBodyLimit::max(max_body_bytes))
                .layer(RequestBodyLimitLayer::new(max_body_bytes)),
        )
        .with_state(state)
}
