use axum::{
    routing::{get, post},
    Router,
};

use crate::handlers;

/// Route table of the application.
pub fn configure_routes() -> Router {
    Router::new()
        .route("/", get(handlers::sales::root))
        .route("/health", get(|| async { "ok" }))
        .route("/api/upload-sales", post(handlers::sales::upload_sales))
        .route("/api/run-analysis", post(handlers::sales::run_analysis))
}
