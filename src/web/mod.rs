use axum::{Router, http::Method, routing::get};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use crate::monitor::Monitor;

pub mod error;
pub mod models;
pub mod routes;

pub use error::AppError;

#[derive(Clone)]
pub struct AppState {
    pub monitor: Arc<Monitor>,
}

async fn health_check_handler() -> &'static str {
    "OK"
}

pub fn create_axum_router(monitor: Arc<Monitor>) -> Router {
    let app_state = Arc::new(AppState { monitor });

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(vec![Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_check_handler))
        .nest("/api/monitor", routes::monitor_routes::create_monitor_router())
        .with_state(app_state)
        .layer(cors)
}
