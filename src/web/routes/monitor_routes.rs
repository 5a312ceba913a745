use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post},
};
use std::sync::Arc;
use tracing::info;

use crate::monitor::{MonitorStatus, SchedulerState};
use crate::web::models::{
    MessageResponse, PingOneRequest, PingOneResponse, PingTargetResponse, UpdateConfigRequest,
};
use crate::web::{AppError, AppState};

pub fn create_monitor_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/status", get(get_status))
        .route("/config", post(update_config))
        .route("/ping-all", post(ping_all))
        .route("/ping-one", post(ping_one))
        .route("/ping/{id}", post(ping_by_id))
        .route("/scheduler", get(get_scheduler_state))
}

#[axum::debug_handler]
async fn get_status(
    State(app_state): State<Arc<AppState>>,
) -> Result<Json<MonitorStatus>, AppError> {
    Ok(Json(app_state.monitor.get_status().await?))
}

#[axum::debug_handler]
async fn update_config(
    State(app_state): State<Arc<AppState>>,
    Json(payload): Json<UpdateConfigRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    app_state
        .monitor
        .update_config(payload.interval, payload.enabled)
        .await?;
    Ok(Json(MessageResponse::new("Settings updated")))
}

#[axum::debug_handler]
async fn ping_all(
    State(app_state): State<Arc<AppState>>,
) -> Result<Json<MessageResponse>, AppError> {
    app_state.monitor.run_full_sweep()?;
    info!("Full sweep requested over HTTP.");
    Ok(Json(MessageResponse::new("Ping job started in background")))
}

#[axum::debug_handler]
async fn ping_one(
    State(app_state): State<Arc<AppState>>,
    Json(payload): Json<PingOneRequest>,
) -> Result<Json<PingOneResponse>, AppError> {
    let ip = payload
        .ip
        .filter(|ip| !ip.is_empty())
        .ok_or_else(|| AppError::InvalidInput("IP required".to_string()))?;
    let outcome = app_state.monitor.probe_one(&ip).await?;
    Ok(Json(PingOneResponse {
        message: "Ping check completed".to_string(),
        outcome,
    }))
}

#[axum::debug_handler]
async fn ping_by_id(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<Json<PingTargetResponse>, AppError> {
    let outcome = app_state.monitor.probe_target(id).await?;
    Ok(Json(PingTargetResponse {
        status: outcome.status,
    }))
}

#[axum::debug_handler]
async fn get_scheduler_state(State(app_state): State<Arc<AppState>>) -> Json<SchedulerState> {
    Json(app_state.monitor.scheduler_state())
}
