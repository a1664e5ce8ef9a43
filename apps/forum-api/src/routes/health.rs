use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use serde::Serialize;
use utoipa::ToSchema;

use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health))
}

/// Unauthenticated API reachability probe, mounted under `/api/v1`.
pub fn api_router() -> Router<AppState> {
    Router::new().route("/ping", get(ping))
}

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
}

#[utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    responses((status = 200, description = "Service is up", body = HealthResponse)),
)]
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok".to_string() })
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PingResponse {
    pub ok: bool,
    /// Server time, seconds since the Unix epoch.
    pub ts: i64,
}

#[utoipa::path(
    get,
    path = "/api/v1/ping",
    tag = "Health",
    responses((status = 200, description = "API reachable", body = PingResponse)),
)]
pub async fn ping() -> Json<PingResponse> {
    Json(PingResponse {
        ok: true,
        ts: Utc::now().timestamp(),
    })
}
