// launchfast-backend/src/api/handlers/system_handler.rs

use crate::api::AppState;
use crate::db;
use crate::types::ApiResponse;
use axum::{extract::State, routing::get, Json, Router};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::warn;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub database: &'static str,
    pub version: &'static str,
    pub timestamp: DateTime<Utc>,
}

/// ヘルスチェック（DBに到達できなくてもプロセスは生存として返す）
pub async fn health_handler(State(app_state): State<AppState>) -> Json<ApiResponse<HealthResponse>> {
    let database = match db::ping(&app_state.db).await {
        Ok(()) => "ok",
        Err(e) => {
            warn!(error = %e, "Database health check failed");
            "unavailable"
        }
    };

    Json(ApiResponse::success(HealthResponse {
        status: "ok",
        database,
        version: env!("CARGO_PKG_VERSION"),
        timestamp: Utc::now(),
    }))
}

pub fn system_router(app_state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .with_state(app_state)
}
