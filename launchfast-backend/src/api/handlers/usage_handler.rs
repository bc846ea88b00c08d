// launchfast-backend/src/api/handlers/usage_handler.rs

use crate::api::dto::usage_dto::ConsumeUsageRequest;
use crate::api::AppState;
use crate::domain::usage::{UsageAction, UsageDecision};
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthenticatedUser;
use crate::service::usage_service::UsageSummary;
use crate::types::ApiResponse;
use axum::{
    extract::{Json, Path, State},
    http::StatusCode,
    routing::{get, post},
    Router,
};
use chrono::Utc;
use validator::Validate;

/// 当月の利用状況取得
pub async fn get_usage_handler(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
) -> AppResult<Json<ApiResponse<UsageSummary>>> {
    let summary = app_state
        .usage_service
        .get_summary(user.user_id, Utc::now())
        .await?;

    Ok(Json(ApiResponse::success(summary)))
}

/// 加算せずに利用可否を判定
pub async fn check_usage_handler(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Path(action): Path<String>,
) -> AppResult<Json<ApiResponse<UsageDecision>>> {
    let action: UsageAction = action.parse().map_err(AppError::ValidationError)?;

    let decision = app_state
        .usage_service
        .check(user.user_id, action, Utc::now())
        .await?;

    Ok(Json(ApiResponse::success(decision)))
}

/// 利用量を加算（上限に達している場合は403と判定結果を返す）
pub async fn consume_usage_handler(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Json(payload): Json<ConsumeUsageRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<UsageDecision>>)> {
    payload.validate()?;

    let decision = app_state
        .usage_service
        .consume(user.user_id, payload.action, Utc::now())
        .await?;

    if decision.allowed {
        return Ok((StatusCode::OK, Json(ApiResponse::success(decision))));
    }

    Ok(usage_denied(decision))
}

/// 拒否された判定を403のレスポンスに変換
pub fn usage_denied(decision: UsageDecision) -> (StatusCode, Json<ApiResponse<UsageDecision>>) {
    let message = decision
        .reason
        .clone()
        .unwrap_or_else(|| "Usage limit reached".to_string());
    (
        StatusCode::FORBIDDEN,
        Json(ApiResponse {
            success: false,
            data: Some(decision),
            message: Some(message),
        }),
    )
}

pub fn usage_router(app_state: AppState) -> Router {
    Router::new()
        .route("/usage", get(get_usage_handler))
        .route("/usage/check/{action}", get(check_usage_handler))
        .route("/usage/consume", post(consume_usage_handler))
        .with_state(app_state)
}
