// launchfast-backend/src/middleware/subscription_guard.rs

use crate::api::AppState;
use crate::domain::subscription_state::SubscriptionState;
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthenticatedUser;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use tracing::warn;

/// サブスクリプション管理（ポータル）の可否をチェック
pub fn check_manage_subscription(state: &SubscriptionState) -> AppResult<()> {
    if state.can_manage_subscription {
        return Ok(());
    }

    Err(AppError::Forbidden(
        "No manageable subscription for this account".to_string(),
    ))
}

/// サブスクリプション管理権限を要求するミドルウェア
pub async fn require_manage_subscription(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let state = app_state
        .subscription_service
        .get_state(user.user_id)
        .await?;

    if let Err(e) = check_manage_subscription(&state) {
        warn!(user_id = %user.user_id, "Subscription management denied");
        return Err(e);
    }

    Ok(next.run(request).await)
}
