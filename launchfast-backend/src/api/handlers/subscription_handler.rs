// launchfast-backend/src/api/handlers/subscription_handler.rs

use crate::api::AppState;
use crate::domain::plan::PlanDefinition;
use crate::domain::subscription_state::SubscriptionState;
use crate::error::AppResult;
use crate::middleware::auth::AuthenticatedUser;
use crate::types::ApiResponse;
use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;
use tracing::info;

#[derive(Debug, Serialize)]
pub struct SubscriptionResponse {
    #[serde(flatten)]
    pub state: SubscriptionState,
    pub billing_summary: String,
}

impl From<SubscriptionState> for SubscriptionResponse {
    fn from(state: SubscriptionState) -> Self {
        let billing_summary = state.billing_summary();
        Self {
            state,
            billing_summary,
        }
    }
}

/// 現在のサブスクリプション状態取得
pub async fn get_subscription_handler(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
) -> AppResult<Json<ApiResponse<SubscriptionResponse>>> {
    let state = app_state
        .subscription_service
        .get_state(user.user_id)
        .await?;

    info!(
        user_id = %user.user_id,
        tier = ?state.tier,
        can_access_features = state.can_access_features,
        "Subscription state retrieved"
    );

    Ok(Json(ApiResponse::success(state.into())))
}

/// 公開プラン一覧
pub async fn get_plans_handler(
    State(app_state): State<AppState>,
) -> Json<ApiResponse<&'static [PlanDefinition]>> {
    Json(ApiResponse::success(app_state.subscription_service.plans()))
}

/// 認証が必要なルート
pub fn subscription_router(app_state: AppState) -> Router {
    Router::new()
        .route("/subscription", get(get_subscription_handler))
        .with_state(app_state)
}

/// 認証不要のルート
pub fn public_subscription_router(app_state: AppState) -> Router {
    Router::new()
        .route("/subscription/plans", get(get_plans_handler))
        .with_state(app_state)
}
