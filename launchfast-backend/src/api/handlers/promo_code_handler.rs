// launchfast-backend/src/api/handlers/promo_code_handler.rs

use crate::api::dto::promo_code_dto::RedeemPromoCodeRequest;
use crate::api::handlers::subscription_handler::SubscriptionResponse;
use crate::api::AppState;
use crate::error::AppResult;
use crate::middleware::auth::AuthenticatedUser;
use crate::types::ApiResponse;
use axum::{
    extract::{Json, State},
    routing::post,
    Router,
};
use chrono::Utc;
use validator::Validate;

/// プロモコード引き換え
pub async fn redeem_promo_code_handler(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Json(payload): Json<RedeemPromoCodeRequest>,
) -> AppResult<Json<ApiResponse<SubscriptionResponse>>> {
    payload.validate()?;

    let state = app_state
        .promo_code_service
        .redeem(user.user_id, &payload.code, Utc::now())
        .await?;

    Ok(Json(ApiResponse::success_with_message(
        state.into(),
        "Promo code applied",
    )))
}

pub fn promo_code_router(app_state: AppState) -> Router {
    Router::new()
        .route("/promo-codes/redeem", post(redeem_promo_code_handler))
        .with_state(app_state)
}
