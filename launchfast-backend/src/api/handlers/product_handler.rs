// launchfast-backend/src/api/handlers/product_handler.rs

use crate::api::dto::product_dto::ScoreProductRequest;
use crate::api::handlers::usage_handler::usage_denied;
use crate::api::AppState;
use crate::domain::product_scoring::{score_product, ProductData, SalesPrediction};
use crate::domain::usage::UsageAction;
use crate::error::AppResult;
use crate::middleware::auth::AuthenticatedUser;
use crate::types::ApiResponse;
use axum::{
    extract::{Json, State},
    response::{IntoResponse, Response},
    routing::post,
    Router,
};
use chrono::Utc;
use tracing::info;
use validator::Validate;

/// 商品スコアリング（1回ごとに月間検索枠を1消費する）
pub async fn score_product_handler(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Json(payload): Json<ScoreProductRequest>,
) -> AppResult<Response> {
    payload.validate()?;

    let decision = app_state
        .usage_service
        .consume(user.user_id, UsageAction::Search, Utc::now())
        .await?;
    if !decision.allowed {
        return Ok(usage_denied(decision).into_response());
    }

    let ScoreProductRequest {
        product,
        sales,
        ai_analysis,
        keywords,
    } = payload;
    let product: ProductData = product.into();
    let sales: SalesPrediction = sales.into();

    let result = score_product(&product, &sales, &ai_analysis, &keywords);

    info!(
        user_id = %user.user_id,
        asin = %product.asin,
        grade = %result.grade,
        score = result.score,
        searches_used = decision.current,
        "Product scored"
    );

    Ok(Json(ApiResponse::success(result)).into_response())
}

pub fn product_router(app_state: AppState) -> Router {
    Router::new()
        .route("/products/score", post(score_product_handler))
        .with_state(app_state)
}
