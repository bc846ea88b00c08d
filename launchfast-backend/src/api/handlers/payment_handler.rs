// launchfast-backend/src/api/handlers/payment_handler.rs

use crate::api::dto::payment_dto::{CreateCheckoutResponse, CustomerPortalResponse};
use crate::api::AppState;
use crate::error::AppResult;
use crate::middleware::auth::AuthenticatedUser;
use crate::middleware::subscription_guard::require_manage_subscription;
use crate::types::ApiResponse;
use axum::{
    extract::{Json, State},
    http::HeaderMap,
    middleware,
    routing::post,
    Router,
};
use tracing::{info, warn};

/// Pro プランのチェックアウトセッション作成
pub async fn create_checkout_handler(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
) -> AppResult<Json<ApiResponse<CreateCheckoutResponse>>> {
    info!(user_id = %user.user_id, "Creating checkout session");

    let checkout_url = app_state
        .payment_service
        .create_checkout_session(user.user_id)
        .await?;

    Ok(Json(ApiResponse::success(CreateCheckoutResponse {
        checkout_url,
    })))
}

/// カスタマーポータルセッション作成
pub async fn create_customer_portal_handler(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
) -> AppResult<Json<ApiResponse<CustomerPortalResponse>>> {
    info!(user_id = %user.user_id, "Creating customer portal session");

    let portal_url = app_state
        .payment_service
        .create_portal_session(user.user_id)
        .await?;

    Ok(Json(ApiResponse::success(CustomerPortalResponse {
        portal_url,
    })))
}

/// Stripe Webhookハンドラー
pub async fn stripe_webhook_handler(
    State(app_state): State<AppState>,
    headers: HeaderMap,
    body: String,
) -> AppResult<Json<ApiResponse<()>>> {
    let stripe_signature = headers
        .get("stripe-signature")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    if stripe_signature.is_empty() {
        warn!("Webhook received without stripe-signature header");
    }

    app_state
        .payment_service
        .handle_webhook(&body, stripe_signature)
        .await?;

    Ok(Json(ApiResponse::success(())))
}

/// 認証が必要な決済ルート
pub fn payment_router(app_state: AppState) -> Router {
    let portal = Router::new()
        .route("/payments/portal", post(create_customer_portal_handler))
        .route_layer(middleware::from_fn_with_state(
            app_state.clone(),
            require_manage_subscription,
        ));

    Router::new()
        .route("/payments/checkout", post(create_checkout_handler))
        .merge(portal)
        .with_state(app_state)
}

/// Stripeから呼ばれるルート（署名で検証するため認証不要）
pub fn webhook_router(app_state: AppState) -> Router {
    Router::new()
        .route("/webhooks/stripe", post(stripe_webhook_handler))
        .with_state(app_state)
}
