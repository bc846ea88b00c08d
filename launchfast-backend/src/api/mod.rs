// launchfast-backend/src/api/mod.rs
use crate::config::{AppConfig, StripeConfig};
use crate::db::DbPool;
use crate::logging::{inject_request_context, logging_middleware};
use crate::middleware::auth::{
    cors_layer, jwt_auth_middleware, security_headers_middleware, AuthMiddlewareConfig,
};
use crate::service::{
    payment_service::PaymentService, promo_code_service::PromoCodeService,
    subscription_service::SubscriptionService, usage_service::UsageService,
};
use crate::utils::email::Mailer;
use crate::utils::jwt::JwtManager;
use axum::{middleware, Router};
use std::sync::Arc;
use std::time::Duration;
use tower_http::{limit::RequestBodyLimitLayer, timeout::TimeoutLayer, trace::TraceLayer};

pub mod dto;
pub mod handlers;

use handlers::{
    payment_handler, product_handler, promo_code_handler, subscription_handler, system_handler,
    usage_handler,
};

/// 統一されたアプリケーション状態
#[derive(Clone)]
pub struct AppState {
    pub subscription_service: Arc<SubscriptionService>,
    pub usage_service: Arc<UsageService>,
    pub payment_service: Arc<PaymentService>,
    pub promo_code_service: Arc<PromoCodeService>,
    pub jwt_manager: Arc<JwtManager>,
    pub db: DbPool,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn with_config(
        db: DbPool,
        app_config: &AppConfig,
        stripe_config: StripeConfig,
        mailer: Arc<dyn Mailer>,
        jwt_manager: Arc<JwtManager>,
    ) -> Self {
        let subscription_service = Arc::new(SubscriptionService::new(db.clone()));
        let usage_service = Arc::new(UsageService::new(
            db.clone(),
            subscription_service.clone(),
        ));
        let payment_service = Arc::new(PaymentService::new(
            db.clone(),
            stripe_config,
            app_config.frontend_url.clone(),
            mailer.clone(),
        ));
        let promo_code_service = Arc::new(PromoCodeService::new(
            db.clone(),
            subscription_service.clone(),
            mailer,
        ));

        Self {
            subscription_service,
            usage_service,
            payment_service,
            promo_code_service,
            jwt_manager,
            db,
            config: Arc::new(app_config.clone()),
        }
    }
}

/// 全ルートとミドルウェアを組み立てる
pub fn create_router(app_state: AppState) -> Router {
    let auth_config = AuthMiddlewareConfig::new(app_state.jwt_manager.clone());
    let config = app_state.config.clone();

    // 認証が必要なルート（サブスクリプションのガードは各ルーター内で認証の後に実行される）
    let protected = Router::new()
        .merge(subscription_handler::subscription_router(app_state.clone()))
        .merge(usage_handler::usage_router(app_state.clone()))
        .merge(product_handler::product_router(app_state.clone()))
        .merge(payment_handler::payment_router(app_state.clone()))
        .merge(promo_code_handler::promo_code_router(app_state.clone()))
        .route_layer(middleware::from_fn_with_state(
            auth_config,
            jwt_auth_middleware,
        ));

    let public = Router::new()
        .merge(system_handler::system_router(app_state.clone()))
        .merge(subscription_handler::public_subscription_router(
            app_state.clone(),
        ))
        .merge(payment_handler::webhook_router(app_state));

    Router::new()
        .merge(public)
        .merge(protected)
        .layer(middleware::from_fn(security_headers_middleware))
        .layer(middleware::from_fn(logging_middleware))
        .layer(middleware::from_fn(inject_request_context))
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.server.request_timeout_secs,
        )))
        .layer(RequestBodyLimitLayer::new(config.server.body_limit))
        .layer(cors_layer(&config))
        .layer(TraceLayer::new_for_http())
}
