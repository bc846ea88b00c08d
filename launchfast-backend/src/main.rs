// src/main.rs
use launchfast_backend::api::{create_router, AppState};
use launchfast_backend::config::{AppConfig, EmailConfig, StripeConfig};
use launchfast_backend::db::create_db_pool;
use launchfast_backend::utils::email::EmailService;
use launchfast_backend::utils::jwt::JwtManager;
use migration::{Migrator, MigratorTrait};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    // トレーシングの設定
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "launchfast_backend=info,tower_http=info".into()),
        )
        .with(fmt::layer())
        .init();

    tracing::info!("Starting LaunchFast backend...");

    // 設定を読み込む
    let app_config = AppConfig::from_env()?;
    let stripe_config = StripeConfig::from_env()?;
    let email_config = EmailConfig::from_env()?;
    tracing::info!(
        environment = %app_config.environment,
        payment_development_mode = stripe_config.development_mode,
        email_development_mode = email_config.development_mode,
        "Configuration loaded"
    );
    if app_config.is_production() && stripe_config.is_test_mode() {
        tracing::warn!("Stripe is running with test credentials in production");
    }

    // データベース接続とマイグレーション
    let db_pool = create_db_pool(&app_config).await?;
    Migrator::up(&db_pool, None).await?;
    tracing::info!("Database pool created and migrations applied.");

    let jwt_manager = Arc::new(JwtManager::new(&app_config.supabase_jwt_secret)?);
    let mailer = Arc::new(EmailService::new(email_config)?);

    let app_state = AppState::with_config(
        db_pool,
        &app_config,
        stripe_config,
        mailer,
        jwt_manager,
    );
    let app_router = create_router(app_state);

    // サーバーの起動
    let server_addr = app_config.server_addr();
    tracing::info!("Router configured. Server listening on {}", server_addr);

    let listener = TcpListener::bind(&server_addr).await?;
    axum::serve(listener, app_router.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        return;
    }
    tracing::info!("Shutdown signal received");
}
