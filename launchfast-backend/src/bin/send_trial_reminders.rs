// src/bin/send_trial_reminders.rs
//
// トライアル終了リマインダーを1回分送信する。cron等から定期実行する想定。

use chrono::Utc;
use launchfast_backend::config::{AppConfig, EmailConfig};
use launchfast_backend::db::create_db_pool;
use launchfast_backend::service::trial_reminder_service::TrialReminderService;
use launchfast_backend::utils::email::EmailService;
use std::sync::Arc;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "launchfast_backend=info".into()),
        )
        .with(fmt::layer())
        .init();

    let app_config = AppConfig::from_env()?;
    let email_config = EmailConfig::from_env()?;

    let db_pool = create_db_pool(&app_config).await?;
    let mailer = Arc::new(EmailService::new(email_config)?);

    let service = TrialReminderService::new(
        db_pool,
        mailer,
        app_config.frontend_url.clone(),
        app_config.trial_reminder_days,
    );
    let report = service.run(Utc::now()).await?;

    println!("{}", serde_json::to_string(&report)?);

    if report.failed > 0 {
        std::process::exit(1);
    }
    Ok(())
}
