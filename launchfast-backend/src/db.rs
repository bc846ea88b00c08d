// src/db.rs
use crate::config::AppConfig;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbErr, Statement};
use std::time::Duration;

pub type DbPool = DatabaseConnection;

pub async fn create_db_pool(config: &AppConfig) -> Result<DbPool, DbErr> {
    let mut opt = ConnectOptions::new(config.database_url.clone());

    // 接続オプションを設定
    opt.max_connections(20)
        .min_connections(2)
        .connect_timeout(Duration::from_secs(8))
        .acquire_timeout(Duration::from_secs(8))
        .idle_timeout(Duration::from_secs(300))
        .max_lifetime(Duration::from_secs(30 * 60))
        .sqlx_logging(config.is_development());

    Database::connect(opt).await
}

/// ヘルスチェック用の疎通確認
pub async fn ping(conn: &DbPool) -> Result<(), DbErr> {
    conn.execute(Statement::from_string(
        sea_orm::DatabaseBackend::Postgres,
        "SELECT 1".to_string(),
    ))
    .await?;
    Ok(())
}
