// src/config.rs

pub mod app;
pub mod email;
pub mod stripe;

pub use app::AppConfig;
pub use email::EmailConfig;
pub use stripe::StripeConfig;

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("Invalid {name} value: {value}")]
    Invalid { name: &'static str, value: String },
}

/// 環境変数を読み込み、未設定なら既定値を使う
pub(crate) fn env_or(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.to_string())
}

/// 必須の環境変数（空文字は未設定扱い）
pub(crate) fn env_required(name: &'static str) -> Result<String, ConfigError> {
    std::env::var(name)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .ok_or(ConfigError::Missing(name))
}

/// 数値などにパースできる環境変数
pub(crate) fn env_parse<T: std::str::FromStr>(
    name: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match std::env::var(name) {
        Ok(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid {
            name,
            value: raw,
        }),
        Err(_) => Ok(default),
    }
}

/// "true"/"1" を真とみなすフラグ
pub(crate) fn env_flag(name: &str) -> bool {
    std::env::var(name)
        .is_ok_and(|v| matches!(v.trim().to_lowercase().as_str(), "true" | "1" | "yes"))
}
