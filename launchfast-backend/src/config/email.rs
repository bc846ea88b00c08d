use super::{env_flag, env_or, env_parse, env_required, ConfigError};

/// メール設定
#[derive(Debug, Clone)]
pub struct EmailConfig {
    /// SMTP サーバーホスト
    pub smtp_host: String,
    /// SMTP サーバーポート
    pub smtp_port: u16,
    pub smtp_username: String,
    pub smtp_password: String,
    /// 送信者メールアドレス
    pub from_email: String,
    /// 送信者名
    pub from_name: String,
    /// 開発モードかどうか（ログ出力のみ）
    pub development_mode: bool,
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            smtp_host: "localhost".to_string(),
            smtp_port: 587,
            smtp_username: String::new(),
            smtp_password: String::new(),
            from_email: "noreply@launchfast.io".to_string(),
            from_name: "LaunchFast".to_string(),
            development_mode: true,
        }
    }
}

impl EmailConfig {
    /// 環境変数から設定を読み込み
    pub fn from_env() -> Result<Self, ConfigError> {
        // 未設定時は開発モード
        let development_mode = std::env::var("EMAIL_DEVELOPMENT_MODE").is_err()
            || env_flag("EMAIL_DEVELOPMENT_MODE");

        if development_mode {
            return Ok(Self {
                from_email: env_or("FROM_EMAIL", "noreply@launchfast.io"),
                from_name: env_or("FROM_NAME", "LaunchFast"),
                ..Default::default()
            });
        }

        Ok(Self {
            smtp_host: env_required("SMTP_HOST")?,
            smtp_port: env_parse("SMTP_PORT", 587)?,
            smtp_username: env_required("SMTP_USERNAME")?,
            smtp_password: env_required("SMTP_PASSWORD")?,
            from_email: env_required("FROM_EMAIL")?,
            from_name: env_or("FROM_NAME", "LaunchFast"),
            development_mode: false,
        })
    }

    /// "LaunchFast <noreply@launchfast.io>" 形式の送信者
    pub fn from_mailbox(&self) -> String {
        format!("{} <{}>", self.from_name, self.from_email)
    }
}
