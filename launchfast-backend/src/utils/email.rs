// launchfast-backend/src/utils/email.rs

use crate::config::EmailConfig;
use async_trait::async_trait;
use lettre::{
    message::{Mailbox, MultiPart},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

/// メール送信エラー
#[derive(Error, Debug)]
pub enum EmailError {
    #[error("SMTP configuration error: {0}")]
    ConfigurationError(String),

    #[error("Failed to send email: {0}")]
    SendError(String),

    #[error("Invalid email address: {0}")]
    InvalidAddress(String),
}

/// メールテンプレート
#[derive(Debug, Clone, Serialize)]
pub struct EmailTemplate {
    pub name: &'static str,
    pub subject: String,
    pub html_body: String,
    pub text_body: String,
}

/// メール送信内容
#[derive(Debug, Clone)]
pub struct EmailMessage {
    pub to_email: String,
    pub to_name: Option<String>,
    pub subject: String,
    pub html_body: String,
    pub text_body: String,
}

impl EmailMessage {
    pub fn from_template(to_email: &str, to_name: Option<&str>, template: EmailTemplate) -> Self {
        Self {
            to_email: to_email.to_string(),
            to_name: to_name.map(str::to_string),
            subject: template.subject,
            html_body: template.html_body,
            text_body: template.text_body,
        }
    }
}

/// 送信手段の抽象（テストでは差し替える）
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, message: EmailMessage) -> Result<(), EmailError>;
}

/// SMTP経由のメール送信サービス
pub struct EmailService {
    config: EmailConfig,
    transport: Option<AsyncSmtpTransport<Tokio1Executor>>,
}

impl EmailService {
    pub fn new(config: EmailConfig) -> Result<Self, EmailError> {
        if !is_valid_email(&config.from_email) {
            return Err(EmailError::InvalidAddress(config.from_email.clone()));
        }

        // 開発モードではトランスポートを作らずログ出力のみ
        let transport = if config.development_mode {
            None
        } else {
            let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)
                .map_err(|e| EmailError::ConfigurationError(e.to_string()))?
                .port(config.smtp_port)
                .credentials(Credentials::new(
                    config.smtp_username.clone(),
                    config.smtp_password.clone(),
                ))
                .build();
            Some(transport)
        };

        Ok(Self { config, transport })
    }

    fn build_message(&self, message: &EmailMessage) -> Result<Message, EmailError> {
        let from: Mailbox = self
            .config
            .from_mailbox()
            .parse()
            .map_err(|_| EmailError::InvalidAddress(self.config.from_email.clone()))?;
        let to_address = message
            .to_email
            .parse()
            .map_err(|_| EmailError::InvalidAddress(message.to_email.clone()))?;
        let to = Mailbox::new(message.to_name.clone(), to_address);

        Message::builder()
            .from(from)
            .to(to)
            .subject(message.subject.clone())
            .multipart(MultiPart::alternative_plain_html(
                message.text_body.clone(),
                message.html_body.clone(),
            ))
            .map_err(|e| EmailError::SendError(e.to_string()))
    }

    /// 開発モードでのメールログ出力
    fn log_email(&self, message: &EmailMessage) {
        info!(
            to_email = %mask_email(&message.to_email),
            subject = %message.subject,
            "EMAIL (development mode)"
        );
        tracing::debug!(body = %message.text_body, "Email text body");
    }
}

#[async_trait]
impl Mailer for EmailService {
    async fn send(&self, message: EmailMessage) -> Result<(), EmailError> {
        if !is_valid_email(&message.to_email) {
            return Err(EmailError::InvalidAddress(message.to_email));
        }

        let Some(transport) = &self.transport else {
            self.log_email(&message);
            return Ok(());
        };

        let email = self.build_message(&message)?;
        transport.send(email).await.map_err(|e| {
            warn!(to_email = %mask_email(&message.to_email), error = %e, "SMTP send failed");
            EmailError::SendError(e.to_string())
        })?;

        info!(
            to_email = %mask_email(&message.to_email),
            subject = %message.subject,
            "Email sent successfully"
        );
        Ok(())
    }
}

// --- テンプレート ---

fn layout(title: &str, accent: &str, body_html: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head><meta charset="utf-8"><title>{title}</title></head>
<body style="font-family: Arial, sans-serif; line-height: 1.6; color: #333;">
  <div style="max-width: 600px; margin: 0 auto; padding: 20px;">
    <h1 style="color: {accent};">{title}</h1>
    {body_html}
    <hr style="margin: 30px 0; border: none; border-top: 1px solid #eee;">
    <p style="font-size: 12px; color: #666;">LaunchFast - Amazon product research</p>
  </div>
</body>
</html>"#
    )
}

fn button(url: &str, label: &str, color: &str) -> String {
    format!(
        r#"<p><a href="{url}" style="background-color: {color}; color: white; padding: 12px 24px; text-decoration: none; border-radius: 4px; display: inline-block;">{label}</a></p>"#
    )
}

/// トライアル終了リマインダー
pub fn trial_ending_template(name: &str, trial_end: &str, billing_url: &str) -> EmailTemplate {
    let html = format!(
        "<p>Hello {name},</p>\
         <p>Your LaunchFast Pro trial ends on <strong>{trial_end}</strong>.</p>\
         <p>Your subscription starts automatically when the trial ends. \
         You can review or cancel it at any time from the billing page.</p>{}",
        button(billing_url, "Manage subscription", "#2563eb")
    );
    let text = format!(
        "Hello {name},\n\n\
         Your LaunchFast Pro trial ends on {trial_end}.\n\n\
         Your subscription starts automatically when the trial ends. \
         You can review or cancel it at any time:\n{billing_url}\n\n---\nLaunchFast"
    );

    EmailTemplate {
        name: "trial_ending",
        subject: format!("Your LaunchFast trial ends on {}", trial_end),
        html_body: layout("Your trial is ending soon", "#2563eb", &html),
        text_body: text,
    }
}

/// プロモコード適用の確認
pub fn promo_applied_template(
    name: &str,
    code: &str,
    plan_name: &str,
    access_until: Option<&str>,
) -> EmailTemplate {
    let duration = access_until.map_or_else(
        || "Your access does not expire.".to_string(),
        |until| format!("Your access is active until {}.", until),
    );
    let html = format!(
        "<p>Hello {name},</p>\
         <p>The promo code <strong>{code}</strong> has been applied to your account. \
         You now have <strong>{plan_name}</strong>.</p><p>{duration}</p>"
    );
    let text = format!(
        "Hello {name},\n\n\
         The promo code {code} has been applied to your account. You now have {plan_name}.\n\
         {duration}\n\n---\nLaunchFast"
    );

    EmailTemplate {
        name: "promo_applied",
        subject: format!("Promo code applied: {}", plan_name),
        html_body: layout("Promo code applied", "#16a34a", &html),
        text_body: text,
    }
}

/// 支払い失敗の通知
pub fn payment_failed_template(name: &str, billing_url: &str) -> EmailTemplate {
    let html = format!(
        "<p>Hello {name},</p>\
         <p>We were unable to process the latest payment for your LaunchFast subscription.</p>\
         <p>Please update your payment method to keep access to Pro features.</p>{}",
        button(billing_url, "Update payment method", "#dc2626")
    );
    let text = format!(
        "Hello {name},\n\n\
         We were unable to process the latest payment for your LaunchFast subscription.\n\
         Please update your payment method to keep access to Pro features:\n{billing_url}\n\n---\nLaunchFast"
    );

    EmailTemplate {
        name: "payment_failed",
        subject: "Action required: payment failed".to_string(),
        html_body: layout("Payment failed", "#dc2626", &html),
        text_body: text,
    }
}

// --- ユーティリティ関数 ---

/// 簡単なメールアドレス検証
pub fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };

    !local.is_empty()
        && !domain.is_empty()
        && !domain.contains('@')
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
}

/// メールアドレスをマスク
pub fn mask_email(email: &str) -> String {
    if let Some(at_pos) = email.find('@') {
        let (local, domain) = email.split_at(at_pos);
        let masked_local = if local.chars().count() <= 2 {
            "*".repeat(local.chars().count())
        } else {
            format!("{}****", local.chars().next().unwrap_or('*'))
        };
        format!("{}{}", masked_local, domain)
    } else {
        "****@****".to_string()
    }
}
