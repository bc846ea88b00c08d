// tests/common/mailer.rs

use async_trait::async_trait;
use launchfast_backend::utils::email::{EmailError, EmailMessage, Mailer};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};

/// 送信内容を記録するだけのメーラー
#[derive(Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<EmailMessage>>,
    failing_recipients: HashSet<String>,
}

impl RecordingMailer {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// 指定したアドレスへの送信だけ失敗させる
    pub fn failing_for(recipients: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            sent: Mutex::new(Vec::new()),
            failing_recipients: recipients.iter().map(|r| r.to_string()).collect(),
        })
    }

    pub fn sent(&self) -> Vec<EmailMessage> {
        self.sent.lock().unwrap().clone()
    }

    pub fn sent_to(&self, email: &str) -> Vec<EmailMessage> {
        self.sent()
            .into_iter()
            .filter(|m| m.to_email == email)
            .collect()
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, message: EmailMessage) -> Result<(), EmailError> {
        if self.failing_recipients.contains(&message.to_email) {
            return Err(EmailError::SendError("simulated SMTP failure".to_string()));
        }
        self.sent.lock().unwrap().push(message);
        Ok(())
    }
}
