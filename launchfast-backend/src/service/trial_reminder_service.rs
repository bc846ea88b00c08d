// launchfast-backend/src/service/trial_reminder_service.rs

use crate::db::DbPool;
use crate::error::AppResult;
use crate::repository::profile_repository::ProfileRepository;
use crate::utils::email::{mask_email, trial_ending_template, EmailMessage, Mailer};
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info, warn};

/// リマインダー送信ジョブの実行結果
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TrialReminderReport {
    pub candidates: usize,
    pub sent: usize,
    pub failed: usize,
}

#[derive(Clone)]
pub struct TrialReminderService {
    profile_repo: Arc<ProfileRepository>,
    mailer: Arc<dyn Mailer>,
    frontend_url: String,
    reminder_window: Duration,
}

impl TrialReminderService {
    pub fn new(
        db: DbPool,
        mailer: Arc<dyn Mailer>,
        frontend_url: String,
        reminder_days: i64,
    ) -> Self {
        Self {
            profile_repo: Arc::new(ProfileRepository::new(db)),
            mailer,
            frontend_url,
            reminder_window: Duration::days(reminder_days),
        }
    }

    /// 終了が近いトライアルへリマインダーを1回分送信する
    ///
    /// 送信に成功したユーザーのみ送信済みとして記録する。
    /// 個別の失敗はカウントして処理を続ける。
    pub async fn run(&self, now: DateTime<Utc>) -> AppResult<TrialReminderReport> {
        let candidates = self
            .profile_repo
            .find_trial_reminder_candidates(now, now + self.reminder_window)
            .await?;

        let mut report = TrialReminderReport {
            candidates: candidates.len(),
            ..Default::default()
        };
        let billing_url = format!("{}/billing", self.frontend_url);

        for profile in candidates {
            let Some(trial_end) = profile.current_period_end else {
                continue;
            };

            let message = EmailMessage::from_template(
                &profile.email,
                profile.full_name.as_deref(),
                trial_ending_template(
                    profile.display_name(),
                    &trial_end.format("%B %-d, %Y").to_string(),
                    &billing_url,
                ),
            );

            if let Err(e) = self.mailer.send(message).await {
                warn!(
                    user_id = %profile.id,
                    email = %mask_email(&profile.email),
                    error = %e,
                    "Failed to send trial reminder"
                );
                report.failed += 1;
                continue;
            }

            match self.profile_repo.mark_trial_reminder_sent(profile.id, now).await {
                Ok(_) => report.sent += 1,
                Err(e) => {
                    // 送信済みだが記録できなかった場合は次回再送される
                    error!(user_id = %profile.id, error = %e, "Failed to record trial reminder");
                    report.failed += 1;
                }
            }
        }

        info!(
            candidates = report.candidates,
            sent = report.sent,
            failed = report.failed,
            "Trial reminder run finished"
        );

        Ok(report)
    }
}
