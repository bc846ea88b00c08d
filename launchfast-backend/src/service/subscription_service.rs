// launchfast-backend/src/service/subscription_service.rs

use crate::db::DbPool;
use crate::domain::plan::PlanDefinition;
use crate::domain::profile_model::Model as Profile;
use crate::domain::subscription_state::SubscriptionState;
use crate::error::{AppError, AppResult};
use crate::repository::profile_repository::ProfileRepository;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

#[derive(Clone)]
pub struct SubscriptionService {
    profile_repo: Arc<ProfileRepository>,
}

impl SubscriptionService {
    pub fn new(db: DbPool) -> Self {
        Self {
            profile_repo: Arc::new(ProfileRepository::new(db)),
        }
    }

    /// プロフィールを取得（存在しなければ NotFound）
    pub async fn get_profile(&self, user_id: Uuid) -> AppResult<Profile> {
        self.profile_repo
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Profile not found".to_string()))
    }

    /// ユーザーのサブスクリプション状態を解決
    ///
    /// プロフィールが無い場合も、エラー付きの無料状態として返す。
    pub async fn get_state(&self, user_id: Uuid) -> AppResult<SubscriptionState> {
        self.get_state_at(user_id, Utc::now()).await
    }

    pub async fn get_state_at(
        &self,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> AppResult<SubscriptionState> {
        let profile = self.profile_repo.find_by_id(user_id).await?;
        let data = profile.as_ref().map(Profile::subscription_data);
        let state = SubscriptionState::resolve(data.as_ref(), now);

        if state.errors.is_empty() {
            debug!(user_id = %user_id, tier = ?state.tier, "Subscription state resolved");
        } else {
            warn!(
                user_id = %user_id,
                errors = ?state.errors,
                "Subscription state resolved with errors"
            );
        }

        Ok(state)
    }

    /// プロフィールと解決済み状態を同時に取得
    pub async fn get_profile_with_state(
        &self,
        user_id: Uuid,
    ) -> AppResult<(Profile, SubscriptionState)> {
        let profile = self.get_profile(user_id).await?;
        let state = SubscriptionState::resolve(Some(&profile.subscription_data()), Utc::now());
        Ok((profile, state))
    }

    /// 公開プラン一覧
    pub fn plans(&self) -> &'static [PlanDefinition] {
        PlanDefinition::all()
    }
}
