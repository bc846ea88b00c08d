// src/repository/profile_repository.rs

use crate::domain::profile_model::{self, ActiveModel as ProfileActiveModel, Entity as ProfileEntity};
use chrono::{DateTime, Utc};
use sea_orm::entity::*;
use sea_orm::{ConnectionTrait, DbConn, DbErr, QueryFilter, QueryOrder, Set};
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct ProfileRepository {
    db: DbConn,
}

impl ProfileRepository {
    pub fn new(db: DbConn) -> Self {
        Self { db }
    }

    // --- 検索 ---

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<profile_model::Model>, DbErr> {
        ProfileEntity::find_by_id(id).one(&self.db).await
    }

    pub async fn find_by_stripe_customer_id(
        &self,
        stripe_customer_id: &str,
    ) -> Result<Option<profile_model::Model>, DbErr> {
        ProfileEntity::find()
            .filter(profile_model::Column::StripeCustomerId.eq(stripe_customer_id))
            .one(&self.db)
            .await
    }

    pub async fn find_by_stripe_subscription_id(
        &self,
        stripe_subscription_id: &str,
    ) -> Result<Option<profile_model::Model>, DbErr> {
        ProfileEntity::find()
            .filter(profile_model::Column::StripeSubscriptionId.eq(stripe_subscription_id))
            .one(&self.db)
            .await
    }

    /// トライアル終了リマインダーの送信対象
    ///
    /// status が trialing、期間終了が `now` より後かつ `until` 以前、未送信のプロフィール。
    pub async fn find_trial_reminder_candidates(
        &self,
        now: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> Result<Vec<profile_model::Model>, DbErr> {
        ProfileEntity::find()
            .filter(profile_model::Column::SubscriptionStatus.eq("trialing"))
            .filter(profile_model::Column::CurrentPeriodEnd.gt(now))
            .filter(profile_model::Column::CurrentPeriodEnd.lte(until))
            .filter(profile_model::Column::TrialReminderSentAt.is_null())
            .order_by_asc(profile_model::Column::CurrentPeriodEnd)
            .all(&self.db)
            .await
    }

    // --- 作成・更新 ---

    pub async fn create(&self, input: CreateProfile) -> Result<profile_model::Model, DbErr> {
        let now = Utc::now();
        let profile = ProfileActiveModel {
            id: Set(input.id),
            email: Set(input.email),
            full_name: Set(input.full_name),
            subscription_tier: Set(input.subscription_tier),
            subscription_status: Set(input.subscription_status),
            stripe_customer_id: Set(input.stripe_customer_id),
            stripe_subscription_id: Set(None),
            current_period_end: Set(input.current_period_end),
            cancel_at_period_end: Set(false),
            trial_reminder_sent_at: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        };

        profile.insert(&self.db).await
    }

    /// 課金関連フィールドを部分更新
    pub async fn update_billing(
        &self,
        id: Uuid,
        update: BillingUpdate,
    ) -> Result<profile_model::Model, DbErr> {
        Self::update_billing_with(&self.db, id, update).await
    }

    /// 任意のコネクション（トランザクション含む）で課金関連フィールドを部分更新
    pub async fn update_billing_with<C: ConnectionTrait>(
        conn: &C,
        id: Uuid,
        update: BillingUpdate,
    ) -> Result<profile_model::Model, DbErr> {
        let profile = ProfileEntity::find_by_id(id)
            .one(conn)
            .await?
            .ok_or(DbErr::RecordNotFound("Profile not found".to_string()))?;

        let mut active_model: ProfileActiveModel = profile.into();

        if let Some(tier) = update.subscription_tier {
            active_model.subscription_tier = Set(tier);
        }
        if let Some(status) = update.subscription_status {
            active_model.subscription_status = Set(status);
        }
        if let Some(customer_id) = update.stripe_customer_id {
            active_model.stripe_customer_id = Set(Some(customer_id));
        }
        if let Some(subscription_id) = update.stripe_subscription_id {
            active_model.stripe_subscription_id = Set(subscription_id);
        }
        if let Some(period_end) = update.current_period_end {
            active_model.current_period_end = Set(period_end);
        }
        if let Some(cancel) = update.cancel_at_period_end {
            active_model.cancel_at_period_end = Set(cancel);
        }
        if let Some(sent_at) = update.trial_reminder_sent_at {
            active_model.trial_reminder_sent_at = Set(sent_at);
        }

        active_model.updated_at = Set(Utc::now());
        active_model.update(conn).await
    }

    /// リマインダー送信済みを記録
    pub async fn mark_trial_reminder_sent(
        &self,
        id: Uuid,
        at: DateTime<Utc>,
    ) -> Result<profile_model::Model, DbErr> {
        self.update_billing(
            id,
            BillingUpdate {
                trial_reminder_sent_at: Some(Some(at)),
                ..Default::default()
            },
        )
        .await
    }
}

/// プロフィール作成用構造体
#[derive(Debug, Clone)]
pub struct CreateProfile {
    pub id: Uuid,
    pub email: String,
    pub full_name: Option<String>,
    pub subscription_tier: String,
    pub subscription_status: Option<String>,
    pub stripe_customer_id: Option<String>,
    pub current_period_end: Option<DateTime<Utc>>,
}

/// 課金フィールドの部分更新（None は変更なし、`Some(None)` はNULLに更新）
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BillingUpdate {
    pub subscription_tier: Option<String>,
    pub subscription_status: Option<Option<String>>,
    pub stripe_customer_id: Option<String>,
    pub stripe_subscription_id: Option<Option<String>>,
    pub current_period_end: Option<Option<DateTime<Utc>>>,
    pub cancel_at_period_end: Option<bool>,
    pub trial_reminder_sent_at: Option<Option<DateTime<Utc>>>,
}
