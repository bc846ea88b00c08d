// launchfast-backend/src/domain/profile_model.rs

use super::subscription_state::SubscriptionData;
use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// ユーザープロフィール（認証プロバイダのユーザーIDを主キーとする）
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "profiles")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    #[sea_orm(unique)]
    pub email: String,

    #[sea_orm(nullable)]
    pub full_name: Option<String>,

    pub subscription_tier: String,

    #[sea_orm(nullable)]
    pub subscription_status: Option<String>,

    #[sea_orm(unique, nullable)]
    pub stripe_customer_id: Option<String>,

    #[sea_orm(nullable)]
    pub stripe_subscription_id: Option<String>,

    pub current_period_end: Option<DateTime<Utc>>,

    pub cancel_at_period_end: bool,

    pub trial_reminder_sent_at: Option<DateTime<Utc>>,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::usage_record_model::Entity")]
    UsageRecords,
}

impl Related<super::usage_record_model::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::UsageRecords.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// 状態解決器への入力に変換
    pub fn subscription_data(&self) -> SubscriptionData {
        SubscriptionData {
            subscription_tier: Some(self.subscription_tier.clone()),
            subscription_status: self.subscription_status.clone(),
            stripe_customer_id: self.stripe_customer_id.clone(),
            stripe_subscription_id: self.stripe_subscription_id.clone(),
            current_period_end: self.current_period_end.map(|d| d.to_rfc3339()),
            cancel_at_period_end: self.cancel_at_period_end,
        }
    }

    /// メール表示用の名前
    pub fn display_name(&self) -> &str {
        self.full_name
            .as_deref()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or(&self.email)
    }
}
