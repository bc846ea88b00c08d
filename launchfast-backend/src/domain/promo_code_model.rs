// launchfast-backend/src/domain/promo_code_model.rs

use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "promo_codes")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub code: String,
    /// 付与する階層（エイリアス可）
    pub tier: String,
    /// None = 期限なしの付与
    pub duration_days: Option<i32>,
    pub max_redemptions: Option<i32>,
    pub redemption_count: i32,
    pub expires_at: Option<DateTime<Utc>>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::promo_redemption_model::Entity")]
    Redemptions,
}

impl Related<super::promo_redemption_model::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Redemptions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// 引き換えを拒否する理由
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PromoRejection {
    Unknown,
    Inactive,
    Expired,
    Exhausted,
    AlreadyRedeemed,
}

impl PromoRejection {
    pub fn message(&self) -> &'static str {
        match self {
            Self::Unknown => "Promo code not found",
            Self::Inactive => "Promo code is no longer active",
            Self::Expired => "Promo code has expired",
            Self::Exhausted => "Promo code has reached its redemption limit",
            Self::AlreadyRedeemed => "You have already redeemed this promo code",
        }
    }
}

impl Model {
    /// 現時点で引き換えできない理由（引き換え可能なら None）
    pub fn rejection(&self, now: DateTime<Utc>) -> Option<PromoRejection> {
        if !self.is_active {
            Some(PromoRejection::Inactive)
        } else if self.expires_at.is_some_and(|at| at <= now) {
            Some(PromoRejection::Expired)
        } else if self
            .max_redemptions
            .is_some_and(|max| self.redemption_count >= max)
        {
            Some(PromoRejection::Exhausted)
        } else {
            None
        }
    }
}
