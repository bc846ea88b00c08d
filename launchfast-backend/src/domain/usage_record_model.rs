// launchfast-backend/src/domain/usage_record_model.rs

use super::usage::UsageCounters;
use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// ユーザー×暦月ごとの利用量（履歴として削除しない）
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "usage_records")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub user_id: Uuid,
    /// "YYYY-MM"
    pub month: String,
    pub searches: i32,
    pub csv_exports: i32,
    pub api_calls: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::profile_model::Entity",
        from = "Column::UserId",
        to = "super::profile_model::Column::Id"
    )]
    Profile,
}

impl Related<super::profile_model::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Profile.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn counters(&self) -> UsageCounters {
        UsageCounters {
            searches: self.searches.max(0) as u32,
            csv_exports: self.csv_exports.max(0) as u32,
            api_calls: self.api_calls.max(0) as u32,
        }
    }
}
