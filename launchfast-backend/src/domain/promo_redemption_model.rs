// launchfast-backend/src/domain/promo_redemption_model.rs

use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "promo_redemptions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub code: String,
    pub user_id: Uuid,
    pub redeemed_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::promo_code_model::Entity",
        from = "Column::Code",
        to = "super::promo_code_model::Column::Code"
    )]
    PromoCode,
    #[sea_orm(
        belongs_to = "super::profile_model::Entity",
        from = "Column::UserId",
        to = "super::profile_model::Column::Id"
    )]
    Profile,
}

impl Related<super::promo_code_model::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PromoCode.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
