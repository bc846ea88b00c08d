// src/repository/promo_code_repository.rs

use crate::domain::profile_model;
use crate::domain::promo_code_model::{
    self, ActiveModel as PromoCodeActiveModel, Entity as PromoCodeEntity, PromoRejection,
};
use crate::domain::promo_redemption_model::{
    self, ActiveModel as RedemptionActiveModel, Entity as RedemptionEntity,
};
use crate::repository::profile_repository::{BillingUpdate, ProfileRepository};
use chrono::{DateTime, Utc};
use sea_orm::entity::*;
use sea_orm::{
    DbBackend, DbConn, DbErr, FromQueryResult, QueryFilter, Set, SqlErr, Statement,
    TransactionTrait,
};
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct PromoCodeRepository {
    db: DbConn,
}

/// 引き換え処理の結果
#[derive(Debug)]
pub enum RedemptionOutcome {
    Redeemed {
        promo_code: promo_code_model::Model,
        profile: profile_model::Model,
    },
    Rejected(PromoRejection),
}

/// 付与内容を受け取って階層・期間を決めるためのコールバック結果
#[derive(Debug, Clone)]
pub struct PromoGrant {
    pub subscription_tier: String,
    pub current_period_end: Option<DateTime<Utc>>,
}

impl PromoCodeRepository {
    pub fn new(db: DbConn) -> Self {
        Self { db }
    }

    pub async fn find_by_code(&self, code: &str) -> Result<Option<promo_code_model::Model>, DbErr> {
        PromoCodeEntity::find_by_id(code.to_string())
            .one(&self.db)
            .await
    }

    pub async fn create(&self, input: CreatePromoCode) -> Result<promo_code_model::Model, DbErr> {
        let promo_code = PromoCodeActiveModel {
            code: Set(input.code),
            tier: Set(input.tier),
            duration_days: Set(input.duration_days),
            max_redemptions: Set(input.max_redemptions),
            redemption_count: Set(0),
            expires_at: Set(input.expires_at),
            is_active: Set(input.is_active),
            created_at: Set(Utc::now()),
        };

        promo_code.insert(&self.db).await
    }

    pub async fn find_redemption(
        &self,
        code: &str,
        user_id: Uuid,
    ) -> Result<Option<promo_redemption_model::Model>, DbErr> {
        RedemptionEntity::find()
            .filter(promo_redemption_model::Column::Code.eq(code))
            .filter(promo_redemption_model::Column::UserId.eq(user_id))
            .one(&self.db)
            .await
    }

    /// コードを引き換え、プロフィールに付与内容を反映する
    ///
    /// カウンタの条件付き更新・引き換え記録の挿入・プロフィール更新を1トランザクションで行う。
    /// 途中で拒否された場合はロールバックし、何も変更しない。
    pub async fn redeem<F>(
        &self,
        code: &str,
        user_id: Uuid,
        now: DateTime<Utc>,
        grant: F,
    ) -> Result<RedemptionOutcome, DbErr>
    where
        F: FnOnce(&promo_code_model::Model, DateTime<Utc>) -> PromoGrant,
    {
        let txn = self.db.begin().await?;

        let already_redeemed = RedemptionEntity::find()
            .filter(promo_redemption_model::Column::Code.eq(code))
            .filter(promo_redemption_model::Column::UserId.eq(user_id))
            .one(&txn)
            .await?
            .is_some();
        if already_redeemed {
            txn.rollback().await?;
            return Ok(RedemptionOutcome::Rejected(PromoRejection::AlreadyRedeemed));
        }

        // 有効・期限内・上限未満の場合のみカウンタを進める
        let claimed = promo_code_model::Model::find_by_statement(Statement::from_sql_and_values(
            DbBackend::Postgres,
            r#"
            UPDATE promo_codes
            SET redemption_count = redemption_count + 1
            WHERE code = $1
              AND is_active
              AND (expires_at IS NULL OR expires_at > $2)
              AND (max_redemptions IS NULL OR redemption_count < max_redemptions)
            RETURNING code, tier, duration_days, max_redemptions, redemption_count,
                      expires_at, is_active, created_at
            "#,
            [code.into(), now.into()],
        ))
        .one(&txn)
        .await?;

        let Some(promo_code) = claimed else {
            let rejection = match PromoCodeEntity::find_by_id(code.to_string()).one(&txn).await? {
                Some(existing) => existing
                    .rejection(now)
                    .unwrap_or(PromoRejection::Exhausted),
                None => PromoRejection::Unknown,
            };
            txn.rollback().await?;
            return Ok(RedemptionOutcome::Rejected(rejection));
        };

        let redemption = RedemptionActiveModel {
            id: Set(Uuid::new_v4()),
            code: Set(promo_code.code.clone()),
            user_id: Set(user_id),
            redeemed_at: Set(now),
        };
        if let Err(err) = redemption.insert(&txn).await {
            txn.rollback().await?;
            // 同一ユーザーの同時引き換えは一意制約で弾かれる
            return match err.sql_err() {
                Some(SqlErr::UniqueConstraintViolation(_)) => {
                    Ok(RedemptionOutcome::Rejected(PromoRejection::AlreadyRedeemed))
                }
                _ => Err(err),
            };
        }

        let PromoGrant {
            subscription_tier,
            current_period_end,
        } = grant(&promo_code, now);
        let profile = ProfileRepository::update_billing_with(
            &txn,
            user_id,
            BillingUpdate {
                subscription_tier: Some(subscription_tier),
                subscription_status: Some(Some("active".to_string())),
                current_period_end: Some(current_period_end),
                cancel_at_period_end: Some(false),
                ..Default::default()
            },
        )
        .await?;

        txn.commit().await?;

        Ok(RedemptionOutcome::Redeemed {
            promo_code,
            profile,
        })
    }
}

/// プロモコード作成用構造体
#[derive(Debug, Clone)]
pub struct CreatePromoCode {
    pub code: String,
    pub tier: String,
    pub duration_days: Option<i32>,
    pub max_redemptions: Option<i32>,
    pub expires_at: Option<DateTime<Utc>>,
    pub is_active: bool,
}
