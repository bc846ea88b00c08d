// src/repository/usage_repository.rs

use crate::domain::usage::{UsageAction, UsageCounters};
use crate::domain::usage_record_model::{self, Entity as UsageRecordEntity};
use sea_orm::entity::*;
use sea_orm::{ConnectionTrait, DbBackend, DbConn, DbErr, QueryFilter, Statement};
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct UsageRepository {
    db: DbConn,
}

impl UsageRepository {
    pub fn new(db: DbConn) -> Self {
        Self { db }
    }

    /// 指定月の利用量を取得（行が無ければ None）
    pub async fn find_for_month(
        &self,
        user_id: Uuid,
        month: &str,
    ) -> Result<Option<usage_record_model::Model>, DbErr> {
        UsageRecordEntity::find()
            .filter(usage_record_model::Column::UserId.eq(user_id))
            .filter(usage_record_model::Column::Month.eq(month))
            .one(&self.db)
            .await
    }

    /// 上限未満の場合のみカウンタを1増やす
    ///
    /// 判定と加算を1文の条件付きUPSERTで行うため、並行リクエストでも上限を超えない。
    /// 拒否された場合は何も書き込まず None を返す。`cap` が None なら無条件に加算する。
    pub async fn try_consume(
        &self,
        user_id: Uuid,
        month: &str,
        action: UsageAction,
        cap: Option<u32>,
    ) -> Result<Option<UsageCounters>, DbErr> {
        let column = action.column_name();
        let cap = cap.map(|c| i32::try_from(c).unwrap_or(i32::MAX));

        let sql = format!(
            r#"
            INSERT INTO usage_records
                (id, user_id, month, searches, csv_exports, api_calls, created_at, updated_at)
            SELECT $1, $2, $3, $4, $5, $6, NOW(), NOW()
            WHERE $7::int IS NULL OR $7::int > 0
            ON CONFLICT (user_id, month) DO UPDATE
                SET {column} = usage_records.{column} + 1,
                    updated_at = NOW()
                WHERE $7::int IS NULL OR usage_records.{column} < $7::int
            RETURNING searches, csv_exports, api_calls
            "#
        );

        let row = self
            .db
            .query_one(Statement::from_sql_and_values(
                DbBackend::Postgres,
                sql,
                [
                    Uuid::new_v4().into(),
                    user_id.into(),
                    month.into(),
                    // 新規行は対象アクションのみ1、他は0で作成する
                    i32::from(action == UsageAction::Search).into(),
                    i32::from(action == UsageAction::CsvExport).into(),
                    i32::from(action == UsageAction::ApiCall).into(),
                    cap.into(),
                ],
            ))
            .await?;

        row.map(|row| {
            let searches: i32 = row.try_get("", "searches")?;
            let csv_exports: i32 = row.try_get("", "csv_exports")?;
            let api_calls: i32 = row.try_get("", "api_calls")?;
            Ok(UsageCounters {
                searches: u32::try_from(searches).unwrap_or(0),
                csv_exports: u32::try_from(csv_exports).unwrap_or(0),
                api_calls: u32::try_from(api_calls).unwrap_or(0),
            })
        })
        .transpose()
    }
}
