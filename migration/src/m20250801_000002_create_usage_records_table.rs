use super::m20250801_000001_create_profiles_table::Profiles;
use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(UsageRecords::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(UsageRecords::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(UsageRecords::UserId).uuid().not_null())
                    .col(ColumnDef::new(UsageRecords::Month).string_len(7).not_null())
                    .col(
                        ColumnDef::new(UsageRecords::Searches)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(UsageRecords::CsvExports)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(UsageRecords::ApiCalls)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(UsageRecords::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(UsageRecords::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_usage_records_user_id")
                            .from(UsageRecords::Table, UsageRecords::UserId)
                            .to(Profiles::Table, Profiles::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // 加算処理の ON CONFLICT 対象（ユーザー×月で1行）
        manager
            .create_index(
                Index::create()
                    .table(UsageRecords::Table)
                    .name("uq_usage_records_user_month")
                    .col(UsageRecords::UserId)
                    .col(UsageRecords::Month)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .table(UsageRecords::Table)
                    .name("uq_usage_records_user_month")
                    .to_owned(),
            )
            .await?;

        manager
            .drop_table(Table::drop().table(UsageRecords::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum UsageRecords {
    Table,
    Id,
    UserId,
    Month,
    Searches,
    CsvExports,
    ApiCalls,
    CreatedAt,
    UpdatedAt,
}
