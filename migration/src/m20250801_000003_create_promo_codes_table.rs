use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(PromoCodes::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PromoCodes::Code)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(PromoCodes::Tier).string_len(32).not_null())
                    .col(ColumnDef::new(PromoCodes::DurationDays).integer().null())
                    .col(ColumnDef::new(PromoCodes::MaxRedemptions).integer().null())
                    .col(
                        ColumnDef::new(PromoCodes::RedemptionCount)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(PromoCodes::ExpiresAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(PromoCodes::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(PromoCodes::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(PromoCodes::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub(crate) enum PromoCodes {
    Table,
    Code,
    Tier,
    DurationDays,
    MaxRedemptions,
    RedemptionCount,
    ExpiresAt,
    IsActive,
    CreatedAt,
}
