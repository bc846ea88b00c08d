use super::m20250801_000001_create_profiles_table::Profiles;
use super::m20250801_000003_create_promo_codes_table::PromoCodes;
use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(PromoRedemptions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PromoRedemptions::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(PromoRedemptions::Code)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(ColumnDef::new(PromoRedemptions::UserId).uuid().not_null())
                    .col(
                        ColumnDef::new(PromoRedemptions::RedeemedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_promo_redemptions_code")
                            .from(PromoRedemptions::Table, PromoRedemptions::Code)
                            .to(PromoCodes::Table, PromoCodes::Code)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_promo_redemptions_user_id")
                            .from(PromoRedemptions::Table, PromoRedemptions::UserId)
                            .to(Profiles::Table, Profiles::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // 1ユーザー1回まで
        manager
            .create_index(
                Index::create()
                    .table(PromoRedemptions::Table)
                    .name("uq_promo_redemptions_code_user")
                    .col(PromoRedemptions::Code)
                    .col(PromoRedemptions::UserId)
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
                    .table(PromoRedemptions::Table)
                    .name("uq_promo_redemptions_code_user")
                    .to_owned(),
            )
            .await?;

        manager
            .drop_table(Table::drop().table(PromoRedemptions::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum PromoRedemptions {
    Table,
    Id,
    Code,
    UserId,
    RedeemedAt,
}
