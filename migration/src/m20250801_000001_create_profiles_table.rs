use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // idは認証プロバイダのユーザーIDをそのまま使う
        manager
            .create_table(
                Table::create()
                    .table(Profiles::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Profiles::Id).uuid().not_null().primary_key())
                    .col(
                        ColumnDef::new(Profiles::Email)
                            .string_len(320)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Profiles::FullName).string_len(255).null())
                    .col(
                        ColumnDef::new(Profiles::SubscriptionTier)
                            .string_len(32)
                            .not_null()
                            .default("expired"),
                    )
                    .col(
                        ColumnDef::new(Profiles::SubscriptionStatus)
                            .string_len(32)
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Profiles::StripeCustomerId)
                            .string()
                            .null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Profiles::StripeSubscriptionId).string().null())
                    .col(
                        ColumnDef::new(Profiles::CurrentPeriodEnd)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Profiles::CancelAtPeriodEnd)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Profiles::TrialReminderSentAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Profiles::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Profiles::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // Webhookでのサブスクリプション検索用
        manager
            .create_index(
                Index::create()
                    .table(Profiles::Table)
                    .name("idx_profiles_stripe_subscription_id")
                    .col(Profiles::StripeSubscriptionId)
                    .to_owned(),
            )
            .await?;

        // トライアルリマインダーの対象抽出用
        manager
            .create_index(
                Index::create()
                    .table(Profiles::Table)
                    .name("idx_profiles_status_period_end")
                    .col(Profiles::SubscriptionStatus)
                    .col(Profiles::CurrentPeriodEnd)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .table(Profiles::Table)
                    .name("idx_profiles_status_period_end")
                    .to_owned(),
            )
            .await?;

        manager
            .drop_index(
                Index::drop()
                    .table(Profiles::Table)
                    .name("idx_profiles_stripe_subscription_id")
                    .to_owned(),
            )
            .await?;

        manager
            .drop_table(Table::drop().table(Profiles::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub(crate) enum Profiles {
    Table,
    Id,
    Email,
    FullName,
    SubscriptionTier,
    SubscriptionStatus,
    StripeCustomerId,
    StripeSubscriptionId,
    CurrentPeriodEnd,
    CancelAtPeriodEnd,
    TrialReminderSentAt,
    CreatedAt,
    UpdatedAt,
}
