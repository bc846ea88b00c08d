// migration/src/lib.rs
pub use sea_orm_migration::prelude::*;

mod m20250801_000001_create_profiles_table;
mod m20250801_000002_create_usage_records_table;
mod m20250801_000003_create_promo_codes_table;
mod m20250801_000004_create_promo_redemptions_table;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250801_000001_create_profiles_table::Migration),
            // プロフィールに依存するテーブル
            Box::new(m20250801_000002_create_usage_records_table::Migration),
            Box::new(m20250801_000003_create_promo_codes_table::Migration),
            Box::new(m20250801_000004_create_promo_redemptions_table::Migration),
        ]
    }
}
