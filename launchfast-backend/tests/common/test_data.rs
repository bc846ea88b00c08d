// tests/common/test_data.rs

use chrono::{DateTime, Duration, Utc};
use launchfast_backend::domain::profile_model;
use launchfast_backend::domain::promo_code_model;
use launchfast_backend::repository::profile_repository::{CreateProfile, ProfileRepository};
use launchfast_backend::repository::promo_code_repository::{CreatePromoCode, PromoCodeRepository};
use sea_orm::DatabaseConnection;
use uuid::Uuid;

pub fn unique_email(prefix: &str) -> String {
    format!("{}_{}@example.com", prefix, &Uuid::new_v4().to_string()[..8])
}

/// 任意の課金状態でプロフィールを作成
pub async fn create_profile(
    db: &DatabaseConnection,
    tier: &str,
    status: Option<&str>,
    customer_id: Option<&str>,
    current_period_end: Option<DateTime<Utc>>,
) -> profile_model::Model {
    ProfileRepository::new(db.clone())
        .create(CreateProfile {
            id: Uuid::new_v4(),
            email: unique_email("seller"),
            full_name: Some("Test Seller".to_string()),
            subscription_tier: tier.to_string(),
            subscription_status: status.map(str::to_string),
            stripe_customer_id: customer_id.map(str::to_string),
            current_period_end,
        })
        .await
        .unwrap()
}

/// 無料（期限切れ）ユーザー
pub async fn create_expired_profile(db: &DatabaseConnection) -> profile_model::Model {
    create_profile(db, "expired", None, None, None).await
}

/// 有効な Pro ユーザー
pub async fn create_pro_profile(db: &DatabaseConnection) -> profile_model::Model {
    let customer_id = format!("cus_{}", &Uuid::new_v4().simple().to_string()[..14]);
    create_profile(
        db,
        "pro",
        Some("active"),
        Some(&customer_id),
        Some(Utc::now() + Duration::days(20)),
    )
    .await
}

/// 無制限ユーザー
pub async fn create_unlimited_profile(db: &DatabaseConnection) -> profile_model::Model {
    create_profile(db, "unlimited", None, None, None).await
}

pub async fn create_promo_code(
    db: &DatabaseConnection,
    code: &str,
    tier: &str,
    duration_days: Option<i32>,
    max_redemptions: Option<i32>,
    expires_at: Option<DateTime<Utc>>,
) -> promo_code_model::Model {
    PromoCodeRepository::new(db.clone())
        .create(CreatePromoCode {
            code: code.to_string(),
            tier: tier.to_string(),
            duration_days,
            max_redemptions,
            expires_at,
            is_active: true,
        })
        .await
        .unwrap()
}
