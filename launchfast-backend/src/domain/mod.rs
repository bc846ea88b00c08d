// src/domain/mod.rs
pub mod plan;
pub mod product_scoring;
pub mod profile_model;
pub mod promo_code_model;
pub mod promo_redemption_model;
pub mod subscription_state;
pub mod subscription_tier;
pub mod usage;
pub mod usage_record_model;
