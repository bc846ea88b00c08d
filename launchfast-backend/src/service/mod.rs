// src/service/mod.rs
pub mod payment_service;
pub mod promo_code_service;
pub mod subscription_service;
pub mod trial_reminder_service;
pub mod usage_service;
