// src/api/handlers/mod.rs
pub mod payment_handler;
pub mod product_handler;
pub mod promo_code_handler;
pub mod subscription_handler;
pub mod system_handler;
pub mod usage_handler;
