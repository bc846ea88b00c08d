// tests/integration/mod.rs

pub mod payment_tests;
pub mod product_tests;
pub mod promo_code_tests;
pub mod usage_tests;
pub mod webhook_tests;
