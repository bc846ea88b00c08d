// src/api/dto/mod.rs
pub mod payment_dto;
pub mod product_dto;
pub mod promo_code_dto;
pub mod usage_dto;
