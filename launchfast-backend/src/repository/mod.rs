// src/repository/mod.rs
pub mod profile_repository;
pub mod promo_code_repository;
pub mod usage_repository;
