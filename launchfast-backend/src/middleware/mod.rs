// launchfast-backend/src/middleware/mod.rs

pub mod auth;
pub mod subscription_guard;
