// launchfast-backend/src/api/dto/usage_dto.rs

use crate::domain::usage::UsageAction;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// 利用量加算リクエスト
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ConsumeUsageRequest {
    pub action: UsageAction,
}
