// launchfast-backend/src/api/dto/promo_code_dto.rs

use crate::utils::validation::validate_promo_code;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// プロモコード引き換えリクエスト
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RedeemPromoCodeRequest {
    #[validate(custom(function = "validate_promo_code"))]
    pub code: String,
}
