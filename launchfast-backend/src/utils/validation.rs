use once_cell::sync::Lazy;
use regex::Regex;
use validator::ValidationError;

/// プロモコード（大文字化後）
pub static PROMO_CODE_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Z0-9_-]{4,32}$").unwrap());

/// Amazon ASIN（10桁の英数字）
pub static ASIN_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Z0-9]{10}$").unwrap());

/// プロモコードの正規化（前後空白除去・大文字化）
pub fn normalize_promo_code(code: &str) -> String {
    code.trim().to_uppercase()
}

/// プロモコードバリデーション
pub fn validate_promo_code(code: &str) -> Result<(), ValidationError> {
    if PROMO_CODE_REGEX.is_match(&normalize_promo_code(code)) {
        Ok(())
    } else {
        Err(ValidationError::new("invalid_promo_code")
            .with_message("Promo code must be 4-32 letters, digits, '-' or '_'".into()))
    }
}

/// ASINバリデーション
pub fn validate_asin(asin: &str) -> Result<(), ValidationError> {
    if ASIN_REGEX.is_match(&asin.trim().to_uppercase()) {
        Ok(())
    } else {
        Err(ValidationError::new("invalid_asin").with_message("Invalid ASIN".into()))
    }
}

/// 有限値であること（NaN・無限大を拒否）
pub fn validate_finite<T: std::borrow::Borrow<f64>>(value: T) -> Result<(), ValidationError> {
    let value: &f64 = value.borrow();
    if value.is_finite() {
        Ok(())
    } else {
        Err(ValidationError::new("not_finite").with_message("Value must be a finite number".into()))
    }
}
