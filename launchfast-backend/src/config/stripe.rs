use super::{env_flag, env_required, ConfigError};
use std::env;

#[derive(Clone, Debug)]
pub struct StripeConfig {
    pub secret_key: String,
    pub publishable_key: String,
    pub pro_price_id: String,
    pub webhook_secret: String,
    pub development_mode: bool,
}

impl StripeConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        if env_flag("PAYMENT_DEVELOPMENT_MODE") {
            tracing::info!("Payment development mode enabled - using mock responses");
            return Ok(Self::development());
        }

        let secret_key = env_required("STRIPE_SECRET_KEY")?;
        let publishable_key = env_required("STRIPE_PUBLISHABLE_KEY")?;
        let pro_price_id = env_required("STRIPE_PRO_PRICE_ID")?;

        // 価格IDの形式を検証
        if !pro_price_id.starts_with("price_") {
            tracing::error!(
                price_id = %pro_price_id,
                "STRIPE_PRO_PRICE_ID should be a price ID (starting with 'price_')"
            );
            return Err(ConfigError::Invalid {
                name: "STRIPE_PRO_PRICE_ID",
                value: pro_price_id,
            });
        }

        let webhook_secret = env::var("STRIPE_WEBHOOK_SECRET").unwrap_or_else(|_| {
            tracing::warn!("STRIPE_WEBHOOK_SECRET not set - webhook verification will fail");
            String::new()
        });

        Ok(Self {
            secret_key,
            publishable_key,
            pro_price_id,
            webhook_secret,
            development_mode: false,
        })
    }

    /// モック応答を返す開発用設定
    pub fn development() -> Self {
        Self {
            secret_key: String::new(),
            publishable_key: String::new(),
            pro_price_id: String::new(),
            webhook_secret: String::new(),
            development_mode: true,
        }
    }

    pub fn is_test_mode(&self) -> bool {
        self.secret_key.starts_with("sk_test_") || self.development_mode
    }
}
