// src/utils/jwt.rs

//! 認証プロバイダ（Supabase）が発行したアクセストークンの検証
//!
//! トークンは HS256 で署名され、`aud` は "authenticated"、`sub` はプロフィールIDとなる。

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

pub const SUPABASE_AUDIENCE: &str = "authenticated";

/// JWT関連のエラー
#[derive(Error, Debug)]
pub enum JwtError {
    #[error("Failed to encode JWT: {0}")]
    EncodingError(#[from] jsonwebtoken::errors::Error),

    #[error("Failed to decode JWT: {0}")]
    DecodingError(String),

    #[error("JWT token has expired")]
    TokenExpired,

    #[error("Invalid JWT token")]
    InvalidToken,

    #[error("Invalid JWT configuration: {0}")]
    ConfigurationError(String),
}

/// アクセストークンのClaims
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AccessTokenClaims {
    /// Subject (profile ID)
    pub sub: String,
    pub aud: String,
    pub exp: i64,
    #[serde(default)]
    pub iat: i64,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
}

impl AccessTokenClaims {
    pub fn user_id(&self) -> Result<Uuid, JwtError> {
        Uuid::parse_str(&self.sub).map_err(|_| JwtError::InvalidToken)
    }
}

/// JWTトークン管理
pub struct JwtManager {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl JwtManager {
    pub fn new(secret: &str) -> Result<Self, JwtError> {
        if secret.len() < 32 {
            return Err(JwtError::ConfigurationError(
                "JWT secret must be at least 32 characters".to_string(),
            ));
        }

        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_audience(&[SUPABASE_AUDIENCE]);
        validation.validate_exp = true;

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        })
    }

    /// アクセストークンを検証・デコード
    pub fn verify_access_token(&self, token: &str) -> Result<AccessTokenClaims, JwtError> {
        let token_data = decode::<AccessTokenClaims>(token, &self.decoding_key, &self.validation)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => JwtError::TokenExpired,
                _ => JwtError::DecodingError(e.to_string()),
            })?;

        // sub がUUIDであること
        token_data.claims.user_id()?;
        Ok(token_data.claims)
    }

    /// 同じ形式のトークンを発行する（テストやローカル開発用）
    pub fn generate_access_token(
        &self,
        user_id: Uuid,
        email: &str,
        ttl: Duration,
    ) -> Result<String, JwtError> {
        let now = Utc::now();
        let claims = AccessTokenClaims {
            sub: user_id.to_string(),
            aud: SUPABASE_AUDIENCE.to_string(),
            exp: (now + ttl).timestamp(),
            iat: now.timestamp(),
            email: Some(email.to_string()),
            role: Some(SUPABASE_AUDIENCE.to_string()),
        };

        encode(&Header::default(), &claims, &self.encoding_key).map_err(JwtError::EncodingError)
    }
}
