// tests/common/auth_helper.rs

use chrono::Duration;
use launchfast_backend::utils::jwt::JwtManager;
use uuid::Uuid;

/// テスト用の共有シークレット（32文字以上）
pub const TEST_JWT_SECRET: &str = "test-supabase-jwt-secret-at-least-32-characters";

pub fn test_jwt_manager() -> JwtManager {
    JwtManager::new(TEST_JWT_SECRET).unwrap()
}

/// 認証プロバイダと同じ形式のアクセストークンを発行
pub fn access_token_for(user_id: Uuid, email: &str) -> String {
    test_jwt_manager()
        .generate_access_token(user_id, email, Duration::minutes(15))
        .unwrap()
}

/// 期限切れのアクセストークン
pub fn expired_access_token_for(user_id: Uuid, email: &str) -> String {
    test_jwt_manager()
        .generate_access_token(user_id, email, Duration::minutes(-10))
        .unwrap()
}
