// launchfast-backend/src/middleware/auth.rs

use crate::config::AppConfig;
use crate::error::AppError;
use crate::logging::RequestContext;
use crate::utils::jwt::JwtManager;
use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderMap, HeaderValue, Method},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::{debug, warn};
use uuid::Uuid;

/// 認証プロバイダがブラウザに保存するアクセストークンのCookie名
pub const ACCESS_TOKEN_COOKIE: &str = "sb-access-token";

/// JWT認証ミドルウェアの設定
#[derive(Clone)]
pub struct AuthMiddlewareConfig {
    pub jwt_manager: Arc<JwtManager>,
    pub access_token_cookie_name: String,
}

impl AuthMiddlewareConfig {
    pub fn new(jwt_manager: Arc<JwtManager>) -> Self {
        Self {
            jwt_manager,
            access_token_cookie_name: ACCESS_TOKEN_COOKIE.to_string(),
        }
    }
}

/// 認証済みユーザー情報を格納するエクステンション
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user_id: Uuid,
    pub email: Option<String>,
}

impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedUser>()
            .cloned()
            .ok_or_else(|| AppError::Unauthorized("Authentication required".to_string()))
    }
}

/// JWT認証ミドルウェア
pub async fn jwt_auth_middleware(
    State(config): State<AuthMiddlewareConfig>,
    headers: HeaderMap,
    cookie_jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let path = request.uri().path().to_string();

    // トークンを抽出
    let token = extract_token(&headers, &cookie_jar, &config.access_token_cookie_name)
        .ok_or_else(|| {
            warn!(path = %path, "Missing authentication token");
            AppError::Unauthorized("Authentication required".to_string())
        })?;

    // JWTを検証
    let claims = config
        .jwt_manager
        .verify_access_token(&token)
        .map_err(|e| {
            warn!(path = %path, error = %e, "Invalid access token");
            AppError::Unauthorized("Invalid or expired token".to_string())
        })?;
    let user_id = claims
        .user_id()
        .map_err(|_| AppError::Unauthorized("Invalid token subject".to_string()))?;

    debug!(user_id = %user_id, path = %path, "Authenticated request");

    let context = request
        .extensions_mut()
        .get_mut::<RequestContext>()
        .map(|context| {
            context.user_id = Some(user_id);
            context.clone()
        });
    request.extensions_mut().insert(AuthenticatedUser {
        user_id,
        email: claims.email,
    });

    let mut response = next.run(request).await;
    // 外側のロギングミドルウェアが完了ログでユーザーIDを参照できるようにする
    if let Some(context) = context {
        response.extensions_mut().insert(context);
    }
    Ok(response)
}

/// CORS設定
pub fn cors_layer(config: &AppConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .cors_allowed_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT])
        .allow_credentials(true) // Cookie送信を許可
        .max_age(std::time::Duration::from_secs(3600))
}

/// セキュリティヘッダーミドルウェア
pub async fn security_headers_middleware(request: Request, next: Next) -> Response {
    let mut response = next.run(request).await;
    let headers = response.headers_mut();

    headers.insert(
        header::X_CONTENT_TYPE_OPTIONS,
        HeaderValue::from_static("nosniff"),
    );
    headers.insert(header::X_FRAME_OPTIONS, HeaderValue::from_static("DENY"));
    headers.insert(
        header::REFERRER_POLICY,
        HeaderValue::from_static("strict-origin-when-cross-origin"),
    );

    response
}

// --- ヘルパー関数 ---

/// リクエストからトークンを抽出（Authorizationヘッダー優先、Cookieはフォールバック）
fn extract_token(headers: &HeaderMap, cookie_jar: &CookieJar, cookie_name: &str) -> Option<String> {
    let auth_header = headers
        .get(header::AUTHORIZATION)
        .and_then(|header| header.to_str().ok())
        .and_then(|auth_str| auth_str.strip_prefix("Bearer "))
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty());

    auth_header.or_else(|| {
        cookie_jar
            .get(cookie_name)
            .map(|cookie| cookie.value().to_string())
    })
}
