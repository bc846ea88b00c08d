// launchfast-backend/src/logging/mod.rs

use axum::{
    body::Body,
    http::{HeaderName, HeaderValue, Request},
    middleware::Next,
    response::Response,
};
use std::time::Instant;
use uuid::Uuid;

/// リクエストIDを受け渡すヘッダー
pub static REQUEST_ID_HEADER: HeaderName = HeaderName::from_static("x-request-id");

#[macro_export]
macro_rules! log_with_context {
    ($level:expr, $msg:expr $(, $($key:expr => $value:expr),* $(,)?)?) => {
        match $level {
            tracing::Level::ERROR => {
                tracing::error!(
                    message = $msg
                    $(, $($key = ?$value,)*)?
                );
            }
            tracing::Level::WARN => {
                tracing::warn!(
                    message = $msg
                    $(, $($key = ?$value,)*)?
                );
            }
            tracing::Level::INFO => {
                tracing::info!(
                    message = $msg
                    $(, $($key = ?$value,)*)?
                );
            }
            tracing::Level::DEBUG => {
                tracing::debug!(
                    message = $msg
                    $(, $($key = ?$value,)*)?
                );
            }
            _ => {}
        }
    };
}

// リクエストコンテキスト
#[derive(Clone, Debug)]
pub struct RequestContext {
    pub request_id: String,
    pub user_id: Option<Uuid>,
    pub path: String,
    pub method: String,
}

// ロギングミドルウェア
pub async fn logging_middleware(req: Request<Body>, next: Next) -> Response {
    let start = Instant::now();

    // RequestContextを取得
    let context = req.extensions().get::<RequestContext>().cloned();

    if let Some(context) = &context {
        log_with_context!(
            tracing::Level::INFO,
            "Request started",
            "request_id" => &context.request_id,
            "method" => &context.method,
            "path" => &context.path,
            "user_id" => context.user_id,
        );
    }

    let response = next.run(req).await;
    let duration = start.elapsed();
    let status = response.status().as_u16();

    // 認証後のコンテキスト（ユーザーID設定済み）はレスポンス側に載っている
    let context = response
        .extensions()
        .get::<RequestContext>()
        .cloned()
        .or(context);

    if let Some(context) = &context {
        log_with_context!(
            if status >= 500 { tracing::Level::ERROR }
            else if status >= 400 { tracing::Level::WARN }
            else { tracing::Level::INFO },
            "Request completed",
            "request_id" => &context.request_id,
            "method" => &context.method,
            "path" => &context.path,
            "status" => status,
            "duration_ms" => duration.as_millis(),
            "user_id" => context.user_id,
        );
    }

    response
}

// RequestContextを生成するミドルウェア
pub async fn inject_request_context(mut req: Request<Body>, next: Next) -> Response {
    // 上流のプロキシが付与したIDがあれば引き継ぐ
    let request_id = req
        .headers()
        .get(&REQUEST_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.is_empty() && value.len() <= 128)
        .map_or_else(|| Uuid::new_v4().to_string(), str::to_string);
    let path = req.uri().path().to_string();
    let method = req.method().to_string();

    // 後でユーザーIDを設定できるようにNoneで初期化
    let context = RequestContext {
        request_id: request_id.clone(),
        user_id: None,
        path,
        method,
    };

    req.extensions_mut().insert(context);
    let mut response = next.run(req).await;

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER.clone(), value);
    }
    response
}
