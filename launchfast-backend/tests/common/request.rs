// tests/common/request.rs
use axum::{
    body::{self, Body},
    http::{header, Method, Request, Response},
};
use serde::Serialize;
use serde_json::Value;

/// 認証付きのJSONリクエストを作成
pub fn create_request<T: Serialize>(
    method: &str,
    uri: &str,
    token: &str,
    body: &T,
) -> Request<Body> {
    let method = Method::from_bytes(method.as_bytes()).unwrap();
    let body_json = serde_json::to_string(body).unwrap();

    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .body(Body::from(body_json))
        .unwrap()
}

/// 認証付きのGETリクエストを作成
pub fn get_request(uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .method(Method::GET)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap()
}

/// レスポンスボディをJSONとして読み取る
pub async fn read_json(response: Response<Body>) -> Value {
    let bytes = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
