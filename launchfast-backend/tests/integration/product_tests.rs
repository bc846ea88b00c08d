use crate::common::app_helper::setup_app;
use crate::common::auth_helper::access_token_for;
use crate::common::request::{create_request, read_json};
use crate::common::test_data::{create_expired_profile, create_pro_profile};
use axum::http::StatusCode;
use chrono::Utc;
use launchfast_backend::domain::usage::{UsageAction, FREE_MONTHLY_SEARCHES};
use serde_json::{json, Value};
use tower::ServiceExt;

fn score_request(asin: &str, risk: &str) -> Value {
    json!({
        "product": {
            "asin": asin,
            "title": "Silicone Kitchen Utensil Set",
            "price": 29.99,
            "bsr": 1500,
            "rating": 4.4,
            "review_count": 120,
            "category": "Home & Kitchen"
        },
        "sales": {
            "monthly_sales": 900.0,
            "monthly_revenue": 26991.0,
            "monthly_profit": 8100.0,
            "profit_margin": 0.3
        },
        "ai_analysis": {
            "risk_classification": risk,
            "consistency_rating": "consistent",
            "estimated_weight_lbs": 1.2
        },
        "keywords": [
            { "keyword": "silicone utensils", "search_volume": 24000.0, "ranking_position": 4, "cpc": 1.1 }
        ]
    })
}

#[tokio::test]
async fn test_free_user_scoring_consumes_search_quota() {
    let app = setup_app().await;
    let profile = create_expired_profile(&app.db.connection).await;
    let token = access_token_for(profile.id, &profile.email);

    let response = app
        .router
        .clone()
        .oneshot(create_request(
            "POST",
            "/products/score",
            &token,
            &score_request("B08XYZ1234", "safe"),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let decision = app
        .state
        .usage_service
        .check(profile.id, UsageAction::Search, Utc::now())
        .await
        .unwrap();
    assert_eq!(decision.current, 1);
}

#[tokio::test]
async fn test_scoring_is_denied_once_quota_is_used() {
    let app = setup_app().await;
    let profile = create_expired_profile(&app.db.connection).await;
    let token = access_token_for(profile.id, &profile.email);
    let now = Utc::now();

    for _ in 0..FREE_MONTHLY_SEARCHES {
        app.state
            .usage_service
            .consume(profile.id, UsageAction::Search, now)
            .await
            .unwrap();
    }

    let response = app
        .router
        .clone()
        .oneshot(create_request(
            "POST",
            "/products/score",
            &token,
            &score_request("B08XYZ1234", "safe"),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let body = read_json(response).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["data"]["action"], "search");
    assert_eq!(body["data"]["allowed"], false);
    assert_eq!(body["data"]["current"], FREE_MONTHLY_SEARCHES);

    let decision = app
        .state
        .usage_service
        .check(profile.id, UsageAction::Search, now)
        .await
        .unwrap();
    assert_eq!(decision.current, FREE_MONTHLY_SEARCHES);
}

#[tokio::test]
async fn test_pro_user_can_score_product() {
    let app = setup_app().await;
    let profile = create_pro_profile(&app.db.connection).await;
    let token = access_token_for(profile.id, &profile.email);

    let response = app
        .router
        .clone()
        .oneshot(create_request(
            "POST",
            "/products/score",
            &token,
            &score_request("b08xyz1234", "safe"),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = read_json(response).await;
    let score = body["data"]["score"].as_f64().unwrap();
    assert!((0.0..=100.0).contains(&score));
    assert!(body["data"]["grade"].as_str().unwrap().len() >= 2);
    assert!(body["data"]["breakdown"]["profit"].is_number());
}

#[tokio::test]
async fn test_banned_product_gets_worst_grade() {
    let app = setup_app().await;
    let profile = create_pro_profile(&app.db.connection).await;
    let token = access_token_for(profile.id, &profile.email);

    let response = app
        .router
        .clone()
        .oneshot(create_request(
            "POST",
            "/products/score",
            &token,
            &score_request("B08XYZ1234", "banned"),
        ))
        .await
        .unwrap();
    let body = read_json(response).await;

    assert_eq!(body["data"]["grade"], "F1");
    assert_eq!(body["data"]["badge"], "red");
    assert_eq!(body["data"]["score"], 0.0);
}

#[tokio::test]
async fn test_invalid_asin_is_rejected() {
    let app = setup_app().await;
    let profile = create_pro_profile(&app.db.connection).await;
    let token = access_token_for(profile.id, &profile.email);

    let response = app
        .router
        .clone()
        .oneshot(create_request(
            "POST",
            "/products/score",
            &token,
            &score_request("NOT-AN-ASIN", "safe"),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // 入力エラーでは検索枠を消費しない
    let decision = app
        .state
        .usage_service
        .check(profile.id, UsageAction::Search, Utc::now())
        .await
        .unwrap();
    assert_eq!(decision.current, 0);
}
