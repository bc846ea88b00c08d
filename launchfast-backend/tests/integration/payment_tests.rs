use crate::common::app_helper::setup_app;
use crate::common::auth_helper::access_token_for;
use crate::common::request::{create_request, read_json};
use crate::common::test_data::{create_expired_profile, create_profile, create_pro_profile};
use axum::http::StatusCode;
use chrono::{Duration, Utc};
use serde_json::json;
use tower::ServiceExt;

#[tokio::test]
async fn test_checkout_returns_mock_url_in_development() {
    let app = setup_app().await;
    let profile = create_expired_profile(&app.db.connection).await;
    let token = access_token_for(profile.id, &profile.email);

    let response = app
        .router
        .clone()
        .oneshot(create_request("POST", "/payments/checkout", &token, &json!({})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = read_json(response).await;
    let url = body["data"]["checkout_url"].as_str().unwrap();
    assert!(url.contains("/mock-checkout"));
    assert!(url.contains(&profile.id.to_string()));
}

#[tokio::test]
async fn test_checkout_conflicts_for_active_subscriber() {
    let app = setup_app().await;
    let profile = create_pro_profile(&app.db.connection).await;
    let token = access_token_for(profile.id, &profile.email);

    let response = app
        .router
        .clone()
        .oneshot(create_request("POST", "/payments/checkout", &token, &json!({})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_portal_requires_stripe_customer() {
    let app = setup_app().await;
    let without_customer = create_profile(
        &app.db.connection,
        "pro",
        Some("active"),
        None,
        Some(Utc::now() + Duration::days(10)),
    )
    .await;
    let with_customer = create_pro_profile(&app.db.connection).await;

    let response = app
        .router
        .clone()
        .oneshot(create_request(
            "POST",
            "/payments/portal",
            &access_token_for(without_customer.id, &without_customer.email),
            &json!({}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app
        .router
        .clone()
        .oneshot(create_request(
            "POST",
            "/payments/portal",
            &access_token_for(with_customer.id, &with_customer.email),
            &json!({}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = read_json(response).await;
    assert!(body["data"]["portal_url"]
        .as_str()
        .unwrap()
        .contains("/mock-portal"));
}
