use crate::common::app_helper::{setup_app, setup_app_with_webhook_verification, TestApp};
use crate::common::stripe_helper::{
    create_payment_failed_payload, create_subscription_deleted_payload,
    create_subscription_updated_payload, generate_test_webhook_signature,
};
use crate::common::test_data::{create_pro_profile, create_profile, create_unlimited_profile};
use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use chrono::{Duration, Utc};
use launchfast_backend::domain::subscription_state::SubscriptionState;
use launchfast_backend::repository::profile_repository::{BillingUpdate, ProfileRepository};
use tower::ServiceExt;

fn webhook_request(payload: &str, signature: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/webhooks/stripe")
        .header("content-type", "application/json");
    if let Some(signature) = signature {
        builder = builder.header("stripe-signature", signature);
    }
    builder.body(Body::from(payload.to_string())).unwrap()
}

async fn send_signed(app: &TestApp, payload: &str) -> StatusCode {
    let signature = generate_test_webhook_signature(payload);
    app.router
        .clone()
        .oneshot(webhook_request(payload, Some(&signature)))
        .await
        .unwrap()
        .status()
}

#[tokio::test]
async fn test_subscription_updated_syncs_profile() {
    let app = setup_app_with_webhook_verification().await;
    let profile = create_pro_profile(&app.db.connection).await;
    let customer_id = profile.stripe_customer_id.clone().unwrap();
    let period_end = (Utc::now() + Duration::days(30)).timestamp();

    let payload =
        create_subscription_updated_payload("sub_sync_1", &customer_id, "past_due", period_end, true);
    assert_eq!(send_signed(&app, &payload).await, StatusCode::OK);

    let updated = ProfileRepository::new(app.db.conn())
        .find_by_id(profile.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(updated.subscription_tier, "pro");
    assert_eq!(updated.subscription_status.as_deref(), Some("past_due"));
    assert_eq!(updated.stripe_subscription_id.as_deref(), Some("sub_sync_1"));
    assert!(updated.cancel_at_period_end);
    assert_eq!(
        updated.current_period_end.map(|end| end.timestamp()),
        Some(period_end)
    );

    // past_due は機能にアクセスできない
    let state = app
        .state
        .subscription_service
        .get_state(profile.id)
        .await
        .unwrap();
    assert!(!state.can_access_features);
}

#[tokio::test]
async fn test_subscription_deleted_revokes_access() {
    let app = setup_app_with_webhook_verification().await;
    let profile = create_pro_profile(&app.db.connection).await;
    let customer_id = profile.stripe_customer_id.clone().unwrap();

    let payload = create_subscription_deleted_payload("sub_deleted_1", &customer_id);
    assert_eq!(send_signed(&app, &payload).await, StatusCode::OK);

    let updated = ProfileRepository::new(app.db.conn())
        .find_by_id(profile.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(updated.subscription_tier, "expired");
    assert_eq!(updated.subscription_status.as_deref(), Some("canceled"));
}

#[tokio::test]
async fn test_subscription_deleted_keeps_unlimited_tier() {
    let app = setup_app_with_webhook_verification().await;
    let profile = create_unlimited_profile(&app.db.connection).await;
    ProfileRepository::new(app.db.conn())
        .update_billing(
            profile.id,
            BillingUpdate {
                stripe_customer_id: Some("cus_unlimited_1".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let payload = create_subscription_deleted_payload("sub_old", "cus_unlimited_1");
    assert_eq!(send_signed(&app, &payload).await, StatusCode::OK);

    let state = app
        .state
        .subscription_service
        .get_state(profile.id)
        .await
        .unwrap();
    assert!(state.has_unlimited_access);
    assert!(state.can_access_features);
}

#[tokio::test]
async fn test_subscription_deleted_keeps_timed_unlimited_expiry() {
    let app = setup_app_with_webhook_verification().await;
    let grant_end = Utc::now() + Duration::days(3);
    let profile = create_profile(
        &app.db.connection,
        "unlimited",
        Some("active"),
        Some("cus_timed_unlimited"),
        Some(grant_end),
    )
    .await;

    let payload = create_subscription_deleted_payload("sub_prior", "cus_timed_unlimited");
    assert_eq!(send_signed(&app, &payload).await, StatusCode::OK);

    let updated = ProfileRepository::new(app.db.conn())
        .find_by_id(profile.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(updated.subscription_status.as_deref(), Some("active"));
    assert_eq!(updated.current_period_end, profile.current_period_end);
    assert_eq!(updated.stripe_subscription_id.as_deref(), Some("sub_prior"));

    // 付与期間が過ぎればアクセスは失われる
    let lapsed = SubscriptionState::resolve(
        Some(&updated.subscription_data()),
        grant_end + Duration::days(1),
    );
    assert!(!lapsed.can_access_features);
    assert!(!lapsed.has_unlimited_access);
}

#[tokio::test]
async fn test_invalid_signature_is_rejected() {
    let app = setup_app_with_webhook_verification().await;
    let profile = create_pro_profile(&app.db.connection).await;
    let customer_id = profile.stripe_customer_id.clone().unwrap();

    let payload = create_subscription_deleted_payload("sub_forged", &customer_id);
    let forged = format!("t={},v1={}", Utc::now().timestamp(), "0".repeat(64));

    let response = app
        .router
        .clone()
        .oneshot(webhook_request(&payload, Some(&forged)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .router
        .clone()
        .oneshot(webhook_request(&payload, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // 検証に失敗したイベントは反映されない
    let unchanged = ProfileRepository::new(app.db.conn())
        .find_by_id(profile.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(unchanged.subscription_tier, "pro");
}

#[tokio::test]
async fn test_payment_failed_sends_email() {
    let app = setup_app_with_webhook_verification().await;
    let profile = create_pro_profile(&app.db.connection).await;
    let customer_id = profile.stripe_customer_id.clone().unwrap();

    let payload = create_payment_failed_payload("in_failed_1", &customer_id, "sub_1");
    assert_eq!(send_signed(&app, &payload).await, StatusCode::OK);

    let emails = app.mailer.sent_to(&profile.email);
    assert_eq!(emails.len(), 1);
    assert_eq!(emails[0].subject, "Action required: payment failed");
}

#[tokio::test]
async fn test_development_mode_accepts_unsigned_events() {
    let app = setup_app().await;
    let profile = create_pro_profile(&app.db.connection).await;
    let customer_id = profile.stripe_customer_id.clone().unwrap();

    let payload = create_subscription_deleted_payload("sub_dev", &customer_id);
    let response = app
        .router
        .clone()
        .oneshot(webhook_request(&payload, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}
