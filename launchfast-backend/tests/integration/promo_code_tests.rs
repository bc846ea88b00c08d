use crate::common::app_helper::setup_app;
use crate::common::auth_helper::access_token_for;
use crate::common::request::{create_request, read_json};
use crate::common::test_data::{
    create_expired_profile, create_pro_profile, create_profile, create_promo_code,
    create_unlimited_profile,
};
use axum::http::StatusCode;
use chrono::{Duration, Utc};
use launchfast_backend::domain::subscription_state::SubscriptionState;
use launchfast_backend::repository::profile_repository::{BillingUpdate, ProfileRepository};
use launchfast_backend::repository::promo_code_repository::PromoCodeRepository;
use serde_json::json;
use tower::ServiceExt;

#[tokio::test]
async fn test_redeem_promo_code_grants_access() {
    let app = setup_app().await;
    let profile = create_expired_profile(&app.db.connection).await;
    create_promo_code(&app.db.connection, "LAUNCH30", "pro", Some(30), Some(5), None).await;
    let token = access_token_for(profile.id, &profile.email);

    let response = app
        .router
        .clone()
        .oneshot(create_request(
            "POST",
            "/promo-codes/redeem",
            &token,
            &json!({ "code": " launch30 " }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = read_json(response).await;
    assert_eq!(body["message"], "Promo code applied");
    assert_eq!(body["data"]["tier"], "pro");
    assert_eq!(body["data"]["can_access_features"], true);

    let promo = PromoCodeRepository::new(app.db.conn())
        .find_by_code("LAUNCH30")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(promo.redemption_count, 1);

    let emails = app.mailer.sent_to(&profile.email);
    assert_eq!(emails.len(), 1);
    assert!(emails[0].subject.contains("Promo code applied"));
}

#[tokio::test]
async fn test_redeem_twice_is_conflict() {
    let app = setup_app().await;
    let profile = create_expired_profile(&app.db.connection).await;
    create_promo_code(&app.db.connection, "TWICE", "pro", Some(7), None, None).await;
    let token = access_token_for(profile.id, &profile.email);

    let first = app
        .router
        .clone()
        .oneshot(create_request(
            "POST",
            "/promo-codes/redeem",
            &token,
            &json!({ "code": "TWICE" }),
        ))
        .await
        .unwrap();
    assert_eq!(first.status(), StatusCode::OK);

    let second = app
        .router
        .clone()
        .oneshot(create_request(
            "POST",
            "/promo-codes/redeem",
            &token,
            &json!({ "code": "TWICE" }),
        ))
        .await
        .unwrap();
    assert_eq!(second.status(), StatusCode::CONFLICT);

    let repo = PromoCodeRepository::new(app.db.conn());
    let promo = repo.find_by_code("TWICE").await.unwrap().unwrap();
    assert_eq!(promo.redemption_count, 1);
    assert!(repo
        .find_redemption("TWICE", profile.id)
        .await
        .unwrap()
        .is_some());
}

#[tokio::test]
async fn test_exhausted_and_expired_codes_are_rejected() {
    let app = setup_app().await;
    let first = create_expired_profile(&app.db.connection).await;
    let second = create_expired_profile(&app.db.connection).await;
    create_promo_code(&app.db.connection, "ONEUSE", "pro", Some(30), Some(1), None).await;
    create_promo_code(
        &app.db.connection,
        "OLDCODE",
        "pro",
        Some(30),
        None,
        Some(Utc::now() - Duration::days(1)),
    )
    .await;
    let now = Utc::now();

    app.state
        .promo_code_service
        .redeem(first.id, "ONEUSE", now)
        .await
        .unwrap();

    let exhausted = app
        .state
        .promo_code_service
        .redeem(second.id, "ONEUSE", now)
        .await
        .unwrap_err();
    assert_eq!(exhausted.status_code(), StatusCode::BAD_REQUEST);

    let expired = app
        .state
        .promo_code_service
        .redeem(second.id, "OLDCODE", now)
        .await
        .unwrap_err();
    assert_eq!(expired.status_code(), StatusCode::BAD_REQUEST);

    // 拒否されたユーザーの階層は変わらない
    let state = app
        .state
        .subscription_service
        .get_state(second.id)
        .await
        .unwrap();
    assert!(!state.can_access_features);
}

#[tokio::test]
async fn test_unknown_and_malformed_codes() {
    let app = setup_app().await;
    let profile = create_expired_profile(&app.db.connection).await;
    let token = access_token_for(profile.id, &profile.email);

    let unknown = app
        .router
        .clone()
        .oneshot(create_request(
            "POST",
            "/promo-codes/redeem",
            &token,
            &json!({ "code": "NOSUCHCODE" }),
        ))
        .await
        .unwrap();
    assert_eq!(unknown.status(), StatusCode::NOT_FOUND);

    let malformed = app
        .router
        .clone()
        .oneshot(create_request(
            "POST",
            "/promo-codes/redeem",
            &token,
            &json!({ "code": "no spaces!" }),
        ))
        .await
        .unwrap();
    assert_eq!(malformed.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_unlimited_user_is_not_downgraded() {
    let app = setup_app().await;
    let profile = create_unlimited_profile(&app.db.connection).await;
    create_promo_code(&app.db.connection, "PROMONTH", "pro", Some(30), None, None).await;

    let err = app
        .state
        .promo_code_service
        .redeem(profile.id, "PROMONTH", Utc::now())
        .await
        .unwrap_err();
    assert_eq!(err.status_code(), StatusCode::CONFLICT);

    let state = app
        .state
        .subscription_service
        .get_state(profile.id)
        .await
        .unwrap();
    assert!(state.has_unlimited_access);

    let promo = PromoCodeRepository::new(app.db.conn())
        .find_by_code("PROMONTH")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(promo.redemption_count, 0);
}

#[tokio::test]
async fn test_stripe_subscriber_billing_is_left_to_stripe() {
    let app = setup_app().await;
    let profiles = ProfileRepository::new(app.db.conn());
    create_promo_code(&app.db.connection, "WEEKPRO", "pro", Some(7), None, None).await;

    for status in ["active", "trialing"] {
        let profile = create_pro_profile(&app.db.connection).await;
        let subscriber = profiles
            .update_billing(
                profile.id,
                BillingUpdate {
                    subscription_status: Some(Some(status.to_string())),
                    stripe_subscription_id: Some(Some(format!("sub_live_{}", status))),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let err = app
            .state
            .promo_code_service
            .redeem(profile.id, "WEEKPRO", Utc::now())
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), StatusCode::CONFLICT);

        let after = profiles.find_by_id(profile.id).await.unwrap().unwrap();
        assert_eq!(after.subscription_status.as_deref(), Some(status));
        assert_eq!(after.current_period_end, subscriber.current_period_end);
    }

    let promo = PromoCodeRepository::new(app.db.conn())
        .find_by_code("WEEKPRO")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(promo.redemption_count, 0);
}

#[tokio::test]
async fn test_promo_access_is_extended_not_shortened() {
    let app = setup_app().await;
    let profile = create_profile(
        &app.db.connection,
        "pro",
        Some("active"),
        None,
        Some(Utc::now() + Duration::days(25)),
    )
    .await;
    create_promo_code(&app.db.connection, "EXTRAWEEK", "pro", Some(7), None, None).await;
    let remaining_end = profile.current_period_end.unwrap();

    let now = Utc::now();
    let state = app
        .state
        .promo_code_service
        .redeem(profile.id, "EXTRAWEEK", now)
        .await
        .unwrap();
    assert!(state.can_access_features);

    let extended = state.current_period_end.unwrap();
    assert_eq!(
        extended.timestamp(),
        (remaining_end + Duration::days(7)).timestamp()
    );

    // 元の期限から8日後もアクセスが続く
    let later = SubscriptionState::resolve(
        Some(
            &ProfileRepository::new(app.db.conn())
                .find_by_id(profile.id)
                .await
                .unwrap()
                .unwrap()
                .subscription_data(),
        ),
        now + Duration::days(8),
    );
    assert!(later.can_access_features);
}

#[tokio::test]
async fn test_concurrent_redemptions_respect_limit() {
    let app = setup_app().await;
    create_promo_code(&app.db.connection, "RACE3", "pro", Some(30), Some(3), None).await;

    let mut users = Vec::new();
    for _ in 0..8 {
        users.push(create_expired_profile(&app.db.connection).await);
    }

    let now = Utc::now();
    let handles: Vec<_> = users
        .iter()
        .map(|user| {
            let service = app.state.promo_code_service.clone();
            let user_id = user.id;
            tokio::spawn(async move { service.redeem(user_id, "RACE3", now).await })
        })
        .collect();

    let mut redeemed = 0;
    for handle in handles {
        if handle.await.unwrap().is_ok() {
            redeemed += 1;
        }
    }
    assert_eq!(redeemed, 3);

    let promo = PromoCodeRepository::new(app.db.conn())
        .find_by_code("RACE3")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(promo.redemption_count, 3);
}
