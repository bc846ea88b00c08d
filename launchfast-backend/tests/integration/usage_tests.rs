use crate::common::app_helper::setup_app;
use crate::common::auth_helper::access_token_for;
use crate::common::request::{create_request, get_request, read_json};
use crate::common::test_data::{create_expired_profile, create_pro_profile};
use axum::http::StatusCode;
use chrono::{TimeZone, Utc};
use launchfast_backend::domain::usage::{UsageAction, FREE_MONTHLY_SEARCHES};
use serde_json::json;
use tower::ServiceExt;

#[tokio::test]
async fn test_free_tier_search_cap() {
    let app = setup_app().await;
    let profile = create_expired_profile(&app.db.connection).await;
    let token = access_token_for(profile.id, &profile.email);

    for expected in 1..=FREE_MONTHLY_SEARCHES {
        let response = app
            .router
            .clone()
            .oneshot(create_request(
                "POST",
                "/usage/consume",
                &token,
                &json!({ "action": "search" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = read_json(response).await;
        assert_eq!(body["data"]["current"], expected);
        assert_eq!(body["data"]["remaining"], FREE_MONTHLY_SEARCHES - expected);
    }

    // 11回目は拒否され、カウンタは増えない
    let response = app
        .router
        .clone()
        .oneshot(create_request(
            "POST",
            "/usage/consume",
            &token,
            &json!({ "action": "search" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let body = read_json(response).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["data"]["allowed"], false);
    assert_eq!(body["data"]["current"], FREE_MONTHLY_SEARCHES);
    assert!(body["message"].as_str().unwrap().contains("limit reached"));

    let response = app
        .router
        .clone()
        .oneshot(get_request("/usage", &token))
        .await
        .unwrap();
    let body = read_json(response).await;
    assert_eq!(body["data"]["counters"]["searches"], FREE_MONTHLY_SEARCHES);
}

#[tokio::test]
async fn test_check_does_not_increment() {
    let app = setup_app().await;
    let profile = create_expired_profile(&app.db.connection).await;
    let token = access_token_for(profile.id, &profile.email);

    for _ in 0..3 {
        let response = app
            .router
            .clone()
            .oneshot(get_request("/usage/check/search", &token))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = read_json(response).await;
        assert_eq!(body["data"]["allowed"], true);
        assert_eq!(body["data"]["current"], 0);
    }
}

#[tokio::test]
async fn test_check_unknown_action_is_bad_request() {
    let app = setup_app().await;
    let profile = create_expired_profile(&app.db.connection).await;
    let token = access_token_for(profile.id, &profile.email);

    let response = app
        .router
        .clone()
        .oneshot(get_request("/usage/check/teleport", &token))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_csv_export_requires_paid_plan() {
    let app = setup_app().await;
    let free = create_expired_profile(&app.db.connection).await;
    let pro = create_pro_profile(&app.db.connection).await;

    let response = app
        .router
        .clone()
        .oneshot(create_request(
            "POST",
            "/usage/consume",
            &access_token_for(free.id, &free.email),
            &json!({ "action": "csv_export" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let body = read_json(response).await;
    assert_eq!(body["data"]["current"], 0);

    let response = app
        .router
        .clone()
        .oneshot(create_request(
            "POST",
            "/usage/consume",
            &access_token_for(pro.id, &pro.email),
            &json!({ "action": "csv_export" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_pro_searches_are_unlimited() {
    let app = setup_app().await;
    let profile = create_pro_profile(&app.db.connection).await;
    let now = Utc::now();

    for _ in 0..(FREE_MONTHLY_SEARCHES + 5) {
        let decision = app
            .state
            .usage_service
            .consume(profile.id, UsageAction::Search, now)
            .await
            .unwrap();
        assert!(decision.allowed);
        assert_eq!(decision.limit, None);
    }

    let summary = app
        .state
        .usage_service
        .get_summary(profile.id, now)
        .await
        .unwrap();
    assert_eq!(summary.counters.searches, FREE_MONTHLY_SEARCHES + 5);
}

#[tokio::test]
async fn test_concurrent_consumption_respects_cap() {
    let app = setup_app().await;
    let profile = create_expired_profile(&app.db.connection).await;
    let now = Utc::now();

    let handles: Vec<_> = (0..25)
        .map(|_| {
            let service = app.state.usage_service.clone();
            let user_id = profile.id;
            tokio::spawn(async move { service.consume(user_id, UsageAction::Search, now).await })
        })
        .collect();

    let mut allowed = 0;
    for handle in handles {
        let decision = handle.await.unwrap().unwrap();
        if decision.allowed {
            allowed += 1;
        }
    }

    assert_eq!(allowed, FREE_MONTHLY_SEARCHES);

    let summary = app
        .state
        .usage_service
        .get_summary(profile.id, now)
        .await
        .unwrap();
    assert_eq!(summary.counters.searches, FREE_MONTHLY_SEARCHES);
}

#[tokio::test]
async fn test_new_month_starts_fresh_counters() {
    let app = setup_app().await;
    let profile = create_expired_profile(&app.db.connection).await;
    let january = Utc.with_ymd_and_hms(2025, 1, 31, 23, 30, 0).unwrap();
    let february = Utc.with_ymd_and_hms(2025, 2, 1, 0, 15, 0).unwrap();

    for _ in 0..FREE_MONTHLY_SEARCHES {
        let decision = app
            .state
            .usage_service
            .consume(profile.id, UsageAction::Search, january)
            .await
            .unwrap();
        assert!(decision.allowed);
    }
    let denied = app
        .state
        .usage_service
        .consume(profile.id, UsageAction::Search, january)
        .await
        .unwrap();
    assert!(!denied.allowed);

    // 翌月の最初の加算は新しい行を作る
    let decision = app
        .state
        .usage_service
        .consume(profile.id, UsageAction::Search, february)
        .await
        .unwrap();
    assert!(decision.allowed);
    assert_eq!(decision.current, 1);
    assert_eq!(decision.remaining, Some(FREE_MONTHLY_SEARCHES - 1));

    let january_summary = app
        .state
        .usage_service
        .get_summary(profile.id, january)
        .await
        .unwrap();
    assert_eq!(january_summary.month, "2025-01");
    assert_eq!(january_summary.counters.searches, FREE_MONTHLY_SEARCHES);

    let february_summary = app
        .state
        .usage_service
        .get_summary(profile.id, february)
        .await
        .unwrap();
    assert_eq!(february_summary.month, "2025-02");
    assert_eq!(february_summary.counters.searches, 1);
}

#[tokio::test]
async fn test_first_consume_only_counts_its_action() {
    let app = setup_app().await;
    let profile = create_pro_profile(&app.db.connection).await;
    let now = Utc::now();

    let decision = app
        .state
        .usage_service
        .consume(profile.id, UsageAction::CsvExport, now)
        .await
        .unwrap();
    assert!(decision.allowed);
    assert_eq!(decision.current, 1);

    let summary = app
        .state
        .usage_service
        .get_summary(profile.id, now)
        .await
        .unwrap();
    assert_eq!(summary.counters.searches, 0);
    assert_eq!(summary.counters.csv_exports, 1);
    assert_eq!(summary.counters.api_calls, 0);
}
