//! Aggregation engine integration tests
//!
//! The statistics service reads the appointment ledger directly, so these
//! tests arrange ledger history with direct inserts instead of replaying
//! whole booking flows.

use chrono::{Datelike, Utc};
use serde_json::json;

use crate::common::fixtures::ids;
use crate::common::*;

#[tokio::test]
async fn test_stats_require_barber_or_manager() {
    let app = TestApp::new().await;

    app.get_as("/api/v1/stats?period=week", &client_token(ids::CLIENT_C))
        .await
        .assert_forbidden();

    // A barber asking for the manager scope is also rejected.
    app.get_as(
        "/api/v1/stats?period=week&scope=manager",
        &barber_token(ids::BARBER_B, ids::SHOP_X),
    )
    .await
    .assert_forbidden();
}

#[tokio::test]
async fn test_empty_month_yields_zeroes() {
    let app = TestApp::new().await;

    let response = app
        .get_as(
            "/api/v1/stats?period=month",
            &manager_token(ids::MANAGER_M, ids::SHOP_X),
        )
        .await;
    response.assert_ok();
    let stats: serde_json::Value = response.json();

    assert_eq!(stats["completed_count"], 0);
    assert_eq!(stats["confirmed_count"], 0);
    assert_eq!(stats["cancelled_count"], 0);
    assert_eq!(stats["revenue"], 0.0);
    assert_eq!(stats["distinct_clients"], 0);
    assert_eq!(
        stats["payment_method_mix"],
        json!({ "pix": 0, "cartao": 0, "dinheiro": 0 })
    );
    assert_eq!(stats["daily_completed"], json!([0, 0, 0, 0, 0, 0, 0]));
    assert_eq!(stats["top_services"], json!([]));
    assert!(stats["barber_rankings"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_manager_dashboard_aggregates_shop() {
    let app = TestApp::new().await;
    let pool = &app.state.db;
    let now = Utc::now();

    // Three completed, one cancelled, one still confirmed - all in shop X.
    insert_appointment(
        pool, ids::CLIENT_C, ids::BARBER_B, ids::SHOP_X, now, "completed",
        "corte", Some(50.0), Some("pix"),
    )
    .await;
    insert_appointment(
        pool, ids::CLIENT_D, ids::BARBER_B, ids::SHOP_X, now, "completed",
        "corte", Some(30.0), Some("pix"),
    )
    .await;
    insert_appointment(
        pool, ids::CLIENT_C, ids::BARBER_B2, ids::SHOP_X, now, "completed",
        "barba", Some(20.0), Some("cartao"),
    )
    .await;
    insert_appointment(
        pool, ids::CLIENT_D, ids::BARBER_B, ids::SHOP_X, now, "cancelled",
        "corte", Some(50.0), None,
    )
    .await;
    insert_appointment(
        pool, ids::CLIENT_D, ids::BARBER_B2, ids::SHOP_X, now, "confirmed",
        "corte", Some(50.0), None,
    )
    .await;

    // Shop Y activity must not leak into shop X's numbers.
    insert_appointment(
        pool, ids::CLIENT_C, ids::BARBER_Y1, ids::SHOP_Y, now, "completed",
        "corte", Some(999.0), Some("dinheiro"),
    )
    .await;

    let response = app
        .get_as(
            "/api/v1/stats?period=month",
            &manager_token(ids::MANAGER_M, ids::SHOP_X),
        )
        .await;
    response.assert_ok();
    let stats: serde_json::Value = response.json();

    assert_eq!(stats["completed_count"], 3);
    assert_eq!(stats["confirmed_count"], 1);
    assert_eq!(stats["cancelled_count"], 1);
    assert_eq!(stats["revenue"], 100.0);
    assert_eq!(stats["distinct_clients"], 2);

    // 2 of 3 completed paid with pix, 1 of 3 with cartao.
    assert_eq!(stats["payment_method_mix"]["pix"], 66);
    assert_eq!(stats["payment_method_mix"]["cartao"], 33);
    assert_eq!(stats["payment_method_mix"]["dinheiro"], 0);

    // All completed appointments landed on today's weekday bucket
    // (Sunday-first indexing).
    let bucket = now.weekday().num_days_from_sunday() as usize;
    assert_eq!(stats["daily_completed"][bucket], 3);

    // Services ranked by count: corte (2) before barba (1).
    let services = stats["top_services"].as_array().unwrap();
    assert_eq!(services[0]["service"], "corte");
    assert_eq!(services[0]["count"], 2);
    assert_eq!(services[0]["revenue"], 80.0);
    assert_eq!(services[1]["service"], "barba");

    // Barbers ranked by completed revenue.
    let rankings = stats["barber_rankings"].as_array().unwrap();
    assert_eq!(rankings.len(), 2);
    assert_eq!(rankings[0]["barber_id"], ids::BARBER_B.to_string());
    assert_eq!(rankings[0]["revenue"], 80.0);
    assert_eq!(rankings[0]["distinct_clients"], 2);
    assert_eq!(rankings[1]["barber_id"], ids::BARBER_B2.to_string());
    assert_eq!(rankings[1]["revenue"], 20.0);
}

#[tokio::test]
async fn test_barber_scope_sees_only_own_figures() {
    let app = TestApp::new().await;
    let pool = &app.state.db;
    let now = Utc::now();

    insert_appointment(
        pool, ids::CLIENT_C, ids::BARBER_B, ids::SHOP_X, now, "completed",
        "corte", Some(50.0), Some("pix"),
    )
    .await;
    insert_appointment(
        pool, ids::CLIENT_D, ids::BARBER_B2, ids::SHOP_X, now, "completed",
        "corte", Some(70.0), Some("pix"),
    )
    .await;

    let response = app
        .get_as(
            "/api/v1/stats?period=month",
            &barber_token(ids::BARBER_B, ids::SHOP_X),
        )
        .await;
    response.assert_ok();
    let stats: serde_json::Value = response.json();

    assert_eq!(stats["completed_count"], 1);
    assert_eq!(stats["revenue"], 50.0);
    // Rankings are a barbershop-scope feature.
    assert!(stats.get("barber_rankings").is_none());

    let response = app
        .get_as(
            "/api/v1/stats?period=month",
            &manager_token(ids::MANAGER_M, ids::SHOP_X),
        )
        .await;
    let stats: serde_json::Value = response.json();
    assert_eq!(stats["completed_count"], 2);
    assert_eq!(stats["revenue"], 120.0);
}

#[tokio::test]
async fn test_null_price_counts_as_zero_revenue() {
    let app = TestApp::new().await;
    let pool = &app.state.db;
    let now = Utc::now();

    insert_appointment(
        pool, ids::CLIENT_C, ids::BARBER_B, ids::SHOP_X, now, "completed",
        "corte", None, None,
    )
    .await;
    insert_appointment(
        pool, ids::CLIENT_D, ids::BARBER_B, ids::SHOP_X, now, "completed",
        "corte", Some(40.0), Some("dinheiro"),
    )
    .await;

    let response = app
        .get_as(
            "/api/v1/stats?period=year",
            &barber_token(ids::BARBER_B, ids::SHOP_X),
        )
        .await;
    response.assert_ok();
    let stats: serde_json::Value = response.json();

    assert_eq!(stats["completed_count"], 2);
    assert_eq!(stats["revenue"], 40.0);

    // The appointment without a recorded method dilutes the mix: the
    // percentages stay below 100.
    assert_eq!(stats["payment_method_mix"]["dinheiro"], 50);
    assert_eq!(stats["payment_method_mix"]["pix"], 0);
}

#[tokio::test]
async fn test_invalid_period_rejected() {
    let app = TestApp::new().await;

    let response = app
        .get_as(
            "/api/v1/stats?period=fortnight",
            &manager_token(ids::MANAGER_M, ids::SHOP_X),
        )
        .await;
    assert_eq!(response.status, axum::http::StatusCode::BAD_REQUEST);
}
