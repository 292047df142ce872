//! Authentication boundary tests
//!
//! Token issuance is the identity provider's job; these tests only verify
//! that the booking API rejects unauthenticated traffic before any
//! coordinator logic runs.

use crate::common::*;

#[tokio::test]
async fn test_health_is_public() {
    let app = TestApp::new().await;

    let response = app.get("/api/v1/health").await;
    response.assert_ok();

    let body: serde_json::Value = response.json();
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn test_protected_routes_require_token() {
    let app = TestApp::new().await;

    app.get("/api/v1/appointments").await.assert_unauthorized();
    app.post_json("/api/v1/slots", serde_json::json!({"instant": "2026-03-10T09:00:00Z"}))
        .await
        .assert_unauthorized();
    app.get("/api/v1/stats?period=week").await.assert_unauthorized();
}

#[tokio::test]
async fn test_garbage_token_rejected() {
    let app = TestApp::new().await;

    let response = app
        .get_as("/api/v1/appointments", "not-a-real-token")
        .await;
    response.assert_unauthorized();
    assert_eq!(response.error_kind(), "unauthorized");
}

#[tokio::test]
async fn test_token_signed_with_other_secret_rejected() {
    use barberbook::middleware::auth::{create_access_token, Role};

    let app = TestApp::new().await;
    let token = create_access_token(
        &fixtures::ids::CLIENT_C,
        Role::Client,
        None,
        "a-different-secret-entirely-0123456789",
        1,
    )
    .unwrap();

    app.get_as("/api/v1/appointments", &token)
        .await
        .assert_unauthorized();
}
