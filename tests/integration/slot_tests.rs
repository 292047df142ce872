//! Slot registry integration tests

use serde_json::json;

use crate::common::fixtures::ids;
use crate::common::*;

#[tokio::test]
async fn test_open_slot_requires_barber_role() {
    let app = TestApp::new().await;
    let instant = future_instant(3, 9);

    app.post_json_as(
        "/api/v1/slots",
        json!({ "instant": instant_param(&instant) }),
        &client_token(ids::CLIENT_C),
    )
    .await
    .assert_forbidden();
}

#[tokio::test]
async fn test_open_slot_rejects_duplicate_pair() {
    let app = TestApp::new().await;
    let token = barber_token(ids::BARBER_B, ids::SHOP_X);
    let instant = future_instant(3, 9);
    let payload = json!({ "instant": instant_param(&instant) });

    let response = app.post_json_as("/api/v1/slots", payload.clone(), &token).await;
    response.assert_created();

    let slot: serde_json::Value = response.json();
    assert_eq!(slot["barber_id"], ids::BARBER_B.to_string());
    assert_eq!(slot["is_available"], true);

    app.post_json_as("/api/v1/slots", payload, &token)
        .await
        .assert_conflict_kind("duplicate_slot");
}

#[tokio::test]
async fn test_batch_skips_existing_instants() {
    let app = TestApp::new().await;
    let token = barber_token(ids::BARBER_B, ids::SHOP_X);

    let t1 = instant_param(&future_instant(4, 9));
    let t2 = instant_param(&future_instant(4, 10));
    let t3 = instant_param(&future_instant(4, 11));

    let response = app
        .post_json_as("/api/v1/slots/batch", json!({ "instants": [t1, t2] }), &token)
        .await;
    response.assert_created();
    let created: Vec<serde_json::Value> = response.json();
    assert_eq!(created.len(), 2);

    // Overlapping batch creates only the genuinely new instant.
    let response = app
        .post_json_as(
            "/api/v1/slots/batch",
            json!({ "instants": [t1, t2, t3] }),
            &token,
        )
        .await;
    response.assert_created();
    let created: Vec<serde_json::Value> = response.json();
    assert_eq!(created.len(), 1);
    assert_eq!(created[0]["instant"], t3);

    // Re-applying the same batch inserts nothing.
    let response = app
        .post_json_as(
            "/api/v1/slots/batch",
            json!({ "instants": [t1, t2, t3] }),
            &token,
        )
        .await;
    response.assert_created();
    let created: Vec<serde_json::Value> = response.json();
    assert!(created.is_empty());
}

#[tokio::test]
async fn test_clients_browse_open_slots() {
    let app = TestApp::new().await;
    let token = barber_token(ids::BARBER_B, ids::SHOP_X);

    for hour in [9, 10] {
        app.post_json_as(
            "/api/v1/slots",
            json!({ "instant": instant_param(&future_instant(5, hour)) }),
            &token,
        )
        .await
        .assert_created();
    }

    let response = app
        .get_as(
            &format!("/api/v1/slots?barber_id={}", ids::BARBER_B),
            &client_token(ids::CLIENT_C),
        )
        .await;
    response.assert_ok();
    let slots: Vec<serde_json::Value> = response.json();
    assert_eq!(slots.len(), 2);

    // Another barber's calendar is empty.
    let response = app
        .get_as(
            &format!("/api/v1/slots?barber_id={}", ids::BARBER_B2),
            &client_token(ids::CLIENT_C),
        )
        .await;
    response.assert_ok();
    let slots: Vec<serde_json::Value> = response.json();
    assert!(slots.is_empty());
}

#[tokio::test]
async fn test_remove_free_slot() {
    let app = TestApp::new().await;
    let token = barber_token(ids::BARBER_B, ids::SHOP_X);

    let response = app
        .post_json_as(
            "/api/v1/slots",
            json!({ "instant": instant_param(&future_instant(6, 9)) }),
            &token,
        )
        .await;
    response.assert_created();
    let slot: serde_json::Value = response.json();
    let slot_id = slot["id"].as_str().unwrap().to_string();

    app.delete_as(&format!("/api/v1/slots/{}", slot_id), &token)
        .await
        .assert_no_content();

    // Gone for browsing clients too.
    let response = app
        .get_as(
            &format!("/api/v1/slots?barber_id={}", ids::BARBER_B),
            &client_token(ids::CLIENT_C),
        )
        .await;
    let slots: Vec<serde_json::Value> = response.json();
    assert!(slots.is_empty());
}

#[tokio::test]
async fn test_remove_booked_slot_conflicts() {
    let app = TestApp::new().await;
    let barber = barber_token(ids::BARBER_B, ids::SHOP_X);
    let instant = future_instant(6, 10);

    let response = app
        .post_json_as(
            "/api/v1/slots",
            json!({ "instant": instant_param(&instant) }),
            &barber,
        )
        .await;
    response.assert_created();
    let slot: serde_json::Value = response.json();
    let slot_id = slot["id"].as_str().unwrap().to_string();

    app.post_json_as(
        "/api/v1/appointments",
        json!({
            "barber_id": ids::BARBER_B,
            "instant": instant_param(&instant),
            "service_type": "corte",
        }),
        &client_token(ids::CLIENT_C),
    )
    .await
    .assert_created();

    app.delete_as(&format!("/api/v1/slots/{}", slot_id), &barber)
        .await
        .assert_conflict_kind("conflict");
}

#[tokio::test]
async fn test_remove_foreign_slot_forbidden() {
    let app = TestApp::new().await;

    let response = app
        .post_json_as(
            "/api/v1/slots",
            json!({ "instant": instant_param(&future_instant(6, 11)) }),
            &barber_token(ids::BARBER_B, ids::SHOP_X),
        )
        .await;
    response.assert_created();
    let slot: serde_json::Value = response.json();
    let slot_id = slot["id"].as_str().unwrap().to_string();

    app.delete_as(
        &format!("/api/v1/slots/{}", slot_id),
        &barber_token(ids::BARBER_B2, ids::SHOP_X),
    )
    .await
    .assert_forbidden();
}

#[tokio::test]
async fn test_manual_availability_override() {
    let app = TestApp::new().await;
    let barber = barber_token(ids::BARBER_B, ids::SHOP_X);

    let response = app
        .post_json_as(
            "/api/v1/slots",
            json!({ "instant": instant_param(&future_instant(7, 9)) }),
            &barber,
        )
        .await;
    response.assert_created();
    let slot: serde_json::Value = response.json();
    let slot_id = slot["id"].as_str().unwrap().to_string();

    // The owning barber closes the slot by hand.
    let response = app
        .put_json_as(
            &format!("/api/v1/slots/{}/availability", slot_id),
            json!({ "is_available": false }),
            &barber,
        )
        .await;
    response.assert_ok();
    let slot: serde_json::Value = response.json();
    assert_eq!(slot["is_available"], false);

    // The shop's manager may re-open it.
    let response = app
        .put_json_as(
            &format!("/api/v1/slots/{}/availability", slot_id),
            json!({ "is_available": true }),
            &manager_token(ids::MANAGER_M, ids::SHOP_X),
        )
        .await;
    response.assert_ok();
    let slot: serde_json::Value = response.json();
    assert_eq!(slot["is_available"], true);

    // A manager from another shop may not.
    app.put_json_as(
        &format!("/api/v1/slots/{}/availability", slot_id),
        json!({ "is_available": false }),
        &manager_token(ids::MANAGER_Y, ids::SHOP_Y),
    )
    .await
    .assert_forbidden();

    // Neither may a client.
    app.put_json_as(
        &format!("/api/v1/slots/{}/availability", slot_id),
        json!({ "is_available": false }),
        &client_token(ids::CLIENT_C),
    )
    .await
    .assert_forbidden();
}

#[tokio::test]
async fn test_my_slots_includes_claimed_ones() {
    let app = TestApp::new().await;
    let barber = barber_token(ids::BARBER_B, ids::SHOP_X);
    let instant = future_instant(8, 9);

    app.post_json_as(
        "/api/v1/slots",
        json!({ "instant": instant_param(&instant) }),
        &barber,
    )
    .await
    .assert_created();

    app.post_json_as(
        "/api/v1/appointments",
        json!({
            "barber_id": ids::BARBER_B,
            "instant": instant_param(&instant),
            "service_type": "corte",
        }),
        &client_token(ids::CLIENT_C),
    )
    .await
    .assert_created();

    let response = app.get_as("/api/v1/slots/mine", &barber).await;
    response.assert_ok();
    let slots: Vec<serde_json::Value> = response.json();
    assert_eq!(slots.len(), 1);
    assert_eq!(slots[0]["is_available"], false);
}
