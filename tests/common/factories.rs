//! Test factories for tokens, instants and ledger rows
//!
//! Tokens are minted with the same helper the real identity provider would
//! use, signed with the shared test secret. Ledger rows for statistics tests
//! are written straight to the database: the aggregation engine only reads
//! the appointment ledger, so tests may arrange history without replaying
//! whole booking flows.

use chrono::{DateTime, Duration, SecondsFormat, Utc};
use sqlx::SqlitePool;
use uuid::Uuid;

use barberbook::middleware::auth::{create_access_token, Role};

use crate::common::test_app::TEST_JWT_SECRET;

/// Mint an access token for a client principal.
pub fn client_token(client_id: Uuid) -> String {
    create_access_token(&client_id, Role::Client, None, TEST_JWT_SECRET, 1)
        .expect("Failed to create client token")
}

/// Mint an access token for a barber principal.
pub fn barber_token(barber_id: Uuid, barbershop_id: Uuid) -> String {
    create_access_token(
        &barber_id,
        Role::Barber,
        Some(&barbershop_id),
        TEST_JWT_SECRET,
        1,
    )
    .expect("Failed to create barber token")
}

/// Mint an access token for a manager principal.
pub fn manager_token(manager_id: Uuid, barbershop_id: Uuid) -> String {
    create_access_token(
        &manager_id,
        Role::Manager,
        Some(&barbershop_id),
        TEST_JWT_SECRET,
        1,
    )
    .expect("Failed to create manager token")
}

/// A whole-second instant `days` ahead at the given hour, UTC.
pub fn future_instant(days: i64, hour: u32) -> DateTime<Utc> {
    (Utc::now() + Duration::days(days))
        .date_naive()
        .and_hms_opt(hour, 0, 0)
        .expect("valid wall clock time")
        .and_utc()
}

/// Serialize an instant the way the API expects it.
pub fn instant_param(instant: &DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Insert an appointment row directly into the ledger.
#[allow(clippy::too_many_arguments)]
pub async fn insert_appointment(
    pool: &SqlitePool,
    client_id: Uuid,
    barber_id: Uuid,
    barbershop_id: Uuid,
    instant: DateTime<Utc>,
    status: &str,
    service_type: &str,
    service_price: Option<f64>,
    payment_method: Option<&str>,
) -> Uuid {
    let id = Uuid::new_v4();
    let now = Utc::now().to_rfc3339();

    sqlx::query(
        r#"
        INSERT INTO appointments
            (id, client_id, barber_id, barbershop_id, slot_id, instant, status,
             service_type, service_price, payment_method, notes, created_at, updated_at)
        VALUES (?, ?, ?, ?, NULL, ?, ?, ?, ?, ?, NULL, ?, ?)
        "#,
    )
    .bind(id.to_string())
    .bind(client_id.to_string())
    .bind(barber_id.to_string())
    .bind(barbershop_id.to_string())
    .bind(instant_param(&instant))
    .bind(status)
    .bind(service_type)
    .bind(service_price)
    .bind(payment_method)
    .bind(&now)
    .bind(&now)
    .execute(pool)
    .await
    .expect("Failed to insert appointment row");

    id
}
