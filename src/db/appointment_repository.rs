//! Appointment ledger repository
//!
//! Durable store of appointment records and their status. Appointments are
//! never deleted; every status change keeps the row for the statistics
//! queries. The schema's partial unique index guarantees at most one
//! confirmed appointment per (barber, instant) pair even under concurrent
//! inserts.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::SqliteExecutor;
use uuid::Uuid;

use crate::db::{fmt_instant, parse_db_timestamp};
use crate::middleware::{AuthUser, Role};
use crate::models::{Appointment, AppointmentStatus, AppointmentView, NewAppointment, PartyRef};

const APPOINTMENT_COLUMNS: &str = "id, client_id, barber_id, barbershop_id, slot_id, instant, \
     status, service_type, service_price, payment_method, notes, created_at, updated_at";

#[derive(Debug, sqlx::FromRow)]
struct AppointmentRow {
    id: String,
    client_id: String,
    barber_id: String,
    barbershop_id: String,
    slot_id: Option<String>,
    instant: String,
    status: String,
    service_type: String,
    service_price: Option<f64>,
    payment_method: Option<String>,
    notes: Option<String>,
    created_at: String,
    updated_at: String,
}

#[derive(Debug, sqlx::FromRow)]
struct AppointmentWithNamesRow {
    #[sqlx(flatten)]
    appointment: AppointmentRow,
    client_name: String,
    barber_name: String,
}

fn row_to_appointment(row: AppointmentRow) -> Result<Appointment> {
    let status = AppointmentStatus::from_str(&row.status)
        .with_context(|| format!("Unknown appointment status: {}", row.status))?;

    Ok(Appointment {
        id: Uuid::parse_str(&row.id).context("Invalid appointment id")?,
        client_id: Uuid::parse_str(&row.client_id).context("Invalid client id")?,
        barber_id: Uuid::parse_str(&row.barber_id).context("Invalid barber id")?,
        barbershop_id: Uuid::parse_str(&row.barbershop_id).context("Invalid barbershop id")?,
        slot_id: row
            .slot_id
            .as_deref()
            .map(Uuid::parse_str)
            .transpose()
            .context("Invalid slot id")?,
        instant: parse_db_timestamp(&row.instant),
        status,
        service_type: row.service_type,
        service_price: row.service_price,
        payment_method: row.payment_method,
        notes: row.notes,
        created_at: parse_db_timestamp(&row.created_at),
        updated_at: parse_db_timestamp(&row.updated_at),
    })
}

/// An appointment joined with its parties' display names.
#[derive(Debug, Clone)]
pub struct AppointmentWithNames {
    pub appointment: Appointment,
    pub client_name: String,
    pub barber_name: String,
}

impl AppointmentWithNames {
    pub fn into_view(self) -> AppointmentView {
        let appointment = self.appointment;
        AppointmentView {
            id: appointment.id,
            client: PartyRef {
                id: appointment.client_id,
                name: self.client_name,
            },
            barber: PartyRef {
                id: appointment.barber_id,
                name: self.barber_name,
            },
            barbershop_id: appointment.barbershop_id,
            instant: appointment.instant,
            status: appointment.status,
            service_type: appointment.service_type,
            service_price: appointment.service_price,
            payment_method: appointment.payment_method,
            notes: appointment.notes,
            created_at: appointment.created_at,
            updated_at: appointment.updated_at,
        }
    }
}

fn row_to_with_names(row: AppointmentWithNamesRow) -> Result<AppointmentWithNames> {
    Ok(AppointmentWithNames {
        appointment: row_to_appointment(row.appointment)?,
        client_name: row.client_name,
        barber_name: row.barber_name,
    })
}

pub struct AppointmentRepository;

impl AppointmentRepository {
    /// Insert a new appointment as `confirmed`, assigning id and timestamps.
    ///
    /// Runs on the caller's executor so the coordinator can pair it with the
    /// slot flip in one transaction.
    pub async fn insert(
        executor: impl SqliteExecutor<'_>,
        draft: &NewAppointment,
    ) -> Result<Appointment> {
        let now = Utc::now().to_rfc3339();
        let row = sqlx::query_as::<_, AppointmentRow>(
            r#"
            INSERT INTO appointments
                (id, client_id, barber_id, barbershop_id, slot_id, instant, status,
                 service_type, service_price, payment_method, notes, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, 'confirmed', ?, ?, ?, ?, ?, ?)
            RETURNING id, client_id, barber_id, barbershop_id, slot_id, instant, status,
                      service_type, service_price, payment_method, notes, created_at, updated_at
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(draft.client_id.to_string())
        .bind(draft.barber_id.to_string())
        .bind(draft.barbershop_id.to_string())
        .bind(draft.slot_id.map(|id| id.to_string()))
        .bind(fmt_instant(&draft.instant))
        .bind(&draft.service_type)
        .bind(draft.service_price)
        .bind(draft.payment_method.as_deref())
        .bind(draft.notes.as_deref())
        .bind(&now)
        .bind(&now)
        .fetch_one(executor)
        .await
        .context("Failed to insert appointment")?;

        row_to_appointment(row)
    }

    pub async fn get_by_id(
        executor: impl SqliteExecutor<'_>,
        id: Uuid,
    ) -> Result<Option<Appointment>> {
        let row = sqlx::query_as::<_, AppointmentRow>(&format!(
            "SELECT {APPOINTMENT_COLUMNS} FROM appointments WHERE id = ?"
        ))
        .bind(id.to_string())
        .fetch_optional(executor)
        .await
        .context("Failed to get appointment")?;

        row.map(row_to_appointment).transpose()
    }

    /// Find a confirmed appointment occupying the (barber, instant) pair.
    ///
    /// This is the double-booking check the coordinator runs even when the
    /// slot registry says the pair is free.
    pub async fn find_confirmed_at(
        executor: impl SqliteExecutor<'_>,
        barber_id: Uuid,
        instant: DateTime<Utc>,
    ) -> Result<Option<Appointment>> {
        let row = sqlx::query_as::<_, AppointmentRow>(&format!(
            "SELECT {APPOINTMENT_COLUMNS} FROM appointments \
             WHERE barber_id = ? AND instant = ? AND status = 'confirmed'"
        ))
        .bind(barber_id.to_string())
        .bind(fmt_instant(&instant))
        .fetch_optional(executor)
        .await
        .context("Failed to check for conflicting appointment")?;

        row.map(row_to_appointment).transpose()
    }

    /// Partial field update. Fields passed as `None` keep their value;
    /// `updated_at` always refreshes. Slot side effects are the caller's job.
    pub async fn update_fields(
        executor: impl SqliteExecutor<'_>,
        id: Uuid,
        instant: Option<DateTime<Utc>>,
        notes: Option<&str>,
        status: Option<AppointmentStatus>,
    ) -> Result<Option<Appointment>> {
        let row = sqlx::query_as::<_, AppointmentRow>(&format!(
            "UPDATE appointments SET \
                 instant = COALESCE(?, instant), \
                 notes = COALESCE(?, notes), \
                 status = COALESCE(?, status), \
                 updated_at = ? \
             WHERE id = ? \
             RETURNING {APPOINTMENT_COLUMNS}"
        ))
        .bind(instant.map(|i| fmt_instant(&i)))
        .bind(notes)
        .bind(status.map(|s| s.as_str()))
        .bind(Utc::now().to_rfc3339())
        .bind(id.to_string())
        .fetch_optional(executor)
        .await
        .context("Failed to update appointment")?;

        row.map(row_to_appointment).transpose()
    }

    /// Direct status mutation with `updated_at` refresh.
    pub async fn set_status(
        executor: impl SqliteExecutor<'_>,
        id: Uuid,
        status: AppointmentStatus,
    ) -> Result<Option<Appointment>> {
        let row = sqlx::query_as::<_, AppointmentRow>(&format!(
            "UPDATE appointments SET status = ?, updated_at = ? \
             WHERE id = ? \
             RETURNING {APPOINTMENT_COLUMNS}"
        ))
        .bind(status.as_str())
        .bind(Utc::now().to_rfc3339())
        .bind(id.to_string())
        .fetch_optional(executor)
        .await
        .context("Failed to set appointment status")?;

        row.map(row_to_appointment).transpose()
    }

    pub async fn get_with_names(
        executor: impl SqliteExecutor<'_>,
        id: Uuid,
    ) -> Result<Option<AppointmentWithNames>> {
        let row = sqlx::query_as::<_, AppointmentWithNamesRow>(
            r#"
            SELECT a.id, a.client_id, a.barber_id, a.barbershop_id, a.slot_id, a.instant,
                   a.status, a.service_type, a.service_price, a.payment_method, a.notes,
                   a.created_at, a.updated_at,
                   COALESCE(c.display_name, '') AS client_name,
                   COALESCE(b.display_name, '') AS barber_name
            FROM appointments a
            LEFT JOIN clients c ON c.id = a.client_id
            LEFT JOIN barbers b ON b.id = a.barber_id
            WHERE a.id = ?
            "#,
        )
        .bind(id.to_string())
        .fetch_optional(executor)
        .await
        .context("Failed to get appointment")?;

        row.map(row_to_with_names).transpose()
    }

    /// Role-aware listing, most recent instant first.
    ///
    /// Clients see their own appointments, barbers their own schedule and
    /// managers everything in their barbershop.
    pub async fn list_for_principal(
        executor: impl SqliteExecutor<'_>,
        principal: &AuthUser,
    ) -> Result<Vec<AppointmentWithNames>> {
        let (filter_column, filter_value) = match principal.role {
            Role::Client => ("a.client_id", principal.id),
            Role::Barber => ("a.barber_id", principal.id),
            Role::Manager => {
                let barbershop_id = principal
                    .barbershop_id
                    .context("Manager principal is missing a barbershop")?;
                ("a.barbershop_id", barbershop_id)
            }
        };

        let rows = sqlx::query_as::<_, AppointmentWithNamesRow>(&format!(
            "SELECT a.id, a.client_id, a.barber_id, a.barbershop_id, a.slot_id, a.instant, \
                    a.status, a.service_type, a.service_price, a.payment_method, a.notes, \
                    a.created_at, a.updated_at, \
                    COALESCE(c.display_name, '') AS client_name, \
                    COALESCE(b.display_name, '') AS barber_name \
             FROM appointments a \
             LEFT JOIN clients c ON c.id = a.client_id \
             LEFT JOIN barbers b ON b.id = a.barber_id \
             WHERE {filter_column} = ? \
             ORDER BY a.instant DESC, a.created_at DESC"
        ))
        .bind(filter_value.to_string())
        .fetch_all(executor)
        .await
        .context("Failed to list appointments")?;

        rows.into_iter().map(row_to_with_names).collect()
    }
}
