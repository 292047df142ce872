//! Booking coordinator
//!
//! The only component allowed to perform the compound "reserve a slot +
//! create an appointment" and "cancel an appointment + release a slot"
//! operations. Each compound operation runs in a single transaction so the
//! appointment ledger and the slot registry never disagree between
//! transactions. The schema's partial unique index backs up the in-transaction
//! conflict check, so two racing bookings can never both commit.

use chrono::{DateTime, Utc};
use tracing::info;
use uuid::Uuid;

use crate::db::{
    AppointmentRepository, AppointmentWithNames, CatalogRepository, DbPool, SlotRepository,
};
use crate::middleware::{AuthUser, Role};
use crate::models::{
    Appointment, AppointmentStatus, AppointmentView, BookAppointmentRequest, NewAppointment,
    UpdateAppointmentRequest,
};
use crate::utils::error::is_unique_violation;
use crate::utils::validation::is_known_payment_method;
use crate::utils::{AppError, AppResult};

pub struct BookingService {
    pool: DbPool,
}

impl BookingService {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Book an appointment for the authenticated client.
    ///
    /// The slot lookup, the double-booking check and the appointment insert +
    /// slot flip all happen inside one transaction. The conflict check runs
    /// before the availability-flag check so that a pair occupied by a
    /// confirmed appointment reports `AlreadyBooked` while a manually closed
    /// slot reports `SlotUnavailable`.
    pub async fn book(
        &self,
        client: &AuthUser,
        req: &BookAppointmentRequest,
    ) -> AppResult<AppointmentView> {
        if let Some(method) = req.payment_method.as_deref() {
            if !is_known_payment_method(method) {
                return Err(AppError::validation(format!(
                    "Unknown payment method: {method}"
                )));
            }
        }

        let barber = CatalogRepository::get_barber(&self.pool, req.barber_id)
            .await?
            .ok_or_else(|| AppError::not_found("Barber not found"))?;

        let mut tx = self.pool.begin().await?;

        let slot = SlotRepository::find_by_pair(&mut *tx, req.barber_id, req.instant)
            .await?
            .ok_or_else(|| {
                AppError::slot_unavailable("The barber has no open slot at this time")
            })?;

        if AppointmentRepository::find_confirmed_at(&mut *tx, req.barber_id, req.instant)
            .await?
            .is_some()
        {
            return Err(AppError::already_booked(
                "This time is already booked with the barber",
            ));
        }

        if !slot.is_available {
            return Err(AppError::slot_unavailable("This slot is not open for booking"));
        }

        let draft = NewAppointment {
            client_id: client.id,
            barber_id: barber.id,
            barbershop_id: barber.barbershop_id,
            slot_id: Some(slot.id),
            instant: req.instant,
            service_type: req.service_type.clone(),
            service_price: req.service_price,
            payment_method: req.payment_method.clone(),
            notes: req.notes.clone(),
        };

        let appointment = match AppointmentRepository::insert(&mut *tx, &draft).await {
            Ok(appointment) => appointment,
            // A racing booking slipped in between our check and insert; the
            // partial unique index caught it.
            Err(e) if is_unique_violation(&e) => {
                return Err(AppError::already_booked(
                    "This time is already booked with the barber",
                ));
            }
            Err(e) => return Err(e.into()),
        };

        SlotRepository::set_availability(&mut *tx, slot.id, false).await?;

        tx.commit().await?;

        info!(
            appointment_id = %appointment.id,
            barber_id = %barber.id,
            instant = %appointment.instant,
            "Appointment booked"
        );

        self.view_of(appointment.id).await
    }

    /// Cancel an appointment and release its slot.
    ///
    /// Cancelling an already-cancelled appointment is an idempotent no-op.
    /// A missing slot record is not an error; slots may be deleted
    /// independently of the appointments that once claimed them.
    pub async fn cancel(&self, principal: &AuthUser, id: Uuid) -> AppResult<()> {
        let mut tx = self.pool.begin().await?;

        let appointment = AppointmentRepository::get_by_id(&mut *tx, id)
            .await?
            .ok_or_else(|| AppError::not_found("Appointment not found"))?;

        authorize_manage(principal, &appointment)?;

        match appointment.status {
            AppointmentStatus::Cancelled => return Ok(()),
            AppointmentStatus::Completed => {
                return Err(AppError::conflict(
                    "A completed appointment cannot be cancelled",
                ));
            }
            AppointmentStatus::Pending | AppointmentStatus::Confirmed => {}
        }

        AppointmentRepository::set_status(&mut *tx, id, AppointmentStatus::Cancelled).await?;
        release_slot(&mut tx, appointment.barber_id, appointment.instant).await?;

        tx.commit().await?;

        info!(appointment_id = %id, "Appointment cancelled");
        Ok(())
    }

    /// Partial update of an appointment.
    ///
    /// A change of `instant` is a reschedule and re-runs the full booking
    /// validation against the new (barber, instant) pair, releasing the old
    /// slot and claiming the new one in the same transaction. Status changes
    /// keep the slot registry consistent: leaving `confirmed` through
    /// cancellation releases the slot, re-entering `confirmed` claims one.
    pub async fn update(
        &self,
        principal: &AuthUser,
        id: Uuid,
        changes: &UpdateAppointmentRequest,
    ) -> AppResult<AppointmentView> {
        if changes.is_empty() {
            return Err(AppError::validation("No fields to update"));
        }

        let mut tx = self.pool.begin().await?;

        let current = AppointmentRepository::get_by_id(&mut *tx, id)
            .await?
            .ok_or_else(|| AppError::not_found("Appointment not found"))?;

        authorize_manage(principal, &current)?;

        let instant_changed = changes
            .instant
            .is_some_and(|new| !same_instant(&new, &current.instant));

        if instant_changed {
            if changes.status.is_some() {
                return Err(AppError::validation(
                    "A reschedule cannot be combined with a status change",
                ));
            }
            if current.status != AppointmentStatus::Confirmed {
                return Err(AppError::conflict(
                    "Only confirmed appointments can be rescheduled",
                ));
            }
        }

        if let Some(new_instant) = changes.instant.filter(|_| instant_changed) {
            self.claim_pair(&mut tx, current.barber_id, new_instant).await?;
            release_slot(&mut tx, current.barber_id, current.instant).await?;
        }

        if let Some(new_status) = changes.status {
            if new_status != current.status {
                self.apply_status_slot_effects(&mut tx, &current, new_status)
                    .await?;
            }
        }

        let updated = match AppointmentRepository::update_fields(
            &mut *tx,
            id,
            changes.instant,
            changes.notes.as_deref(),
            changes.status,
        )
        .await
        {
            Ok(updated) => updated,
            Err(e) if is_unique_violation(&e) => {
                return Err(AppError::already_booked(
                    "This time is already booked with the barber",
                ));
            }
            Err(e) => return Err(e.into()),
        };

        let updated =
            updated.ok_or_else(|| AppError::not_found("Appointment not found"))?;

        tx.commit().await?;

        info!(appointment_id = %updated.id, "Appointment updated");
        self.view_of(updated.id).await
    }

    /// Fetch a single appointment, subject to the same ownership rule as
    /// cancel/update.
    pub async fn get(&self, principal: &AuthUser, id: Uuid) -> AppResult<AppointmentView> {
        let with_names = AppointmentRepository::get_with_names(&self.pool, id)
            .await?
            .ok_or_else(|| AppError::not_found("Appointment not found"))?;

        authorize_manage(principal, &with_names.appointment)?;
        Ok(with_names.into_view())
    }

    /// Role-aware listing, most recent first.
    pub async fn list_for(&self, principal: &AuthUser) -> AppResult<Vec<AppointmentView>> {
        let rows = AppointmentRepository::list_for_principal(&self.pool, principal).await?;
        Ok(rows.into_iter().map(AppointmentWithNames::into_view).collect())
    }

    /// Validate that the (barber, instant) pair is open and claim its slot.
    async fn claim_pair(
        &self,
        tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
        barber_id: Uuid,
        instant: DateTime<Utc>,
    ) -> AppResult<()> {
        let slot = SlotRepository::find_by_pair(&mut **tx, barber_id, instant)
            .await?
            .ok_or_else(|| {
                AppError::slot_unavailable("The barber has no open slot at this time")
            })?;

        if AppointmentRepository::find_confirmed_at(&mut **tx, barber_id, instant)
            .await?
            .is_some()
        {
            return Err(AppError::already_booked(
                "This time is already booked with the barber",
            ));
        }

        if !slot.is_available {
            return Err(AppError::slot_unavailable("This slot is not open for booking"));
        }

        SlotRepository::set_availability(&mut **tx, slot.id, false).await?;
        Ok(())
    }

    /// Keep the slot registry in step with an explicit status overwrite.
    ///
    /// Leaving `confirmed` through cancellation releases the slot; completion
    /// keeps it claimed (the instant has passed and must not be rebooked).
    /// Re-entering `confirmed` runs the same validation as booking.
    async fn apply_status_slot_effects(
        &self,
        tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
        current: &Appointment,
        new_status: AppointmentStatus,
    ) -> AppResult<()> {
        match (current.status, new_status) {
            (AppointmentStatus::Confirmed, AppointmentStatus::Cancelled) => {
                release_slot(tx, current.barber_id, current.instant).await?;
            }
            (_, AppointmentStatus::Confirmed) => {
                self.claim_pair(tx, current.barber_id, current.instant).await?;
            }
            _ => {}
        }
        Ok(())
    }

    async fn view_of(&self, id: Uuid) -> AppResult<AppointmentView> {
        AppointmentRepository::get_with_names(&self.pool, id)
            .await?
            .map(AppointmentWithNames::into_view)
            .ok_or_else(|| AppError::internal("Appointment not readable after write"))
    }
}

/// Client may manage only their own appointments, barbers their own schedule,
/// managers anything within their barbershop.
fn authorize_manage(principal: &AuthUser, appointment: &Appointment) -> AppResult<()> {
    let allowed = match principal.role {
        Role::Client => appointment.client_id == principal.id,
        Role::Barber => appointment.barber_id == principal.id,
        Role::Manager => principal.barbershop_id == Some(appointment.barbershop_id),
    };

    if allowed {
        Ok(())
    } else {
        Err(AppError::forbidden(
            "You are not allowed to manage this appointment",
        ))
    }
}

/// Best-effort slot release after a cancellation.
async fn release_slot(
    tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
    barber_id: Uuid,
    instant: DateTime<Utc>,
) -> AppResult<()> {
    if let Some(slot) = SlotRepository::find_by_pair(&mut **tx, barber_id, instant).await? {
        SlotRepository::set_availability(&mut **tx, slot.id, true).await?;
    }
    Ok(())
}

/// Instants are stored at whole-second precision; compare at that granularity.
fn same_instant(a: &DateTime<Utc>, b: &DateTime<Utc>) -> bool {
    a.timestamp() == b.timestamp()
}
