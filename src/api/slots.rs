//! Slot management API endpoints
//!
//! Slot creation and removal are scoped to the authenticated barber. The
//! availability toggle additionally accepts the barber's manager; it is a
//! manual override that deliberately bypasses the booking flow's conflict
//! checks, so it stays structurally separate from booking and cancellation.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::{
    db::{AppointmentRepository, CatalogRepository, SlotRepository},
    middleware::{AuthUser, Role},
    models::{OpenSlotRequest, OpenSlotsBatchRequest, SetSlotAvailabilityRequest, Slot},
    utils::error::is_unique_violation,
    utils::{AppError, AppResult},
    AppState,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", post(open_slot).get(list_open_slots))
        .route("/batch", post(open_slots_batch))
        .route("/mine", get(my_slots))
        .route("/{id}/availability", put(set_availability))
        .route("/{id}", axum::routing::delete(remove_slot))
}

fn require_barber(auth_user: &AuthUser) -> AppResult<()> {
    if auth_user.role == Role::Barber {
        Ok(())
    } else {
        Err(AppError::forbidden("barber role required"))
    }
}

/// Open a single slot for the authenticated barber.
async fn open_slot(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Json(payload): Json<OpenSlotRequest>,
) -> AppResult<(StatusCode, Json<Slot>)> {
    require_barber(&auth_user)?;

    if SlotRepository::find_by_pair(&state.db, auth_user.id, payload.instant)
        .await?
        .is_some()
    {
        return Err(AppError::duplicate_slot(
            "You have already opened this time",
        ));
    }

    let slot = match SlotRepository::create(&state.db, auth_user.id, payload.instant).await {
        Ok(slot) => slot,
        // Lost a race against another request for the same pair.
        Err(e) if is_unique_violation(&e) => {
            return Err(AppError::duplicate_slot("You have already opened this time"));
        }
        Err(e) => return Err(e.into()),
    };

    Ok((StatusCode::CREATED, Json(slot)))
}

/// Bulk calendar population. Instants that already exist for the barber are
/// skipped silently; the response contains only the newly created slots.
async fn open_slots_batch(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Json(payload): Json<OpenSlotsBatchRequest>,
) -> AppResult<(StatusCode, Json<Vec<Slot>>)> {
    require_barber(&auth_user)?;
    payload.validate()?;

    let mut tx = state.db.begin().await?;
    let created = SlotRepository::create_batch(&mut *tx, auth_user.id, &payload.instants).await?;
    tx.commit().await?;

    Ok((StatusCode::CREATED, Json(created)))
}

#[derive(Debug, Deserialize)]
struct ListSlotsQuery {
    barber_id: Uuid,
}

/// Upcoming open slots of one barber, for clients browsing the calendar.
async fn list_open_slots(
    State(state): State<AppState>,
    Query(query): Query<ListSlotsQuery>,
) -> AppResult<Json<Vec<Slot>>> {
    let slots =
        SlotRepository::list_available_from(&state.db, query.barber_id, Utc::now()).await?;
    Ok(Json(slots))
}

/// All of the authenticated barber's slots, claimed ones included.
async fn my_slots(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> AppResult<Json<Vec<Slot>>> {
    require_barber(&auth_user)?;
    let slots = SlotRepository::list_for_barber(&state.db, auth_user.id).await?;
    Ok(Json(slots))
}

/// Manual availability override, outside the booking flow.
async fn set_availability(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<SetSlotAvailabilityRequest>,
) -> AppResult<Json<Slot>> {
    let slot = SlotRepository::get_by_id(&state.db, id)
        .await?
        .ok_or_else(|| AppError::not_found("Slot not found"))?;

    authorize_slot_override(&state, &auth_user, &slot).await?;

    SlotRepository::set_availability(&state.db, id, payload.is_available).await?;

    let slot = SlotRepository::get_by_id(&state.db, id)
        .await?
        .ok_or_else(|| AppError::not_found("Slot not found"))?;

    Ok(Json(slot))
}

/// Remove an unbooked slot. Only the owning barber may remove their slots.
async fn remove_slot(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    require_barber(&auth_user)?;

    let mut tx = state.db.begin().await?;

    let slot = SlotRepository::get_by_id(&mut *tx, id)
        .await?
        .ok_or_else(|| AppError::not_found("Slot not found"))?;

    if slot.barber_id != auth_user.id {
        return Err(AppError::forbidden("You may only remove your own slots"));
    }

    if AppointmentRepository::find_confirmed_at(&mut *tx, slot.barber_id, slot.instant)
        .await?
        .is_some()
    {
        return Err(AppError::conflict(
            "A confirmed appointment still occupies this slot",
        ));
    }

    SlotRepository::delete(&mut *tx, id).await?;
    tx.commit().await?;

    Ok(StatusCode::NO_CONTENT)
}

/// The owning barber may toggle their own slots; a manager may toggle any
/// slot of a barber in their barbershop.
async fn authorize_slot_override(
    state: &AppState,
    auth_user: &AuthUser,
    slot: &Slot,
) -> AppResult<()> {
    match auth_user.role {
        Role::Barber if slot.barber_id == auth_user.id => Ok(()),
        Role::Manager => {
            let barber = CatalogRepository::get_barber(&state.db, slot.barber_id)
                .await?
                .ok_or_else(|| AppError::not_found("Barber not found"))?;

            if auth_user.barbershop_id == Some(barber.barbershop_id) {
                Ok(())
            } else {
                Err(AppError::forbidden(
                    "You may only manage slots within your barbershop",
                ))
            }
        }
        _ => Err(AppError::forbidden("You may not manage this slot")),
    }
}
