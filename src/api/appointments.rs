//! Appointment API endpoints
//!
//! All compound booking/cancellation logic lives in the booking coordinator;
//! these handlers only authenticate, validate and translate.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    middleware::{AuthUser, Role},
    models::{AppointmentView, BookAppointmentRequest, UpdateAppointmentRequest},
    services::BookingService,
    utils::{AppError, AppResult},
    AppState,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_appointments).post(book_appointment))
        .route(
            "/{id}",
            get(get_appointment)
                .put(update_appointment)
                .delete(cancel_appointment),
        )
}

fn require_client(auth_user: &AuthUser) -> AppResult<()> {
    if auth_user.role == Role::Client {
        Ok(())
    } else {
        Err(AppError::forbidden("client role required"))
    }
}

/// Book an appointment. The client id always comes from the token.
async fn book_appointment(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Json(payload): Json<BookAppointmentRequest>,
) -> AppResult<(StatusCode, Json<AppointmentView>)> {
    require_client(&auth_user)?;
    payload.validate()?;

    let service = BookingService::new(state.db.clone());
    let view = service.book(&auth_user, &payload).await?;

    Ok((StatusCode::CREATED, Json(view)))
}

/// Role-aware listing: clients see their own appointments, barbers their own
/// schedule, managers everything in their barbershop. Most recent first.
async fn list_appointments(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> AppResult<Json<Vec<AppointmentView>>> {
    let service = BookingService::new(state.db.clone());
    let views = service.list_for(&auth_user).await?;
    Ok(Json(views))
}

async fn get_appointment(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<AppointmentView>> {
    let service = BookingService::new(state.db.clone());
    let view = service.get(&auth_user, id).await?;
    Ok(Json(view))
}

/// Partial update; a changed instant is treated as a reschedule and
/// re-validated against the slot registry.
async fn update_appointment(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateAppointmentRequest>,
) -> AppResult<Json<AppointmentView>> {
    payload.validate()?;

    let service = BookingService::new(state.db.clone());
    let view = service.update(&auth_user, id, &payload).await?;
    Ok(Json(view))
}

/// Cancel an appointment; repeating the call is a no-op success.
async fn cancel_appointment(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    let service = BookingService::new(state.db.clone());
    service.cancel(&auth_user, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
