//! Appointment model and request/response payloads

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Lifecycle status of an appointment.
///
/// The booking path creates appointments directly as `Confirmed`; `Pending`
/// exists for compatibility with external tooling but is never produced by
/// the coordinator itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppointmentStatus {
    Pending,
    Confirmed,
    Cancelled,
    Completed,
}

impl AppointmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AppointmentStatus::Pending => "pending",
            AppointmentStatus::Confirmed => "confirmed",
            AppointmentStatus::Cancelled => "cancelled",
            AppointmentStatus::Completed => "completed",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(AppointmentStatus::Pending),
            "confirmed" => Some(AppointmentStatus::Confirmed),
            "cancelled" => Some(AppointmentStatus::Cancelled),
            "completed" => Some(AppointmentStatus::Completed),
            _ => None,
        }
    }
}

impl std::fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A client's reservation of a barber's time.
///
/// `barbershop_id` is denormalized from the barber at creation time and never
/// changes afterwards. Appointments are not hard-deleted; cancellation is a
/// status change so the statistics queries keep their history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Appointment {
    pub id: Uuid,
    pub client_id: Uuid,
    pub barber_id: Uuid,
    pub barbershop_id: Uuid,
    /// Back-reference to the slot that was claimed at booking time, if any.
    pub slot_id: Option<Uuid>,
    pub instant: DateTime<Utc>,
    pub status: AppointmentStatus,
    pub service_type: String,
    pub service_price: Option<f64>,
    pub payment_method: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Draft used by the coordinator when inserting a new appointment.
///
/// Id, timestamps and the initial `confirmed` status are assigned by the
/// repository insert.
#[derive(Debug, Clone)]
pub struct NewAppointment {
    pub client_id: Uuid,
    pub barber_id: Uuid,
    pub barbershop_id: Uuid,
    pub slot_id: Option<Uuid>,
    pub instant: DateTime<Utc>,
    pub service_type: String,
    pub service_price: Option<f64>,
    pub payment_method: Option<String>,
    pub notes: Option<String>,
}

/// Booking request body. `client_id` comes from the authenticated principal,
/// never from the payload.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct BookAppointmentRequest {
    pub barber_id: Uuid,
    pub instant: DateTime<Utc>,
    #[validate(length(min = 1, max = 120, message = "Service type must be 1-120 characters"))]
    pub service_type: String,
    #[validate(range(min = 0.0, message = "Service price must not be negative"))]
    pub service_price: Option<f64>,
    /// Checked against the accepted payment methods by the coordinator.
    pub payment_method: Option<String>,
    #[validate(length(max = 500, message = "Notes must be at most 500 characters"))]
    pub notes: Option<String>,
}

/// Partial update of an appointment. A change of `instant` is a reschedule
/// and re-runs the booking validation against the new (barber, instant) pair.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdateAppointmentRequest {
    pub instant: Option<DateTime<Utc>>,
    #[validate(length(max = 500, message = "Notes must be at most 500 characters"))]
    pub notes: Option<String>,
    pub status: Option<AppointmentStatus>,
}

impl UpdateAppointmentRequest {
    pub fn is_empty(&self) -> bool {
        self.instant.is_none() && self.notes.is_none() && self.status.is_none()
    }
}

/// Denormalized party reference used in responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PartyRef {
    pub id: Uuid,
    pub name: String,
}

/// Appointment as returned by the API, with display names resolved from the
/// catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppointmentView {
    pub id: Uuid,
    pub client: PartyRef,
    pub barber: PartyRef,
    pub barbershop_id: Uuid,
    pub instant: DateTime<Utc>,
    pub status: AppointmentStatus,
    pub service_type: String,
    pub service_price: Option<f64>,
    pub payment_method: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
