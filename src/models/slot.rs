//! Availability slot model and payloads

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// One bookable (barber, instant) pair.
///
/// `is_available` flips to false when a confirmed appointment claims the pair
/// and back to true when that appointment is cancelled. The pair itself is
/// unique per barber.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Slot {
    pub id: Uuid,
    pub barber_id: Uuid,
    pub instant: DateTime<Utc>,
    pub is_available: bool,
    pub created_at: DateTime<Utc>,
}

/// Open a single slot for the authenticated barber.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct OpenSlotRequest {
    pub instant: DateTime<Utc>,
}

/// Open a batch of slots. Instants that already exist for the barber are
/// skipped silently; the response contains only the newly created slots.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct OpenSlotsBatchRequest {
    #[validate(length(min = 1, max = 500, message = "Batch must contain 1-500 instants"))]
    pub instants: Vec<DateTime<Utc>>,
}

/// Manual availability override, outside the booking flow.
#[derive(Debug, Clone, Deserialize)]
pub struct SetSlotAvailabilityRequest {
    pub is_available: bool,
}
