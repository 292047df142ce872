//! Catalog records: barbershops, barbers and clients
//!
//! These are reference data supplied by the onboarding/account subsystem.
//! The booking core reads them for tenant resolution and display names but
//! never mutates them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Barbershop {
    pub id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// A barber employed by exactly one barbershop.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Barber {
    pub id: Uuid,
    pub barbershop_id: Uuid,
    pub display_name: String,
}
