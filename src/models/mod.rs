//! Domain models and API payloads

mod appointment;
mod catalog;
mod slot;
mod stats;

pub use appointment::{
    Appointment, AppointmentStatus, AppointmentView, BookAppointmentRequest, NewAppointment,
    PartyRef, UpdateAppointmentRequest,
};
pub use catalog::{Barber, Barbershop};
pub use slot::{OpenSlotRequest, OpenSlotsBatchRequest, SetSlotAvailabilityRequest, Slot};
pub use stats::{
    weekday_bucket, BarberRanking, DashboardStats, Period, ServiceBreakdown, StatsScope,
    StatsWindow,
};
