//! Business logic services

pub mod booking;
pub mod stats;

pub use booking::BookingService;
pub use stats::StatsService;
