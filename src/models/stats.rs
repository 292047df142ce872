//! Statistics types: reporting periods, scopes and dashboard payloads

use std::collections::BTreeMap;

use chrono::{DateTime, Datelike, Days, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Reporting period, resolved against "now" into a half-open UTC window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    Week,
    Month,
    Quarter,
    Year,
}

impl Period {
    pub fn as_str(&self) -> &'static str {
        match self {
            Period::Week => "week",
            Period::Month => "month",
            Period::Quarter => "quarter",
            Period::Year => "year",
        }
    }

    /// Resolve the period into `[start, end)` boundaries in UTC.
    ///
    /// Weeks start on Sunday, matching the dashboard's week-start convention.
    pub fn resolve(self, now: DateTime<Utc>) -> StatsWindow {
        let today = now.date_naive();
        let (start, end) = match self {
            Period::Week => {
                let start =
                    today - Days::new(u64::from(today.weekday().num_days_from_sunday()));
                (start, start + Days::new(7))
            }
            Period::Month => {
                let start = first_of_month(today.year(), today.month());
                (start, next_month(start))
            }
            Period::Quarter => {
                let quarter_month = ((today.month() - 1) / 3) * 3 + 1;
                let start = first_of_month(today.year(), quarter_month);
                let end = if quarter_month > 9 {
                    first_of_month(today.year() + 1, 1)
                } else {
                    first_of_month(today.year(), quarter_month + 3)
                };
                (start, end)
            }
            Period::Year => (
                first_of_month(today.year(), 1),
                first_of_month(today.year() + 1, 1),
            ),
        };
        StatsWindow {
            start: midnight_utc(start),
            end: midnight_utc(end),
        }
    }
}

impl std::fmt::Display for Period {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

fn first_of_month(year: i32, month: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, 1).expect("first day of month is always valid")
}

fn next_month(date: NaiveDate) -> NaiveDate {
    if date.month() == 12 {
        first_of_month(date.year() + 1, 1)
    } else {
        first_of_month(date.year(), date.month() + 1)
    }
}

fn midnight_utc(date: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&date.and_hms_opt(0, 0, 0).expect("midnight is always valid"))
}

/// Half-open `[start, end)` aggregation window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatsWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

/// Bucket index for the Sunday-first daily breakdown.
pub fn weekday_bucket(instant: &DateTime<Utc>) -> usize {
    instant.weekday().num_days_from_sunday() as usize
}

/// Tenant scope of an aggregation call: a single barber's figures or a whole
/// barbershop's.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatsScope {
    Barber(Uuid),
    Barbershop(Uuid),
}

/// Per-service grouping in the dashboard.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceBreakdown {
    pub service: String,
    pub count: i64,
    pub revenue: f64,
}

/// Per-barber performance row, barbershop scope only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BarberRanking {
    pub barber_id: Uuid,
    pub barber_name: String,
    pub revenue: f64,
    pub distinct_clients: i64,
}

/// Aggregate dashboard payload for one scope and window.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardStats {
    pub period: Period,
    pub window_start: DateTime<Utc>,
    pub window_end: DateTime<Utc>,
    pub confirmed_count: i64,
    pub completed_count: i64,
    pub cancelled_count: i64,
    pub revenue: f64,
    pub distinct_clients: i64,
    /// Completed appointments per weekday, Sunday-first.
    pub daily_completed: [i64; 7],
    /// Integer percentage of completed appointments per payment method.
    /// Sums to at most 100; methods with no appointments report 0.
    pub payment_method_mix: BTreeMap<String, i64>,
    pub top_services: Vec<ServiceBreakdown>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub barber_rankings: Option<Vec<BarberRanking>>,
}
