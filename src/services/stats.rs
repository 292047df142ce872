//! Statistics service
//!
//! Stateless, read-only aggregation over the appointment ledger for one scope
//! (a barber or a whole barbershop) and a half-open UTC window. Nothing is
//! cached; every call recomputes from the current ledger contents.

use std::collections::BTreeMap;

use anyhow::{Context, Result};
use chrono::Utc;
use uuid::Uuid;

use crate::db::{fmt_instant, parse_db_timestamp, DbPool};
use crate::models::{
    weekday_bucket, AppointmentStatus, BarberRanking, DashboardStats, Period, ServiceBreakdown,
    StatsScope, StatsWindow,
};
use crate::utils::validation::PAYMENT_METHODS;

pub struct StatsService {
    pool: DbPool,
}

impl StatsService {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Assemble the full dashboard payload for one scope and period.
    ///
    /// Barber rankings are only meaningful barbershop-wide and are omitted
    /// for a single barber's scope.
    pub async fn dashboard(&self, scope: StatsScope, period: Period) -> Result<DashboardStats> {
        let window = period.resolve(Utc::now());

        let confirmed_count = self
            .count_by_status(scope, window, AppointmentStatus::Confirmed)
            .await?;
        let completed_count = self
            .count_by_status(scope, window, AppointmentStatus::Completed)
            .await?;
        let cancelled_count = self
            .count_by_status(scope, window, AppointmentStatus::Cancelled)
            .await?;
        let revenue = self.sum_revenue(scope, window).await?;
        let distinct_clients = self.distinct_client_count(scope, window).await?;
        let daily_completed = self.daily_breakdown(scope, window).await?;
        let payment_method_mix = self.payment_method_mix(scope, window).await?;
        let top_services = self.top_services(scope, window, 5).await?;

        let barber_rankings = match scope {
            StatsScope::Barbershop(_) => Some(self.rank_barbers(scope, window, 10).await?),
            StatsScope::Barber(_) => None,
        };

        Ok(DashboardStats {
            period,
            window_start: window.start,
            window_end: window.end,
            confirmed_count,
            completed_count,
            cancelled_count,
            revenue,
            distinct_clients,
            daily_completed,
            payment_method_mix,
            top_services,
            barber_rankings,
        })
    }

    pub async fn count_by_status(
        &self,
        scope: StatsScope,
        window: StatsWindow,
        status: AppointmentStatus,
    ) -> Result<i64> {
        let (column, id) = scope_filter(scope);
        let count = sqlx::query_scalar::<_, i64>(&format!(
            "SELECT COUNT(*) FROM appointments \
             WHERE {column} = ? AND status = ? AND instant >= ? AND instant < ?"
        ))
        .bind(id.to_string())
        .bind(status.as_str())
        .bind(fmt_instant(&window.start))
        .bind(fmt_instant(&window.end))
        .fetch_one(&self.pool)
        .await
        .context("Failed to count appointments")?;

        Ok(count)
    }

    /// Revenue from completed appointments. A NULL price counts as zero.
    pub async fn sum_revenue(&self, scope: StatsScope, window: StatsWindow) -> Result<f64> {
        let (column, id) = scope_filter(scope);
        let revenue = sqlx::query_scalar::<_, f64>(&format!(
            "SELECT CAST(COALESCE(SUM(service_price), 0) AS REAL) FROM appointments \
             WHERE {column} = ? AND status = 'completed' AND instant >= ? AND instant < ?"
        ))
        .bind(id.to_string())
        .bind(fmt_instant(&window.start))
        .bind(fmt_instant(&window.end))
        .fetch_one(&self.pool)
        .await
        .context("Failed to sum revenue")?;

        Ok(revenue)
    }

    /// Distinct clients served (completed appointments) in the window.
    pub async fn distinct_client_count(
        &self,
        scope: StatsScope,
        window: StatsWindow,
    ) -> Result<i64> {
        let (column, id) = scope_filter(scope);
        let count = sqlx::query_scalar::<_, i64>(&format!(
            "SELECT COUNT(DISTINCT client_id) FROM appointments \
             WHERE {column} = ? AND status = 'completed' AND instant >= ? AND instant < ?"
        ))
        .bind(id.to_string())
        .bind(fmt_instant(&window.start))
        .bind(fmt_instant(&window.end))
        .fetch_one(&self.pool)
        .await
        .context("Failed to count distinct clients")?;

        Ok(count)
    }

    /// Completed appointments per weekday, Sunday-first.
    pub async fn daily_breakdown(
        &self,
        scope: StatsScope,
        window: StatsWindow,
    ) -> Result<[i64; 7]> {
        let (column, id) = scope_filter(scope);
        let instants = sqlx::query_scalar::<_, String>(&format!(
            "SELECT instant FROM appointments \
             WHERE {column} = ? AND status = 'completed' AND instant >= ? AND instant < ?"
        ))
        .bind(id.to_string())
        .bind(fmt_instant(&window.start))
        .bind(fmt_instant(&window.end))
        .fetch_all(&self.pool)
        .await
        .context("Failed to load instants for daily breakdown")?;

        let mut buckets = [0i64; 7];
        for instant in &instants {
            let parsed = parse_db_timestamp(instant);
            buckets[weekday_bucket(&parsed)] += 1;
        }

        Ok(buckets)
    }

    /// Integer percentage of completed appointments per payment method.
    ///
    /// The denominator is every completed appointment in the window, so an
    /// appointment without a recorded method dilutes the percentages and the
    /// total stays at or below 100. An empty window yields an all-zero map.
    pub async fn payment_method_mix(
        &self,
        scope: StatsScope,
        window: StatsWindow,
    ) -> Result<BTreeMap<String, i64>> {
        let (column, id) = scope_filter(scope);
        let rows = sqlx::query_as::<_, (Option<String>, i64)>(&format!(
            "SELECT payment_method, COUNT(*) FROM appointments \
             WHERE {column} = ? AND status = 'completed' AND instant >= ? AND instant < ? \
             GROUP BY payment_method"
        ))
        .bind(id.to_string())
        .bind(fmt_instant(&window.start))
        .bind(fmt_instant(&window.end))
        .fetch_all(&self.pool)
        .await
        .context("Failed to group payment methods")?;

        let total: i64 = rows.iter().map(|(_, count)| count).sum();

        let mut mix: BTreeMap<String, i64> = PAYMENT_METHODS
            .iter()
            .map(|method| (method.to_string(), 0))
            .collect();

        if total == 0 {
            return Ok(mix);
        }

        for (method, count) in rows {
            if let Some(method) = method {
                mix.insert(method, count * 100 / total);
            }
        }

        Ok(mix)
    }

    /// Most-requested services among completed appointments, by count.
    /// Tie order is whatever the store yields.
    pub async fn top_services(
        &self,
        scope: StatsScope,
        window: StatsWindow,
        limit: i64,
    ) -> Result<Vec<ServiceBreakdown>> {
        let (column, id) = scope_filter(scope);
        let rows = sqlx::query_as::<_, (String, i64, f64)>(&format!(
            "SELECT service_type, COUNT(*) AS appointment_count, \
                    CAST(COALESCE(SUM(service_price), 0) AS REAL) AS revenue \
             FROM appointments \
             WHERE {column} = ? AND status = 'completed' AND instant >= ? AND instant < ? \
             GROUP BY service_type \
             ORDER BY appointment_count DESC \
             LIMIT ?"
        ))
        .bind(id.to_string())
        .bind(fmt_instant(&window.start))
        .bind(fmt_instant(&window.end))
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .context("Failed to group services")?;

        Ok(rows
            .into_iter()
            .map(|(service, count, revenue)| ServiceBreakdown {
                service,
                count,
                revenue,
            })
            .collect())
    }

    /// Barber performance over completed appointments, by revenue.
    pub async fn rank_barbers(
        &self,
        scope: StatsScope,
        window: StatsWindow,
        limit: i64,
    ) -> Result<Vec<BarberRanking>> {
        let (column, id) = scope_filter(scope);
        let rows = sqlx::query_as::<_, (String, String, f64, i64)>(&format!(
            "SELECT a.barber_id, COALESCE(b.display_name, '') AS barber_name, \
                    CAST(COALESCE(SUM(a.service_price), 0) AS REAL) AS revenue, \
                    COUNT(DISTINCT a.client_id) AS distinct_clients \
             FROM appointments a \
             LEFT JOIN barbers b ON b.id = a.barber_id \
             WHERE a.{column} = ? AND a.status = 'completed' \
               AND a.instant >= ? AND a.instant < ? \
             GROUP BY a.barber_id \
             ORDER BY revenue DESC \
             LIMIT ?"
        ))
        .bind(id.to_string())
        .bind(fmt_instant(&window.start))
        .bind(fmt_instant(&window.end))
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .context("Failed to rank barbers")?;

        rows.into_iter()
            .map(|(barber_id, barber_name, revenue, distinct_clients)| {
                Ok(BarberRanking {
                    barber_id: Uuid::parse_str(&barber_id).context("Invalid barber id")?,
                    barber_name,
                    revenue,
                    distinct_clients,
                })
            })
            .collect()
    }
}

fn scope_filter(scope: StatsScope) -> (&'static str, Uuid) {
    match scope {
        StatsScope::Barber(id) => ("barber_id", id),
        StatsScope::Barbershop(id) => ("barbershop_id", id),
    }
}
