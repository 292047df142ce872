//! Slot registry repository
//!
//! Owns the set of bookable (barber, instant) pairs. The uniqueness of a pair
//! is enforced by the schema; callers decide how a violation surfaces.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqliteExecutor};
use uuid::Uuid;

use crate::db::{fmt_instant, parse_db_timestamp};
use crate::models::Slot;

#[derive(Debug, sqlx::FromRow)]
struct SlotRow {
    id: String,
    barber_id: String,
    instant: String,
    is_available: i64,
    created_at: String,
}

fn row_to_slot(row: SlotRow) -> Result<Slot> {
    Ok(Slot {
        id: Uuid::parse_str(&row.id).context("Invalid slot id")?,
        barber_id: Uuid::parse_str(&row.barber_id).context("Invalid barber id")?,
        instant: parse_db_timestamp(&row.instant),
        is_available: row.is_available != 0,
        created_at: parse_db_timestamp(&row.created_at),
    })
}

pub struct SlotRepository;

impl SlotRepository {
    /// Insert a new slot. Fails on a duplicate (barber, instant) pair via the
    /// schema's unique constraint.
    pub async fn create(
        executor: impl SqliteExecutor<'_>,
        barber_id: Uuid,
        instant: DateTime<Utc>,
    ) -> Result<Slot> {
        let row = sqlx::query_as::<_, SlotRow>(
            r#"
            INSERT INTO slots (id, barber_id, instant, is_available, created_at)
            VALUES (?, ?, ?, 1, ?)
            RETURNING id, barber_id, instant, is_available, created_at
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(barber_id.to_string())
        .bind(fmt_instant(&instant))
        .bind(Utc::now().to_rfc3339())
        .fetch_one(executor)
        .await
        .context("Failed to create slot")?;

        row_to_slot(row)
    }

    /// Insert a batch of slots, silently skipping instants the barber has
    /// already opened. Returns only the newly created slots.
    pub async fn create_batch(
        conn: &mut SqliteConnection,
        barber_id: Uuid,
        instants: &[DateTime<Utc>],
    ) -> Result<Vec<Slot>> {
        let mut created = Vec::new();
        for instant in instants {
            if Self::find_by_pair(&mut *conn, barber_id, *instant)
                .await?
                .is_some()
            {
                continue;
            }
            created.push(Self::create(&mut *conn, barber_id, *instant).await?);
        }
        Ok(created)
    }

    pub async fn get_by_id(
        executor: impl SqliteExecutor<'_>,
        id: Uuid,
    ) -> Result<Option<Slot>> {
        let row = sqlx::query_as::<_, SlotRow>(
            r#"
            SELECT id, barber_id, instant, is_available, created_at
            FROM slots
            WHERE id = ?
            "#,
        )
        .bind(id.to_string())
        .fetch_optional(executor)
        .await
        .context("Failed to get slot")?;

        row.map(row_to_slot).transpose()
    }

    /// Lookup by the unique (barber, instant) pair, used for conflict checks.
    pub async fn find_by_pair(
        executor: impl SqliteExecutor<'_>,
        barber_id: Uuid,
        instant: DateTime<Utc>,
    ) -> Result<Option<Slot>> {
        let row = sqlx::query_as::<_, SlotRow>(
            r#"
            SELECT id, barber_id, instant, is_available, created_at
            FROM slots
            WHERE barber_id = ? AND instant = ?
            "#,
        )
        .bind(barber_id.to_string())
        .bind(fmt_instant(&instant))
        .fetch_optional(executor)
        .await
        .context("Failed to find slot")?;

        row.map(row_to_slot).transpose()
    }

    /// Direct availability toggle. Returns false when the slot does not exist.
    pub async fn set_availability(
        executor: impl SqliteExecutor<'_>,
        id: Uuid,
        is_available: bool,
    ) -> Result<bool> {
        let result = sqlx::query("UPDATE slots SET is_available = ? WHERE id = ?")
            .bind(i64::from(is_available))
            .bind(id.to_string())
            .execute(executor)
            .await
            .context("Failed to update slot availability")?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn delete(executor: impl SqliteExecutor<'_>, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM slots WHERE id = ?")
            .bind(id.to_string())
            .execute(executor)
            .await
            .context("Failed to delete slot")?;

        Ok(result.rows_affected() > 0)
    }

    /// All of a barber's slots, claimed ones included.
    pub async fn list_for_barber(
        executor: impl SqliteExecutor<'_>,
        barber_id: Uuid,
    ) -> Result<Vec<Slot>> {
        let rows = sqlx::query_as::<_, SlotRow>(
            r#"
            SELECT id, barber_id, instant, is_available, created_at
            FROM slots
            WHERE barber_id = ?
            ORDER BY instant
            "#,
        )
        .bind(barber_id.to_string())
        .fetch_all(executor)
        .await
        .context("Failed to list slots")?;

        rows.into_iter().map(row_to_slot).collect()
    }

    /// Open slots a client can still book, starting from the given instant.
    pub async fn list_available_from(
        executor: impl SqliteExecutor<'_>,
        barber_id: Uuid,
        from: DateTime<Utc>,
    ) -> Result<Vec<Slot>> {
        let rows = sqlx::query_as::<_, SlotRow>(
            r#"
            SELECT id, barber_id, instant, is_available, created_at
            FROM slots
            WHERE barber_id = ? AND is_available = 1 AND instant >= ?
            ORDER BY instant
            "#,
        )
        .bind(barber_id.to_string())
        .bind(fmt_instant(&from))
        .fetch_all(executor)
        .await
        .context("Failed to list available slots")?;

        rows.into_iter().map(row_to_slot).collect()
    }
}
