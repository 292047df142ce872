//! Catalog repository (read-only)
//!
//! Lookups over the seeded barbershop/barber/client tables. The booking core
//! uses these for tenant resolution and display names and never writes here.

use anyhow::{Context, Result};
use sqlx::SqliteExecutor;
use uuid::Uuid;

use crate::db::parse_db_timestamp;
use crate::models::{Barber, Barbershop};

#[derive(Debug, sqlx::FromRow)]
struct BarberRow {
    id: String,
    barbershop_id: String,
    display_name: String,
}

#[derive(Debug, sqlx::FromRow)]
struct BarbershopRow {
    id: String,
    name: String,
    created_at: String,
}

pub struct CatalogRepository;

impl CatalogRepository {
    /// Resolve a barber and the barbershop they belong to.
    pub async fn get_barber(
        executor: impl SqliteExecutor<'_>,
        id: Uuid,
    ) -> Result<Option<Barber>> {
        let row = sqlx::query_as::<_, BarberRow>(
            "SELECT id, barbershop_id, display_name FROM barbers WHERE id = ?",
        )
        .bind(id.to_string())
        .fetch_optional(executor)
        .await
        .context("Failed to get barber")?;

        row.map(|row| {
            Ok(Barber {
                id: Uuid::parse_str(&row.id).context("Invalid barber id")?,
                barbershop_id: Uuid::parse_str(&row.barbershop_id)
                    .context("Invalid barbershop id")?,
                display_name: row.display_name,
            })
        })
        .transpose()
    }

    pub async fn get_barbershop(
        executor: impl SqliteExecutor<'_>,
        id: Uuid,
    ) -> Result<Option<Barbershop>> {
        let row = sqlx::query_as::<_, BarbershopRow>(
            "SELECT id, name, created_at FROM barbershops WHERE id = ?",
        )
        .bind(id.to_string())
        .fetch_optional(executor)
        .await
        .context("Failed to get barbershop")?;

        row.map(|row| {
            Ok(Barbershop {
                id: Uuid::parse_str(&row.id).context("Invalid barbershop id")?,
                name: row.name,
                created_at: parse_db_timestamp(&row.created_at),
            })
        })
        .transpose()
    }
}
