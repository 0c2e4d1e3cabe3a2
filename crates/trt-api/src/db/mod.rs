//! # Database Persistence Layer
//!
//! Postgres persistence via SQLx.
//!
//! The database layer is **optional**. When `DATABASE_URL` is set, the API
//! persists employees, topics, schedules, and attendance records and
//! rehydrates the in-memory stores from Postgres at startup. When absent,
//! the API operates in in-memory-only mode (suitable for development and
//! testing).
//!
//! Writes go through the in-memory store first and then to Postgres; a
//! persistence failure fails the request so the two never diverge silently.

pub mod attendances;
pub mod employees;
pub mod schedules;
pub mod topics;

use sqlx::postgres::{PgPool, PgPoolOptions};

use crate::state::AppState;

/// Initialize the database connection pool and run migrations.
///
/// Returns `None` if `DATABASE_URL` is not set (in-memory-only mode).
/// Returns `Err` if the URL is set but the connection or migration fails.
pub async fn init_pool() -> Result<Option<PgPool>, sqlx::Error> {
    let url = match std::env::var("DATABASE_URL") {
        Ok(url) => url,
        Err(_) => {
            tracing::warn!(
                "DATABASE_URL not set — running in-memory only mode. \
                 State will not survive restarts."
            );
            return Ok(None);
        }
    };

    let pool = PgPoolOptions::new()
        .max_connections(20)
        .min_connections(2)
        .acquire_timeout(std::time::Duration::from_secs(5))
        .connect(&url)
        .await?;

    tracing::info!("Connected to PostgreSQL");

    sqlx::migrate!("./migrations").run(&pool).await?;
    tracing::info!("Database migrations applied");

    Ok(Some(pool))
}

/// Rehydrate all in-memory stores from Postgres at startup.
pub async fn hydrate(pool: &PgPool, state: &AppState) -> Result<(), sqlx::Error> {
    for record in employees::load_all(pool).await? {
        state.employees.insert(record.id, record);
    }
    for record in topics::load_all(pool).await? {
        state.topics.insert(record.id, record);
    }
    for record in schedules::load_all(pool).await? {
        state.schedules.insert(record.id, record);
    }
    for record in attendances::load_all(pool).await? {
        state.attendances.insert(record.id, record);
    }

    tracing::info!(
        employees = state.employees.len(),
        topics = state.topics.len(),
        schedules = state.schedules.len(),
        attendances = state.attendances.len(),
        "Hydrated in-memory stores from database"
    );
    Ok(())
}
