//! Attendance persistence operations.
//!
//! The `attendances` table carries a unique constraint on
//! `(schedule_id, employee_id)`, matching the one-record-per-pair rule
//! enforced at the API layer.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use trt_core::Rating;

use crate::state::AttendanceRecord;

/// Insert or replace an attendance record.
pub async fn upsert(pool: &PgPool, record: &AttendanceRecord) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO attendances (id, schedule_id, employee_id, attended, rating,
         created_at, updated_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7)
         ON CONFLICT (id) DO UPDATE SET
           attended = EXCLUDED.attended,
           rating = EXCLUDED.rating,
           updated_at = EXCLUDED.updated_at",
    )
    .bind(record.id.as_uuid())
    .bind(record.schedule_id.as_uuid())
    .bind(record.employee_id.as_uuid())
    .bind(record.attended)
    .bind(i16::from(record.rating.value()))
    .bind(record.created_at)
    .bind(record.updated_at)
    .execute(pool)
    .await?;

    Ok(())
}

/// Delete an attendance record by id. Returns whether a row was removed.
pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM attendances WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

/// Load all attendance records into the in-memory store on startup.
pub async fn load_all(pool: &PgPool) -> Result<Vec<AttendanceRecord>, sqlx::Error> {
    let rows = sqlx::query_as::<_, AttendanceRow>(
        "SELECT id, schedule_id, employee_id, attended, rating, created_at, updated_at
         FROM attendances ORDER BY created_at",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().filter_map(AttendanceRow::into_record).collect())
}

/// Internal row type for SQLx mapping.
#[derive(sqlx::FromRow)]
struct AttendanceRow {
    id: Uuid,
    schedule_id: Uuid,
    employee_id: Uuid,
    attended: bool,
    rating: i16,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl AttendanceRow {
    fn into_record(self) -> Option<AttendanceRecord> {
        let rating = match u8::try_from(self.rating).ok().and_then(|r| Rating::new(r).ok()) {
            Some(r) => r,
            None => {
                tracing::warn!(id = %self.id, rating = self.rating,
                    "skipping attendance row with out-of-range rating");
                return None;
            }
        };
        Some(AttendanceRecord {
            id: self.id.into(),
            schedule_id: self.schedule_id.into(),
            employee_id: self.employee_id.into(),
            attended: self.attended,
            rating,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}
