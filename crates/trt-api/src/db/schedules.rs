//! Training schedule persistence operations.
//!
//! Invited topic and employee sets are stored as `uuid[]` columns; the
//! referential checks against those sets happen at the API layer on write.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use trt_core::{EmployeeId, TopicId};

use crate::state::ScheduleRecord;

/// Insert or replace a schedule record.
pub async fn upsert(pool: &PgPool, record: &ScheduleRecord) -> Result<(), sqlx::Error> {
    let topic_ids: Vec<Uuid> = record.topic_ids.iter().map(|t| *t.as_uuid()).collect();
    let employee_ids: Vec<Uuid> = record.employee_ids.iter().map(|e| *e.as_uuid()).collect();

    sqlx::query(
        "INSERT INTO schedules (id, date, topic_ids, employee_ids, trainer_name,
         created_at, updated_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7)
         ON CONFLICT (id) DO UPDATE SET
           date = EXCLUDED.date,
           topic_ids = EXCLUDED.topic_ids,
           employee_ids = EXCLUDED.employee_ids,
           trainer_name = EXCLUDED.trainer_name,
           updated_at = EXCLUDED.updated_at",
    )
    .bind(record.id.as_uuid())
    .bind(record.date)
    .bind(&topic_ids)
    .bind(&employee_ids)
    .bind(&record.trainer_name)
    .bind(record.created_at)
    .bind(record.updated_at)
    .execute(pool)
    .await?;

    Ok(())
}

/// Delete a schedule by id. Returns whether a row was removed.
pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM schedules WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

/// Load all schedules into the in-memory store on startup.
pub async fn load_all(pool: &PgPool) -> Result<Vec<ScheduleRecord>, sqlx::Error> {
    let rows = sqlx::query_as::<_, ScheduleRow>(
        "SELECT id, date, topic_ids, employee_ids, trainer_name, created_at, updated_at
         FROM schedules ORDER BY date",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(ScheduleRow::into_record).collect())
}

/// Internal row type for SQLx mapping.
#[derive(sqlx::FromRow)]
struct ScheduleRow {
    id: Uuid,
    date: DateTime<Utc>,
    topic_ids: Vec<Uuid>,
    employee_ids: Vec<Uuid>,
    trainer_name: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl ScheduleRow {
    fn into_record(self) -> ScheduleRecord {
        ScheduleRecord {
            id: self.id.into(),
            date: self.date,
            topic_ids: self.topic_ids.into_iter().map(TopicId::from).collect(),
            employee_ids: self.employee_ids.into_iter().map(EmployeeId::from).collect(),
            trainer_name: self.trainer_name,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}
