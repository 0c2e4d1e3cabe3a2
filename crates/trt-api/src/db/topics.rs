//! Training topic persistence operations.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use trt_core::Department;

use crate::state::TopicRecord;

/// Insert or replace a topic record.
pub async fn upsert(pool: &PgPool, record: &TopicRecord) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO topics (id, title, department, created_at, updated_at)
         VALUES ($1, $2, $3, $4, $5)
         ON CONFLICT (id) DO UPDATE SET
           title = EXCLUDED.title,
           department = EXCLUDED.department,
           updated_at = EXCLUDED.updated_at",
    )
    .bind(record.id.as_uuid())
    .bind(&record.title)
    .bind(record.department.as_str())
    .bind(record.created_at)
    .bind(record.updated_at)
    .execute(pool)
    .await?;

    Ok(())
}

/// Delete a topic by id. Returns whether a row was removed.
pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM topics WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

/// Load all topics into the in-memory store on startup.
pub async fn load_all(pool: &PgPool) -> Result<Vec<TopicRecord>, sqlx::Error> {
    let rows = sqlx::query_as::<_, TopicRow>(
        "SELECT id, title, department, created_at, updated_at
         FROM topics ORDER BY created_at",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().filter_map(TopicRow::into_record).collect())
}

/// Internal row type for SQLx mapping.
#[derive(sqlx::FromRow)]
struct TopicRow {
    id: Uuid,
    title: String,
    department: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TopicRow {
    fn into_record(self) -> Option<TopicRecord> {
        let department = match Department::parse(&self.department) {
            Ok(d) => d,
            Err(_) => {
                tracing::warn!(id = %self.id, department = %self.department,
                    "skipping topic row with unknown department");
                return None;
            }
        };
        Some(TopicRecord {
            id: self.id.into(),
            title: self.title,
            department,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}
