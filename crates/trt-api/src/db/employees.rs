//! Employee persistence operations.
//!
//! All functions take a `&PgPool` and operate on the `employees` table.
//! Department and role are stored as their canonical text forms.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use trt_core::{Department, Role};

use crate::state::EmployeeRecord;

/// Insert or replace an employee record.
pub async fn upsert(pool: &PgPool, record: &EmployeeRecord) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO employees (id, name, department, role, created_at, updated_at)
         VALUES ($1, $2, $3, $4, $5, $6)
         ON CONFLICT (id) DO UPDATE SET
           name = EXCLUDED.name,
           department = EXCLUDED.department,
           role = EXCLUDED.role,
           updated_at = EXCLUDED.updated_at",
    )
    .bind(record.id.as_uuid())
    .bind(&record.name)
    .bind(record.department.as_str())
    .bind(record.role.as_str())
    .bind(record.created_at)
    .bind(record.updated_at)
    .execute(pool)
    .await?;

    Ok(())
}

/// Delete an employee by id. Returns whether a row was removed.
pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM employees WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

/// Load all employees into the in-memory store on startup.
///
/// Rows whose department or role text no longer parses are skipped with a
/// warning rather than aborting startup.
pub async fn load_all(pool: &PgPool) -> Result<Vec<EmployeeRecord>, sqlx::Error> {
    let rows = sqlx::query_as::<_, EmployeeRow>(
        "SELECT id, name, department, role, created_at, updated_at
         FROM employees ORDER BY created_at",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().filter_map(EmployeeRow::into_record).collect())
}

/// Internal row type for SQLx mapping.
#[derive(sqlx::FromRow)]
struct EmployeeRow {
    id: Uuid,
    name: String,
    department: String,
    role: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl EmployeeRow {
    fn into_record(self) -> Option<EmployeeRecord> {
        let department = match Department::parse(&self.department) {
            Ok(d) => d,
            Err(_) => {
                tracing::warn!(id = %self.id, department = %self.department,
                    "skipping employee row with unknown department");
                return None;
            }
        };
        let role = match Role::parse(&self.role) {
            Ok(r) => r,
            Err(_) => {
                tracing::warn!(id = %self.id, role = %self.role,
                    "skipping employee row with unknown role");
                return None;
            }
        };
        Some(EmployeeRecord {
            id: self.id.into(),
            name: self.name,
            department,
            role,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}
