//! # Application State
//!
//! Shared state for the API: configuration, the four in-memory stores, and
//! the optional Postgres pool. Stores are authoritative at runtime; when a
//! pool is configured, writes go through to Postgres and the stores are
//! hydrated from it at startup.
//!
//! The stored record types here are the storage shape; [`AppState::snapshot`]
//! converts them into the evaluator's view types, which is the single place
//! where storage records become evaluator input.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use utoipa::ToSchema;

use trt_compliance::{
    AttendanceView, EmployeeView, LookbackWindow, ScheduleView, TopicView, TrainingSnapshot,
};
use trt_core::{
    AttendanceId, Department, EmployeeId, Rating, Role, ScheduleId, TopicId,
};

use crate::auth::AuthConfig;

/// A stored employee.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct EmployeeRecord {
    #[schema(value_type = uuid::Uuid)]
    pub id: EmployeeId,
    pub name: String,
    #[schema(value_type = String)]
    pub department: Department,
    #[schema(value_type = String)]
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A stored training topic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct TopicRecord {
    #[schema(value_type = uuid::Uuid)]
    pub id: TopicId,
    pub title: String,
    #[schema(value_type = String)]
    pub department: Department,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A stored training session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ScheduleRecord {
    #[schema(value_type = uuid::Uuid)]
    pub id: ScheduleId,
    pub date: DateTime<Utc>,
    #[schema(value_type = Vec<uuid::Uuid>)]
    pub topic_ids: Vec<TopicId>,
    #[schema(value_type = Vec<uuid::Uuid>)]
    pub employee_ids: Vec<EmployeeId>,
    pub trainer_name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A stored attendance record. At most one per (schedule, employee) pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct AttendanceRecord {
    #[schema(value_type = uuid::Uuid)]
    pub id: AttendanceId,
    #[schema(value_type = uuid::Uuid)]
    pub schedule_id: ScheduleId,
    #[schema(value_type = uuid::Uuid)]
    pub employee_id: EmployeeId,
    pub attended: bool,
    #[schema(value_type = u8)]
    pub rating: Rating,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Thread-safe in-memory store keyed by typed id.
#[derive(Debug)]
pub struct Store<K, V> {
    inner: Arc<RwLock<HashMap<K, V>>>,
}

impl<K, V> Clone for Store<K, V> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<K, V> Default for Store<K, V> {
    fn default() -> Self {
        Self {
            inner: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

impl<K, V> Store<K, V>
where
    K: std::hash::Hash + Eq + Copy,
    V: Clone,
{
    /// Insert or replace; returns the previous value if present.
    pub fn insert(&self, key: K, value: V) -> Option<V> {
        self.inner.write().insert(key, value)
    }

    /// Insert `value` unless some stored value matches `conflicts`, in
    /// which case the conflicting value is returned instead.
    ///
    /// Check and insert run under one write lock, so two concurrent calls
    /// with the same conflict predicate cannot both insert.
    pub fn insert_unless<F>(&self, key: K, value: V, conflicts: F) -> Result<(), V>
    where
        F: Fn(&V) -> bool,
    {
        let mut guard = self.inner.write();
        if let Some(existing) = guard.values().find(|v| conflicts(v)) {
            return Err(existing.clone());
        }
        guard.insert(key, value);
        Ok(())
    }

    /// Fetch a clone of the value for `key`.
    pub fn get(&self, key: &K) -> Option<V> {
        self.inner.read().get(key).cloned()
    }

    /// Remove the value for `key`, returning it.
    pub fn remove(&self, key: &K) -> Option<V> {
        self.inner.write().remove(key)
    }

    /// Whether `key` is present.
    pub fn contains(&self, key: &K) -> bool {
        self.inner.read().contains_key(key)
    }

    /// Clone out all values, in no particular order.
    pub fn list(&self) -> Vec<V> {
        self.inner.read().values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }
}

/// Service configuration, read from the environment.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    /// Default recency window for compliance evaluation.
    pub lookback: LookbackWindow,
    pub auth: AuthConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            lookback: LookbackWindow::DEFAULT,
            auth: AuthConfig::disabled(),
        }
    }
}

impl AppConfig {
    /// Read configuration from `TRT_PORT`, `TRT_LOOKBACK_DAYS`, and
    /// `TRT_AUTH_TOKENS`. Invalid values fall back to defaults with a
    /// warning rather than refusing to start.
    pub fn from_env() -> Self {
        let port = std::env::var("TRT_PORT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(8080);

        let lookback = match std::env::var("TRT_LOOKBACK_DAYS") {
            Ok(raw) => match raw.parse::<u32>().ok().and_then(|d| LookbackWindow::new(d).ok()) {
                Some(window) => window,
                None => {
                    tracing::warn!(raw = %raw, "invalid TRT_LOOKBACK_DAYS — using 90");
                    LookbackWindow::DEFAULT
                }
            },
            Err(_) => LookbackWindow::DEFAULT,
        };

        let auth = match std::env::var("TRT_AUTH_TOKENS") {
            Ok(raw) => AuthConfig::parse(&raw),
            Err(_) => AuthConfig::disabled(),
        };

        Self {
            port,
            lookback,
            auth,
        }
    }
}

/// Shared application state. Cheap to clone; stores are `Arc`-backed.
#[derive(Debug, Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub employees: Store<EmployeeId, EmployeeRecord>,
    pub topics: Store<TopicId, TopicRecord>,
    pub schedules: Store<ScheduleId, ScheduleRecord>,
    pub attendances: Store<AttendanceId, AttendanceRecord>,
    pub db_pool: Option<PgPool>,
}

impl AppState {
    /// In-memory state with default configuration.
    pub fn new() -> Self {
        Self::with_config(AppConfig::default(), None)
    }

    /// State with explicit configuration and optional Postgres pool.
    pub fn with_config(config: AppConfig, db_pool: Option<PgPool>) -> Self {
        Self {
            config: Arc::new(config),
            employees: Store::default(),
            topics: Store::default(),
            schedules: Store::default(),
            attendances: Store::default(),
            db_pool,
        }
    }

    /// Assemble the evaluator's immutable snapshot from the stores.
    ///
    /// This is the normalization boundary: everything past here speaks in
    /// canonical typed ids and the evaluator never touches the stores.
    pub fn snapshot(&self) -> TrainingSnapshot {
        TrainingSnapshot {
            employees: self
                .employees
                .list()
                .into_iter()
                .map(|e| EmployeeView {
                    id: e.id,
                    name: e.name,
                    department: e.department,
                    role: e.role,
                })
                .collect(),
            topics: self
                .topics
                .list()
                .into_iter()
                .map(|t| TopicView {
                    id: t.id,
                    title: t.title,
                    department: t.department,
                })
                .collect(),
            schedules: self
                .schedules
                .list()
                .into_iter()
                .map(|s| ScheduleView {
                    id: s.id,
                    date: s.date,
                    topic_ids: s.topic_ids,
                    employee_ids: s.employee_ids,
                    trainer_name: s.trainer_name,
                })
                .collect(),
            attendances: self
                .attendances
                .list()
                .into_iter()
                .map(|a| AttendanceView {
                    id: a.id,
                    schedule_id: a.schedule_id,
                    employee_id: a.employee_id,
                    attended: a.attended,
                    rating: a.rating,
                })
                .collect(),
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn employee_record(name: &str) -> EmployeeRecord {
        let now = Utc::now();
        EmployeeRecord {
            id: EmployeeId::new(),
            name: name.into(),
            department: Department::Production,
            role: Role::User,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn store_insert_get_remove() {
        let store: Store<EmployeeId, EmployeeRecord> = Store::default();
        let record = employee_record("Amira");
        assert!(store.insert(record.id, record.clone()).is_none());
        assert_eq!(store.get(&record.id).unwrap().name, "Amira");
        assert_eq!(store.len(), 1);
        assert!(store.remove(&record.id).is_some());
        assert!(store.is_empty());
    }

    #[test]
    fn store_clones_share_data() {
        let store: Store<EmployeeId, EmployeeRecord> = Store::default();
        let clone = store.clone();
        let record = employee_record("Amira");
        store.insert(record.id, record.clone());
        assert!(clone.contains(&record.id));
    }

    #[test]
    fn snapshot_mirrors_stores() {
        let state = AppState::new();
        let record = employee_record("Amira");
        state.employees.insert(record.id, record.clone());

        let snapshot = state.snapshot();
        assert_eq!(snapshot.employees.len(), 1);
        assert_eq!(snapshot.employees[0].id, record.id);
        assert!(snapshot.topics.is_empty());
    }

    fn attendance_record(schedule: ScheduleId, employee: EmployeeId) -> AttendanceRecord {
        let now = Utc::now();
        AttendanceRecord {
            id: AttendanceId::new(),
            schedule_id: schedule,
            employee_id: employee,
            attended: true,
            rating: Rating::new(3).unwrap(),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn insert_unless_returns_conflicting_value() {
        let state = AppState::new();
        let schedule = ScheduleId::new();
        let employee = EmployeeId::new();
        let first = attendance_record(schedule, employee);
        let second = attendance_record(schedule, employee);

        let pair = |a: &AttendanceRecord| a.schedule_id == schedule && a.employee_id == employee;
        assert!(state
            .attendances
            .insert_unless(first.id, first.clone(), pair)
            .is_ok());
        let conflict = state
            .attendances
            .insert_unless(second.id, second, pair)
            .unwrap_err();
        assert_eq!(conflict.id, first.id);
        assert_eq!(state.attendances.len(), 1);
    }

    #[test]
    fn concurrent_pair_inserts_keep_one_record() {
        let state = AppState::new();
        let schedule = ScheduleId::new();
        let employee = EmployeeId::new();

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let attendances = state.attendances.clone();
                std::thread::spawn(move || {
                    let record = attendance_record(schedule, employee);
                    attendances
                        .insert_unless(record.id, record, |a| {
                            a.schedule_id == schedule && a.employee_id == employee
                        })
                        .is_ok()
                })
            })
            .collect();

        let wins = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|&inserted| inserted)
            .count();
        assert_eq!(wins, 1);
        assert_eq!(state.attendances.len(), 1);
    }

    #[test]
    fn default_config_is_open_with_90_day_window() {
        let config = AppConfig::default();
        assert_eq!(config.port, 8080);
        assert_eq!(config.lookback.days(), 90);
        assert!(!config.auth.enabled());
    }
}
