//! # Refresher Classification
//!
//! Recency classification per (employee, applicable topic): never trained,
//! overdue, or due soon. Satisfied pairs produce no row. Rows carry the
//! last training date and rating so the exported report reads standalone.
//!
//! Unlike pending evaluation, a qualifying session here is any attended
//! record whose schedule covers the topic — an attendance row already
//! implies participation, so the invited set is not re-checked.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use trt_core::{Department, Rating};

use crate::evaluator::{applicable_topics, LookbackWindow};
use crate::snapshot::TrainingSnapshot;

/// Report priority rank. `Critical` sorts before `High` before `Medium`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Priority {
    Critical,
    High,
    Medium,
}

impl Priority {
    /// Rank value; lower sorts first.
    fn rank(self) -> u8 {
        match self {
            Self::Critical => 0,
            Self::High => 1,
            Self::Medium => 2,
        }
    }

    /// The display string used in reports.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Critical => "Critical",
            Self::High => "High",
            Self::Medium => "Medium",
        }
    }
}

impl PartialOrd for Priority {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Priority {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.rank().cmp(&other.rank())
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Recency state of one (employee, topic) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RefresherStatus {
    /// No attended session has ever covered this topic.
    InitialTrainingRequired,
    /// The last attended session fell out of the window.
    Overdue { days: i64 },
    /// Still inside the window, but within 30 days of falling out.
    DueSoon { days: i64 },
}

impl RefresherStatus {
    /// The display string used in reports
    /// (`"Overdue by N days"` / `"Due in N days"`).
    pub fn describe(&self) -> String {
        match self {
            Self::InitialTrainingRequired => "Initial Training Required".to_string(),
            Self::Overdue { days } => format!("Overdue by {days} days"),
            Self::DueSoon { days } => format!("Due in {days} days"),
        }
    }
}

/// One row of the refresher report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RefresherEntry {
    pub employee_name: String,
    pub department: Department,
    /// Topic title; suffixed with the owning department when the employee
    /// has never trained on it, matching the exported report format.
    pub topic: String,
    /// Date of the most recent attended session covering the topic.
    pub last_training_date: Option<DateTime<Utc>>,
    /// Whole days between `as_of` and the last training date.
    pub days_since: Option<i64>,
    pub status: RefresherStatus,
    pub priority: Priority,
    pub last_rating: Option<Rating>,
}

/// Classify every (employee, applicable topic) pair that needs attention.
///
/// Rows are sorted by priority rank, then employee name, then topic — so
/// the most overdue requirements lead the report and identical snapshots
/// render identically.
pub fn refresher_report(
    snapshot: &TrainingSnapshot,
    as_of: DateTime<Utc>,
    window: LookbackWindow,
) -> Vec<RefresherEntry> {
    let index = snapshot.index();
    let lookback = i64::from(window.days());

    let mut entries = Vec::new();
    for employee in &snapshot.employees {
        for topic in applicable_topics(employee, &snapshot.topics) {
            // Most recent attended session covering this topic, with rating.
            let mut history: Vec<(DateTime<Utc>, Rating)> = snapshot
                .attendances
                .iter()
                .filter(|a| a.employee_id == employee.id && a.attended)
                .filter_map(|a| {
                    let schedule = index.schedule(a.schedule_id)?;
                    schedule.covers(topic.id).then_some((schedule.date, a.rating))
                })
                .collect();
            history.sort_by(|a, b| b.0.cmp(&a.0));

            let entry = match history.first() {
                None => RefresherEntry {
                    employee_name: employee.name.clone(),
                    department: employee.department,
                    topic: format!("{} ({})", topic.title, topic.department),
                    last_training_date: None,
                    days_since: None,
                    status: RefresherStatus::InitialTrainingRequired,
                    priority: Priority::High,
                    last_rating: None,
                },
                Some((last_date, rating)) => {
                    let days_since = (as_of - *last_date).num_days();
                    let (status, priority) = if days_since > lookback {
                        let overdue = days_since - lookback;
                        let priority = if overdue > 30 {
                            Priority::Critical
                        } else {
                            Priority::High
                        };
                        (RefresherStatus::Overdue { days: overdue }, priority)
                    } else if days_since > lookback - 30 {
                        (
                            RefresherStatus::DueSoon {
                                days: lookback - days_since,
                            },
                            Priority::Medium,
                        )
                    } else {
                        continue; // satisfied, no row
                    };
                    RefresherEntry {
                        employee_name: employee.name.clone(),
                        department: employee.department,
                        topic: topic.title.clone(),
                        last_training_date: Some(*last_date),
                        days_since: Some(days_since),
                        status,
                        priority,
                        last_rating: Some(*rating),
                    }
                }
            };
            entries.push(entry);
        }
    }

    entries.sort_by(|a, b| {
        a.priority
            .cmp(&b.priority)
            .then_with(|| a.employee_name.cmp(&b.employee_name))
            .then_with(|| a.topic.cmp(&b.topic))
    });
    entries
}
