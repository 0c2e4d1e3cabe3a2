//! # Pending-Topic Evaluation
//!
//! Set arithmetic over a [`TrainingSnapshot`]: for each employee, the
//! applicable topics minus the topics covered by a qualifying attended
//! session inside the lookback window.
//!
//! A session qualifies for an employee when the employee was invited, has
//! an attended record for it, and the session date is on or after the
//! window cutoff. Attendance rows whose schedule is missing from the
//! snapshot contribute nothing.

use std::collections::HashSet;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use trt_core::{EmployeeId, TopicId, ValidationError};

use crate::snapshot::{EmployeeView, TopicView, TrainingSnapshot};

/// The rolling recency window, in whole days.
///
/// The original deployment mixed "3 calendar months" and a literal 90 days
/// across call sites; this type is the single day-based parameter used
/// everywhere instead (see DESIGN.md).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct LookbackWindow(u32);

impl LookbackWindow {
    /// The default window: 90 days.
    pub const DEFAULT: LookbackWindow = LookbackWindow(90);

    /// Create a window, validating it spans at least one day.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::EmptyLookbackWindow`] for zero days.
    pub fn new(days: u32) -> Result<Self, ValidationError> {
        if days == 0 {
            return Err(ValidationError::EmptyLookbackWindow);
        }
        Ok(Self(days))
    }

    /// The window length in days.
    pub fn days(&self) -> u32 {
        self.0
    }

    /// The earliest session date that still counts, given `as_of`.
    pub fn cutoff(&self, as_of: DateTime<Utc>) -> DateTime<Utc> {
        as_of - Duration::days(i64::from(self.0))
    }
}

impl Default for LookbackWindow {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl<'de> Deserialize<'de> for LookbackWindow {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let days = u32::deserialize(deserializer)?;
        Self::new(days).map_err(serde::de::Error::custom)
    }
}

/// One employee's pending topics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingEntry {
    pub employee: EmployeeView,
    /// Applicable topics without a qualifying attended session inside the
    /// window, ordered by title then id.
    pub pending_topics: Vec<TopicView>,
}

/// Topics applicable to an employee: the employee's own department plus
/// every universal department, ordered by title then id.
pub fn applicable_topics<'a>(
    employee: &EmployeeView,
    topics: &'a [TopicView],
) -> Vec<&'a TopicView> {
    let mut applicable: Vec<&TopicView> = topics
        .iter()
        .filter(|t| t.department == employee.department || t.department.is_universal())
        .collect();
    applicable.sort_by(|a, b| a.title.cmp(&b.title).then(a.id.cmp(&b.id)));
    applicable
}

/// Evaluate pending topics for every employee in the snapshot.
///
/// Employees with no pending topics are omitted; the returned length is
/// therefore the "employees with outstanding training" count. Entries are
/// ordered by employee name then id, so identical inputs produce
/// byte-identical output.
pub fn pending_topics(
    snapshot: &TrainingSnapshot,
    as_of: DateTime<Utc>,
    window: LookbackWindow,
) -> Vec<PendingEntry> {
    let index = snapshot.index();
    let cutoff = window.cutoff(as_of);

    let mut employees: Vec<&EmployeeView> = snapshot.employees.iter().collect();
    employees.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));

    let mut entries = Vec::new();
    for employee in employees {
        let attended_schedules: HashSet<_> = snapshot
            .attendances
            .iter()
            .filter(|a| a.employee_id == employee.id && a.attended)
            .map(|a| a.schedule_id)
            .collect();

        let mut recent_covered: HashSet<TopicId> = HashSet::new();
        for schedule_id in &attended_schedules {
            // Missing schedule: the record contributes nothing.
            let Some(schedule) = index.schedule(*schedule_id) else {
                tracing::debug!(%schedule_id, "attendance references unknown schedule");
                continue;
            };
            if schedule.date >= cutoff && schedule.invited(employee.id) {
                recent_covered.extend(schedule.topic_ids.iter().copied());
            }
        }

        let pending: Vec<TopicView> = applicable_topics(employee, &snapshot.topics)
            .into_iter()
            .filter(|t| !recent_covered.contains(&t.id))
            .cloned()
            .collect();

        if !pending.is_empty() {
            entries.push(PendingEntry {
                employee: employee.clone(),
                pending_topics: pending,
            });
        }
    }
    entries
}

/// Pending topics for a single employee, `None` if everything applicable
/// is current.
pub fn pending_for_employee(
    snapshot: &TrainingSnapshot,
    employee: EmployeeId,
    as_of: DateTime<Utc>,
    window: LookbackWindow,
) -> Option<PendingEntry> {
    pending_topics(snapshot, as_of, window)
        .into_iter()
        .find(|e| e.employee.id == employee)
}


#[cfg(test)]
mod proptests {
    use super::*;
    use crate::snapshot::{AttendanceView, ScheduleView};
    use chrono::TimeZone;
    use proptest::prelude::*;
    use std::collections::{HashMap, HashSet};
    use trt_core::{AttendanceId, Department, Rating, Role, ScheduleId};

    fn as_of() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 6, 1, 12, 0, 0).unwrap()
    }

    /// Schedule spec: (days before as_of, covered topic indices, invited employee indices).
    type ScheduleSpec = (i64, Vec<prop::sample::Index>, Vec<prop::sample::Index>);

    prop_compose! {
        /// A small random snapshot with internally consistent references.
        fn arb_snapshot()(
            emp_depts in prop::collection::vec(0..13usize, 1..5),
            topic_depts in prop::collection::vec(0..13usize, 0..8),
            schedule_specs in prop::collection::vec(
                (
                    0..200i64,
                    prop::collection::vec(any::<prop::sample::Index>(), 0..4),
                    prop::collection::vec(any::<prop::sample::Index>(), 0..4),
                ),
                0..6,
            ),
            attendance_specs in prop::collection::vec(
                (any::<prop::sample::Index>(), any::<prop::sample::Index>(), any::<bool>(), 1..=5u8),
                0..12,
            ),
        ) -> TrainingSnapshot {
            let employees: Vec<EmployeeView> = emp_depts
                .iter()
                .enumerate()
                .map(|(i, d)| EmployeeView {
                    id: EmployeeId::new(),
                    name: format!("employee-{i}"),
                    department: Department::all()[d % 13],
                    role: Role::User,
                })
                .collect();
            let topics: Vec<TopicView> = topic_depts
                .iter()
                .enumerate()
                .map(|(i, d)| TopicView {
                    id: TopicId::new(),
                    title: format!("topic-{i}"),
                    department: Department::all()[d % 13],
                })
                .collect();
            let schedules: Vec<ScheduleView> = schedule_specs
                .iter()
                .map(|(days, topic_ixs, emp_ixs): &ScheduleSpec| ScheduleView {
                    id: ScheduleId::new(),
                    date: as_of() - Duration::days(*days),
                    topic_ids: topic_ixs
                        .iter()
                        .filter_map(|ix| {
                            (!topics.is_empty()).then(|| ix.get(&topics).id)
                        })
                        .collect(),
                    employee_ids: emp_ixs.iter().map(|ix| ix.get(&employees).id).collect(),
                    trainer_name: "trainer".into(),
                })
                .collect();

            let mut seen = HashSet::new();
            let attendances: Vec<AttendanceView> = attendance_specs
                .iter()
                .filter_map(|(s_ix, e_ix, attended, rating)| {
                    if schedules.is_empty() {
                        return None;
                    }
                    let schedule_id = s_ix.get(&schedules).id;
                    let employee_id = e_ix.get(&employees).id;
                    // One record per (schedule, employee) pair.
                    seen.insert((schedule_id, employee_id)).then(|| AttendanceView {
                        id: AttendanceId::new(),
                        schedule_id,
                        employee_id,
                        attended: *attended,
                        rating: Rating::new(*rating).unwrap(),
                    })
                })
                .collect();

            TrainingSnapshot { employees, topics, schedules, attendances }
        }
    }

    fn pending_by_employee(
        snapshot: &TrainingSnapshot,
        window: LookbackWindow,
    ) -> HashMap<EmployeeId, HashSet<TopicId>> {
        pending_topics(snapshot, as_of(), window)
            .into_iter()
            .map(|e| {
                (
                    e.employee.id,
                    e.pending_topics.iter().map(|t| t.id).collect(),
                )
            })
            .collect()
    }

    proptest! {
        /// Pending topics are always a subset of the applicable topics.
        #[test]
        fn pending_is_subset_of_applicable(snapshot in arb_snapshot(), days in 1..400u32) {
            let window = LookbackWindow::new(days).unwrap();
            for entry in pending_topics(&snapshot, as_of(), window) {
                let applicable: HashSet<TopicId> =
                    applicable_topics(&entry.employee, &snapshot.topics)
                        .iter()
                        .map(|t| t.id)
                        .collect();
                for t in &entry.pending_topics {
                    prop_assert!(applicable.contains(&t.id));
                }
            }
        }

        /// Identical snapshot and as_of yield identical output.
        #[test]
        fn evaluation_is_idempotent(snapshot in arb_snapshot(), days in 1..400u32) {
            let window = LookbackWindow::new(days).unwrap();
            let a = pending_topics(&snapshot, as_of(), window);
            let b = pending_topics(&snapshot, as_of(), window);
            prop_assert_eq!(a, b);
        }

        /// A longer window can only shrink (or keep equal) the pending set.
        #[test]
        fn longer_window_never_grows_pending(
            snapshot in arb_snapshot(),
            days in 1..300u32,
            extra in 0..200u32,
        ) {
            let short = pending_by_employee(&snapshot, LookbackWindow::new(days).unwrap());
            let long = pending_by_employee(&snapshot, LookbackWindow::new(days + extra).unwrap());
            for (employee, long_set) in &long {
                let short_set = short.get(employee);
                prop_assert!(
                    short_set.is_some_and(|s| long_set.is_subset(s)),
                    "employee {} gained pending topics with a longer window",
                    employee,
                );
            }
        }

        /// Universal-department topics apply to every employee.
        #[test]
        fn universal_topics_apply_to_everyone(snapshot in arb_snapshot()) {
            let universal: HashSet<TopicId> = snapshot
                .topics
                .iter()
                .filter(|t| t.department.is_universal())
                .map(|t| t.id)
                .collect();
            for employee in &snapshot.employees {
                let applicable: HashSet<TopicId> =
                    applicable_topics(employee, &snapshot.topics)
                        .iter()
                        .map(|t| t.id)
                        .collect();
                prop_assert!(universal.is_subset(&applicable));
            }
        }

        /// The evaluator never mutates its input.
        #[test]
        fn evaluation_never_mutates_snapshot(snapshot in arb_snapshot(), days in 1..400u32) {
            let before = snapshot.clone();
            let _ = pending_topics(&snapshot, as_of(), LookbackWindow::new(days).unwrap());
            prop_assert_eq!(before, snapshot);
        }
    }
}
