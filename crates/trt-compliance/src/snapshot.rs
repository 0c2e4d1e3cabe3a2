//! # Training Snapshot
//!
//! The immutable input bundle for the evaluator. Every cross-collection
//! reference is a canonical typed id — resolving embedded objects, raw
//! strings, or other storage-shaped references into these ids is the
//! caller's job and happens exactly once, at this boundary. Nothing inside
//! the evaluator re-resolves references.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use trt_core::{AttendanceId, Department, EmployeeId, Rating, Role, ScheduleId, TopicId};

/// An employee as seen by the evaluator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmployeeView {
    pub id: EmployeeId,
    pub name: String,
    pub department: Department,
    pub role: Role,
}

/// A training topic as seen by the evaluator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopicView {
    pub id: TopicId,
    pub title: String,
    /// Owning department; universal departments apply to everyone.
    pub department: Department,
}

/// A scheduled training session as seen by the evaluator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleView {
    pub id: ScheduleId,
    pub date: DateTime<Utc>,
    /// Topics covered by this session.
    pub topic_ids: Vec<TopicId>,
    /// Employees invited to this session.
    pub employee_ids: Vec<EmployeeId>,
    pub trainer_name: String,
}

impl ScheduleView {
    /// Whether this schedule covers the given topic.
    pub fn covers(&self, topic: TopicId) -> bool {
        self.topic_ids.contains(&topic)
    }

    /// Whether the given employee was invited to this session.
    pub fn invited(&self, employee: EmployeeId) -> bool {
        self.employee_ids.contains(&employee)
    }
}

/// An attendance record as seen by the evaluator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttendanceView {
    pub id: AttendanceId,
    pub schedule_id: ScheduleId,
    pub employee_id: EmployeeId,
    pub attended: bool,
    pub rating: Rating,
}

/// An immutable snapshot of the four collections.
///
/// The evaluator reads a snapshot, never writes one. Collections are small
/// and memory-resident; evaluation is naive set arithmetic over them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrainingSnapshot {
    pub employees: Vec<EmployeeView>,
    pub topics: Vec<TopicView>,
    pub schedules: Vec<ScheduleView>,
    pub attendances: Vec<AttendanceView>,
}

impl TrainingSnapshot {
    /// Build the id→record lookup index over this snapshot.
    pub fn index(&self) -> SnapshotIndex<'_> {
        SnapshotIndex::new(self)
    }
}

/// Borrowed id→record lookups over a [`TrainingSnapshot`].
///
/// Built once per evaluation; a dangling reference (attendance row whose
/// schedule is absent from the snapshot) simply resolves to `None` and the
/// row contributes nothing.
#[derive(Debug)]
pub struct SnapshotIndex<'a> {
    schedules: HashMap<ScheduleId, &'a ScheduleView>,
    topics: HashMap<TopicId, &'a TopicView>,
}

impl<'a> SnapshotIndex<'a> {
    fn new(snapshot: &'a TrainingSnapshot) -> Self {
        Self {
            schedules: snapshot.schedules.iter().map(|s| (s.id, s)).collect(),
            topics: snapshot.topics.iter().map(|t| (t.id, t)).collect(),
        }
    }

    /// Resolve a schedule reference.
    pub fn schedule(&self, id: ScheduleId) -> Option<&'a ScheduleView> {
        self.schedules.get(&id).copied()
    }

    /// Resolve a topic reference.
    pub fn topic(&self, id: TopicId) -> Option<&'a TopicView> {
        self.topics.get(&id).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot_with_one_of_each() -> TrainingSnapshot {
        let employee = EmployeeView {
            id: EmployeeId::new(),
            name: "Amira".into(),
            department: Department::Production,
            role: Role::User,
        };
        let topic = TopicView {
            id: TopicId::new(),
            title: "Machine Guarding".into(),
            department: Department::Production,
        };
        let schedule = ScheduleView {
            id: ScheduleId::new(),
            date: Utc::now(),
            topic_ids: vec![topic.id],
            employee_ids: vec![employee.id],
            trainer_name: "Khan".into(),
        };
        let attendance = AttendanceView {
            id: AttendanceId::new(),
            schedule_id: schedule.id,
            employee_id: employee.id,
            attended: true,
            rating: Rating::new(4).unwrap(),
        };
        TrainingSnapshot {
            employees: vec![employee],
            topics: vec![topic],
            schedules: vec![schedule],
            attendances: vec![attendance],
        }
    }

    #[test]
    fn index_resolves_known_ids() {
        let snapshot = snapshot_with_one_of_each();
        let index = snapshot.index();
        let schedule = &snapshot.schedules[0];
        assert_eq!(index.schedule(schedule.id).unwrap().id, schedule.id);
        assert_eq!(index.topic(snapshot.topics[0].id).unwrap().title, "Machine Guarding");
    }

    #[test]
    fn index_returns_none_for_dangling_refs() {
        let snapshot = snapshot_with_one_of_each();
        let index = snapshot.index();
        assert!(index.schedule(ScheduleId::new()).is_none());
        assert!(index.topic(TopicId::new()).is_none());
    }

    #[test]
    fn schedule_coverage_and_invitation() {
        let snapshot = snapshot_with_one_of_each();
        let schedule = &snapshot.schedules[0];
        assert!(schedule.covers(snapshot.topics[0].id));
        assert!(!schedule.covers(TopicId::new()));
        assert!(schedule.invited(snapshot.employees[0].id));
        assert!(!schedule.invited(EmployeeId::new()));
    }
}
