//! # trt-compliance — Compliance Evaluation
//!
//! The compliance evaluator answers, for an immutable snapshot of the four
//! collections (employees, topics, schedules, attendance records): which
//! applicable topics are *pending* for each employee, and — in refresher
//! mode — how overdue each applicable topic is.
//!
//! ## Model
//!
//! A topic T is applicable to employee E iff T's department equals E's
//! department or T's department is universal. A schedule S satisfies T for
//! E iff E was invited to S, has an attended record for S, and S covers T.
//! T is pending iff no satisfying schedule falls inside the rolling
//! lookback window ending at `as_of`.
//!
//! ## Guarantees
//!
//! - Pure and re-entrant: inputs are never mutated, identical snapshot +
//!   `as_of` + window produce identical output (ordering included).
//! - Total over well-formed snapshots: the only fallible construction is
//!   [`LookbackWindow::new`]. Attendance rows referencing a missing
//!   schedule contribute nothing rather than failing the evaluation.

pub mod evaluator;
pub mod refresher;
pub mod report;
pub mod snapshot;

// Re-export primary types.
pub use evaluator::{
    applicable_topics, pending_for_employee, pending_topics, LookbackWindow, PendingEntry,
};
pub use refresher::{refresher_report, Priority, RefresherEntry, RefresherStatus};
pub use report::{
    attendance_csv, employee_csv, format_date, monthly_csv, pending_csv, refresher_csv,
};
pub use snapshot::{
    AttendanceView, EmployeeView, ScheduleView, SnapshotIndex, TopicView, TrainingSnapshot,
};
