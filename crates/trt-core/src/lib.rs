//! # trt-core — Foundational Types for the Training Tracker
//!
//! The shared vocabulary of the training tracker: UUID-backed identifier
//! newtypes, the fixed department catalog with its universal subset, the
//! role/permission matrix, attendance ratings, and the structured
//! validation error hierarchy.
//!
//! This crate has no I/O and no async. Everything downstream — the
//! compliance evaluator and the API layer — speaks in these types, so a
//! reference that reaches the evaluator is already a canonical typed id
//! rather than an ad hoc string.

pub mod department;
pub mod error;
pub mod ids;
pub mod rating;

// Re-export primary types.
pub use department::{Department, Role};
pub use error::ValidationError;
pub use ids::{AttendanceId, EmployeeId, ScheduleId, TopicId};
pub use rating::Rating;
