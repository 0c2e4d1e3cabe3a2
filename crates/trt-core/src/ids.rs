//! # Domain Identifiers
//!
//! UUID-backed newtypes for the four persisted collections. Using distinct
//! types per collection means a schedule reference can never be bound where
//! an employee reference is expected — the resolution of raw identifiers
//! happens exactly once, at the storage boundary.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! uuid_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Create a new random identifier.
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Create an identifier from an existing UUID.
            pub fn from_uuid(id: Uuid) -> Self {
                Self(id)
            }

            /// Access the underlying UUID.
            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<Uuid> for $name {
            fn from(id: Uuid) -> Self {
                Self(id)
            }
        }
    };
}

uuid_id! {
    /// Identifier for an employee record.
    EmployeeId
}

uuid_id! {
    /// Identifier for a training topic.
    TopicId
}

uuid_id! {
    /// Identifier for a scheduled training session.
    ScheduleId
}

uuid_id! {
    /// Identifier for an attendance record.
    AttendanceId
}
