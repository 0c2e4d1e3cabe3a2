//! # Departments & Roles
//!
//! The fixed department catalog and the access-control roles. Both are
//! closed enums: adding a department is a compile error until every
//! exhaustive `match` is updated, which keeps the universal subset and the
//! wire strings in one place.
//!
//! ## Universal departments
//!
//! Three departments — Top Management, HSE, HR — are *universal*: a topic
//! owned by any of them applies to every employee regardless of the
//! employee's own department. All other topics apply only within their
//! owning department.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// A department in the fixed organizational catalog.
///
/// Wire strings match the original catalog exactly (`"Top Management"`,
/// `"Quality Control"`, ...), so exported reports and stored rows stay
/// readable by the systems that consume them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Department {
    #[serde(rename = "Top Management")]
    TopManagement,
    Marketing,
    Purchase,
    Store,
    Warehouse,
    Maintenance,
    Production,
    #[serde(rename = "Quality Control")]
    QualityControl,
    #[serde(rename = "HSE")]
    Hse,
    #[serde(rename = "HR")]
    Hr,
    Dispatch,
    #[serde(rename = "IT")]
    It,
    Accounts,
}

impl Department {
    /// All departments, in catalog order.
    pub fn all() -> &'static [Department] {
        &[
            Self::TopManagement,
            Self::Marketing,
            Self::Purchase,
            Self::Store,
            Self::Warehouse,
            Self::Maintenance,
            Self::Production,
            Self::QualityControl,
            Self::Hse,
            Self::Hr,
            Self::Dispatch,
            Self::It,
            Self::Accounts,
        ]
    }

    /// The canonical display/wire string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TopManagement => "Top Management",
            Self::Marketing => "Marketing",
            Self::Purchase => "Purchase",
            Self::Store => "Store",
            Self::Warehouse => "Warehouse",
            Self::Maintenance => "Maintenance",
            Self::Production => "Production",
            Self::QualityControl => "Quality Control",
            Self::Hse => "HSE",
            Self::Hr => "HR",
            Self::Dispatch => "Dispatch",
            Self::It => "IT",
            Self::Accounts => "Accounts",
        }
    }

    /// Whether topics owned by this department apply to every employee.
    pub fn is_universal(&self) -> bool {
        matches!(self, Self::TopManagement | Self::Hse | Self::Hr)
    }

    /// Parse a department from its canonical string.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::UnknownDepartment`] for anything outside
    /// the catalog.
    pub fn parse(value: &str) -> Result<Self, ValidationError> {
        Self::all()
            .iter()
            .copied()
            .find(|d| d.as_str() == value)
            .ok_or_else(|| ValidationError::UnknownDepartment(value.to_string()))
    }
}

impl std::fmt::Display for Department {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Department {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Access-control role attached to an API caller.
///
/// The permission matrix is the original deployment's: admins manage
/// everything, QA officers manage the catalog and attendance, department
/// heads manage schedules and attendance, plain users read reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Role {
    Admin,
    QaOfficer,
    DepartmentHead,
    User,
}

impl Role {
    /// The canonical wire string (`"qa-officer"` style).
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::QaOfficer => "qa-officer",
            Self::DepartmentHead => "department-head",
            Self::User => "user",
        }
    }

    /// Parse a role from its canonical string.
    pub fn parse(value: &str) -> Result<Self, ValidationError> {
        match value {
            "admin" => Ok(Self::Admin),
            "qa-officer" => Ok(Self::QaOfficer),
            "department-head" => Ok(Self::DepartmentHead),
            "user" => Ok(Self::User),
            other => Err(ValidationError::UnknownRole(other.to_string())),
        }
    }

    /// May create, update, or delete employees and topics.
    pub fn can_manage_catalog(&self) -> bool {
        matches!(self, Self::Admin | Self::QaOfficer)
    }

    /// May create, update, or delete training schedules.
    pub fn can_manage_schedules(&self) -> bool {
        matches!(self, Self::Admin | Self::QaOfficer | Self::DepartmentHead)
    }

    /// May mark and edit attendance records.
    pub fn can_mark_attendance(&self) -> bool {
        self.can_manage_schedules()
    }

    /// May view compliance views and export reports. Every role can.
    pub fn can_view_reports(&self) -> bool {
        true
    }
}

impl std::str::FromStr for Role {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
