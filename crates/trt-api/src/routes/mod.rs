//! # API Route Handlers
//!
//! One module per resource, each exposing a `router()` assembled in
//! `lib.rs`. Every success response uses the `{ success: true, data }`
//! envelope; failures use the matching envelope from [`crate::error`].

pub mod attendances;
pub mod compliance;
pub mod employees;
pub mod reports;
pub mod schedules;
pub mod topics;

use serde::{Deserialize, Serialize};

/// Success envelope wrapping every JSON response body.
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
}

impl<T> ApiResponse<T> {
    pub fn new(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}
