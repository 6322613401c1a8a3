//! # Easy CheckIn Shared Library
//!
//! This crate contains the data layer and business rules shared by the web
//! server and the admin command-line utility.
//!
//! ## Module Organization
//!
//! - `db`: SQLite connection pool and migrations
//! - `models`: Database models and their queries
//! - `attendance`: Check-in, un-check and student search
//! - `admin`: Student, class and staff administration
//! - `report`: Attendance aggregation by date range
//! - `validation`: Typed admin forms and their validation
//! - `auth`: Password hashing for staff accounts
//! - `clock`: Injectable source of "now"
//! - `error`: Service error type

pub mod admin;
pub mod attendance;
pub mod auth;
pub mod clock;
pub mod db;
pub mod error;
pub mod models;
pub mod report;
pub mod validation;

/// Current version of the shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
