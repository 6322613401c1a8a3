/// Database models for Easy CheckIn
///
/// This module contains all database models and their queries.
///
/// # Models
///
/// - `user`: Staff accounts (admins and instructors)
/// - `student`: Dance students who check in at the kiosk
/// - `dance_class`: Weekly recurring classes
/// - `attendance`: One check-in of a student to a class on a day

pub mod attendance;
pub mod dance_class;
pub mod student;
pub mod user;
