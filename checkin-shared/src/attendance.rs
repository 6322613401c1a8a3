//! Attendance service: check in, un-check and search students
//!
//! Every operation takes the current instant (or day) as a parameter;
//! callers read it from a [`Clock`](crate::clock::Clock) once per request.

use crate::error::ServiceError;
use crate::models::attendance::{Attendance, CreateAttendance};
use crate::models::dance_class::DanceClass;
use crate::models::student::{Student, BROWSE_LIMIT, SEARCH_LIMIT};
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use std::collections::HashSet;
use tracing::{debug, info};

/// Whether a check-in created a new row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkStatus {
    CheckedIn,
    AlreadyCheckedIn,
}

/// Result of [`mark`]
#[derive(Debug, Clone)]
pub struct MarkOutcome {
    pub student: Student,
    pub class: DanceClass,

    /// The new row, or the existing one with its original timestamp
    pub attendance: Attendance,

    pub status: MarkStatus,
}

impl MarkOutcome {
    pub fn already_checked_in(&self) -> bool {
        self.status == MarkStatus::AlreadyCheckedIn
    }
}

/// Result of [`unmark`]
#[derive(Debug, Clone)]
pub struct UnmarkOutcome {
    pub student: Student,
    pub class: DanceClass,

    /// False when the student had not checked in today
    pub removed: bool,
}

/// One row of the kiosk search results
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentSearchHit {
    pub id: i64,
    pub name: String,
    pub checked_in: bool,
}

/// Checks a student in to a class for the day of `now`
///
/// Idempotent per student, class and day: when a row already exists it is
/// returned unchanged with [`MarkStatus::AlreadyCheckedIn`]. A request that
/// loses an insert race to a concurrent one gets the winner's row.
///
/// Lookups run outside any transaction and the insert is one statement, so
/// concurrent check-ins only contend for SQLite's write lock, which the
/// pool's busy timeout waits on.
///
/// # Errors
///
/// [`ServiceError::InvalidStudentOrClass`] when either id is unknown.
pub async fn mark(
    pool: &SqlitePool,
    student_id: i64,
    class_id: i64,
    now: NaiveDateTime,
) -> Result<MarkOutcome, ServiceError> {
    let student = Student::find_by_id(pool, student_id).await?;
    let class = DanceClass::find_by_id(pool, class_id).await?;
    let (Some(student), Some(class)) = (student, class) else {
        return Err(ServiceError::InvalidStudentOrClass);
    };

    let today = now.date();
    if let Some(existing) = Attendance::find_for_day(pool, student_id, class_id, today).await? {
        debug!(student_id, class_id, %today, "Student already checked in");
        return Ok(MarkOutcome {
            student,
            class,
            attendance: existing,
            status: MarkStatus::AlreadyCheckedIn,
        });
    }

    let data = CreateAttendance::at(student_id, class_id, now);
    let (attendance, status) = match Attendance::insert_if_absent(pool, data).await? {
        Some(created) => (created, MarkStatus::CheckedIn),
        None => {
            debug!(student_id, class_id, %today, "Lost check-in race, reading winner's row");
            let existing = Attendance::find_for_day(pool, student_id, class_id, today)
                .await?
                .ok_or(sqlx::Error::RowNotFound)?;
            (existing, MarkStatus::AlreadyCheckedIn)
        }
    };

    if status == MarkStatus::CheckedIn {
        info!(
            student_id,
            class_id,
            attendance_id = attendance.id,
            "Student checked in"
        );
    }

    Ok(MarkOutcome {
        student,
        class,
        attendance,
        status,
    })
}

/// Checks several students in to one class in a single transaction
///
/// Unknown student ids, students already checked in today and ids repeated
/// in the request are skipped. Returns the students that were newly
/// checked in, in request order.
///
/// Students are looked up before the transaction opens, so its first
/// statement is a write and it takes the write lock up front.
///
/// # Errors
///
/// [`ServiceError::InvalidClass`] when the class id is unknown.
pub async fn mark_batch(
    pool: &SqlitePool,
    class_id: i64,
    student_ids: &[i64],
    now: NaiveDateTime,
) -> Result<Vec<Student>, ServiceError> {
    if DanceClass::find_by_id(pool, class_id).await?.is_none() {
        return Err(ServiceError::InvalidClass);
    }

    let mut seen = HashSet::new();
    let mut students = Vec::new();

    for &student_id in student_ids {
        if !seen.insert(student_id) {
            continue;
        }

        match Student::find_by_id(pool, student_id).await? {
            Some(student) => students.push(student),
            None => debug!(student_id, "Skipping unknown student in batch check-in"),
        }
    }

    let mut checked_in = Vec::new();
    let mut tx = pool.begin().await?;

    for student in students {
        let data = CreateAttendance::at(student.id, class_id, now);
        if Attendance::insert_if_absent(&mut *tx, data).await?.is_some() {
            checked_in.push(student);
        }
    }

    tx.commit().await?;

    info!(
        class_id,
        requested = student_ids.len(),
        checked_in = checked_in.len(),
        "Batch check-in completed"
    );

    Ok(checked_in)
}

/// Removes a student's check-in to a class for `today`
///
/// Not being checked in is reported through [`UnmarkOutcome::removed`],
/// not as an error.
///
/// # Errors
///
/// [`ServiceError::InvalidStudentOrClass`] when either id is unknown.
pub async fn unmark(
    pool: &SqlitePool,
    student_id: i64,
    class_id: i64,
    today: NaiveDate,
) -> Result<UnmarkOutcome, ServiceError> {
    let student = Student::find_by_id(pool, student_id).await?;
    let class = DanceClass::find_by_id(pool, class_id).await?;
    let (Some(student), Some(class)) = (student, class) else {
        return Err(ServiceError::InvalidStudentOrClass);
    };

    let removed = Attendance::delete_for_day(pool, student_id, class_id, today).await?;

    if removed {
        info!(student_id, class_id, %today, "Student check-in removed");
    }

    Ok(UnmarkOutcome {
        student,
        class,
        removed,
    })
}

/// Searches students by name for the kiosk
///
/// A blank query lists the first 100 students by last name; otherwise up
/// to 20 students whose first or last name contains the query, ignoring
/// case. Each hit says whether the student is checked in to `class_id`
/// today (always false without a class).
pub async fn search_students(
    pool: &SqlitePool,
    query: &str,
    class_id: Option<i64>,
    today: NaiveDate,
) -> Result<Vec<StudentSearchHit>, ServiceError> {
    let query = query.trim();
    let students = if query.is_empty() {
        Student::list_by_last_name(pool, BROWSE_LIMIT).await?
    } else {
        Student::search_by_name(pool, query, SEARCH_LIMIT).await?
    };

    let checked_in: HashSet<i64> = match class_id {
        Some(class_id) => Attendance::checked_in_student_ids(pool, class_id, today)
            .await?
            .into_iter()
            .collect(),
        None => HashSet::new(),
    };

    debug!(query, results = students.len(), "Student search");

    Ok(students
        .into_iter()
        .map(|student| StudentSearchHit {
            checked_in: checked_in.contains(&student.id),
            name: student.full_name(),
            id: student.id,
        })
        .collect())
}
