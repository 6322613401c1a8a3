/// Attendance model and database operations
///
/// An attendance row records one student checking in to one class on one
/// calendar day. The `(student_id, class_id, date)` triple is unique: the
/// UNIQUE index in the schema is what makes concurrent check-ins safe, the
/// service layer only relies on it.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE attendance (
///     id INTEGER PRIMARY KEY AUTOINCREMENT,
///     student_id INTEGER NOT NULL REFERENCES students (id),
///     class_id INTEGER NOT NULL REFERENCES dance_classes (id),
///     date DATE NOT NULL,
///     time_in TIMESTAMP NOT NULL
/// );
/// CREATE UNIQUE INDEX idx_attendance_student_class_date
///     ON attendance (student_id, class_id, date);
/// ```

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use sqlx::{Executor, Sqlite, SqlitePool};

/// One check-in
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Attendance {
    pub id: i64,
    pub student_id: i64,
    pub class_id: i64,

    /// Calendar day of the check-in
    pub date: NaiveDate,

    /// Instant the student checked in
    pub time_in: NaiveDateTime,
}

/// Input for recording a check-in
#[derive(Debug, Clone, Copy)]
pub struct CreateAttendance {
    pub student_id: i64,
    pub class_id: i64,
    pub date: NaiveDate,
    pub time_in: NaiveDateTime,
}

impl CreateAttendance {
    /// Check-in stamped with the day and instant of `now`
    pub fn at(student_id: i64, class_id: i64, now: NaiveDateTime) -> Self {
        Self {
            student_id,
            class_id,
            date: now.date(),
            time_in: now,
        }
    }
}

/// Check-in joined with the student's name, for reports
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct AttendanceRecord {
    pub id: i64,
    pub student_id: i64,
    pub class_id: i64,
    pub date: NaiveDate,
    pub time_in: NaiveDateTime,
    pub first_name: String,
    pub last_name: String,
}

impl AttendanceRecord {
    pub fn student_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

impl Attendance {
    /// Finds the check-in of a student to a class on a given day
    pub async fn find_for_day<'e, E>(
        executor: E,
        student_id: i64,
        class_id: i64,
        date: NaiveDate,
    ) -> Result<Option<Self>, sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query_as::<_, Attendance>(
            r#"
            SELECT id, student_id, class_id, date, time_in
            FROM attendance
            WHERE student_id = ? AND class_id = ? AND date = ?
            "#,
        )
        .bind(student_id)
        .bind(class_id)
        .bind(date)
        .fetch_optional(executor)
        .await
    }

    /// Inserts a check-in unless one already exists for the same day
    ///
    /// Returns None when the unique index rejected the row, which means
    /// another request checked the student in first.
    pub async fn insert_if_absent<'e, E>(
        executor: E,
        data: CreateAttendance,
    ) -> Result<Option<Self>, sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query_as::<_, Attendance>(
            r#"
            INSERT INTO attendance (student_id, class_id, date, time_in)
            VALUES (?, ?, ?, ?)
            ON CONFLICT (student_id, class_id, date) DO NOTHING
            RETURNING id, student_id, class_id, date, time_in
            "#,
        )
        .bind(data.student_id)
        .bind(data.class_id)
        .bind(data.date)
        .bind(data.time_in)
        .fetch_optional(executor)
        .await
    }

    /// Deletes the check-in of a student to a class on a given day
    ///
    /// True if a row was deleted.
    pub async fn delete_for_day<'e, E>(
        executor: E,
        student_id: i64,
        class_id: i64,
        date: NaiveDate,
    ) -> Result<bool, sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let result =
            sqlx::query("DELETE FROM attendance WHERE student_id = ? AND class_id = ? AND date = ?")
                .bind(student_id)
                .bind(class_id)
                .bind(date)
                .execute(executor)
                .await?;

        Ok(result.rows_affected() > 0)
    }

    /// IDs of the students checked in to a class on a day
    pub async fn checked_in_student_ids(
        pool: &SqlitePool,
        class_id: i64,
        date: NaiveDate,
    ) -> Result<Vec<i64>, sqlx::Error> {
        sqlx::query_scalar::<_, i64>(
            r#"
            SELECT student_id
            FROM attendance
            WHERE class_id = ? AND date = ?
            ORDER BY time_in, id
            "#,
        )
        .bind(class_id)
        .bind(date)
        .fetch_all(pool)
        .await
    }

    /// Check-ins for a class between two days (inclusive), newest day first
    pub async fn list_for_class_between(
        pool: &SqlitePool,
        class_id: i64,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<AttendanceRecord>, sqlx::Error> {
        sqlx::query_as::<_, AttendanceRecord>(
            r#"
            SELECT a.id, a.student_id, a.class_id, a.date, a.time_in,
                   s.first_name, s.last_name
            FROM attendance a
            JOIN students s ON s.id = a.student_id
            WHERE a.class_id = ? AND a.date >= ? AND a.date <= ?
            ORDER BY a.date DESC, a.time_in, a.id
            "#,
        )
        .bind(class_id)
        .bind(start)
        .bind(end)
        .fetch_all(pool)
        .await
    }

    /// Number of check-ins to a class on a day
    pub async fn count_for_day(
        pool: &SqlitePool,
        class_id: i64,
        date: NaiveDate,
    ) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM attendance WHERE class_id = ? AND date = ?")
                .bind(class_id)
                .bind(date)
                .fetch_one(pool)
                .await?;

        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_attendance_uses_day_of_instant() {
        let now = NaiveDate::from_ymd_opt(2024, 3, 4)
            .unwrap()
            .and_hms_opt(23, 59, 0)
            .unwrap();
        let data = CreateAttendance::at(3, 9, now);

        assert_eq!(data.date, NaiveDate::from_ymd_opt(2024, 3, 4).unwrap());
        assert_eq!(data.time_in, now);
        assert_eq!(data.student_id, 3);
        assert_eq!(data.class_id, 9);
    }
}
