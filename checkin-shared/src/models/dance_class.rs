/// Dance class model and database operations
///
/// A class repeats weekly on one day. The instructor is stored as free
/// text rather than a reference to a user.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE dance_classes (
///     id INTEGER PRIMARY KEY AUTOINCREMENT,
///     name VARCHAR(100) NOT NULL,
///     instructor_name VARCHAR(100),
///     day_of_week VARCHAR(10) NOT NULL,
///     start_time TIME NOT NULL,
///     end_time TIME NOT NULL,
///     description TEXT
/// );
/// ```

use chrono::{NaiveTime, Weekday};
use serde::{Deserialize, Serialize};
use sqlx::{Executor, Sqlite, SqlitePool};
use std::fmt;
use std::str::FromStr;

/// Day a class meets on, stored by its English name ("Monday")
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
pub enum DayOfWeek {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl DayOfWeek {
    /// All days, Monday first, in the order the class form offers them
    pub const ALL: [DayOfWeek; 7] = [
        DayOfWeek::Monday,
        DayOfWeek::Tuesday,
        DayOfWeek::Wednesday,
        DayOfWeek::Thursday,
        DayOfWeek::Friday,
        DayOfWeek::Saturday,
        DayOfWeek::Sunday,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DayOfWeek::Monday => "Monday",
            DayOfWeek::Tuesday => "Tuesday",
            DayOfWeek::Wednesday => "Wednesday",
            DayOfWeek::Thursday => "Thursday",
            DayOfWeek::Friday => "Friday",
            DayOfWeek::Saturday => "Saturday",
            DayOfWeek::Sunday => "Sunday",
        }
    }
}

impl fmt::Display for DayOfWeek {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error for a day name outside the seven fixed values
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Not a valid day of the week: {0}")]
pub struct InvalidDay(pub String);

impl FromStr for DayOfWeek {
    type Err = InvalidDay;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DayOfWeek::ALL
            .into_iter()
            .find(|day| day.as_str() == s)
            .ok_or_else(|| InvalidDay(s.to_string()))
    }
}

impl From<Weekday> for DayOfWeek {
    fn from(weekday: Weekday) -> Self {
        match weekday {
            Weekday::Mon => DayOfWeek::Monday,
            Weekday::Tue => DayOfWeek::Tuesday,
            Weekday::Wed => DayOfWeek::Wednesday,
            Weekday::Thu => DayOfWeek::Thursday,
            Weekday::Fri => DayOfWeek::Friday,
            Weekday::Sat => DayOfWeek::Saturday,
            Weekday::Sun => DayOfWeek::Sunday,
        }
    }
}

/// A weekly dance class
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct DanceClass {
    pub id: i64,
    pub name: String,
    pub instructor_name: Option<String>,
    pub day_of_week: DayOfWeek,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub description: Option<String>,
}

/// Editable class fields, used for both create and update
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DanceClassFields {
    pub name: String,
    pub instructor_name: Option<String>,
    pub day_of_week: DayOfWeek,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub description: Option<String>,
}

impl DanceClass {
    pub async fn create(pool: &SqlitePool, data: DanceClassFields) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, DanceClass>(
            r#"
            INSERT INTO dance_classes
                (name, instructor_name, day_of_week, start_time, end_time, description)
            VALUES (?, ?, ?, ?, ?, ?)
            RETURNING id, name, instructor_name, day_of_week, start_time, end_time, description
            "#,
        )
        .bind(data.name)
        .bind(data.instructor_name)
        .bind(data.day_of_week)
        .bind(data.start_time)
        .bind(data.end_time)
        .bind(data.description)
        .fetch_one(pool)
        .await
    }

    /// Finds a class by ID
    ///
    /// Accepts any executor so it can run inside a check-in transaction.
    pub async fn find_by_id<'e, E>(executor: E, id: i64) -> Result<Option<Self>, sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query_as::<_, DanceClass>(
            r#"
            SELECT id, name, instructor_name, day_of_week, start_time, end_time, description
            FROM dance_classes
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(executor)
        .await
    }

    /// All classes in the order they were created
    pub async fn list_all(pool: &SqlitePool) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, DanceClass>(
            r#"
            SELECT id, name, instructor_name, day_of_week, start_time, end_time, description
            FROM dance_classes
            ORDER BY id
            "#,
        )
        .fetch_all(pool)
        .await
    }

    /// Classes meeting on `day`, earliest start first
    pub async fn list_by_day(pool: &SqlitePool, day: DayOfWeek) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, DanceClass>(
            r#"
            SELECT id, name, instructor_name, day_of_week, start_time, end_time, description
            FROM dance_classes
            WHERE day_of_week = ?
            ORDER BY start_time, id
            "#,
        )
        .bind(day)
        .fetch_all(pool)
        .await
    }

    /// Replaces a class's editable fields
    ///
    /// Returns None if the class doesn't exist.
    pub async fn update(
        pool: &SqlitePool,
        id: i64,
        data: DanceClassFields,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, DanceClass>(
            r#"
            UPDATE dance_classes
            SET name = ?, instructor_name = ?, day_of_week = ?,
                start_time = ?, end_time = ?, description = ?
            WHERE id = ?
            RETURNING id, name, instructor_name, day_of_week, start_time, end_time, description
            "#,
        )
        .bind(data.name)
        .bind(data.instructor_name)
        .bind(data.day_of_week)
        .bind(data.start_time)
        .bind(data.end_time)
        .bind(data.description)
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    /// "18:30 - 19:30"
    pub fn schedule_label(&self) -> String {
        format!(
            "{} - {}",
            self.start_time.format("%H:%M"),
            self.end_time.format("%H:%M")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_day_of_week_round_trip_names() {
        for day in DayOfWeek::ALL {
            assert_eq!(day.as_str().parse::<DayOfWeek>().unwrap(), day);
            assert_eq!(day.to_string(), day.as_str());
        }
    }

    #[test]
    fn test_day_of_week_rejects_other_values() {
        assert!("monday".parse::<DayOfWeek>().is_err());
        assert!("Funday".parse::<DayOfWeek>().is_err());
        assert!("".parse::<DayOfWeek>().is_err());
    }

    #[test]
    fn test_day_of_week_from_weekday() {
        assert_eq!(DayOfWeek::from(Weekday::Mon), DayOfWeek::Monday);
        assert_eq!(DayOfWeek::from(Weekday::Sun), DayOfWeek::Sunday);
    }

    #[test]
    fn test_day_of_week_serializes_as_name() {
        let json = serde_json::to_string(&DayOfWeek::Wednesday).unwrap();
        assert_eq!(json, "\"Wednesday\"");
    }

    #[test]
    fn test_schedule_label() {
        let class = DanceClass {
            id: 1,
            name: "Salsa 1".to_string(),
            instructor_name: Some("Rosa".to_string()),
            day_of_week: DayOfWeek::Monday,
            start_time: NaiveTime::from_hms_opt(18, 30, 0).unwrap(),
            end_time: NaiveTime::from_hms_opt(19, 30, 0).unwrap(),
            description: None,
        };
        assert_eq!(class.schedule_label(), "18:30 - 19:30");
    }
}
