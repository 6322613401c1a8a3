/// Student model and database operations
///
/// # Schema
///
/// ```sql
/// CREATE TABLE students (
///     id INTEGER PRIMARY KEY AUTOINCREMENT,
///     first_name VARCHAR(64) NOT NULL,
///     last_name VARCHAR(64) NOT NULL,
///     email VARCHAR(120) UNIQUE,
///     phone VARCHAR(20),
///     created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
/// );
/// ```
///
/// Blank emails are stored as NULL, which keeps the UNIQUE constraint from
/// firing for students without an address.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::{Executor, Sqlite, SqlitePool};

/// Upper bound on the unfiltered kiosk search list
pub const BROWSE_LIMIT: i64 = 100;

/// Upper bound on name-matching search results
pub const SEARCH_LIMIT: i64 = 20;

/// A dance student
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Student {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub created_at: NaiveDateTime,
}

/// Editable student fields, used for both create and update
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StudentFields {
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
}

impl Student {
    /// "First Last"
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// Inserts a student
    ///
    /// # Errors
    ///
    /// Fails with a database error when the email is already taken.
    pub async fn create(pool: &SqlitePool, data: StudentFields) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Student>(
            r#"
            INSERT INTO students (first_name, last_name, email, phone)
            VALUES (?, ?, ?, ?)
            RETURNING id, first_name, last_name, email, phone, created_at
            "#,
        )
        .bind(data.first_name)
        .bind(data.last_name)
        .bind(data.email)
        .bind(data.phone)
        .fetch_one(pool)
        .await
    }

    /// Finds a student by ID
    ///
    /// Accepts any executor so it can run inside a check-in transaction.
    pub async fn find_by_id<'e, E>(executor: E, id: i64) -> Result<Option<Self>, sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query_as::<_, Student>(
            r#"
            SELECT id, first_name, last_name, email, phone, created_at
            FROM students
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(executor)
        .await
    }

    /// Finds a student by exact email
    pub async fn find_by_email(pool: &SqlitePool, email: &str) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Student>(
            r#"
            SELECT id, first_name, last_name, email, phone, created_at
            FROM students
            WHERE email = ?
            "#,
        )
        .bind(email)
        .fetch_optional(pool)
        .await
    }

    /// Finds a student by exact first and last name
    pub async fn find_by_name(
        pool: &SqlitePool,
        first_name: &str,
        last_name: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Student>(
            r#"
            SELECT id, first_name, last_name, email, phone, created_at
            FROM students
            WHERE first_name = ? AND last_name = ?
            ORDER BY id
            LIMIT 1
            "#,
        )
        .bind(first_name)
        .bind(last_name)
        .fetch_optional(pool)
        .await
    }

    /// Every student, ordered by last name
    pub async fn list_all(pool: &SqlitePool) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Student>(
            r#"
            SELECT id, first_name, last_name, email, phone, created_at
            FROM students
            ORDER BY last_name, first_name, id
            "#,
        )
        .fetch_all(pool)
        .await
    }

    /// The first `limit` students ordered by last name
    pub async fn list_by_last_name(pool: &SqlitePool, limit: i64) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Student>(
            r#"
            SELECT id, first_name, last_name, email, phone, created_at
            FROM students
            ORDER BY last_name, first_name, id
            LIMIT ?
            "#,
        )
        .bind(limit)
        .fetch_all(pool)
        .await
    }

    /// Students whose first or last name contains `query`, ignoring case
    ///
    /// `%` and `_` in the query match literally.
    pub async fn search_by_name(
        pool: &SqlitePool,
        query: &str,
        limit: i64,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let pattern = format!("%{}%", escape_like(&query.to_lowercase()));

        sqlx::query_as::<_, Student>(
            r#"
            SELECT id, first_name, last_name, email, phone, created_at
            FROM students
            WHERE LOWER(first_name) LIKE ?1 ESCAPE '\'
               OR LOWER(last_name) LIKE ?1 ESCAPE '\'
            ORDER BY last_name, first_name, id
            LIMIT ?2
            "#,
        )
        .bind(pattern)
        .bind(limit)
        .fetch_all(pool)
        .await
    }

    /// Replaces a student's editable fields
    ///
    /// Returns None if the student doesn't exist.
    pub async fn update(
        pool: &SqlitePool,
        id: i64,
        data: StudentFields,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Student>(
            r#"
            UPDATE students
            SET first_name = ?, last_name = ?, email = ?, phone = ?
            WHERE id = ?
            RETURNING id, first_name, last_name, email, phone, created_at
            "#,
        )
        .bind(data.first_name)
        .bind(data.last_name)
        .bind(data.email)
        .bind(data.phone)
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    pub async fn count(pool: &SqlitePool) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM students")
            .fetch_one(pool)
            .await?;

        Ok(count)
    }
}

/// Escapes LIKE wildcards with a backslash
fn escape_like(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_full_name() {
        let student = Student {
            id: 7,
            first_name: "Ana".to_string(),
            last_name: "Lopez".to_string(),
            email: None,
            phone: None,
            created_at: NaiveDate::from_ymd_opt(2024, 1, 1)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap(),
        };

        assert_eq!(student.full_name(), "Ana Lopez");
    }

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("ana"), "ana");
        assert_eq!(escape_like("50%"), "50\\%");
        assert_eq!(escape_like("a_b"), "a\\_b");
        assert_eq!(escape_like("back\\slash"), "back\\\\slash");
    }
}
