/// User model and database operations
///
/// Users are studio staff. Logging in is disabled in the web app, so the
/// accounts only record who the admins and instructors are. They are created
/// by the `checkin-admin create-admin` command or the register page, and are
/// never deleted from inside the app.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE users (
///     id INTEGER PRIMARY KEY AUTOINCREMENT,
///     username VARCHAR(64) NOT NULL UNIQUE,
///     email VARCHAR(120) NOT NULL UNIQUE,
///     password_hash VARCHAR(255),
///     is_admin BOOLEAN NOT NULL DEFAULT FALSE,
///     is_instructor BOOLEAN NOT NULL DEFAULT FALSE
/// );
/// ```

use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

/// User model representing a staff account
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    /// Unique user ID
    pub id: i64,

    /// Login name, unique across all users
    pub username: String,

    /// Email address, unique across all users
    pub email: String,

    /// Argon2id password hash
    ///
    /// Never serialized into templates or JSON.
    #[serde(skip_serializing)]
    pub password_hash: Option<String>,

    /// Whether the user administers the studio
    pub is_admin: bool,

    /// Whether the user teaches classes
    pub is_instructor: bool,
}

/// Input for creating a new user
#[derive(Debug, Clone)]
pub struct CreateUser {
    /// Login name
    pub username: String,

    /// Email address
    pub email: String,

    /// Argon2id password hash (NOT plaintext password!)
    pub password_hash: String,

    /// Administrator flag
    pub is_admin: bool,

    /// Instructor flag
    pub is_instructor: bool,
}

impl User {
    /// Creates a new user in the database
    ///
    /// # Errors
    ///
    /// Returns an error if the username or email already exists
    /// (unique constraint violation) or the database is unreachable.
    pub async fn create(pool: &SqlitePool, data: CreateUser) -> Result<Self, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (username, email, password_hash, is_admin, is_instructor)
            VALUES (?, ?, ?, ?, ?)
            RETURNING id, username, email, password_hash, is_admin, is_instructor
            "#,
        )
        .bind(data.username)
        .bind(data.email)
        .bind(data.password_hash)
        .bind(data.is_admin)
        .bind(data.is_instructor)
        .fetch_one(pool)
        .await?;

        Ok(user)
    }

    /// Finds a user by ID
    pub async fn find_by_id(pool: &SqlitePool, id: i64) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, email, password_hash, is_admin, is_instructor
            FROM users
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    /// Finds a user by exact username
    pub async fn find_by_username(
        pool: &SqlitePool,
        username: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, email, password_hash, is_admin, is_instructor
            FROM users
            WHERE username = ?
            "#,
        )
        .bind(username)
        .fetch_optional(pool)
        .await
    }

    /// Finds a user by exact email address
    pub async fn find_by_email(pool: &SqlitePool, email: &str) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, email, password_hash, is_admin, is_instructor
            FROM users
            WHERE email = ?
            "#,
        )
        .bind(email)
        .fetch_optional(pool)
        .await
    }

    /// Lists all users in creation order
    pub async fn list(pool: &SqlitePool) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, email, password_hash, is_admin, is_instructor
            FROM users
            ORDER BY id
            "#,
        )
        .fetch_all(pool)
        .await
    }

    /// Counts total number of users
    pub async fn count(pool: &SqlitePool) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
            .fetch_one(pool)
            .await?;

        Ok(count)
    }

    /// Human-readable role label for listings
    pub fn role_label(&self) -> &'static str {
        match (self.is_admin, self.is_instructor) {
            (true, true) => "Admin, Instructor",
            (true, false) => "Admin",
            (false, true) => "Instructor",
            (false, false) => "Staff",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(is_admin: bool, is_instructor: bool) -> User {
        User {
            id: 1,
            username: "maria".to_string(),
            email: "maria@example.com".to_string(),
            password_hash: Some("hash".to_string()),
            is_admin,
            is_instructor,
        }
    }

    #[test]
    fn test_role_label() {
        assert_eq!(user(true, true).role_label(), "Admin, Instructor");
        assert_eq!(user(true, false).role_label(), "Admin");
        assert_eq!(user(false, true).role_label(), "Instructor");
        assert_eq!(user(false, false).role_label(), "Staff");
    }

    #[test]
    fn test_password_hash_is_not_serialized() {
        let json = serde_json::to_value(user(true, false)).unwrap();
        assert!(json.get("password_hash").is_none());
        assert_eq!(json["username"], "maria");
    }
}
