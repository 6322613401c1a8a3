//! Administration: create and edit students, classes and staff accounts
//!
//! Wraps form validation and the uniqueness rules that need the database.

use crate::auth::password::{self, PasswordError};
use crate::models::dance_class::DanceClass;
use crate::models::student::Student;
use crate::models::user::{CreateUser, User};
use crate::validation::{
    validate_class, validate_registration, validate_student, ClassForm, FieldErrors, NewStaff,
    RegistrationForm, StudentForm,
};
use sqlx::SqlitePool;
use tracing::info;

pub const DUPLICATE_STUDENT_EMAIL: &str = "A student with this email already exists.";
pub const DUPLICATE_USERNAME: &str = "Username already exists.";
pub const DUPLICATE_USER_EMAIL: &str = "Email already registered.";

#[derive(Debug, thiserror::Error)]
pub enum AdminError {
    /// The form has problems to show to the user
    #[error("{0}")]
    Invalid(FieldErrors),

    #[error("Student {0} not found")]
    StudentNotFound(i64),

    #[error("Class {0} not found")]
    ClassNotFound(i64),

    #[error(transparent)]
    Password(#[from] PasswordError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl From<FieldErrors> for AdminError {
    fn from(errors: FieldErrors) -> Self {
        AdminError::Invalid(errors)
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .map(|db_err| db_err.is_unique_violation())
        .unwrap_or(false)
}

/// Rejects an email another student already uses
///
/// `current` is the student being edited, who may keep their own email.
async fn ensure_student_email_free(
    pool: &SqlitePool,
    email: Option<&str>,
    current: Option<i64>,
) -> Result<(), AdminError> {
    let Some(email) = email else {
        return Ok(());
    };

    match Student::find_by_email(pool, email).await? {
        Some(other) if Some(other.id) != current => Err(AdminError::Invalid(
            FieldErrors::single("email", DUPLICATE_STUDENT_EMAIL),
        )),
        _ => Ok(()),
    }
}

/// Maps a unique-constraint failure on insert/update to the form message
fn student_write_error(err: sqlx::Error) -> AdminError {
    if is_unique_violation(&err) {
        AdminError::Invalid(FieldErrors::single("email", DUPLICATE_STUDENT_EMAIL))
    } else {
        AdminError::Database(err)
    }
}

/// Adds a student from the admin form
pub async fn create_student(pool: &SqlitePool, form: &StudentForm) -> Result<Student, AdminError> {
    let fields = validate_student(form)?;
    ensure_student_email_free(pool, fields.email.as_deref(), None).await?;

    let student = Student::create(pool, fields)
        .await
        .map_err(student_write_error)?;

    info!(student_id = student.id, "Student created");
    Ok(student)
}

/// Saves the edit form of an existing student
pub async fn update_student(
    pool: &SqlitePool,
    id: i64,
    form: &StudentForm,
) -> Result<Student, AdminError> {
    if Student::find_by_id(pool, id).await?.is_none() {
        return Err(AdminError::StudentNotFound(id));
    }

    let fields = validate_student(form)?;
    ensure_student_email_free(pool, fields.email.as_deref(), Some(id)).await?;

    let student = Student::update(pool, id, fields)
        .await
        .map_err(student_write_error)?
        .ok_or(AdminError::StudentNotFound(id))?;

    info!(student_id = id, "Student updated");
    Ok(student)
}

/// Adds a class from the admin form
pub async fn create_class(pool: &SqlitePool, form: &ClassForm) -> Result<DanceClass, AdminError> {
    let fields = validate_class(form)?;
    let class = DanceClass::create(pool, fields).await?;

    info!(class_id = class.id, name = %class.name, "Class created");
    Ok(class)
}

/// Saves the edit form of an existing class
pub async fn update_class(
    pool: &SqlitePool,
    id: i64,
    form: &ClassForm,
) -> Result<DanceClass, AdminError> {
    if DanceClass::find_by_id(pool, id).await?.is_none() {
        return Err(AdminError::ClassNotFound(id));
    }

    let fields = validate_class(form)?;
    let class = DanceClass::update(pool, id, fields)
        .await?
        .ok_or(AdminError::ClassNotFound(id))?;

    info!(class_id = id, "Class updated");
    Ok(class)
}

/// Creates a staff account after checking username and email are free
pub async fn create_staff(pool: &SqlitePool, staff: NewStaff) -> Result<User, AdminError> {
    let mut errors = FieldErrors::default();
    if User::find_by_username(pool, &staff.username).await?.is_some() {
        errors.push("username", DUPLICATE_USERNAME);
    }
    if User::find_by_email(pool, &staff.email).await?.is_some() {
        errors.push("email", DUPLICATE_USER_EMAIL);
    }
    if let Err(message) = password::validate_password_strength(&staff.password) {
        errors.push("password", message);
    }
    if !errors.is_empty() {
        return Err(AdminError::Invalid(errors));
    }

    let password_hash = password::hash_password(&staff.password)?;
    let user = User::create(
        pool,
        CreateUser {
            username: staff.username,
            email: staff.email,
            password_hash,
            is_admin: staff.is_admin,
            is_instructor: staff.is_instructor,
        },
    )
    .await
    .map_err(|err| {
        if is_unique_violation(&err) {
            AdminError::Invalid(FieldErrors::single("username", DUPLICATE_USERNAME))
        } else {
            AdminError::Database(err)
        }
    })?;

    info!(user_id = user.id, username = %user.username, is_admin = user.is_admin, "User created");
    Ok(user)
}

/// Creates a staff account from the register page
pub async fn register_user(pool: &SqlitePool, form: &RegistrationForm) -> Result<User, AdminError> {
    let staff = validate_registration(form)?;
    create_staff(pool, staff).await
}

/// Result of [`add_student_if_absent`]
#[derive(Debug, Clone)]
pub enum AddStudentOutcome {
    Created(Student),

    /// A student with the same first and last name was already on file
    AlreadyExists(Student),
}

/// Adds a student unless one with the same first and last name exists
pub async fn add_student_if_absent(
    pool: &SqlitePool,
    form: &StudentForm,
) -> Result<AddStudentOutcome, AdminError> {
    let fields = validate_student(form)?;

    if let Some(existing) = Student::find_by_name(pool, &fields.first_name, &fields.last_name).await? {
        return Ok(AddStudentOutcome::AlreadyExists(existing));
    }

    ensure_student_email_free(pool, fields.email.as_deref(), None).await?;
    let student = Student::create(pool, fields)
        .await
        .map_err(student_write_error)?;

    info!(student_id = student.id, "Student added");
    Ok(AddStudentOutcome::Created(student))
}
