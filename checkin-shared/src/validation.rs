//! Typed admin forms and their validation
//!
//! Forms arrive as raw strings from HTML. Each `validate_*` function trims
//! the input, checks required fields, runs the `validator` rules and
//! returns either the typed fields ready to persist or the list of field
//! errors to show above the re-rendered form.

use crate::models::dance_class::{DanceClassFields, DayOfWeek};
use crate::models::student::StudentFields;
use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use std::fmt;
use validator::{Validate, ValidationErrors};

/// A message attached to one form field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

/// Every problem found in a submitted form
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldErrors(pub Vec<FieldError>);

impl FieldErrors {
    pub fn single(field: &str, message: impl Into<String>) -> Self {
        let mut errors = Self::default();
        errors.push(field, message);
        errors
    }

    pub fn push(&mut self, field: &str, message: impl Into<String>) {
        self.0.push(FieldError {
            field: field.to_string(),
            message: message.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldError> {
        self.0.iter()
    }

    pub fn has_field(&self, field: &str) -> bool {
        self.0.iter().any(|error| error.field == field)
    }

    /// Appends the failures reported by the `validator` crate
    ///
    /// Sorted by field name, since `validator` keeps them in a hash map.
    fn extend_from(&mut self, errors: &ValidationErrors) {
        let mut collected: Vec<FieldError> = errors
            .field_errors()
            .iter()
            .flat_map(|(field, errors)| {
                errors.iter().map(move |error| FieldError {
                    field: field.to_string(),
                    message: error
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| "Invalid value.".to_string()),
                })
            })
            .collect();
        collected.sort_by(|a, b| a.field.cmp(&b.field));
        self.0.extend(collected);
    }

    fn into_result<T>(self, value: T) -> Result<T, Self> {
        if self.is_empty() {
            Ok(value)
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let messages: Vec<&str> = self.0.iter().map(|e| e.message.as_str()).collect();
        f.write_str(&messages.join(" "))
    }
}

impl std::error::Error for FieldErrors {}

/// Trimmed value, or None when blank
fn non_blank(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn require(errors: &mut FieldErrors, field: &str, label: &str, value: &Option<String>) {
    if non_blank(value).is_none() {
        errors.push(field, format!("{} is required.", label));
    }
}

/// Student create/edit form
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct StudentForm {
    #[validate(length(max = 64, message = "First name must be at most 64 characters."))]
    pub first_name: Option<String>,

    #[validate(length(max = 64, message = "Last name must be at most 64 characters."))]
    pub last_name: Option<String>,

    #[validate(
        email(message = "Invalid email address."),
        length(max = 120, message = "Email must be at most 120 characters.")
    )]
    pub email: Option<String>,

    #[validate(length(max = 20, message = "Phone must be at most 20 characters."))]
    pub phone: Option<String>,
}

impl StudentForm {
    /// Pre-fills the edit form from a stored student
    pub fn from_fields(fields: &StudentFields) -> Self {
        Self {
            first_name: Some(fields.first_name.clone()),
            last_name: Some(fields.last_name.clone()),
            email: fields.email.clone(),
            phone: fields.phone.clone(),
        }
    }

    fn normalized(&self) -> Self {
        Self {
            first_name: non_blank(&self.first_name),
            last_name: non_blank(&self.last_name),
            email: non_blank(&self.email),
            phone: non_blank(&self.phone),
        }
    }
}

/// Validates a student form
///
/// A blank email becomes None. Email uniqueness needs the database and is
/// checked by [`crate::admin`].
pub fn validate_student(form: &StudentForm) -> Result<StudentFields, FieldErrors> {
    let form = form.normalized();
    let mut errors = FieldErrors::default();

    require(&mut errors, "first_name", "First name", &form.first_name);
    require(&mut errors, "last_name", "Last name", &form.last_name);

    if let Err(e) = form.validate() {
        errors.extend_from(&e);
    }

    errors.into_result(StudentFields {
        first_name: form.first_name.unwrap_or_default(),
        last_name: form.last_name.unwrap_or_default(),
        email: form.email,
        phone: form.phone,
    })
}

/// Dance class create/edit form
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct ClassForm {
    #[validate(length(max = 100, message = "Class name must be at most 100 characters."))]
    pub name: Option<String>,

    #[validate(length(max = 100, message = "Instructor name must be at most 100 characters."))]
    pub instructor_name: Option<String>,

    pub day_of_week: Option<String>,

    /// `HH:MM` as sent by `<input type="time">`, seconds optional
    pub start_time: Option<String>,

    pub end_time: Option<String>,

    #[validate(length(max = 500, message = "Description must be at most 500 characters."))]
    pub description: Option<String>,
}

impl ClassForm {
    /// Pre-fills the edit form from a stored class
    pub fn from_fields(fields: &DanceClassFields) -> Self {
        Self {
            name: Some(fields.name.clone()),
            instructor_name: fields.instructor_name.clone(),
            day_of_week: Some(fields.day_of_week.to_string()),
            start_time: Some(fields.start_time.format("%H:%M").to_string()),
            end_time: Some(fields.end_time.format("%H:%M").to_string()),
            description: fields.description.clone(),
        }
    }

    fn normalized(&self) -> Self {
        Self {
            name: non_blank(&self.name),
            instructor_name: non_blank(&self.instructor_name),
            day_of_week: non_blank(&self.day_of_week),
            start_time: non_blank(&self.start_time),
            end_time: non_blank(&self.end_time),
            description: non_blank(&self.description),
        }
    }
}

/// Parses `HH:MM` or `HH:MM:SS`
pub fn parse_time(value: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(value, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M:%S"))
        .ok()
}

fn check_time(errors: &mut FieldErrors, field: &str, label: &str, value: &Option<String>) -> Option<NaiveTime> {
    match value.as_deref() {
        None => {
            errors.push(field, format!("{} is required.", label));
            None
        }
        Some(raw) => {
            let parsed = parse_time(raw);
            if parsed.is_none() {
                errors.push(field, format!("{} must be a time like 18:30.", label));
            }
            parsed
        }
    }
}

/// Validates a dance class form
pub fn validate_class(form: &ClassForm) -> Result<DanceClassFields, FieldErrors> {
    let form = form.normalized();
    let mut errors = FieldErrors::default();

    require(&mut errors, "name", "Class name", &form.name);
    require(&mut errors, "instructor_name", "Instructor name", &form.instructor_name);

    let day_of_week = match form.day_of_week.as_deref() {
        None => {
            errors.push("day_of_week", "Day of week is required.");
            None
        }
        Some(raw) => match raw.parse::<DayOfWeek>() {
            Ok(day) => Some(day),
            Err(_) => {
                errors.push("day_of_week", "Not a valid choice.");
                None
            }
        },
    };

    let start_time = check_time(&mut errors, "start_time", "Start time", &form.start_time);
    let end_time = check_time(&mut errors, "end_time", "End time", &form.end_time);

    if let Err(e) = form.validate() {
        errors.extend_from(&e);
    }

    match (day_of_week, start_time, end_time) {
        (Some(day_of_week), Some(start_time), Some(end_time)) if errors.is_empty() => {
            Ok(DanceClassFields {
                name: form.name.unwrap_or_default(),
                instructor_name: form.instructor_name,
                day_of_week,
                start_time,
                end_time,
                description: form.description,
            })
        }
        _ => Err(errors),
    }
}

/// Staff registration form
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct RegistrationForm {
    #[validate(length(min = 3, max = 64, message = "Username must be between 3 and 64 characters."))]
    pub username: Option<String>,

    #[validate(email(message = "Invalid email address."))]
    pub email: Option<String>,

    #[serde(skip_serializing)]
    #[validate(length(min = 8, message = "Password must be at least 8 characters."))]
    pub password: Option<String>,

    #[serde(skip_serializing)]
    pub password2: Option<String>,

    /// Checkbox: present when ticked
    pub is_admin: Option<String>,

    pub is_instructor: Option<String>,
}

/// A validated registration, password still in plaintext
#[derive(Debug, Clone)]
pub struct NewStaff {
    pub username: String,
    pub email: String,
    pub password: String,
    pub is_admin: bool,
    pub is_instructor: bool,
}

/// Validates a registration form
///
/// Username and email uniqueness are checked by [`crate::admin`].
pub fn validate_registration(form: &RegistrationForm) -> Result<NewStaff, FieldErrors> {
    let normalized = RegistrationForm {
        username: non_blank(&form.username),
        email: non_blank(&form.email),
        password: form.password.clone().filter(|p| !p.is_empty()),
        password2: form.password2.clone().filter(|p| !p.is_empty()),
        is_admin: form.is_admin.clone(),
        is_instructor: form.is_instructor.clone(),
    };
    let mut errors = FieldErrors::default();

    require(&mut errors, "username", "Username", &normalized.username);
    require(&mut errors, "email", "Email", &normalized.email);
    require(&mut errors, "password", "Password", &normalized.password);
    require(&mut errors, "password2", "Confirm password", &normalized.password2);

    if let Err(e) = normalized.validate() {
        errors.extend_from(&e);
    }

    if normalized.password.is_some()
        && normalized.password2.is_some()
        && normalized.password != normalized.password2
    {
        errors.push("password2", "Passwords must match.");
    }

    errors.into_result(NewStaff {
        username: normalized.username.unwrap_or_default(),
        email: normalized.email.unwrap_or_default(),
        password: normalized.password.unwrap_or_default(),
        is_admin: normalized.is_admin.is_some(),
        is_instructor: normalized.is_instructor.is_some(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn some(value: &str) -> Option<String> {
        Some(value.to_string())
    }

    #[test]
    fn test_valid_student_is_trimmed() {
        let form = StudentForm {
            first_name: some("  Ana "),
            last_name: some("Lopez"),
            email: some(" ana@example.com "),
            phone: some(""),
        };

        let fields = validate_student(&form).unwrap();
        assert_eq!(fields.first_name, "Ana");
        assert_eq!(fields.email.as_deref(), Some("ana@example.com"));
        assert_eq!(fields.phone, None);
    }

    #[test]
    fn test_blank_email_becomes_none() {
        let form = StudentForm {
            first_name: some("Ana"),
            last_name: some("Lopez"),
            email: some("   "),
            phone: None,
        };

        assert_eq!(validate_student(&form).unwrap().email, None);
    }

    #[test]
    fn test_student_requires_names() {
        let errors = validate_student(&StudentForm::default()).unwrap_err();
        assert!(errors.has_field("first_name"));
        assert!(errors.has_field("last_name"));
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn test_student_rejects_bad_email_and_long_phone() {
        let form = StudentForm {
            first_name: some("Ana"),
            last_name: some("Lopez"),
            email: some("not-an-email"),
            phone: some(&"5".repeat(21)),
        };

        let errors = validate_student(&form).unwrap_err();
        assert!(errors.has_field("email"));
        assert!(errors.has_field("phone"));
    }

    #[test]
    fn test_student_name_length_limit() {
        let form = StudentForm {
            first_name: some(&"a".repeat(65)),
            last_name: some("Lopez"),
            ..Default::default()
        };

        let errors = validate_student(&form).unwrap_err();
        assert_eq!(errors.0[0].field, "first_name");
    }

    fn class_form() -> ClassForm {
        ClassForm {
            name: some("Salsa 1"),
            instructor_name: some("Rosa"),
            day_of_week: some("Monday"),
            start_time: some("18:30"),
            end_time: some("19:30:00"),
            description: None,
        }
    }

    #[test]
    fn test_valid_class() {
        let fields = validate_class(&class_form()).unwrap();
        assert_eq!(fields.day_of_week, DayOfWeek::Monday);
        assert_eq!(fields.start_time, NaiveTime::from_hms_opt(18, 30, 0).unwrap());
        assert_eq!(fields.end_time, NaiveTime::from_hms_opt(19, 30, 0).unwrap());
    }

    #[test]
    fn test_class_rejects_unknown_day() {
        let form = ClassForm {
            day_of_week: some("Caturday"),
            ..class_form()
        };

        let errors = validate_class(&form).unwrap_err();
        assert_eq!(errors.0, vec![FieldError {
            field: "day_of_week".to_string(),
            message: "Not a valid choice.".to_string(),
        }]);
    }

    #[test]
    fn test_class_requires_fields_and_times() {
        let errors = validate_class(&ClassForm::default()).unwrap_err();
        for field in ["name", "instructor_name", "day_of_week", "start_time", "end_time"] {
            assert!(errors.has_field(field), "missing error for {}", field);
        }

        let form = ClassForm {
            start_time: some("half past six"),
            ..class_form()
        };
        assert!(validate_class(&form).unwrap_err().has_field("start_time"));
    }

    #[test]
    fn test_class_description_limit() {
        let form = ClassForm {
            description: some(&"x".repeat(501)),
            ..class_form()
        };
        assert!(validate_class(&form).unwrap_err().has_field("description"));
    }

    #[test]
    fn test_class_form_prefill_round_trips() {
        let fields = validate_class(&class_form()).unwrap();
        let again = validate_class(&ClassForm::from_fields(&fields)).unwrap();
        assert_eq!(fields, again);
    }

    #[test]
    fn test_registration() {
        let form = RegistrationForm {
            username: some("maria"),
            email: some("maria@example.com"),
            password: some("correct horse"),
            password2: some("correct horse"),
            is_admin: some("y"),
            is_instructor: None,
        };

        let staff = validate_registration(&form).unwrap();
        assert!(staff.is_admin);
        assert!(!staff.is_instructor);
    }

    #[test]
    fn test_registration_password_rules() {
        let form = RegistrationForm {
            username: some("ma"),
            email: some("maria@example.com"),
            password: some("short"),
            password2: some("shorter"),
            ..Default::default()
        };

        let errors = validate_registration(&form).unwrap_err();
        assert!(errors.has_field("username"));
        assert!(errors.has_field("password"));
        assert!(errors.has_field("password2"));
    }

    #[test]
    fn test_field_errors_display() {
        let mut errors = FieldErrors::single("email", "Invalid email address.");
        errors.push("phone", "Too long.");
        assert_eq!(errors.to_string(), "Invalid email address. Too long.");
    }
}
