//! Template-facing shapes of the domain types
//!
//! Dates and times are formatted here so templates only print strings.

use checkin_shared::models::attendance::AttendanceRecord;
use checkin_shared::models::dance_class::DanceClass;
use checkin_shared::models::student::Student;
use checkin_shared::models::user::User;
use checkin_shared::report::{AttendanceReport, DateGroup, DATE_FORMAT};
use checkin_shared::validation::FieldErrors;
use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;
use std::collections::BTreeMap;

/// "Monday, March 04, 2024"
pub fn long_date(date: NaiveDate) -> String {
    date.format("%A, %B %d, %Y").to_string()
}

/// "06:05 PM"
pub fn clock_time(time: NaiveDateTime) -> String {
    time.format("%I:%M %p").to_string()
}

#[derive(Debug, Clone, Serialize)]
pub struct ClassView {
    pub id: i64,
    pub name: String,
    pub instructor_name: Option<String>,
    pub day_of_week: &'static str,
    pub schedule: String,
    pub description: Option<String>,
}

impl From<&DanceClass> for ClassView {
    fn from(class: &DanceClass) -> Self {
        Self {
            id: class.id,
            name: class.name.clone(),
            instructor_name: class.instructor_name.clone(),
            day_of_week: class.day_of_week.as_str(),
            schedule: class.schedule_label(),
            description: class.description.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct StudentView {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub full_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub created_on: String,
}

impl From<&Student> for StudentView {
    fn from(student: &Student) -> Self {
        Self {
            id: student.id,
            first_name: student.first_name.clone(),
            last_name: student.last_name.clone(),
            full_name: student.full_name(),
            email: student.email.clone(),
            phone: student.phone.clone(),
            created_on: student.created_at.format(DATE_FORMAT).to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct UserView {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub role: &'static str,
}

impl From<&User> for UserView {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
            role: user.role_label(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RecordView {
    pub student_id: i64,
    pub student_name: String,
    pub time_in: String,
}

impl From<&AttendanceRecord> for RecordView {
    fn from(record: &AttendanceRecord) -> Self {
        Self {
            student_id: record.student_id,
            student_name: record.student_name(),
            time_in: clock_time(record.time_in),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DateGroupView {
    pub date: String,
    pub label: String,
    pub count: usize,
    pub records: Vec<RecordView>,
}

impl From<&DateGroup> for DateGroupView {
    fn from(group: &DateGroup) -> Self {
        Self {
            date: group.date.format(DATE_FORMAT).to_string(),
            label: long_date(group.date),
            count: group.count,
            records: group.records.iter().map(RecordView::from).collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ReportView {
    pub class: ClassView,
    pub total: usize,
    pub groups: Vec<DateGroupView>,
}

impl From<&AttendanceReport> for ReportView {
    fn from(report: &AttendanceReport) -> Self {
        Self {
            class: ClassView::from(&report.class),
            total: report.total(),
            groups: report.groups.iter().map(DateGroupView::from).collect(),
        }
    }
}

/// Field name to its messages, for showing errors under each input
pub fn field_errors(errors: &FieldErrors) -> BTreeMap<String, Vec<String>> {
    let mut by_field: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for error in errors.iter() {
        by_field
            .entry(error.field.clone())
            .or_default()
            .push(error.message.clone());
    }
    by_field
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_long_date() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 4).unwrap();
        assert_eq!(long_date(date), "Monday, March 04, 2024");
    }

    #[test]
    fn test_clock_time() {
        let time = NaiveDate::from_ymd_opt(2024, 3, 4)
            .unwrap()
            .and_hms_opt(18, 5, 0)
            .unwrap();
        assert_eq!(clock_time(time), "06:05 PM");
    }

    #[test]
    fn test_field_errors_grouped() {
        let mut errors = FieldErrors::single("email", "Invalid email address.");
        errors.push("email", "Email must be at most 120 characters.");
        errors.push("phone", "Phone must be at most 20 characters.");

        let grouped = field_errors(&errors);
        assert_eq!(grouped["email"].len(), 2);
        assert_eq!(grouped["phone"].len(), 1);
    }
}
