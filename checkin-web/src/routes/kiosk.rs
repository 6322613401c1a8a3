//! Check-in kiosk: today's classes, the per-class student list and the
//! endpoints its buttons and search box call

use super::{parse_id, redirect_back, render_page, IdPath};
use crate::app::AppState;
use crate::error::{WebError, WebResult};
use crate::flash::{self, Level};
use crate::views::{clock_time, long_date, ClassView, StudentView};
use axum::{
    extract::{rejection::JsonRejection, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Redirect, Response},
    Form, Json,
};
use axum_extra::extract::cookie::CookieJar;
use checkin_shared::attendance::{self, StudentSearchHit};
use checkin_shared::error::ServiceError;
use checkin_shared::models::attendance::Attendance;
use checkin_shared::models::dance_class::{DanceClass, DayOfWeek};
use checkin_shared::models::student::Student;
use chrono::Datelike;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tera::Context;
use tracing::{error, info};

const MISSING_INFORMATION: &str = "Missing required information";

/// GET /: classes meeting today
pub async fn index(State(state): State<AppState>, jar: CookieJar) -> WebResult<Response> {
    let today = state.clock.today();
    let classes = DanceClass::list_by_day(&state.db, DayOfWeek::from(today.weekday())).await?;

    let mut context = Context::new();
    context.insert(
        "classes",
        &classes.iter().map(ClassView::from).collect::<Vec<_>>(),
    );
    context.insert("today", &long_date(today));

    Ok(render_page(&state, jar, "index.html", context, Vec::new())?.into_response())
}

#[derive(Debug, Serialize)]
struct KioskStudent {
    #[serde(flatten)]
    student: StudentView,
    checked_in: bool,
}

/// GET /kiosk/:class_id: every student with today's check-in state
pub async fn kiosk(
    State(state): State<AppState>,
    jar: CookieJar,
    IdPath(class_id): IdPath,
) -> WebResult<Response> {
    let class = DanceClass::find_by_id(&state.db, class_id)
        .await?
        .ok_or_else(|| WebError::NotFound(format!("Class {} not found", class_id)))?;

    let today = state.clock.today();
    let students = Student::list_all(&state.db).await?;
    let checked_in: HashSet<i64> = Attendance::checked_in_student_ids(&state.db, class_id, today)
        .await?
        .into_iter()
        .collect();

    let rows: Vec<KioskStudent> = students
        .iter()
        .map(|student| KioskStudent {
            student: StudentView::from(student),
            checked_in: checked_in.contains(&student.id),
        })
        .collect();

    let mut context = Context::new();
    context.insert("class", &ClassView::from(&class));
    context.insert("students", &rows);
    context.insert("checked_in_count", &checked_in.len());
    context.insert("today", &long_date(today));

    Ok(render_page(&state, jar, "kiosk.html", context, Vec::new())?.into_response())
}

/// Student and class ids posted by the kiosk buttons
#[derive(Debug, Deserialize)]
pub struct AttendanceForm {
    pub student_id: Option<String>,
    pub class_id: Option<String>,
}

enum FormIds {
    Missing,
    Invalid,
    Valid { student_id: i64, class_id: i64 },
}

impl AttendanceForm {
    fn ids(&self) -> FormIds {
        match (
            parse_id(self.student_id.as_deref()),
            parse_id(self.class_id.as_deref()),
        ) {
            (Some(Ok(student_id)), Some(Ok(class_id))) => FormIds::Valid {
                student_id,
                class_id,
            },
            (None, _) | (_, None) => FormIds::Missing,
            _ => FormIds::Invalid,
        }
    }
}

/// POST /mark_attendance: checks a student in and shows the confirmation
pub async fn mark_attendance(
    State(state): State<AppState>,
    jar: CookieJar,
    headers: HeaderMap,
    Form(form): Form<AttendanceForm>,
) -> WebResult<Response> {
    let (student_id, class_id) = match form.ids() {
        FormIds::Valid {
            student_id,
            class_id,
        } => (student_id, class_id),
        FormIds::Missing => return Ok(redirect_back(jar, &headers, MISSING_INFORMATION).into_response()),
        FormIds::Invalid => {
            let message = ServiceError::InvalidStudentOrClass.to_string();
            return Ok(redirect_back(jar, &headers, message).into_response());
        }
    };

    let outcome = match attendance::mark(&state.db, student_id, class_id, state.clock.now()).await {
        Ok(outcome) => outcome,
        Err(e @ ServiceError::InvalidStudentOrClass) => {
            return Ok(redirect_back(jar, &headers, e.to_string()).into_response());
        }
        Err(e) => return Err(e.into()),
    };

    let mut context = Context::new();
    context.insert("student", &StudentView::from(&outcome.student));
    context.insert("class", &ClassView::from(&outcome.class));
    context.insert("already_checked_in", &outcome.already_checked_in());
    context.insert("time", &clock_time(outcome.attendance.time_in));

    Ok(render_page(
        &state,
        jar,
        "attendance_confirmation.html",
        context,
        Vec::new(),
    )?
    .into_response())
}

/// POST /uncheck_attendance: removes today's check-in, back to the kiosk
pub async fn uncheck_attendance(
    State(state): State<AppState>,
    jar: CookieJar,
    headers: HeaderMap,
    Form(form): Form<AttendanceForm>,
) -> WebResult<Response> {
    let (student_id, class_id) = match form.ids() {
        FormIds::Valid {
            student_id,
            class_id,
        } => (student_id, class_id),
        FormIds::Missing => return Ok(redirect_back(jar, &headers, MISSING_INFORMATION).into_response()),
        FormIds::Invalid => {
            let message = ServiceError::InvalidStudentOrClass.to_string();
            return Ok(redirect_back(jar, &headers, message).into_response());
        }
    };

    let outcome = match attendance::unmark(&state.db, student_id, class_id, state.clock.today()).await {
        Ok(outcome) => outcome,
        Err(e @ ServiceError::InvalidStudentOrClass) => {
            return Ok(redirect_back(jar, &headers, e.to_string()).into_response());
        }
        Err(e) => return Err(e.into()),
    };

    let jar = if outcome.removed {
        flash::push(
            jar,
            Level::Success,
            format!(
                "{} has been un-checked in from {}",
                outcome.student.full_name(),
                outcome.class.name
            ),
        )
    } else {
        flash::push(
            jar,
            Level::Warning,
            format!("{} was not checked in today", outcome.student.full_name()),
        )
    };

    Ok((jar, Redirect::to(&format!("/kiosk/{}", class_id))).into_response())
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub query: Option<String>,
    pub class_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SearchResponse {
    pub students: Vec<StudentSearchHit>,
}

fn json_internal_error(err: impl std::fmt::Display) -> Response {
    error!("Internal error: {}", err);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(serde_json::json!({ "error": "An internal error occurred" })),
    )
        .into_response()
}

/// GET /search_students?query=&class_id=
pub async fn search_students(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Response {
    let class_id = parse_id(params.class_id.as_deref()).and_then(Result::ok);
    let query = params.query.unwrap_or_default();

    match attendance::search_students(&state.db, &query, class_id, state.clock.today()).await {
        Ok(students) => Json(SearchResponse { students }).into_response(),
        Err(e) => json_internal_error(e),
    }
}

/// An id sent as a JSON number or a numeric string
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum FlexibleId {
    Number(i64),
    Text(String),
}

impl FlexibleId {
    pub fn as_id(&self) -> Option<i64> {
        match self {
            FlexibleId::Number(id) => Some(*id),
            FlexibleId::Text(text) => text.trim().parse().ok(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct BatchRequest {
    #[serde(default)]
    pub student_ids: Option<Vec<FlexibleId>>,

    #[serde(default)]
    pub class_id: Option<FlexibleId>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BatchResponse {
    pub success: bool,
    pub message: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub students: Option<Vec<StudentSearchHit>>,
}

impl BatchResponse {
    fn failure(message: impl Into<String>) -> Json<Self> {
        Json(Self {
            success: false,
            message: message.into(),
            students: None,
        })
    }
}

/// POST /mark_attendance_batch: checks several students in at once
///
/// Ids that are not numbers are skipped like unknown students.
pub async fn mark_attendance_batch(
    State(state): State<AppState>,
    payload: Result<Json<BatchRequest>, JsonRejection>,
) -> Response {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => {
            tracing::debug!(error = %rejection, "Unreadable batch check-in body");
            return BatchResponse::failure(MISSING_INFORMATION).into_response();
        }
    };

    let student_ids = request.student_ids.unwrap_or_default();
    let Some(class_id) = request.class_id else {
        return BatchResponse::failure(MISSING_INFORMATION).into_response();
    };
    if student_ids.is_empty() {
        return BatchResponse::failure(MISSING_INFORMATION).into_response();
    }

    let Some(class_id) = class_id.as_id() else {
        return BatchResponse::failure(ServiceError::InvalidClass.to_string()).into_response();
    };
    let ids: Vec<i64> = student_ids.iter().filter_map(FlexibleId::as_id).collect();

    match attendance::mark_batch(&state.db, class_id, &ids, state.clock.now()).await {
        Ok(students) => {
            info!(class_id, count = students.len(), "Batch check-in via kiosk");
            let hits: Vec<StudentSearchHit> = students
                .iter()
                .map(|student| StudentSearchHit {
                    id: student.id,
                    name: student.full_name(),
                    checked_in: true,
                })
                .collect();

            Json(BatchResponse {
                success: true,
                message: format!("Successfully checked in {} students", hits.len()),
                students: Some(hits),
            })
            .into_response()
        }
        Err(e @ ServiceError::InvalidClass) => BatchResponse::failure(e.to_string()).into_response(),
        Err(e) => {
            error!("Batch check-in failed: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                BatchResponse::failure("An internal error occurred"),
            )
                .into_response()
        }
    }
}

#[derive(Debug, Serialize)]
struct DashboardRow {
    #[serde(flatten)]
    class: ClassView,
    meets_today: bool,
    checked_in_today: i64,
}

/// GET /dashboard: every class, with today's check-in counts
pub async fn dashboard(State(state): State<AppState>, jar: CookieJar) -> WebResult<Response> {
    let today = state.clock.today();
    let today_name = DayOfWeek::from(today.weekday());
    let classes = DanceClass::list_all(&state.db).await?;

    let mut rows = Vec::with_capacity(classes.len());
    for class in &classes {
        rows.push(DashboardRow {
            class: ClassView::from(class),
            meets_today: class.day_of_week == today_name,
            checked_in_today: Attendance::count_for_day(&state.db, class.id, today).await?,
        });
    }

    let mut context = Context::new();
    context.insert("classes", &rows);
    context.insert("today", &long_date(today));

    Ok(render_page(&state, jar, "dashboard.html", context, Vec::new())?.into_response())
}
