//! Administration pages: students, classes, users and the attendance report

use super::{error_flashes, parse_id, render_page, IdPath};
use crate::app::AppState;
use crate::error::{WebError, WebResult};
use crate::flash::{self, FlashMessage, Level};
use crate::views::{field_errors, ClassView, ReportView, StudentView, UserView};
use axum::{
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
    Form,
};
use axum_extra::extract::cookie::CookieJar;
use checkin_shared::admin::{self, AdminError};
use checkin_shared::models::dance_class::{DanceClass, DanceClassFields, DayOfWeek};
use checkin_shared::models::student::{Student, StudentFields};
use checkin_shared::models::user::User;
use checkin_shared::report::{self, ReportRange, DATE_FORMAT};
use checkin_shared::validation::{ClassForm, FieldErrors, StudentForm};
use chrono::Datelike;
use serde::Deserialize;
use tera::Context;

/// GET /admin/students
pub async fn students(State(state): State<AppState>, jar: CookieJar) -> WebResult<Response> {
    let students = Student::list_all(&state.db).await?;

    let mut context = Context::new();
    context.insert(
        "students",
        &students.iter().map(StudentView::from).collect::<Vec<_>>(),
    );

    Ok(render_page(&state, jar, "admin/students.html", context, Vec::new())?.into_response())
}

fn render_student_form(
    state: &AppState,
    jar: CookieJar,
    title: &str,
    action: &str,
    form: &StudentForm,
    errors: &FieldErrors,
) -> WebResult<Response> {
    let mut context = Context::new();
    context.insert("title", title);
    context.insert("action", action);
    context.insert("form", form);
    context.insert("errors", &field_errors(errors));

    Ok(render_page(
        state,
        jar,
        "admin/student_form.html",
        context,
        error_flashes(errors),
    )?
    .into_response())
}

/// GET /admin/student/new
pub async fn new_student_form(State(state): State<AppState>, jar: CookieJar) -> WebResult<Response> {
    render_student_form(
        &state,
        jar,
        "New Student",
        "/admin/student/new",
        &StudentForm::default(),
        &FieldErrors::default(),
    )
}

/// POST /admin/student/new
pub async fn create_student(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<StudentForm>,
) -> WebResult<Response> {
    match admin::create_student(&state.db, &form).await {
        Ok(student) => {
            let jar = flash::push(
                jar,
                Level::Success,
                format!("Student {} has been added!", student.full_name()),
            );
            Ok((jar, Redirect::to("/admin/students")).into_response())
        }
        Err(AdminError::Invalid(errors)) => render_student_form(
            &state,
            jar,
            "New Student",
            "/admin/student/new",
            &form,
            &errors,
        ),
        Err(e) => Err(e.into()),
    }
}

async fn find_student(state: &AppState, id: i64) -> WebResult<Student> {
    Student::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| WebError::NotFound(format!("Student {} not found", id)))
}

/// GET /admin/student/edit/:id
pub async fn edit_student_form(
    State(state): State<AppState>,
    jar: CookieJar,
    IdPath(id): IdPath,
) -> WebResult<Response> {
    let student = find_student(&state, id).await?;
    let form = StudentForm::from_fields(&StudentFields {
        first_name: student.first_name,
        last_name: student.last_name,
        email: student.email,
        phone: student.phone,
    });

    render_student_form(
        &state,
        jar,
        "Edit Student",
        &format!("/admin/student/edit/{}", id),
        &form,
        &FieldErrors::default(),
    )
}

/// POST /admin/student/edit/:id
pub async fn update_student(
    State(state): State<AppState>,
    jar: CookieJar,
    IdPath(id): IdPath,
    Form(form): Form<StudentForm>,
) -> WebResult<Response> {
    match admin::update_student(&state.db, id, &form).await {
        Ok(student) => {
            let jar = flash::push(
                jar,
                Level::Success,
                format!("Student {} has been updated!", student.full_name()),
            );
            Ok((jar, Redirect::to("/admin/students")).into_response())
        }
        Err(AdminError::Invalid(errors)) => render_student_form(
            &state,
            jar,
            "Edit Student",
            &format!("/admin/student/edit/{}", id),
            &form,
            &errors,
        ),
        Err(e) => Err(e.into()),
    }
}

/// GET /admin/classes
pub async fn classes(State(state): State<AppState>, jar: CookieJar) -> WebResult<Response> {
    let classes = DanceClass::list_all(&state.db).await?;
    let today = DayOfWeek::from(state.clock.today().weekday());

    let mut context = Context::new();
    context.insert(
        "classes",
        &classes.iter().map(ClassView::from).collect::<Vec<_>>(),
    );
    context.insert("today", today.as_str());

    Ok(render_page(&state, jar, "admin/classes.html", context, Vec::new())?.into_response())
}

fn render_class_form(
    state: &AppState,
    jar: CookieJar,
    title: &str,
    action: &str,
    form: &ClassForm,
    errors: &FieldErrors,
) -> WebResult<Response> {
    let days: Vec<&str> = DayOfWeek::ALL.iter().map(DayOfWeek::as_str).collect();

    let mut context = Context::new();
    context.insert("title", title);
    context.insert("action", action);
    context.insert("form", form);
    context.insert("days", &days);
    context.insert("errors", &field_errors(errors));

    Ok(render_page(
        state,
        jar,
        "admin/class_form.html",
        context,
        error_flashes(errors),
    )?
    .into_response())
}

/// GET /admin/class/new
pub async fn new_class_form(State(state): State<AppState>, jar: CookieJar) -> WebResult<Response> {
    render_class_form(
        &state,
        jar,
        "New Class",
        "/admin/class/new",
        &ClassForm::default(),
        &FieldErrors::default(),
    )
}

/// POST /admin/class/new
pub async fn create_class(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<ClassForm>,
) -> WebResult<Response> {
    match admin::create_class(&state.db, &form).await {
        Ok(class) => {
            let jar = flash::push(
                jar,
                Level::Success,
                format!("Class {} has been added!", class.name),
            );
            Ok((jar, Redirect::to("/admin/classes")).into_response())
        }
        Err(AdminError::Invalid(errors)) => {
            render_class_form(&state, jar, "New Class", "/admin/class/new", &form, &errors)
        }
        Err(e) => Err(e.into()),
    }
}

/// GET /admin/class/edit/:id
pub async fn edit_class_form(
    State(state): State<AppState>,
    jar: CookieJar,
    IdPath(id): IdPath,
) -> WebResult<Response> {
    let class = DanceClass::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| WebError::NotFound(format!("Class {} not found", id)))?;
    let form = ClassForm::from_fields(&DanceClassFields {
        name: class.name,
        instructor_name: class.instructor_name,
        day_of_week: class.day_of_week,
        start_time: class.start_time,
        end_time: class.end_time,
        description: class.description,
    });

    render_class_form(
        &state,
        jar,
        "Edit Class",
        &format!("/admin/class/edit/{}", id),
        &form,
        &FieldErrors::default(),
    )
}

/// POST /admin/class/edit/:id
pub async fn update_class(
    State(state): State<AppState>,
    jar: CookieJar,
    IdPath(id): IdPath,
    Form(form): Form<ClassForm>,
) -> WebResult<Response> {
    match admin::update_class(&state.db, id, &form).await {
        Ok(class) => {
            let jar = flash::push(
                jar,
                Level::Success,
                format!("Class {} has been updated!", class.name),
            );
            Ok((jar, Redirect::to("/admin/classes")).into_response())
        }
        Err(AdminError::Invalid(errors)) => render_class_form(
            &state,
            jar,
            "Edit Class",
            &format!("/admin/class/edit/{}", id),
            &form,
            &errors,
        ),
        Err(e) => Err(e.into()),
    }
}

/// GET /admin/users
pub async fn users(State(state): State<AppState>, jar: CookieJar) -> WebResult<Response> {
    let users = User::list(&state.db).await?;

    let mut context = Context::new();
    context.insert("users", &users.iter().map(UserView::from).collect::<Vec<_>>());

    Ok(render_page(&state, jar, "admin/users.html", context, Vec::new())?.into_response())
}

#[derive(Debug, Deserialize)]
pub struct ReportParams {
    pub class_id: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

/// GET /admin/attendance/report?class_id=&start_date=&end_date=
///
/// Without a class only the picker is shown. Bad dates fall back to the
/// default range with a warning.
pub async fn attendance_report(
    State(state): State<AppState>,
    jar: CookieJar,
    Query(params): Query<ReportParams>,
) -> WebResult<Response> {
    let today = state.clock.today();
    let (range, invalid) = ReportRange::from_query(
        params.start_date.as_deref(),
        params.end_date.as_deref(),
        today,
    );
    let mut warnings: Vec<FlashMessage> = invalid
        .iter()
        .map(|e| FlashMessage::new(Level::Warning, e.to_string()))
        .collect();

    let class_id = match parse_id(params.class_id.as_deref()) {
        Some(Ok(id)) => Some(id),
        Some(Err(())) => {
            warnings.push(FlashMessage::new(Level::Warning, "Invalid class selection"));
            None
        }
        None => None,
    };

    let report = match class_id {
        Some(id) => Some(ReportView::from(
            &report::attendance_report(&state.db, id, range).await?,
        )),
        None => None,
    };

    let classes = DanceClass::list_all(&state.db).await?;

    let mut context = Context::new();
    context.insert(
        "classes",
        &classes.iter().map(ClassView::from).collect::<Vec<_>>(),
    );
    context.insert("selected_class_id", &class_id);
    context.insert("start_date", &range.start.format(DATE_FORMAT).to_string());
    context.insert("end_date", &range.end.format(DATE_FORMAT).to_string());
    context.insert("report", &report);

    Ok(render_page(
        &state,
        jar,
        "admin/attendance_report.html",
        context,
        warnings,
    )?
    .into_response())
}
