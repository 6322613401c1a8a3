//! Staff accounts
//!
//! Signing in is disabled: every page is open. The login and logout links
//! only explain that. Registration still records staff accounts.

use super::{error_flashes, render_page};
use crate::app::AppState;
use crate::error::WebResult;
use crate::flash::{self, Level};
use crate::views::field_errors;
use axum::{
    extract::State,
    response::{IntoResponse, Redirect, Response},
    Form,
};
use axum_extra::extract::cookie::CookieJar;
use checkin_shared::admin::{self, AdminError};
use checkin_shared::validation::{FieldErrors, RegistrationForm};
use tera::Context;

pub const LOGIN_DISABLED: &str =
    "Login functionality has been disabled. All pages are now accessible without authentication.";

/// GET /auth/login
pub async fn login(jar: CookieJar) -> (CookieJar, Redirect) {
    (flash::push(jar, Level::Info, LOGIN_DISABLED), Redirect::to("/"))
}

/// GET /auth/logout
pub async fn logout(jar: CookieJar) -> (CookieJar, Redirect) {
    (flash::push(jar, Level::Info, LOGIN_DISABLED), Redirect::to("/"))
}

fn render_register(
    state: &AppState,
    jar: CookieJar,
    form: &RegistrationForm,
    errors: &FieldErrors,
) -> WebResult<Response> {
    let mut context = Context::new();
    context.insert("form", form);
    context.insert("errors", &field_errors(errors));

    Ok(render_page(
        state,
        jar,
        "auth/register.html",
        context,
        error_flashes(errors),
    )?
    .into_response())
}

/// GET /auth/register
pub async fn register_form(State(state): State<AppState>, jar: CookieJar) -> WebResult<Response> {
    render_register(&state, jar, &RegistrationForm::default(), &FieldErrors::default())
}

/// POST /auth/register
pub async fn register(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<RegistrationForm>,
) -> WebResult<Response> {
    match admin::register_user(&state.db, &form).await {
        Ok(user) => {
            let jar = flash::push(
                jar,
                Level::Success,
                format!("User {} has been created!", user.username),
            );
            Ok((jar, Redirect::to("/admin/users")).into_response())
        }
        Err(AdminError::Invalid(errors)) => render_register(&state, jar, &form, &errors),
        Err(e) => Err(e.into()),
    }
}
