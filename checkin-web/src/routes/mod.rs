/// Route handlers
///
/// - `health`: Health check endpoint
/// - `kiosk`: Check-in pages and their JSON helpers
/// - `admin`: Student, class and user administration, attendance report
/// - `auth`: Disabled login/logout and staff registration
/// - `api`: Chat assistant

pub mod admin;
pub mod api;
pub mod auth;
pub mod health;
pub mod kiosk;

use crate::app::AppState;
use crate::error::{WebError, WebResult};
use crate::flash::{self, FlashMessage, FlashView, Level};
use axum::{
    async_trait,
    extract::{FromRequestParts, Path},
    http::{header, request::Parts, HeaderMap, Uri},
    response::{Html, Redirect},
};
use axum_extra::extract::cookie::CookieJar;
use checkin_shared::validation::FieldErrors;
use tera::Context;
use tracing::debug;

/// Numeric record id from the route path
///
/// A segment that is not an integer names no record, so it is a 404 page
/// rather than axum's plain-text 400.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct IdPath(pub i64);

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for IdPath {
    type Rejection = WebError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match Path::<i64>::from_request_parts(parts, state).await {
            Ok(Path(id)) => Ok(Self(id)),
            Err(rejection) => {
                debug!(path = %parts.uri.path(), %rejection, "Non-numeric id in path");
                Err(WebError::NotFound("Page not found".to_string()))
            }
        }
    }
}

/// Renders a page with the pending flash messages plus `extra`
///
/// Returns the jar with the flash cookie cleared.
pub(crate) fn render_page(
    state: &AppState,
    jar: CookieJar,
    template: &str,
    mut context: Context,
    extra: Vec<FlashMessage>,
) -> WebResult<(CookieJar, Html<String>)> {
    let (jar, mut messages) = flash::take(jar);
    messages.extend(extra);

    let messages: Vec<FlashView> = messages.into_iter().map(FlashView::from).collect();
    context.insert("messages", &messages);
    context.insert("version", checkin_shared::VERSION);

    let html = state.templates.render(template, &context)?;
    Ok((jar, Html(html)))
}

/// One error flash per form problem
pub(crate) fn error_flashes(errors: &FieldErrors) -> Vec<FlashMessage> {
    errors
        .iter()
        .map(|error| FlashMessage::new(Level::Error, error.message.clone()))
        .collect()
}

/// Path of the page that sent the request, or `/`
///
/// Only the path and query of the Referer are kept so the redirect never
/// leaves the site.
pub(crate) fn referer_path(headers: &HeaderMap) -> String {
    headers
        .get(header::REFERER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.parse::<Uri>().ok())
        .and_then(|uri| {
            uri.path_and_query()
                .map(|pq| pq.as_str().to_string())
                .filter(|path| path.starts_with('/') && !path.starts_with("//"))
        })
        .unwrap_or_else(|| "/".to_string())
}

/// Flashes an error and sends the browser back where it came from
pub(crate) fn redirect_back(
    jar: CookieJar,
    headers: &HeaderMap,
    message: impl Into<String>,
) -> (CookieJar, Redirect) {
    let jar = flash::push(jar, Level::Error, message);
    (jar, Redirect::to(&referer_path(headers)))
}

/// Parses a form or query id, treating blank as absent
pub(crate) fn parse_id(raw: Option<&str>) -> Option<Result<i64, ()>> {
    raw.map(str::trim)
        .filter(|value| !value.is_empty())
        .map(|value| value.parse::<i64>().map_err(|_| ()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn with_referer(value: &'static str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::REFERER, HeaderValue::from_static(value));
        headers
    }

    #[test]
    fn test_referer_path_keeps_path_and_query() {
        let headers = with_referer("http://localhost:5000/kiosk/3?x=1");
        assert_eq!(referer_path(&headers), "/kiosk/3?x=1");
    }

    #[test]
    fn test_referer_path_defaults_to_home() {
        assert_eq!(referer_path(&HeaderMap::new()), "/");
        assert_eq!(referer_path(&with_referer("not a uri")), "/");
    }

    #[test]
    fn test_parse_id() {
        assert_eq!(parse_id(None), None);
        assert_eq!(parse_id(Some("  ")), None);
        assert_eq!(parse_id(Some("12")), Some(Ok(12)));
        assert_eq!(parse_id(Some("abc")), Some(Err(())));
    }
}
