/// Error handling for the web server
///
/// HTML handlers return `Result<T, WebError>`; the error renders as a small
/// standalone page with the matching status code. JSON endpoints build
/// their own error payloads and never return `WebError`.
///
/// # Example
///
/// ```
/// use checkin_web::error::{WebError, WebResult};
///
/// fn find(id: i64) -> WebResult<&'static str> {
///     match id {
///         1 => Ok("Salsa 1"),
///         _ => Err(WebError::NotFound(format!("Class {} not found", id))),
///     }
/// }
///
/// assert!(find(2).is_err());
/// ```

use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use checkin_shared::admin::AdminError;
use checkin_shared::error::ServiceError;
use std::fmt;

/// Web result type alias
pub type WebResult<T> = Result<T, WebError>;

/// Unified error type for page handlers
#[derive(Debug)]
pub enum WebError {
    /// Bad request (400)
    BadRequest(String),

    /// Not found (404)
    NotFound(String),

    /// Template failed to render (500)
    Template(String),

    /// Internal server error (500)
    Internal(String),
}

impl fmt::Display for WebError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WebError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            WebError::NotFound(msg) => write!(f, "Not found: {}", msg),
            WebError::Template(msg) => write!(f, "Template error: {}", msg),
            WebError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for WebError {}

impl WebError {
    pub fn status(&self) -> StatusCode {
        match self {
            WebError::BadRequest(_) => StatusCode::BAD_REQUEST,
            WebError::NotFound(_) => StatusCode::NOT_FOUND,
            WebError::Template(_) | WebError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

fn error_page(status: StatusCode, message: &str) -> String {
    let title = status.canonical_reason().unwrap_or("Error");
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="utf-8">
    <title>{code} {title} - Easy CheckIn</title>
    <link rel="stylesheet" href="/static/css/style.css">
</head>
<body>
    <main class="container error-page">
        <h1>{code} {title}</h1>
        <p>{message}</p>
        <p><a href="/">Back to check-in</a></p>
    </main>
</body>
</html>
"#,
        code = status.as_u16(),
        title = title,
        message = tera::escape_html(message),
    )
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match self {
            WebError::BadRequest(msg) | WebError::NotFound(msg) => msg,
            WebError::Template(msg) => {
                tracing::error!("Template error: {}", msg);
                "The page could not be rendered".to_string()
            }
            WebError::Internal(msg) => {
                // Log internal errors but don't expose details to clients
                tracing::error!("Internal error: {}", msg);
                "An internal error occurred".to_string()
            }
        };

        (status, Html(error_page(status, &message))).into_response()
    }
}

/// Convert sqlx errors to web errors
impl From<sqlx::Error> for WebError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => WebError::NotFound("Resource not found".to_string()),
            _ => WebError::Internal(format!("Database error: {}", err)),
        }
    }
}

impl From<ServiceError> for WebError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::InvalidStudentOrClass | ServiceError::InvalidClass => {
                WebError::BadRequest(err.to_string())
            }
            ServiceError::ClassNotFound(_) => WebError::NotFound(err.to_string()),
            ServiceError::Database(db_err) => db_err.into(),
        }
    }
}

/// Field errors are shown on the form, so only the remaining cases get here
impl From<AdminError> for WebError {
    fn from(err: AdminError) -> Self {
        match err {
            AdminError::Invalid(errors) => WebError::BadRequest(errors.to_string()),
            AdminError::StudentNotFound(_) | AdminError::ClassNotFound(_) => {
                WebError::NotFound(err.to_string())
            }
            AdminError::Password(e) => WebError::Internal(format!("Password hashing failed: {}", e)),
            AdminError::Database(db_err) => db_err.into(),
        }
    }
}

impl From<tera::Error> for WebError {
    fn from(err: tera::Error) -> Self {
        use std::error::Error as _;

        let mut message = err.to_string();
        let mut source = err.source();
        while let Some(cause) = source {
            message.push_str(": ");
            message.push_str(&cause.to_string());
            source = cause.source();
        }
        WebError::Template(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = WebError::BadRequest("Invalid input".to_string());
        assert_eq!(err.to_string(), "Bad request: Invalid input");

        let err = WebError::NotFound("Class 3 not found".to_string());
        assert_eq!(err.to_string(), "Not found: Class 3 not found");
    }

    #[test]
    fn test_service_error_mapping() {
        assert_eq!(
            WebError::from(ServiceError::ClassNotFound(3)).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            WebError::from(ServiceError::InvalidStudentOrClass).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            WebError::from(ServiceError::Database(sqlx::Error::PoolClosed)).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_error_page_escapes_message() {
        let page = error_page(StatusCode::NOT_FOUND, "<script>");
        assert!(page.contains("404 Not Found"));
        assert!(page.contains("&lt;script&gt;"));
        assert!(!page.contains("<script>"));
    }

    #[test]
    fn test_into_response_status() {
        let response = WebError::NotFound("gone".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = WebError::Internal("boom".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
