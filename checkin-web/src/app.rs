/// Application state and router builder
///
/// This module defines the shared application state and provides
/// a function to build the Axum router with all routes and middleware.
///
/// # Example
///
/// ```no_run
/// use checkin_web::{app::AppState, config::Config};
/// use checkin_shared::db::pool::create_pool;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let pool = create_pool(config.pool_config()).await?;
/// let state = AppState::new(pool, config)?;
/// let app = checkin_web::app::build_router(state);
/// # Ok(())
/// # }
/// ```

use crate::chat::{ChatProvider, OpenAiChat};
use crate::{config::Config, middleware::security::SecurityHeadersLayer, templates::Templates};
use axum::{
    response::Redirect,
    routing::{get, post},
    Router,
};
use checkin_shared::clock::{Clock, SystemClock};
use sqlx::SqlitePool;
use std::sync::Arc;
use tower_http::{
    services::ServeDir,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state
///
/// Cloned for each request handler via Axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: SqlitePool,

    /// Application configuration
    pub config: Arc<Config>,

    pub templates: Arc<Templates>,

    /// Source of "now" for check-ins and reports
    pub clock: Arc<dyn Clock>,

    /// Chat assistant, None when no API key is configured
    pub chat: Option<Arc<dyn ChatProvider>>,
}

impl AppState {
    /// Creates application state with the system clock
    ///
    /// # Errors
    ///
    /// Fails when a template does not parse or the chat client cannot be built.
    pub fn new(db: SqlitePool, config: Config) -> anyhow::Result<Self> {
        let templates = Templates::new()?;
        let chat = OpenAiChat::from_config(&config.chat)?
            .map(|chat| Arc::new(chat) as Arc<dyn ChatProvider>);

        Ok(Self {
            db,
            config: Arc::new(config),
            templates: Arc::new(templates),
            clock: Arc::new(SystemClock),
            chat,
        })
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_chat(mut self, chat: Option<Arc<dyn ChatProvider>>) -> Self {
        self.chat = chat;
        self
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// # Architecture
///
/// ```text
/// /
/// ├── GET  /                          # Today's classes
/// ├── GET  /kiosk/:class_id           # Check-in kiosk of one class
/// ├── POST /mark_attendance           # Check a student in (form)
/// ├── POST /uncheck_attendance        # Undo today's check-in (form)
/// ├── GET  /search_students           # Kiosk search (JSON)
/// ├── POST /mark_attendance_batch     # Check several students in (JSON)
/// ├── GET  /dashboard                 # All classes
/// ├── GET  /health
/// ├── /admin/
/// │   ├── students, student/new, student/edit/:id
/// │   ├── classes, class/new, class/edit/:id
/// │   ├── users
/// │   └── attendance/report
/// ├── /auth/
/// │   ├── GET login, GET logout       # Disabled, redirect home
/// │   └── GET|POST register
/// ├── POST /api/chat
/// └── /static/*
/// ```
///
/// # Middleware Stack
///
/// 1. Logging (tower-http TraceLayer)
/// 2. Security headers
pub fn build_router(state: AppState) -> Router {
    use crate::routes;

    let kiosk_routes = Router::new()
        .route("/", get(routes::kiosk::index))
        .route("/kiosk/:class_id", get(routes::kiosk::kiosk))
        .route("/mark_attendance", post(routes::kiosk::mark_attendance))
        .route("/uncheck_attendance", post(routes::kiosk::uncheck_attendance))
        .route("/search_students", get(routes::kiosk::search_students))
        .route("/mark_attendance_batch", post(routes::kiosk::mark_attendance_batch))
        .route("/dashboard", get(routes::kiosk::dashboard));

    let admin_routes = Router::new()
        .route("/students", get(routes::admin::students))
        .route(
            "/student/new",
            get(routes::admin::new_student_form).post(routes::admin::create_student),
        )
        .route(
            "/student/edit/:id",
            get(routes::admin::edit_student_form).post(routes::admin::update_student),
        )
        .route("/classes", get(routes::admin::classes))
        .route(
            "/class/new",
            get(routes::admin::new_class_form).post(routes::admin::create_class),
        )
        .route(
            "/class/edit/:id",
            get(routes::admin::edit_class_form).post(routes::admin::update_class),
        )
        .route("/users", get(routes::admin::users))
        .route("/attendance/report", get(routes::admin::attendance_report));

    let auth_routes = Router::new()
        .route("/login", get(routes::auth::login))
        .route("/logout", get(routes::auth::logout))
        .route(
            "/register",
            get(routes::auth::register_form).post(routes::auth::register),
        );

    let api_routes = Router::new().route("/chat", post(routes::api::chat));

    let static_files = ServeDir::new(&state.config.server.static_dir);

    Router::new()
        .merge(kiosk_routes)
        .route("/health", get(routes::health::health_check))
        .route("/admin", get(admin_home))
        .route("/admin/", get(admin_home))
        .nest("/admin", admin_routes)
        .nest("/auth", auth_routes)
        .nest("/api", api_routes)
        .nest_service("/static", static_files)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(SecurityHeadersLayer::new(state.config.server.production))
        .with_state(state)
}

async fn admin_home() -> Redirect {
    Redirect::to("/admin/students")
}
