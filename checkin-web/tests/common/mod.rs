//! Common test utilities for integration tests
//!
//! This module provides shared infrastructure for integration tests:
//! - A migrated in-memory database per test
//! - A clock pinned to Monday 2024-03-04, 18:05
//! - Stub chat assistants
//! - Request and response helpers

#![allow(dead_code)]

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request, Response, StatusCode};
use checkin_shared::clock::FixedClock;
use checkin_shared::db::migrations::run_migrations;
use checkin_shared::db::pool::{create_pool, DatabaseConfig as PoolConfig};
use checkin_shared::models::dance_class::{DanceClass, DanceClassFields, DayOfWeek};
use checkin_shared::models::student::{Student, StudentFields};
use checkin_web::app::{build_router, AppState};
use checkin_web::chat::{ChatError, ChatProvider};
use checkin_web::config::{ChatConfig, Config, DatabaseConfig, ServerConfig};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use sqlx::SqlitePool;
use std::sync::Arc;
use tower::ServiceExt;

/// Test context containing all necessary resources
pub struct TestContext {
    pub db: SqlitePool,
    pub app: axum::Router,
}

impl TestContext {
    /// Creates a context whose chat assistant is not configured
    pub async fn new() -> anyhow::Result<Self> {
        Self::with_chat(None).await
    }

    pub async fn with_chat(chat: Option<Arc<dyn ChatProvider>>) -> anyhow::Result<Self> {
        let db = create_pool(PoolConfig::in_memory()).await?;
        run_migrations(&db).await?;

        let state = AppState::new(db.clone(), test_config())?
            .with_clock(Arc::new(FixedClock(now())))
            .with_chat(chat);
        let app = build_router(state);

        Ok(TestContext { db, app })
    }

    /// Sends one request through a clone of the router
    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.app
            .clone()
            .oneshot(request)
            .await
            .expect("Router is infallible")
    }

    pub async fn get(&self, uri: &str) -> Response<Body> {
        self.send(Request::get(uri).body(Body::empty()).unwrap()).await
    }

    /// GET with a cookie header, used to follow a redirect that set a flash
    pub async fn get_with_cookie(&self, uri: &str, cookie: &str) -> Response<Body> {
        self.send(
            Request::get(uri)
                .header(header::COOKIE, cookie)
                .body(Body::empty())
                .unwrap(),
        )
        .await
    }

    pub async fn post_form(&self, uri: &str, body: &str) -> Response<Body> {
        self.send(
            Request::post(uri)
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
    }

    pub async fn post_json(&self, uri: &str, body: serde_json::Value) -> Response<Body> {
        self.send(
            Request::post(uri)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
    }

    pub async fn student(&self, first: &str, last: &str) -> Student {
        Student::create(
            &self.db,
            StudentFields {
                first_name: first.to_string(),
                last_name: last.to_string(),
                ..Default::default()
            },
        )
        .await
        .expect("Failed to create student")
    }

    pub async fn class(&self, name: &str, day_of_week: DayOfWeek) -> DanceClass {
        DanceClass::create(
            &self.db,
            DanceClassFields {
                name: name.to_string(),
                instructor_name: Some("Maria".to_string()),
                day_of_week,
                start_time: NaiveTime::from_hms_opt(18, 0, 0).unwrap(),
                end_time: NaiveTime::from_hms_opt(19, 0, 0).unwrap(),
                description: None,
            },
        )
        .await
        .expect("Failed to create class")
    }
}

fn test_config() -> Config {
    Config {
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            static_dir: "../static".to_string(),
            production: false,
        },
        database: DatabaseConfig {
            url: "sqlite::memory:".to_string(),
            max_connections: 1,
        },
        chat: ChatConfig::default(),
    }
}

/// Monday 2024-03-04
pub fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, 4).unwrap()
}

pub fn now() -> NaiveDateTime {
    today().and_hms_opt(18, 5, 0).unwrap()
}

/// Chat assistant that always gives the same answer
pub struct CannedChat(pub &'static str);

#[async_trait]
impl ChatProvider for CannedChat {
    async fn reply(&self, _message: &str) -> Result<String, ChatError> {
        Ok(self.0.to_string())
    }
}

/// Chat assistant whose upstream always fails
pub struct BrokenChat;

#[async_trait]
impl ChatProvider for BrokenChat {
    async fn reply(&self, _message: &str) -> Result<String, ChatError> {
        Err(ChatError::Api {
            status: 503,
            body: "overloaded".to_string(),
        })
    }
}

pub async fn body_string(response: Response<Body>) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Failed to read body");
    String::from_utf8(bytes.to_vec()).expect("Body is not UTF-8")
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    serde_json::from_str(&body_string(response).await).expect("Body is not JSON")
}

/// `name=value` of the flash cookie set by a response
pub fn flash_cookie(response: &Response<Body>) -> Option<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .filter(|value| value.starts_with("flash="))
        .filter_map(|value| value.split(';').next())
        .map(str::to_string)
        .next()
}

pub fn location(response: &Response<Body>) -> &str {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
}

pub fn assert_redirect(response: &Response<Body>, to: &str) {
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(response), to);
}
