//! One-shot flash messages carried in a cookie
//!
//! A handler that redirects pushes messages onto the cookie; the next page
//! rendered takes them off and shows them above its content. The cookie
//! value is URL-encoded JSON so it survives any message text.

use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::{Deserialize, Serialize};
use tracing::warn;

pub const FLASH_COOKIE: &str = "flash";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Success,
    Info,
    Warning,
    Error,
}

impl Level {
    /// Stylesheet class of the alert box
    pub fn css_class(&self) -> &'static str {
        match self {
            Level::Success => "success",
            Level::Info => "info",
            Level::Warning => "warning",
            Level::Error => "danger",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlashMessage {
    pub level: Level,
    pub message: String,
}

impl FlashMessage {
    pub fn new(level: Level, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
        }
    }
}

/// Message as the templates see it
#[derive(Debug, Clone, Serialize)]
pub struct FlashView {
    pub class: &'static str,
    pub message: String,
}

impl From<FlashMessage> for FlashView {
    fn from(flash: FlashMessage) -> Self {
        Self {
            class: flash.level.css_class(),
            message: flash.message,
        }
    }
}

fn decode(value: &str) -> Vec<FlashMessage> {
    let parsed = urlencoding::decode(value)
        .map_err(|e| e.to_string())
        .and_then(|json| serde_json::from_str(&json).map_err(|e| e.to_string()));

    match parsed {
        Ok(messages) => messages,
        Err(e) => {
            warn!(error = %e, "Discarding unreadable flash cookie");
            Vec::new()
        }
    }
}

fn encode(messages: &[FlashMessage]) -> String {
    let json = serde_json::to_string(messages).unwrap_or_else(|_| "[]".to_string());
    urlencoding::encode(&json).into_owned()
}

fn pending(jar: &CookieJar) -> Vec<FlashMessage> {
    jar.get(FLASH_COOKIE)
        .map(|cookie| decode(cookie.value()))
        .unwrap_or_default()
}

/// Queues a message for the next rendered page
pub fn push(jar: CookieJar, level: Level, message: impl Into<String>) -> CookieJar {
    let mut messages = pending(&jar);
    messages.push(FlashMessage::new(level, message));

    let cookie = Cookie::build((FLASH_COOKIE, encode(&messages)))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax);
    jar.add(cookie)
}

/// Removes and returns the queued messages
pub fn take(jar: CookieJar) -> (CookieJar, Vec<FlashMessage>) {
    let messages = pending(&jar);
    if jar.get(FLASH_COOKIE).is_none() {
        return (jar, messages);
    }

    let jar = jar.remove(Cookie::build((FLASH_COOKIE, "")).path("/"));
    (jar, messages)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_then_take() {
        let jar = push(CookieJar::new(), Level::Success, "Ana Lopez checked in");
        let jar = push(jar, Level::Warning, "Second & last; 100%");

        let (_, messages) = take(jar);
        assert_eq!(
            messages,
            vec![
                FlashMessage::new(Level::Success, "Ana Lopez checked in"),
                FlashMessage::new(Level::Warning, "Second & last; 100%"),
            ]
        );
    }

    #[test]
    fn test_take_empty_jar() {
        let (_, messages) = take(CookieJar::new());
        assert!(messages.is_empty());
    }

    #[test]
    fn test_garbage_cookie_is_ignored() {
        let jar = CookieJar::new().add(Cookie::new(FLASH_COOKIE, "not-json"));
        let (_, messages) = take(jar);
        assert!(messages.is_empty());
    }

    #[test]
    fn test_error_level_maps_to_danger() {
        let view = FlashView::from(FlashMessage::new(Level::Error, "Invalid class"));
        assert_eq!(view.class, "danger");
    }

    #[test]
    fn test_cookie_value_is_url_encoded() {
        let jar = push(CookieJar::new(), Level::Info, "a; b");
        let value = jar.get(FLASH_COOKIE).unwrap().value().to_string();
        assert!(!value.contains(';'));
        assert!(!value.contains(' '));
    }
}
