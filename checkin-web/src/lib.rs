//! # Easy CheckIn Web Server Library
//!
//! Server-rendered check-in kiosk and administration pages for a dance
//! studio.
//!
//! ## Modules
//!
//! - `app`: Application state and router builder
//! - `config`: Configuration management
//! - `error`: Error handling and HTTP response mapping
//! - `flash`: One-shot messages shown on the next page
//! - `middleware`: Security headers
//! - `templates`: Compiled Tera templates
//! - `views`: Template-facing shapes of the domain types
//! - `chat`: Chat assistant client
//! - `routes`: Route handlers

pub mod app;
pub mod chat;
pub mod config;
pub mod error;
pub mod flash;
pub mod middleware;
pub mod routes;
pub mod templates;
pub mod views;
