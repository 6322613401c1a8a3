/// Configuration management for the web server
///
/// This module loads configuration from environment variables and provides
/// a type-safe configuration struct. A `.env` file in the working directory
/// is read first when present.
///
/// # Environment Variables
///
/// - `APP_HOST`: Host to bind to (default: 0.0.0.0)
/// - `APP_PORT`: Port to bind to (default: 5000)
/// - `APP_PRODUCTION`: Enables HSTS (default: false)
/// - `DATABASE_URL`: SQLite URL (default: sqlite://instance/attendance.db)
/// - `DATABASE_MAX_CONNECTIONS`: Pool size (default: 5)
/// - `STATIC_DIR`: Directory served under /static (default: static)
/// - `OPENAI_API_KEY`: Key for the chat assistant (optional)
/// - `OPENAI_API_BASE`: Chat API base URL (default: https://api.openai.com/v1)
/// - `OPENAI_MODEL`: Chat model (default: gpt-3.5-turbo)
/// - `RUST_LOG`: Log filter
///
/// # Example
///
/// ```no_run
/// use checkin_web::config::Config;
///
/// # fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// println!("Server will listen on {}", config.bind_address());
/// # Ok(())
/// # }
/// ```

use serde::{Deserialize, Serialize};
use std::env;

pub use checkin_shared::db::pool::DEFAULT_DATABASE_URL;
pub const DEFAULT_CHAT_API_BASE: &str = "https://api.openai.com/v1";
pub const DEFAULT_CHAT_MODEL: &str = "gpt-3.5-turbo";

/// Complete application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub chat: ChatConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,

    /// Directory with the CSS and JavaScript served under `/static`
    pub static_dir: String,

    /// Served over HTTPS; turns on HSTS
    pub production: bool,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// SQLite connection URL
    pub url: String,

    /// Maximum number of connections in pool
    pub max_connections: u32,
}

/// Chat assistant configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatConfig {
    /// API key; the assistant answers with a configuration hint without one
    #[serde(skip_serializing)]
    pub api_key: Option<String>,

    /// OpenAI-compatible base URL, without the trailing `/chat/completions`
    pub api_base: String,

    pub model: String,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_base: DEFAULT_CHAT_API_BASE.to_string(),
            model: DEFAULT_CHAT_MODEL.to_string(),
        }
    }
}

fn parse_bool(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

impl Config {
    /// Loads configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if a numeric variable has an invalid value.
    pub fn from_env() -> anyhow::Result<Self> {
        // Load .env file if present (for development)
        dotenvy::dotenv().ok();

        let host = env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "5000".to_string())
            .parse::<u16>()
            .map_err(|e| anyhow::anyhow!("APP_PORT must be a port number: {}", e))?;
        let production = env::var("APP_PRODUCTION")
            .map(|v| parse_bool(&v))
            .unwrap_or(false);
        let static_dir = env::var("STATIC_DIR").unwrap_or_else(|_| "static".to_string());

        let database_url =
            env::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string());
        let max_connections = env::var("DATABASE_MAX_CONNECTIONS")
            .unwrap_or_else(|_| "5".to_string())
            .parse::<u32>()
            .map_err(|e| anyhow::anyhow!("DATABASE_MAX_CONNECTIONS must be a number: {}", e))?;

        let api_key = env::var("OPENAI_API_KEY")
            .ok()
            .filter(|key| !key.trim().is_empty());
        let api_base =
            env::var("OPENAI_API_BASE").unwrap_or_else(|_| DEFAULT_CHAT_API_BASE.to_string());
        let model = env::var("OPENAI_MODEL").unwrap_or_else(|_| DEFAULT_CHAT_MODEL.to_string());

        Ok(Self {
            server: ServerConfig {
                host,
                port,
                static_dir,
                production,
            },
            database: DatabaseConfig {
                url: database_url,
                max_connections,
            },
            chat: ChatConfig {
                api_key,
                api_base,
                model,
            },
        })
    }

    /// Returns the server bind address
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// Pool settings for [`checkin_shared::db::pool::create_pool`]
    pub fn pool_config(&self) -> checkin_shared::db::pool::DatabaseConfig {
        checkin_shared::db::pool::DatabaseConfig {
            url: self.database.url.clone(),
            max_connections: self.database.max_connections,
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> Config {
        Config {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 5000,
                static_dir: "static".to_string(),
                production: false,
            },
            database: DatabaseConfig {
                url: "sqlite::memory:".to_string(),
                max_connections: 3,
            },
            chat: ChatConfig::default(),
        }
    }

    #[test]
    fn test_bind_address() {
        assert_eq!(config().bind_address(), "127.0.0.1:5000");
    }

    #[test]
    fn test_pool_config_carries_url_and_size() {
        let pool = config().pool_config();
        assert_eq!(pool.url, "sqlite::memory:");
        assert_eq!(pool.max_connections, 3);
    }

    #[test]
    fn test_parse_bool() {
        assert!(parse_bool("true"));
        assert!(parse_bool(" 1 "));
        assert!(parse_bool("YES"));
        assert!(!parse_bool("false"));
        assert!(!parse_bool(""));
    }

    #[test]
    fn test_chat_defaults() {
        let chat = ChatConfig::default();
        assert!(chat.api_key.is_none());
        assert_eq!(chat.model, "gpt-3.5-turbo");
    }
}
