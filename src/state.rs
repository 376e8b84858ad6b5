use crate::error::{AppError, Result};
use crate::message::MessageService;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub message_service: MessageService,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageBackend {
    Postgres,
    Rest,
    Memory,
}

impl std::str::FromStr for MessageBackend {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(MessageBackend::Postgres),
            "rest" => Ok(MessageBackend::Rest),
            "memory" => Ok(MessageBackend::Memory),
            other => Err(AppError::Config(format!(
                "MESSAGE_BACKEND must be postgres, rest or memory, got `{}`",
                other
            ))),
        }
    }
}

#[derive(Clone)]
pub struct Config {
    pub jwt_secret: String,
    pub host: String,
    pub port: u16,
    pub backend: MessageBackend,
    pub database_url: Option<String>,
    pub rest_api_url: Option<String>,
    pub rest_api_key: Option<String>,
    pub cors_origins: Vec<String>,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("jwt_secret", &"<redacted>")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("backend", &self.backend)
            .field(
                "database_url",
                &self.database_url.as_deref().map(crate::db::redact_database_url),
            )
            .field("rest_api_url", &self.rest_api_url)
            .field("rest_api_key", &self.rest_api_key.as_ref().map(|_| "<redacted>"))
            .field("cors_origins", &self.cors_origins)
            .finish()
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let required = |key: &str| {
            lookup(key)
                .filter(|v| !v.is_empty())
                .ok_or_else(|| AppError::Config(format!("{} must be set", key)))
        };

        let backend = lookup("MESSAGE_BACKEND")
            .unwrap_or_else(|| "postgres".to_string())
            .parse::<MessageBackend>()?;

        let port = lookup("PORT")
            .unwrap_or_else(|| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| AppError::Config("PORT must be a number".to_string()))?;

        let (database_url, rest_api_url) = match backend {
            MessageBackend::Postgres => (Some(required("DATABASE_URL")?), None),
            MessageBackend::Rest => (None, Some(required("REST_API_URL")?)),
            MessageBackend::Memory => (None, None),
        };

        let cors_origins = lookup("CORS_ORIGINS")
            .map(|v| {
                v.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_else(|| vec!["http://localhost:3000".to_string()]);

        Ok(Self {
            jwt_secret: required("JWT_SECRET")?,
            host: lookup("HOST").unwrap_or_else(|| "127.0.0.1".to_string()),
            port,
            backend,
            database_url,
            rest_api_url,
            rest_api_key: lookup("REST_API_KEY").filter(|v| !v.is_empty()),
            cors_origins,
        })
    }
}
