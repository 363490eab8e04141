//! Server configuration from the environment.

use axum::http::HeaderValue;

use deepcytes_core::defaults;
use deepcytes_db::config::env_or;

/// Settings read once at startup.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Upload ceiling in bytes.
    pub max_file_size: u64,
    /// Cap on `GET /search-history/:userId`.
    pub search_history_limit: u64,
    /// `APP_ENV=development`: expose panic details in responses.
    pub development: bool,
    /// Raw comma-separated CORS origin list.
    pub allowed_origins: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: defaults::SERVER_HOST.to_string(),
            port: defaults::SERVER_PORT,
            max_file_size: defaults::MAX_FILE_SIZE,
            search_history_limit: defaults::SEARCH_HISTORY_LIMIT as u64,
            development: false,
            allowed_origins: defaults::ALLOWED_ORIGINS.to_string(),
        }
    }
}

impl ServerConfig {
    /// Read `HOST`, `PORT`, `MAX_FILE_SIZE`, `SEARCH_HISTORY_LIMIT`,
    /// `APP_ENV`, and `ALLOWED_ORIGINS`.
    pub fn from_env() -> Self {
        let development = std::env::var("APP_ENV")
            .map(|v| v.eq_ignore_ascii_case("development"))
            .unwrap_or(false);
        let search_history_limit: u64 =
            env_or("SEARCH_HISTORY_LIMIT", defaults::SEARCH_HISTORY_LIMIT as u64);

        Self {
            host: env_or("HOST", defaults::SERVER_HOST.to_string()),
            port: env_or("PORT", defaults::SERVER_PORT),
            max_file_size: env_or("MAX_FILE_SIZE", defaults::MAX_FILE_SIZE),
            search_history_limit: if search_history_limit == 0 {
                defaults::SEARCH_HISTORY_LIMIT as u64
            } else {
                search_history_limit
            },
            development,
            allowed_origins: std::env::var("ALLOWED_ORIGINS")
                .unwrap_or_else(|_| defaults::ALLOWED_ORIGINS.to_string()),
        }
    }

    /// Parsed CORS origins.
    pub fn cors_origins(&self) -> Vec<HeaderValue> {
        parse_allowed_origins(&self.allowed_origins)
    }
}

/// Split a comma-separated origin list, dropping blank and invalid entries.
/// An empty list falls back to the default origin.
pub fn parse_allowed_origins(raw: &str) -> Vec<HeaderValue> {
    if raw.trim().is_empty() {
        return vec![HeaderValue::from_static(defaults::ALLOWED_ORIGINS)];
    }

    raw.split(',')
        .filter_map(|s| {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return None;
            }
            match trimmed.parse::<HeaderValue>() {
                Ok(v) => Some(v),
                Err(e) => {
                    tracing::warn!("Invalid CORS origin '{}': {}", trimmed, e);
                    None
                }
            }
        })
        .collect()
}
