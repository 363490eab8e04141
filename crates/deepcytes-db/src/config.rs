//! Store connection configuration.

use std::fmt::Display;
use std::str::FromStr;
use std::time::Duration;

use tracing::warn;

use deepcytes_core::defaults;

/// Read `key` from the environment and parse it, falling back to `default`
/// (with a warning) when the value does not parse.
pub fn env_or<T>(key: &str, default: T) -> T
where
    T: FromStr,
    T::Err: Display,
{
    match std::env::var(key) {
        Ok(raw) if !raw.trim().is_empty() => match raw.trim().parse() {
            Ok(value) => value,
            Err(e) => {
                warn!("Invalid {} value '{}': {}, using default", key, raw, e);
                default
            }
        },
        _ => default,
    }
}

/// Read a boolean flag (`true`/`1` or `false`/`0`) from the environment.
pub fn env_flag(key: &str, default: bool) -> bool {
    std::env::var(key)
        .map(|v| match v.trim().to_ascii_lowercase().as_str() {
            "true" | "1" => true,
            "false" | "0" => false,
            _ => default,
        })
        .unwrap_or(default)
}

/// Search engine connection options.
#[derive(Debug, Clone)]
pub struct ElasticConfig {
    /// Node URL including scheme and port.
    pub node: String,
    /// Basic-auth user.
    pub username: String,
    /// Basic-auth password; no auth header is sent when unset.
    pub password: Option<String>,
    /// Accept self-signed or otherwise invalid TLS certificates.
    pub tls_insecure: bool,
    /// Timeout applied to every call.
    pub timeout: Duration,
}

impl Default for ElasticConfig {
    fn default() -> Self {
        Self {
            node: defaults::ES_NODE.to_string(),
            username: defaults::ES_USER.to_string(),
            password: None,
            tls_insecure: true,
            timeout: Duration::from_secs(defaults::ES_TIMEOUT_SECS),
        }
    }
}

impl ElasticConfig {
    /// Create a configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Read `ES_NODE`, `ES_USER`, `ES_PASS`, `ES_TLS_INSECURE`, `ES_TIMEOUT_SECS`.
    pub fn from_env() -> Self {
        let password = std::env::var("ES_PASS").ok().filter(|p| !p.is_empty());
        Self {
            node: env_or("ES_NODE", defaults::ES_NODE.to_string()),
            username: env_or("ES_USER", defaults::ES_USER.to_string()),
            password,
            tls_insecure: env_flag("ES_TLS_INSECURE", true),
            timeout: Duration::from_secs(env_or("ES_TIMEOUT_SECS", defaults::ES_TIMEOUT_SECS)),
        }
    }

    /// Set the node URL.
    pub fn node(mut self, node: impl Into<String>) -> Self {
        self.node = node.into();
        self
    }

    /// Set basic-auth credentials.
    pub fn credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.username = username.into();
        self.password = Some(password.into());
        self
    }

    /// Toggle TLS certificate verification.
    pub fn tls_insecure(mut self, insecure: bool) -> Self {
        self.tls_insecure = insecure;
        self
    }

    /// Set the per-call timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Document store connection options.
#[derive(Debug, Clone)]
pub struct MongoConfig {
    /// Connection string; the path names the database.
    pub uri: String,
    /// How long to wait for a usable server before failing an operation.
    pub server_selection_timeout: Duration,
}

impl Default for MongoConfig {
    fn default() -> Self {
        Self {
            uri: defaults::MONGO_URI.to_string(),
            server_selection_timeout: Duration::from_secs(
                defaults::MONGO_SERVER_SELECTION_TIMEOUT_SECS,
            ),
        }
    }
}

impl MongoConfig {
    /// Create a configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Read `MONGO_URI`.
    pub fn from_env() -> Self {
        Self {
            uri: env_or("MONGO_URI", defaults::MONGO_URI.to_string()),
            ..Self::default()
        }
    }

    /// Set the connection string.
    pub fn uri(mut self, uri: impl Into<String>) -> Self {
        self.uri = uri.into();
        self
    }

    /// Set the server selection timeout.
    pub fn server_selection_timeout(mut self, timeout: Duration) -> Self {
        self.server_selection_timeout = timeout;
        self
    }
}

/// Hide credentials embedded in a connection string before logging it.
pub fn redact_uri(uri: &str) -> String {
    match (uri.find("://"), uri.rfind('@')) {
        (Some(scheme_end), Some(at)) if at > scheme_end => {
            format!("{}://***@{}", &uri[..scheme_end], &uri[at + 1..])
        }
        _ => uri.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_elastic_config_defaults() {
        let config = ElasticConfig::default();
        assert_eq!(config.node, "https://127.0.0.1:9200");
        assert_eq!(config.username, "elastic");
        assert!(config.password.is_none());
        assert!(config.tls_insecure);
        assert_eq!(config.timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_elastic_config_builder() {
        let config = ElasticConfig::new()
            .node("http://es:9200")
            .credentials("admin", "pw")
            .tls_insecure(false)
            .timeout(Duration::from_secs(5));

        assert_eq!(config.node, "http://es:9200");
        assert_eq!(config.username, "admin");
        assert_eq!(config.password.as_deref(), Some("pw"));
        assert!(!config.tls_insecure);
        assert_eq!(config.timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_mongo_config_defaults() {
        let config = MongoConfig::default();
        assert_eq!(config.uri, "mongodb://localhost:27017/deepcytes");
        assert_eq!(config.server_selection_timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_env_or_falls_back_on_unset_key() {
        let value: u16 = env_or("DEEPCYTES_TEST_SURELY_UNSET_KEY", 4001);
        assert_eq!(value, 4001);
    }

    #[test]
    fn test_redact_uri() {
        assert_eq!(
            redact_uri("mongodb://user:secret@db:27017/deepcytes"),
            "mongodb://***@db:27017/deepcytes"
        );
        assert_eq!(
            redact_uri("mongodb://localhost:27017/deepcytes"),
            "mongodb://localhost:27017/deepcytes"
        );
    }
}
