//! Server configuration module
//!
//! Handles loading configuration from environment variables with sensible defaults.

use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

/// Which document store backs the search history.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StoreBackend {
    /// MongoDB when `DATABASE_URL` and `DATABASE_NAME` are both set, otherwise none
    #[default]
    Auto,
    /// Process-local store, lost on restart
    Memory,
}

/// Server configuration loaded from environment variables
#[derive(Clone)]
pub struct Config {
    /// Server port (default: 8000)
    pub port: u16,
    /// Server host (default: 0.0.0.0)
    pub host: [u8; 4],
    /// Allowed CORS origins, comma-separated (default: allow all)
    pub allowed_origins: Option<Vec<String>>,
    /// Request body limit in MB (default: 20)
    pub body_limit_mb: usize,
    /// Maximum file size per upload in MB (default: 10)
    pub max_file_size_mb: usize,
    /// Request timeout in seconds (default: 30)
    pub timeout_secs: u64,
    /// MongoDB connection string
    pub database_url: Option<String>,
    /// MongoDB database name
    pub database_name: Option<String>,
    /// Store selection (default: auto)
    pub store_backend: StoreBackend,
    /// Per-attempt store timeout in milliseconds (default: 5000)
    pub store_timeout_ms: u64,
    /// Extra attempts for transient store write failures (default: 2)
    pub store_max_retries: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 8000,
            host: [0, 0, 0, 0],
            allowed_origins: None, // None = allow all
            body_limit_mb: 20,
            max_file_size_mb: 10,
            timeout_secs: 30,
            database_url: None,
            database_name: None,
            store_backend: StoreBackend::Auto,
            store_timeout_ms: 5000,
            store_max_retries: 2,
        }
    }
}

/// Parse an environment variable, falling back to `default` when unset or invalid.
fn env_or<T: FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

/// Read an environment variable, treating blank values as unset.
fn env_non_empty(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let host = match env_non_empty("HOST").as_deref() {
            Some("127.0.0.1") | Some("localhost") => [127, 0, 0, 1],
            _ => defaults.host,
        };

        let allowed_origins = env_non_empty("ALLOWED_ORIGINS").map(|origins| {
            origins
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect()
        });

        let store_backend = match env_non_empty("SEARCH_STORE") {
            Some(v) if v.eq_ignore_ascii_case("memory") => StoreBackend::Memory,
            _ => StoreBackend::Auto,
        };

        Self {
            port: env_or("PORT", defaults.port),
            host,
            allowed_origins,
            body_limit_mb: env_or("BODY_LIMIT_MB", defaults.body_limit_mb),
            max_file_size_mb: env_or("MAX_FILE_SIZE_MB", defaults.max_file_size_mb),
            timeout_secs: env_or("REQUEST_TIMEOUT_SECS", defaults.timeout_secs),
            database_url: env_non_empty("DATABASE_URL"),
            database_name: env_non_empty("DATABASE_NAME"),
            store_backend,
            store_timeout_ms: env_or("STORE_TIMEOUT_MS", defaults.store_timeout_ms),
            store_max_retries: env_or("STORE_MAX_RETRIES", defaults.store_max_retries),
        }
    }

    /// Get socket address from config
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::from((self.host, self.port))
    }

    /// Maximum accepted request body size in bytes
    pub fn body_limit(&self) -> usize {
        self.body_limit_mb.saturating_mul(1024 * 1024)
    }

    /// Maximum accepted upload size in bytes
    pub fn max_file_size(&self) -> usize {
        self.max_file_size_mb.saturating_mul(1024 * 1024)
    }

    pub fn store_timeout(&self) -> Duration {
        Duration::from_millis(self.store_timeout_ms)
    }
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("port", &self.port)
            .field("host", &self.host)
            .field("allowed_origins", &self.allowed_origins)
            .field("body_limit_mb", &self.body_limit_mb)
            .field("max_file_size_mb", &self.max_file_size_mb)
            .field("timeout_secs", &self.timeout_secs)
            .field(
                "database_url",
                &self.database_url.as_ref().map(|_| "[REDACTED]"),
            )
            .field("database_name", &self.database_name)
            .field("store_backend", &self.store_backend)
            .field("store_timeout_ms", &self.store_timeout_ms)
            .field("store_max_retries", &self.store_max_retries)
            .finish()
    }
}
