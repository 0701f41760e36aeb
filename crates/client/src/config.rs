use std::str::FromStr;
use std::time::Duration;

/// Default backend base URL for local development.
pub const DEFAULT_API_URL: &str = "http://localhost:8080";

/// Default per-request timeout in seconds.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

/// Backend client configuration loaded from environment variables.
///
/// All fields have defaults suitable for local development.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    /// Base HTTP URL of the backend, without a trailing slash.
    pub api_url: String,
    /// Upper bound on any single request, including reading the body.
    pub request_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
        }
    }
}

impl ClientConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                         | Default                 |
    /// |---------------------------------|-------------------------|
    /// | `TRIPSYNC_API_URL`              | `http://localhost:8080` |
    /// | `TRIPSYNC_REQUEST_TIMEOUT_SECS` | `10`                    |
    pub fn from_env() -> Self {
        let api_url = std::env::var("TRIPSYNC_API_URL")
            .map(|v| v.trim().trim_end_matches('/').to_string())
            .ok()
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());

        let timeout_secs: u64 =
            env_or("TRIPSYNC_REQUEST_TIMEOUT_SECS", DEFAULT_REQUEST_TIMEOUT_SECS);

        Self {
            api_url,
            request_timeout: Duration::from_secs(timeout_secs),
        }
    }

    /// Override the base URL, trimming any trailing slash.
    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}

/// Read and parse an environment variable, falling back to `default`
/// when it is unset or unparseable.
pub fn env_or<T>(key: &str, default: T) -> T
where
    T: FromStr + std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!(key, value = %raw, default = %default, "Invalid value, using default");
            default
        }),
        Err(_) => default,
    }
}
