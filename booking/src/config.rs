//! Configuration management for the booking client.
//!
//! Loads configuration from environment variables with sensible defaults.

use serde::{Deserialize, Serialize};
use showtime_client::Credentials;
use std::env;
use std::time::Duration;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Seat-inventory service
    pub api: ApiConfig,
    /// Session timing
    pub session: SessionConfig,
    /// Identity used by the auth bootstrap
    pub identity: IdentityConfig,
    /// Poster fallback
    pub posters: PosterConfig,
}

/// Seat-inventory service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base path of the service (`GET {base}/shows/`, ...)
    pub base_url: String,
    /// Transport timeout in seconds; expiry surfaces as a network error
    pub request_timeout_secs: u64,
}

/// Session timing configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Poll Loop period in seconds
    pub poll_interval_secs: u64,
    /// How long a caller waits for a request's terminal action, in seconds
    pub workflow_timeout_secs: u64,
}

/// Identity used by the auth bootstrap
#[derive(Clone, Serialize, Deserialize)]
pub struct IdentityConfig {
    /// Account name
    pub username: String,
    /// Account password
    pub password: String,
}

/// Poster fallback configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PosterConfig {
    /// Placeholder image service; the movie title is appended as `?text=`
    pub placeholder_base: String,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Unset or unparsable values fall back to defaults; a zero interval or
    /// timeout counts as unparsable.
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            api: ApiConfig {
                base_url: env::var("SHOWTIME_API_BASE")
                    .unwrap_or_else(|_| "http://127.0.0.1:8000/api/seats".to_string()),
                request_timeout_secs: positive_env("SHOWTIME_REQUEST_TIMEOUT_SECS").unwrap_or(10),
            },
            session: SessionConfig {
                poll_interval_secs: positive_env("SHOWTIME_POLL_INTERVAL_SECS").unwrap_or(5),
                workflow_timeout_secs: positive_env("SHOWTIME_WORKFLOW_TIMEOUT_SECS")
                    .unwrap_or(30),
            },
            identity: IdentityConfig {
                username: env::var("SHOWTIME_DEMO_USERNAME")
                    .unwrap_or_else(|_| "demo_user_123".to_string()),
                password: env::var("SHOWTIME_DEMO_PASSWORD")
                    .unwrap_or_else(|_| "demo_pass_123".to_string()),
            },
            posters: PosterConfig {
                placeholder_base: env::var("SHOWTIME_PLACEHOLDER_BASE").unwrap_or_else(|_| {
                    "https://via.placeholder.com/140x200/1e293b/ffffff".to_string()
                }),
            },
        }
    }

    /// Poll Loop period
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.session.poll_interval_secs)
    }

    /// Transport timeout
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.api.request_timeout_secs)
    }

    /// How long the session façade waits for a request to finish
    #[must_use]
    pub const fn workflow_timeout(&self) -> Duration {
        Duration::from_secs(self.session.workflow_timeout_secs)
    }

    /// Credentials for the auth bootstrap
    #[must_use]
    pub fn credentials(&self) -> Credentials {
        Credentials::new(&self.identity.username, &self.identity.password)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api: ApiConfig {
                base_url: "http://127.0.0.1:8000/api/seats".to_string(),
                request_timeout_secs: 10,
            },
            session: SessionConfig {
                poll_interval_secs: 5,
                workflow_timeout_secs: 30,
            },
            identity: IdentityConfig {
                username: "demo_user_123".to_string(),
                password: "demo_pass_123".to_string(),
            },
            posters: PosterConfig {
                placeholder_base: "https://via.placeholder.com/140x200/1e293b/ffffff".to_string(),
            },
        }
    }
}

impl std::fmt::Debug for IdentityConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdentityConfig")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

fn positive_env(key: &str) -> Option<u64> {
    env::var(key)
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .filter(|value| *value > 0)
}
