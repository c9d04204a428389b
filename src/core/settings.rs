//! Guard configuration shared between the server and the browser bundle.
//!
//! The server serializes a [`GuardConfig`] into the page head; the browser
//! reads it back before initializing the guard.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::error::ConfigError;

/// Name of the `<meta>` tag carrying the serialized config
pub const GUARD_CONFIG_META: &str = "idle-session-guard";

/// Default idle window (10 minutes)
pub const DEFAULT_IDLE_TIMEOUT_MS: u64 = 10 * 60 * 1000;

/// Longer idle window used by some deployments (20 minutes)
pub const EXTENDED_IDLE_TIMEOUT_MS: u64 = 20 * 60 * 1000;

/// How long logout waits for the reset request before navigating anyway
pub const DEFAULT_RESET_TIMEOUT_MS: u64 = 5 * 1000;

/// Largest delay `setTimeout` accepts (2^31 - 1 ms)
pub const MAX_TIMER_MS: u64 = i32::MAX as u64;

pub const DEFAULT_RESET_URL: &str = "/accounts/reset-last-ip/";
pub const DEFAULT_LOGOUT_URL: &str = "/accounts/logout/";
pub const DEFAULT_CSRF_COOKIE: &str = "csrftoken";
pub const DEFAULT_CSRF_HEADER: &str = "X-CSRFToken";

/// Idle session guard configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GuardConfig {
    /// Inactivity window in milliseconds
    pub idle_timeout_ms: u64,
    /// Longest wait for the reset response before logging out anyway
    pub reset_timeout_ms: u64,
    /// Endpoint that clears the session's last known IP
    pub reset_url: String,
    /// Where the browser is sent once the window elapses
    pub logout_url: String,
    /// Cookie holding the CSRF token
    pub csrf_cookie: String,
    /// Header the CSRF token is sent in
    pub csrf_header: String,
}

impl GuardConfig {
    /// Config with a 10 minute idle window
    pub fn ten_minutes() -> Self {
        Self::with_idle_timeout(Duration::from_millis(DEFAULT_IDLE_TIMEOUT_MS))
    }

    /// Config with a 20 minute idle window
    pub fn twenty_minutes() -> Self {
        Self::with_idle_timeout(Duration::from_millis(EXTENDED_IDLE_TIMEOUT_MS))
    }

    /// Default endpoints with a custom idle window
    pub fn with_idle_timeout(timeout: Duration) -> Self {
        Self {
            idle_timeout_ms: timeout.as_millis().try_into().unwrap_or(u64::MAX),
            reset_timeout_ms: DEFAULT_RESET_TIMEOUT_MS,
            reset_url: DEFAULT_RESET_URL.to_string(),
            logout_url: DEFAULT_LOGOUT_URL.to_string(),
            csrf_cookie: DEFAULT_CSRF_COOKIE.to_string(),
            csrf_header: DEFAULT_CSRF_HEADER.to_string(),
        }
    }

    pub fn reset_url(mut self, url: impl Into<String>) -> Self {
        self.reset_url = url.into();
        self
    }

    pub fn reset_timeout_ms(mut self, ms: u64) -> Self {
        self.reset_timeout_ms = ms;
        self
    }

    pub fn logout_url(mut self, url: impl Into<String>) -> Self {
        self.logout_url = url.into();
        self
    }

    pub fn csrf_cookie(mut self, name: impl Into<String>) -> Self {
        self.csrf_cookie = name.into();
        self
    }

    pub fn idle_timeout(&self) -> Duration {
        Duration::from_millis(self.idle_timeout_ms)
    }

    pub fn reset_timeout(&self) -> Duration {
        Duration::from_millis(self.reset_timeout_ms)
    }

    /// Check the config can actually drive a browser timer and requests
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.idle_timeout_ms == 0 {
            return Err(ConfigError::ZeroTimeout);
        }
        if self.idle_timeout_ms > MAX_TIMER_MS {
            return Err(ConfigError::TimeoutTooLong(self.idle_timeout_ms));
        }
        if self.reset_timeout_ms == 0 || self.reset_timeout_ms > MAX_TIMER_MS {
            return Err(ConfigError::InvalidResetTimeout(self.reset_timeout_ms));
        }
        if self.reset_url.trim().is_empty() {
            return Err(ConfigError::EmptyEndpoint("reset_url"));
        }
        if self.logout_url.trim().is_empty() {
            return Err(ConfigError::EmptyEndpoint("logout_url"));
        }
        Ok(())
    }

    /// Parse the JSON embedded in the page head
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self::ten_minutes()
    }
}
