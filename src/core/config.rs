//! Server configuration from environment variables.
//!
//! Load configuration using `Config::from_env()` after calling `dotenvy::dotenv()`.
//! The server turns it into a [`GuardConfig`] and embeds it in every page.

use std::time::Duration;

use super::settings::GuardConfig;

/// Server configuration loaded from environment variables.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Idle window in whole minutes
    /// Example: 20
    pub idle_timeout_minutes: Option<String>,

    /// Endpoint that clears the session's last known IP
    /// Example: /accounts/reset-last-ip/
    pub session_reset_url: Option<String>,

    /// Logout endpoint the browser is sent to
    /// Example: /accounts/logout/
    pub logout_url: Option<String>,

    /// Name of the cookie holding the CSRF token
    pub csrf_cookie_name: Option<String>,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Call `dotenvy::dotenv()` before this to load from `.env` file.
    pub fn from_env() -> Self {
        Self {
            idle_timeout_minutes: std::env::var("IDLE_TIMEOUT_MINUTES").ok(),
            session_reset_url: std::env::var("SESSION_RESET_URL").ok(),
            logout_url: std::env::var("LOGOUT_URL").ok(),
            csrf_cookie_name: std::env::var("CSRF_COOKIE_NAME").ok(),
        }
    }

    /// Idle window, if set to a valid positive number of minutes
    pub fn idle_timeout(&self) -> Option<Duration> {
        let raw = self.idle_timeout_minutes.as_deref()?;
        let seconds = raw
            .trim()
            .parse::<u64>()
            .ok()
            .filter(|minutes| *minutes > 0)
            .and_then(|minutes| minutes.checked_mul(60));
        match seconds {
            Some(seconds) => Some(Duration::from_secs(seconds)),
            None => {
                tracing::warn!("Ignoring invalid IDLE_TIMEOUT_MINUTES={:?}", raw);
                None
            }
        }
    }

    /// Build the guard config, falling back to defaults for anything unset
    /// or invalid.
    pub fn guard_config(&self) -> GuardConfig {
        let mut config = match self.idle_timeout() {
            Some(timeout) => GuardConfig::with_idle_timeout(timeout),
            None => GuardConfig::default(),
        };

        if let Some(url) = non_empty(&self.session_reset_url) {
            config = config.reset_url(url);
        }
        if let Some(url) = non_empty(&self.logout_url) {
            config = config.logout_url(url);
        }
        if let Some(name) = non_empty(&self.csrf_cookie_name) {
            config = config.csrf_cookie(name);
        }

        if let Err(e) = config.validate() {
            tracing::warn!("Invalid idle session guard config ({}), using defaults", e);
            return GuardConfig::default();
        }
        config
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}
