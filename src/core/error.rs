//! Error types for the idle session guard

/// Failure of one of the host's outbound operations (reset call, unload
/// notification, logout navigation).
///
/// These are advisory only: the guard logs them and carries on.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NotifyError {
    #[error("Failed to build request: {0}")]
    Request(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Server responded with status {0}")]
    Status(u16),

    #[error("No response within {0}ms")]
    Timeout(u64),

    #[error("Navigation failed: {0}")]
    Navigation(String),
}

/// Invalid guard configuration
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("Idle timeout must be greater than zero")]
    ZeroTimeout,

    #[error("Idle timeout of {0}ms exceeds the browser timer limit")]
    TimeoutTooLong(u64),

    #[error("Reset timeout of {0}ms must be between 1ms and the browser timer limit")]
    InvalidResetTimeout(u64),

    #[error("Endpoint `{0}` must not be empty")]
    EmptyEndpoint(&'static str),
}

/// Errors raised while setting the guard up
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GuardError {
    #[error("Idle session guard already initialized")]
    AlreadyInitialized,

    #[error("Failed to register `{event}` listener: {reason}")]
    Listener { event: &'static str, reason: String },

    #[error("Browser API unavailable: {0}")]
    Unavailable(&'static str),

    #[error(transparent)]
    Config(#[from] ConfigError),
}
