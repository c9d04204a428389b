//! Idle session guard: state machine, host capability and configuration

#[cfg(feature = "ssr")]
pub mod config;
pub mod cookies;
pub mod error;
pub mod guard;
pub mod host;
pub mod settings;
#[cfg(test)]
pub(crate) mod testing;

pub use error::{ConfigError, GuardError, NotifyError};
pub use guard::{GuardState, IdleSessionGuard};
pub use host::{ActivityKind, EventHandler, PageEvent, ResetRequest, SessionHost};
pub use settings::{GUARD_CONFIG_META, GuardConfig};
