#[cfg(feature = "hydrate")]
pub mod browser_host;
pub mod session_timeout;

#[cfg(feature = "hydrate")]
pub use browser_host::BrowserHost;
pub use session_timeout::SessionTimeout;
