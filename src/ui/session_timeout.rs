//! Session timeout component
//!
//! Mounts the idle session guard on the client. Place it once at the root of
//! the application; it renders nothing visible.

use leptos::prelude::*;

/// Idle session timeout component
///
/// On the client this reads the guard config embedded by the server, then
/// starts watching for activity. The server renders only a placeholder.
#[component]
pub fn SessionTimeout() -> impl IntoView {
    #[cfg(feature = "hydrate")]
    {
        Effect::new(move |_| {
            if let Err(e) = start_guard() {
                leptos::logging::error!("Idle session guard not started: {}", e);
            }
        });
    }

    view! {
        <div class="hidden" data-idle-session-guard=""></div>
    }
}

#[cfg(feature = "hydrate")]
fn start_guard() -> Result<(), crate::core::GuardError> {
    use crate::core::IdleSessionGuard;
    use crate::ui::browser_host::BrowserHost;

    let host = BrowserHost::new()?;
    let config = host.embedded_config();
    let guard = IdleSessionGuard::new(host, config)?;
    guard.initialize()?;

    // Keep the guard alive for the rest of the page
    std::mem::forget(guard);
    Ok(())
}
