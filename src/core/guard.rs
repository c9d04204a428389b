//! Idle session guard
//!
//! Expires an inactive session from the browser. A single deadline timer is
//! armed for the configured idle window and pushed back on every activity
//! event. When it fires, the guard asks the server to clear the session's last
//! known IP and then navigates to the logout endpoint, whatever the server
//! said.
//!
//! ```text
//!            activity
//!            ┌──────┐
//!            ▼      │      hidden
//!  init ──► Armed ──┴───────────────► Suspended
//!            │  ▲                        │
//!            │  └────────── visible ─────┘
//!   deadline │
//!            ▼           unload (Armed | Suspended)
//!          Firing                 ──► Unloaded
//! ```
//!
//! `Firing` and `Unloaded` are terminal for the page.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};
use std::time::Duration;

use super::cookies::extract_cookie;
use super::error::{GuardError, NotifyError};
use super::host::{ActivityKind, EventHandler, PageEvent, ResetRequest, SessionHost};
use super::settings::GuardConfig;

/// Lifecycle state of the guard
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardState {
    /// Created but `initialize` not called yet
    Idle,
    /// Deadline timer pending
    Armed,
    /// Page hidden, no timer pending
    Suspended,
    /// Deadline elapsed, logout in progress
    Firing,
    /// Page is being torn down
    Unloaded,
}

impl GuardState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, GuardState::Firing | GuardState::Unloaded)
    }
}

struct GuardInner<H: SessionHost> {
    host: H,
    config: GuardConfig,
    state: Cell<GuardState>,
    /// Bumped on every cancel so a callback from a cancelled timer is ignored
    generation: Cell<u64>,
    timer: RefCell<Option<H::Timer>>,
}

/// Idle session guard bound to one page.
///
/// Cloning is cheap and yields another handle to the same guard.
pub struct IdleSessionGuard<H: SessionHost> {
    inner: Rc<GuardInner<H>>,
}

impl<H: SessionHost> Clone for IdleSessionGuard<H> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<H: SessionHost> IdleSessionGuard<H> {
    /// Create a guard. Nothing is armed until [`initialize`](Self::initialize).
    pub fn new(host: H, config: GuardConfig) -> Result<Self, GuardError> {
        config.validate()?;

        Ok(Self {
            inner: Rc::new(GuardInner {
                host,
                config,
                state: Cell::new(GuardState::Idle),
                generation: Cell::new(0),
                timer: RefCell::new(None),
            }),
        })
    }

    pub fn state(&self) -> GuardState {
        self.inner.state.get()
    }

    pub fn is_armed(&self) -> bool {
        self.state() == GuardState::Armed
    }

    pub fn config(&self) -> &GuardConfig {
        &self.inner.config
    }

    pub fn idle_timeout(&self) -> Duration {
        self.inner.config.idle_timeout()
    }

    /// Register page listeners and arm the first deadline.
    ///
    /// A page that is already hidden starts out suspended.
    pub fn initialize(&self) -> Result<(), GuardError> {
        if self.state() != GuardState::Idle {
            return Err(GuardError::AlreadyInitialized);
        }

        for kind in ActivityKind::ALL {
            self.listen(PageEvent::Activity(kind), Self::reset_timeout)?;
        }
        self.listen(PageEvent::VisibilityChange, Self::on_visibility_change)?;
        self.listen(PageEvent::BeforeUnload, Self::on_before_unload)?;

        if self.inner.host.document_hidden() {
            self.inner.state.set(GuardState::Suspended);
            leptos::logging::log!("Idle session guard started with page hidden, timer suspended");
        } else {
            self.arm();
            leptos::logging::log!(
                "Idle session guard started, logout after {}s of inactivity",
                self.idle_timeout().as_secs()
            );
        }
        Ok(())
    }

    /// Push the deadline back by a full idle window.
    ///
    /// Only has an effect while armed: a hidden page has no timer to reset and
    /// a firing or unloading page is past the point of return.
    pub fn reset_timeout(&self) {
        if self.state() == GuardState::Armed {
            self.arm();
        }
    }

    /// Suspend while hidden, restart a full window when visible again
    pub fn on_visibility_change(&self) {
        if matches!(self.state(), GuardState::Idle) || self.state().is_terminal() {
            return;
        }

        if self.inner.host.document_hidden() {
            self.cancel_timer();
            self.inner.state.set(GuardState::Suspended);
        } else {
            self.arm();
        }
    }

    /// Cancel the deadline and send one keepalive reset notification
    pub fn on_before_unload(&self) {
        // When firing, our own logout navigation is unloading the page and the
        // reset was already attempted.
        if matches!(self.state(), GuardState::Unloaded | GuardState::Firing) {
            return;
        }

        self.cancel_timer();
        self.inner.state.set(GuardState::Unloaded);

        let request = self.reset_request();
        if let Err(e) = self.inner.host.send_keepalive(request) {
            leptos::logging::error!("Error resetting last IP address on unload: {}", e);
        }
    }

    /// Deadline callback. `generation` is the value captured when the timer
    /// was armed.
    fn on_expiry(&self, generation: u64) {
        if self.state() != GuardState::Armed || generation != self.inner.generation.get() {
            return;
        }

        // The deadline already fired, only forget the handle. The slot is
        // reused for the reset fallback below.
        self.inner.timer.borrow_mut().take();
        self.inner.state.set(GuardState::Firing);
        leptos::logging::log!(
            "No activity for {}s, logging out",
            self.idle_timeout().as_secs()
        );

        let reset = self.inner.host.post_reset(self.reset_request());

        // Whichever finishes first, the reset or the fallback timer, navigates.
        let logged_out = Rc::new(Cell::new(false));
        let reset_timeout = self.inner.config.reset_timeout();
        let fallback = {
            let weak = Rc::downgrade(&self.inner);
            let logged_out = Rc::clone(&logged_out);
            self.inner.host.schedule(
                reset_timeout,
                Box::new(move || {
                    if logged_out.replace(true) {
                        return;
                    }
                    let timeout_ms = reset_timeout.as_millis().try_into().unwrap_or(u64::MAX);
                    leptos::logging::error!(
                        "Error resetting last IP address: {}",
                        NotifyError::Timeout(timeout_ms)
                    );
                    if let Some(guard) = Self::upgrade(&weak) {
                        guard.navigate_to_logout();
                    }
                }),
            )
        };
        *self.inner.timer.borrow_mut() = Some(fallback);

        let guard = self.clone();
        self.inner.host.spawn(Box::pin(async move {
            let outcome = reset.await;
            if logged_out.replace(true) {
                return;
            }
            let fallback = guard.inner.timer.borrow_mut().take();
            if let Some(fallback) = fallback {
                guard.inner.host.cancel(fallback);
            }

            match outcome {
                Ok(()) => leptos::logging::log!("Last IP address reset"),
                Err(NotifyError::Status(status)) => {
                    leptos::logging::error!("Failed to reset last IP address: status {}", status)
                }
                Err(e) => leptos::logging::error!("Error resetting last IP address: {}", e),
            }
            guard.navigate_to_logout();
        }));
    }

    fn navigate_to_logout(&self) {
        let url = &self.inner.config.logout_url;
        if let Err(e) = self.inner.host.navigate(url) {
            leptos::logging::error!("Failed to navigate to {}: {}", url, e);
        }
    }

    /// Cancel-then-schedule, so at most one timer is ever pending
    fn arm(&self) {
        self.cancel_timer();

        let generation = self.inner.generation.get();
        let weak = Rc::downgrade(&self.inner);
        let timer = self.inner.host.schedule(
            self.idle_timeout(),
            Box::new(move || {
                if let Some(guard) = Self::upgrade(&weak) {
                    guard.on_expiry(generation);
                }
            }),
        );

        *self.inner.timer.borrow_mut() = Some(timer);
        self.inner.state.set(GuardState::Armed);
    }

    fn cancel_timer(&self) {
        self.inner.generation.set(self.inner.generation.get() + 1);
        let timer = self.inner.timer.borrow_mut().take();
        if let Some(timer) = timer {
            self.inner.host.cancel(timer);
        }
    }

    /// Build the reset request, reading the CSRF token fresh from cookies
    fn reset_request(&self) -> ResetRequest {
        let config = &self.inner.config;
        let csrf_token = extract_cookie(&self.inner.host.cookie_string(), &config.csrf_cookie);
        if csrf_token.is_none() {
            leptos::logging::warn!(
                "No `{}` cookie found, reset request will be sent without CSRF token",
                config.csrf_cookie
            );
        }

        ResetRequest {
            url: config.reset_url.clone(),
            csrf_header: config.csrf_header.clone(),
            csrf_token,
        }
    }

    fn listen(&self, event: PageEvent, action: fn(&Self)) -> Result<(), GuardError> {
        // Handlers only hold a weak reference; the host owns them and the
        // guard owns the host.
        let weak = Rc::downgrade(&self.inner);
        let handler: EventHandler = Rc::new(move || {
            if let Some(guard) = Self::upgrade(&weak) {
                action(&guard);
            }
        });

        self.inner
            .host
            .listen(event, handler)
            .map_err(|reason| GuardError::Listener {
                event: event.event_name(),
                reason,
            })
    }

    fn upgrade(weak: &Weak<GuardInner<H>>) -> Option<Self> {
        weak.upgrade().map(|inner| Self { inner })
    }
}
