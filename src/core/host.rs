//! Host capability the guard runs against
//!
//! Everything that touches the browser (listeners, timers, cookies, fetch,
//! navigation) goes through [`SessionHost`], so the guard itself can be
//! driven by a fake page in tests.

use std::fmt;
use std::rc::Rc;
use std::time::Duration;

use futures::future::LocalBoxFuture;

use super::error::NotifyError;

/// Handler invoked when a page event fires
pub type EventHandler = Rc<dyn Fn()>;

/// DOM interactions treated as evidence the user is still there
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActivityKind {
    PointerMove,
    KeyPress,
    Click,
    Scroll,
}

impl ActivityKind {
    pub const ALL: [ActivityKind; 4] = [
        ActivityKind::PointerMove,
        ActivityKind::KeyPress,
        ActivityKind::Click,
        ActivityKind::Scroll,
    ];

    /// DOM event name
    pub fn event_name(&self) -> &'static str {
        match self {
            ActivityKind::PointerMove => "mousemove",
            ActivityKind::KeyPress => "keypress",
            ActivityKind::Click => "click",
            ActivityKind::Scroll => "scroll",
        }
    }
}

/// Page events the guard subscribes to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PageEvent {
    /// Fired on the document
    Activity(ActivityKind),
    /// Fired on the document
    VisibilityChange,
    /// Fired on the window
    BeforeUnload,
}

impl PageEvent {
    pub fn event_name(&self) -> &'static str {
        match self {
            PageEvent::Activity(kind) => kind.event_name(),
            PageEvent::VisibilityChange => "visibilitychange",
            PageEvent::BeforeUnload => "beforeunload",
        }
    }
}

impl fmt::Display for PageEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.event_name())
    }
}

/// `POST` to the session reset endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResetRequest {
    pub url: String,
    pub csrf_header: String,
    /// Missing when the cookie is absent; the server is expected to reject
    /// such a request.
    pub csrf_token: Option<String>,
}

impl ResetRequest {
    pub const CONTENT_TYPE: &'static str = "application/json";

    /// Headers to send, CSRF header included only when a token exists
    pub fn headers(&self) -> Vec<(&str, &str)> {
        let mut headers = vec![("Content-Type", Self::CONTENT_TYPE)];
        if let Some(token) = &self.csrf_token {
            headers.push((self.csrf_header.as_str(), token.as_str()));
        }
        headers
    }
}

/// Browser surface used by the idle session guard.
///
/// All methods are called from the single UI thread.
pub trait SessionHost: 'static {
    /// Pending deadline; cancelled by passing it to [`SessionHost::cancel`]
    type Timer;

    /// Register `handler` for `event` for the rest of the page's life
    fn listen(&self, event: PageEvent, handler: EventHandler) -> Result<(), String>;

    /// Run `callback` once after `after` has elapsed
    fn schedule(&self, after: Duration, callback: Box<dyn FnOnce()>) -> Self::Timer;

    /// Cancel a pending deadline. Must be synchronous.
    fn cancel(&self, timer: Self::Timer);

    /// Whether the document is currently hidden
    fn document_hidden(&self) -> bool;

    /// Raw `document.cookie`
    fn cookie_string(&self) -> String;

    /// Send the reset request and wait for the response status
    fn post_reset(&self, request: ResetRequest) -> LocalBoxFuture<'static, Result<(), NotifyError>>;

    /// Send the reset request over a transport that outlives the page.
    /// Returns once the request is dispatched, never waits for a response.
    fn send_keepalive(&self, request: ResetRequest) -> Result<(), NotifyError>;

    /// Run a task on the UI thread
    fn spawn(&self, task: LocalBoxFuture<'static, ()>);

    /// Full-page navigation
    fn navigate(&self, url: &str) -> Result<(), NotifyError>;
}
