//! Deterministic in-memory page for driving the guard in tests

use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, HashMap};
use std::rc::Rc;
use std::task::Context;
use std::time::Duration;

use futures::FutureExt;
use futures::future::LocalBoxFuture;

use super::error::NotifyError;
use super::host::{EventHandler, PageEvent, ResetRequest, SessionHost};

pub const MINUTE_MS: u64 = 60 * 1000;

/// Outbound side effects in the order they happened
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Journal {
    Reset,
    Keepalive,
    Navigate(String),
}

/// Handle to a timer scheduled on the fake clock
pub struct FakeTimer {
    key: (u64, u64),
}

#[derive(Default)]
struct FakePage {
    now_ms: Cell<u64>,
    next_timer_id: Cell<u64>,
    timers: RefCell<BTreeMap<(u64, u64), Box<dyn FnOnce()>>>,
    handlers: RefCell<HashMap<PageEvent, Vec<EventHandler>>>,
    failing_listener: Cell<Option<PageEvent>>,
    hidden: Cell<bool>,
    cookies: RefCell<String>,
    reset_outcome: RefCell<Option<NotifyError>>,
    reset_stalled: Cell<bool>,
    keepalive_outcome: RefCell<Option<NotifyError>>,
    navigate_outcome: RefCell<Option<NotifyError>>,
    resets: RefCell<Vec<ResetRequest>>,
    keepalives: RefCell<Vec<ResetRequest>>,
    navigations: RefCell<Vec<String>>,
    journal: RefCell<Vec<Journal>>,
    tasks: RefCell<Vec<LocalBoxFuture<'static, ()>>>,
}

/// Fake browser page with a virtual clock.
///
/// Clones share the same page, so a test keeps one handle while the guard
/// owns another.
#[derive(Clone, Default)]
pub struct FakeHost {
    page: Rc<FakePage>,
}

impl FakeHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_cookies(&self, cookies: &str) {
        *self.page.cookies.borrow_mut() = cookies.to_string();
    }

    pub fn set_reset_outcome(&self, outcome: Result<(), NotifyError>) {
        *self.page.reset_outcome.borrow_mut() = outcome.err();
    }

    /// Make the reset request hang without ever answering
    pub fn stall_reset(&self) {
        self.page.reset_stalled.set(true);
    }

    pub fn set_keepalive_outcome(&self, outcome: Result<(), NotifyError>) {
        *self.page.keepalive_outcome.borrow_mut() = outcome.err();
    }

    pub fn set_navigate_outcome(&self, outcome: Result<(), NotifyError>) {
        *self.page.navigate_outcome.borrow_mut() = outcome.err();
    }

    pub fn fail_listen(&self, event: PageEvent) {
        self.page.failing_listener.set(Some(event));
    }

    /// Change visibility and fire `visibilitychange`
    pub fn set_hidden(&self, hidden: bool) {
        self.page.hidden.set(hidden);
        self.dispatch(PageEvent::VisibilityChange);
    }

    /// Change visibility without firing an event, e.g. before load
    pub fn set_hidden_silently(&self, hidden: bool) {
        self.page.hidden.set(hidden);
    }

    /// Fire an event synchronously on every registered handler
    pub fn dispatch(&self, event: PageEvent) {
        let handlers = self
            .page
            .handlers
            .borrow()
            .get(&event)
            .cloned()
            .unwrap_or_default();
        for handler in handlers {
            handler();
        }
    }

    /// Move the clock forward, firing due timers in order and polling any
    /// task they spawn.
    pub fn advance(&self, ms: u64) {
        let target = self.page.now_ms.get() + ms;

        loop {
            let due = {
                let mut timers = self.page.timers.borrow_mut();
                match timers.keys().next().copied() {
                    Some(key) if key.0 <= target => timers.remove(&key).map(|cb| (key.0, cb)),
                    _ => None,
                }
            };
            let Some((at, callback)) = due else {
                break;
            };

            self.page.now_ms.set(at);
            callback();
            self.run_tasks();
        }

        self.page.now_ms.set(target);
    }

    /// Poll every spawned task once; tasks still pending are kept
    fn run_tasks(&self) {
        let tasks: Vec<_> = self.page.tasks.borrow_mut().drain(..).collect();
        let mut cx = Context::from_waker(futures::task::noop_waker_ref());

        let mut pending = Vec::new();
        for mut task in tasks {
            if task.as_mut().poll(&mut cx).is_pending() {
                pending.push(task);
            }
        }
        self.page.tasks.borrow_mut().extend(pending);
    }

    pub fn pending_tasks(&self) -> usize {
        self.page.tasks.borrow().len()
    }

    pub fn pending_timers(&self) -> usize {
        self.page.timers.borrow().len()
    }

    pub fn listener_count(&self) -> usize {
        self.page.handlers.borrow().values().map(Vec::len).sum()
    }

    pub fn resets(&self) -> Vec<ResetRequest> {
        self.page.resets.borrow().clone()
    }

    pub fn keepalives(&self) -> Vec<ResetRequest> {
        self.page.keepalives.borrow().clone()
    }

    pub fn navigations(&self) -> Vec<String> {
        self.page.navigations.borrow().clone()
    }

    pub fn journal(&self) -> Vec<Journal> {
        self.page.journal.borrow().clone()
    }
}

impl SessionHost for FakeHost {
    type Timer = FakeTimer;

    fn listen(&self, event: PageEvent, handler: EventHandler) -> Result<(), String> {
        if self.page.failing_listener.get() == Some(event) {
            return Err("listener rejected".to_string());
        }
        self.page
            .handlers
            .borrow_mut()
            .entry(event)
            .or_default()
            .push(handler);
        Ok(())
    }

    fn schedule(&self, after: Duration, callback: Box<dyn FnOnce()>) -> FakeTimer {
        let id = self.page.next_timer_id.get();
        self.page.next_timer_id.set(id + 1);

        let due = self.page.now_ms.get() + after.as_millis() as u64;
        let key = (due, id);
        self.page.timers.borrow_mut().insert(key, callback);
        FakeTimer { key }
    }

    fn cancel(&self, timer: FakeTimer) {
        self.page.timers.borrow_mut().remove(&timer.key);
    }

    fn document_hidden(&self) -> bool {
        self.page.hidden.get()
    }

    fn cookie_string(&self) -> String {
        self.page.cookies.borrow().clone()
    }

    fn post_reset(&self, request: ResetRequest) -> LocalBoxFuture<'static, Result<(), NotifyError>> {
        self.page.resets.borrow_mut().push(request);
        self.page.journal.borrow_mut().push(Journal::Reset);

        if self.page.reset_stalled.get() {
            return futures::future::pending().boxed_local();
        }

        let outcome = match self.page.reset_outcome.borrow().clone() {
            Some(e) => Err(e),
            None => Ok(()),
        };
        futures::future::ready(outcome).boxed_local()
    }

    fn send_keepalive(&self, request: ResetRequest) -> Result<(), NotifyError> {
        self.page.keepalives.borrow_mut().push(request);
        self.page.journal.borrow_mut().push(Journal::Keepalive);

        match self.page.keepalive_outcome.borrow().clone() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    fn spawn(&self, task: LocalBoxFuture<'static, ()>) {
        self.page.tasks.borrow_mut().push(task);
    }

    fn navigate(&self, url: &str) -> Result<(), NotifyError> {
        self.page.navigations.borrow_mut().push(url.to_string());
        self.page
            .journal
            .borrow_mut()
            .push(Journal::Navigate(url.to_string()));

        match self.page.navigate_outcome.borrow().clone() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}
