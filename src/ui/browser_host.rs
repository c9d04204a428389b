//! Browser implementation of [`SessionHost`]
//!
//! Activity and visibility listeners go on the document, the unload listener
//! on the window. Deadlines are `gloo_timers` timeouts, which clear
//! themselves when dropped.

use std::time::Duration;

use futures::future::LocalBoxFuture;
use gloo_timers::callback::Timeout;
use wasm_bindgen::JsCast;
use wasm_bindgen::closure::Closure;
use wasm_bindgen_futures::JsFuture;
use web_sys::{EventTarget, HtmlDocument, Request, RequestCredentials, RequestInit};

use crate::core::{
    EventHandler, GUARD_CONFIG_META, GuardConfig, GuardError, NotifyError, PageEvent,
    ResetRequest, SessionHost,
};

/// The current page
pub struct BrowserHost {
    window: web_sys::Window,
    document: web_sys::Document,
}

impl BrowserHost {
    pub fn new() -> Result<Self, GuardError> {
        let window = web_sys::window().ok_or(GuardError::Unavailable("window"))?;
        let document = window
            .document()
            .ok_or(GuardError::Unavailable("document"))?;
        Ok(Self { window, document })
    }

    /// Read the config the server embedded in the page head.
    ///
    /// Falls back to the defaults when the tag is missing or unreadable.
    pub fn embedded_config(&self) -> GuardConfig {
        let selector = format!("meta[name=\"{}\"]", GUARD_CONFIG_META);
        let content = self
            .document
            .query_selector(&selector)
            .ok()
            .flatten()
            .and_then(|meta| meta.get_attribute("content"));

        let Some(content) = content else {
            leptos::logging::warn!("No idle session guard config in page, using defaults");
            return GuardConfig::default();
        };

        match GuardConfig::from_json(&content) {
            Ok(config) => config,
            Err(e) => {
                leptos::logging::warn!("Invalid idle session guard config: {}", e);
                GuardConfig::default()
            }
        }
    }

    fn target_for(&self, event: PageEvent) -> &EventTarget {
        match event {
            PageEvent::BeforeUnload => self.window.as_ref(),
            PageEvent::Activity(_) | PageEvent::VisibilityChange => self.document.as_ref(),
        }
    }
}

impl SessionHost for BrowserHost {
    type Timer = Timeout;

    fn listen(&self, event: PageEvent, handler: EventHandler) -> Result<(), String> {
        let callback = Closure::wrap(Box::new(move |_: web_sys::Event| {
            handler();
        }) as Box<dyn FnMut(web_sys::Event)>);

        self.target_for(event)
            .add_event_listener_with_callback(
                event.event_name(),
                callback.as_ref().unchecked_ref(),
            )
            .map_err(|e| format!("{:?}", e))?;

        // Listeners live as long as the page
        callback.forget();
        Ok(())
    }

    fn schedule(&self, after: Duration, callback: Box<dyn FnOnce()>) -> Timeout {
        let millis = u32::try_from(after.as_millis()).unwrap_or(u32::MAX);
        Timeout::new(millis, callback)
    }

    fn cancel(&self, timer: Timeout) {
        // Dropping clears the underlying setTimeout
        drop(timer);
    }

    fn document_hidden(&self) -> bool {
        self.document.hidden()
    }

    fn cookie_string(&self) -> String {
        self.document
            .dyn_ref::<HtmlDocument>()
            .and_then(|doc| doc.cookie().ok())
            .unwrap_or_default()
    }

    fn post_reset(&self, request: ResetRequest) -> LocalBoxFuture<'static, Result<(), NotifyError>> {
        Box::pin(async move {
            let mut builder = gloo_net::http::Request::post(&request.url)
                .credentials(RequestCredentials::SameOrigin);
            for (name, value) in request.headers() {
                builder = builder.header(name, value);
            }

            let response = builder
                .build()
                .map_err(|e| NotifyError::Request(e.to_string()))?
                .send()
                .await
                .map_err(|e| NotifyError::Network(e.to_string()))?;

            if !response.ok() {
                return Err(NotifyError::Status(response.status()));
            }
            Ok(())
        })
    }

    fn send_keepalive(&self, request: ResetRequest) -> Result<(), NotifyError> {
        let opts = RequestInit::new();
        opts.set_method("POST");
        opts.set_keepalive(true);
        opts.set_credentials(RequestCredentials::SameOrigin);

        let req = Request::new_with_str_and_init(&request.url, &opts)
            .map_err(|e| NotifyError::Request(format!("{:?}", e)))?;
        for (name, value) in request.headers() {
            req.headers()
                .set(name, value)
                .map_err(|e| NotifyError::Request(format!("{:?}", e)))?;
        }

        // Nothing waits on the response; the task only swallows a rejection
        // so it is not reported as uncaught.
        let sent = JsFuture::from(self.window.fetch_with_request(&req));
        wasm_bindgen_futures::spawn_local(async move {
            let _ = sent.await;
        });
        Ok(())
    }

    fn spawn(&self, task: LocalBoxFuture<'static, ()>) {
        wasm_bindgen_futures::spawn_local(task);
    }

    fn navigate(&self, url: &str) -> Result<(), NotifyError> {
        self.window
            .location()
            .set_href(url)
            .map_err(|e| NotifyError::Navigation(format!("{:?}", e)))
    }
}
