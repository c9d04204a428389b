//! Idle Session Guard
//!
//! Logs an inactive user out from the browser: after a configured window
//! without activity the server is asked to clear the session's last known
//! IP, then the page navigates to the logout endpoint. Built with Leptos and
//! WebAssembly.

pub mod app;
pub mod core;
pub mod ui;

#[cfg(feature = "hydrate")]
#[wasm_bindgen::prelude::wasm_bindgen]
pub fn hydrate() {
    use crate::app::*;
    console_error_panic_hook::set_once();
    leptos::mount::hydrate_body(App);
}
