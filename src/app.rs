use leptos::prelude::*;
use leptos_meta::{MetaTags, Title, provide_meta_context};

use crate::core::{GUARD_CONFIG_META, GuardConfig};
use crate::ui::SessionTimeout;

pub fn shell(options: LeptosOptions) -> impl IntoView {
    // Provided per request by the server; error pages fall back to defaults
    let guard_config = use_context::<GuardConfig>().unwrap_or_default();

    view! {
        <!DOCTYPE html>
        <html lang="en">
            <head>
                <meta charset="utf-8"/>
                <meta name="viewport" content="width=device-width, initial-scale=1"/>
                <meta name=GUARD_CONFIG_META content=guard_config.to_json()/>
                <AutoReload options=options.clone() />
                <HydrationScripts options/>
                <MetaTags/>
            </head>
            <body>
                <App/>
            </body>
        </html>
    }
}

#[component]
pub fn App() -> impl IntoView {
    // Provides context that manages stylesheets, titles, meta tags, etc.
    provide_meta_context();

    view! {
        <Title text="Session"/>

        <main>
            <SessionTimeout/>
        </main>
    }
}
