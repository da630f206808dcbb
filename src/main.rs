//! Page entry point: wires the prayer board hooks to the view components and
//! registers the service worker.

use log::{error, info, warn};
use prayer_clock::config::SERVICE_WORKER_SCRIPT;
use prayer_clock::error::describe_js;
use prayer_clock::logging;
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::{spawn_local, JsFuture};
use web_sys::ServiceWorkerRegistration;
use yew::prelude::*;

mod components;
mod hooks;

use components::{AuxTimes, ClockPanel, LocationForm, NextPrayerPanel, OfflineIndicator, PrayerTable};
use hooks::{use_online_status, use_prayer_board};

/// Primary application component.
#[function_component(App)]
fn app() -> Html {
    let board = use_prayer_board();
    let online = use_online_status();

    // Keep the tab title in step with the resolved location.
    use_effect_with(board.view.page_title.clone(), |title| {
        if let Some(title) = title {
            gloo_utils::document().set_title(title);
        }
    });

    html! {
        <div class="prayer-board">
            <OfflineIndicator online={online} />
            <ClockPanel view={board.view.clone()} />
            <NextPrayerPanel view={board.view.clone()} />
            <PrayerTable view={board.view.clone()} />
            <AuxTimes view={board.view.clone()} />
            <LocationForm
                status={board.location_status.clone()}
                on_city={board.on_city.clone()}
                on_coordinates={board.on_coordinates.clone()}
                on_detect={board.on_detect.clone()}
            />
        </div>
    }
}

fn register_service_worker() {
    let navigator = gloo_utils::window().navigator();
    let supported = js_sys::Reflect::has(&navigator, &JsValue::from_str("serviceWorker"))
        .unwrap_or(false);
    if !supported {
        warn!("Service workers are not supported; running without offline cache");
        return;
    }
    let registration = navigator.service_worker().register(SERVICE_WORKER_SCRIPT);
    spawn_local(async move {
        match JsFuture::from(registration).await {
            Ok(registration) => {
                let registration: ServiceWorkerRegistration = registration.unchecked_into();
                info!("Service Worker registered with scope: {}", registration.scope());
            }
            Err(e) => error!("Service Worker registration failed: {}", describe_js(&e)),
        }
    });
}

fn main() {
    console_error_panic_hook::set_once();
    if logging::init(logging::default_level()).is_err() {
        web_sys::console::warn_1(&JsValue::from_str("Logger was already installed"));
    }
    register_service_worker();
    yew::Renderer::<App>::new().render();
}
