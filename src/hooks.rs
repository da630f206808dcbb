//! Hooks owning the engine and the page's browser-event state.

use futures::StreamExt;
use log::{info, warn};
use prayer_clock::chime::BrowserChime;
use prayer_clock::clock::BrowserClock;
use prayer_clock::config::PollerConfig;
use prayer_clock::error::describe_js;
use prayer_clock::geolocation;
use prayer_clock::http::BrowserFetch;
use prayer_clock::poller::{Poller, SessionState, SnapshotOutcome};
use prayer_clock::preferences::{Coordinates, DetectedLocation, PreferenceStore};
use prayer_clock::scheduler;
use prayer_clock::view_model::RenderViewModel;
use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::spawn_local;
use yew::prelude::*;

/// The rendered board plus the location-form wiring.
#[derive(Clone)]
pub struct PrayerBoard {
    pub view: Rc<RenderViewModel>,
    pub location_status: Option<AttrValue>,
    pub on_city: Callback<String>,
    pub on_coordinates: Callback<Coordinates>,
    pub on_detect: Callback<()>,
}

fn relocation_message(outcome: SnapshotOutcome) -> &'static str {
    match outcome {
        SnapshotOutcome::Applied => "Location updated.",
        SnapshotOutcome::Failed => "Location saved, but prayer times could not be loaded.",
        // A newer refresh is already on its way.
        SnapshotOutcome::Stale => "Location updated.",
    }
}

fn relocate(poller: Poller, status: UseStateHandle<Option<AttrValue>>, detected: DetectedLocation) {
    spawn_local(async move {
        let outcome = poller.relocate(detected).await;
        status.set(Some(relocation_message(outcome).into()));
    });
}

/// Build the poller once, start its loops, and re-render on every
/// view-model it publishes.
#[hook]
pub fn use_prayer_board() -> PrayerBoard {
    let view = use_state(|| Rc::new(RenderViewModel::default()));
    let location_status = use_state(|| None::<AttrValue>);
    let poller: Rc<RefCell<Option<Poller>>> = use_mut_ref(|| None);

    {
        let view = view.clone();
        let poller = poller.clone();
        use_effect_with((), move |_| {
            let mut engine = Poller::new(
                SessionState::load(PreferenceStore::browser()),
                Rc::new(BrowserFetch),
                Rc::new(BrowserClock),
                Rc::new(BrowserChime::new()),
            );
            let mut updates = engine.subscribe();
            *poller.borrow_mut() = Some(engine.clone());
            let schedule = scheduler::start(engine, PollerConfig::default());

            spawn_local(async move {
                while let Some(vm) = updates.next().await {
                    view.set(Rc::new(vm));
                }
            });
            move || {
                info!("Stopping prayer board polling");
                schedule.stop();
            }
        });
    }

    let on_city = {
        let poller = poller.clone();
        let status = location_status.clone();
        Callback::from(move |city: String| {
            let Some(engine) = poller.borrow().clone() else {
                return;
            };
            let status = status.clone();
            status.set(Some(format!("Looking up {}...", city).into()));
            spawn_local(async move {
                match engine.geocode(&city).await {
                    Ok(found) => relocate(engine, status, DetectedLocation::Geocoded(found)),
                    Err(e) => {
                        warn!("Geocoding {} failed: {}", city, e);
                        status.set(Some(format!("Error: {}", e).into()));
                    }
                }
            });
        })
    };

    let on_coordinates = {
        let poller = poller.clone();
        let status = location_status.clone();
        Callback::from(move |coordinates: Coordinates| {
            let Some(engine) = poller.borrow().clone() else {
                return;
            };
            status.set(Some("Updating location...".into()));
            relocate(engine, status.clone(), DetectedLocation::Coordinates(coordinates));
        })
    };

    let on_detect = {
        let poller = poller.clone();
        let status = location_status.clone();
        let on_coordinates = on_coordinates.clone();
        Callback::from(move |()| {
            if poller.borrow().is_none() {
                return;
            }
            status.set(Some("Detecting location...".into()));
            let status = status.clone();
            let on_coordinates = on_coordinates.clone();
            spawn_local(async move {
                match geolocation::current_position().await {
                    Ok(coordinates) => on_coordinates.emit(coordinates),
                    Err(e) => status.set(Some(e.to_string().into())),
                }
            });
        })
    };

    PrayerBoard {
        view: (*view).clone(),
        location_status: (*location_status).clone(),
        on_city,
        on_coordinates,
        on_detect,
    }
}

/// Tracks `navigator.onLine` through the window's online/offline events.
#[hook]
pub fn use_online_status() -> bool {
    let online = use_state(|| gloo_utils::window().navigator().on_line());

    {
        let online = online.clone();
        use_effect_with((), move |_| {
            let window = gloo_utils::window();
            let on_online = {
                let online = online.clone();
                Closure::<dyn Fn()>::new(move || {
                    info!("Application is online");
                    online.set(true);
                })
            };
            let on_offline = Closure::<dyn Fn()>::new(move || {
                info!("Application is offline");
                online.set(false);
            });
            let listeners = [("online", &on_online), ("offline", &on_offline)];
            for (event, listener) in listeners {
                if let Err(e) = window
                    .add_event_listener_with_callback(event, listener.as_ref().unchecked_ref())
                {
                    warn!("Could not listen for {} events: {}", event, describe_js(&e));
                }
            }
            move || {
                for (event, listener) in [("online", &on_online), ("offline", &on_offline)] {
                    let _ = window.remove_event_listener_with_callback(
                        event,
                        listener.as_ref().unchecked_ref(),
                    );
                }
            }
        });
    }

    *online
}
