//! One-shot position lookup through `navigator.geolocation`.

use crate::error::{describe_js, LocationError};
use crate::preferences::Coordinates;
use futures::channel::oneshot;
use log::{debug, warn};
use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{Position as GeolocationPosition, PositionError as GeolocationPositionError};

type Reply = Rc<RefCell<Option<oneshot::Sender<Result<Coordinates, LocationError>>>>>;

fn answer(reply: &Reply, result: Result<Coordinates, LocationError>) {
    if let Some(tx) = reply.borrow_mut().take() {
        let _ = tx.send(result);
    }
}

/// Ask the browser for the device position once. The coordinates come back
/// unrounded.
pub async fn current_position() -> Result<Coordinates, LocationError> {
    let navigator = web_sys::window()
        .ok_or(LocationError::Unsupported)?
        .navigator();
    if !js_sys::Reflect::has(&navigator, &JsValue::from_str("geolocation")).unwrap_or(false) {
        return Err(LocationError::Unsupported);
    }
    let geolocation = navigator
        .geolocation()
        .map_err(|_| LocationError::Unsupported)?;

    let (tx, rx) = oneshot::channel();
    let reply: Reply = Rc::new(RefCell::new(Some(tx)));
    let on_success = {
        let reply = reply.clone();
        Closure::once(move |position: GeolocationPosition| {
            let coords = position.coords();
            answer(
                &reply,
                Ok(Coordinates::new(coords.latitude(), coords.longitude())),
            );
        })
    };
    let on_error = {
        let reply = reply.clone();
        Closure::once(move |error: GeolocationPositionError| {
            warn!("Geolocation error: {}", error.message());
            answer(&reply, Err(LocationError::Failed(error.message())));
        })
    };

    debug!("Requesting device position");
    geolocation
        .get_current_position_with_error_callback(
            on_success.as_ref().unchecked_ref(),
            Some(on_error.as_ref().unchecked_ref()),
        )
        .map_err(|e| LocationError::Failed(describe_js(&e)))?;
    // Both closures must outlive the browser's callback.
    let result = rx
        .await
        .map_err(|_| LocationError::Failed("no position was reported".to_string()));
    drop((on_success, on_error));
    result?
}
