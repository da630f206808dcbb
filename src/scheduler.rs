//! Timer loops driving the [`Poller`].
//!
//! Each loop waits for its task to finish before sleeping, so a slow
//! round-trip delays the next one instead of overlapping it.

use crate::config::PollerConfig;
use crate::poller::Poller;
use gloo_timers::future::TimeoutFuture;
use log::{debug, info};
use std::cell::Cell;
use std::future::Future;
use std::rc::Rc;
use wasm_bindgen_futures::spawn_local;

/// Stops the loops started by [`start`] at their next wake-up.
#[derive(Debug, Clone, Default)]
pub struct SchedulerHandle {
    stopped: Rc<Cell<bool>>,
}

impl SchedulerHandle {
    pub fn stop(&self) {
        self.stopped.set(true);
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.get()
    }
}

/// Run `task` forever, sleeping `interval_ms` after each run.
pub async fn run_periodic<F, Fut>(interval_ms: u32, handle: SchedulerHandle, mut task: F)
where
    F: FnMut() -> Fut,
    Fut: Future<Output = ()>,
{
    while !handle.is_stopped() {
        task().await;
        TimeoutFuture::new(interval_ms).await;
    }
}

/// Wait until the engine is steady, then tick every `interval_ms`. Nothing
/// is requested before the first snapshot lands.
async fn run_live_clock(poller: Poller, interval_ms: u32, handle: SchedulerHandle) {
    if poller.when_steady().await.is_err() || handle.is_stopped() {
        return;
    }
    debug!("First snapshot applied; starting live clock");
    run_periodic(interval_ms, handle, move || {
        let poller = poller.clone();
        async move {
            poller.tick().await;
        }
    })
    .await;
}

/// Start the snapshot loop immediately. The live-tick loop starts on the
/// first successful snapshot, whether the loop or a relocation fetched it.
pub fn start(poller: Poller, config: PollerConfig) -> SchedulerHandle {
    let handle = SchedulerHandle::default();
    info!(
        "Polling snapshot every {}ms, live data every {}ms",
        config.snapshot_interval_ms, config.tick_interval_ms
    );

    spawn_local(run_live_clock(
        poller.clone(),
        config.tick_interval_ms,
        handle.clone(),
    ));
    spawn_local(run_periodic(
        config.snapshot_interval_ms,
        handle.clone(),
        move || {
            let poller = poller.clone();
            async move {
                poller.refresh_snapshot().await;
            }
        },
    ));
    handle
}
