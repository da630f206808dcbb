//! Snapshot/live-tick reconciliation engine.
//!
//! The [`Reconciler`] is synchronous: a request is opened with `begin_*`,
//! which hands out a sequence number and the URL, and closed with `finish_*`
//! once the transport has answered. Only the newest request of each channel
//! may change state, so overlapping round-trips (a location change while a
//! scheduled refresh is in flight) cannot overwrite newer data with older.
//!
//! [`Poller`] wraps a shared `Reconciler` with the transport, clock and cue,
//! and never holds a borrow across an `.await`.

use crate::chime::Chime;
use crate::clock::WallClock;
use crate::config::{
    DEFAULT_CALC_METHOD, DEFAULT_CITY_LABEL, DEFAULT_LATITUDE, DEFAULT_LONGITUDE,
    GEOCODE_ENDPOINT, INITIAL_DATA_ENDPOINT, JAMAAT_CUE_SECONDS, LIVE_DATA_ENDPOINT,
};
use crate::error::FetchError;
use crate::format::{parse_clock_time, TimeFormat};
use crate::http::{with_query, HttpClient};
use crate::payload::{GeocodeBody, LiveTick, NextPrayer, Snapshot};
use crate::preferences::{
    Coordinates, DetectedLocation, GeocodeResult, Identity, PreferenceLocation, PreferenceStore,
};
use crate::view_model::{ReconciledTick, RenderViewModel, ViewStatus};
use chrono::{NaiveDateTime, NaiveTime};
use futures::channel::mpsc::{unbounded, UnboundedReceiver, UnboundedSender};
use futures::channel::oneshot;
use log::{debug, info, warn};
use std::cell::RefCell;
use std::rc::Rc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollerState {
    Uninitialized,
    AwaitingSnapshot,
    Steady,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotOutcome {
    Applied,
    Failed,
    /// A newer snapshot request was issued before this one answered.
    Stale,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// No snapshot has succeeded yet.
    Skipped,
    Applied { play_cue: bool },
    Failed,
    Stale,
}

/// A request the engine has issued and is waiting on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingRequest {
    pub seq: u64,
    pub url: String,
}

/// Monotonic counter for one request channel.
#[derive(Debug, Default)]
struct SequenceGuard {
    issued: u64,
}

impl SequenceGuard {
    fn issue(&mut self) -> u64 {
        self.issued += 1;
        self.issued
    }

    fn is_current(&self, seq: u64) -> bool {
        seq == self.issued
    }
}

/// Remembers which jamaat the cue already fired for.
#[derive(Debug, Default)]
struct CueLatch {
    fired_for: Option<(String, String)>,
}

impl CueLatch {
    fn observe(&mut self, next: &NextPrayer) -> bool {
        if !next.is_jamaat_countdown_active {
            self.fired_for = None;
            return false;
        }
        let at_threshold = next
            .jamaat_countdown_seconds
            .is_some_and(|s| s.is_finite() && s.trunc() as i64 == JAMAAT_CUE_SECONDS);
        if !at_threshold {
            return false;
        }
        let key = (
            next.name.clone().unwrap_or_default(),
            next.jamaat_time.clone().unwrap_or_default(),
        );
        if self.fired_for.as_ref() == Some(&key) {
            return false;
        }
        self.fired_for = Some(key);
        true
    }
}

/// Minutes from `now` until `jamaat` on the following calendar day, floored
/// and clamped at zero. `None` when the time does not parse.
pub fn rollover_minutes(jamaat: &str, now: NaiveDateTime) -> Option<i64> {
    let (hours, minutes) = parse_clock_time(jamaat)?;
    let time = NaiveTime::from_hms_opt(hours, minutes, 0)?;
    let target = now.date().succ_opt()?.and_time(time);
    Some(target.signed_duration_since(now).num_minutes().max(0))
}

/// The session's preference plus what the server has told us about it.
pub struct SessionState {
    prefs: PreferenceLocation,
    identity: Identity,
    location_explicit: bool,
    seeded: bool,
    server_time_format: Option<TimeFormat>,
    server_calc_method: Option<String>,
    store: PreferenceStore,
}

impl SessionState {
    /// Start a session from whatever the store holds. A stored preference
    /// counts as an explicitly chosen location.
    pub fn load(store: PreferenceStore) -> Self {
        let stored = store.load_stored();
        let location_explicit = stored.is_some();
        Self {
            prefs: stored.unwrap_or_default(),
            identity: Identity::Guest,
            location_explicit,
            seeded: false,
            server_time_format: None,
            server_calc_method: None,
            store,
        }
    }

    pub fn preferences(&self) -> &PreferenceLocation {
        &self.prefs
    }

    pub fn identity(&self) -> Identity {
        self.identity
    }

    /// Display format: the server's record for signed-in users, the local
    /// preference for guests.
    pub fn time_format(&self) -> TimeFormat {
        match self.identity {
            Identity::Authenticated => self.server_time_format.unwrap_or(self.prefs.time_format),
            Identity::Guest => self.prefs.time_format,
        }
    }

    pub fn apply_detected(&mut self, detected: &DetectedLocation) {
        let method = self
            .server_calc_method
            .clone()
            .unwrap_or_else(|| DEFAULT_CALC_METHOD.to_string());
        self.prefs.apply_detected(detected, &method);
        self.location_explicit = true;
        self.store.save(self.identity, &self.prefs);
    }

    fn guest_location(&self) -> Option<(Coordinates, &str)> {
        if self.identity.is_guest() {
            self.prefs.query_location()
        } else {
            None
        }
    }

    fn snapshot_url(&self) -> String {
        let mut params = Vec::new();
        if let Some((coords, method)) = self.guest_location() {
            params.push(("lat", coords.latitude.to_string()));
            params.push(("lon", coords.longitude.to_string()));
            params.push(("method", method.to_string()));
            params.push(("city", self.prefs.city_label.clone().unwrap_or_default()));
        }
        params.push(("time_format", self.time_format().to_string()));
        with_query(INITIAL_DATA_ENDPOINT, &params)
    }

    fn live_url(&self) -> String {
        let mut params = Vec::new();
        if let Some((coords, method)) = self.guest_location() {
            params.push(("lat", coords.latitude.to_string()));
            params.push(("lon", coords.longitude.to_string()));
            params.push(("method", method.to_string()));
        }
        params.push(("time_format", self.time_format().to_string()));
        with_query(LIVE_DATA_ENDPOINT, &params)
    }

    /// Record the server's view of the session and, once per session, seed
    /// an unset guest location from the server defaults.
    fn absorb(&mut self, snapshot: &Snapshot) {
        let server = &snapshot.user_preferences;
        self.identity = Identity::from_flag(snapshot.is_user_authenticated);
        self.server_time_format = server.time_format.as_deref().map(TimeFormat::parse_or_default);
        self.server_calc_method = server.calculation_method.clone();

        if !self.identity.is_guest() || self.location_explicit || self.seeded {
            return;
        }
        let coordinates = match (server.home_latitude, server.home_longitude) {
            (Some(lat), Some(lon)) => Coordinates::new(lat, lon),
            _ => Coordinates::new(DEFAULT_LATITUDE, DEFAULT_LONGITUDE),
        };
        self.prefs = PreferenceLocation {
            coordinates: Some(coordinates),
            calc_method: Some(
                server
                    .calculation_method
                    .clone()
                    .unwrap_or_else(|| DEFAULT_CALC_METHOD.to_string()),
            ),
            city_label: Some(
                snapshot
                    .current_location_name
                    .clone()
                    .unwrap_or_else(|| DEFAULT_CITY_LABEL.to_string()),
            ),
            time_format: self.server_time_format.unwrap_or(self.prefs.time_format),
        };
        self.seeded = true;
        self.location_explicit = true;
        info!("Seeded guest location from server defaults");
        self.store.save(self.identity, &self.prefs);
    }
}

/// Owns the latest snapshot and tick and decides what a response may change.
pub struct Reconciler {
    state: PollerState,
    session: SessionState,
    snapshot: Option<Snapshot>,
    live: Option<ReconciledTick>,
    snapshot_seq: SequenceGuard,
    tick_seq: SequenceGuard,
    snapshot_error: bool,
    clock_error: bool,
    cue: CueLatch,
}

impl Reconciler {
    pub fn new(session: SessionState) -> Self {
        Self {
            state: PollerState::Uninitialized,
            session,
            snapshot: None,
            live: None,
            snapshot_seq: SequenceGuard::default(),
            tick_seq: SequenceGuard::default(),
            snapshot_error: false,
            clock_error: false,
            cue: CueLatch::default(),
        }
    }

    pub fn state(&self) -> PollerState {
        self.state
    }

    pub fn session(&self) -> &SessionState {
        &self.session
    }

    pub fn snapshot(&self) -> Option<&Snapshot> {
        self.snapshot.as_ref()
    }

    pub fn live(&self) -> Option<&ReconciledTick> {
        self.live.as_ref()
    }

    pub fn begin_snapshot(&mut self) -> PendingRequest {
        if self.state == PollerState::Uninitialized {
            self.state = PollerState::AwaitingSnapshot;
        }
        PendingRequest {
            seq: self.snapshot_seq.issue(),
            url: self.session.snapshot_url(),
        }
    }

    pub fn finish_snapshot(
        &mut self,
        seq: u64,
        result: Result<Snapshot, FetchError>,
    ) -> SnapshotOutcome {
        if !self.snapshot_seq.is_current(seq) {
            debug!("Discarding stale snapshot response #{}", seq);
            return SnapshotOutcome::Stale;
        }
        match result {
            Ok(snapshot) => {
                self.session.absorb(&snapshot);
                self.snapshot = Some(snapshot);
                self.snapshot_error = false;
                self.state = PollerState::Steady;
                SnapshotOutcome::Applied
            }
            Err(e) => {
                warn!("Failed to fetch initial data: {}", e);
                self.snapshot_error = true;
                SnapshotOutcome::Failed
            }
        }
    }

    /// `None` until the first snapshot has landed.
    pub fn begin_tick(&mut self) -> Option<PendingRequest> {
        if self.state != PollerState::Steady {
            return None;
        }
        Some(PendingRequest {
            seq: self.tick_seq.issue(),
            url: self.session.live_url(),
        })
    }

    pub fn finish_tick(
        &mut self,
        seq: u64,
        result: Result<LiveTick, FetchError>,
        now: NaiveDateTime,
    ) -> TickOutcome {
        if !self.tick_seq.is_current(seq) {
            debug!("Discarding stale live response #{}", seq);
            return TickOutcome::Stale;
        }
        let tick = match result {
            Ok(tick) => tick,
            Err(e) => {
                warn!("Failed to fetch live data: {}", e);
                self.clock_error = true;
                return TickOutcome::Failed;
            }
        };

        let next = &tick.next_prayer;
        let server_minutes = next
            .time_to_jamaat_minutes
            .filter(|m| m.is_finite())
            .map(|m| m.floor() as i64)
            .unwrap_or(0);
        // Across midnight the server's count can drift; recompute locally.
        let minutes_to_jamaat = if next.is_next_day_fajr {
            next.jamaat_time
                .as_deref()
                .and_then(|jamaat| rollover_minutes(jamaat, now))
                .unwrap_or(server_minutes)
        } else {
            server_minutes
        };

        let play_cue = self.cue.observe(next);
        self.live = Some(ReconciledTick {
            tick,
            minutes_to_jamaat,
        });
        self.clock_error = false;
        TickOutcome::Applied { play_cue }
    }

    /// Take a location from the resolution flow. The caller follows up with
    /// a snapshot refresh.
    /// Live ticks already in flight answer for the old location and are
    /// discarded.
    pub fn apply_detected(&mut self, detected: &DetectedLocation) {
        self.session.apply_detected(detected);
        self.tick_seq.issue();
    }

    pub fn view(&self) -> RenderViewModel {
        RenderViewModel::build(
            self.snapshot.as_ref(),
            self.live.as_ref(),
            self.session.time_format(),
            ViewStatus {
                identity: self.session.identity(),
                snapshot_error: self.snapshot_error,
                clock_error: self.clock_error,
            },
        )
    }
}

/// Drives a shared [`Reconciler`] against the time service.
#[derive(Clone)]
pub struct Poller {
    engine: Rc<RefCell<Reconciler>>,
    http: Rc<dyn HttpClient>,
    clock: Rc<dyn WallClock>,
    chime: Rc<dyn Chime>,
    updates: Option<UnboundedSender<RenderViewModel>>,
    steady_waiters: Rc<RefCell<Vec<oneshot::Sender<()>>>>,
}

impl Poller {
    pub fn new(
        session: SessionState,
        http: Rc<dyn HttpClient>,
        clock: Rc<dyn WallClock>,
        chime: Rc<dyn Chime>,
    ) -> Self {
        Self {
            engine: Rc::new(RefCell::new(Reconciler::new(session))),
            http,
            clock,
            chime,
            updates: None,
            steady_waiters: Rc::default(),
        }
    }

    /// Receive a fresh view-model after every state change.
    pub fn subscribe(&mut self) -> UnboundedReceiver<RenderViewModel> {
        let (tx, rx) = unbounded();
        self.updates = Some(tx);
        rx
    }

    pub fn state(&self) -> PollerState {
        self.engine.borrow().state()
    }

    pub fn view(&self) -> RenderViewModel {
        self.engine.borrow().view()
    }

    /// Run `f` against the engine state.
    pub fn inspect<R>(&self, f: impl FnOnce(&Reconciler) -> R) -> R {
        f(&self.engine.borrow())
    }

    /// Resolves once the engine has reached [`PollerState::Steady`], whether
    /// through a scheduled refresh or a relocation. Resolves at once when it
    /// already has.
    pub fn when_steady(&self) -> oneshot::Receiver<()> {
        let (tx, rx) = oneshot::channel();
        if self.state() == PollerState::Steady {
            let _ = tx.send(());
        } else {
            self.steady_waiters.borrow_mut().push(tx);
        }
        rx
    }

    fn notify_steady(&self) {
        let waiters = std::mem::take(&mut *self.steady_waiters.borrow_mut());
        for tx in waiters {
            let _ = tx.send(());
        }
    }

    fn publish(&self) {
        if let Some(tx) = &self.updates {
            if tx.unbounded_send(self.view()).is_err() {
                debug!("View subscriber is gone");
            }
        }
    }

    pub async fn refresh_snapshot(&self) -> SnapshotOutcome {
        let pending = self.engine.borrow_mut().begin_snapshot();
        let result = match self.http.get(&pending.url).await {
            Ok(response) => response.json::<Snapshot>(),
            Err(e) => Err(e),
        };
        let outcome = self.engine.borrow_mut().finish_snapshot(pending.seq, result);
        if outcome != SnapshotOutcome::Stale {
            self.publish();
        }
        if outcome == SnapshotOutcome::Applied {
            self.notify_steady();
        }
        outcome
    }

    pub async fn tick(&self) -> TickOutcome {
        let Some(pending) = self.engine.borrow_mut().begin_tick() else {
            return TickOutcome::Skipped;
        };
        let result = match self.http.get(&pending.url).await {
            Ok(response) => response.json::<LiveTick>(),
            Err(e) => Err(e),
        };
        let now = self.clock.now();
        let outcome = self.engine.borrow_mut().finish_tick(pending.seq, result, now);
        if let TickOutcome::Applied { play_cue: true } = outcome {
            if let Err(e) = self.chime.play() {
                warn!("Jamaat cue failed: {}", e);
            }
        }
        if outcome != TickOutcome::Stale {
            self.publish();
        }
        outcome
    }

    /// Apply a resolved location and immediately refresh the snapshot.
    pub async fn relocate(&self, detected: DetectedLocation) -> SnapshotOutcome {
        self.engine.borrow_mut().apply_detected(&detected);
        self.publish();
        self.refresh_snapshot().await
    }

    /// Resolve a city name through the geocoding endpoint.
    pub async fn geocode(&self, city: &str) -> Result<GeocodeResult, FetchError> {
        let url = with_query(GEOCODE_ENDPOINT, &[("city", city.trim().to_string())]);
        let response = self.http.get(&url).await?;
        let body: GeocodeBody = match serde_json::from_str(&response.body) {
            Ok(body) => body,
            Err(_) if !response.is_success() => return Err(FetchError::Status(response.status)),
            Err(e) => return Err(e.into()),
        };
        if let Some(error) = body.error {
            return Err(FetchError::Service(error));
        }
        match (response.is_success(), body.latitude, body.longitude, body.city_name) {
            (true, Some(latitude), Some(longitude), Some(city_name)) => Ok(GeocodeResult {
                latitude,
                longitude,
                city_name,
                country: body.country.unwrap_or_default(),
            }),
            _ => Err(FetchError::Service("Could not find city.".to_string())),
        }
    }
}
