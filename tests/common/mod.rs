//! Scripted transports and fixtures shared by the integration tests.

#![allow(dead_code)]

use chrono::{NaiveDate, NaiveDateTime};
use futures::future::LocalBoxFuture;
use prayer_clock::chime::Chime;
use prayer_clock::error::{CueError, FetchError, NetworkError, StorageError};
use prayer_clock::http::{HttpClient, HttpResponse};
use prayer_clock::preferences::{KeyValueStore, MemoryStore};
use prayer_clock::worker::{Network, WorkerRequest, WorkerResponse};
use std::cell::{Cell, RefCell};
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;

/// HTTP client answering from per-endpoint queues. The last queued answer
/// for an endpoint repeats once the queue is down to one.
#[derive(Default)]
pub struct ScriptedHttp {
    answers: RefCell<HashMap<String, VecDeque<Result<HttpResponse, String>>>>,
    requests: RefCell<Vec<String>>,
}

fn endpoint_of(url: &str) -> &str {
    url.split('?').next().unwrap_or(url)
}

impl ScriptedHttp {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    pub fn respond(&self, endpoint: &str, status: u16, body: &str) {
        self.answers
            .borrow_mut()
            .entry(endpoint.to_string())
            .or_default()
            .push_back(Ok(HttpResponse {
                status,
                body: body.to_string(),
            }));
    }

    pub fn reject(&self, endpoint: &str, reason: &str) {
        self.answers
            .borrow_mut()
            .entry(endpoint.to_string())
            .or_default()
            .push_back(Err(reason.to_string()));
    }

    /// Every URL requested so far, in order.
    pub fn requests(&self) -> Vec<String> {
        self.requests.borrow().clone()
    }

    pub fn requests_to(&self, endpoint: &str) -> Vec<String> {
        self.requests()
            .into_iter()
            .filter(|url| endpoint_of(url) == endpoint)
            .collect()
    }
}

impl HttpClient for ScriptedHttp {
    fn get<'a>(&'a self, url: &'a str) -> LocalBoxFuture<'a, Result<HttpResponse, FetchError>> {
        self.requests.borrow_mut().push(url.to_string());
        let answer = {
            let mut answers = self.answers.borrow_mut();
            match answers.get_mut(endpoint_of(url)) {
                Some(queue) if queue.len() > 1 => queue.pop_front(),
                Some(queue) => queue.front().cloned(),
                None => None,
            }
        };
        Box::pin(async move {
            match answer {
                Some(Ok(response)) => Ok(response),
                Some(Err(reason)) => Err(FetchError::Network(reason)),
                None => Err(FetchError::Network(format!("unscripted request: {}", url))),
            }
        })
    }
}

/// Worker-side network keyed by URL. Anything unknown, or everything while
/// offline, is rejected.
#[derive(Default)]
pub struct ScriptedNetwork {
    responses: RefCell<HashMap<String, WorkerResponse>>,
    offline: Cell<bool>,
    fetches: Cell<usize>,
}

impl ScriptedNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn serve(&self, url: &str, response: WorkerResponse) {
        self.responses
            .borrow_mut()
            .insert(url.to_string(), response);
    }

    pub fn go_offline(&self) {
        self.offline.set(true);
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.get()
    }
}

impl Network for ScriptedNetwork {
    fn fetch<'a>(
        &'a self,
        request: &'a WorkerRequest,
    ) -> LocalBoxFuture<'a, Result<WorkerResponse, NetworkError>> {
        self.fetches.set(self.fetches.get() + 1);
        let result = if self.offline.get() {
            Err(NetworkError::Rejected("Failed to fetch".into()))
        } else {
            self.responses
                .borrow()
                .get(&request.url)
                .cloned()
                .ok_or_else(|| NetworkError::Rejected(format!("no route to {}", request.url)))
        };
        Box::pin(async move { result })
    }
}

pub fn json_response(status: u16, body: &str) -> WorkerResponse {
    WorkerResponse {
        status,
        status_text: if status == 200 { "OK".into() } else { String::new() },
        content_type: Some("application/json".into()),
        body: body.as_bytes().to_vec(),
        handle: None,
    }
}

pub fn text_response(body: &str) -> WorkerResponse {
    WorkerResponse {
        status: 200,
        status_text: "OK".into(),
        content_type: Some("text/html".into()),
        body: body.as_bytes().to_vec(),
        handle: None,
    }
}

/// Counts plays; optionally refuses every one.
#[derive(Default)]
pub struct RecordingChime {
    plays: Cell<usize>,
    refuse: bool,
}

impl RecordingChime {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    pub fn refusing() -> Rc<Self> {
        Rc::new(Self {
            plays: Cell::new(0),
            refuse: true,
        })
    }

    pub fn plays(&self) -> usize {
        self.plays.get()
    }
}

impl Chime for RecordingChime {
    fn play(&self) -> Result<(), CueError> {
        self.plays.set(self.plays.get() + 1);
        if self.refuse {
            return Err(CueError::NotReady);
        }
        Ok(())
    }
}

/// Key-value store the test keeps a handle on after handing it to the engine.
#[derive(Clone, Default)]
pub struct SharedStore(pub Rc<MemoryStore>);

impl SharedStore {
    pub fn get(&self, key: &str) -> Option<String> {
        self.0.read(key).ok().flatten()
    }
}

impl KeyValueStore for SharedStore {
    fn read(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.0.read(key)
    }

    fn write(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.0.write(key, value)
    }
}

pub fn at(h: u32, m: u32, s: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2026, 10, 16)
        .unwrap()
        .and_hms_opt(h, m, s)
        .unwrap()
}

pub const GUEST_SNAPSHOT: &str = r#"{
    "isUserAuthenticated": false,
    "currentLocationName": "Malad, Mumbai",
    "prayerTimes": {
        "fajr": {"azan": "05:20", "jamaat": "05:45"},
        "dhuhr": {"azan": "12:45", "jamaat": "13:15"},
        "asr": {"azan": "16:10", "jamaat": "16:30"},
        "maghrib": {"azan": "18:21", "jamaat": "18:24"},
        "isha": {"azan": "19:35", "jamaat": "20:00"},
        "jummah": {"azan": "12:45", "jamaat": "13:30", "khutbah": "13:15"}
    },
    "apiTimesForDisplay": {
        "Sunrise": "06:35",
        "Sunset": "18:19",
        "Zawal_Start_Approx": "12:20",
        "Zawal_End_Approx": "12:35",
        "CurrentTemperature": 28.4,
        "WeatherDescription": "haze"
    },
    "tomorrowFajrDisplay": {"azan": "05:21", "jamaat": "05:45"},
    "dateInfo": {"gregorian": "Friday, 16 October 2026", "hijri": "4 Jumada al-Awwal 1448"},
    "userPreferences": {
        "homeLatitude": null,
        "homeLongitude": null,
        "calculationMethod": "Karachi",
        "timeFormat": "12h"
    }
}"#;

pub fn live_tick(current_time: &str, countdown: Option<f64>) -> String {
    let next = match countdown {
        Some(seconds) => format!(
            r#"{{"name": "Asr", "azanTime": "16:10", "jamaatTime": "16:30",
                "timeToJamaatMinutes": 0, "isNextDayFajr": false,
                "isJamaatCountdownActive": true, "jamaatCountdownSeconds": {},
                "isPostJamaatCountdownActive": false}}"#,
            seconds
        ),
        None => r#"{"name": "Asr", "azanTime": "16:10", "jamaatTime": "16:30",
                "timeToJamaatMinutes": 42, "isNextDayFajr": false,
                "isJamaatCountdownActive": false, "isPostJamaatCountdownActive": false}"#
            .to_string(),
    };
    format!(
        r#"{{"currentTime": "{}", "currentDay": "Friday", "nextPrayer": {},
            "currentNamazPeriod": {{"name": "Dhuhr", "start": "12:45", "end": "16:10"}},
            "fastingTimes": {{"sahr": "05:10", "iftar": "18:21"}}}}"#,
        current_time, next
    )
}
