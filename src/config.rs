//! Application-level configuration constants.

// Polling cadence
pub const SNAPSHOT_REFRESH_MS: u32 = 15 * 60 * 1000;
pub const LIVE_TICK_MS: u32 = 1_000;

// Time-service endpoints
pub const INITIAL_DATA_ENDPOINT: &str = "/api/initial_prayer_data";
pub const LIVE_DATA_ENDPOINT: &str = "/api/live_data";
pub const GEOCODE_ENDPOINT: &str = "/api/geocode";

// Guest defaults (Malad, Mumbai)
pub const DEFAULT_LATITUDE: f64 = 19.2183;
pub const DEFAULT_LONGITUDE: f64 = 72.8493;
pub const DEFAULT_CALC_METHOD: &str = "Karachi";
pub const DEFAULT_CITY_LABEL: &str = "Mumbai, IN";

/// localStorage key holding the serialized guest preferences.
pub const PREFS_STORAGE_KEY: &str = "prayerTimesGuestPrefs";

// Display sentinels
pub const NOT_AVAILABLE: &str = "N/A";
pub const CLOCK_ERROR_SENTINEL: &str = "--:--:-- ERR";
pub const SNAPSHOT_ERROR_LABEL: &str = "Error loading data";
pub const DEFAULT_LOCATION_LABEL: &str = "Current Location";
pub const PAGE_TITLE_SUFFIX: &str = "Prayer Times";

/// Seconds remaining before jamaat at which the audible cue fires.
pub const JAMAAT_CUE_SECONDS: i64 = 1;
pub const BEEP_SOUND_URL: &str = "/project/static/sounds/beep.mp3";

// Service worker
pub const SERVICE_WORKER_SCRIPT: &str = "/service-worker.js";
pub const SHELL_CACHE_NAME: &str = "prayer-times-global-cache-v1";
pub const API_CACHE_NAME: &str = "prayer-times-api-cache-v1";
pub const API_PATH_PREFIX: &str = "/api/";
pub const OFFLINE_ERROR_MESSAGE: &str = "Offline and data not in cache";

/// Static resources needed to load the page without a network.
pub const SHELL_ASSETS: &[&str] = &[
    "/",
    "/login",
    "/register",
    "/settings",
    "/project/static/css/dist/style.css",
    "/project/static/js/main_script.js",
    "/project/static/js/settings_script.js",
    "/project/static/fonts/DS-DIGI.TTF",
];

/// Intervals for the two polling tasks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollerConfig {
    pub snapshot_interval_ms: u32,
    pub tick_interval_ms: u32,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            snapshot_interval_ms: SNAPSHOT_REFRESH_MS,
            tick_interval_ms: LIVE_TICK_MS,
        }
    }
}
