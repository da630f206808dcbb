//! Query location and time-format preference for the current session.
//!
//! Guests keep their preference in `localStorage` under a single key; the
//! whole structure is serialized into one value so a reader never sees half
//! of an update. Authenticated users keep theirs on the server, so every
//! write is skipped for them.

use crate::config::{
    DEFAULT_CALC_METHOD, DEFAULT_CITY_LABEL, DEFAULT_LATITUDE, DEFAULT_LONGITUDE,
    PREFS_STORAGE_KEY,
};
use crate::error::{describe_js, StorageError};
use crate::format::TimeFormat;
use log::{debug, warn};
use serde::{Deserialize, Deserializer, Serialize};
use std::cell::RefCell;
use std::collections::HashMap;

/// A latitude/longitude pair. Both halves are always present together.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }

    /// Round both halves to four decimal places.
    pub fn rounded(self) -> Self {
        let round4 = |v: f64| (v * 10_000.0).round() / 10_000.0;
        Self::new(round4(self.latitude), round4(self.longitude))
    }
}

/// Whether preferences live locally (guest) or on the server.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Identity {
    #[default]
    Guest,
    Authenticated,
}

impl Identity {
    pub fn from_flag(is_authenticated: bool) -> Self {
        if is_authenticated {
            Identity::Authenticated
        } else {
            Identity::Guest
        }
    }

    pub fn is_guest(self) -> bool {
        self == Identity::Guest
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PreferenceLocation {
    pub coordinates: Option<Coordinates>,
    pub calc_method: Option<String>,
    pub city_label: Option<String>,
    pub time_format: TimeFormat,
}

impl Default for PreferenceLocation {
    fn default() -> Self {
        Self {
            coordinates: Some(Coordinates::new(DEFAULT_LATITUDE, DEFAULT_LONGITUDE)),
            calc_method: Some(DEFAULT_CALC_METHOD.to_string()),
            city_label: Some(DEFAULT_CITY_LABEL.to_string()),
            time_format: TimeFormat::TwelveHour,
        }
    }
}

/// Result of the external location-resolution flow.
#[derive(Debug, Clone, PartialEq)]
pub enum DetectedLocation {
    /// Raw coordinates from geolocation or manual entry.
    Coordinates(Coordinates),
    /// A city resolved through `/api/geocode`.
    Geocoded(GeocodeResult),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeocodeResult {
    pub latitude: f64,
    pub longitude: f64,
    pub city_name: String,
    #[serde(default)]
    pub country: String,
}

impl PreferenceLocation {
    /// Overwrite location fields from a detection result. `time_format` is
    /// left alone.
    pub fn apply_detected(&mut self, detected: &DetectedLocation, calc_method: &str) {
        match detected {
            DetectedLocation::Coordinates(coords) => {
                let coords = coords.rounded();
                self.city_label = Some(format!(
                    "Lat: {}, Lon: {}",
                    coords.latitude, coords.longitude
                ));
                self.coordinates = Some(coords);
            }
            DetectedLocation::Geocoded(geo) => {
                self.coordinates = Some(Coordinates::new(geo.latitude, geo.longitude).rounded());
                self.city_label = Some(if geo.country.is_empty() {
                    geo.city_name.clone()
                } else {
                    format!("{}, {}", geo.city_name, geo.country)
                });
            }
        }
        self.calc_method = Some(calc_method.to_string());
    }

    /// Coordinates and method, when both are known.
    pub fn query_location(&self) -> Option<(Coordinates, &str)> {
        match (self.coordinates, self.calc_method.as_deref()) {
            (Some(coords), Some(method)) if !method.is_empty() => Some((coords, method)),
            _ => None,
        }
    }
}

/// Flat wire form kept in storage.
#[derive(Debug, Serialize, Deserialize)]
struct StoredPreferences {
    #[serde(default)]
    latitude: Option<f64>,
    #[serde(default)]
    longitude: Option<f64>,
    #[serde(default)]
    method: Option<String>,
    #[serde(default)]
    city_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_time_format")]
    time_format: TimeFormat,
}

/// An unknown, null or non-string `time_format` is the 12-hour default; it
/// never costs the rest of the record.
fn lenient_time_format<'de, D>(deserializer: D) -> Result<TimeFormat, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(raw
        .as_ref()
        .and_then(serde_json::Value::as_str)
        .map(TimeFormat::parse_or_default)
        .unwrap_or_default())
}

impl From<&PreferenceLocation> for StoredPreferences {
    fn from(prefs: &PreferenceLocation) -> Self {
        Self {
            latitude: prefs.coordinates.map(|c| c.latitude),
            longitude: prefs.coordinates.map(|c| c.longitude),
            method: prefs.calc_method.clone(),
            city_name: prefs.city_label.clone(),
            time_format: prefs.time_format,
        }
    }
}

impl From<StoredPreferences> for PreferenceLocation {
    fn from(stored: StoredPreferences) -> Self {
        let coordinates = match (stored.latitude, stored.longitude) {
            (Some(lat), Some(lon)) => Some(Coordinates::new(lat, lon)),
            _ => None,
        };
        Self {
            coordinates,
            calc_method: stored.method,
            city_label: stored.city_name,
            time_format: stored.time_format,
        }
    }
}

/// Minimal string key-value store.
pub trait KeyValueStore {
    fn read(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn write(&self, key: &str, value: &str) -> Result<(), StorageError>;
}

/// In-memory store used in tests and when `localStorage` is unavailable.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RefCell<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entry(key: &str, value: &str) -> Self {
        let store = Self::new();
        store
            .entries
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        store
    }
}

impl KeyValueStore for MemoryStore {
    fn read(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.borrow().get(key).cloned())
    }

    fn write(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// The browser's `window.localStorage`.
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalStorage;

impl LocalStorage {
    fn storage() -> Result<web_sys::Storage, StorageError> {
        let window = web_sys::window().ok_or(StorageError::Unavailable)?;
        window
            .local_storage()
            .map_err(|e| StorageError::Js(describe_js(&e)))?
            .ok_or(StorageError::Unavailable)
    }
}

impl KeyValueStore for LocalStorage {
    fn read(&self, key: &str) -> Result<Option<String>, StorageError> {
        Self::storage()?
            .get_item(key)
            .map_err(|e| StorageError::Js(describe_js(&e)))
    }

    fn write(&self, key: &str, value: &str) -> Result<(), StorageError> {
        Self::storage()?
            .set_item(key, value)
            .map_err(|e| StorageError::Js(describe_js(&e)))
    }
}

/// Loads and saves [`PreferenceLocation`] through a [`KeyValueStore`].
pub struct PreferenceStore {
    store: Box<dyn KeyValueStore>,
    key: &'static str,
}

impl PreferenceStore {
    pub fn new(store: Box<dyn KeyValueStore>) -> Self {
        Self {
            store,
            key: PREFS_STORAGE_KEY,
        }
    }

    pub fn browser() -> Self {
        Self::new(Box::new(LocalStorage))
    }

    /// Read the stored preference, or `None` when nothing usable is stored.
    /// Errors are logged and absorbed.
    pub fn load_stored(&self) -> Option<PreferenceLocation> {
        let raw = match self.store.read(self.key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                warn!("Could not read stored preferences: {}", e);
                return None;
            }
        };
        match serde_json::from_str::<StoredPreferences>(&raw) {
            Ok(stored) => {
                debug!("Loaded guest preferences from storage");
                Some(stored.into())
            }
            Err(e) => {
                warn!("Discarding malformed stored preferences: {}", e);
                None
            }
        }
    }

    /// Stored preference, falling back to the documented default.
    pub fn load(&self) -> PreferenceLocation {
        self.load_stored().unwrap_or_default()
    }

    /// Persist `state` for guests. Returns whether anything was written.
    pub fn save(&self, identity: Identity, state: &PreferenceLocation) -> bool {
        if !identity.is_guest() {
            debug!("Skipping local preference save for authenticated session");
            return false;
        }
        let result = serde_json::to_string(&StoredPreferences::from(state))
            .map_err(StorageError::from)
            .and_then(|json| self.store.write(self.key, &json));
        match result {
            Ok(()) => {
                debug!("Saved guest preferences");
                true
            }
            Err(e) => {
                warn!("Could not save guest preferences: {}", e);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn store_with(raw: &str) -> PreferenceStore {
        PreferenceStore::new(Box::new(MemoryStore::with_entry(PREFS_STORAGE_KEY, raw)))
    }

    #[test]
    fn missing_entry_loads_default() {
        let store = PreferenceStore::new(Box::new(MemoryStore::new()));
        let prefs = store.load();
        assert_eq!(prefs, PreferenceLocation::default());
        assert_eq!(prefs.calc_method.as_deref(), Some("Karachi"));
        assert_eq!(prefs.time_format, TimeFormat::TwelveHour);
    }

    #[test]
    fn malformed_entry_loads_default() {
        assert_eq!(store_with("{not json").load(), PreferenceLocation::default());
        assert_eq!(store_with("[1,2,3]").load(), PreferenceLocation::default());
    }

    #[test]
    fn bad_time_format_keeps_the_rest_of_the_record() {
        for time_format in [r#""bogus""#, "null", "24"] {
            let raw = format!(
                r#"{{"latitude": 21.4225, "longitude": 39.8262, "method": "Makkah",
                    "city_name": "Makkah, SA", "time_format": {}}}"#,
                time_format
            );
            let prefs = store_with(&raw).load();
            assert_eq!(prefs.city_label.as_deref(), Some("Makkah, SA"), "{}", time_format);
            assert_eq!(prefs.coordinates, Some(Coordinates::new(21.4225, 39.8262)));
            assert_eq!(prefs.calc_method.as_deref(), Some("Makkah"));
            assert_eq!(prefs.time_format, TimeFormat::TwelveHour);
        }
    }

    #[test]
    fn lone_coordinate_is_dropped() {
        let prefs = store_with(r#"{"latitude": 10.0, "method": "ISNA", "time_format": "24h"}"#).load();
        assert_eq!(prefs.coordinates, None);
        assert_eq!(prefs.calc_method.as_deref(), Some("ISNA"));
        assert_eq!(prefs.time_format, TimeFormat::TwentyFourHour);
    }

    #[test]
    fn authenticated_save_is_a_no_op() {
        let store = PreferenceStore::new(Box::new(MemoryStore::new()));
        let mut changed = PreferenceLocation::default();
        changed.city_label = Some("Elsewhere".into());

        assert!(!store.save(Identity::Authenticated, &changed));
        assert_eq!(store.load(), PreferenceLocation::default());

        assert!(store.save(Identity::Guest, &changed));
        let mut again = changed.clone();
        again.city_label = Some("Third".into());
        assert!(!store.save(Identity::Authenticated, &again));
        assert_eq!(store.load(), changed);
    }

    #[test]
    fn apply_detected_keeps_time_format() {
        let mut prefs = PreferenceLocation {
            time_format: TimeFormat::TwentyFourHour,
            ..PreferenceLocation::default()
        };
        prefs.apply_detected(
            &DetectedLocation::Coordinates(Coordinates::new(51.507_351, -0.127_758)),
            "ISNA",
        );
        assert_eq!(prefs.coordinates, Some(Coordinates::new(51.5074, -0.1278)));
        assert_eq!(prefs.city_label.as_deref(), Some("Lat: 51.5074, Lon: -0.1278"));
        assert_eq!(prefs.calc_method.as_deref(), Some("ISNA"));
        assert_eq!(prefs.time_format, TimeFormat::TwentyFourHour);

        prefs.apply_detected(
            &DetectedLocation::Geocoded(GeocodeResult {
                latitude: 24.86,
                longitude: 67.01,
                city_name: "Karachi".into(),
                country: "PK".into(),
            }),
            "Karachi",
        );
        assert_eq!(prefs.city_label.as_deref(), Some("Karachi, PK"));
        assert_eq!(prefs.time_format, TimeFormat::TwentyFourHour);
    }

    fn arb_preferences() -> impl Strategy<Value = PreferenceLocation> {
        (
            proptest::option::of((-90.0f64..90.0, -180.0f64..180.0)),
            proptest::option::of("[A-Za-z]{1,12}"),
            proptest::option::of("[A-Za-z ,]{0,24}"),
            any::<bool>(),
        )
            .prop_map(|(coords, method, city, twenty_four)| PreferenceLocation {
                coordinates: coords.map(|(lat, lon)| Coordinates::new(lat, lon)),
                calc_method: method,
                city_label: city,
                time_format: if twenty_four {
                    TimeFormat::TwentyFourHour
                } else {
                    TimeFormat::TwelveHour
                },
            })
    }

    proptest! {
        #[test]
        fn guest_save_then_load_round_trips(state in arb_preferences()) {
            let store = PreferenceStore::new(Box::new(MemoryStore::new()));
            prop_assert!(store.save(Identity::Guest, &state));
            prop_assert_eq!(store.load(), state);
        }
    }
}
