//! Wire payloads returned by the time service.
//!
//! Every field is optional so a partially populated payload still decodes;
//! the view-model substitutes sentinels for whatever is missing.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Prayer keys in display order.
pub const PRAYER_KEYS: [&str; 6] = ["fajr", "dhuhr", "asr", "maghrib", "isha", "jummah"];

/// The entry that may carry a khutbah time.
pub const KHUTBAH_PRAYER_KEY: &str = "jummah";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrayerSlot {
    pub azan: Option<String>,
    pub jamaat: Option<String>,
    pub khutbah: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuxiliaryTimes {
    #[serde(rename = "Sunrise")]
    pub sunrise: Option<String>,
    #[serde(rename = "Sunset")]
    pub sunset: Option<String>,
    #[serde(rename = "Zawal_Start_Approx")]
    pub zawal_start: Option<String>,
    #[serde(rename = "Zawal_End_Approx")]
    pub zawal_end: Option<String>,
    #[serde(rename = "CurrentTemperature")]
    pub temperature: Option<f64>,
    #[serde(rename = "WeatherDescription")]
    pub weather_description: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DateInfo {
    pub gregorian: Option<String>,
    pub hijri: Option<String>,
}

/// Server-side view of the session's preferences.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ServerPreferences {
    pub home_latitude: Option<f64>,
    pub home_longitude: Option<f64>,
    pub calculation_method: Option<String>,
    pub time_format: Option<String>,
}

/// Slow-refresh payload from `/api/initial_prayer_data`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Snapshot {
    pub is_user_authenticated: bool,
    pub current_location_name: Option<String>,
    pub prayer_times: HashMap<String, PrayerSlot>,
    pub api_times_for_display: AuxiliaryTimes,
    pub tomorrow_fajr_display: Option<PrayerSlot>,
    pub date_info: DateInfo,
    pub user_preferences: ServerPreferences,
}

impl Snapshot {
    pub fn prayer(&self, key: &str) -> Option<&PrayerSlot> {
        self.prayer_times.get(key)
    }

    /// Khutbah time, when the designated entry carries a usable one.
    pub fn khutbah(&self) -> Option<&str> {
        self.prayer(KHUTBAH_PRAYER_KEY)
            .and_then(|slot| slot.khutbah.as_deref())
            .filter(|k| !k.trim().is_empty() && *k != crate::config::NOT_AVAILABLE)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NextPrayer {
    pub name: Option<String>,
    pub azan_time: Option<String>,
    pub jamaat_time: Option<String>,
    pub time_to_jamaat_minutes: Option<f64>,
    pub is_next_day_fajr: bool,
    pub is_jamaat_countdown_active: bool,
    pub jamaat_countdown_seconds: Option<f64>,
    pub is_post_jamaat_countdown_active: bool,
    pub post_jamaat_countdown_seconds: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrayerPeriod {
    pub name: Option<String>,
    pub start: Option<String>,
    pub end: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FastingTimes {
    pub sahr: Option<String>,
    pub iftar: Option<String>,
}

/// Fast-refresh payload from `/api/live_data`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LiveTick {
    pub current_time: Option<String>,
    pub current_day: Option<String>,
    pub next_prayer: NextPrayer,
    pub current_namaz_period: PrayerPeriod,
    pub fasting_times: FastingTimes,
}

/// Body of `/api/geocode`, which carries either a location or an error.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub(crate) struct GeocodeBody {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub city_name: Option<String>,
    pub country: Option<String>,
    pub error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_decodes_server_shape() {
        let body = r#"{
            "isUserAuthenticated": false,
            "currentLocationName": "Mumbai, IN",
            "prayerTimes": {
                "fajr": {"azan": "05:10", "jamaat": "05:30"},
                "jummah": {"azan": "13:00", "jamaat": "13:30", "khutbah": "13:15"}
            },
            "apiTimesForDisplay": {"Sunrise": "06:20", "CurrentTemperature": 29.4},
            "tomorrowFajrDisplay": {"azan": "05:11", "jamaat": "05:30"},
            "dateInfo": {"gregorian": "16-10-2026, Friday", "hijri": "4 Jumada"},
            "userPreferences": {"homeLatitude": 19.2, "homeLongitude": 72.8,
                                "calculationMethod": "Karachi", "timeFormat": "24h"},
            "announcements": []
        }"#;
        let snapshot: Snapshot = serde_json::from_str(body).unwrap();
        assert_eq!(snapshot.prayer("fajr").unwrap().jamaat.as_deref(), Some("05:30"));
        assert_eq!(snapshot.khutbah(), Some("13:15"));
        assert_eq!(snapshot.api_times_for_display.temperature, Some(29.4));
        assert_eq!(snapshot.user_preferences.time_format.as_deref(), Some("24h"));
    }

    #[test]
    fn sparse_payloads_still_decode() {
        let snapshot: Snapshot = serde_json::from_str("{}").unwrap();
        assert!(snapshot.prayer_times.is_empty());
        assert_eq!(snapshot.khutbah(), None);

        let tick: LiveTick =
            serde_json::from_str(r#"{"currentTime": "10:00:01", "nextPrayer": {}}"#).unwrap();
        assert_eq!(tick.current_time.as_deref(), Some("10:00:01"));
        assert!(!tick.next_prayer.is_jamaat_countdown_active);
    }

    #[test]
    fn khutbah_sentinel_counts_as_missing() {
        let mut snapshot = Snapshot::default();
        snapshot.prayer_times.insert(
            "jummah".into(),
            PrayerSlot {
                khutbah: Some("N/A".into()),
                ..PrayerSlot::default()
            },
        );
        assert_eq!(snapshot.khutbah(), None);
    }
}
