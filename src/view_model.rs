//! Derived display strings for one render pass.

use crate::config::{
    CLOCK_ERROR_SENTINEL, DEFAULT_LOCATION_LABEL, NOT_AVAILABLE, PAGE_TITLE_SUFFIX,
    SNAPSHOT_ERROR_LABEL,
};
use crate::format::{
    format_clock_time, format_countdown, format_next_prayer_summary, format_temperature,
    TimeFormat,
};
use crate::payload::{LiveTick, Snapshot, PRAYER_KEYS};
use crate::preferences::Identity;

/// A tick together with the minutes-to-jamaat the engine settled on.
#[derive(Debug, Clone, PartialEq)]
pub struct ReconciledTick {
    pub tick: LiveTick,
    pub minutes_to_jamaat: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrayerRow {
    pub key: &'static str,
    pub label: String,
    pub azan: String,
    pub jamaat: String,
}

/// Everything the page shows. Each field already carries its fallback.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RenderViewModel {
    pub page_title: Option<String>,
    pub location_label: String,
    pub home_location_label: String,
    pub temperature: Option<String>,
    pub snapshot_error: bool,

    pub prayer_rows: Vec<PrayerRow>,
    /// `None` hides the khutbah row.
    pub khutbah: Option<String>,
    pub sunrise: String,
    pub sunset: String,
    pub zawal_start: String,
    pub zawal_end: String,
    pub tomorrow_fajr: String,
    pub gregorian_date: String,
    pub hijri_date: String,

    pub current_time: String,
    pub current_day: String,
    pub next_prayer_summary: String,
    pub next_prayer_name: String,
    pub next_jamaat: String,
    pub next_azan: String,
    /// `None` hides the pre-jamaat countdown.
    pub jamaat_countdown: Option<String>,
    /// `None` hides the post-jamaat countdown.
    pub post_jamaat_countdown: Option<String>,
    pub current_period_name: String,
    pub current_period_start: String,
    pub current_period_end: String,
    pub sahr: String,
    pub iftar: String,
}

/// Engine state the view depends on besides the two payloads.
#[derive(Debug, Clone, Copy, Default)]
pub struct ViewStatus {
    pub identity: Identity,
    pub snapshot_error: bool,
    pub clock_error: bool,
}

fn text_or_na(value: Option<&str>) -> String {
    match value {
        Some(v) if !v.trim().is_empty() => v.to_string(),
        _ => NOT_AVAILABLE.to_string(),
    }
}

fn capitalize(key: &str) -> String {
    let mut chars = key.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

impl RenderViewModel {
    pub fn build(
        snapshot: Option<&Snapshot>,
        live: Option<&ReconciledTick>,
        format: TimeFormat,
        status: ViewStatus,
    ) -> Self {
        let mut vm = RenderViewModel {
            snapshot_error: status.snapshot_error,
            ..Self::default()
        };
        vm.fill_snapshot(snapshot, format, status);
        vm.fill_live(live, format, status);
        vm
    }

    fn fill_snapshot(&mut self, snapshot: Option<&Snapshot>, format: TimeFormat, status: ViewStatus) {
        let empty = Snapshot::default();
        let snap = snapshot.unwrap_or(&empty);
        let aux = &snap.api_times_for_display;
        let location = snap
            .current_location_name
            .as_deref()
            .filter(|l| !l.trim().is_empty());

        self.location_label = if status.snapshot_error {
            SNAPSHOT_ERROR_LABEL.to_string()
        } else {
            location.unwrap_or(DEFAULT_LOCATION_LABEL).to_string()
        };
        self.page_title = location.map(|l| format!("{} - {}", l, PAGE_TITLE_SUFFIX));
        self.home_location_label = match status.identity {
            Identity::Authenticated if snap.user_preferences.home_latitude.is_some() => {
                location.unwrap_or("(Home Location)").to_string()
            }
            Identity::Authenticated => "(Set Home Location in Settings)".to_string(),
            Identity::Guest => "Guest Mode (Set Home in Settings by Logging In)".to_string(),
        };
        self.temperature = format_temperature(aux.temperature);

        self.prayer_rows = PRAYER_KEYS
            .iter()
            .map(|&key| {
                let slot = snap.prayer(key);
                PrayerRow {
                    key,
                    label: capitalize(key),
                    azan: format_clock_time(slot.and_then(|s| s.azan.as_deref()), format),
                    jamaat: format_clock_time(slot.and_then(|s| s.jamaat.as_deref()), format),
                }
            })
            .collect();
        self.khutbah = snap.khutbah().map(|k| format_clock_time(Some(k), format));

        self.sunrise = format_clock_time(aux.sunrise.as_deref(), format);
        self.sunset = format_clock_time(aux.sunset.as_deref(), format);
        self.zawal_start = format_clock_time(aux.zawal_start.as_deref(), format);
        self.zawal_end = format_clock_time(aux.zawal_end.as_deref(), format);
        self.tomorrow_fajr = format_clock_time(
            snap.tomorrow_fajr_display
                .as_ref()
                .and_then(|s| s.azan.as_deref()),
            format,
        );
        self.gregorian_date = text_or_na(snap.date_info.gregorian.as_deref());
        self.hijri_date = text_or_na(snap.date_info.hijri.as_deref());
    }

    fn fill_live(&mut self, live: Option<&ReconciledTick>, format: TimeFormat, status: ViewStatus) {
        let empty = ReconciledTick {
            tick: LiveTick::default(),
            minutes_to_jamaat: 0,
        };
        let reconciled = live.unwrap_or(&empty);
        let tick = &reconciled.tick;
        let next = &tick.next_prayer;

        self.current_time = if status.clock_error {
            CLOCK_ERROR_SENTINEL.to_string()
        } else {
            text_or_na(tick.current_time.as_deref())
        };
        self.current_day = text_or_na(tick.current_day.as_deref());

        let name = text_or_na(next.name.as_deref());
        self.next_prayer_summary = format_next_prayer_summary(&name, reconciled.minutes_to_jamaat);
        self.next_prayer_name = name;
        self.next_jamaat = format_clock_time(next.jamaat_time.as_deref(), format);
        self.next_azan = format_clock_time(next.azan_time.as_deref(), format);

        self.jamaat_countdown = next
            .is_jamaat_countdown_active
            .then(|| format_countdown(next.jamaat_countdown_seconds.unwrap_or(0.0)));
        // The pre-jamaat countdown always wins over the post-jamaat one.
        self.post_jamaat_countdown = (next.is_post_jamaat_countdown_active
            && !next.is_jamaat_countdown_active)
            .then(|| format_countdown(next.post_jamaat_countdown_seconds.unwrap_or(0.0)));

        let period = &tick.current_namaz_period;
        self.current_period_name = text_or_na(period.name.as_deref());
        self.current_period_start = format_clock_time(period.start.as_deref(), format);
        self.current_period_end = format_clock_time(period.end.as_deref(), format);
        self.sahr = format_clock_time(tick.fasting_times.sahr.as_deref(), format);
        self.iftar = format_clock_time(tick.fasting_times.iftar.as_deref(), format);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payload::{NextPrayer, PrayerSlot};

    fn tick_with(next: NextPrayer) -> ReconciledTick {
        ReconciledTick {
            tick: LiveTick {
                current_time: Some("12:58:59".into()),
                next_prayer: next,
                ..LiveTick::default()
            },
            minutes_to_jamaat: 1,
        }
    }

    #[test]
    fn empty_inputs_fall_back_everywhere() {
        let vm = RenderViewModel::build(None, None, TimeFormat::TwelveHour, ViewStatus::default());
        assert_eq!(vm.prayer_rows.len(), 6);
        assert!(vm.prayer_rows.iter().all(|r| r.azan == "N/A" && r.jamaat == "N/A"));
        assert_eq!(vm.current_time, "N/A");
        assert_eq!(vm.location_label, "Current Location");
        assert_eq!(vm.khutbah, None);
        assert_eq!(vm.jamaat_countdown, None);
        assert_eq!(vm.page_title, None);
    }

    #[test]
    fn pre_jamaat_countdown_hides_post_jamaat() {
        let live = tick_with(NextPrayer {
            is_jamaat_countdown_active: true,
            jamaat_countdown_seconds: Some(61.0),
            is_post_jamaat_countdown_active: true,
            post_jamaat_countdown_seconds: Some(300.0),
            ..NextPrayer::default()
        });
        let vm = RenderViewModel::build(None, Some(&live), TimeFormat::TwelveHour, ViewStatus::default());
        assert_eq!(vm.jamaat_countdown.as_deref(), Some("01:01"));
        assert_eq!(vm.post_jamaat_countdown, None);

        let live = tick_with(NextPrayer {
            is_post_jamaat_countdown_active: true,
            post_jamaat_countdown_seconds: Some(300.0),
            ..NextPrayer::default()
        });
        let vm = RenderViewModel::build(None, Some(&live), TimeFormat::TwelveHour, ViewStatus::default());
        assert_eq!(vm.post_jamaat_countdown.as_deref(), Some("05:00"));
    }

    #[test]
    fn error_flags_replace_labels() {
        let mut snapshot = Snapshot::default();
        snapshot.current_location_name = Some("Pune, IN".into());
        let status = ViewStatus {
            snapshot_error: true,
            clock_error: true,
            ..ViewStatus::default()
        };
        let vm = RenderViewModel::build(Some(&snapshot), Some(&tick_with(NextPrayer::default())), TimeFormat::TwentyFourHour, status);
        assert_eq!(vm.location_label, "Error loading data");
        assert_eq!(vm.current_time, "--:--:-- ERR");
        assert_eq!(vm.page_title.as_deref(), Some("Pune, IN - Prayer Times"));
    }

    #[test]
    fn table_respects_format_and_khutbah() {
        let mut snapshot = Snapshot::default();
        snapshot.prayer_times.insert(
            "jummah".into(),
            PrayerSlot {
                azan: Some("13:00".into()),
                jamaat: Some("13:30".into()),
                khutbah: Some("13:15".into()),
            },
        );
        let vm = RenderViewModel::build(Some(&snapshot), None, TimeFormat::TwelveHour, ViewStatus::default());
        let jummah = vm.prayer_rows.iter().find(|r| r.key == "jummah").unwrap();
        assert_eq!(jummah.label, "Jummah");
        assert_eq!(jummah.jamaat, "01:30 PM");
        assert_eq!(vm.khutbah.as_deref(), Some("01:15 PM"));
    }
}
