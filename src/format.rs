//! Display formatting for clock times and countdowns.

use crate::config::NOT_AVAILABLE;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

// "HH:MM" with an optional ":SS" tail, which is ignored.
static CLOCK_TIME_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{1,2}):(\d{1,2})(?::\d{1,2})?$").unwrap());

/// 12-hour or 24-hour clock display.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimeFormat {
    #[default]
    #[serde(rename = "12h")]
    TwelveHour,
    #[serde(rename = "24h")]
    TwentyFourHour,
}

impl TimeFormat {
    /// Value sent in the `time_format` query parameter.
    pub fn as_query_value(self) -> &'static str {
        match self {
            TimeFormat::TwelveHour => "12h",
            TimeFormat::TwentyFourHour => "24h",
        }
    }

    /// Lenient parse: anything other than "24h" is the 12-hour default.
    pub fn parse_or_default(raw: &str) -> Self {
        match raw.trim() {
            "24h" => TimeFormat::TwentyFourHour,
            _ => TimeFormat::TwelveHour,
        }
    }
}

impl fmt::Display for TimeFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_query_value())
    }
}

/// Split a raw "HH:MM[:SS]" string into validated hour and minute.
pub fn parse_clock_time(raw: &str) -> Option<(u32, u32)> {
    let captures = CLOCK_TIME_REGEX.captures(raw.trim())?;
    let hours: u32 = captures[1].parse().ok()?;
    let minutes: u32 = captures[2].parse().ok()?;
    if hours > 23 || minutes > 59 {
        return None;
    }
    Some((hours, minutes))
}

/// Format a server clock time for display.
///
/// Absent or malformed input yields `N/A` in either mode. In 12-hour mode
/// both midnight and noon display as `12`.
///
/// # Examples
/// ```
/// use prayer_clock::format::{format_clock_time, TimeFormat};
/// assert_eq!(format_clock_time(Some("13:05"), TimeFormat::TwentyFourHour), "13:05");
/// assert_eq!(format_clock_time(Some("13:05"), TimeFormat::TwelveHour), "01:05 PM");
/// assert_eq!(format_clock_time(Some("00:30"), TimeFormat::TwelveHour), "12:30 AM");
/// assert_eq!(format_clock_time(None, TimeFormat::TwelveHour), "N/A");
/// ```
pub fn format_clock_time(raw: Option<&str>, format: TimeFormat) -> String {
    let Some((hours, minutes)) = raw.and_then(parse_clock_time) else {
        return NOT_AVAILABLE.to_string();
    };

    match format {
        TimeFormat::TwentyFourHour => format!("{:02}:{:02}", hours, minutes),
        TimeFormat::TwelveHour => {
            let suffix = if hours >= 12 { "PM" } else { "AM" };
            let display_hour = match hours % 12 {
                0 => 12,
                h => h,
            };
            format!("{:02}:{:02} {}", display_hour, minutes, suffix)
        }
    }
}

/// Format a countdown as zero-padded `MM:SS`. Negative and non-finite input
/// counts as zero.
pub fn format_countdown(total_seconds: f64) -> String {
    let clamped = if total_seconds.is_finite() && total_seconds > 0.0 {
        total_seconds.floor() as u64
    } else {
        0
    };
    format!("{:02}:{:02}", clamped / 60, clamped % 60)
}

/// Whole-degree Celsius temperature, or `None` to hide the element.
pub fn format_temperature(celsius: Option<f64>) -> Option<String> {
    celsius
        .filter(|t| t.is_finite())
        .map(|t| format!("{:.0}°C", t))
}

pub fn format_next_prayer_summary(name: &str, minutes: i64) -> String {
    format!("Next: {} in {} min", name, minutes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn formats_both_modes() {
        assert_eq!(format_clock_time(Some("13:05"), TimeFormat::TwentyFourHour), "13:05");
        assert_eq!(format_clock_time(Some("13:05"), TimeFormat::TwelveHour), "01:05 PM");
        assert_eq!(format_clock_time(Some("00:30"), TimeFormat::TwelveHour), "12:30 AM");
        assert_eq!(format_clock_time(Some("12:00"), TimeFormat::TwelveHour), "12:00 PM");
        assert_eq!(format_clock_time(Some("5:7"), TimeFormat::TwentyFourHour), "05:07");
    }

    #[test]
    fn seconds_tail_is_ignored() {
        assert_eq!(format_clock_time(Some("04:45:59"), TimeFormat::TwelveHour), "04:45 AM");
    }

    #[test]
    fn malformed_input_is_not_available() {
        for raw in ["", "N/A", "12", "ab:cd", "24:00", "10:60", "1:2:3:4", " : "] {
            assert_eq!(format_clock_time(Some(raw), TimeFormat::TwelveHour), "N/A", "{raw:?}");
            assert_eq!(format_clock_time(Some(raw), TimeFormat::TwentyFourHour), "N/A", "{raw:?}");
        }
        assert_eq!(format_clock_time(None, TimeFormat::TwentyFourHour), "N/A");
    }

    #[test]
    fn countdown_clamps_and_pads() {
        assert_eq!(format_countdown(-5.0), "00:00");
        assert_eq!(format_countdown(125.0), "02:05");
        assert_eq!(format_countdown(f64::NAN), "00:00");
        assert_eq!(format_countdown(f64::INFINITY), "00:00");
        assert_eq!(format_countdown(0.0), "00:00");
    }

    #[test]
    fn temperature_hides_missing_values() {
        assert_eq!(format_temperature(Some(31.6)).as_deref(), Some("32°C"));
        assert_eq!(format_temperature(Some(f64::NAN)), None);
        assert_eq!(format_temperature(None), None);
    }

    #[test]
    fn time_format_round_trips_through_serde() {
        let json = serde_json::to_string(&TimeFormat::TwentyFourHour).unwrap();
        assert_eq!(json, "\"24h\"");
        assert_eq!(TimeFormat::parse_or_default("bogus"), TimeFormat::TwelveHour);
    }

    proptest! {
        #[test]
        fn strings_without_colon_are_never_times(raw in "[^:]*") {
            prop_assert_eq!(format_clock_time(Some(&raw), TimeFormat::TwelveHour), "N/A");
            prop_assert_eq!(format_clock_time(Some(&raw), TimeFormat::TwentyFourHour), "N/A");
        }

        #[test]
        fn valid_times_keep_minutes(h in 0u32..24, m in 0u32..60) {
            let raw = format!("{:02}:{:02}", h, m);
            prop_assert_eq!(format_clock_time(Some(&raw), TimeFormat::TwentyFourHour), raw.clone());
            let twelve = format_clock_time(Some(&raw), TimeFormat::TwelveHour);
            let suffix = if h >= 12 { " PM" } else { " AM" };
            prop_assert!(twelve.ends_with(suffix));
            prop_assert_eq!(&twelve[3..5], &raw[3..5]);
        }

        #[test]
        fn countdown_is_idempotent_over_its_input(secs in -10_000i64..100_000) {
            let first = format_countdown(secs as f64);
            prop_assert_eq!(&first, &format_countdown(secs as f64));
            prop_assert_eq!(first.len() >= 5, true);
        }
    }
}
