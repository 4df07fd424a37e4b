//! Text formatting shared by every view.

use chrono::{DateTime, NaiveDate, TimeZone, Utc};

/// Rounds to one decimal place.
pub fn round_tenths(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Formats an ounce amount with at most one decimal ("4", "4.5", "10.3").
///
/// Sums of halves can drift (0.1 + 0.2 style), so the value is rounded first.
pub fn format_ounces(value: f64) -> String {
    let rounded = round_tenths(value);
    if rounded.fract() == 0.0 {
        format!("{rounded:.0}")
    } else {
        format!("{rounded:.1}")
    }
}

/// Formats the time since `last` as "Xh Ym ago", or "Ym ago" below one hour.
/// An event in the future reads as "0m ago".
pub fn format_elapsed(last: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let total_minutes = (now - last).num_minutes().max(0);
    let hours = total_minutes / 60;
    let minutes = total_minutes % 60;

    if hours >= 1 {
        format!("{hours}h {minutes}m ago")
    } else {
        format!("{minutes}m ago")
    }
}

/// Formats a wall-clock time as "8:05 AM".
pub fn format_clock<Tz>(at: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    at.format("%-I:%M %p").to_string()
}

/// Day header for grouped lists: "Today", "Yesterday", or "Mon, Jan 27".
pub fn day_header(date: NaiveDate, today: NaiveDate) -> String {
    if date == today {
        "Today".to_string()
    } else if today.pred_opt() == Some(date) {
        "Yesterday".to_string()
    } else {
        date.format("%a, %b %-d").to_string()
    }
}

/// Generates a 10-character bar for `value` on a scale of `max`.
/// Non-zero values below 5% get a single block so they stay visible.
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
pub fn progress_bar(value: f64, max: f64) -> String {
    if max <= 0.0 {
        return "░░░░░░░░░░".to_string();
    }

    let ratio = value / max;
    let filled = if ratio < 0.05 && value > 0.0 {
        1
    } else {
        (ratio * 10.0).round().clamp(0.0, 10.0) as usize
    };

    let empty = 10 - filled;
    format!("{}{}", "█".repeat(filled), "░".repeat(empty))
}

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::{Duration, FixedOffset};

    #[test]
    fn format_ounces_trims_whole_numbers() {
        assert_eq!(format_ounces(4.0), "4");
        assert_eq!(format_ounces(4.5), "4.5");
        assert_eq!(format_ounces(0.0), "0");
    }

    #[test]
    fn format_ounces_hides_float_drift() {
        assert_eq!(format_ounces(0.1 + 0.2), "0.3");
        assert_eq!(format_ounces(10.299_999_999), "10.3");
    }

    #[test]
    fn format_elapsed_hours_and_minutes() {
        let now = Utc::now();
        assert_eq!(
            format_elapsed(now - Duration::minutes(135), now),
            "2h 15m ago"
        );
        assert_eq!(format_elapsed(now - Duration::hours(1), now), "1h 0m ago");
    }

    #[test]
    fn format_elapsed_minutes_only() {
        let now = Utc::now();
        assert_eq!(format_elapsed(now - Duration::minutes(45), now), "45m ago");
        assert_eq!(format_elapsed(now - Duration::seconds(59), now), "0m ago");
    }

    #[test]
    fn format_elapsed_future_is_zero() {
        let now = Utc::now();
        assert_eq!(format_elapsed(now + Duration::minutes(5), now), "0m ago");
    }

    #[test]
    fn format_clock_uses_twelve_hour_time() {
        let tz = FixedOffset::west_opt(8 * 3600).unwrap();
        let morning = tz.with_ymd_and_hms(2025, 1, 29, 8, 5, 0).unwrap();
        let evening = tz.with_ymd_and_hms(2025, 1, 29, 21, 30, 0).unwrap();
        assert_eq!(format_clock(&morning), "8:05 AM");
        assert_eq!(format_clock(&evening), "9:30 PM");
    }

    #[test]
    fn day_header_names_recent_days() {
        let today = NaiveDate::from_ymd_opt(2025, 1, 29).unwrap();
        assert_eq!(day_header(today, today), "Today");
        assert_eq!(
            day_header(NaiveDate::from_ymd_opt(2025, 1, 28).unwrap(), today),
            "Yesterday"
        );
        assert_eq!(
            day_header(NaiveDate::from_ymd_opt(2025, 1, 27).unwrap(), today),
            "Mon, Jan 27"
        );
    }

    #[test]
    fn progress_bar_scales() {
        assert_eq!(progress_bar(20.0, 20.0), "██████████");
        assert_eq!(progress_bar(10.0, 20.0), "█████░░░░░");
        assert_eq!(progress_bar(0.0, 20.0), "░░░░░░░░░░");
    }

    #[test]
    fn progress_bar_minimum_block() {
        assert_eq!(progress_bar(0.5, 20.0), "█░░░░░░░░░");
    }

    #[test]
    fn progress_bar_zero_max() {
        assert_eq!(progress_bar(3.0, 0.0), "░░░░░░░░░░");
    }
}
