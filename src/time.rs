//! Time-of-day parsing and travel-time arithmetic.

use chrono::{NaiveTime, TimeDelta};

use crate::error::TimeParseError;

const TWELVE_HOUR_FORMATS: [&str; 2] = ["%I:%M %p", "%I:%M:%S %p"];
const TWENTY_FOUR_HOUR_FORMATS: [&str; 2] = ["%H:%M", "%H:%M:%S"];

/// Parse a clock reading such as `10:30 AM`, `9:05am`, `13:00` or `13:00:30`.
pub fn parse_time_of_day(input: &str) -> Result<NaiveTime, TimeParseError> {
    let trimmed = input.trim().trim_matches('"').trim();
    let upper = trimmed.to_ascii_uppercase();

    if let Some(meridiem) = ["AM", "PM"].iter().find(|m| upper.ends_with(*m)) {
        let clock = upper[..upper.len() - meridiem.len()].trim_end();
        let normalised = format!("{clock} {meridiem}");
        for format in TWELVE_HOUR_FORMATS {
            if let Ok(time) = NaiveTime::parse_from_str(&normalised, format) {
                return Ok(time);
            }
        }
    } else {
        for format in TWENTY_FOUR_HOUR_FORMATS {
            if let Ok(time) = NaiveTime::parse_from_str(&upper, format) {
                return Ok(time);
            }
        }
    }

    Err(TimeParseError {
        input: input.to_string(),
    })
}

/// Parse a deadline, mapping `EOD` to the supplied end of day.
pub fn parse_deadline(input: &str, end_of_day: NaiveTime) -> Result<NaiveTime, TimeParseError> {
    if input.trim().eq_ignore_ascii_case("eod") {
        return Ok(end_of_day);
    }
    parse_time_of_day(input)
}

/// Time needed to cover `distance` at `speed` distance units per hour.
///
/// Rounded to the millisecond. `None` when the distance is negative or not
/// finite, or the duration does not fit in a [`TimeDelta`].
pub fn travel_time(distance: f64, speed: f64) -> Option<TimeDelta> {
    if !distance.is_finite() || distance < 0.0 {
        return None;
    }
    let millis = (distance / speed * 3_600_000.0).round();
    if !millis.is_finite() || millis >= i64::MAX as f64 {
        return None;
    }
    TimeDelta::try_milliseconds(millis as i64)
}
