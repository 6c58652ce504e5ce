//! Loose date/time normalization.
//!
//! Turns human-entered text such as `"2018-1-1"`, `"12:00:00"` or
//! `"2018-1-1 12:30:05"` into a fully specified [`NaiveDateTime`].
//!
//! Omitted components are filled in two independent groups:
//!
//! - **Date** (year, month, day): each missing member is taken from today's
//!   local date. Members that were supplied are kept as given.
//! - **Time** (hour, minute, second): each missing member is zero.
//!
//! # Example
//!
//! ```
//! use chrono::NaiveDate;
//! use mailsift::date::{FixedClock, normalize_date_with};
//!
//! let clock = FixedClock::new(NaiveDate::from_ymd_opt(2024, 6, 15).unwrap());
//!
//! let noon = normalize_date_with("12:00:00", &clock).unwrap();
//! assert_eq!(noon.to_string(), "2024-06-15 12:00:00");
//!
//! let day = normalize_date_with("2018-1-1", &clock).unwrap();
//! assert_eq!(day.to_string(), "2018-01-01 00:00:00");
//! ```

use chrono::{Datelike, Local, NaiveDate, NaiveDateTime};

use crate::error::{Error, Result};

/// Source of "today" for filling in missing date components.
///
/// In production, use [`SystemClock`]. In tests, use [`FixedClock`] so the
/// borrowed components are deterministic.
pub trait Clock: Send + Sync {
    /// Returns the current local calendar date.
    fn today(&self) -> NaiveDate;
}

/// Clock backed by the system's local time.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

/// Clock pinned to a single date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedClock {
    today: NaiveDate,
}

impl FixedClock {
    /// Creates a clock that always reports `today`.
    #[must_use]
    pub const fn new(today: NaiveDate) -> Self {
        Self { today }
    }
}

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.today
    }
}

/// A date bound as supplied by a caller: either loose text or a timestamp
/// that is already fully specified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawDate {
    /// Text in the form `[year]-[month]-[day] [hour]:[minute]:[second]`.
    Text(String),
    /// An already normalized timestamp.
    Timestamp(NaiveDateTime),
}

impl From<&str> for RawDate {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<String> for RawDate {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<NaiveDateTime> for RawDate {
    fn from(timestamp: NaiveDateTime) -> Self {
        Self::Timestamp(timestamp)
    }
}

impl TryFrom<&serde_json::Value> for RawDate {
    type Error = Error;

    /// Accepts JSON strings only; any other JSON type is rejected.
    fn try_from(value: &serde_json::Value) -> Result<Self> {
        match value {
            serde_json::Value::String(text) => Ok(Self::Text(text.clone())),
            other => Err(Error::InvalidArguments(format!(
                "expected a date string, got {}",
                json_type_name(other)
            ))),
        }
    }
}

const fn json_type_name(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

/// Normalizes `raw` using the system clock for missing date components.
///
/// # Errors
///
/// Returns [`Error::InvalidFormat`] if the text does not match the pattern or
/// the resolved components are not a valid calendar date/time.
pub fn normalize_date(raw: impl Into<RawDate>) -> Result<NaiveDateTime> {
    normalize_date_with(raw, &SystemClock)
}

/// Normalizes `raw`, borrowing missing date components from `clock`.
///
/// # Errors
///
/// Returns [`Error::InvalidFormat`] if the text does not match the pattern or
/// the resolved components are not a valid calendar date/time.
pub fn normalize_date_with(raw: impl Into<RawDate>, clock: &impl Clock) -> Result<NaiveDateTime> {
    let text = match raw.into() {
        RawDate::Timestamp(timestamp) => return Ok(timestamp),
        RawDate::Text(text) => text,
    };

    let parts = DateParts::scan(&text)?;

    let (year, month, day) = match (parts.year, parts.month, parts.day) {
        (Some(year), Some(month), Some(day)) => (year, month, day),
        (year, month, day) => {
            let today = clock.today();
            (
                year.unwrap_or_else(|| today.year()),
                month.unwrap_or_else(|| today.month()),
                day.unwrap_or_else(|| today.day()),
            )
        }
    };
    let hour = parts.hour.unwrap_or(0);
    let minute = parts.minute.unwrap_or(0);
    let second = parts.second.unwrap_or(0);

    NaiveDate::from_ymd_opt(year, month, day)
        .and_then(|date| date.and_hms_opt(hour, minute, second))
        .ok_or_else(|| {
            Error::InvalidFormat(format!(
                "{text} ({year}-{month}-{day} {hour}:{minute}:{second} is not a valid date/time)"
            ))
        })
}

/// The six optional components scanned from date text.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct DateParts {
    year: Option<i32>,
    month: Option<u32>,
    day: Option<u32>,
    hour: Option<u32>,
    minute: Option<u32>,
    second: Option<u32>,
}

impl DateParts {
    /// Scans `text` into its components.
    ///
    /// Inner whitespace separates the date part from the time part. Without
    /// it, text containing `:` is a time and anything else is a date.
    fn scan(text: &str) -> Result<Self> {
        let invalid = || Error::InvalidFormat(text.to_string());

        let trimmed = text.trim();
        let (date_part, time_part) = match trimmed.split_once(char::is_whitespace) {
            Some((date, time)) => (date, time.trim_start()),
            None if trimmed.contains(':') => ("", trimmed),
            None => (trimmed, ""),
        };
        if time_part.contains(char::is_whitespace) {
            return Err(invalid());
        }

        // Year is unbounded in width; everything else is one or two digits.
        let [year, month, day] = split_fields(date_part, '-', [usize::MAX, 2, 2]).ok_or_else(invalid)?;
        let [hour, minute, second] = split_fields(time_part, ':', [2, 2, 2]).ok_or_else(invalid)?;

        let year = year
            .map(|digits| digits.parse::<i32>())
            .transpose()
            .map_err(|_| invalid())?;
        let small = |field: Option<&str>| {
            field
                .map(|digits| digits.parse::<u32>())
                .transpose()
                .map_err(|_| invalid())
        };

        Ok(Self {
            year,
            month: small(month)?,
            day: small(day)?,
            hour: small(hour)?,
            minute: small(minute)?,
            second: small(second)?,
        })
    }
}

/// Splits `part` on `sep` into at most three digit fields.
///
/// Empty fields (and fields past the end of `part`) are `None`. Returns
/// `None` if there are more than three fields or a field is not made of
/// ASCII digits within its width.
fn split_fields(part: &str, sep: char, widths: [usize; 3]) -> Option<[Option<&str>; 3]> {
    let mut fields = [None; 3];
    if part.is_empty() {
        return Some(fields);
    }

    for (index, field) in part.split(sep).enumerate() {
        let width = *widths.get(index)?;
        if field.is_empty() {
            continue;
        }
        if field.len() > width || !field.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        fields[index] = Some(field);
    }

    Some(fields)
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::redundant_clone,
    clippy::manual_string_new,
    clippy::needless_collect,
    clippy::unreadable_literal,
    clippy::used_underscore_items,
    clippy::similar_names
)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn clock() -> FixedClock {
        FixedClock::new(NaiveDate::from_ymd_opt(2024, 6, 15).unwrap())
    }

    fn at(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, mo, d)
            .unwrap()
            .and_hms_opt(h, mi, s)
            .unwrap()
    }

    #[test]
    fn test_timestamp_passes_through() {
        let timestamp = at(2001, 2, 3, 4, 5, 6);
        assert_eq!(normalize_date_with(timestamp, &clock()).unwrap(), timestamp);
        assert_eq!(normalize_date(timestamp).unwrap(), timestamp);
    }

    #[test]
    fn test_full_date_is_midnight() {
        let parsed = normalize_date_with("2018-1-1", &clock()).unwrap();
        assert_eq!(parsed, at(2018, 1, 1, 0, 0, 0));
    }

    #[test]
    fn test_full_date_and_time() {
        let parsed = normalize_date_with("2018-1-1 12:30:05", &clock()).unwrap();
        assert_eq!(parsed, at(2018, 1, 1, 12, 30, 5));
    }

    #[test]
    fn test_time_only_uses_today() {
        let parsed = normalize_date_with("12:00:00", &clock()).unwrap();
        assert_eq!(parsed, at(2024, 6, 15, 12, 0, 0));
    }

    #[test]
    fn test_year_only_borrows_month_and_day() {
        let parsed = normalize_date_with("2018", &clock()).unwrap();
        assert_eq!(parsed, at(2018, 6, 15, 0, 0, 0));
    }

    #[test]
    fn test_partial_date_keeps_supplied_members() {
        assert_eq!(
            normalize_date_with("2019-3", &clock()).unwrap(),
            at(2019, 3, 15, 0, 0, 0)
        );
        assert_eq!(
            normalize_date_with("-2-", &clock()).unwrap(),
            at(2024, 2, 15, 0, 0, 0)
        );
        assert_eq!(
            normalize_date_with("--9", &clock()).unwrap(),
            at(2024, 6, 9, 0, 0, 0)
        );
    }

    #[test]
    fn test_partial_time_zero_fills() {
        assert_eq!(
            normalize_date_with("2020-5-6 7", &clock()).unwrap(),
            at(2020, 5, 6, 7, 0, 0)
        );
        assert_eq!(
            normalize_date_with("2020-5-6 7:08", &clock()).unwrap(),
            at(2020, 5, 6, 7, 8, 0)
        );
        assert_eq!(
            normalize_date_with("::30", &clock()).unwrap(),
            at(2024, 6, 15, 0, 0, 30)
        );
    }

    #[test]
    fn test_empty_text_is_today_midnight() {
        assert_eq!(
            normalize_date_with("", &clock()).unwrap(),
            at(2024, 6, 15, 0, 0, 0)
        );
        assert_eq!(
            normalize_date_with("   ", &clock()).unwrap(),
            at(2024, 6, 15, 0, 0, 0)
        );
    }

    #[test]
    fn test_surrounding_whitespace_ignored() {
        assert_eq!(
            normalize_date_with("  2018-1-1   12:30  ", &clock()).unwrap(),
            at(2018, 1, 1, 12, 30, 0)
        );
    }

    #[test]
    fn test_rejects_garbage() {
        for text in [
            "not-a-date",
            "2018/1/1",
            "2018-1-1-1",
            "2018-1-1 12:00:00:00",
            "2018-1-1 12:00 extra",
            "2018-123-1",
            "12:345",
            "2018-1-1T12:00",
            "+2018",
        ] {
            let err = normalize_date_with(text, &clock()).unwrap_err();
            assert!(matches!(err, Error::InvalidFormat(_)), "{text}: {err}");
        }
    }

    #[test]
    fn test_rejects_impossible_calendar_values() {
        for text in ["2018-2-31", "2018-13-1", "2018-0-1", "2018-1-1 24:00:00", "60:00"] {
            let err = normalize_date_with(text, &clock()).unwrap_err();
            assert!(matches!(err, Error::InvalidFormat(_)), "{text}: {err}");
        }
    }

    #[test]
    fn test_rejects_overflowing_year() {
        let err = normalize_date_with("99999999999-1-1", &clock()).unwrap_err();
        assert!(matches!(err, Error::InvalidFormat(_)));
    }

    #[test]
    fn test_system_clock_matches_local_date() {
        let before = Local::now().date_naive();
        let parsed = normalize_date("12:00:00").unwrap();
        let after = Local::now().date_naive();
        assert!(parsed.date() == before || parsed.date() == after);
    }

    #[test]
    fn test_raw_date_from_json() {
        let text = serde_json::json!("2018-1-1");
        assert_eq!(
            RawDate::try_from(&text).unwrap(),
            RawDate::Text("2018-1-1".to_string())
        );

        for value in [
            serde_json::json!(20180101),
            serde_json::json!(true),
            serde_json::json!(null),
            serde_json::json!(["2018"]),
        ] {
            let err = RawDate::try_from(&value).unwrap_err();
            assert!(matches!(err, Error::InvalidArguments(_)));
        }
    }

    proptest! {
        #[test]
        fn prop_full_text_round_trips_components(
            y in 1i32..9999,
            mo in 1u32..=12,
            d in 1u32..=28,
            h in 0u32..24,
            mi in 0u32..60,
            s in 0u32..60,
        ) {
            let text = format!("{y}-{mo}-{d} {h}:{mi}:{s}");
            prop_assert_eq!(normalize_date_with(text, &clock()).unwrap(), at(y, mo, d, h, mi, s));
        }

        #[test]
        fn prop_time_only_keeps_todays_date(h in 0u32..24, mi in 0u32..60, s in 0u32..60) {
            let parsed = normalize_date_with(format!("{h}:{mi}:{s}"), &clock()).unwrap();
            prop_assert_eq!(parsed.date(), clock().today());
        }
    }
}
