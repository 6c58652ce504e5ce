//! Header-based message filtering.
//!
//! A [`FilterCriteria`] holds up to four independent constraints. Each one
//! that is present must hold for a message to match:
//!
//! - `subject`: substring of the `Subject` header (case-sensitive)
//! - `sender`: substring of the `From` header (case-sensitive)
//! - `start_time`: the `Date` header is at or after this bound
//! - `end_time`: the `Date` header is at or before this bound
//!
//! Header lookup itself is case-insensitive.

use std::path::Path;

use chrono::NaiveDateTime;
use serde::Deserialize;
use tracing::debug;

use crate::date::{Clock, RawDate, SystemClock, normalize_date_with};
use crate::error::Result;
use crate::header::HeaderMap;
use crate::util::{OneOrMany, as_sequence, resolve_path};

/// Criteria a message's headers must satisfy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterCriteria {
    /// Text the subject must contain.
    pub subject: Option<String>,
    /// Earliest accepted message date (inclusive).
    pub start_time: Option<RawDate>,
    /// Latest accepted message date (inclusive).
    pub end_time: Option<RawDate>,
    /// Text the sender must contain.
    pub sender: Option<String>,
}

/// A filter file: criteria plus the messages to check.
///
/// The JSON object has the optional keys `subject`, `sender`, `start_time`,
/// `end_time` and `messages` (one path or a list of paths).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterFile {
    /// Criteria read from the file.
    pub criteria: FilterCriteria,
    /// Message paths listed in the file.
    pub messages: Vec<String>,
}

/// Filter file layout before time bounds are validated.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawFilterFile {
    subject: Option<String>,
    start_time: Option<serde_json::Value>,
    end_time: Option<serde_json::Value>,
    sender: Option<String>,
    messages: Option<OneOrMany<String>>,
}

impl FilterFile {
    /// Parses a filter file from JSON.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Json`](crate::Error::Json) for malformed JSON or
    /// unknown keys, and [`Error::InvalidArguments`](crate::Error::InvalidArguments)
    /// if a time bound is not a string.
    pub fn from_json(json: &str) -> Result<Self> {
        let raw: RawFilterFile = serde_json::from_str(json)?;
        let criteria = FilterCriteria {
            subject: raw.subject,
            start_time: raw.start_time.as_ref().map(RawDate::try_from).transpose()?,
            end_time: raw.end_time.as_ref().map(RawDate::try_from).transpose()?,
            sender: raw.sender,
        };
        let messages = raw.messages.map(as_sequence).unwrap_or_default();
        Ok(Self { criteria, messages })
    }

    /// Loads a filter file, resolving `path` first.
    ///
    /// # Errors
    ///
    /// Returns [`Error::FileNotFound`](crate::Error::FileNotFound) if the file
    /// cannot be resolved, plus any error of [`FilterFile::from_json`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = resolve_path(path)?;
        let json = std::fs::read_to_string(&path)?;
        debug!("Loaded filter from {}", path.display());
        Self::from_json(&json)
    }
}

impl FilterCriteria {
    /// Creates criteria that match every message.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Requires the subject to contain `subject`.
    #[must_use]
    pub fn subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    /// Requires the sender to contain `sender`.
    #[must_use]
    pub fn sender(mut self, sender: impl Into<String>) -> Self {
        self.sender = Some(sender.into());
        self
    }

    /// Requires the message to be dated at or after `start`.
    #[must_use]
    pub fn start_time(mut self, start: impl Into<RawDate>) -> Self {
        self.start_time = Some(start.into());
        self
    }

    /// Requires the message to be dated at or before `end`.
    #[must_use]
    pub fn end_time(mut self, end: impl Into<RawDate>) -> Self {
        self.end_time = Some(end.into());
        self
    }

    /// Returns true if no constraint is set.
    #[must_use]
    pub const fn is_unconstrained(&self) -> bool {
        self.subject.is_none()
            && self.sender.is_none()
            && self.start_time.is_none()
            && self.end_time.is_none()
    }

    /// Checks `headers` against these criteria.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidFormat`](crate::Error::InvalidFormat) if a time
    /// bound is text that cannot be normalized.
    pub fn matches(&self, headers: &HeaderMap) -> Result<bool> {
        self.matches_with(headers, &SystemClock)
    }

    /// Like [`FilterCriteria::matches`], resolving partial time bounds
    /// against `clock`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidFormat`](crate::Error::InvalidFormat) if a time
    /// bound is text that cannot be normalized.
    pub fn matches_with(&self, headers: &HeaderMap, clock: &impl Clock) -> Result<bool> {
        if let Some(subject) = &self.subject
            && !contains(headers.get_text("subject"), subject)
        {
            debug!("Subject does not contain {subject:?}");
            return Ok(false);
        }

        if let Some(sender) = &self.sender
            && !contains(headers.get_text("from"), sender)
        {
            debug!("Sender does not contain {sender:?}");
            return Ok(false);
        }

        let date = headers.get_date("date");

        if let Some(start) = &self.start_time {
            let start = resolve_bound(start, clock)?;
            if date.is_none_or(|date| start > date) {
                debug!("Message date {date:?} is before {start}");
                return Ok(false);
            }
        }

        if let Some(end) = &self.end_time {
            let end = resolve_bound(end, clock)?;
            if date.is_none_or(|date| end < date) {
                debug!("Message date {date:?} is after {end}");
                return Ok(false);
            }
        }

        Ok(true)
    }
}

/// Checks `headers` against `criteria` using the system clock.
///
/// # Errors
///
/// Returns [`Error::InvalidFormat`](crate::Error::InvalidFormat) if a time
/// bound is text that cannot be normalized.
pub fn match_conditions(headers: &HeaderMap, criteria: &FilterCriteria) -> Result<bool> {
    criteria.matches(headers)
}

fn contains(haystack: Option<&str>, needle: &str) -> bool {
    haystack.is_some_and(|haystack| haystack.contains(needle))
}

fn resolve_bound(bound: &RawDate, clock: &impl Clock) -> Result<NaiveDateTime> {
    normalize_date_with(bound.clone(), clock)
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
    use crate::date::FixedClock;
    use crate::error::Error;
    use chrono::{Duration, NaiveDate};

    fn sent() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2018, 1, 1)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    fn headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert("Subject", "Hi there");
        headers.insert("From", "Alice <alice@example.com>");
        headers.insert("Date", sent());
        headers
    }

    fn clock() -> FixedClock {
        FixedClock::new(NaiveDate::from_ymd_opt(2018, 1, 1).unwrap())
    }

    #[test]
    fn test_unconstrained_matches_anything() {
        let criteria = FilterCriteria::new();
        assert!(criteria.is_unconstrained());
        assert!(criteria.matches(&headers()).unwrap());
        assert!(criteria.matches(&HeaderMap::new()).unwrap());
    }

    #[test]
    fn test_subject_substring() {
        assert!(FilterCriteria::new().subject("Hi").matches(&headers()).unwrap());
        assert!(!FilterCriteria::new().subject("Bye").matches(&headers()).unwrap());
    }

    #[test]
    fn test_subject_is_case_sensitive() {
        assert!(!FilterCriteria::new().subject("hi").matches(&headers()).unwrap());
    }

    #[test]
    fn test_subject_missing_header() {
        let criteria = FilterCriteria::new().subject("Hi");
        assert!(!criteria.matches(&HeaderMap::new()).unwrap());
    }

    #[test]
    fn test_sender_substring() {
        assert!(
            FilterCriteria::new()
                .sender("alice@example.com")
                .matches(&headers())
                .unwrap()
        );
        assert!(!FilterCriteria::new().sender("bob").matches(&headers()).unwrap());
        assert!(!FilterCriteria::new().sender("a").matches(&HeaderMap::new()).unwrap());
    }

    #[test]
    fn test_start_bound_is_inclusive() {
        let at = FilterCriteria::new().start_time(sent());
        assert!(at.matches(&headers()).unwrap());

        let after = FilterCriteria::new().start_time(sent() + Duration::seconds(1));
        assert!(!after.matches(&headers()).unwrap());
    }

    #[test]
    fn test_end_bound_is_inclusive() {
        let at = FilterCriteria::new().end_time(sent());
        assert!(at.matches(&headers()).unwrap());

        let before = FilterCriteria::new().end_time(sent() - Duration::seconds(1));
        assert!(!before.matches(&headers()).unwrap());
    }

    #[test]
    fn test_text_bounds_are_normalized() {
        let window = FilterCriteria::new()
            .start_time("2018-1-1")
            .end_time("2018-1-1 12:00:00");
        assert!(window.matches_with(&headers(), &clock()).unwrap());

        let later = FilterCriteria::new().start_time("12:00:01");
        assert!(!later.matches_with(&headers(), &clock()).unwrap());
    }

    #[test]
    fn test_time_bound_without_date_header() {
        let mut headers = headers();
        headers.remove("date");
        assert!(!FilterCriteria::new().start_time(sent()).matches(&headers).unwrap());
        assert!(!FilterCriteria::new().end_time(sent()).matches(&headers).unwrap());
        assert!(FilterCriteria::new().subject("Hi").matches(&headers).unwrap());
    }

    #[test]
    fn test_invalid_bound_text_is_error() {
        let err = FilterCriteria::new()
            .start_time("not-a-date")
            .matches(&headers())
            .unwrap_err();
        assert!(matches!(err, Error::InvalidFormat(_)));
    }

    #[test]
    fn test_short_circuits_before_bad_bound() {
        let criteria = FilterCriteria::new().subject("Bye").start_time("not-a-date");
        assert!(!criteria.matches(&headers()).unwrap());
    }

    #[test]
    fn test_match_conditions_function() {
        let criteria = FilterCriteria::new().subject("Hi").sender("alice");
        assert!(match_conditions(&headers(), &criteria).unwrap());
    }

    #[test]
    fn test_filter_file_from_json() {
        let file = FilterFile::from_json(
            r#"{"subject": "Hi", "start_time": "2018-1-1", "sender": "alice", "messages": "a.eml"}"#,
        )
        .unwrap();
        assert_eq!(
            file.criteria,
            FilterCriteria::new()
                .subject("Hi")
                .start_time("2018-1-1")
                .sender("alice")
        );
        assert_eq!(file.messages, vec!["a.eml".to_string()]);

        let empty = FilterFile::from_json("{}").unwrap();
        assert!(empty.criteria.is_unconstrained());
        assert!(empty.messages.is_empty());
    }

    #[test]
    fn test_filter_file_message_list() {
        let file = FilterFile::from_json(r#"{"messages": ["a.eml", "b.eml"]}"#).unwrap();
        assert_eq!(file.messages, vec!["a.eml".to_string(), "b.eml".to_string()]);
    }

    #[test]
    fn test_filter_file_rejects_non_string_bound() {
        let err = FilterFile::from_json(r#"{"end_time": 1514764800}"#).unwrap_err();
        assert!(matches!(err, Error::InvalidArguments(_)));
    }

    #[test]
    fn test_filter_file_rejects_unknown_keys() {
        let err = FilterFile::from_json(r#"{"subjcet": "typo"}"#).unwrap_err();
        assert!(matches!(err, Error::Json(_)));
    }
}
