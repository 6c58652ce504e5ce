//! Case-insensitive message header mapping.

use std::collections::HashMap;

use chrono::{DateTime, Local, NaiveDateTime};
use tracing::warn;

/// A single header value: free text, or a parsed timestamp for `Date`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeaderValue {
    /// Unstructured header text.
    Text(String),
    /// A timestamp in local time.
    Date(NaiveDateTime),
}

impl HeaderValue {
    /// Returns the text, if this is a text value.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text.as_str()),
            Self::Date(_) => None,
        }
    }

    /// Returns the timestamp, if this is a date value.
    #[must_use]
    pub const fn as_date(&self) -> Option<NaiveDateTime> {
        match self {
            Self::Date(date) => Some(*date),
            Self::Text(_) => None,
        }
    }
}

impl From<&str> for HeaderValue {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<String> for HeaderValue {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<NaiveDateTime> for HeaderValue {
    fn from(date: NaiveDateTime) -> Self {
        Self::Date(date)
    }
}

#[derive(Debug, Clone)]
struct Entry {
    /// Name as most recently inserted.
    name: String,
    value: HeaderValue,
}

/// Header mapping with case-insensitive lookup.
///
/// Entries are stored under a lowercased key while the original spelling is
/// kept for iteration. Iteration follows insertion order.
#[derive(Debug, Clone, Default)]
pub struct HeaderMap {
    entries: Vec<Entry>,
    index: HashMap<String, usize>,
}

impl HeaderMap {
    /// Creates an empty mapping.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a header, replacing any value stored under any casing of
    /// `name`. The new spelling of `name` replaces the old one.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<HeaderValue>) {
        let name = name.into();
        let value = value.into();
        let key = name.to_lowercase();

        if let Some(&position) = self.index.get(&key) {
            self.entries[position] = Entry { name, value };
        } else {
            self.index.insert(key, self.entries.len());
            self.entries.push(Entry { name, value });
        }
    }

    /// Gets the value stored under any casing of `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&HeaderValue> {
        self.index
            .get(&name.to_lowercase())
            .map(|&position| &self.entries[position].value)
    }

    /// Gets a text value. Returns `None` if absent or not text.
    #[must_use]
    pub fn get_text(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(HeaderValue::as_text)
    }

    /// Gets a timestamp value. Returns `None` if absent or not a date.
    #[must_use]
    pub fn get_date(&self, name: &str) -> Option<NaiveDateTime> {
        self.get(name).and_then(HeaderValue::as_date)
    }

    /// Returns true if a header exists under any casing of `name`.
    #[must_use]
    pub fn contains_key(&self, name: &str) -> bool {
        self.index.contains_key(&name.to_lowercase())
    }

    /// Removes and returns the value stored under any casing of `name`.
    pub fn remove(&mut self, name: &str) -> Option<HeaderValue> {
        let position = self.index.remove(&name.to_lowercase())?;
        let entry = self.entries.remove(position);
        for slot in self.index.values_mut() {
            if *slot > position {
                *slot -= 1;
            }
        }
        Some(entry.value)
    }

    /// Number of headers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if there are no headers.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over `(original name, value)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &HeaderValue)> {
        self.entries
            .iter()
            .map(|entry| (entry.name.as_str(), &entry.value))
    }

    /// Parses a raw header block.
    ///
    /// Continuation lines (starting with a space or tab) are unfolded and the
    /// block ends at the first empty line, so a whole message can be passed.
    /// Only the first occurrence of a repeated header is kept. A `Date`
    /// header is converted to local time; if it cannot be parsed it is left
    /// out, so time bounds never match the message.
    #[must_use]
    pub fn parse(text: &str) -> Self {
        let mut headers = Self::new();
        let mut current: Option<(String, String)> = None;

        for line in text.lines() {
            if line.is_empty() {
                break;
            }

            if line.starts_with(' ') || line.starts_with('\t') {
                if let Some((_, value)) = current.as_mut() {
                    value.push(' ');
                    value.push_str(line.trim());
                }
                continue;
            }

            if let Some((name, value)) = current.take() {
                headers.add_parsed(name, &value);
            }
            if let Some((name, value)) = line.split_once(':') {
                current = Some((name.trim().to_string(), value.trim().to_string()));
            }
        }

        if let Some((name, value)) = current {
            headers.add_parsed(name, &value);
        }

        headers
    }

    fn add_parsed(&mut self, name: String, value: &str) {
        if self.contains_key(&name) {
            return;
        }

        if name.eq_ignore_ascii_case("date") {
            match parse_message_date(value) {
                Some(date) => self.insert(name, date),
                None => warn!("Ignoring unparsable Date header: {value}"),
            }
        } else {
            self.insert(name, value.trim());
        }
    }
}

impl<K, V> FromIterator<(K, V)> for HeaderMap
where
    K: Into<String>,
    V: Into<HeaderValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut headers = Self::new();
        for (name, value) in iter {
            headers.insert(name, value);
        }
        headers
    }
}

/// Parses an RFC 2822 (or RFC 3339) date into local wall-clock time.
fn parse_message_date(value: &str) -> Option<NaiveDateTime> {
    DateTime::parse_from_rfc2822(value)
        .or_else(|_| DateTime::parse_from_rfc3339(value))
        .ok()
        .map(|date| date.with_timezone(&Local).naive_local())
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

    #[test]
    fn test_headers_new() {
        let headers = HeaderMap::new();
        assert!(headers.is_empty());
        assert_eq!(headers.len(), 0);
    }

    #[test]
    fn test_get_is_case_insensitive() {
        let mut headers = HeaderMap::new();
        headers.insert("Subject", "Quarterly report");
        assert_eq!(headers.get_text("subject"), Some("Quarterly report"));
        assert_eq!(headers.get_text("SUBJECT"), Some("Quarterly report"));
        assert!(headers.contains_key("sUbJeCt"));
    }

    #[test]
    fn test_insert_replaces_any_casing() {
        let mut headers = HeaderMap::new();
        headers.insert("From", "alice@example.com");
        headers.insert("FROM", "bob@example.com");
        assert_eq!(headers.len(), 1);
        assert_eq!(headers.get_text("from"), Some("bob@example.com"));

        let names: Vec<_> = headers.iter().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["FROM"]);
    }

    #[test]
    fn test_iter_keeps_original_spelling_and_order() {
        let headers: HeaderMap = [("X-Mailer", "mutt"), ("Subject", "hi"), ("from", "a@b.c")]
            .into_iter()
            .collect();
        let names: Vec<_> = headers.iter().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["X-Mailer", "Subject", "from"]);
    }

    #[test]
    fn test_remove_reindexes() {
        let mut headers: HeaderMap = [("A", "1"), ("B", "2"), ("C", "3")].into_iter().collect();
        assert_eq!(headers.remove("b"), Some(HeaderValue::from("2")));
        assert_eq!(headers.remove("b"), None);
        assert_eq!(headers.get_text("c"), Some("3"));
        assert_eq!(headers.get_text("a"), Some("1"));
        assert_eq!(headers.len(), 2);
    }

    #[test]
    fn test_typed_accessors() {
        let date = chrono::NaiveDate::from_ymd_opt(2020, 1, 2)
            .unwrap()
            .and_hms_opt(3, 4, 5)
            .unwrap();
        let mut headers = HeaderMap::new();
        headers.insert("Date", date);
        headers.insert("Subject", "text");

        assert_eq!(headers.get_date("date"), Some(date));
        assert_eq!(headers.get_text("date"), None);
        assert_eq!(headers.get_date("subject"), None);
    }

    #[test]
    fn test_parse_unfolds_and_stops_at_body() {
        let text = concat!(
            "From: sender@example.com\r\n",
            "To: recipient@example.com\r\n",
            "Subject: Test\r\n",
            "\tMessage\r\n",
            "\r\n",
            "Subject: not a header\r\n"
        );

        let headers = HeaderMap::parse(text);
        assert_eq!(headers.get_text("from"), Some("sender@example.com"));
        assert_eq!(headers.get_text("to"), Some("recipient@example.com"));
        assert_eq!(headers.get_text("subject"), Some("Test Message"));
        assert_eq!(headers.len(), 3);
    }

    #[test]
    fn test_parse_keeps_first_repeated_header() {
        let headers = HeaderMap::parse("Received: first\nReceived: second\n");
        assert_eq!(headers.get_text("received"), Some("first"));
    }

    #[test]
    fn test_parse_converts_date_to_local() {
        let headers = HeaderMap::parse("Date: Thu, 15 Jan 2026 19:31:43 +0000\n");
        let expected = DateTime::parse_from_rfc2822("Thu, 15 Jan 2026 19:31:43 +0000")
            .unwrap()
            .with_timezone(&Local)
            .naive_local();
        assert_eq!(headers.get_date("date"), Some(expected));
    }

    #[test]
    fn test_parse_accepts_rfc3339_date() {
        let headers = HeaderMap::parse("Date: 2026-01-15T19:31:43Z\n");
        assert!(headers.get_date("Date").is_some());
    }

    #[test]
    fn test_parse_drops_unparsable_date() {
        let headers = HeaderMap::parse("Date: sometime last week\nSubject: hi\n");
        assert!(!headers.contains_key("date"));
        assert_eq!(headers.get_text("subject"), Some("hi"));
    }
}
