//! End-to-end selection tests: raw header blocks in, match verdicts out.

#![allow(clippy::unwrap_used)]

use chrono::{Duration, NaiveDate, NaiveDateTime};

use mailsift::{
    Error, FilterCriteria, FilterFile, FixedClock, HeaderMap, OneOrMany, RawDate, as_sequence,
    match_conditions, normalize_date, normalize_date_with,
};

const NEWSLETTER: &str = concat!(
    "Return-Path: <news@example.org>\r\n",
    "From: Example News <news@example.org>\r\n",
    "To: reader@example.com\r\n",
    "Subject: Weekly digest:\r\n",
    "  issue 42\r\n",
    "Date: 2018-01-01T09:30:00Z\r\n",
    "\r\n",
    "Hello!\r\n",
);

const UNDATED: &str = "FROM: bob@example.com\nSUBJECT: lunch?\n\nNoon?\n";

fn at(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, mo, d)
        .unwrap()
        .and_hms_opt(h, mi, s)
        .unwrap()
}

fn clock() -> FixedClock {
    FixedClock::new(NaiveDate::from_ymd_opt(2018, 1, 1).unwrap())
}

#[test]
fn selects_by_subject_and_sender() {
    let headers = HeaderMap::parse(NEWSLETTER);
    let criteria = FilterCriteria::new()
        .subject("issue 42")
        .sender("news@example.org");
    assert!(match_conditions(&headers, &criteria).unwrap());

    let wrong_sender = FilterCriteria::new().sender("bob");
    assert!(!match_conditions(&headers, &wrong_sender).unwrap());
}

#[test]
fn header_lookup_ignores_case() {
    let headers = HeaderMap::parse(UNDATED);
    assert_eq!(headers.get_text("from"), Some("bob@example.com"));
    assert!(
        FilterCriteria::new()
            .subject("lunch")
            .matches(&headers)
            .unwrap()
    );
}

#[test]
fn time_window_is_inclusive_at_both_ends() {
    let headers = HeaderMap::parse(NEWSLETTER);
    let sent = headers.get_date("date").unwrap();

    let exact = FilterCriteria::new().start_time(sent).end_time(sent);
    assert!(exact.matches(&headers).unwrap());

    let late_start = FilterCriteria::new().start_time(sent + Duration::seconds(1));
    assert!(!late_start.matches(&headers).unwrap());

    let early_end = FilterCriteria::new().end_time(sent - Duration::seconds(1));
    assert!(!early_end.matches(&headers).unwrap());
}

#[test]
fn undated_message_fails_time_bounds_only() {
    let headers = HeaderMap::parse(UNDATED);
    assert!(
        !FilterCriteria::new()
            .start_time("2000-1-1")
            .matches(&headers)
            .unwrap()
    );
    assert!(
        !FilterCriteria::new()
            .end_time("2100-1-1")
            .matches(&headers)
            .unwrap()
    );
    assert!(FilterCriteria::new().matches(&headers).unwrap());
}

#[test]
fn unconstrained_filter_matches_any_headers() {
    for raw in [NEWSLETTER, UNDATED, ""] {
        let headers = HeaderMap::parse(raw);
        assert!(FilterCriteria::new().matches(&headers).unwrap());
    }
}

#[test]
fn text_bounds_use_the_clock_for_missing_date_parts() {
    let mut headers = HeaderMap::new();
    headers.insert("Date", at(2018, 1, 1, 9, 30, 0));

    let morning = FilterCriteria::new().start_time("9:00").end_time("10:00");
    assert!(morning.matches_with(&headers, &clock()).unwrap());

    let afternoon = FilterCriteria::new().start_time("13:00");
    assert!(!afternoon.matches_with(&headers, &clock()).unwrap());
}

#[test]
fn documented_normalization_examples() {
    let timestamp = at(2018, 1, 1, 12, 30, 5);
    assert_eq!(normalize_date(RawDate::Timestamp(timestamp)).unwrap(), timestamp);
    assert_eq!(normalize_date("2018-1-1").unwrap(), at(2018, 1, 1, 0, 0, 0));
    assert_eq!(normalize_date("2018-1-1 12:30:05").unwrap(), timestamp);
    assert_eq!(
        normalize_date_with("12:00:00", &clock()).unwrap(),
        at(2018, 1, 1, 12, 0, 0)
    );
    assert!(matches!(
        normalize_date("not-a-date"),
        Err(Error::InvalidFormat(_))
    ));
}

#[test]
fn filter_file_drives_selection() {
    let file = FilterFile::from_json(
        r#"{"sender": "example.org", "end_time": "2018-1-1 23:59:59", "messages": "digest.eml"}"#,
    )
    .unwrap();
    assert_eq!(file.messages, as_sequence(OneOrMany::One("digest.eml".to_string())));

    let headers = HeaderMap::parse(NEWSLETTER);
    let sent = headers.get_date("date").unwrap();
    let expected = sent <= at(2018, 1, 1, 23, 59, 59);
    assert_eq!(file.criteria.matches(&headers).unwrap(), expected);
}

#[test]
fn filter_file_loads_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("filter.json");
    std::fs::write(&path, r#"{"subject": "lunch", "messages": ["a.eml", "b.eml"]}"#).unwrap();

    let file = FilterFile::load(&path).unwrap();
    assert_eq!(file.criteria, FilterCriteria::new().subject("lunch"));
    assert_eq!(file.messages.len(), 2);

    let err = FilterFile::load(dir.path().join("missing.json")).unwrap_err();
    assert!(matches!(err, Error::FileNotFound(_)));
}
