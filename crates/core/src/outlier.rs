//! Data-quality predicates over single records.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

use crate::domain::MetadataRecord;
use crate::error::Result;

/// Default aspect ratio above which an image is reported as an outlier.
pub const WEIRD_ASPECT_RATIO: f64 = 2.0;

/// Literal the corpus uses for an unknown capture date.
pub const NULL_DATE: &str = "null";

/// Parse an ISO-8601 capture date into naive UTC.
///
/// Accepts `T` or a space between date and time, optional fractional seconds,
/// an optional UTC offset (normalised to UTC), or a bare date (midnight).
pub fn parse_date_taken(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.naive_utc());
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, format) {
            return Some(dt);
        }
    }
    for format in ["%Y-%m-%d %H:%M:%S%.f%:z", "%Y-%m-%dT%H:%M:%S%.f%z"] {
        if let Ok(dt) = DateTime::parse_from_str(value, format) {
            return Some(dt.naive_utc());
        }
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// Parse the epoch-seconds upload date as naive UTC.
pub fn parse_date_uploaded(value: &str) -> Option<NaiveDateTime> {
    let secs: i64 = value.trim().parse().ok()?;
    DateTime::<Utc>::from_timestamp(secs, 0).map(|dt| dt.naive_utc())
}

/// True if either date fails to parse, or the photo was taken at or after its upload instant.
pub fn is_invalid_date(record: &MetadataRecord) -> bool {
    match (
        parse_date_taken(&record.date_taken),
        parse_date_uploaded(&record.date_uploaded),
    ) {
        (Some(taken), Some(uploaded)) => taken >= uploaded,
        _ => true,
    }
}

pub fn has_null_date_taken(record: &MetadataRecord) -> bool {
    record.date_taken == NULL_DATE
}

/// Seconds from upload to capture (`taken - uploaded`); positive for invalid orderings.
pub fn taken_to_uploaded_gap(record: &MetadataRecord) -> Option<f64> {
    let taken = parse_date_taken(&record.date_taken)?;
    let uploaded = parse_date_uploaded(&record.date_uploaded)?;
    Some((taken - uploaded).num_milliseconds() as f64 / 1000.0)
}

/// Strict `aspect_ratio > limit`. Fails if the record has not been enriched yet.
pub fn is_weird_aspect_ratio(record: &MetadataRecord, limit: f64) -> Result<bool> {
    Ok(record.require_geometry()?.aspect_ratio() > limit)
}

pub fn count_invalid_dates<'a, I>(records: I) -> usize
where
    I: IntoIterator<Item = &'a MetadataRecord>,
{
    records.into_iter().filter(|r| is_invalid_date(r)).count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::fixtures::record;
    use crate::error::Error;

    // 2020-01-01T00:00:00Z
    const JAN_1_2020: &str = "1577836800";

    fn dated(taken: &str, uploaded: &str) -> MetadataRecord {
        let mut r = record("1");
        r.date_taken = taken.to_string();
        r.date_uploaded = uploaded.to_string();
        r
    }

    // ── is_invalid_date ─────────────────────────────────────────

    #[test]
    fn test_taken_after_uploaded_is_invalid() {
        assert!(is_invalid_date(&dated("2020-01-02T00:00:00", JAN_1_2020)));
    }

    #[test]
    fn test_taken_before_uploaded_is_valid() {
        assert!(!is_invalid_date(&dated("2019-12-31T23:59:59", JAN_1_2020)));
    }

    #[test]
    fn test_taken_equal_uploaded_is_invalid() {
        assert!(is_invalid_date(&dated("2020-01-01T00:00:00", JAN_1_2020)));
    }

    #[test]
    fn test_unparseable_dates_fail_closed() {
        assert!(is_invalid_date(&dated("not-a-date", JAN_1_2020)));
        assert!(is_invalid_date(&dated(NULL_DATE, JAN_1_2020)));
        assert!(is_invalid_date(&dated("2019-01-01", "yesterday")));
        assert!(is_invalid_date(&dated("2019-01-01", "")));
    }

    // ── parse_date_taken ────────────────────────────────────────

    #[test]
    fn test_parse_corpus_style_date() {
        let dt = parse_date_taken("2006-02-28 20:33:06.0").unwrap();
        assert_eq!(dt.to_string(), "2006-02-28 20:33:06");
    }

    #[test]
    fn test_parse_date_only_is_midnight() {
        let dt = parse_date_taken("2006-02-28").unwrap();
        assert_eq!(dt.to_string(), "2006-02-28 00:00:00");
    }

    #[test]
    fn test_parse_offset_normalised_to_utc() {
        let dt = parse_date_taken("2020-01-01T02:00:00+02:00").unwrap();
        assert_eq!(dt.to_string(), "2020-01-01 00:00:00");
    }

    #[test]
    fn test_parse_uploaded_epoch() {
        let dt = parse_date_uploaded("1141639556").unwrap();
        assert_eq!(dt.to_string(), "2006-03-06 10:05:56");
    }

    // ── gap ─────────────────────────────────────────────────────

    #[test]
    fn test_gap_sign() {
        let r = dated("2020-01-01T00:01:00", JAN_1_2020);
        assert_eq!(taken_to_uploaded_gap(&r), Some(60.0));
        assert_eq!(taken_to_uploaded_gap(&dated(NULL_DATE, JAN_1_2020)), None);
    }

    // ── aspect ratio ────────────────────────────────────────────

    #[test]
    fn test_weird_aspect_ratio_boundary() {
        let mut r = record("1");
        r.width = Some(200);
        r.height = Some(100);
        assert!(!is_weird_aspect_ratio(&r, WEIRD_ASPECT_RATIO).unwrap());

        r.width = Some(20001);
        r.height = Some(10000);
        assert!(is_weird_aspect_ratio(&r, WEIRD_ASPECT_RATIO).unwrap());
    }

    #[test]
    fn test_weird_aspect_ratio_without_geometry_errors() {
        let mut r = record("42");
        r.width = None;
        r.height = None;
        let err = is_weird_aspect_ratio(&r, WEIRD_ASPECT_RATIO).unwrap_err();
        assert!(matches!(err, Error::MissingGeometry { .. }));
        assert!(err.to_string().contains("42"));
    }

    #[test]
    fn test_count_invalid_dates() {
        let records = vec![
            dated("2019-01-01", JAN_1_2020),
            dated("2021-01-01", JAN_1_2020),
            dated(NULL_DATE, JAN_1_2020),
        ];
        assert_eq!(count_invalid_dates(&records), 2);
    }
}
