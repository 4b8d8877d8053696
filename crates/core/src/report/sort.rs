use chrono::DateTime;

use crate::domain::Photo;
use crate::outlier::{parse_date_uploaded, taken_to_uploaded_gap};

/// What a report is ordered by, and how its statistics are displayed.
#[derive(Debug, Clone, PartialEq)]
pub enum SortKey {
    /// Confidence of one auto tag, `{:.3}`.
    TagScore(String),
    /// Upload instant, shown as a UTC timestamp.
    DateUploaded,
    /// Long edge over short edge, `{:.4}`.
    AspectRatio,
    /// Seconds from upload to capture, `{:.4} seconds`.
    TakenToUploadedGap,
}

impl SortKey {
    pub fn label(&self) -> &'static str {
        match self {
            SortKey::TagScore(_) => "confidence score",
            SortKey::DateUploaded => "date uploaded",
            SortKey::AspectRatio => "aspect ratio",
            SortKey::TakenToUploadedGap => "time between taken and uploaded",
        }
    }

    /// Numeric key for `photo`. Values that cannot be derived sort as 0.0;
    /// callers filter such photos out beforehand.
    pub fn value(&self, photo: &Photo) -> f64 {
        match self {
            SortKey::TagScore(tag) => photo.tag_score(tag).unwrap_or(0.0),
            SortKey::DateUploaded => parse_date_uploaded(&photo.record().date_uploaded)
                .map(|dt| dt.and_utc().timestamp() as f64)
                .unwrap_or(0.0),
            SortKey::AspectRatio => photo.aspect_ratio(),
            SortKey::TakenToUploadedGap => taken_to_uploaded_gap(photo.record()).unwrap_or(0.0),
        }
    }

    pub fn format(&self, value: f64) -> String {
        match self {
            SortKey::TagScore(_) => format!("{value:.3}"),
            SortKey::DateUploaded => DateTime::from_timestamp(value as i64, 0)
                .map(|dt| dt.naive_utc().to_string())
                .unwrap_or_else(|| value.to_string()),
            SortKey::AspectRatio => format!("{value:.4}"),
            SortKey::TakenToUploadedGap => format!("{value:.4} seconds"),
        }
    }
}

/// What the third table column shows, independently of the sort order.
#[derive(Debug, Clone, PartialEq)]
pub enum ScoreColumn {
    TagScore(String),
    /// Fixed value for every row (user-tag reports carry no confidence).
    Constant(f64),
    /// The report's own sort value, formatted by the sort key.
    SortValue,
}

impl ScoreColumn {
    pub fn header(&self, sort: &SortKey) -> String {
        match self {
            ScoreColumn::TagScore(_) | ScoreColumn::Constant(_) => "confidence score".to_string(),
            ScoreColumn::SortValue => sort.label().to_string(),
        }
    }

    pub fn cell(&self, photo: &Photo, sort: &SortKey) -> String {
        match self {
            ScoreColumn::TagScore(tag) => photo
                .tag_score(tag)
                .map(|s| s.to_string())
                .unwrap_or_default(),
            ScoreColumn::Constant(value) => value.to_string(),
            ScoreColumn::SortValue => sort.format(sort.value(photo)),
        }
    }
}
