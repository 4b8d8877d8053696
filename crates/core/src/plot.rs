//! Time-bucketed views over record groups.

use std::collections::BTreeMap;
use std::fmt;
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{Datelike, NaiveDateTime};

use crate::domain::Photo;
use crate::error::Result;
use crate::outlier::{parse_date_taken, parse_date_uploaded};
use crate::report::html::escape;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeGranularity {
    Year,
    Month,
}

impl fmt::Display for TimeGranularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimeGranularity::Year => write!(f, "year"),
            TimeGranularity::Month => write!(f, "month"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateField {
    Taken,
    Uploaded,
}

impl fmt::Display for DateField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DateField::Taken => write!(f, "date_taken"),
            DateField::Uploaded => write!(f, "date_uploaded"),
        }
    }
}

pub fn bucket_label(date: NaiveDateTime, granularity: TimeGranularity) -> String {
    match granularity {
        TimeGranularity::Year => format!("{:04}", date.year()),
        TimeGranularity::Month => format!("{:04}-{:02}", date.year(), date.month()),
    }
}

/// Count photos per time bucket. Photos whose date does not parse are left out.
pub fn time_buckets(
    photos: &[&Photo],
    granularity: TimeGranularity,
    field: DateField,
) -> BTreeMap<String, usize> {
    let mut buckets = BTreeMap::new();
    for photo in photos {
        let record = photo.record();
        let date = match field {
            DateField::Taken => parse_date_taken(&record.date_taken),
            DateField::Uploaded => parse_date_uploaded(&record.date_uploaded),
        };
        if let Some(date) = date {
            *buckets.entry(bucket_label(date, granularity)).or_insert(0) += 1;
        }
    }
    buckets
}

pub struct TimePlotRequest<'a> {
    pub photos: &'a [&'a Photo],
    pub out_dir: &'a Path,
    pub granularity: TimeGranularity,
    pub field: DateField,
    pub label: Option<&'a str>,
}

/// Renders a time-bucketed view of a record group into `out_dir`.
pub trait TimePlotter {
    /// Returns the path of the document to link to.
    fn plot(&mut self, request: &TimePlotRequest<'_>) -> Result<PathBuf>;
}

/// Writes a bar chart as a standalone HTML page.
#[derive(Debug, Default)]
pub struct HtmlTimePlotter;

impl TimePlotter for HtmlTimePlotter {
    fn plot(&mut self, request: &TimePlotRequest<'_>) -> Result<PathBuf> {
        let buckets = time_buckets(request.photos, request.granularity, request.field);
        let peak = buckets.values().copied().max().unwrap_or(0).max(1);

        let title = match request.label {
            Some(label) => format!("{label}: images per {} ({})", request.granularity, request.field),
            None => format!("Images per {} ({})", request.granularity, request.field),
        };
        let title = escape(&title);

        let mut html = String::new();
        let _ = write!(
            html,
            "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>{title}</title>\n</head>\n<body>\n<h1>{title}</h1>\n<table>\n"
        );
        for (bucket, count) in &buckets {
            let width = count * 400 / peak;
            let _ = writeln!(
                html,
                "<tr><td>{bucket}</td><td><div style=\"background:#48c;height:12px;width:{width}px\"></div></td><td>{count}</td></tr>"
            );
        }
        html.push_str("</table>\n</body>\n</html>\n");

        fs::create_dir_all(request.out_dir)?;
        let target = request
            .out_dir
            .join(format!("{}_{}.html", request.field, request.granularity));
        fs::write(&target, html)?;
        Ok(target)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecordedPlot {
    pub out_dir: PathBuf,
    pub label: Option<String>,
    pub granularity: TimeGranularity,
    pub field: DateField,
    pub buckets: BTreeMap<String, usize>,
}

/// Records plot requests without touching the filesystem.
#[derive(Debug, Default)]
pub struct MemoryPlotter {
    pub plots: Vec<RecordedPlot>,
}

impl TimePlotter for MemoryPlotter {
    fn plot(&mut self, request: &TimePlotRequest<'_>) -> Result<PathBuf> {
        self.plots.push(RecordedPlot {
            out_dir: request.out_dir.to_path_buf(),
            label: request.label.map(str::to_string),
            granularity: request.granularity,
            field: request.field,
            buckets: time_buckets(request.photos, request.granularity, request.field),
        });
        Ok(request.out_dir.to_path_buf())
    }
}
