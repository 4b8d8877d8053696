pub mod columns;
pub mod html;
pub mod links;
pub mod sink;
pub mod sort;

use std::path::{Path, PathBuf};

use crate::dedup::dedup_by_id;
use crate::domain::Photo;
use crate::error::{Error, Result};
use crate::outlier::is_invalid_date;
use links::link_from;
use sink::{IndexDocument, IndexEntry, ReportSink, TableDocument};
use sort::{ScoreColumn, SortKey};

/// Everything needed to render one named record group.
#[derive(Debug, Clone)]
pub struct ReportRequest<'a> {
    /// Display name used in page descriptions.
    pub name: String,
    /// Where the top-level document goes (table if one page, index otherwise).
    pub target: PathBuf,
    pub records: Vec<&'a Photo>,
    pub sort: SortKey,
    pub score_column: ScoreColumn,
    pub image_header: String,
    /// Column the rendered table offers to sort by.
    pub sort_column: String,
    pub title: String,
}

/// One rendered table page of a report.
#[derive(Debug, Clone, PartialEq)]
pub struct PageSummary {
    pub lo: usize,
    pub hi: usize,
    pub target: PathBuf,
    pub mean: String,
    pub min: String,
    pub max: String,
    pub invalid_dates: usize,
    pub description: String,
}

impl PageSummary {
    pub fn len(&self) -> usize {
        self.hi - self.lo
    }

    pub fn is_empty(&self) -> bool {
        self.hi == self.lo
    }
}

/// Outcome of building one report.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportPage {
    pub name: String,
    pub target: PathBuf,
    pub sort_label: String,
    /// Records after deduplication.
    pub record_count: usize,
    pub invalid_dates: usize,
    pub mean: String,
    pub pages: Vec<PageSummary>,
}

impl ReportPage {
    fn empty(request: &ReportRequest<'_>) -> Self {
        Self {
            name: request.name.clone(),
            target: request.target.clone(),
            sort_label: request.sort.label().to_string(),
            record_count: 0,
            invalid_dates: 0,
            mean: String::new(),
            pages: Vec::new(),
        }
    }

    /// Nothing was rendered.
    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    /// Rendered as an index over several table pages.
    pub fn is_paginated(&self) -> bool {
        self.pages.len() > 1
    }

    pub fn tables_written(&self) -> usize {
        self.pages.len()
    }

    pub fn indexes_written(&self) -> usize {
        usize::from(self.is_paginated())
    }

    /// Index entry pointing at this report from the index document `from`.
    pub fn entry_from(&self, from: &Path, description: String) -> IndexEntry {
        IndexEntry {
            link: link_from(from, &self.target),
            description,
        }
    }
}

/// Splits sorted record groups into fixed-size pages and renders them.
#[derive(Debug, Clone)]
pub struct ReportBuilder {
    page_size: usize,
}

impl ReportBuilder {
    pub fn new(page_size: usize) -> Result<Self> {
        if page_size == 0 {
            return Err(Error::Config("images per page must be at least 1".to_string()));
        }
        Ok(Self { page_size })
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Deduplicate, sort and paginate `request.records`, rendering through `sink`.
    ///
    /// A single page is written straight to `request.target`. Several pages go
    /// to `<target stem>/index_{lo}_{hi}.html` with an index at `request.target`.
    /// An empty group renders nothing and yields an empty [`ReportPage`].
    pub fn build(&self, request: ReportRequest<'_>, sink: &mut dyn ReportSink) -> Result<ReportPage> {
        let records = dedup_by_id(request.records.clone());
        if records.is_empty() {
            tracing::info!(report = %request.name, "skipping report with no images");
            return Ok(ReportPage::empty(&request));
        }

        let sort = &request.sort;
        let mut keyed: Vec<(f64, &Photo)> = records.iter().map(|p| (sort.value(p), *p)).collect();
        keyed.sort_by(|a, b| a.0.total_cmp(&b.0));

        let total = keyed.len();
        let invalid_total = keyed.iter().filter(|(_, p)| is_invalid_date(p.record())).count();
        let mean = sort.format(mean_of(keyed.iter().map(|(v, _)| *v), total));

        let score_header = request.score_column.header(sort);
        let headers = columns::headers(&request.image_header, &score_header);

        if total <= self.page_size {
            let photos: Vec<&Photo> = keyed.iter().map(|(_, p)| *p).collect();
            let page = self.page_summary(&request, &keyed, 0, request.target.clone());
            let summary = columns::summary_row(
                format!("Mean Score is {mean} ({total} images)"),
                format!("Invalid: {invalid_total}"),
            );
            sink.write_table(&TableDocument {
                title: request.title.clone(),
                target: request.target.clone(),
                headers,
                columns: columns::columns(&photos, &request.target, &request.score_column, sort),
                summary_row: Some(summary),
                sort_column: request.sort_column.clone(),
                image_column: request.image_header.clone(),
            })?;
            return Ok(ReportPage {
                name: request.name.clone(),
                target: request.target.clone(),
                sort_label: sort.label().to_string(),
                record_count: total,
                invalid_dates: invalid_total,
                mean,
                pages: vec![page],
            });
        }

        let page_dir = pages_dir(&request.target);
        let mut pages = Vec::with_capacity(total.div_ceil(self.page_size));
        for (chunk_idx, chunk) in keyed.chunks(self.page_size).enumerate() {
            let lo = chunk_idx * self.page_size;
            let hi = lo + chunk.len();
            let target = page_dir.join(format!("index_{lo}_{hi}.html"));
            let page = self.page_summary(&request, chunk, lo, target.clone());

            let summary = columns::summary_row(
                format!(
                    "Mean: {mean} (of all {total} images). For {} imgs in this page mean is: {}.",
                    chunk.len(),
                    page.mean
                ),
                format!(
                    "Invalid: {invalid_total}. In this page {} are invalid.",
                    page.invalid_dates
                ),
            );
            let photos: Vec<&Photo> = chunk.iter().map(|(_, p)| *p).collect();
            sink.write_table(&TableDocument {
                title: format!("{} ({lo} to {hi})", request.title),
                target: target.clone(),
                headers: headers.clone(),
                columns: columns::columns(&photos, &target, &request.score_column, sort),
                summary_row: Some(summary),
                sort_column: request.sort_column.clone(),
                image_column: request.image_header.clone(),
            })?;
            tracing::debug!(report = %request.name, lo, hi, "rendered report page");
            pages.push(page);
        }

        let entries = pages
            .iter()
            .map(|page| IndexEntry {
                link: link_from(&request.target, &page.target),
                description: page.description.clone(),
            })
            .collect();
        sink.write_index(&IndexDocument {
            title: request.title.clone(),
            target: request.target.clone(),
            entries,
        })?;

        Ok(ReportPage {
            name: request.name.clone(),
            target: request.target.clone(),
            sort_label: sort.label().to_string(),
            record_count: total,
            invalid_dates: invalid_total,
            mean,
            pages,
        })
    }

    fn page_summary(
        &self,
        request: &ReportRequest<'_>,
        chunk: &[(f64, &Photo)],
        lo: usize,
        target: PathBuf,
    ) -> PageSummary {
        let sort = &request.sort;
        let hi = lo + chunk.len();
        // chunk is sorted ascending
        let min = sort.format(chunk[0].0);
        let max = sort.format(chunk[chunk.len() - 1].0);
        let mean = sort.format(mean_of(chunk.iter().map(|(v, _)| *v), chunk.len()));
        let invalid_dates = chunk.iter().filter(|(_, p)| is_invalid_date(p.record())).count();
        PageSummary {
            lo,
            hi,
            target,
            description: format!(
                "{} (Image Index {lo} to {hi}) (Min is {min}, max is {max})",
                request.name
            ),
            mean,
            min,
            max,
            invalid_dates,
        }
    }
}

/// Directory holding the pages of a paginated report: the target path without its extension.
pub fn pages_dir(target: &Path) -> PathBuf {
    target.with_extension("")
}

fn mean_of(values: impl Iterator<Item = f64>, count: usize) -> f64 {
    values.sum::<f64>() / count as f64
}
