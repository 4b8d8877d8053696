pub mod classifier;
pub mod config;
pub mod dedup;
pub mod domain;
pub mod enrich;
pub mod error;
pub mod ingest;
pub mod outlier;
pub mod plot;
pub mod report;

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use classifier::{above_cutoff, classify, split_excluded, split_quality, ScoreBuckets, UserTagIndex};
use config::CurationConfig;
use dedup::count_unique;
use domain::Photo;
use error::{Error, Result};
use outlier::{has_null_date_taken, is_invalid_date, taken_to_uploaded_gap};
use plot::{DateField, TimeGranularity, TimePlotRequest, TimePlotter};
use report::links::{absolute_path, link_from, FileNames};
use report::sink::{IndexDocument, IndexEntry, ReportSink};
use report::sort::{ScoreColumn, SortKey};
use report::{ReportBuilder, ReportPage, ReportRequest};

/// Callback for reporting report-generation progress.
pub enum ReportProgress {
    /// Starting the reports of one automatic tag.
    TagStart { tag: String, index: usize, total: usize },
    /// A tag had no valid-date images and was not rendered.
    TagSkipped { tag: String, index: usize, total: usize },
    /// A generation phase completed.
    PhaseComplete { phase: String },
}

/// Per-run inputs that are not configuration.
#[derive(Debug, Clone, Default)]
pub struct RunInputs {
    /// User tags to render, in display order.
    pub vocabulary: Vec<String>,
    /// When present, every tag also gets included/excluded reports and a time view.
    pub excluded_ids: Option<HashSet<i64>>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunSummary {
    pub root_index: PathBuf,
    pub tags_rendered: usize,
    pub tags_skipped: usize,
    pub threshold_reports: usize,
    /// Distinct photos with an invalid date across all tags.
    pub invalid_dates: usize,
    /// Distinct valid-date photos with an abnormal aspect ratio.
    pub weird_aspect_ratios: usize,
    pub user_tags_indexed: usize,
    pub user_tags_rendered: usize,
    pub time_views: usize,
    pub tables_written: usize,
    pub indexes_written: usize,
}

impl RunSummary {
    fn count(&mut self, page: &ReportPage) {
        self.tables_written += page.tables_written();
        self.indexes_written += page.indexes_written();
    }
}

/// Bucket counts for one automatic tag.
#[derive(Debug, Clone, PartialEq)]
pub struct TagSummary {
    pub tag: String,
    /// One count per score bucket, in threshold order.
    pub bucket_counts: Vec<usize>,
    pub total: usize,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct OutlierCounts {
    pub records: usize,
    pub unique: usize,
    pub invalid_dates: usize,
    pub null_date_taken: usize,
    pub weird_aspect_ratios: usize,
}

/// A section index linked from the root index.
struct Section {
    target: PathBuf,
    description: String,
    entries: Vec<IndexEntry>,
}

impl Section {
    fn new(target: PathBuf, description: String) -> Self {
        Self {
            target,
            description,
            entries: Vec::new(),
        }
    }

    fn push(&mut self, page: &ReportPage, description: String) {
        if !page.is_empty() {
            self.entries.push(page.entry_from(&self.target, description));
        }
    }
}

/// The main entry point: turns an enriched corpus into a linked report tree.
pub struct Curator {
    config: CurationConfig,
    output_dir: PathBuf,
    buckets: ScoreBuckets,
    builder: ReportBuilder,
    cutoff: f64,
    allow_list: Option<HashSet<String>>,
}

impl Curator {
    /// Validates the configuration up front; nothing is written until [`Curator::generate`].
    pub fn new(config: CurationConfig, output_dir: &Path) -> Result<Self> {
        config.validate()?;
        let buckets = config.score_buckets()?;
        let builder = ReportBuilder::new(config.images_per_page)?;
        let cutoff = config.cutoff()?;
        let allow_list = config.auto_tag_allow_list();
        Ok(Self {
            config,
            output_dir: absolute_path(output_dir)?,
            buckets,
            builder,
            cutoff,
            allow_list,
        })
    }

    pub fn config(&self) -> &CurationConfig {
        &self.config
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn index_dir(&self) -> PathBuf {
        self.output_dir.join("index")
    }

    pub fn root_index(&self) -> PathBuf {
        self.output_dir.join("index.html")
    }

    /// Classify `photos` and render every report, then the section and root indexes.
    /// Calls `progress` with progress updates if provided.
    pub fn generate(
        &self,
        photos: &[Photo],
        inputs: &RunInputs,
        sink: &mut dyn ReportSink,
        plotter: &mut dyn TimePlotter,
        mut progress: Option<&mut dyn FnMut(ReportProgress)>,
    ) -> Result<RunSummary> {
        if photos.is_empty() {
            return Err(Error::EmptyCorpus);
        }
        let index_dir = self.index_dir();
        let limit = self.config.weird_aspect_ratio;
        let cutoff = self.cutoff;
        let mut summary = RunSummary {
            root_index: self.root_index(),
            ..RunSummary::default()
        };

        let tag_buckets = classify(photos, &self.buckets, self.allow_list.as_ref());
        tracing::info!(tags = tag_buckets.len(), photos = photos.len(), "classified photos");
        notify(&mut progress, ReportProgress::PhaseComplete {
            phase: "classification".to_string(),
        });

        let mut tags = Section::new(
            index_dir.join("tags.html"),
            "All valid images in each tag group (date taken < date uploaded)".to_string(),
        );
        let mut dynamic = Section::new(
            index_dir.join("dynamic_tags.html"),
            format!("All valid images in each tag group with confidence > {cutoff:.3}"),
        );
        let mut user_tags = Section::new(
            index_dir.join("user_tags.html"),
            "All valid images in each user tag group".to_string(),
        );
        let mut included = Section::new(
            index_dir.join("included.html"),
            "All non-filtered out images in each tag group (date taken < date uploaded)".to_string(),
        );
        let mut excluded = Section::new(
            index_dir.join("excluded.html"),
            "All manually filtered out images in each tag group (date taken < date uploaded)"
                .to_string(),
        );
        let time_page = index_dir.join("time.html");
        let mut time_entries = Vec::new();

        let mut all_invalid: Vec<&Photo> = Vec::new();
        let mut all_weird: Vec<&Photo> = Vec::new();
        let mut working: Vec<&Photo> = Vec::new();

        let mut tag_files = FileNames::new();

        // Smallest tags first
        let ordered = tag_buckets.tags_by_size();
        let total = ordered.len();
        for (index, tag) in ordered.into_iter().enumerate() {
            let split = split_quality(&tag_buckets.pooled(tag), limit);
            all_invalid.extend(&split.invalid_date);
            all_weird.extend(&split.weird_aspect);
            working.extend(&split.working);

            if split.valid_date.is_empty() {
                tracing::info!(tag, "skipping tag because no image has a valid date");
                summary.tags_skipped += 1;
                notify(&mut progress, ReportProgress::TagSkipped {
                    tag: tag.to_string(),
                    index,
                    total,
                });
                continue;
            }
            notify(&mut progress, ReportProgress::TagStart {
                tag: tag.to_string(),
                index,
                total,
            });

            let name = tag.replace(' ', "_");
            let file = tag_files.claim(tag);

            let page = self.builder.build(
                tag_request(tag, &name, index_dir.join(format!("index_{file}.html")), &split.valid_date),
                sink,
            )?;
            summary.count(&page);
            summary.tags_rendered += 1;
            tags.push(&page, describe(&name, page.record_count));

            if self.config.threshold_pages {
                let confident = above_cutoff(&split.valid_date, tag, cutoff);
                if confident.is_empty() {
                    tracing::info!(tag, cutoff, "skipping threshold report with no images");
                } else {
                    let page = self.builder.build(
                        ReportRequest {
                            name: format!("{name} score > {cutoff:.3}"),
                            target: index_dir.join(format!("index_{file}_threshold_{cutoff:.3}.html")),
                            records: confident,
                            sort: SortKey::DateUploaded,
                            score_column: ScoreColumn::TagScore(tag.to_string()),
                            image_header: format!("Image with tag {tag}"),
                            sort_column: SortKey::DateUploaded.label().to_string(),
                            title: format!("Example with tag {name} score > {cutoff:.3}"),
                        },
                        sink,
                    )?;
                    summary.count(&page);
                    summary.threshold_reports += 1;
                    dynamic.push(&page, describe(&name, page.record_count));
                }
            }

            if let Some(excluded_ids) = &inputs.excluded_ids {
                let (kept, dropped) = split_excluded(&split.valid_date, excluded_ids);

                let page = self.builder.build(
                    tag_request(tag, &name, index_dir.join(format!("index_{file}_included.html")), &kept),
                    sink,
                )?;
                summary.count(&page);
                included.push(&page, describe(&name, page.record_count));

                if !dropped.is_empty() {
                    let page = self.builder.build(
                        tag_request(tag, &name, index_dir.join(format!("index_{file}_excluded.html")), &dropped),
                        sink,
                    )?;
                    summary.count(&page);
                    excluded.push(&page, describe(&name, page.record_count));
                }

                if !kept.is_empty() {
                    let view = plotter.plot(&TimePlotRequest {
                        photos: &kept,
                        out_dir: &self.output_dir.join("analysis").join(&file),
                        granularity: TimeGranularity::Year,
                        field: DateField::Uploaded,
                        label: Some(tag),
                    })?;
                    summary.time_views += 1;
                    time_entries.push(IndexEntry {
                        link: link_from(&time_page, &view),
                        description: describe(&name, kept.len()),
                    });
                }
            }
        }
        notify(&mut progress, ReportProgress::PhaseComplete {
            phase: "tags".to_string(),
        });

        // User tags are cross-referenced only over valid-date, normal-shape photos
        let index = UserTagIndex::build(working.iter().copied());
        summary.user_tags_indexed = index.len();
        let selected = index.select(&inputs.vocabulary);
        tracing::info!(
            indexed = index.len(),
            vocabulary = inputs.vocabulary.len(),
            present = selected.len(),
            "cross-referenced user tags"
        );
        let mut user_tag_files = FileNames::new();
        for (tag, records) in selected {
            let count = records.len();
            let file = user_tag_files.claim(tag);
            let page = self.builder.build(
                ReportRequest {
                    name: tag.to_string(),
                    target: index_dir.join(format!("index_{file}_usertag.html")),
                    records,
                    sort: SortKey::DateUploaded,
                    score_column: ScoreColumn::Constant(1.0),
                    image_header: format!("Image with tag {tag}"),
                    sort_column: SortKey::DateUploaded.label().to_string(),
                    title: format!("Example with tag {tag}"),
                },
                sink,
            )?;
            summary.count(&page);
            summary.user_tags_rendered += 1;
            user_tags.push(&page, format!("{tag} ({count:10} images)"));
        }
        notify(&mut progress, ReportProgress::PhaseComplete {
            phase: "user tags".to_string(),
        });

        summary.invalid_dates = count_unique(&all_invalid);
        summary.weird_aspect_ratios = count_unique(&all_weird);

        let mut root_entries = Vec::new();
        let root = self.root_index();

        link_section(tags, &root, sink, &mut root_entries, &mut summary)?;

        let mut outlier_pages = Vec::new();
        if self.config.outlier_pages {
            let invalid = self.invalid_date_report(&index_dir, &all_invalid, sink)?;
            summary.count(&invalid);
            outlier_pages.push((invalid, "All invalid images".to_string()));

            let weird = self.builder.build(
                ReportRequest {
                    name: SortKey::AspectRatio.label().to_string(),
                    target: index_dir.join("weird_aspect_ratios.html"),
                    records: all_weird,
                    sort: SortKey::AspectRatio,
                    score_column: ScoreColumn::SortValue,
                    image_header: "Image".to_string(),
                    sort_column: SortKey::AspectRatio.label().to_string(),
                    title: format!("All valid images with weird aspect ratio (> {limit:.2})"),
                },
                sink,
            )?;
            summary.count(&weird);
            outlier_pages.push((
                weird,
                format!("All valid images with weird aspect ratio (> {limit:.2})"),
            ));
            notify(&mut progress, ReportProgress::PhaseComplete {
                phase: "outliers".to_string(),
            });
        }
        for (page, description) in outlier_pages {
            if !page.is_empty() {
                root_entries.push(page.entry_from(&root, description));
            }
        }

        if self.config.threshold_pages {
            link_section(dynamic, &root, sink, &mut root_entries, &mut summary)?;
        }
        link_section(user_tags, &root, sink, &mut root_entries, &mut summary)?;
        if inputs.excluded_ids.is_some() {
            link_section(included, &root, sink, &mut root_entries, &mut summary)?;
            link_section(excluded, &root, sink, &mut root_entries, &mut summary)?;
            let mut time = Section::new(
                time_page.clone(),
                "Time analysis for all non-filtered out images".to_string(),
            );
            time.entries = time_entries;
            link_section(time, &root, sink, &mut root_entries, &mut summary)?;
        }

        sink.write_index(&IndexDocument {
            title: "Tag analysis".to_string(),
            target: root.clone(),
            entries: root_entries,
        })?;
        summary.indexes_written += 1;
        notify(&mut progress, ReportProgress::PhaseComplete {
            phase: "indexes".to_string(),
        });

        tracing::info!(
            path = %root.display(),
            tables = summary.tables_written,
            indexes = summary.indexes_written,
            "saved report tree"
        );
        Ok(summary)
    }

    /// Invalid-date photos sorted by how far capture lies after upload.
    /// Photos without a usable gap (including a `"null"` capture date) are left out.
    fn invalid_date_report(
        &self,
        index_dir: &Path,
        all_invalid: &[&Photo],
        sink: &mut dyn ReportSink,
    ) -> Result<ReportPage> {
        let records: Vec<&Photo> = all_invalid
            .iter()
            .copied()
            .filter(|p| !has_null_date_taken(p.record()) && taken_to_uploaded_gap(p.record()).is_some())
            .collect();
        tracing::info!(
            kept = records.len(),
            total = all_invalid.len(),
            "invalid-date photos with a usable capture date"
        );
        let sort = SortKey::TakenToUploadedGap;
        self.builder.build(
            ReportRequest {
                name: sort.label().to_string(),
                target: index_dir.join("invalids.html"),
                records,
                score_column: ScoreColumn::SortValue,
                image_header: "Image".to_string(),
                sort_column: sort.label().to_string(),
                title: "All invalid images".to_string(),
                sort,
            },
            sink,
        )
    }

    /// Per-tag counts in each score bucket, ordered by the top bucket's count (ascending).
    pub fn tag_summary(&self, photos: &[Photo]) -> Vec<TagSummary> {
        let tag_buckets = classify(photos, &self.buckets, self.allow_list.as_ref());
        let mut rows: Vec<TagSummary> = tag_buckets
            .tags()
            .map(|tag| {
                let bucket_counts = tag_buckets.bucket_counts(tag);
                TagSummary {
                    tag: tag.to_string(),
                    total: bucket_counts.iter().sum(),
                    bucket_counts,
                }
            })
            .collect();
        rows.sort_by_key(|row| row.bucket_counts.last().copied().unwrap_or(0));
        rows
    }

    /// Corpus-wide data-quality counts, without classification.
    pub fn outlier_counts(&self, photos: &[Photo]) -> OutlierCounts {
        let limit = self.config.weird_aspect_ratio;
        OutlierCounts {
            records: photos.len(),
            unique: count_unique(photos),
            invalid_dates: photos.iter().filter(|p| is_invalid_date(p.record())).count(),
            null_date_taken: photos.iter().filter(|p| has_null_date_taken(p.record())).count(),
            weird_aspect_ratios: photos
                .iter()
                .filter(|p| !is_invalid_date(p.record()) && p.is_weird_aspect_ratio(limit))
                .count(),
        }
    }
}

fn tag_request<'a>(tag: &str, name: &str, target: PathBuf, records: &[&'a Photo]) -> ReportRequest<'a> {
    let sort = SortKey::TagScore(tag.to_string());
    ReportRequest {
        name: name.to_string(),
        target,
        records: records.to_vec(),
        score_column: ScoreColumn::TagScore(tag.to_string()),
        image_header: format!("Image with tag {tag}"),
        sort_column: sort.label().to_string(),
        title: format!("Example with tag {name}"),
        sort,
    }
}

/// Write a non-empty section index and link it from the root index.
fn link_section(
    section: Section,
    root: &Path,
    sink: &mut dyn ReportSink,
    root_entries: &mut Vec<IndexEntry>,
    summary: &mut RunSummary,
) -> Result<()> {
    if section.entries.is_empty() {
        tracing::info!(index = %section.target.display(), "skipping empty index");
        return Ok(());
    }
    sink.write_index(&IndexDocument {
        title: section.description.clone(),
        target: section.target.clone(),
        entries: section.entries,
    })?;
    summary.indexes_written += 1;
    root_entries.push(IndexEntry {
        link: link_from(root, &section.target),
        description: section.description,
    });
    Ok(())
}

fn describe(name: &str, count: usize) -> String {
    format!("{name} ({count:6} images)")
}

fn notify(progress: &mut Option<&mut dyn FnMut(ReportProgress)>, event: ReportProgress) {
    if let Some(cb) = progress.as_deref_mut() {
        cb(event);
    }
}
