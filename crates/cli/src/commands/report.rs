use std::path::Path;

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use tagatlas_core::config::CurationConfig;
use tagatlas_core::ingest::{load_excluded_ids, load_vocabulary};
use tagatlas_core::plot::HtmlTimePlotter;
use tagatlas_core::report::html::HtmlSink;
use tagatlas_core::{Curator, ReportProgress, RunInputs};

use super::load_corpus;

pub fn run(
    config: CurationConfig,
    metadata: &Path,
    output: &Path,
    vocabulary: Option<&Path>,
    excluded: Option<&Path>,
) -> Result<()> {
    let curator = Curator::new(config, output)?;

    let inputs = RunInputs {
        vocabulary: match vocabulary {
            Some(path) => load_vocabulary(path)
                .with_context(|| format!("reading vocabulary from {}", path.display()))?,
            None => Vec::new(),
        },
        excluded_ids: match excluded {
            Some(path) => Some(
                load_excluded_ids(path)
                    .with_context(|| format!("reading excluded ids from {}", path.display()))?,
            ),
            None => None,
        },
    };

    let photos = load_corpus(metadata)?;

    let pb = ProgressBar::new(0);
    pb.set_style(
        ProgressStyle::with_template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
            .progress_chars("=>-"),
    );

    let mut sink = HtmlSink::new();
    let mut plotter = HtmlTimePlotter;
    let summary = curator.generate(
        &photos,
        &inputs,
        &mut sink,
        &mut plotter,
        Some(&mut |progress| match progress {
            ReportProgress::TagStart { tag, index, total } => {
                pb.set_length(total as u64);
                pb.set_position(index as u64 + 1);
                pb.set_message(tag);
            }
            ReportProgress::TagSkipped { tag, index, total } => {
                pb.set_length(total as u64);
                pb.set_position(index as u64 + 1);
                pb.set_message(format!("skipped {tag}"));
            }
            ReportProgress::PhaseComplete { phase } => {
                if phase == "tags" {
                    pb.finish_with_message("tag reports done");
                }
            }
        }),
    )?;

    println!();
    println!("  Tags rendered:     {:>8}", summary.tags_rendered);
    println!("  Tags skipped:      {:>8}", summary.tags_skipped);
    println!("  Threshold reports: {:>8}", summary.threshold_reports);
    println!(
        "  User tags:         {:>8} of {} indexed",
        summary.user_tags_rendered, summary.user_tags_indexed
    );
    println!("  Invalid dates:     {:>8}", summary.invalid_dates);
    println!("  Weird aspect:      {:>8}", summary.weird_aspect_ratios);
    if inputs.excluded_ids.is_some() {
        println!("  Time views:        {:>8}", summary.time_views);
    }
    println!("  Files written:     {:>8}", sink.written());
    println!();
    println!("Saved to {}", summary.root_index.display());
    Ok(())
}
