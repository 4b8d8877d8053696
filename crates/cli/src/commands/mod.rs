pub mod outliers;
pub mod report;
pub mod summary;

use std::path::Path;

use anyhow::{Context, Result};
use tagatlas_core::config::CurationConfig;
use tagatlas_core::domain::Photo;
use tagatlas_core::enrich::{enrich, ImageHeaderProbe};
use tagatlas_core::ingest::load_records;

pub fn load_config(path: Option<&Path>) -> Result<CurationConfig> {
    match path {
        Some(path) => CurationConfig::load(path)
            .with_context(|| format!("loading config from {}", path.display())),
        None => Ok(CurationConfig::default()),
    }
}

/// Read the metadata file and resolve every record's geometry.
pub fn load_corpus(metadata: &Path) -> Result<Vec<Photo>> {
    let records = load_records(metadata)
        .with_context(|| format!("reading metadata from {}", metadata.display()))?;
    let enrichment = enrich(records, &ImageHeaderProbe)?;
    if !enrichment.failures.is_empty() {
        println!(
            "  {} records excluded: image dimensions unreadable",
            enrichment.failures.len()
        );
    }
    tracing::debug!(photos = enrichment.photos.len(), "corpus ready");
    Ok(enrichment.photos)
}
