//! Providers for the metadata corpus, the user-tag vocabulary and the
//! excluded-ID list.

use std::collections::HashSet;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::domain::MetadataRecord;
use crate::error::{Error, Result};
use crate::report::links::absolute_path;

/// Read JSON Lines metadata. Blank lines are skipped; line numbers in errors are 1-based.
pub fn load_records(path: &Path) -> Result<Vec<MetadataRecord>> {
    let reader = BufReader::new(File::open(path)?);
    let mut records = Vec::new();
    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let record: MetadataRecord =
            serde_json::from_str(&line).map_err(|source| Error::MalformedRecord {
                line: index + 1,
                source,
            })?;
        records.push(record);
    }

    let base = absolute_path(path.parent().unwrap_or_else(|| Path::new("")))?;
    resolve_image_paths(&mut records, &base)?;
    tracing::info!(path = %path.display(), records = records.len(), "loaded metadata");
    Ok(records)
}

/// Make every image path absolute, resolving relative ones against `base`.
pub fn resolve_image_paths(records: &mut [MetadataRecord], base: &Path) -> Result<()> {
    for record in records.iter_mut() {
        record.image_path = absolute_path(&base.join(&record.image_path))?;
    }
    Ok(())
}

pub fn load_vocabulary(path: &Path) -> Result<Vec<String>> {
    let reader = BufReader::new(File::open(path)?);
    let mut vocabulary = Vec::new();
    for line in reader.lines() {
        let line = line?;
        if !line.trim().is_empty() {
            vocabulary.push(line);
        }
    }
    tracing::debug!(path = %path.display(), tags = vocabulary.len(), "loaded vocabulary");
    Ok(vocabulary)
}

pub fn load_excluded_ids(path: &Path) -> Result<HashSet<i64>> {
    let reader = BufReader::new(File::open(path)?);
    let mut ids = HashSet::new();
    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        let value = line.trim();
        if value.is_empty() {
            continue;
        }
        let id = value.parse::<i64>().map_err(|_| Error::MalformedExcludedId {
            line: index + 1,
            value: value.to_string(),
        })?;
        ids.insert(id);
    }
    tracing::debug!(path = %path.display(), ids = ids.len(), "loaded excluded ids");
    Ok(ids)
}
