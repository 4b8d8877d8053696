use std::path::Path;

use rayon::prelude::*;

use crate::domain::{Geometry, MetadataRecord, Photo};
use crate::error::{Error, Result};

/// Reads pixel dimensions of an image file.
pub trait DimensionProbe: Send + Sync {
    fn dimensions(&self, path: &Path) -> Result<Geometry>;
}

/// Probes dimensions from the image header without decoding pixels.
#[derive(Debug, Default, Clone, Copy)]
pub struct ImageHeaderProbe;

impl DimensionProbe for ImageHeaderProbe {
    fn dimensions(&self, path: &Path) -> Result<Geometry> {
        let (width, height) = image::image_dimensions(path).map_err(|e| Error::ImageProbe {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        if width == 0 || height == 0 {
            return Err(Error::ImageProbe {
                path: path.to_path_buf(),
                message: format!("degenerate size {width}x{height}"),
            });
        }
        Ok(Geometry { width, height })
    }
}

/// A record dropped during enrichment.
#[derive(Debug)]
pub struct ProbeFailure {
    pub id: String,
    pub error: Error,
}

#[derive(Debug)]
pub struct Enrichment {
    /// Enriched photos, in input order.
    pub photos: Vec<Photo>,
    pub failures: Vec<ProbeFailure>,
}

/// Resolve geometry for every record.
///
/// Records that already carry width/height are not probed. A record whose image
/// cannot be read is dropped and reported in `failures`; the rest continue.
/// Fails with [`Error::EmptyCorpus`] when no record survives.
pub fn enrich<P>(records: Vec<MetadataRecord>, probe: &P) -> Result<Enrichment>
where
    P: DimensionProbe + ?Sized,
{
    if records.is_empty() {
        return Err(Error::EmptyCorpus);
    }

    // Probe in parallel; order is preserved by the indexed collect
    let results: Vec<std::result::Result<Photo, ProbeFailure>> = records
        .into_par_iter()
        .map(|record| match record.geometry() {
            Some(geometry) => Ok(Photo::with_geometry(record, geometry)),
            None => match probe.dimensions(&record.image_path) {
                Ok(geometry) => Ok(Photo::with_geometry(record, geometry)),
                Err(error) => Err(ProbeFailure {
                    id: record.id,
                    error,
                }),
            },
        })
        .collect();

    let mut photos = Vec::with_capacity(results.len());
    let mut failures = Vec::new();
    for result in results {
        match result {
            Ok(photo) => photos.push(photo),
            Err(failure) => {
                tracing::warn!(id = %failure.id, error = %failure.error, "excluding record without readable image");
                failures.push(failure);
            }
        }
    }

    if photos.is_empty() {
        tracing::warn!(failed = failures.len(), "no record has a readable image");
        return Err(Error::EmptyCorpus);
    }
    tracing::info!(
        enriched = photos.len(),
        failed = failures.len(),
        "computed width, height and aspect ratio"
    );
    Ok(Enrichment { photos, failures })
}
