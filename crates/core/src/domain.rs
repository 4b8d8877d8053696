use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// One photo's metadata as delivered by ingestion.
/// Field names on the wire follow the corpus dump (`ID`, `IMG_PATH`, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct MetadataRecord {
    pub id: String,
    #[serde(rename = "IMG_PATH")]
    pub image_path: PathBuf,
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Raw comma-separated user tags, exactly as uploaded.
    #[serde(default)]
    pub user_tags: String,
    #[serde(default)]
    pub machine_tags: String,
    /// ISO-8601 timestamp or the literal `"null"`.
    #[serde(default)]
    pub date_taken: String,
    /// Epoch seconds, string-encoded.
    #[serde(default)]
    pub date_uploaded: String,
    #[serde(default)]
    pub auto_tag_scores: BTreeMap<String, f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ext: Option<String>,
}

impl MetadataRecord {
    /// Geometry recorded on this record, if both dimensions are known and non-zero.
    pub fn geometry(&self) -> Option<Geometry> {
        match (self.width, self.height) {
            (Some(width), Some(height)) if width > 0 && height > 0 => {
                Some(Geometry { width, height })
            }
            _ => None,
        }
    }

    /// Like [`geometry`](Self::geometry) but fails with `MissingGeometry`.
    pub fn require_geometry(&self) -> Result<Geometry> {
        self.geometry().ok_or_else(|| Error::MissingGeometry {
            id: self.id.clone(),
        })
    }

    /// Confidence score for an auto tag, if the record carries it.
    pub fn tag_score(&self, tag: &str) -> Option<f64> {
        self.auto_tag_scores.get(tag).copied()
    }
}

/// Pixel dimensions of an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Geometry {
    pub width: u32,
    pub height: u32,
}

impl Geometry {
    /// Long edge over short edge, always >= 1.0.
    pub fn aspect_ratio(&self) -> f64 {
        let long = self.width.max(self.height) as f64;
        let short = self.width.min(self.height) as f64;
        long / short
    }
}

/// A record whose geometry has been resolved. Immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct Photo {
    record: MetadataRecord,
    geometry: Geometry,
    aspect_ratio: f64,
}

impl Photo {
    /// Wrap a record that already carries width/height.
    pub fn from_record(record: MetadataRecord) -> Result<Self> {
        let geometry = record.require_geometry()?;
        Ok(Self::with_geometry(record, geometry))
    }

    /// Wrap a record with probed geometry, copying the dimensions onto the record.
    pub fn with_geometry(mut record: MetadataRecord, geometry: Geometry) -> Self {
        record.width = Some(geometry.width);
        record.height = Some(geometry.height);
        Self {
            record,
            geometry,
            aspect_ratio: geometry.aspect_ratio(),
        }
    }

    pub fn record(&self) -> &MetadataRecord {
        &self.record
    }

    pub fn id(&self) -> &str {
        &self.record.id
    }

    pub fn geometry(&self) -> Geometry {
        self.geometry
    }

    pub fn aspect_ratio(&self) -> f64 {
        self.aspect_ratio
    }

    pub fn is_weird_aspect_ratio(&self, limit: f64) -> bool {
        self.aspect_ratio > limit
    }

    pub fn tag_score(&self, tag: &str) -> Option<f64> {
        self.record.tag_score(tag)
    }
}

/// Anything that carries a corpus-wide record ID.
/// Equality for deduplication purposes is defined by this ID alone.
pub trait Identified {
    fn record_id(&self) -> &str;
}

impl Identified for MetadataRecord {
    fn record_id(&self) -> &str {
        &self.id
    }
}

impl Identified for Photo {
    fn record_id(&self) -> &str {
        self.id()
    }
}

impl<T: Identified + ?Sized> Identified for &T {
    fn record_id(&self) -> &str {
        (**self).record_id()
    }
}
