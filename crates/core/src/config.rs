//! Run configuration.
//!
//! Every field has a default, so an empty TOML file (or no file at all) yields
//! a usable configuration. The CLI overrides individual fields from flags.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::classifier::{ScoreBuckets, DEFAULT_SCORE_BUCKETS};
use crate::error::{Error, Result};
use crate::outlier::WEIRD_ASPECT_RATIO;

pub const DEFAULT_IMAGES_PER_PAGE: usize = 500;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CurationConfig {
    /// Ascending confidence thresholds used for floor bucketing.
    pub score_buckets: Vec<f64>,
    /// Aspect ratios strictly above this are outliers.
    pub weird_aspect_ratio: f64,
    /// Cutoff for the per-tag threshold reports. Defaults to the top bucket.
    pub confidence_cutoff: Option<f64>,
    pub images_per_page: usize,
    pub threshold_pages: bool,
    pub outlier_pages: bool,
    /// Restrict classification to these automatic tags.
    pub auto_tags: Option<Vec<String>>,
}

impl Default for CurationConfig {
    fn default() -> Self {
        Self {
            score_buckets: DEFAULT_SCORE_BUCKETS.to_vec(),
            weird_aspect_ratio: WEIRD_ASPECT_RATIO,
            confidence_cutoff: None,
            images_per_page: DEFAULT_IMAGES_PER_PAGE,
            threshold_pages: true,
            outlier_pages: true,
            auto_tags: None,
        }
    }
}

impl CurationConfig {
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let config: CurationConfig = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)?;
        let config = Self::from_toml_str(&raw)?;
        tracing::debug!(path = %path.display(), "loaded configuration");
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.score_buckets()?;
        if self.images_per_page == 0 {
            return Err(Error::Config("images_per_page must be at least 1".to_string()));
        }
        if !self.weird_aspect_ratio.is_finite() || self.weird_aspect_ratio < 1.0 {
            return Err(Error::Config(format!(
                "weird_aspect_ratio must be a finite value >= 1.0, got {}",
                self.weird_aspect_ratio
            )));
        }
        if let Some(cutoff) = self.confidence_cutoff {
            if !cutoff.is_finite() {
                return Err(Error::Config(format!(
                    "confidence_cutoff must be finite, got {cutoff}"
                )));
            }
        }
        Ok(())
    }

    pub fn score_buckets(&self) -> Result<ScoreBuckets> {
        ScoreBuckets::new(self.score_buckets.clone())
    }

    /// Effective cutoff: the configured value, else the top threshold.
    pub fn cutoff(&self) -> Result<f64> {
        match self.confidence_cutoff {
            Some(cutoff) => Ok(cutoff),
            None => Ok(self.score_buckets()?.top()),
        }
    }

    pub fn auto_tag_allow_list(&self) -> Option<HashSet<String>> {
        self.auto_tags
            .as_ref()
            .map(|tags| tags.iter().cloned().collect())
    }
}
