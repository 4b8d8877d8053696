//! Confidence bucketing, quality splits and the user-tag inverted index.

use std::collections::{BTreeMap, HashSet};

use crate::dedup::dedup_by_id;
use crate::domain::Photo;
use crate::error::{Error, Result};
use crate::outlier::is_invalid_date;

pub const DEFAULT_SCORE_BUCKETS: [f64; 4] = [0.5, 0.625, 0.75, 0.875];

/// Strictly increasing confidence thresholds.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreBuckets(Vec<f64>);

impl ScoreBuckets {
    pub fn new(thresholds: Vec<f64>) -> Result<Self> {
        if thresholds.is_empty() {
            return Err(Error::InvalidScoreBuckets("no thresholds given".to_string()));
        }
        if let Some(bad) = thresholds.iter().find(|t| !t.is_finite()) {
            return Err(Error::InvalidScoreBuckets(format!("{bad} is not finite")));
        }
        if let Some(pair) = thresholds.windows(2).find(|w| w[0] >= w[1]) {
            return Err(Error::InvalidScoreBuckets(format!(
                "thresholds must increase strictly ({} then {})",
                pair[0], pair[1]
            )));
        }
        Ok(Self(thresholds))
    }

    pub fn thresholds(&self) -> &[f64] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Highest threshold; the default high-confidence cutoff.
    pub fn top(&self) -> f64 {
        self.0[self.0.len() - 1]
    }

    /// Index of the largest threshold `<= score`, or 0 when the score is below all of them.
    pub fn bucket_index(&self, score: f64) -> usize {
        let mut index = 0;
        for (i, threshold) in self.0.iter().enumerate() {
            if score >= *threshold {
                index = i;
            }
        }
        index
    }

    /// The threshold a score floors to.
    pub fn floor(&self, score: f64) -> f64 {
        self.0[self.bucket_index(score)]
    }
}

impl Default for ScoreBuckets {
    fn default() -> Self {
        Self(DEFAULT_SCORE_BUCKETS.to_vec())
    }
}

/// Per-tag, per-threshold grouping of photos. Borrowed views only.
#[derive(Debug)]
pub struct TagBuckets<'a> {
    buckets: ScoreBuckets,
    tags: BTreeMap<String, Vec<Vec<&'a Photo>>>,
}

impl<'a> TagBuckets<'a> {
    pub fn score_buckets(&self) -> &ScoreBuckets {
        &self.buckets
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    /// Tags in alphabetical order.
    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.tags.keys().map(String::as_str)
    }

    /// Tags ordered by pooled size, smallest first. Ties stay alphabetical.
    pub fn tags_by_size(&self) -> Vec<&str> {
        let mut tags: Vec<(&str, usize)> = self
            .tags
            .iter()
            .map(|(tag, buckets)| (tag.as_str(), buckets.iter().map(Vec::len).sum()))
            .collect();
        tags.sort_by_key(|(_, size)| *size);
        tags.into_iter().map(|(tag, _)| tag).collect()
    }

    /// Photos of `tag` whose score floors to `threshold`.
    pub fn bucket(&self, tag: &str, threshold: f64) -> &[&'a Photo] {
        let index = self.buckets.thresholds().iter().position(|t| *t == threshold);
        match (self.tags.get(tag), index) {
            (Some(buckets), Some(i)) => buckets[i].as_slice(),
            _ => &[],
        }
    }

    /// Every photo of `tag`, lowest bucket first.
    pub fn pooled(&self, tag: &str) -> Vec<&'a Photo> {
        self.tags
            .get(tag)
            .map(|buckets| buckets.iter().flatten().copied().collect())
            .unwrap_or_default()
    }

    /// Count per threshold, in threshold order.
    pub fn bucket_counts(&self, tag: &str) -> Vec<usize> {
        self.tags
            .get(tag)
            .map(|buckets| buckets.iter().map(Vec::len).collect())
            .unwrap_or_else(|| vec![0; self.buckets.len()])
    }
}

/// Bucket every (photo, tag) pair by confidence.
/// With an allow-list, tags outside it are ignored entirely.
pub fn classify<'a>(
    photos: &'a [Photo],
    buckets: &ScoreBuckets,
    allow_list: Option<&HashSet<String>>,
) -> TagBuckets<'a> {
    let mut tags: BTreeMap<String, Vec<Vec<&'a Photo>>> = BTreeMap::new();

    for photo in photos {
        for (tag, score) in &photo.record().auto_tag_scores {
            if allow_list.is_some_and(|allowed| !allowed.contains(tag)) {
                continue;
            }
            let slots = tags
                .entry(tag.clone())
                .or_insert_with(|| vec![Vec::new(); buckets.len()]);
            slots[buckets.bucket_index(*score)].push(photo);
        }
    }

    TagBuckets {
        buckets: buckets.clone(),
        tags,
    }
}

/// One tag's pooled photos split by data quality.
#[derive(Debug, Default)]
pub struct QualitySplit<'a> {
    /// Taken-after-upload or unparseable dates. Excluded from everything else.
    pub invalid_date: Vec<&'a Photo>,
    /// The tag's report set.
    pub valid_date: Vec<&'a Photo>,
    /// Valid-date photos with an abnormal aspect ratio.
    pub weird_aspect: Vec<&'a Photo>,
    /// Valid-date, normal aspect ratio; feeds the user-tag index.
    pub working: Vec<&'a Photo>,
}

pub fn split_quality<'a>(pooled: &[&'a Photo], aspect_limit: f64) -> QualitySplit<'a> {
    let mut split = QualitySplit::default();
    for &photo in pooled {
        if is_invalid_date(photo.record()) {
            split.invalid_date.push(photo);
            continue;
        }
        split.valid_date.push(photo);
        if photo.is_weird_aspect_ratio(aspect_limit) {
            split.weird_aspect.push(photo);
        } else {
            split.working.push(photo);
        }
    }
    split
}

/// Split a raw user-tag string on commas. No trimming, empty segments kept.
pub fn split_user_tags(raw: &str) -> impl Iterator<Item = &str> {
    raw.split(',')
}

/// User tag → photos carrying it, in insertion order.
#[derive(Debug, Default)]
pub struct UserTagIndex<'a> {
    tags: BTreeMap<String, Vec<&'a Photo>>,
}

impl<'a> UserTagIndex<'a> {
    pub fn build<I>(photos: I) -> Self
    where
        I: IntoIterator<Item = &'a Photo>,
    {
        let mut tags: BTreeMap<String, Vec<&'a Photo>> = BTreeMap::new();
        for photo in photos {
            for tag in split_user_tags(&photo.record().user_tags) {
                tags.entry(tag.to_string()).or_default().push(photo);
            }
        }
        Self { tags }
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    pub fn get(&self, tag: &str) -> Option<&[&'a Photo]> {
        self.tags.get(tag).map(Vec::as_slice)
    }

    /// Vocabulary tags present in the index, in vocabulary order, each deduplicated.
    pub fn select<'v>(&self, vocabulary: &'v [String]) -> Vec<(&'v str, Vec<&'a Photo>)> {
        let mut emitted: HashSet<&str> = HashSet::new();
        vocabulary
            .iter()
            .filter(|tag| emitted.insert(tag.as_str()))
            .filter_map(|tag| {
                self.tags
                    .get(tag)
                    .map(|photos| (tag.as_str(), dedup_by_id(photos.clone())))
            })
            .collect()
    }
}

/// Photos scoring strictly above `cutoff` on `tag`.
pub fn above_cutoff<'a>(photos: &[&'a Photo], tag: &str, cutoff: f64) -> Vec<&'a Photo> {
    photos
        .iter()
        .filter(|p| p.tag_score(tag).is_some_and(|s| s > cutoff))
        .copied()
        .collect()
}

/// `(included, excluded)` by integer record ID.
/// IDs that are not integers can never be excluded.
pub fn split_excluded<'a>(
    photos: &[&'a Photo],
    excluded_ids: &HashSet<i64>,
) -> (Vec<&'a Photo>, Vec<&'a Photo>) {
    photos.iter().copied().partition(|p| {
        !p.id()
            .trim()
            .parse::<i64>()
            .is_ok_and(|id| excluded_ids.contains(&id))
    })
}
