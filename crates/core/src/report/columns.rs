use std::path::Path;

use crate::domain::{MetadataRecord, Photo};
use crate::outlier::{is_invalid_date, parse_date_taken, parse_date_uploaded};
use crate::report::links::link_from;
use crate::report::sort::{ScoreColumn, SortKey};

pub const COLUMN_COUNT: usize = 12;
pub const SCORE_COLUMN: usize = 2;
pub const DATE_UPLOADED_COLUMN: usize = 4;

pub fn headers(image_header: &str, score_header: &str) -> Vec<String> {
    [
        image_header,
        "YFCC ID",
        score_header,
        "date taken",
        "date uploaded",
        "size (w x h)",
        "aspect ratio",
        "title",
        "auto tags",
        "user tags",
        "machine tags",
        "description",
    ]
    .iter()
    .map(|h| h.to_string())
    .collect()
}

/// Column-major cells for `photos` rendered into the page at `page`.
pub fn columns(photos: &[&Photo], page: &Path, score: &ScoreColumn, sort: &SortKey) -> Vec<Vec<String>> {
    let mut cols: Vec<Vec<String>> = vec![Vec::with_capacity(photos.len()); COLUMN_COUNT];
    for photo in photos {
        let record = photo.record();
        let geometry = photo.geometry();
        let row = [
            link_from(page, &record.image_path),
            record.id.clone(),
            score.cell(photo, sort),
            date_taken_cell(record),
            date_uploaded_cell(record),
            format!("{} , {}", geometry.width, geometry.height),
            format!("{:.5}", photo.aspect_ratio()),
            record.title.clone(),
            tag_and_score(record),
            record.user_tags.clone(),
            record.machine_tags.clone(),
            record.description.clone(),
        ];
        for (col, cell) in cols.iter_mut().zip(row) {
            col.push(cell);
        }
    }
    cols
}

/// Summary row carrying the mean text under the score column and the invalid text under upload date.
pub fn summary_row(mean: String, invalid: String) -> Vec<String> {
    let mut row = vec![String::new(); COLUMN_COUNT];
    row[SCORE_COLUMN] = mean;
    row[DATE_UPLOADED_COLUMN] = invalid;
    row
}

fn date_taken_cell(record: &MetadataRecord) -> String {
    parse_date_taken(&record.date_taken)
        .map(|dt| dt.to_string())
        .unwrap_or_else(|| record.date_taken.clone())
}

fn date_uploaded_cell(record: &MetadataRecord) -> String {
    let shown = parse_date_uploaded(&record.date_uploaded)
        .map(|dt| dt.to_string())
        .unwrap_or_else(|| record.date_uploaded.clone());
    if is_invalid_date(record) {
        format!("INVALID: {shown}")
    } else {
        shown
    }
}

/// Auto tags in ascending score order, `tag_name:0.94|...`.
pub fn tag_and_score(record: &MetadataRecord) -> String {
    let mut tags: Vec<(&String, &f64)> = record.auto_tag_scores.iter().collect();
    tags.sort_by(|a, b| a.1.total_cmp(b.1));
    tags.iter()
        .map(|(tag, score)| format!("{}:{:.2}", tag.replace(' ', "_"), score))
        .collect::<Vec<_>>()
        .join("|")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::fixtures::{record, tagged};

    #[test]
    fn test_tag_and_score_ordering() {
        let p = tagged("1", &[("computer mouse", 0.762), ("desk", 0.561), ("indoor", 0.998)]);
        assert_eq!(
            tag_and_score(p.record()),
            "desk:0.56|computer_mouse:0.76|indoor:1.00"
        );
    }

    #[test]
    fn test_columns_shape_and_cells() {
        let a = tagged("1", &[("cat", 0.7)]);
        let mut r = record("2");
        r.date_taken = "2030-01-01".to_string();
        r.auto_tag_scores.insert("cat".into(), 0.9);
        let b = Photo::from_record(r).unwrap();

        let page = Path::new("/out/index/index_cat.html");
        let cols = columns(
            &[&a, &b],
            page,
            &ScoreColumn::TagScore("cat".into()),
            &SortKey::TagScore("cat".into()),
        );
        assert_eq!(cols.len(), COLUMN_COUNT);
        assert!(cols.iter().all(|c| c.len() == 2));
        assert_eq!(cols[0][0], "../../corpus/images/1.jpg");
        assert_eq!(cols[1], vec!["1", "2"]);
        assert_eq!(cols[2], vec!["0.7", "0.9"]);
        assert_eq!(cols[3][0], "2020-01-01 00:00:00");
        assert_eq!(cols[4][0], "2020-01-02 00:00:00");
        assert!(cols[4][1].starts_with("INVALID: "));
        assert_eq!(cols[5][0], "400 , 300");
        assert_eq!(cols[6][0], "1.33333");
    }

    #[test]
    fn test_summary_row_positions() {
        let row = summary_row("mean".into(), "invalid".into());
        assert_eq!(row.len(), COLUMN_COUNT);
        assert_eq!(row[SCORE_COLUMN], "mean");
        assert_eq!(row[DATE_UPLOADED_COLUMN], "invalid");
        assert_eq!(headers("Image", "confidence score").len(), COLUMN_COUNT);
    }
}
