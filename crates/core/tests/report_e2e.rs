use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use tagatlas_core::classifier::{classify, ScoreBuckets};
use tagatlas_core::config::CurationConfig;
use tagatlas_core::domain::{MetadataRecord, Photo};
use tagatlas_core::enrich::{enrich, ImageHeaderProbe};
use tagatlas_core::ingest::load_records;
use tagatlas_core::plot::{HtmlTimePlotter, MemoryPlotter};
use tagatlas_core::report::html::HtmlSink;
use tagatlas_core::report::sink::MemorySink;
use tagatlas_core::{Curator, RunInputs};

/// Create a small PNG of the given size.
fn create_png(path: &Path, width: u32, height: u32) {
    let img = image::RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([(x * 5) as u8, (y * 5) as u8, 128])
    });
    img.save(path).unwrap();
}

/// Write the cat/dog corpus under `site/corpus` and return the metadata path.
///
/// Five records with real images; record 5 is 3:1 wide. Record 6 points at a
/// missing image and is dropped during enrichment.
fn write_corpus(site: &Path) -> PathBuf {
    let corpus = site.join("corpus");
    let images = corpus.join("images");
    fs::create_dir_all(&images).unwrap();

    let rows = [
        ("1", "cat", 0.52, "kitten,pet", (40, 30)),
        ("2", "cat", 0.7, "pet", (40, 30)),
        ("3", "cat", 0.92, "", (40, 30)),
        ("4", "dog", 0.3, "pet", (40, 30)),
        ("5", "dog", 0.95, "", (90, 30)),
    ];
    let mut lines = Vec::new();
    for (id, tag, score, user_tags, (w, h)) in rows {
        create_png(&images.join(format!("{id}.png")), w, h);
        lines.push(
            serde_json::json!({
                "ID": id,
                "IMG_PATH": format!("images/{id}.png"),
                "TITLE": format!("photo {id}"),
                "USER_TAGS": user_tags,
                "DATE_TAKEN": "2010-05-01 12:00:00.0",
                "DATE_UPLOADED": "1300000000",
                "AUTO_TAG_SCORES": { tag: score },
            })
            .to_string(),
        );
    }
    lines.push(
        serde_json::json!({
            "ID": "6",
            "IMG_PATH": "images/missing.png",
            "AUTO_TAG_SCORES": { "cat": 0.8 },
        })
        .to_string(),
    );

    let metadata = corpus.join("meta.jsonl");
    fs::write(&metadata, lines.join("\n") + "\n").unwrap();
    metadata
}

fn load_corpus(metadata: &Path) -> Vec<Photo> {
    let records = load_records(metadata).unwrap();
    let enrichment = enrich(records, &ImageHeaderProbe).unwrap();
    assert_eq!(enrichment.failures.len(), 1);
    assert_eq!(enrichment.failures[0].id, "6");
    enrichment.photos
}

fn config(page_size: usize) -> CurationConfig {
    CurationConfig {
        score_buckets: vec![0.5, 0.75],
        images_per_page: page_size,
        ..CurationConfig::default()
    }
}

fn inputs() -> RunInputs {
    RunInputs {
        vocabulary: vec!["pet".to_string(), "kitten".to_string()],
        excluded_ids: None,
    }
}

/// Collect `href` and `src` attribute values from an HTML document.
fn links(html: &str) -> Vec<String> {
    let mut out = Vec::new();
    for marker in ["href=\"", "src=\""] {
        for part in html.split(marker).skip(1) {
            if let Some(end) = part.find('"') {
                out.push(part[..end].to_string());
            }
        }
    }
    out
}

// ── classification ──────────────────────────────────────────────

#[test]
fn test_cat_dog_buckets() {
    let tmp = tempfile::tempdir().unwrap();
    let photos = load_corpus(&write_corpus(tmp.path()));
    assert_eq!(photos.len(), 5);
    assert_eq!(photos[4].aspect_ratio(), 3.0);

    let buckets = ScoreBuckets::new(vec![0.5, 0.75]).unwrap();
    let tags = classify(&photos, &buckets, None);

    let scores = |tag: &str, threshold: f64| -> Vec<f64> {
        tags.bucket(tag, threshold)
            .iter()
            .filter_map(|p| p.tag_score(tag))
            .collect()
    };
    assert_eq!(scores("cat", 0.5), vec![0.52, 0.7]);
    assert_eq!(scores("cat", 0.75), vec![0.92]);
    assert_eq!(scores("dog", 0.5), vec![0.3]);
    assert_eq!(scores("dog", 0.75), vec![0.95]);
}

// ── report tree on disk ─────────────────────────────────────────

#[test]
fn test_report_tree_written_to_disk() {
    let tmp = tempfile::tempdir().unwrap();
    let site = tmp.path().join("site");
    let photos = load_corpus(&write_corpus(&site));
    let out = site.join("out");

    let curator = Curator::new(config(10), &out).unwrap();
    let mut sink = HtmlSink::new();
    let summary = curator
        .generate(&photos, &inputs(), &mut sink, &mut HtmlTimePlotter, None)
        .unwrap();

    assert_eq!(summary.tags_rendered, 2);
    assert_eq!(summary.weird_aspect_ratios, 1);
    assert_eq!(summary.invalid_dates, 0);
    assert_eq!(summary.user_tags_rendered, 2);
    assert_eq!(summary.tables_written + summary.indexes_written, sink.written());

    let index = out.join("index");
    for file in [
        "index_cat.html",
        "index_dog.html",
        "index_cat_threshold_0.750.html",
        "index_dog_threshold_0.750.html",
        "index_pet_usertag.html",
        "index_kitten_usertag.html",
        "tags.html",
        "dynamic_tags.html",
        "user_tags.html",
        "weird_aspect_ratios.html",
    ] {
        assert!(index.join(file).exists(), "missing {file}");
    }
    // both tags fit on one page; no invalid-date photos
    assert!(!index.join("index_cat").exists());
    assert!(!index.join("invalids.html").exists());

    let cat = fs::read_to_string(index.join("index_cat.html")).unwrap();
    assert!(cat.contains("src=\"../../corpus/images/1.png\""));
    assert!(cat.contains("Mean Score is 0.713 (3 images)"));

    let threshold = fs::read_to_string(index.join("index_cat_threshold_0.750.html")).unwrap();
    assert!(threshold.contains("photo 3"));
    assert!(!threshold.contains("photo 2"));

    let user_tags = fs::read_to_string(index.join("user_tags.html")).unwrap();
    let pet = user_tags.find("index_pet_usertag.html").unwrap();
    let kitten = user_tags.find("index_kitten_usertag.html").unwrap();
    assert!(pet < kitten);

    let root = fs::read_to_string(out.join("index.html")).unwrap();
    assert!(root.contains("href=\"index/tags.html\""));
    assert!(root.contains("href=\"index/weird_aspect_ratios.html\""));
    assert!(!root.contains("invalids.html"));
}

#[test]
fn test_paginated_report_on_disk() {
    let tmp = tempfile::tempdir().unwrap();
    let photos = load_corpus(&write_corpus(tmp.path()));
    let out = tmp.path().join("out");

    let curator = Curator::new(config(2), &out).unwrap();
    curator
        .generate(&photos, &inputs(), &mut HtmlSink::new(), &mut MemoryPlotter::default(), None)
        .unwrap();

    let index = out.join("index");
    assert!(index.join("index_cat/index_0_2.html").exists());
    assert!(index.join("index_cat/index_2_3.html").exists());
    let cat = fs::read_to_string(index.join("index_cat.html")).unwrap();
    assert!(cat.contains("href=\"index_cat/index_0_2.html\""));
    assert!(cat.contains("cat (Image Index 2 to 3) (Min is 0.920, max is 0.920)"));

    let page = fs::read_to_string(index.join("index_cat/index_0_2.html")).unwrap();
    assert!(page.contains("src=\"../../../corpus/images/1.png\""));
}

// ── relocatability ──────────────────────────────────────────────

#[test]
fn test_links_resolve_after_moving_tree() {
    let tmp = tempfile::tempdir().unwrap();
    let site = tmp.path().join("site");
    let photos = load_corpus(&write_corpus(&site));

    let curator = Curator::new(config(2), &site.join("out")).unwrap();
    curator
        .generate(&photos, &inputs(), &mut HtmlSink::new(), &mut HtmlTimePlotter, None)
        .unwrap();

    let moved = tmp.path().join("elsewhere/moved");
    fs::create_dir_all(moved.parent().unwrap()).unwrap();
    fs::rename(&site, &moved).unwrap();

    for doc in [
        "out/index.html",
        "out/index/tags.html",
        "out/index/index_cat.html",
        "out/index/index_cat/index_0_2.html",
        "out/index/user_tags.html",
    ] {
        let path = moved.join(doc);
        let html = fs::read_to_string(&path).unwrap();
        let found = links(&html);
        assert!(!found.is_empty(), "{doc} has no links");
        for link in found {
            assert!(!link.starts_with('/'), "{doc} links absolutely to {link}");
            let resolved = path.parent().unwrap().join(&link);
            assert!(resolved.exists(), "{doc}: {link} does not resolve");
        }
    }
}

#[test]
fn test_links_identical_across_output_roots() {
    fn photos_under(root: &Path) -> Vec<Photo> {
        [("1", 0.6, 10), ("2", 0.8, 30), ("3", 0.9, 10)]
            .into_iter()
            .map(|(id, score, width)| {
                let mut scores = BTreeMap::new();
                scores.insert("cat".to_string(), score);
                Photo::from_record(MetadataRecord {
                    id: id.to_string(),
                    image_path: root.join(format!("corpus/{id}.jpg")),
                    user_id: String::new(),
                    title: String::new(),
                    description: String::new(),
                    user_tags: "pet".to_string(),
                    machine_tags: String::new(),
                    date_taken: "2010-05-01T12:00:00".to_string(),
                    date_uploaded: "1300000000".to_string(),
                    auto_tag_scores: scores,
                    width: Some(width),
                    height: Some(10),
                    ext: None,
                })
                .unwrap()
            })
            .collect()
    }

    let mut rendered = Vec::new();
    for root in [Path::new("/srv/a"), Path::new("/home/user/deep/b")] {
        let photos = photos_under(root);
        let curator = Curator::new(config(2), &root.join("out")).unwrap();
        let mut sink = MemorySink::new();
        curator
            .generate(&photos, &inputs(), &mut sink, &mut MemoryPlotter::default(), None)
            .unwrap();

        let mut links: Vec<String> = sink
            .indexes
            .iter()
            .flat_map(|i| i.entries.iter().map(|e| e.link.clone()))
            .collect();
        for table in &sink.tables {
            links.extend(table.column(&table.image_column).unwrap_or(&[]).iter().cloned());
        }
        rendered.push(links);
    }
    assert!(!rendered[0].is_empty());
    assert_eq!(rendered[0], rendered[1]);
}

// ── excluded ids ────────────────────────────────────────────────

#[test]
fn test_excluded_ids_write_split_reports_and_time_views() {
    let tmp = tempfile::tempdir().unwrap();
    let photos = load_corpus(&write_corpus(tmp.path()));
    let out = tmp.path().join("out");

    let run = RunInputs {
        vocabulary: Vec::new(),
        excluded_ids: Some([2, 4].into_iter().collect()),
    };
    let curator = Curator::new(config(10), &out).unwrap();
    let summary = curator
        .generate(&photos, &run, &mut HtmlSink::new(), &mut HtmlTimePlotter, None)
        .unwrap();
    assert_eq!(summary.time_views, 2);

    let index = out.join("index");
    for file in [
        "included.html",
        "excluded.html",
        "time.html",
        "index_cat_included.html",
        "index_cat_excluded.html",
        "index_dog_excluded.html",
    ] {
        assert!(index.join(file).exists(), "missing {file}");
    }
    assert!(out.join("analysis/cat/date_uploaded_year.html").exists());

    let time = fs::read_to_string(index.join("time.html")).unwrap();
    assert!(time.contains("href=\"../analysis/cat/date_uploaded_year.html\""));
    let plot = fs::read_to_string(out.join("analysis/cat/date_uploaded_year.html")).unwrap();
    // photos 1 and 3 remain, both uploaded in 2011
    assert!(plot.contains("<td>2011</td>"));
    assert!(plot.contains("<td>2</td>"));
}
