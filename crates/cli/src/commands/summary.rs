use std::path::Path;

use anyhow::Result;
use comfy_table::{presets::UTF8_FULL, Cell, CellAlignment, ContentArrangement, Table};
use tagatlas_core::config::CurationConfig;
use tagatlas_core::{Curator, TagSummary};

use super::load_corpus;

pub fn run(config: CurationConfig, metadata: &Path) -> Result<()> {
    let thresholds = config.score_buckets.clone();
    // Never written to; Curator only needs a location
    let curator = Curator::new(config, Path::new("."))?;
    let photos = load_corpus(metadata)?;
    let rows = curator.tag_summary(&photos);

    println!("{}", render(&thresholds, &rows));
    println!("Tags: {}", rows.len());
    Ok(())
}

pub(crate) fn render(thresholds: &[f64], rows: &[TagSummary]) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_content_arrangement(ContentArrangement::Dynamic);

    let mut header = vec![Cell::new("Tag")];
    header.extend(thresholds.iter().map(|t| Cell::new(format!(">= {t}"))));
    header.push(Cell::new("Total"));
    table.set_header(header);

    for row in rows {
        let mut cells = vec![Cell::new(&row.tag)];
        cells.extend(
            row.bucket_counts
                .iter()
                .map(|n| Cell::new(n).set_alignment(CellAlignment::Right)),
        );
        cells.push(Cell::new(row.total).set_alignment(CellAlignment::Right));
        table.add_row(cells);
    }
    table
}
