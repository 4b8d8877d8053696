use std::path::Path;

use anyhow::Result;
use tagatlas_core::config::CurationConfig;
use tagatlas_core::Curator;

use super::load_corpus;

pub fn run(config: CurationConfig, metadata: &Path) -> Result<()> {
    let limit = config.weird_aspect_ratio;
    let curator = Curator::new(config, Path::new("."))?;
    let photos = load_corpus(metadata)?;
    let counts = curator.outlier_counts(&photos);

    println!();
    println!("  Data quality");
    println!("  ------------");
    println!("   Records:          {:>8}", counts.records);
    println!("   Unique IDs:       {:>8}", counts.unique);
    println!("   Invalid dates:    {:>8}", counts.invalid_dates);
    println!("     of which null:  {:>8}", counts.null_date_taken);
    println!(
        "   Aspect > {limit:<6.2}   {:>8}",
        counts.weird_aspect_ratios
    );
    println!();
    Ok(())
}
