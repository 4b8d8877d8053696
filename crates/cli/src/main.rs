mod commands;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

/// tagatlas: tag classification and report trees for photo metadata corpora
#[derive(Parser)]
#[command(name = "tagatlas", version, about)]
struct Cli {
    /// Path to a TOML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Classify the corpus and write the linked HTML report tree
    Report {
        /// JSON Lines metadata file
        metadata: PathBuf,
        /// Directory that receives index.html and the report tree
        #[arg(long, short)]
        output: PathBuf,
        /// User-tag vocabulary, one tag per line
        #[arg(long)]
        vocabulary: Option<PathBuf>,
        /// Excluded record IDs, one per line
        #[arg(long)]
        excluded: Option<PathBuf>,
        /// Images per table page
        #[arg(long)]
        images_per_page: Option<usize>,
        /// Confidence cutoff for the threshold reports
        #[arg(long)]
        cutoff: Option<f64>,
        /// Skip the per-tag threshold reports
        #[arg(long)]
        no_threshold_pages: bool,
        /// Skip the invalid-date and aspect-ratio reports
        #[arg(long)]
        no_outlier_pages: bool,
    },
    /// Print per-tag counts in each score bucket
    Summary {
        /// JSON Lines metadata file
        metadata: PathBuf,
    },
    /// Print corpus-wide data-quality counts
    Outliers {
        /// JSON Lines metadata file
        metadata: PathBuf,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = commands::load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Report {
            metadata,
            output,
            vocabulary,
            excluded,
            images_per_page,
            cutoff,
            no_threshold_pages,
            no_outlier_pages,
        } => {
            let mut config = config;
            if let Some(n) = images_per_page {
                config.images_per_page = n;
            }
            if cutoff.is_some() {
                config.confidence_cutoff = cutoff;
            }
            if no_threshold_pages {
                config.threshold_pages = false;
            }
            if no_outlier_pages {
                config.outlier_pages = false;
            }
            commands::report::run(
                config,
                &metadata,
                &output,
                vocabulary.as_deref(),
                excluded.as_deref(),
            )?
        }
        Commands::Summary { metadata } => commands::summary::run(config, &metadata)?,
        Commands::Outliers { metadata } => commands::outliers::run(config, &metadata)?,
    }

    Ok(())
}
