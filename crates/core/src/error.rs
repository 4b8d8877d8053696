use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("config file error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("invalid score buckets: {0}")]
    InvalidScoreBuckets(String),

    #[error("record {id} has no width/height; run enrichment before aspect-ratio checks")]
    MissingGeometry { id: String },

    #[error("cannot read image dimensions of {}: {message}", .path.display())]
    ImageProbe { path: PathBuf, message: String },

    #[error("metadata input contains no records")]
    EmptyCorpus,

    #[error("malformed metadata record on line {line}: {source}")]
    MalformedRecord {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("excluded ID on line {line} is not an integer: {value:?}")]
    MalformedExcludedId { line: usize, value: String },
}

pub type Result<T> = std::result::Result<T, Error>;
