use std::path::{Path, PathBuf};

use crate::error::Result;

/// One table page: column-major cells plus rendering hints.
#[derive(Debug, Clone, PartialEq)]
pub struct TableDocument {
    pub title: String,
    pub target: PathBuf,
    pub headers: Vec<String>,
    /// One entry per header, each with one cell per row.
    pub columns: Vec<Vec<String>>,
    pub summary_row: Option<Vec<String>>,
    /// Column the UI offers to sort by. Not necessarily the page's order.
    pub sort_column: String,
    /// Column whose cells are image links.
    pub image_column: String,
}

impl TableDocument {
    pub fn row_count(&self) -> usize {
        self.columns.first().map(Vec::len).unwrap_or(0)
    }

    pub fn column(&self, header: &str) -> Option<&[String]> {
        self.headers
            .iter()
            .position(|h| h == header)
            .map(|i| self.columns[i].as_slice())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct IndexEntry {
    /// Relative to the directory containing the index document.
    pub link: String,
    pub description: String,
}

/// A page whose entries link to other pages.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexDocument {
    pub title: String,
    pub target: PathBuf,
    pub entries: Vec<IndexEntry>,
}

/// Persists rendered documents. The on-disk format is the sink's business.
pub trait ReportSink {
    fn write_table(&mut self, table: &TableDocument) -> Result<()>;
    fn write_index(&mut self, index: &IndexDocument) -> Result<()>;
}

/// Keeps every document in memory, in write order.
#[derive(Debug, Default)]
pub struct MemorySink {
    pub tables: Vec<TableDocument>,
    pub indexes: Vec<IndexDocument>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn table(&self, target: &Path) -> Option<&TableDocument> {
        self.tables.iter().find(|t| t.target == target)
    }

    pub fn index(&self, target: &Path) -> Option<&IndexDocument> {
        self.indexes.iter().find(|i| i.target == target)
    }
}

impl ReportSink for MemorySink {
    fn write_table(&mut self, table: &TableDocument) -> Result<()> {
        self.tables.push(table.clone());
        Ok(())
    }

    fn write_index(&mut self, index: &IndexDocument) -> Result<()> {
        self.indexes.push(index.clone());
        Ok(())
    }
}
