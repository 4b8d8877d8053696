use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use crate::error::Result;
use crate::report::sink::{IndexDocument, ReportSink, TableDocument};

/// Writes each document as a standalone HTML file at its target path.
#[derive(Debug, Default)]
pub struct HtmlSink {
    written: usize,
}

impl HtmlSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of files written so far.
    pub fn written(&self) -> usize {
        self.written
    }

    fn write(&mut self, target: &Path, html: &str) -> Result<()> {
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(target, html)?;
        self.written += 1;
        tracing::debug!(path = %target.display(), "wrote report document");
        Ok(())
    }
}

impl ReportSink for HtmlSink {
    fn write_table(&mut self, table: &TableDocument) -> Result<()> {
        let html = render_table(table);
        self.write(&table.target, &html)
    }

    fn write_index(&mut self, index: &IndexDocument) -> Result<()> {
        let html = render_index(index);
        self.write(&index.target, &html)
    }
}

pub fn render_table(table: &TableDocument) -> String {
    let image_col = table.headers.iter().position(|h| *h == table.image_column);
    let sort_col = table.headers.iter().position(|h| *h == table.sort_column);

    let mut out = String::new();
    open_document(&mut out, &table.title);
    out.push_str("<table>\n<thead><tr>");
    for (i, header) in table.headers.iter().enumerate() {
        let marker = if Some(i) == sort_col { " data-sort=\"default\"" } else { "" };
        let _ = write!(out, "<th{marker}>{}</th>", escape(header));
    }
    out.push_str("</tr></thead>\n<tbody>\n");

    if let Some(summary) = &table.summary_row {
        out.push_str("<tr class=\"summary\">");
        for cell in summary {
            let _ = write!(out, "<td>{}</td>", escape(cell));
        }
        out.push_str("</tr>\n");
    }

    for row in 0..table.row_count() {
        out.push_str("<tr>");
        for (i, column) in table.columns.iter().enumerate() {
            let cell = column.get(row).map(String::as_str).unwrap_or("");
            if Some(i) == image_col {
                let _ = write!(
                    out,
                    "<td><a href=\"{0}\"><img src=\"{0}\" loading=\"lazy\" width=\"200\"></a></td>",
                    href(cell)
                );
            } else {
                let _ = write!(out, "<td>{}</td>", escape(cell));
            }
        }
        out.push_str("</tr>\n");
    }
    out.push_str("</tbody>\n</table>\n");
    close_document(&mut out);
    out
}

pub fn render_index(index: &IndexDocument) -> String {
    let mut out = String::new();
    open_document(&mut out, &index.title);
    out.push_str("<ul>\n");
    for entry in &index.entries {
        let _ = writeln!(
            out,
            "<li><a href=\"{}\">{}</a></li>",
            href(&entry.link),
            escape(&entry.description)
        );
    }
    out.push_str("</ul>\n");
    close_document(&mut out);
    out
}

fn open_document(out: &mut String, title: &str) {
    let _ = write!(
        out,
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>{0}</title>\n\
         <style>table{{border-collapse:collapse}}td,th{{border:1px solid #ccc;padding:4px;vertical-align:top}}\
         tr.summary{{background:#eef}}</style>\n</head>\n<body>\n<h1>{0}</h1>\n",
        escape(title)
    );
}

fn close_document(out: &mut String) {
    out.push_str("</body>\n</html>\n");
}

pub(crate) fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

fn href(link: &str) -> String {
    escape(&link.replace('%', "%25").replace(' ', "%20"))
}
