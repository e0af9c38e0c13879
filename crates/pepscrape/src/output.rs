use std::fmt::Display;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::Local;
use serde_json::{Map, Value};

use crate::ScraperError;
use crate::docs::{VersionEntry, WhatsNewArticle};
use crate::pep::StatusTally;

pub const RESULTS_DIR: &str = "results";
pub const DATETIME_FORMAT: &str = "%Y-%m-%d_%H-%M-%S";

/// A header row plus data rows, every cell already rendered as text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub mode: String,
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Report {
    pub fn new<H: Into<String>>(mode: &str, header: impl IntoIterator<Item = H>) -> Self {
        Self {
            mode: mode.to_string(),
            header: header.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    pub fn push_row<C: Into<String>>(&mut self, row: impl IntoIterator<Item = C>) {
        self.rows.push(row.into_iter().map(Into::into).collect());
    }

    pub fn from_tally(tally: &StatusTally) -> Self {
        let mut report = Report::new("pep", ["Status", "Count"]);
        for (status, count) in tally.rows() {
            report.push_row([status.to_string(), count.to_string()]);
        }
        report
    }

    pub fn from_whats_new(articles: &[WhatsNewArticle]) -> Self {
        let mut report = Report::new("whats-new", ["Article link", "Title", "Editor, author"]);
        for a in articles {
            report.push_row([a.link.as_str(), a.title.as_str(), a.editors.as_str()]);
        }
        report
    }

    pub fn from_versions(versions: &[VersionEntry]) -> Self {
        let mut report = Report::new("latest-versions", ["Documentation link", "Version", "Status"]);
        for v in versions {
            report.push_row([v.link.as_str(), v.version.as_str(), v.status.as_str()]);
        }
        report
    }

    /// Header and rows, each printed with cells separated by a space.
    pub fn plain(&self) -> String {
        std::iter::once(&self.header)
            .chain(&self.rows)
            .map(|row| row.join(" ") + "\n")
            .collect()
    }

    /// Rows as JSON objects keyed by header.
    pub fn to_json(&self) -> Result<String, ScraperError> {
        let records: Vec<Value> = self
            .rows
            .iter()
            .map(|row| {
                let record: Map<String, Value> = self
                    .header
                    .iter()
                    .cloned()
                    .zip(row.iter().cloned().map(Value::String))
                    .collect();
                Value::Object(record)
            })
            .collect();
        Ok(serde_json::to_string_pretty(&records)?)
    }

    /// Writes `<dir>/results/<mode>_<timestamp>.csv` and returns the path.
    pub fn write_csv(&self, base_dir: &Path) -> Result<PathBuf, ScraperError> {
        let results_dir = base_dir.join(RESULTS_DIR);
        fs::create_dir_all(&results_dir)?;
        let now = Local::now().format(DATETIME_FORMAT);
        let path = results_dir.join(format!("{}_{}.csv", self.mode, now));

        let mut writer = csv::WriterBuilder::new()
            .quote_style(csv::QuoteStyle::Always)
            .terminator(csv::Terminator::Any(b'\n'))
            .from_path(&path)?;
        writer.write_record(&self.header)?;
        for row in &self.rows {
            writer.write_record(row)?;
        }
        writer.flush()?;

        log::info!("Results saved to {}", path.display());
        Ok(path)
    }

    fn column_widths(&self) -> Vec<usize> {
        let mut widths: Vec<usize> = self.header.iter().map(|h| h.chars().count()).collect();
        for row in &self.rows {
            for (i, cell) in row.iter().enumerate() {
                let len = cell.chars().count();
                match widths.get_mut(i) {
                    Some(w) => *w = (*w).max(len),
                    None => widths.push(len),
                }
            }
        }
        widths
    }
}

fn rule(f: &mut std::fmt::Formatter<'_>, widths: &[usize], (l, m, r): (char, char, char)) -> std::fmt::Result {
    write!(f, "{l}")?;
    for (i, w) in widths.iter().enumerate() {
        if i > 0 {
            write!(f, "{m}")?;
        }
        write!(f, "{}", "─".repeat(w + 2))?;
    }
    writeln!(f, "{r}")
}

fn line(f: &mut std::fmt::Formatter<'_>, widths: &[usize], cells: &[String]) -> std::fmt::Result {
    write!(f, "│")?;
    for (i, w) in widths.iter().enumerate() {
        let cell = cells.get(i).map(String::as_str).unwrap_or("");
        let pad = w - cell.chars().count();
        write!(f, " {}{} │", cell, " ".repeat(pad))?;
    }
    writeln!(f)
}

/// Left-aligned box table.
impl Display for Report {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let widths = self.column_widths();
        rule(f, &widths, ('┌', '┬', '┐'))?;
        line(f, &widths, &self.header)?;
        rule(f, &widths, ('├', '┼', '┤'))?;
        for row in &self.rows {
            line(f, &widths, row)?;
        }
        rule(f, &widths, ('└', '┴', '┘'))
    }
}
