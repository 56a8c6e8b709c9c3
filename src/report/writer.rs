use anyhow::{Context, Result};
use std::collections::HashSet;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::{EnrichedRecord, MappedRecord, RawRecord};

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// A row of one of the output tables, flattened to its cells in column order.
pub trait TableRow {
    const HEADER: &'static [&'static str];

    fn cells(&self) -> Vec<String>;
}

fn opt_cell(value: Option<&str>) -> String {
    value.unwrap_or_default().to_string()
}

fn score_cell(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

impl TableRow for RawRecord {
    const HEADER: &'static [&'static str] = &[
        "Department",
        "Hospital",
        "Title",
        "Journal",
        "Year",
        "Author",
        "Number of Authors",
        "MeSH",
        "DOI",
        "ISSN",
        "Abstract",
    ];

    fn cells(&self) -> Vec<String> {
        vec![
            self.department.clone(),
            self.hospital.clone(),
            self.title.clone(),
            self.journal.clone(),
            self.year.to_string(),
            self.author.clone(),
            self.author_count.to_string(),
            self.mesh_terms.join(", "),
            opt_cell(self.doi.as_deref()),
            opt_cell(self.issn.as_deref()),
            self.abstract_text.clone(),
        ]
    }
}

impl TableRow for MappedRecord {
    const HEADER: &'static [&'static str] = &["Department", "KOR", "DOI", "Year", "Journal", "ISSN"];

    fn cells(&self) -> Vec<String> {
        let record = &self.record;
        vec![
            record.department.clone(),
            opt_cell(self.canonical_department.as_deref()),
            opt_cell(record.doi.as_deref()),
            record.year.to_string(),
            record.journal.clone(),
            opt_cell(record.issn.as_deref()),
        ]
    }
}

impl TableRow for EnrichedRecord {
    const HEADER: &'static [&'static str] = &["Department", "KOR", "Year", "Journal", "DOI", "IF"];

    fn cells(&self) -> Vec<String> {
        let record = &self.mapped.record;
        vec![
            record.department.clone(),
            opt_cell(self.mapped.canonical_department.as_deref()),
            record.year.to_string(),
            record.journal.clone(),
            opt_cell(record.doi.as_deref()),
            score_cell(self.impact_score),
        ]
    }
}

/// Cells of every distinct row, in first-seen order.
pub fn dedup_rows<'a, R, I>(rows: I) -> Vec<Vec<String>>
where
    R: TableRow + 'a,
    I: IntoIterator<Item = &'a R>,
{
    let mut seen = HashSet::new();
    rows.into_iter()
        .map(|row| row.cells())
        .filter(|cells| seen.insert(cells.clone()))
        .collect()
}

/// Write a deduplicated table as UTF-8 CSV with a byte order mark. Returns
/// the number of rows written.
pub fn write_table<'a, R, I>(path: &Path, rows: I) -> Result<usize>
where
    R: TableRow + 'a,
    I: IntoIterator<Item = &'a R>,
{
    let rows = dedup_rows(rows);

    let file =
        File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
    let mut out = BufWriter::new(file);
    out.write_all(UTF8_BOM)?;

    let mut writer = csv::Writer::from_writer(out);
    writer.write_record(R::HEADER)?;
    for cells in &rows {
        writer.write_record(cells)?;
    }
    writer
        .flush()
        .with_context(|| format!("Failed to flush {}", path.display()))?;

    Ok(rows.len())
}
