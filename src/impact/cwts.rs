use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;
use tracing::{info, warn};

use super::ImpactTable;

#[derive(Debug, Deserialize)]
struct CwtsRow {
    #[serde(rename = "Electronic ISSN")]
    electronic_issn: Option<String>,
    #[serde(rename = "Year")]
    year: Option<i32>,
    #[serde(rename = "SNIP")]
    snip: Option<f64>,
}

/// Load a CWTS journal indicators CSV and keep the SNIP values of one year:
/// `year` if given, otherwise the latest year in the file. Repeated
/// (ISSN, year) rows are averaged.
pub fn load_impact_table<P: AsRef<Path>>(path: P, year: Option<i32>) -> Result<ImpactTable> {
    let path = path.as_ref();
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read impact table {}", path.display()))?;

    let mut reader = csv::Reader::from_reader(content.trim_start_matches('\u{feff}').as_bytes());

    // (issn, year) -> (sum, count)
    let mut sums: BTreeMap<(i32, String), (f64, u32)> = BTreeMap::new();
    let mut skipped = 0u64;

    for result in reader.deserialize::<CwtsRow>() {
        let row = result.with_context(|| format!("Malformed row in {}", path.display()))?;

        let (Some(issn), Some(row_year), Some(snip)) = (row.electronic_issn, row.year, row.snip)
        else {
            skipped += 1;
            continue;
        };
        let issn = issn.trim();
        if issn.is_empty() || issn == "-" {
            skipped += 1;
            continue;
        }

        let entry = sums.entry((row_year, issn.to_string())).or_insert((0.0, 0));
        entry.0 += snip;
        entry.1 += 1;
    }

    if skipped > 0 {
        warn!("Skipped {} impact rows without ISSN, year or SNIP", skipped);
    }

    let target = match year.or_else(|| sums.keys().map(|(y, _)| *y).max()) {
        Some(y) => y,
        None => bail!("Impact table {} has no usable rows", path.display()),
    };

    let scores: HashMap<String, f64> = sums
        .into_iter()
        .filter(|((y, _), _)| *y == target)
        .map(|((_, issn), (sum, count))| (issn, sum / f64::from(count)))
        .collect();

    info!("Loaded {} impact scores for {}", scores.len(), target);

    Ok(ImpactTable::new(target, scores))
}
