mod writer;
pub use writer::{dedup_rows, write_table, TableRow};

use anyhow::{bail, Context, Result};
use clap::Args;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::department::{
    build_vocabulary, load_override_table, reconcile, BUILTIN_DEPARTMENTS, DEFAULT_THRESHOLD,
};
use crate::extract::load_raw_records;
use crate::impact::{join_impact, load_impact_table};

#[derive(Args, Clone)]
pub struct ReportOptions {
    /// Output directory for the department and impact tables
    #[arg(short, long, default_value = ".")]
    pub out_path: PathBuf,

    /// CSV of English department fragments and replacement Korean labels
    #[arg(short, long)]
    pub map_file: Option<PathBuf>,

    /// CWTS journal indicators CSV (SNIP by electronic ISSN and year)
    #[arg(short = 'i', long)]
    pub metrics: Option<PathBuf>,

    /// Impact year to keep (defaults to the latest year in the metrics file)
    #[arg(long)]
    pub impact_year: Option<i32>,

    /// Minimum fuzzy score (0-100) for a department match
    #[arg(long, default_value_t = DEFAULT_THRESHOLD)]
    pub threshold: u8,

    /// Rewrite tables that already exist
    #[arg(short, long)]
    pub force: bool,
}

#[derive(Args)]
pub struct ReportArgs {
    /// Organization name used in output file names
    pub org_name: String,

    /// Directory holding the raw CSV extracts
    pub data_path: PathBuf,

    #[command(flatten)]
    pub options: ReportOptions,
}

pub fn department_table_path(out_path: &Path, org_name: &str) -> PathBuf {
    out_path.join(format!("{}_KOR.csv", org_name))
}

pub fn impact_table_path(out_path: &Path, org_name: &str) -> PathBuf {
    out_path.join(format!("{}_IF_stats.csv", org_name))
}

fn should_write(path: &Path, force: bool) -> bool {
    if path.exists() && !force {
        info!("{} exists, skipping (use --force to rewrite)", path.display());
        return false;
    }
    true
}

pub fn run(args: ReportArgs) -> Result<()> {
    if !args.data_path.is_dir() {
        bail!(
            "Data path {} does not exist or is not a directory",
            args.data_path.display()
        );
    }

    let options = &args.options;
    fs::create_dir_all(&options.out_path).context("Failed to create output directory")?;

    let department_path = department_table_path(&options.out_path, &args.org_name);
    let impact_path = impact_table_path(&options.out_path, &args.org_name);

    let write_departments = should_write(&department_path, options.force);
    let write_impact = options.metrics.is_some() && should_write(&impact_path, options.force);
    if options.metrics.is_none() {
        warn!("No metrics file given, impact table will not be written");
    }
    if !write_departments && !write_impact {
        return Ok(());
    }

    let overrides = options
        .map_file
        .as_ref()
        .map(load_override_table)
        .transpose()?;
    let vocabulary = build_vocabulary(BUILTIN_DEPARTMENTS, overrides.as_deref());
    info!("Department vocabulary has {} entries", vocabulary.len());

    let records = load_raw_records(&args.data_path)?;
    info!("Loaded {} raw records", records.len());

    let mapped = reconcile(records, &vocabulary, options.threshold);
    let unmapped = mapped
        .iter()
        .filter(|m| m.canonical_department.is_none())
        .count();
    info!(
        "Mapped {} of {} records to a department",
        mapped.len() - unmapped,
        mapped.len()
    );

    if write_departments {
        let rows = write_table(&department_path, &mapped)?;
        info!("Wrote {} rows to {}", rows, department_path.display());
    }

    if let (true, Some(metrics)) = (write_impact, &options.metrics) {
        let table = load_impact_table(metrics, options.impact_year)?;
        let enriched = join_impact(mapped, &table);
        let scored = enriched.iter().filter(|e| e.impact_score.is_some()).count();
        info!(
            "Found {} impact scores for {} records",
            scored,
            enriched.len()
        );

        let rows = write_table(&impact_path, &enriched)?;
        info!("Wrote {} rows to {}", rows, impact_path.display());
    }

    Ok(())
}
