use anyhow::{bail, Context, Result};
use clap::Args;
use glob::glob;
use indicatif::{ProgressBar, ProgressStyle};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::report::write_table;
use crate::RawRecord;

mod client;
mod medline;
pub use client::{PubMedClient, DEFAULT_BASE_URL};
pub use medline::{parse_medline, select_affiliation, to_raw_record, MedlineCitation};

#[derive(Args, Clone)]
pub struct PubMedArgs {
    /// E-utilities base URL
    #[arg(short = 'u', long, default_value = DEFAULT_BASE_URL)]
    pub base_url: String,

    /// Contact e-mail sent to NCBI with each request
    #[arg(long)]
    pub email: Option<String>,

    /// NCBI API key
    #[arg(long)]
    pub api_key: Option<String>,

    /// Request timeout in seconds
    #[arg(short, long, default_value = "30")]
    pub timeout: u64,
}

#[derive(Args)]
pub struct ExtractArgs {
    /// Organization to search for in PubMed affiliations
    pub org_name: String,

    /// First publication year (inclusive)
    pub start_year: i32,

    /// Last publication year (inclusive)
    pub end_year: i32,

    /// Directory the monthly raw CSV extracts are written to
    pub data_path: PathBuf,

    #[command(flatten)]
    pub pubmed: PubMedArgs,
}

/// A one-month publication date window, `YYYY/MM/01` to the first day of the
/// following month.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub year: i32,
    pub month: u32,
}

impl DateRange {
    pub fn new(year: i32, month: u32) -> Self {
        Self { year, month }
    }

    fn next_month(&self) -> (i32, u32) {
        if self.month >= 12 {
            (self.year + 1, 1)
        } else {
            (self.year, self.month + 1)
        }
    }

    /// PubMed `[dp]` range expression.
    pub fn term(&self) -> String {
        let (next_year, next_month) = self.next_month();
        format!(
            "{}/{:02}/01:{}/{:02}/01",
            self.year, self.month, next_year, next_month
        )
    }

    /// Raw extract file name for `org_name` in this window.
    pub fn file_name(&self, org_name: &str) -> String {
        let (_, next_month) = self.next_month();
        format!(
            "{}_{}_{}-{}.csv",
            org_name, self.year, self.month, next_month
        )
    }
}

/// Every month of `start_year..=end_year`.
pub fn month_windows(start_year: i32, end_year: i32) -> Vec<DateRange> {
    (start_year..=end_year)
        .flat_map(|year| (1..=12).map(move |month| DateRange::new(year, month)))
        .collect()
}

pub fn find_csv_files<P: AsRef<Path>>(directory: P) -> Result<Vec<PathBuf>> {
    let pattern = directory.as_ref().join("*.csv");
    let pattern_str = pattern.to_string_lossy();
    let mut files: Vec<PathBuf> = glob(&pattern_str)?.filter_map(Result::ok).collect();
    files.sort();
    Ok(files)
}

/// Read every raw extract in `directory`. Rows that do not fit the raw
/// column layout are skipped with a warning.
pub fn load_raw_records<P: AsRef<Path>>(directory: P) -> Result<Vec<RawRecord>> {
    let files = find_csv_files(&directory)?;
    info!("Found {} raw extract files", files.len());

    let mut records = Vec::new();
    for path in &files {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to open {}", path.display()))?;
        let mut reader =
            csv::Reader::from_reader(content.trim_start_matches('\u{feff}').as_bytes());

        let mut skipped = 0u64;
        for result in reader.deserialize::<RawRecord>() {
            match result {
                Ok(record) => records.push(record),
                Err(_) => skipped += 1,
            }
        }
        if skipped > 0 {
            warn!("Skipped {} malformed rows in {}", skipped, path.display());
        }
    }

    Ok(records)
}

pub async fn extract_months(
    client: &PubMedClient,
    org_name: &str,
    windows: &[DateRange],
    data_path: &Path,
) -> Result<usize> {
    let progress = ProgressBar::new(windows.len() as u64);
    progress.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] [{bar:40}] {pos}/{len} months ({eta})")?
            .progress_chars("#>-"),
    );

    let mut total = 0;
    for window in windows {
        let records = client
            .fetch_records(org_name, window)
            .await
            .with_context(|| format!("PubMed extraction failed for {}", window.term()))?;

        let path = data_path.join(window.file_name(org_name));
        let written = write_table(&path, &records)?;
        info!(range = %window.term(), "Wrote {} records to {}", written, path.display());
        total += written;
        progress.inc(1);
    }
    progress.finish();

    Ok(total)
}

pub fn run(args: ExtractArgs) -> Result<()> {
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(run_async(args))
}

pub async fn run_async(args: ExtractArgs) -> Result<()> {
    if args.end_year < args.start_year {
        bail!(
            "End year {} is before start year {}",
            args.end_year,
            args.start_year
        );
    }

    fs::create_dir_all(&args.data_path).context("Failed to create data directory")?;

    let client = PubMedClient::new(
        args.pubmed.base_url,
        args.pubmed.email,
        args.pubmed.api_key,
        args.pubmed.timeout,
    )?;

    let windows = month_windows(args.start_year, args.end_year);
    let total = extract_months(&client, &args.org_name, &windows, &args.data_path).await?;
    info!("Extracted {} records for {}", total, args.org_name);

    Ok(())
}
