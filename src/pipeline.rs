use anyhow::{bail, Context, Result};
use clap::Args;
use std::fs;
use std::path::PathBuf;
use tracing::info;

use crate::extract::{self, PubMedArgs};
use crate::report::{self, ReportArgs, ReportOptions};

#[derive(Args)]
pub struct RunArgs {
    /// Organization to search for in PubMed affiliations
    pub org_name: String,

    /// First publication year (inclusive)
    pub start_year: i32,

    /// Last publication year (inclusive)
    pub end_year: i32,

    /// Existing directory for the monthly raw CSV extracts
    pub data_path: PathBuf,

    #[command(flatten)]
    pub pubmed: PubMedArgs,

    #[command(flatten)]
    pub report: ReportOptions,
}

pub fn run(args: RunArgs) -> Result<()> {
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(run_async(args))
}

/// Extract, map departments, join impact scores.
pub async fn run_async(args: RunArgs) -> Result<()> {
    if !args.data_path.is_dir() {
        bail!(
            "Data path {} does not exist or is not a directory",
            args.data_path.display()
        );
    }

    if !args.report.out_path.exists() {
        info!(
            "Output path {} does not exist, creating it",
            args.report.out_path.display()
        );
        fs::create_dir_all(&args.report.out_path).context("Failed to create output directory")?;
    }

    extract::run_async(extract::ExtractArgs {
        org_name: args.org_name.clone(),
        start_year: args.start_year,
        end_year: args.end_year,
        data_path: args.data_path.clone(),
        pubmed: args.pubmed,
    })
    .await?;

    report::run(ReportArgs {
        org_name: args.org_name,
        data_path: args.data_path,
        options: args.report,
    })
}
