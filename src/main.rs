use clap::{Parser, Subcommand};
use pubmed_impact::{extract, init_tracing, pipeline, report};
use tracing::error;

#[derive(Parser)]
#[command(name = "pubmed-impact")]
#[command(about = "Extract institutional PubMed records, map departments, attach journal impact")]
#[command(version)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Download monthly raw extracts from PubMed
    Extract(extract::ExtractArgs),
    /// Map departments and join impact scores from existing raw extracts
    Report(report::ReportArgs),
    /// Extract, then report
    Run(pipeline::RunArgs),
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Extract(args) => extract::run(args),
        Commands::Report(args) => report::run(args),
        Commands::Run(args) => pipeline::run(args),
    };

    if let Err(e) = result {
        error!("An error occurred: {:#}", e);
        std::process::exit(1);
    }
}
