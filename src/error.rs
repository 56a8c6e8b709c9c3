use std::path::PathBuf;
use thiserror::Error;

/// Failure to load operator-supplied configuration. Always fatal to a run.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed CSV in {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("{path} line {line}: expected at least 2 columns, found {found}")]
    MissingColumns {
        path: PathBuf,
        line: u64,
        found: usize,
    },
}
