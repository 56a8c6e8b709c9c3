use serde::{Deserialize, Deserializer, Serialize, Serializer};

pub mod department;
pub mod error;
pub mod extract;
pub mod impact;
pub mod pipeline;
pub mod report;

pub use error::ConfigError;

pub fn init_tracing(verbose: bool) {
    if verbose {
        std::env::set_var("RUST_LOG", "debug");
    }

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("pubmed_impact=info".parse().unwrap()),
        )
        .try_init()
        .ok();
}

/// One extracted publication citation, in the column layout of the raw
/// monthly extracts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawRecord {
    #[serde(rename = "Department")]
    pub department: String,
    #[serde(rename = "Hospital")]
    pub hospital: String,
    #[serde(rename = "Title")]
    pub title: String,
    #[serde(rename = "Journal")]
    pub journal: String,
    #[serde(rename = "Year")]
    pub year: i32,
    #[serde(rename = "Author")]
    pub author: String,
    /// Expected to be at least 1; the source does not enforce it.
    #[serde(rename = "Number of Authors")]
    pub author_count: usize,
    #[serde(
        rename = "MeSH",
        serialize_with = "join_terms",
        deserialize_with = "split_terms"
    )]
    pub mesh_terms: Vec<String>,
    #[serde(rename = "DOI")]
    pub doi: Option<String>,
    #[serde(rename = "ISSN")]
    pub issn: Option<String>,
    #[serde(rename = "Abstract")]
    pub abstract_text: String,
}

fn join_terms<S: Serializer>(terms: &[String], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&terms.join(", "))
}

fn split_terms<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
    let joined = String::deserialize(deserializer)?;
    Ok(joined
        .split(", ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(String::from)
        .collect())
}

#[derive(Debug, Clone, PartialEq)]
pub struct MappedRecord {
    pub record: RawRecord,
    pub canonical_department: Option<String>,
    /// Fuzzy score of the accepted candidate, 0-100.
    pub match_score: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnrichedRecord {
    pub mapped: MappedRecord,
    pub impact_score: Option<f64>,
}
