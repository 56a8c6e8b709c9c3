use anyhow::{anyhow, Context, Result};
use reqwest::Client;
use serde::Deserialize;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use urlencoding::encode;

use super::medline::{parse_medline, to_raw_record};
use super::DateRange;
use crate::RawRecord;

pub const DEFAULT_BASE_URL: &str = "https://eutils.ncbi.nlm.nih.gov/entrez/eutils";

const TOOL_NAME: &str = "pubmed-impact";
const SEARCH_RETMAX: usize = 9999;
const FETCH_BATCH: usize = 200;
/// NCBI allows three requests per second without an API key.
const MIN_REQUEST_INTERVAL: Duration = Duration::from_millis(350);

#[derive(Debug, Deserialize)]
struct SearchResponse {
    esearchresult: SearchResult,
}

#[derive(Debug, Deserialize)]
struct SearchResult {
    #[serde(default)]
    idlist: Vec<String>,
}

/// Sequential E-utilities client for PubMed.
pub struct PubMedClient {
    client: Client,
    base_url: String,
    email: Option<String>,
    api_key: Option<String>,
    last_request: Mutex<Option<Instant>>,
}

impl PubMedClient {
    pub fn new(
        base_url: String,
        email: Option<String>,
        api_key: Option<String>,
        timeout_secs: u64,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            email,
            api_key,
            last_request: Mutex::new(None),
        })
    }

    fn common_params(&self) -> String {
        let mut params = format!("tool={}", encode(TOOL_NAME));
        if let Some(email) = &self.email {
            params.push_str(&format!("&email={}", encode(email)));
        }
        if let Some(api_key) = &self.api_key {
            params.push_str(&format!("&api_key={}", encode(api_key)));
        }
        params
    }

    /// PMIDs of articles affiliated with `org_name` published in `range`.
    pub async fn search(&self, org_name: &str, range: &DateRange) -> Result<Vec<String>> {
        let term = format!("{}[affil] AND {}[dp]", org_name, range.term());
        let url = format!(
            "{}/esearch.fcgi?db=pubmed&retmode=json&retmax={}&term={}&{}",
            self.base_url,
            SEARCH_RETMAX,
            encode(&term),
            self.common_params()
        );

        let body = self.get_text(&url).await?;
        let response: SearchResponse =
            serde_json::from_str(&body).context("Failed to parse esearch response")?;
        Ok(response.esearchresult.idlist)
    }

    /// MEDLINE text for a batch of PMIDs.
    pub async fn fetch_medline(&self, pmids: &[String]) -> Result<String> {
        let url = format!(
            "{}/efetch.fcgi?db=pubmed&rettype=medline&retmode=text&id={}&{}",
            self.base_url,
            encode(&pmids.join(",")),
            self.common_params()
        );
        self.get_text(&url).await
    }

    /// Every article in `range` whose selected affiliation names
    /// `affiliation_query`, as raw records in PMID order.
    pub async fn fetch_records(
        &self,
        affiliation_query: &str,
        range: &DateRange,
    ) -> Result<Vec<RawRecord>> {
        let pmids = self.search(affiliation_query, range).await?;
        info!(range = %range.term(), "Found {} PubMed articles", pmids.len());

        let mut records = Vec::new();
        for batch in pmids.chunks(FETCH_BATCH) {
            let text = self.fetch_medline(batch).await?;
            let citations = parse_medline(&text);
            let before = records.len();
            records.extend(
                citations
                    .iter()
                    .filter_map(|citation| to_raw_record(citation, affiliation_query)),
            );
            debug!(
                "Kept {} of {} citations in batch",
                records.len() - before,
                citations.len()
            );
        }

        Ok(records)
    }

    async fn wait_for_rate_limit(&self) {
        let mut last = self.last_request.lock().await;
        if let Some(elapsed) = (*last).map(|t| t.elapsed()) {
            if elapsed < MIN_REQUEST_INTERVAL {
                tokio::time::sleep(MIN_REQUEST_INTERVAL - elapsed).await;
            }
        }
        *last = Some(Instant::now());
    }

    async fn get_text(&self, url: &str) -> Result<String> {
        let max_retries = 3;

        for attempt in 0..max_retries {
            self.wait_for_rate_limit().await;

            match self.client.get(url).send().await {
                Ok(response) => {
                    let status = response.status();

                    if status.is_success() {
                        return Ok(response.text().await?);
                    } else if status.as_u16() == 429 {
                        let wait = response
                            .headers()
                            .get("Retry-After")
                            .and_then(|v| v.to_str().ok())
                            .and_then(|v| v.parse::<u64>().ok())
                            .unwrap_or(2u64.pow(attempt as u32));
                        warn!("Rate limited, waiting {}s", wait);
                        tokio::time::sleep(Duration::from_secs(wait)).await;
                        continue;
                    } else {
                        return Err(anyhow!("HTTP {}", status));
                    }
                }
                Err(e) => {
                    if attempt < max_retries - 1 {
                        let wait = 2u64.pow(attempt as u32);
                        warn!("Request error, retrying in {}s: {}", wait, e);
                        tokio::time::sleep(Duration::from_secs(wait)).await;
                        continue;
                    }
                    return Err(e.into());
                }
            }
        }

        Err(anyhow!("Max retries exceeded"))
    }
}
