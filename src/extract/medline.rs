use crate::RawRecord;

/// Fields of one MEDLINE-format citation that the raw extract needs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MedlineCitation {
    pub pmid: String,
    pub title: String,
    pub journal: String,
    pub year: Option<i32>,
    pub authors: Vec<String>,
    pub mesh_terms: Vec<String>,
    pub doi: Option<String>,
    pub issn: Option<String>,
    pub abstract_text: String,
    pub affiliations: Vec<String>,
}

/// Split a line into its tag and value. Tags are up to four characters,
/// padded, followed by "- ".
fn split_tag(line: &str) -> Option<(&str, &str)> {
    let (tag, value) = line.split_once('-')?;
    let tag = tag.trim_end();
    if tag.is_empty() || tag.len() > 4 || !tag.chars().all(|c| c.is_ascii_uppercase()) {
        return None;
    }
    Some((tag, value.trim()))
}

fn parse_fields(block: &str) -> Vec<(String, String)> {
    let mut fields: Vec<(String, String)> = Vec::new();

    for line in block.lines() {
        if line.starts_with("      ") {
            if let Some((_, value)) = fields.last_mut() {
                value.push(' ');
                value.push_str(line.trim());
            }
            continue;
        }
        if let Some((tag, value)) = split_tag(line) {
            fields.push((tag.to_string(), value.to_string()));
        }
    }

    fields
}

fn strip_marker<'a>(value: &'a str, marker: &str) -> Option<&'a str> {
    value.strip_suffix(marker).map(str::trim)
}

fn parse_citation(block: &str) -> Option<MedlineCitation> {
    let mut citation = MedlineCitation::default();
    let mut short_authors = Vec::new();
    let mut abbreviated_journal = String::new();
    let mut issns: Vec<(String, bool)> = Vec::new();

    for (tag, value) in parse_fields(block) {
        match tag.as_str() {
            "PMID" => citation.pmid = value,
            "TI" => citation.title = value,
            "JT" => citation.journal = value,
            "TA" => abbreviated_journal = value,
            "DP" => {
                citation.year = value.get(..4).and_then(|y| y.parse().ok());
            }
            "FAU" => citation.authors.push(value),
            "AU" => short_authors.push(value),
            "MH" => citation.mesh_terms.push(value),
            "LID" | "AID" => {
                if citation.doi.is_none() {
                    citation.doi = strip_marker(&value, "[doi]").map(String::from);
                }
            }
            "IS" => {
                let electronic = value.contains("(Electronic)");
                if let Some(issn) = value.split_whitespace().next() {
                    issns.push((issn.to_string(), electronic));
                }
            }
            "AB" => citation.abstract_text = value,
            "AD" => citation.affiliations.push(value),
            _ => {}
        }
    }

    if citation.pmid.is_empty() {
        return None;
    }
    if citation.journal.is_empty() {
        citation.journal = abbreviated_journal;
    }
    if citation.authors.is_empty() {
        citation.authors = short_authors;
    }
    citation.issn = issns
        .iter()
        .find(|(_, electronic)| *electronic)
        .or_else(|| issns.first())
        .map(|(issn, _)| issn.clone());

    Some(citation)
}

/// Parse efetch `rettype=medline` text. Citations are separated by blank
/// lines; blocks without a PMID are dropped.
pub fn parse_medline(text: &str) -> Vec<MedlineCitation> {
    let mut citations = Vec::new();
    let mut block = String::new();

    for line in text.lines() {
        if line.trim().is_empty() {
            if !block.is_empty() {
                citations.extend(parse_citation(&block));
                block.clear();
            }
            continue;
        }
        block.push_str(line);
        block.push('\n');
    }
    if !block.is_empty() {
        citations.extend(parse_citation(&block));
    }

    citations
}

/// Pick the affiliation that ties the citation to `org_name`: the first
/// listed affiliation if it names the organization, otherwise the first
/// corresponding-author affiliation (one carrying an e-mail address).
pub fn select_affiliation<'a>(citation: &'a MedlineCitation, org_name: &str) -> Option<&'a str> {
    let first = citation.affiliations.first()?;
    if first.contains(org_name) {
        return Some(first);
    }

    citation
        .affiliations
        .iter()
        .find(|a| a.contains('@'))
        .filter(|a| a.contains(org_name))
        .map(String::as_str)
}

/// Build the raw record for `org_name`, or `None` when the citation is not
/// attributable to the organization or lacks a title, year or author.
pub fn to_raw_record(citation: &MedlineCitation, org_name: &str) -> Option<RawRecord> {
    let affiliation = select_affiliation(citation, org_name)?;
    let year = citation.year?;
    let author = citation.authors.first()?;
    if citation.title.is_empty() {
        return None;
    }

    let department = affiliation
        .split(',')
        .next()
        .unwrap_or_default()
        .trim()
        .to_string();
    let hospital = affiliation
        .split(',')
        .map(str::trim)
        .filter(|segment| segment.contains(org_name))
        .collect::<Vec<_>>()
        .join(", ");

    Some(RawRecord {
        department,
        hospital,
        title: citation.title.clone(),
        journal: citation.journal.clone(),
        year,
        author: author.clone(),
        author_count: citation.authors.len(),
        mesh_terms: citation.mesh_terms.clone(),
        doi: citation.doi.clone(),
        issn: citation.issn.clone(),
        abstract_text: citation.abstract_text.clone(),
    })
}
