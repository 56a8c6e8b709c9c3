use rapidfuzz::fuzz;
use std::collections::HashMap;
use tracing::debug;

use super::text::{extract_key, STOPWORDS};
use super::vocabulary::Vocabulary;
use crate::{MappedRecord, RawRecord};

pub const DEFAULT_THRESHOLD: u8 = 60;

const SURGERY_MARKERS: [&str; 2] = ["department of surgery", "division of surgery"];

/// Normalized Indel similarity in `0.0..=100.0`. Two empty strings score 100.
pub fn similarity(a: &str, b: &str) -> f64 {
    fuzz::ratio(a.chars(), b.chars()) * 100.0
}

/// Highest-scoring vocabulary key for `key`, with its score. Ties go to the
/// smallest key since the vocabulary iterates in key order and only a
/// strictly better score replaces the current best.
pub fn best_match<'v>(key: &str, vocabulary: &'v Vocabulary) -> Option<(&'v str, f64)> {
    let mut best: Option<(&str, f64)> = None;
    for (candidate, _) in vocabulary.iter() {
        let score = similarity(key, candidate);
        if best.map_or(true, |(_, best_score)| score > best_score) {
            best = Some((candidate, score));
        }
    }
    best
}

fn is_general_surgery(department_text: &str) -> bool {
    let lowered = department_text.to_lowercase();
    SURGERY_MARKERS.iter().any(|marker| lowered.contains(marker))
}

/// Attach a canonical department to every record.
///
/// A record keeps `None` for both label and score when its key is empty or
/// no vocabulary entry reaches `threshold`. Department text naming the
/// Department or Division of Surgery is labelled General Surgery whatever
/// the fuzzy step decided; the score stays as the fuzzy step left it.
pub fn reconcile(
    records: Vec<RawRecord>,
    vocabulary: &Vocabulary,
    threshold: u8,
) -> Vec<MappedRecord> {
    // key -> accepted (label, score)
    let mut decided: HashMap<String, Option<(String, f64)>> = HashMap::new();

    records
        .into_iter()
        .map(|record| {
            let key = extract_key(&record.department, STOPWORDS);

            let accepted = if key.is_empty() {
                None
            } else {
                decided
                    .entry(key)
                    .or_insert_with_key(|key| {
                        let (candidate, score) = best_match(key, vocabulary)?;
                        debug!(key = %key, candidate, score, "Best department candidate");
                        (score >= f64::from(threshold))
                            .then(|| vocabulary.get(candidate).map(|l| (l.to_string(), score)))
                            .flatten()
                    })
                    .clone()
            };

            let (mut canonical_department, match_score) = match accepted {
                Some((label, score)) => (Some(label), Some(score)),
                None => (None, None),
            };

            if is_general_surgery(&record.department) {
                canonical_department = Some(vocabulary.general_surgery().to_string());
            }

            MappedRecord {
                record,
                canonical_department,
                match_score,
            }
        })
        .collect()
}
