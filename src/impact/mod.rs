mod cwts;
pub use cwts::load_impact_table;

use std::collections::HashMap;

use crate::{EnrichedRecord, MappedRecord};

/// Per-journal impact values for a single target year, keyed by electronic
/// ISSN.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImpactTable {
    year: i32,
    scores: HashMap<String, f64>,
}

impl ImpactTable {
    pub fn new(year: i32, scores: HashMap<String, f64>) -> Self {
        Self { year, scores }
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    /// Exact lookup; only the retained year has values.
    pub fn lookup_impact(&self, serial_id: &str, year: i32) -> Option<f64> {
        if year != self.year {
            return None;
        }
        self.get(serial_id)
    }

    pub fn get(&self, serial_id: &str) -> Option<f64> {
        self.scores.get(serial_id).copied()
    }
}

/// Attach the target-year impact score by exact ISSN. Records without an
/// ISSN, or whose ISSN is not in the table, get `None`.
pub fn join_impact(records: Vec<MappedRecord>, table: &ImpactTable) -> Vec<EnrichedRecord> {
    records
        .into_iter()
        .map(|mapped| {
            let impact_score = mapped
                .record
                .issn
                .as_deref()
                .map(str::trim)
                .filter(|issn| !issn.is_empty())
                .and_then(|issn| table.get(issn));

            EnrichedRecord {
                mapped,
                impact_score,
            }
        })
        .collect()
}
