use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::{debug, info};

use super::text::normalize;
use crate::ConfigError;

/// Label forced by the surgery override rule. "Surgery" on its own is too
/// generic to live in the vocabulary.
pub const GENERAL_SURGERY: &str = "외과";

/// Versioned English fragment -> Korean department label table.
pub const BUILTIN_DEPARTMENTS: &[(&str, &str)] = &[
    ("Gastroenterology", "소화기내과"),
    ("Cardiology", "순환기내과"),
    ("Pulmonology", "호흡기내과"),
    ("Nephrology", "신장내과"),
    ("Rheumatology", "류마티스내과"),
    ("Endocrinology", "내분비내과"),
    ("Infectious", "감염내과"),
    ("Hematology", "혈액종양내과"),
    ("Oncology", "혈액종양내과"),
    ("Internal", "내과"),
    ("Upper Gastrointestinal", "위장관외과(상부)"),
    ("Hepatobiliary", "간담췌외과"),
    ("Colorectal", "대장항문외과"),
    ("Endocrine", "유방내분비외과"),
    ("Vascular", "이식혈관외과"),
    ("Trauma", "중환자외상외과"),
    ("Pediatric", "소아외과"),
    ("Cardiothoracic", "심장혈관흉부외과"),
    ("Orthopedic", "정형외과"),
    ("Neurosurgery", "신경외과"),
    ("Plastic", "성형외과"),
    ("Obstetrics and Gynecology", "산부인과"),
    ("Pediatrics", "소아과"),
    ("Psychiatry", "정신건강의학과"),
    ("Neurology", "신경과"),
    ("Oral", "치과"),
    ("Ophthalmology", "안과"),
    ("Otorhinolaryngology", "이비인후과"),
    ("Dermatology", "피부과"),
    ("Urology", "비뇨의학과"),
    ("Rehabilitation", "재활의학과"),
    ("Physical", "재활의학과"),
    ("Family Medicine", "가정의학과"),
    ("Dentistry", "치과"),
    ("Laboratory Medicine", "진단검사의학과"),
    ("Radiation Oncology", "방사선종양학과"),
    ("Radiation", "방사선종양학과"),
    ("Anesthesiology", "마취통증의학과"),
    ("Pathology", "병리과"),
    ("Radiology", "영상의학과"),
    ("Emergency Medicine", "응급의학과"),
    ("Nuclear Medicine", "핵의학과"),
    ("Clinical Pharmacology", "임상약리학과"),
    ("Health Screening", "건진센터"),
    ("Thyroid", "갑상선센터"),
    ("International", "국제진료센터"),
    ("Care", "생활치료센터"),
    ("Screening", "선별진료소과(소)"),
    ("Transplant", "이식외과"),
    ("COVID-19", "코로나19"),
];

/// Normalized key -> canonical label. Iterates in key order, which is what
/// makes fuzzy tie-breaking deterministic.
#[derive(Debug, Clone, PartialEq)]
pub struct Vocabulary {
    entries: BTreeMap<String, String>,
    general_surgery: String,
}

impl Vocabulary {
    /// Keys are normalized on insertion; a repeated key keeps the last label.
    pub fn from_entries<I, K, V>(entries: I, general_surgery: &str) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let entries = entries
            .into_iter()
            .map(|(key, label)| (normalize(key.as_ref()), label.into()))
            .collect();

        Self {
            entries,
            general_surgery: general_surgery.to_string(),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(key, label)| (key.as_str(), label.as_str()))
    }

    pub fn general_surgery(&self) -> &str {
        &self.general_surgery
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OverrideRow {
    pub fragment: String,
    pub label: String,
}

/// Read an override table: a CSV with a header row whose first column is an
/// English fragment and second column a canonical label. Header names and
/// any further columns are ignored.
pub fn load_override_table<P: AsRef<Path>>(path: P) -> Result<Vec<OverrideRow>, ConfigError> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(content.trim_start_matches('\u{feff}').as_bytes());

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result.map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        if record.len() < 2 {
            return Err(ConfigError::MissingColumns {
                path: path.to_path_buf(),
                line: record.position().map(|p| p.line()).unwrap_or_default(),
                found: record.len(),
            });
        }

        rows.push(OverrideRow {
            fragment: record[0].to_string(),
            label: record[1].to_string(),
        });
    }

    Ok(rows)
}

/// Merge `overrides` into the built-in table. An override whose normalized
/// fragment matches a built-in key replaces that key's label; overrides
/// that match nothing are dropped.
pub fn build_vocabulary(builtin: &[(&str, &str)], overrides: Option<&[OverrideRow]>) -> Vocabulary {
    let mut vocabulary = Vocabulary::from_entries(builtin.iter().copied(), GENERAL_SURGERY);

    let Some(overrides) = overrides else {
        return vocabulary;
    };

    let mut applied = 0usize;
    for row in overrides {
        let key = normalize(&row.fragment);
        match vocabulary.entries.get_mut(&key) {
            Some(label) => {
                *label = row.label.clone();
                applied += 1;
            }
            None => debug!(fragment = %row.fragment, "Override matches no built-in department"),
        }
    }

    info!(
        "Applied {} of {} department overrides",
        applied,
        overrides.len()
    );

    vocabulary
}
