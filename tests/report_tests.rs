use pubmed_impact::report::{self, dedup_rows, write_table, ReportArgs, ReportOptions};
use pubmed_impact::{EnrichedRecord, MappedRecord, RawRecord};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn raw(department: &str, doi: &str, issn: Option<&str>) -> RawRecord {
    RawRecord {
        department: department.to_string(),
        hospital: "Seoul National University Hospital".to_string(),
        title: format!("Paper {}", doi),
        journal: "Journal of Tests".to_string(),
        year: 2021,
        author: "Park, Seoyun".to_string(),
        author_count: 4,
        mesh_terms: vec!["Humans".to_string(), "Adult".to_string()],
        doi: Some(doi.to_string()),
        issn: issn.map(String::from),
        abstract_text: "Background, methods, results.".to_string(),
    }
}

fn enriched(department: &str, label: Option<&str>, impact: Option<f64>) -> EnrichedRecord {
    EnrichedRecord {
        mapped: MappedRecord {
            record: raw(department, "10.1/a", Some("1234-5678")),
            canonical_department: label.map(String::from),
            match_score: label.map(|_| 100.0),
        },
        impact_score: impact,
    }
}

fn read_table(path: &Path) -> Vec<Vec<String>> {
    let content = fs::read_to_string(path).unwrap();
    let content = content.strip_prefix('\u{feff}').expect("missing BOM");
    csv::ReaderBuilder::new()
        .has_headers(false)
        .from_reader(content.as_bytes())
        .records()
        .map(|r| r.unwrap().iter().map(String::from).collect())
        .collect()
}

fn options(out_path: PathBuf) -> ReportOptions {
    ReportOptions {
        out_path,
        map_file: None,
        metrics: None,
        impact_year: None,
        threshold: 60,
        force: false,
    }
}

#[test]
fn test_dedup_rows_keeps_first_seen_order() {
    let rows = vec![
        enriched("Department of Urology", Some("비뇨의학과"), Some(2.0)),
        enriched("Department of Neurology", Some("신경과"), None),
        enriched("Department of Urology", Some("비뇨의학과"), Some(2.0)),
    ];

    let deduped = dedup_rows(&rows);

    assert_eq!(deduped.len(), 2);
    assert_eq!(deduped[0][0], "Department of Urology");
    assert_eq!(deduped[1][0], "Department of Neurology");
}

#[test]
fn test_dedup_rows_compares_projected_columns() {
    // Match score is not an output column, so these rows are identical.
    let mut first = enriched("Department of Urology", Some("비뇨의학과"), Some(2.0));
    let second = first.clone();
    first.mapped.match_score = Some(75.0);

    assert_eq!(dedup_rows(&[first, second]).len(), 1);
}

#[test]
fn test_write_table_impact_columns() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("org_IF_stats.csv");
    let rows = vec![
        enriched("Department of Urology", Some("비뇨의학과"), Some(3.5)),
        enriched("Department of Urology", Some("비뇨의학과"), Some(3.5)),
        enriched("Department of Xyz", None, None),
    ];

    let written = write_table(&path, &rows).unwrap();

    assert_eq!(written, 2);
    let table = read_table(&path);
    assert_eq!(
        table[0],
        vec!["Department", "KOR", "Year", "Journal", "DOI", "IF"]
    );
    assert_eq!(
        table[1],
        vec![
            "Department of Urology",
            "비뇨의학과",
            "2021",
            "Journal of Tests",
            "10.1/a",
            "3.5"
        ]
    );
    assert_eq!(table[2][1], "");
    assert_eq!(table[2][5], "");
}

#[test]
fn test_write_table_department_columns() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("org_KOR.csv");
    let rows = vec![MappedRecord {
        record: raw("Department of Neurology", "10.1/b", None),
        canonical_department: Some("신경과".to_string()),
        match_score: Some(100.0),
    }];

    write_table(&path, &rows).unwrap();

    let table = read_table(&path);
    assert_eq!(
        table[0],
        vec!["Department", "KOR", "DOI", "Year", "Journal", "ISSN"]
    );
    assert_eq!(
        table[1],
        vec![
            "Department of Neurology",
            "신경과",
            "10.1/b",
            "2021",
            "Journal of Tests",
            ""
        ]
    );
}

#[test]
fn test_write_table_raw_columns_round_trip() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("raw.csv");
    let record = raw("Department of Cardiology", "10.1/c", Some("1234-5678"));

    write_table(&path, [&record]).unwrap();

    let table = read_table(&path);
    assert_eq!(table[0][6], "Number of Authors");
    assert_eq!(table[1][7], "Humans, Adult");

    let records = pubmed_impact::extract::load_raw_records(temp_dir.path()).unwrap();
    assert_eq!(records, vec![record]);
}

#[test]
fn test_report_run_end_to_end() {
    let temp_dir = TempDir::new().unwrap();
    let data_dir = temp_dir.path().join("data");
    let out_dir = temp_dir.path().join("out");
    fs::create_dir_all(&data_dir).unwrap();

    let records = vec![
        raw("Department of Cardiology", "10.1/x", Some("1234-5678")),
        raw("Department of Surgery, Colorectal", "10.1/y", None),
        raw("Department of Medicine", "10.1/z", Some("9999-9999")),
    ];
    write_table(&data_dir.join("SNUH_2021_1-2.csv"), &records).unwrap();

    let metrics = temp_dir.path().join("CWTS.csv");
    fs::write(
        &metrics,
        "Source title,Electronic ISSN,Year,SNIP\nJ,1234-5678,2021,3.5\nJ,1234-5678,2020,1.0\n",
    )
    .unwrap();

    let mut opts = options(out_dir.clone());
    opts.metrics = Some(metrics);
    report::run(ReportArgs {
        org_name: "SNUH".to_string(),
        data_path: data_dir,
        options: opts,
    })
    .unwrap();

    let departments = read_table(&out_dir.join("SNUH_KOR.csv"));
    assert_eq!(departments.len(), 4);
    assert_eq!(departments[1][1], "순환기내과");
    assert_eq!(departments[2][1], "외과");
    assert_eq!(departments[3][1], "");

    let impact = read_table(&out_dir.join("SNUH_IF_stats.csv"));
    assert_eq!(impact.len(), 4);
    assert_eq!(impact[1][1], "순환기내과");
    assert_eq!(impact[1][5], "3.5");
    assert_eq!(impact[2][5], "");
    assert_eq!(impact[3][5], "");
}

#[test]
fn test_report_run_applies_override_file() {
    let temp_dir = TempDir::new().unwrap();
    let data_dir = temp_dir.path().join("data");
    let out_dir = temp_dir.path().join("out");
    fs::create_dir_all(&data_dir).unwrap();
    write_table(
        &data_dir.join("SNUH_2021_1-2.csv"),
        &[raw("Department of Cardiology", "10.1/x", None)],
    )
    .unwrap();

    let map_file = temp_dir.path().join("map.csv");
    fs::write(&map_file, "ENG,KOR\nCardiology,심장내과\n").unwrap();

    let mut opts = options(out_dir.clone());
    opts.map_file = Some(map_file);
    report::run(ReportArgs {
        org_name: "SNUH".to_string(),
        data_path: data_dir,
        options: opts,
    })
    .unwrap();

    let departments = read_table(&out_dir.join("SNUH_KOR.csv"));
    assert_eq!(departments[1][1], "심장내과");
    assert!(!out_dir.join("SNUH_IF_stats.csv").exists());
}

#[test]
fn test_report_run_fails_on_broken_override_file() {
    let temp_dir = TempDir::new().unwrap();
    let data_dir = temp_dir.path().join("data");
    fs::create_dir_all(&data_dir).unwrap();

    let mut opts = options(temp_dir.path().join("out"));
    opts.map_file = Some(temp_dir.path().join("missing.csv"));
    let result = report::run(ReportArgs {
        org_name: "SNUH".to_string(),
        data_path: data_dir,
        options: opts,
    });

    let err = result.unwrap_err();
    assert!(err.downcast_ref::<pubmed_impact::ConfigError>().is_some());
}

#[test]
fn test_report_run_skips_existing_table_unless_forced() {
    let temp_dir = TempDir::new().unwrap();
    let data_dir = temp_dir.path().join("data");
    let out_dir = temp_dir.path().join("out");
    fs::create_dir_all(&data_dir).unwrap();
    fs::create_dir_all(&out_dir).unwrap();
    write_table(
        &data_dir.join("SNUH_2021_1-2.csv"),
        &[raw("Department of Urology", "10.1/x", None)],
    )
    .unwrap();

    let existing = out_dir.join("SNUH_KOR.csv");
    fs::write(&existing, "keep me").unwrap();

    report::run(ReportArgs {
        org_name: "SNUH".to_string(),
        data_path: data_dir.clone(),
        options: options(out_dir.clone()),
    })
    .unwrap();
    assert_eq!(fs::read_to_string(&existing).unwrap(), "keep me");

    let mut opts = options(out_dir);
    opts.force = true;
    report::run(ReportArgs {
        org_name: "SNUH".to_string(),
        data_path: data_dir,
        options: opts,
    })
    .unwrap();
    assert_eq!(read_table(&existing)[1][1], "비뇨의학과");
}

#[test]
fn test_report_run_rejects_missing_data_directory() {
    let temp_dir = TempDir::new().unwrap();
    let out_dir = temp_dir.path().join("out");

    let result = report::run(ReportArgs {
        org_name: "SNUH".to_string(),
        data_path: temp_dir.path().join("typo_does_not_exist"),
        options: options(out_dir.clone()),
    });

    let err = result.unwrap_err();
    assert!(err.to_string().contains("does not exist or is not a directory"));
    assert!(!out_dir.join("SNUH_KOR.csv").exists());
}

#[test]
fn test_report_run_rejects_file_as_data_directory() {
    let temp_dir = TempDir::new().unwrap();
    let file = temp_dir.path().join("raw.csv");
    fs::write(&file, "").unwrap();
    let out_dir = temp_dir.path().join("out");

    let result = report::run(ReportArgs {
        org_name: "SNUH".to_string(),
        data_path: file,
        options: options(out_dir.clone()),
    });

    assert!(result.is_err());
    assert!(!out_dir.join("SNUH_KOR.csv").exists());
}
