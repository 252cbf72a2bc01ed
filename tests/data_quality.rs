use forcecast::data::{analyze_csv, load_budgets, load_metrics, validate_schema, TableKind};
use forcecast::model::Indicator;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn write_csv(path: &Path, header: &[&str], rows: &[&str]) {
    let mut out = String::new();
    out.push_str(&header.join(","));
    out.push('\n');
    for row in rows {
        out.push_str(row);
        out.push('\n');
    }
    fs::write(path, out).unwrap();
}

fn metrics_header() -> Vec<&'static str> {
    let mut h = vec!["country", "pwr_index"];
    h.extend(Indicator::ALL.iter().map(|i| i.column()));
    h
}

#[test]
fn schema_accepts_good_header() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("good.csv");
    write_csv(&path, &metrics_header(), &["A,0.1,1,2,3,4,5,6,7"]);
    let report = validate_schema(&path, TableKind::Metrics).unwrap();
    assert!(report.ok, "{}", report.message);
    assert!(report.missing.is_empty());
}

#[test]
fn schema_rejects_missing_indicator() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("bad.csv");
    write_csv(&path, &["country", "pwr_index", "navy_strength"], &["A,0.1,3"]);
    let report = validate_schema(&path, TableKind::Metrics).unwrap();
    assert!(!report.ok);
    assert!(report.missing.contains(&"total_combat_tank_strength".to_string()));
}

#[test]
fn budget_schema_needs_year_columns() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("budget.csv");
    write_csv(&path, &["Country Name", "Country Code"], &["A,AAA"]);
    let report = validate_schema(&path, TableKind::Budget).unwrap();
    assert!(!report.ok);
    assert!(report.message.contains("year"));
}

#[test]
fn manifest_counts_coerced_cells() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("metrics.csv");
    write_csv(
        &path,
        &metrics_header(),
        &["A,0.1,1,2,3,4,5,6,7", "B,0.2,1,x,3,,5,6,7", ",0.3,1,2,3,4,5,6,7"],
    );
    let (manifest, report) = analyze_csv(&path, TableKind::Metrics, 42).unwrap();
    assert_eq!(manifest.row_count, 2);
    assert_eq!(manifest.bad_rows, 1);
    assert_eq!(manifest.generated_at_epoch, 42);
    assert_eq!(report.coerced_cells, 1);
    assert_eq!(manifest.hash_sha256.len(), 64);
}

#[test]
fn budget_manifest_year_range() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("budget.csv");
    write_csv(
        &path,
        &["Country Name", "Country Code", "1998", "1999", "2000"],
        &["A,AAA,,1.0,2.0", "B,BBB,0.5,,"],
    );
    let (manifest, _report) = analyze_csv(&path, TableKind::Budget, 0).unwrap();
    assert_eq!(manifest.year_min, Some(1998));
    assert_eq!(manifest.year_max, Some(2000));
    assert!(manifest.warnings.iter().any(|w| w.starts_with("missing_year_columns")));
}

#[test]
fn loaders_report_missing_files() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("nope.csv");
    let err = load_metrics(&missing).unwrap_err();
    assert!(format!("{:#}", err).contains("nope.csv"));
    assert!(load_budgets(&missing).is_err());
}
