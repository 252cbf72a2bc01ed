//! Source table access: loaders plus dataset manifests and schema checks.

pub mod tables;

pub use tables::{
    load_budgets, load_companies, load_metrics, load_trade, parse_cell, read_budgets,
    read_companies, read_metrics, read_trade, LoadReport, Loaded,
};

use anyhow::{Context, Result};
use csv::{ReaderBuilder, Trim};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use crate::model::Indicator;
use tables::{
    clean_header, year_column, BUDGET_COUNTRY_COLUMN, COMPANY_COUNTRY_COLUMN,
    COMPANY_NAME_COLUMN, COMPANY_REVENUE_COLUMN, COMPANY_YEAR_COLUMN, METRICS_COUNTRY_COLUMN,
    PWR_INDEX_COLUMN, TRADE_COUNTRY_COLUMN, TRADE_EXPORT_COLUMN, TRADE_IMPORT_COLUMN, TRADE_YEAR_COLUMN,
};

/// Which source table a CSV is expected to hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TableKind {
    Metrics,
    Budget,
    Trade,
    Companies,
}

impl TableKind {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "metrics" | "strength" => Some(TableKind::Metrics),
            "budget" => Some(TableKind::Budget),
            "trade" => Some(TableKind::Trade),
            "companies" => Some(TableKind::Companies),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TableKind::Metrics => "metrics",
            TableKind::Budget => "budget",
            TableKind::Trade => "trade",
            TableKind::Companies => "companies",
        }
    }

    /// Columns that must be present. Budget year columns are checked separately.
    pub fn required_columns(&self) -> Vec<String> {
        match self {
            TableKind::Metrics => {
                let mut cols = vec![
                    METRICS_COUNTRY_COLUMN.to_string(),
                    PWR_INDEX_COLUMN.to_string(),
                ];
                cols.extend(Indicator::ALL.iter().map(|i| i.column().to_string()));
                cols
            }
            TableKind::Budget => vec![BUDGET_COUNTRY_COLUMN.to_string()],
            TableKind::Trade => [
                TRADE_COUNTRY_COLUMN,
                TRADE_YEAR_COLUMN,
                TRADE_EXPORT_COLUMN,
                TRADE_IMPORT_COLUMN,
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            TableKind::Companies => [
                COMPANY_YEAR_COLUMN,
                COMPANY_NAME_COLUMN,
                COMPANY_COUNTRY_COLUMN,
                COMPANY_REVENUE_COLUMN,
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetManifest {
    pub path: String,
    pub kind: TableKind,
    pub hash_sha256: String,
    pub row_count: u64,
    pub bad_rows: u64,
    pub columns: Vec<String>,
    pub year_min: Option<i32>,
    pub year_max: Option<i32>,
    pub warnings: Vec<String>,
    pub generated_at_epoch: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaReport {
    pub columns: Vec<String>,
    pub missing: Vec<String>,
    pub ok: bool,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataQualityReport {
    pub rows: u64,
    pub bad_rows: u64,
    /// Non-empty numeric cells that will be treated as missing.
    pub coerced_cells: u64,
    pub warnings: Vec<String>,
}

pub fn read_header(path: &Path) -> Result<Vec<String>> {
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let mut rdr = ReaderBuilder::new().trim(Trim::All).from_reader(file);
    let headers = rdr.headers().context("reading csv header")?;
    Ok(headers.iter().map(clean_header).collect())
}

pub fn validate_schema(path: &Path, kind: TableKind) -> Result<SchemaReport> {
    let header = read_header(path)?;
    let missing: Vec<String> = kind
        .required_columns()
        .into_iter()
        .filter(|c| !header.contains(c))
        .collect();
    let mut ok = missing.is_empty();
    let mut message = if ok {
        "schema ok".to_string()
    } else {
        format!("schema mismatch: missing {:?}", missing)
    };
    if ok && kind == TableKind::Budget && !header.iter().any(|h| year_column(h).is_some()) {
        ok = false;
        message = "schema mismatch: no year columns".to_string();
    }
    Ok(SchemaReport {
        columns: header,
        missing,
        ok,
        message,
    })
}

/// Load the table the way the pipeline would and summarize what was dropped.
pub fn analyze_csv(
    path: &Path,
    kind: TableKind,
    now_ts: u64,
) -> Result<(DatasetManifest, DataQualityReport)> {
    let hash = file_sha256(path)?;
    let columns = read_header(path)?;
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;

    let (report, years): (LoadReport, Vec<i32>) = match kind {
        TableKind::Metrics => (read_metrics(file)?.report, Vec::new()),
        TableKind::Budget => {
            let loaded = read_budgets(file)?;
            let years = loaded
                .rows
                .iter()
                .flat_map(|s| s.values.keys().copied())
                .collect();
            (loaded.report, years)
        }
        TableKind::Trade => {
            let loaded = read_trade(file)?;
            let years = loaded.rows.iter().map(|r| r.year).collect();
            (loaded.report, years)
        }
        TableKind::Companies => {
            let loaded = read_companies(file)?;
            let years = loaded.rows.iter().map(|r| r.year).collect();
            (loaded.report, years)
        }
    };

    let manifest = DatasetManifest {
        path: path.display().to_string(),
        kind,
        hash_sha256: hash,
        row_count: report.rows as u64,
        bad_rows: report.skipped_rows as u64,
        columns,
        year_min: years.iter().copied().min(),
        year_max: years.iter().copied().max(),
        warnings: report.warnings.clone(),
        generated_at_epoch: now_ts,
    };
    let quality = DataQualityReport {
        rows: report.rows as u64,
        bad_rows: report.skipped_rows as u64,
        coerced_cells: report.coerced_cells as u64,
        warnings: report.warnings,
    };
    Ok((manifest, quality))
}

pub fn file_sha256(path: &Path) -> Result<String> {
    let mut file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let mut hasher = Sha256::new();
    let mut buf = [0u8; 8192];
    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hex::encode(hasher.finalize()))
}

pub fn default_manifest_path(dataset_path: &Path) -> PathBuf {
    let mut p = dataset_path.to_path_buf();
    let fname = dataset_path
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or("dataset.csv");
    p.set_file_name(format!("{}.manifest.json", fname));
    p
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_kind_parse() {
        assert_eq!(TableKind::parse("Budget"), Some(TableKind::Budget));
        assert_eq!(TableKind::parse("strength"), Some(TableKind::Metrics));
        assert_eq!(TableKind::parse("companies"), Some(TableKind::Companies));
        assert_eq!(TableKind::parse("xlsx"), None);
    }

    #[test]
    fn metrics_required_columns_cover_indicators() {
        let cols = TableKind::Metrics.required_columns();
        assert_eq!(cols.len(), 9);
        assert!(cols.contains(&"navy_strength".to_string()));
    }

    #[test]
    fn manifest_path_sits_next_to_dataset() {
        let p = default_manifest_path(Path::new("data/budget.csv"));
        assert_eq!(p, PathBuf::from("data/budget.csv.manifest.json"));
    }
}
