//! CSV loaders for the source tables.
//!
//! Numeric cells go through [`parse_cell`]: anything that is not a finite
//! number becomes `None`. Only structural problems (unreadable file, missing
//! key columns) are errors.

use anyhow::{bail, Context, Result};
use csv::{ReaderBuilder, StringRecord, Trim};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::companies::CompanyRecord;
use crate::logging::log_table_loaded;
use crate::model::{BudgetSeries, CountryMetrics, Indicator};
use crate::trade::TradeRecord;

pub const METRICS_COUNTRY_COLUMN: &str = "country";
pub const PWR_INDEX_COLUMN: &str = "pwr_index";
pub const BUDGET_COUNTRY_COLUMN: &str = "Country Name";
pub const BUDGET_CODE_COLUMN: &str = "Country Code";
pub const TRADE_COUNTRY_COLUMN: &str = "country";
pub const TRADE_YEAR_COLUMN: &str = "financial_year(start)";
pub const TRADE_EXPORT_COLUMN: &str = "export";
pub const TRADE_IMPORT_COLUMN: &str = "import";
pub const TRADE_BALANCE_COLUMN: &str = "trade_balance";
pub const COMPANY_YEAR_COLUMN: &str = "Year";
pub const COMPANY_NAME_COLUMN: &str = "Company";
pub const COMPANY_COUNTRY_COLUMN: &str = "Country";
pub const COMPANY_REVENUE_COLUMN: &str = "Defense_Revenue_From_A_Year_Ago";
pub const COMPANY_TOTAL_REVENUE_COLUMN: &str = "Total Revenue";
pub const COMPANY_SHARE_COLUMN: &str = "%of Revenue from Defence";

/// Year columns the budget table is expected to cover.
pub const BUDGET_FIRST_YEAR: i32 = 1960;
pub const BUDGET_LAST_YEAR: i32 = 2020;

/// Parse-or-null numeric coercion.
pub fn parse_cell(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Header text with surrounding whitespace and a leading BOM removed.
pub(crate) fn clean_header(raw: &str) -> String {
    raw.trim_start_matches('\u{feff}').trim().to_string()
}

fn header_index(headers: &[String], name: &str) -> Option<usize> {
    headers.iter().position(|h| h == name)
}

fn field<'a>(record: &'a StringRecord, idx: Option<usize>) -> Option<&'a str> {
    idx.and_then(|i| record.get(i))
}

/// What a loader saw while reading a table.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoadReport {
    pub rows: usize,
    pub skipped_rows: usize,
    /// Non-empty cells that failed numeric coercion.
    pub coerced_cells: usize,
    pub warnings: Vec<String>,
}

impl LoadReport {
    fn coerce(&mut self, raw: Option<&str>) -> Option<f64> {
        let raw = raw?;
        let parsed = parse_cell(raw);
        if parsed.is_none() && !raw.trim().is_empty() {
            self.coerced_cells += 1;
        }
        parsed
    }
}

#[derive(Debug, Clone)]
pub struct Loaded<T> {
    pub rows: Vec<T>,
    pub report: LoadReport,
}

fn csv_reader<R: Read>(reader: R) -> csv::Reader<R> {
    ReaderBuilder::new()
        .flexible(true)
        .trim(Trim::All)
        .from_reader(reader)
}

fn read_headers<R: Read>(rdr: &mut csv::Reader<R>) -> Result<Vec<String>> {
    let headers = rdr.headers().context("reading csv header")?;
    Ok(headers.iter().map(clean_header).collect())
}

// =============================================================================
// Country indicators
// =============================================================================

pub fn read_metrics<R: Read>(reader: R) -> Result<Loaded<CountryMetrics>> {
    let mut rdr = csv_reader(reader);
    let headers = read_headers(&mut rdr)?;

    let country_idx = match header_index(&headers, METRICS_COUNTRY_COLUMN) {
        Some(i) => i,
        None => bail!("metrics table has no '{}' column", METRICS_COUNTRY_COLUMN),
    };
    let missing: Vec<&str> = Indicator::ALL
        .iter()
        .map(|ind| ind.column())
        .filter(|col| header_index(&headers, col).is_none())
        .collect();
    if !missing.is_empty() {
        bail!("metrics table is missing indicator columns: {}", missing.join(", "));
    }
    let indicator_idx: Vec<Option<usize>> = Indicator::ALL
        .iter()
        .map(|ind| header_index(&headers, ind.column()))
        .collect();
    let pwr_idx = header_index(&headers, PWR_INDEX_COLUMN);

    let mut report = LoadReport::default();
    if pwr_idx.is_none() {
        report
            .warnings
            .push(format!("missing_column: {}", PWR_INDEX_COLUMN));
    }

    let mut rows = Vec::new();
    for (line, record) in rdr.records().enumerate() {
        let record = match record {
            Ok(r) => r,
            Err(err) => {
                report.skipped_rows += 1;
                report.warnings.push(format!("bad_row {}: {}", line + 2, err));
                continue;
            }
        };
        let country = match field(&record, Some(country_idx)) {
            Some(c) if !c.is_empty() => c,
            _ => {
                report.skipped_rows += 1;
                report.warnings.push(format!("bad_row {}: empty country", line + 2));
                continue;
            }
        };
        let mut metrics = CountryMetrics::new(country);
        for (ind, idx) in Indicator::ALL.iter().zip(indicator_idx.iter()) {
            let value = report.coerce(field(&record, *idx));
            metrics.set(*ind, value);
        }
        metrics.pwr_index = report.coerce(field(&record, pwr_idx));
        rows.push(metrics);
    }
    report.rows = rows.len();
    Ok(Loaded { rows, report })
}

pub fn load_metrics(path: &Path) -> Result<Loaded<CountryMetrics>> {
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let loaded = read_metrics(file).with_context(|| format!("loading {}", path.display()))?;
    log_table_loaded(
        "metrics",
        &path.display().to_string(),
        loaded.rows.len(),
        loaded.report.warnings.len(),
    );
    Ok(loaded)
}

// =============================================================================
// Budget series
// =============================================================================

/// Year encoded in a budget header, e.g. `"1999"` or `"1999.0"`.
pub fn year_column(header: &str) -> Option<i32> {
    let h = header.trim();
    let h = h.strip_suffix(".0").unwrap_or(h);
    if h.len() != 4 {
        return None;
    }
    h.parse::<i32>().ok()
}

pub fn read_budgets<R: Read>(reader: R) -> Result<Loaded<BudgetSeries>> {
    let mut rdr = csv_reader(reader);
    let headers = read_headers(&mut rdr)?;

    let name_idx = match header_index(&headers, BUDGET_COUNTRY_COLUMN) {
        Some(i) => i,
        None => bail!("budget table has no '{}' column", BUDGET_COUNTRY_COLUMN),
    };
    let code_idx = header_index(&headers, BUDGET_CODE_COLUMN);
    let years: Vec<(usize, i32)> = headers
        .iter()
        .enumerate()
        .filter_map(|(i, h)| year_column(h).map(|y| (i, y)))
        .collect();

    let mut report = LoadReport::default();
    if code_idx.is_none() {
        report
            .warnings
            .push(format!("missing_column: {}", BUDGET_CODE_COLUMN));
    }
    let absent: Vec<String> = (BUDGET_FIRST_YEAR..=BUDGET_LAST_YEAR)
        .filter(|y| !years.iter().any(|(_, yy)| yy == y))
        .map(|y| y.to_string())
        .collect();
    if !absent.is_empty() {
        report
            .warnings
            .push(format!("missing_year_columns: {}", absent.join(",")));
    }

    let mut rows = Vec::new();
    for (line, record) in rdr.records().enumerate() {
        let record = match record {
            Ok(r) => r,
            Err(err) => {
                report.skipped_rows += 1;
                report.warnings.push(format!("bad_row {}: {}", line + 2, err));
                continue;
            }
        };
        let name = match field(&record, Some(name_idx)) {
            Some(n) if !n.is_empty() => n,
            _ => {
                report.skipped_rows += 1;
                report.warnings.push(format!("bad_row {}: empty country", line + 2));
                continue;
            }
        };
        let mut series = BudgetSeries::new(name);
        series.country_code = field(&record, code_idx)
            .filter(|c| !c.is_empty())
            .map(str::to_string);
        for (idx, year) in &years {
            if let Some(v) = report.coerce(record.get(*idx)) {
                series.values.insert(*year, v);
            }
        }
        rows.push(series);
    }
    report.rows = rows.len();
    Ok(Loaded { rows, report })
}

pub fn load_budgets(path: &Path) -> Result<Loaded<BudgetSeries>> {
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let loaded = read_budgets(file).with_context(|| format!("loading {}", path.display()))?;
    log_table_loaded(
        "budget",
        &path.display().to_string(),
        loaded.rows.len(),
        loaded.report.warnings.len(),
    );
    Ok(loaded)
}

// =============================================================================
// Trade flows
// =============================================================================

pub fn read_trade<R: Read>(reader: R) -> Result<Loaded<TradeRecord>> {
    let mut rdr = csv_reader(reader);
    let headers = read_headers(&mut rdr)?;

    let mut required = Vec::new();
    for col in [
        TRADE_COUNTRY_COLUMN,
        TRADE_YEAR_COLUMN,
        TRADE_EXPORT_COLUMN,
        TRADE_IMPORT_COLUMN,
    ] {
        match header_index(&headers, col) {
            Some(i) => required.push(i),
            None => bail!("trade table has no '{}' column", col),
        }
    }
    let (country_idx, year_idx, export_idx, import_idx) =
        (required[0], required[1], required[2], required[3]);
    let balance_idx = header_index(&headers, TRADE_BALANCE_COLUMN);

    let mut report = LoadReport::default();
    let mut rows = Vec::new();
    for (line, record) in rdr.records().enumerate() {
        let record = match record {
            Ok(r) => r,
            Err(err) => {
                report.skipped_rows += 1;
                report.warnings.push(format!("bad_row {}: {}", line + 2, err));
                continue;
            }
        };
        let country = field(&record, Some(country_idx)).unwrap_or("");
        let year = report
            .coerce(field(&record, Some(year_idx)))
            .filter(|y| y.fract() == 0.0)
            .map(|y| y as i32);
        let (country, year) = match (country, year) {
            ("", _) | (_, None) => {
                report.skipped_rows += 1;
                report
                    .warnings
                    .push(format!("bad_row {}: missing country or year", line + 2));
                continue;
            }
            (c, Some(y)) => (c, y),
        };
        let export = report.coerce(field(&record, Some(export_idx)));
        let import = report.coerce(field(&record, Some(import_idx)));
        let trade_balance = report.coerce(field(&record, balance_idx));
        rows.push(TradeRecord {
            country: country.to_string(),
            year,
            export,
            import,
            trade_balance,
        });
    }
    report.rows = rows.len();
    Ok(Loaded { rows, report })
}

pub fn load_trade(path: &Path) -> Result<Loaded<TradeRecord>> {
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let loaded = read_trade(file).with_context(|| format!("loading {}", path.display()))?;
    log_table_loaded(
        "trade",
        &path.display().to_string(),
        loaded.rows.len(),
        loaded.report.warnings.len(),
    );
    Ok(loaded)
}

// =============================================================================
// Defence companies
// =============================================================================

/// Company names are loaded as written; see
/// [`crate::companies::normalize_companies`].
pub fn read_companies<R: Read>(reader: R) -> Result<Loaded<CompanyRecord>> {
    let mut rdr = csv_reader(reader);
    let headers = read_headers(&mut rdr)?;

    let mut required = Vec::new();
    for col in [
        COMPANY_YEAR_COLUMN,
        COMPANY_NAME_COLUMN,
        COMPANY_COUNTRY_COLUMN,
        COMPANY_REVENUE_COLUMN,
    ] {
        match header_index(&headers, col) {
            Some(i) => required.push(i),
            None => bail!("companies table has no '{}' column", col),
        }
    }
    let (year_idx, name_idx, country_idx, revenue_idx) =
        (required[0], required[1], required[2], required[3]);
    let total_idx = header_index(&headers, COMPANY_TOTAL_REVENUE_COLUMN);
    let share_idx = header_index(&headers, COMPANY_SHARE_COLUMN);

    let mut report = LoadReport::default();
    for (idx, col) in [
        (total_idx, COMPANY_TOTAL_REVENUE_COLUMN),
        (share_idx, COMPANY_SHARE_COLUMN),
    ] {
        if idx.is_none() {
            report.warnings.push(format!("missing_column: {}", col));
        }
    }

    let mut rows = Vec::new();
    for (line, record) in rdr.records().enumerate() {
        let record = match record {
            Ok(r) => r,
            Err(err) => {
                report.skipped_rows += 1;
                report.warnings.push(format!("bad_row {}: {}", line + 2, err));
                continue;
            }
        };
        let year = report
            .coerce(field(&record, Some(year_idx)))
            .filter(|y| y.fract() == 0.0)
            .map(|y| y as i32);
        let company = field(&record, Some(name_idx)).unwrap_or("");
        let country = field(&record, Some(country_idx)).unwrap_or("");
        let year = match year {
            Some(y) if !company.is_empty() && !country.is_empty() => y,
            _ => {
                report.skipped_rows += 1;
                report
                    .warnings
                    .push(format!("bad_row {}: missing year, company or country", line + 2));
                continue;
            }
        };
        rows.push(CompanyRecord {
            year,
            company: company.to_string(),
            country: country.to_string(),
            defense_revenue: report.coerce(field(&record, Some(revenue_idx))),
            total_revenue: report.coerce(field(&record, total_idx)),
            defense_share: report.coerce(field(&record, share_idx)),
        });
    }
    report.rows = rows.len();
    Ok(Loaded { rows, report })
}

pub fn load_companies(path: &Path) -> Result<Loaded<CompanyRecord>> {
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let loaded = read_companies(file).with_context(|| format!("loading {}", path.display()))?;
    log_table_loaded(
        "companies",
        &path.display().to_string(),
        loaded.rows.len(),
        loaded.report.warnings.len(),
    );
    Ok(loaded)
}
