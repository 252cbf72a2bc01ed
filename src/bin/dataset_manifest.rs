//! Schema check and manifest for a source table.
//!
//! Usage: dataset_manifest <metrics|budget|trade|companies> [file.csv]
//!
//! Without a file the configured path for that table is used.

use forcecast::config::Config;
use forcecast::data::{analyze_csv, default_manifest_path, validate_schema, TableKind};
use serde_json::json;
use std::env;
use std::fs;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

fn default_path(cfg: &Config, kind: TableKind) -> String {
    match kind {
        TableKind::Metrics => cfg.metrics_csv.clone(),
        TableKind::Budget => cfg.budget_csv.clone(),
        TableKind::Trade => cfg.trade_csv.clone(),
        TableKind::Companies => cfg.companies_csv.clone(),
    }
}

fn main() {
    let args: Vec<String> = env::args().collect();
    let kind = match args.get(1).and_then(|k| TableKind::parse(k)) {
        Some(k) => k,
        None => {
            eprintln!("usage: dataset_manifest <metrics|budget|trade|companies> [file.csv]");
            std::process::exit(1);
        }
    };
    let path = PathBuf::from(match args.get(2) {
        Some(p) => p.clone(),
        None => default_path(&Config::from_env(), kind),
    });

    let now_ts = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);

    let schema = match validate_schema(&path, kind) {
        Ok(s) => s,
        Err(err) => {
            eprintln!("schema check failed: {:#}", err);
            std::process::exit(1);
        }
    };

    if !schema.ok {
        eprintln!("{}", schema.message);
        eprintln!("expected columns: {:?}", kind.required_columns());
        std::process::exit(2);
    }

    let (manifest, report) = match analyze_csv(&path, kind, now_ts) {
        Ok(m) => m,
        Err(err) => {
            eprintln!("analysis failed: {:#}", err);
            std::process::exit(3);
        }
    };

    let out_path = default_manifest_path(&path);
    let payload = json!({
        "manifest": manifest,
        "report": report
    });
    let body = match serde_json::to_string_pretty(&payload) {
        Ok(b) => b,
        Err(err) => {
            eprintln!("failed to encode manifest: {}", err);
            std::process::exit(4);
        }
    };
    if let Err(err) = fs::write(&out_path, body) {
        eprintln!("failed to write {}: {}", out_path.display(), err);
        std::process::exit(4);
    }
    println!(
        "wrote manifest {} (rows={} bad_rows={} coerced_cells={})",
        out_path.display(),
        report.rows,
        report.bad_rows,
        report.coerced_cells
    );
}
