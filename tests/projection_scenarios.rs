//! End-to-end ranking scenarios, loaded from CSV the way the binary does.

use forcecast::data::{load_budgets, load_metrics};
use forcecast::engine::{
    compute_current_ranking, compute_growth_trend, project_future, run_projection,
    ProjectionParams, BASE_YEAR,
};
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

const METRICS_HEADER: &str = "country,pwr_index,total_national_populations,active_service_military_manpower,total_military_aircraft_strength,total_combat_tank_strength,navy_strength,national_annual_defense_budgets,purchasing_power_parities";

fn budget_header() -> String {
    let years: Vec<String> = (1995..=2020).map(|y| y.to_string()).collect();
    format!("Country Name,Country Code,{}", years.join(","))
}

fn budget_row(name: &str, f: impl Fn(i32) -> Option<f64>) -> String {
    let cells: Vec<String> = (1995..=2020)
        .map(|y| f(y).map(|v| v.to_string()).unwrap_or_default())
        .collect();
    format!("{},XXX,{}", name, cells.join(","))
}

fn write_tables(dir: &TempDir, metrics: &[&str], budgets: &[String]) -> (PathBuf, PathBuf) {
    let m = dir.path().join("metrics.csv");
    let b = dir.path().join("budget.csv");
    let mut mbody = format!("{}\n", METRICS_HEADER);
    for row in metrics {
        mbody.push_str(row);
        mbody.push('\n');
    }
    let mut bbody = format!("{}\n", budget_header());
    for row in budgets {
        bbody.push_str(row);
        bbody.push('\n');
    }
    fs::write(&m, mbody).unwrap();
    fs::write(&b, bbody).unwrap();
    (m, b)
}

#[test]
fn strong_grower_beats_flat_and_incomplete_is_dropped() {
    let dir = TempDir::new().unwrap();
    let (m, b) = write_tables(
        &dir,
        &[
            "A,0.1,900,90,900,900,90,9000,900",
            "B,0.5,500,50,500,500,50,5000,500",
            "C,0.3,700,70,,700,70,7000,700",
        ],
        &[
            budget_row("A", |y| Some(1.0 + 0.2 * (y - 2000) as f64)),
            budget_row("B", |_| Some(2.0)),
            budget_row("C", |y| Some(10.0 * (y - 2000) as f64)),
        ],
    );
    let metrics = load_metrics(&m).unwrap();
    let budgets = load_budgets(&b).unwrap();

    let current = compute_current_ranking(&metrics.rows);
    assert_eq!(current.len(), 2);
    assert!(current.iter().all(|s| s.country != "C"));
    assert_eq!(current[0].country, "A");
    assert!(current[0].strength_score > current[1].strength_score);

    let grown = compute_growth_trend(current, &budgets.rows);
    let a = grown.iter().find(|s| s.country == "A").unwrap().clone();
    let b_row = grown.iter().find(|s| s.country == "B").unwrap().clone();
    assert!((a.growth_slope - 0.2).abs() < 1e-9);
    assert!(b_row.growth_slope.abs() < 1e-12);
    assert!(a.growth_norm > b_row.growth_norm);

    let projected = project_future(grown, BASE_YEAR + 5, BASE_YEAR).unwrap();
    assert!(projected.iter().all(|s| s.country != "C"));
    let a_proj = projected.iter().find(|s| s.country == "A").unwrap();
    assert!((a_proj.projected_strength - a_proj.strength_score - a.growth_norm).abs() < 1e-12);
    assert_eq!(projected[0].country, "A");
}

#[test]
fn four_budget_values_give_zero_slope() {
    let dir = TempDir::new().unwrap();
    let (m, b) = write_tables(
        &dir,
        &["A,0.1,900,90,900,900,90,9000,900", "B,0.5,500,50,500,500,50,5000,500"],
        &[
            // steep rise, but only four values inside 2000-2020
            budget_row("A", |y| match y {
                1995..=1999 => Some(1.0),
                2001 | 2008 | 2013 | 2019 => Some(100.0 * (y - 2000) as f64),
                _ => None,
            }),
            budget_row("B", |y| Some((y - 2000) as f64)),
        ],
    );
    let metrics = load_metrics(&m).unwrap();
    let budgets = load_budgets(&b).unwrap();
    let grown = compute_growth_trend(compute_current_ranking(&metrics.rows), &budgets.rows);
    let a = grown.iter().find(|s| s.country == "A").unwrap();
    assert_eq!(a.growth_slope, 0.0);
    assert_eq!(a.growth_norm, 0.0);
}

#[test]
fn malformed_cells_exclude_without_failing() {
    let dir = TempDir::new().unwrap();
    let (m, b) = write_tables(
        &dir,
        &[
            "A,0.1,900,90,900,900,90,9000,900",
            "B,0.5,500,fifty,500,500,50,5000,500",
            "C,0.3,100,10,100,100,10,1000,100",
        ],
        &[budget_row("A", |_| Some(1.0))],
    );
    let metrics = load_metrics(&m).unwrap();
    let budgets = load_budgets(&b).unwrap();
    let report = run_projection(&metrics.rows, &budgets.rows, ProjectionParams::default()).unwrap();
    let names: Vec<&str> = report.current.iter().map(|s| s.country.as_str()).collect();
    assert_eq!(names, vec!["A", "C"]);
    assert!(report.current.iter().all(|s| s.growth_norm == 0.0));
}

#[test]
fn nothing_complete_gives_empty_report() {
    let dir = TempDir::new().unwrap();
    let (m, b) = write_tables(&dir, &["A,0.1,,,,,,,"], &[]);
    let metrics = load_metrics(&m).unwrap();
    let budgets = load_budgets(&b).unwrap();
    let report = run_projection(&metrics.rows, &budgets.rows, ProjectionParams::default()).unwrap();
    assert!(report.current.is_empty());
    assert!(report.projected.is_empty());
    assert!(report.changes.is_empty());
}

#[test]
fn power_index_breaks_otherwise_equal_projection() {
    let dir = TempDir::new().unwrap();
    let (m, b) = write_tables(
        &dir,
        &[
            "Weak,2.0,500,50,500,500,50,5000,500",
            "Strong,0.5,500,50,500,500,50,5000,500",
        ],
        &[],
    );
    let metrics = load_metrics(&m).unwrap();
    let budgets = load_budgets(&b).unwrap();
    let report = run_projection(
        &metrics.rows,
        &budgets.rows,
        ProjectionParams { top_n: 1, ..ProjectionParams::default() },
    )
    .unwrap();
    // equal strength keeps input order; the damped power index reorders
    assert_eq!(report.current[0].country, "Weak");
    assert_eq!(report.projected[0].country, "Strong");
    assert_eq!(report.changes.len(), 2);
    let strong = report.changes.iter().find(|c| c.country == "Strong").unwrap();
    assert_eq!((strong.current_rank, strong.projected_rank), (11, 1));
}

#[test]
fn report_serializes() {
    let dir = TempDir::new().unwrap();
    let (m, b) = write_tables(&dir, &["A,0.1,900,90,900,900,90,9000,900"], &[]);
    let metrics = load_metrics(&m).unwrap();
    let budgets = load_budgets(&b).unwrap();
    let report = run_projection(&metrics.rows, &budgets.rows, ProjectionParams::default()).unwrap();
    let v: serde_json::Value = serde_json::to_value(&report).unwrap();
    assert_eq!(v["current"][0]["country"], "A");
    assert_eq!(v["params"]["target_year"], 2047);
}
