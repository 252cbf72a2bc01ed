//! Current and projected strength rankings.
//!
//! Usage: forcecast [metrics.csv] [budget.csv] [--top N] [--target YEAR] [--json]

use anyhow::{bail, Context, Result};
use serde_json::json;
use std::path::Path;

use forcecast::config::Config;
use forcecast::data::{load_budgets, load_metrics};
use forcecast::engine::run_projection;
use forcecast::logging::{log, obj, v_str, Domain, Level};

fn main() -> Result<()> {
    let mut cfg = Config::from_env();
    let mut as_json = false;
    let mut positional = Vec::new();

    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--json" => as_json = true,
            "--top" => {
                let v = args.next().context("--top needs a value")?;
                cfg.top_n = v.parse().with_context(|| format!("bad --top value {}", v))?;
            }
            "--target" => {
                let v = args.next().context("--target needs a value")?;
                cfg.target_year = v.parse().with_context(|| format!("bad --target value {}", v))?;
            }
            other if other.starts_with("--") => bail!("unknown flag {}", other),
            _ => positional.push(arg),
        }
    }
    if let Some(p) = positional.first() {
        cfg.metrics_csv = p.clone();
    }
    if let Some(p) = positional.get(1) {
        cfg.budget_csv = p.clone();
    }

    log(
        Level::Info,
        Domain::System,
        "startup",
        obj(&[
            ("metrics_csv", v_str(&cfg.metrics_csv)),
            ("budget_csv", v_str(&cfg.budget_csv)),
            ("target_year", json!(cfg.target_year)),
            ("top_n", json!(cfg.top_n)),
        ]),
    );

    let metrics = load_metrics(Path::new(&cfg.metrics_csv))?;
    let budgets = load_budgets(Path::new(&cfg.budget_csv))?;
    let report = run_projection(&metrics.rows, &budgets.rows, cfg.projection_params())?;

    if as_json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    if report.current.is_empty() {
        println!("No country has all indicators; nothing to rank.");
        return Ok(());
    }

    let p = report.params;
    println!(
        "{:<4} {:<28} {:>10}   {:<28} {:>10}",
        "#",
        format!("Current ({})", p.base_year),
        "Strength",
        format!("Projected ({})", p.target_year),
        "Score"
    );
    println!("{}", "-".repeat(86));
    for (i, (cur, proj)) in report
        .current_top()
        .iter()
        .zip(report.projected_top())
        .enumerate()
    {
        println!(
            "{:<4} {:<28} {:>10.4}   {:<28} {:>10.4}",
            i + 1,
            cur.country,
            cur.strength_score,
            proj.country,
            proj.projection_score
        );
    }

    println!();
    println!("Rank changes ({} -> {})", p.base_year, p.target_year);
    for change in &report.changes {
        let arrow = match change.delta() {
            d if d > 0 => format!("+{}", d),
            0 => "=".to_string(),
            d => d.to_string(),
        };
        println!(
            "  {:<28} {:>3} -> {:>3}  {}",
            change.country, change.current_rank, change.projected_rank, arrow
        );
    }
    Ok(())
}
