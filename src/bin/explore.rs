//! Descriptive views over the source tables.
//!
//! Usage:
//!   explore overview
//!   explore top <indicator> [n]
//!   explore corr [indicator ...]
//!   explore budget <year> [country]
//!   explore bottom <year> [n]
//!   explore totals <start> <end> [n]
//!   explore trade [year] [n]
//!   explore balance <country>
//!   explore companies [countries|counts|leaders|ranked] [n]
//!   explore company [name]
//!
//! Table paths come from METRICS_CSV, BUDGET_CSV, TRADE_CSV and COMPANIES_CSV.

use anyhow::{bail, Context, Result};
use std::path::Path;

use forcecast::companies::{
    clean_company_name, company_counts_by_year, country_leaders, latest_year, leading_companies,
    normalize_companies, ranked_companies, revenue_trend, top_countries_by_year, CompanyRecord,
};
use forcecast::config::Config;
use forcecast::data::{load_budgets, load_companies, load_metrics, load_trade};
use forcecast::explore::{
    bottom_spenders, correlation_matrix, country_rank, decade_average, overview,
    top_bottom_totals, top_n_by_indicator, top_spenders, year_summary,
};
use forcecast::logging::{log, obj, v_str, Domain, Level};
use forcecast::model::Indicator;
use forcecast::trade::{balance_trend, partner_summary, years, DEFAULT_PARTNER_COUNT};

fn parse_indicator(name: &str) -> Result<Indicator> {
    Indicator::parse(name).with_context(|| format!("unknown indicator {}", name))
}

fn parse_year(raw: Option<&String>, what: &str) -> Result<i32> {
    raw.with_context(|| format!("{} needs a year", what))?
        .parse()
        .with_context(|| format!("bad year for {}", what))
}

fn companies(cfg: &Config) -> Result<Vec<CompanyRecord>> {
    let mut rows = load_companies(Path::new(&cfg.companies_csv))?.rows;
    normalize_companies(&mut rows);
    Ok(rows)
}

fn main() -> Result<()> {
    let cfg = Config::from_env();
    let args: Vec<String> = std::env::args().skip(1).collect();
    let cmd = args.first().map(|s| s.as_str()).unwrap_or("overview");
    log(Level::Debug, Domain::Explore, "command", obj(&[("cmd", v_str(cmd))]));

    match cmd {
        "overview" => {
            let metrics = load_metrics(Path::new(&cfg.metrics_csv))?;
            let o = overview(&metrics.rows, &cfg.excluded_countries);
            println!("Countries analyzed:      {}", o.countries_analyzed);
            println!(
                "Top military power:      {}",
                o.top_power.as_deref().unwrap_or("N/A")
            );
            println!(
                "Global defense spending: ${:.2}T",
                o.total_defense_budget / 1e12
            );
        }
        "top" => {
            let indicator = parse_indicator(args.get(1).context("top needs an indicator")?)?;
            let n: usize = args.get(2).and_then(|s| s.parse().ok()).unwrap_or(cfg.top_n);
            let metrics = load_metrics(Path::new(&cfg.metrics_csv))?;
            println!("Top {} by {}", n, indicator.column());
            let top = top_n_by_indicator(&metrics.rows, indicator, n);
            for (i, (country, value)) in top.iter().enumerate() {
                println!("{:>3}. {:<28} {:>18.2}", i + 1, country, value);
            }
        }
        "corr" => {
            let indicators = if args.len() > 1 {
                args[1..]
                    .iter()
                    .map(|s| parse_indicator(s))
                    .collect::<Result<Vec<_>>>()?
            } else {
                Indicator::ALL.to_vec()
            };
            let metrics = load_metrics(Path::new(&cfg.metrics_csv))?;
            let m = correlation_matrix(&metrics.rows, &indicators)?;
            print!("{:<18}", "");
            for ind in &m.indicators {
                print!("{:>18}", ind.short_name());
            }
            println!();
            for (ind, row) in m.indicators.iter().zip(&m.values) {
                print!("{:<18}", ind.short_name());
                for v in row {
                    match v {
                        Some(r) => print!("{:>18.2}", r),
                        None => print!("{:>18}", "-"),
                    }
                }
                println!();
            }
        }
        "budget" => {
            let year = parse_year(args.get(1), "budget")?;
            let focus = args.get(2).cloned().unwrap_or_else(|| cfg.focus_country.clone());
            let budgets = load_budgets(Path::new(&cfg.budget_csv))?;
            let Some(summary) = year_summary(&budgets.rows, year) else {
                bail!("no budget values for {}", year);
            };
            println!(
                "{}: n={} mean={:.2} median={:.2} min={:.2} max={:.2}",
                year, summary.count, summary.mean, summary.median, summary.min, summary.max
            );
            let top = top_spenders(&budgets.rows, year, cfg.top_n, Some(focus.as_str()));
            for (country, value) in top {
                println!("  {:<28} {:>8.2}", country, value);
            }
            match country_rank(&budgets.rows, year, &focus) {
                Some(rank) => println!("{} rank in {}: #{}", focus, year, rank),
                None => println!("{} has no value for {}", focus, year),
            }
            let decade = year - year.rem_euclid(10);
            if let Some(avg) = decade_average(&budgets.rows, &focus, decade) {
                println!("{} average {}s: {:.2}", focus, decade, avg);
            }
        }
        "bottom" => {
            let year = parse_year(args.get(1), "bottom")?;
            let n: usize = args.get(2).and_then(|s| s.parse().ok()).unwrap_or(5);
            let budgets = load_budgets(Path::new(&cfg.budget_csv))?;
            println!("Bottom {} spenders in {}", n, year);
            for (country, value) in bottom_spenders(&budgets.rows, year, n) {
                println!("  {:<28} {:>8.2}", country, value);
            }
        }
        "totals" => {
            let start = parse_year(args.get(1), "totals")?;
            let end = parse_year(args.get(2), "totals")?;
            let n: usize = args.get(3).and_then(|s| s.parse().ok()).unwrap_or(5);
            let budgets = load_budgets(Path::new(&cfg.budget_csv))?;
            let totals = top_bottom_totals(&budgets.rows, start, end, n)?;
            println!("Totals {}-{}", totals.start, totals.end);
            println!("  top:");
            for (country, value) in &totals.top {
                println!("    {:<28} {:>10.2}", country, value);
            }
            println!("  bottom:");
            for (country, value) in &totals.bottom {
                println!("    {:<28} {:>10.2}", country, value);
            }
        }
        "companies" => {
            let view = args.get(1).map(|s| s.as_str()).unwrap_or("countries");
            let n: usize = args.get(2).and_then(|s| s.parse().ok()).unwrap_or(cfg.top_n);
            let rows = companies(&cfg)?;
            let latest = latest_year(&rows).context("companies table is empty")?;
            match view {
                "countries" => {
                    for r in top_countries_by_year(&rows, n) {
                        println!("{}  {:<24} {:>14.2}", r.year, r.country, r.defense_revenue);
                    }
                }
                "counts" => {
                    for r in company_counts_by_year(&rows, n) {
                        println!("{}  {:<24} {:>4}", r.year, r.country, r.companies);
                    }
                }
                "leaders" => {
                    let per_country: usize =
                        args.get(3).and_then(|s| s.parse().ok()).unwrap_or(3);
                    println!("Leading countries and companies, {}", latest);
                    for l in country_leaders(&rows, latest, n, per_country) {
                        println!("{:<24} {:>14.2}", l.country, l.defense_revenue);
                        for (company, revenue) in &l.companies {
                            println!("  {:<40} {:>14.2}", company, revenue);
                        }
                    }
                }
                "ranked" => {
                    for r in ranked_companies(&rows, n).iter().filter(|r| r.year == latest) {
                        println!(
                            "{:>3}. {:<40} {:<18} {:>12.2} {:>12.2}",
                            r.rank, r.company, r.country, r.defense_revenue, r.total_revenue
                        );
                    }
                }
                other => bail!("unknown companies view {}", other),
            }
        }
        "company" => {
            let rows = companies(&cfg)?;
            let names: Vec<String> = match args.get(1) {
                Some(raw) => vec![clean_company_name(raw)],
                None => {
                    let latest = latest_year(&rows).context("companies table is empty")?;
                    leading_companies(&rows, latest, cfg.top_n)
                }
            };
            for name in names {
                let trend = revenue_trend(&rows, &name);
                if trend.is_empty() {
                    println!("{}: no rows", name);
                    continue;
                }
                println!("{}", name);
                for (year, revenue) in trend {
                    println!("  {}  {:>14.2}", year, revenue);
                }
            }
        }
        "trade" => {
            let trade = load_trade(Path::new(&cfg.trade_csv))?;
            let year: i32 = match args.get(1) {
                Some(y) => y.parse().context("bad year")?,
                None => *years(&trade.rows).last().context("trade table is empty")?,
            };
            let n: usize = args
                .get(2)
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_PARTNER_COUNT);
            println!("Top trading partners, FY {}", year);
            println!(
                "{:<24} {:>12} {:>12} {:>12} {:>12}",
                "Partner", "Import", "Export", "Total", "Balance"
            );
            for p in partner_summary(&trade.rows, year, n) {
                println!(
                    "{:<24} {:>12.2} {:>12.2} {:>12.2} {:>12.2}",
                    p.country, p.import, p.export, p.total_trade, p.balance
                );
            }
        }
        "balance" => {
            let country = args.get(1).context("balance needs a partner country")?;
            let trade = load_trade(Path::new(&cfg.trade_csv))?;
            let trend = balance_trend(&trade.rows, country);
            if trend.is_empty() {
                bail!("no trade rows for {}", country);
            }
            for (year, balance) in trend {
                println!("  FY {}  {:>12.2}", year, balance);
            }
        }
        other => bail!("unknown command {}", other),
    }
    Ok(())
}
