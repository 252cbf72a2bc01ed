//! Bilateral trade summaries: partner totals for a year and a country's
//! balance over time. Figures are in millions of USD as published.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::stats::desc;

pub const DEFAULT_PARTNER_COUNT: usize = 6;

/// One row of the trade table (a partner country in one financial year).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeRecord {
    pub country: String,
    /// Start year of the financial year.
    pub year: i32,
    pub export: Option<f64>,
    pub import: Option<f64>,
    pub trade_balance: Option<f64>,
}

impl TradeRecord {
    /// Published balance, or export minus import when the column is empty.
    pub fn balance(&self) -> Option<f64> {
        self.trade_balance.or_else(|| match (self.export, self.import) {
            (Some(e), Some(i)) => Some(e - i),
            _ => None,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartnerSummary {
    pub country: String,
    pub import: f64,
    pub export: f64,
    pub total_trade: f64,
    pub balance: f64,
}

/// Partners for `year` grouped by country, largest total trade first.
///
/// Missing import/export cells count as zero in the sums.
pub fn partner_summary(trade: &[TradeRecord], year: i32, top_n: usize) -> Vec<PartnerSummary> {
    let mut order: Vec<&str> = Vec::new();
    let mut sums: HashMap<&str, (f64, f64)> = HashMap::new();
    for row in trade.iter().filter(|r| r.year == year) {
        let entry = sums.entry(row.country.as_str()).or_insert_with(|| {
            order.push(row.country.as_str());
            (0.0, 0.0)
        });
        entry.0 += row.import.unwrap_or(0.0);
        entry.1 += row.export.unwrap_or(0.0);
    }

    let mut out: Vec<PartnerSummary> = order
        .into_iter()
        .map(|country| {
            let (import, export) = sums[country];
            PartnerSummary {
                country: country.to_string(),
                import,
                export,
                total_trade: import + export,
                balance: export - import,
            }
        })
        .collect();
    out.sort_by(|a, b| desc(a.total_trade, b.total_trade));
    out.truncate(top_n);
    out
}

/// (year, balance) for one partner, ascending by year. Rows without a
/// computable balance are skipped.
pub fn balance_trend(trade: &[TradeRecord], country: &str) -> Vec<(i32, f64)> {
    let mut points: Vec<(i32, f64)> = trade
        .iter()
        .filter(|r| r.country == country)
        .filter_map(|r| r.balance().map(|b| (r.year, b)))
        .collect();
    points.sort_by_key(|(year, _)| *year);
    points
}

/// Distinct financial years present, ascending.
pub fn years(trade: &[TradeRecord]) -> Vec<i32> {
    let mut ys: Vec<i32> = trade.iter().map(|r| r.year).collect();
    ys.sort_unstable();
    ys.dedup();
    ys
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(country: &str, year: i32, export: f64, import: f64) -> TradeRecord {
        TradeRecord {
            country: country.to_string(),
            year,
            export: Some(export),
            import: Some(import),
            trade_balance: None,
        }
    }

    #[test]
    fn partners_grouped_and_ranked() {
        let trade = vec![
            row("A", 2020, 10.0, 5.0),
            row("B", 2020, 50.0, 1.0),
            row("A", 2020, 1.0, 1.0),
            row("C", 2019, 500.0, 500.0),
        ];
        let top = partner_summary(&trade, 2020, 6);
        assert_eq!(top.len(), 2);
        assert_eq!(top[0].country, "B");
        assert_eq!(top[1].total_trade, 17.0);
        assert_eq!(top[1].balance, 5.0);
    }

    #[test]
    fn partners_truncated() {
        let trade: Vec<TradeRecord> = (0..10)
            .map(|i| row(&format!("P{}", i), 2021, i as f64, 0.0))
            .collect();
        let top = partner_summary(&trade, 2021, DEFAULT_PARTNER_COUNT);
        assert_eq!(top.len(), 6);
        assert_eq!(top[0].country, "P9");
    }

    #[test]
    fn balance_prefers_published_column() {
        let mut r = row("A", 2020, 10.0, 4.0);
        assert_eq!(r.balance(), Some(6.0));
        r.trade_balance = Some(5.5);
        assert_eq!(r.balance(), Some(5.5));
        r.trade_balance = None;
        r.import = None;
        assert_eq!(r.balance(), None);
    }

    #[test]
    fn trend_sorted_by_year() {
        let trade = vec![
            row("A", 2021, 3.0, 1.0),
            row("A", 2019, 1.0, 2.0),
            row("B", 2020, 0.0, 0.0),
        ];
        assert_eq!(balance_trend(&trade, "A"), vec![(2019, -1.0), (2021, 2.0)]);
        assert_eq!(years(&trade), vec![2019, 2020, 2021]);
    }
}
