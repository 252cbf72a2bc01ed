//! Descriptive views over the indicator and budget tables: headline
//! figures, top-N lists, correlations, per-year budget statistics and
//! totals over a range of years.

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

use crate::model::{BudgetSeries, CountryMetrics, Indicator};
use crate::stats::{self, desc, Summary};

/// Countries left out of the headline "top power" figure.
pub const DEFAULT_EXCLUDED: [&str; 1] = ["Afghanistan"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Overview {
    pub countries_analyzed: usize,
    pub top_power: Option<String>,
    pub total_defense_budget: f64,
}

/// Headline figures for the indicators table.
///
/// `countries_analyzed` counts every row. The top power and the budget total
/// ignore `excluded` countries; missing budgets are skipped.
pub fn overview(metrics: &[CountryMetrics], excluded: &[String]) -> Overview {
    let kept: Vec<&CountryMetrics> = metrics
        .iter()
        .filter(|m| !excluded.iter().any(|e| e == &m.country))
        .collect();

    let mut by_index: Vec<(&CountryMetrics, f64)> = kept
        .iter()
        .filter_map(|m| m.pwr_index.map(|p| (*m, p)))
        .collect();
    by_index.sort_by(|a, b| a.1.total_cmp(&b.1));

    Overview {
        countries_analyzed: metrics.len(),
        top_power: by_index.first().map(|(m, _)| m.country.clone()),
        total_defense_budget: kept
            .iter()
            .filter_map(|m| m.get(Indicator::DefenseBudget))
            .sum(),
    }
}

/// The `n` countries with the largest value of `indicator`, descending.
pub fn top_n_by_indicator(
    metrics: &[CountryMetrics],
    indicator: Indicator,
    n: usize,
) -> Vec<(String, f64)> {
    let mut rows: Vec<(String, f64)> = metrics
        .iter()
        .filter_map(|m| m.get(indicator).map(|v| (m.country.clone(), v)))
        .collect();
    rows.sort_by(|a, b| desc(a.1, b.1));
    rows.truncate(n);
    rows
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationMatrix {
    pub indicators: Vec<Indicator>,
    /// Row-major; `None` where too few shared observations or zero variance.
    pub values: Vec<Vec<Option<f64>>>,
}

impl CorrelationMatrix {
    pub fn get(&self, a: Indicator, b: Indicator) -> Option<f64> {
        let i = self.indicators.iter().position(|x| *x == a)?;
        let j = self.indicators.iter().position(|x| *x == b)?;
        self.values[i][j]
    }
}

/// Pearson correlation between each pair of indicators, over the countries
/// that have both values.
pub fn correlation_matrix(
    metrics: &[CountryMetrics],
    indicators: &[Indicator],
) -> Result<CorrelationMatrix> {
    if indicators.len() < 2 {
        bail!("correlation needs at least two indicators, got {}", indicators.len());
    }
    let values = indicators
        .iter()
        .map(|a| {
            indicators
                .iter()
                .map(|b| {
                    let pairs: Vec<(f64, f64)> = metrics
                        .iter()
                        .filter_map(|m| Some((m.get(*a)?, m.get(*b)?)))
                        .collect();
                    stats::pearson(&pairs)
                })
                .collect()
        })
        .collect();
    Ok(CorrelationMatrix {
        indicators: indicators.to_vec(),
        values,
    })
}

// =============================================================================
// Budget explorer
// =============================================================================

fn year_values(budgets: &[BudgetSeries], year: i32) -> Vec<(&str, f64)> {
    budgets
        .iter()
        .filter_map(|s| s.value(year).map(|v| (s.country.as_str(), v)))
        .collect()
}

pub fn year_summary(budgets: &[BudgetSeries], year: i32) -> Option<Summary> {
    let vals: Vec<f64> = year_values(budgets, year).into_iter().map(|(_, v)| v).collect();
    Summary::from_values(&vals)
}

/// Top `n` spenders in `year`, with `focus` appended when it has a value but
/// did not make the list.
pub fn top_spenders(
    budgets: &[BudgetSeries],
    year: i32,
    n: usize,
    focus: Option<&str>,
) -> Vec<(String, f64)> {
    let mut ranked = year_values(budgets, year);
    ranked.sort_by(|a, b| desc(a.1, b.1));
    let mut top: Vec<(String, f64)> = ranked
        .iter()
        .take(n)
        .map(|(c, v)| (c.to_string(), *v))
        .collect();
    if let Some(focus) = focus {
        if !top.iter().any(|(c, _)| c == focus) {
            if let Some((c, v)) = ranked.iter().find(|(c, _)| *c == focus) {
                top.push((c.to_string(), *v));
            }
        }
    }
    top
}

/// The `n` smallest values in `year`, ascending.
pub fn bottom_spenders(budgets: &[BudgetSeries], year: i32, n: usize) -> Vec<(String, f64)> {
    let mut ranked = year_values(budgets, year);
    ranked.sort_by(|a, b| a.1.total_cmp(&b.1));
    ranked
        .into_iter()
        .take(n)
        .map(|(c, v)| (c.to_string(), v))
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RangeTotals {
    pub start: i32,
    pub end: i32,
    /// Largest totals first.
    pub top: Vec<(String, f64)>,
    /// Smallest positive totals first.
    pub bottom: Vec<(String, f64)>,
}

/// Each country's summed values over `[start, end]`, in table order. A
/// country with no values in the range totals 0.
pub fn range_totals(budgets: &[BudgetSeries], start: i32, end: i32) -> Vec<(String, f64)> {
    budgets
        .iter()
        .map(|s| {
            let total = s.window(start, end).into_iter().map(|(_, v)| v).sum();
            (s.country.clone(), total)
        })
        .collect()
}

/// Largest `n` totals over `[start, end]` and the smallest `n` that are
/// above zero.
pub fn top_bottom_totals(
    budgets: &[BudgetSeries],
    start: i32,
    end: i32,
    n: usize,
) -> Result<RangeTotals> {
    if start > end {
        bail!("year range {}-{} is empty", start, end);
    }
    let totals = range_totals(budgets, start, end);

    let mut top = totals.clone();
    top.sort_by(|a, b| desc(a.1, b.1));
    top.truncate(n);

    let mut bottom: Vec<(String, f64)> = totals.into_iter().filter(|(_, v)| *v > 0.0).collect();
    bottom.sort_by(|a, b| a.1.total_cmp(&b.1));
    bottom.truncate(n);

    Ok(RangeTotals {
        start,
        end,
        top,
        bottom,
    })
}

/// 1 + the number of countries with a strictly larger value in `year`.
pub fn country_rank(budgets: &[BudgetSeries], year: i32, country: &str) -> Option<usize> {
    let values = year_values(budgets, year);
    let own = values.iter().find(|(c, _)| *c == country)?.1;
    Some(values.iter().filter(|(_, v)| *v > own).count() + 1)
}

/// Mean of a country's values over `[decade_start, decade_start + 9]`.
pub fn decade_average(
    budgets: &[BudgetSeries],
    country: &str,
    decade_start: i32,
) -> Option<f64> {
    let series = budgets.iter().find(|s| s.country == country)?;
    let vals: Vec<f64> = series
        .window(decade_start, decade_start + 9)
        .into_iter()
        .map(|(_, v)| v)
        .collect();
    if vals.is_empty() {
        None
    } else {
        Some(stats::mean(&vals))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metrics(
        name: &str,
        budget: Option<f64>,
        tanks: Option<f64>,
        pwr: Option<f64>,
    ) -> CountryMetrics {
        let mut m = CountryMetrics::new(name);
        m.set(Indicator::DefenseBudget, budget);
        m.set(Indicator::Tanks, tanks);
        m.pwr_index = pwr;
        m
    }

    #[test]
    fn overview_skips_excluded_and_missing() {
        let rows = vec![
            metrics("Afghanistan", Some(1.0), None, Some(0.01)),
            metrics("A", Some(100.0), None, Some(0.5)),
            metrics("B", None, None, Some(0.2)),
            metrics("C", Some(50.0), None, None),
        ];
        let excluded: Vec<String> = DEFAULT_EXCLUDED.iter().map(|s| s.to_string()).collect();
        let o = overview(&rows, &excluded);
        assert_eq!(o.countries_analyzed, 4);
        assert_eq!(o.top_power.as_deref(), Some("B"));
        assert_eq!(o.total_defense_budget, 150.0);
    }

    #[test]
    fn overview_empty() {
        let o = overview(&[], &[]);
        assert_eq!(o.top_power, None);
        assert_eq!(o.total_defense_budget, 0.0);
    }

    #[test]
    fn top_n_skips_missing() {
        let rows = vec![
            metrics("A", None, Some(10.0), None),
            metrics("B", None, None, None),
            metrics("C", None, Some(30.0), None),
        ];
        let top = top_n_by_indicator(&rows, Indicator::Tanks, 5);
        assert_eq!(top, vec![("C".to_string(), 30.0), ("A".to_string(), 10.0)]);
    }

    #[test]
    fn correlation_pairwise_complete() {
        let rows = vec![
            metrics("A", Some(1.0), Some(2.0), None),
            metrics("B", Some(2.0), Some(4.0), None),
            metrics("C", Some(3.0), Some(6.0), None),
            metrics("D", Some(4.0), None, None),
        ];
        let m = correlation_matrix(&rows, &[Indicator::DefenseBudget, Indicator::Tanks]).unwrap();
        assert!((m.get(Indicator::DefenseBudget, Indicator::Tanks).unwrap() - 1.0).abs() < 1e-12);
        assert!((m.get(Indicator::Tanks, Indicator::Tanks).unwrap() - 1.0).abs() < 1e-12);
        assert_eq!(m.get(Indicator::Navy, Indicator::Tanks), None);
    }

    #[test]
    fn correlation_needs_two_indicators() {
        assert!(correlation_matrix(&[], &[Indicator::Navy]).is_err());
    }

    fn budgets() -> Vec<BudgetSeries> {
        vec![
            BudgetSeries::with_values("A", &[(2010, 3.0), (2011, 3.5)]),
            BudgetSeries::with_values("B", &[(2010, 1.0)]),
            BudgetSeries::with_values("India", &[(2010, 2.5), (2015, 2.0)]),
            BudgetSeries::with_values("D", &[(2010, 3.0)]),
        ]
    }

    #[test]
    fn spenders_append_focus() {
        let top = top_spenders(&budgets(), 2010, 2, Some("India"));
        let names: Vec<&str> = top.iter().map(|(c, _)| c.as_str()).collect();
        assert_eq!(names, vec!["A", "D", "India"]);
        let top = top_spenders(&budgets(), 2010, 3, Some("India"));
        assert_eq!(top.len(), 3);
        let top = top_spenders(&budgets(), 2011, 3, Some("India"));
        assert_eq!(top.len(), 1);
    }

    #[test]
    fn rank_counts_strictly_greater() {
        assert_eq!(country_rank(&budgets(), 2010, "A"), Some(1));
        assert_eq!(country_rank(&budgets(), 2010, "D"), Some(1));
        assert_eq!(country_rank(&budgets(), 2010, "India"), Some(3));
        assert_eq!(country_rank(&budgets(), 2011, "India"), None);
    }

    #[test]
    fn bottom_spenders_ascending() {
        let bottom = bottom_spenders(&budgets(), 2010, 3);
        let names: Vec<&str> = bottom.iter().map(|(c, _)| c.as_str()).collect();
        // A and D tie at 3.0; table order decides
        assert_eq!(names, vec!["B", "India", "A"]);
        assert!(bottom_spenders(&budgets(), 1970, 5).is_empty());
    }

    #[test]
    fn range_totals_split_top_and_bottom() {
        let mut rows = budgets();
        rows.push(BudgetSeries::with_values("Empty", &[(1990, 7.0)]));
        let totals = range_totals(&rows, 2010, 2015);
        assert_eq!(totals[0], ("A".to_string(), 6.5));
        assert_eq!(totals[4], ("Empty".to_string(), 0.0));

        let tb = top_bottom_totals(&rows, 2010, 2015, 2).unwrap();
        assert_eq!(tb.top, vec![("A".to_string(), 6.5), ("India".to_string(), 4.5)]);
        // zero totals never count as bottom spenders
        assert_eq!(tb.bottom, vec![("B".to_string(), 1.0), ("D".to_string(), 3.0)]);
        assert!(top_bottom_totals(&rows, 2015, 2010, 2).is_err());
    }

    #[test]
    fn summaries_and_decades() {
        let s = year_summary(&budgets(), 2010).unwrap();
        assert_eq!(s.count, 4);
        assert_eq!(s.max, 3.0);
        assert_eq!(s.median, 2.75);
        assert!(year_summary(&budgets(), 1970).is_none());
        assert_eq!(decade_average(&budgets(), "India", 2010), Some(2.25));
        assert_eq!(decade_average(&budgets(), "India", 1990), None);
    }
}
