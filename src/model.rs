//! Country records - the two input tables and the derived ranking rows.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// =============================================================================
// Indicators
// =============================================================================

/// The seven indicators a country must carry to be scored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Indicator {
    Population,
    ActiveManpower,
    Aircraft,
    Tanks,
    Navy,
    DefenseBudget,
    PurchasingPower,
}

impl Indicator {
    pub const ALL: [Indicator; 7] = [
        Indicator::Population,
        Indicator::ActiveManpower,
        Indicator::Aircraft,
        Indicator::Tanks,
        Indicator::Navy,
        Indicator::DefenseBudget,
        Indicator::PurchasingPower,
    ];

    /// Column name in the country-indicators CSV.
    pub fn column(&self) -> &'static str {
        match self {
            Indicator::Population => "total_national_populations",
            Indicator::ActiveManpower => "active_service_military_manpower",
            Indicator::Aircraft => "total_military_aircraft_strength",
            Indicator::Tanks => "total_combat_tank_strength",
            Indicator::Navy => "navy_strength",
            Indicator::DefenseBudget => "national_annual_defense_budgets",
            Indicator::PurchasingPower => "purchasing_power_parities",
        }
    }

    pub fn index(&self) -> usize {
        match self {
            Indicator::Population => 0,
            Indicator::ActiveManpower => 1,
            Indicator::Aircraft => 2,
            Indicator::Tanks => 3,
            Indicator::Navy => 4,
            Indicator::DefenseBudget => 5,
            Indicator::PurchasingPower => 6,
        }
    }

    /// Accepts either the CSV column name or the short snake_case name.
    pub fn parse(name: &str) -> Option<Self> {
        let name = name.trim();
        Self::ALL.iter().copied().find(|ind| {
            ind.column() == name || ind.short_name() == name
        })
    }

    pub fn short_name(&self) -> &'static str {
        match self {
            Indicator::Population => "population",
            Indicator::ActiveManpower => "active_manpower",
            Indicator::Aircraft => "aircraft",
            Indicator::Tanks => "tanks",
            Indicator::Navy => "navy",
            Indicator::DefenseBudget => "defense_budget",
            Indicator::PurchasingPower => "purchasing_power",
        }
    }
}

// =============================================================================
// Source tables
// =============================================================================

/// One row of the current-year country indicators table.
///
/// Cells that failed numeric coercion are `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountryMetrics {
    pub country: String,
    pub indicators: [Option<f64>; 7],
    /// Published composite rank, lower is stronger.
    pub pwr_index: Option<f64>,
}

impl CountryMetrics {
    pub fn new(country: &str) -> Self {
        Self {
            country: country.to_string(),
            indicators: [None; 7],
            pwr_index: None,
        }
    }

    pub fn get(&self, indicator: Indicator) -> Option<f64> {
        self.indicators[indicator.index()]
    }

    pub fn set(&mut self, indicator: Indicator, value: Option<f64>) {
        self.indicators[indicator.index()] = value;
    }

    /// All seven indicators, or `None` if any is missing.
    pub fn complete(&self) -> Option<[f64; 7]> {
        let mut out = [0.0; 7];
        for (slot, value) in out.iter_mut().zip(self.indicators.iter()) {
            *slot = (*value)?;
        }
        Some(out)
    }
}

/// Yearly budget figures for one country. Years with no value are absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BudgetSeries {
    pub country: String,
    pub country_code: Option<String>,
    pub values: BTreeMap<i32, f64>,
}

impl BudgetSeries {
    pub fn new(country: &str) -> Self {
        Self {
            country: country.to_string(),
            ..Self::default()
        }
    }

    pub fn with_values(country: &str, values: &[(i32, f64)]) -> Self {
        let mut series = Self::new(country);
        series.values.extend(values.iter().copied());
        series
    }

    pub fn value(&self, year: i32) -> Option<f64> {
        self.values.get(&year).copied()
    }

    /// Present (year, value) pairs within `[start, end]`, ascending by year.
    pub fn window(&self, start: i32, end: i32) -> Vec<(i32, f64)> {
        self.values
            .range(start..=end)
            .map(|(y, v)| (*y, *v))
            .collect()
    }
}

// =============================================================================
// Derived rows
// =============================================================================

/// A country that survived the completeness filter, with its scores.
///
/// Growth and projection fields stay at zero until the later pipeline
/// stages fill them in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredCountry {
    pub country: String,
    pub standardized: [f64; 7],
    pub strength_score: f64,
    pub pwr_index: Option<f64>,
    pub growth_slope: f64,
    pub growth_norm: f64,
    pub projected_strength: f64,
    pub projection_score: f64,
}

impl ScoredCountry {
    pub fn standardized_value(&self, indicator: Indicator) -> f64 {
        self.standardized[indicator.index()]
    }
}

/// Position of a country in the current and projected top-N lists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankChange {
    pub country: String,
    pub current_rank: usize,
    pub projected_rank: usize,
}

impl RankChange {
    /// Positive when the country climbs.
    pub fn delta(&self) -> i64 {
        self.current_rank as i64 - self.projected_rank as i64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indicator_columns_roundtrip() {
        for ind in Indicator::ALL {
            assert_eq!(Indicator::parse(ind.column()), Some(ind));
            assert_eq!(Indicator::parse(ind.short_name()), Some(ind));
        }
        assert_eq!(Indicator::parse("pwr_index"), None);
    }

    #[test]
    fn complete_requires_every_indicator() {
        let mut m = CountryMetrics::new("X");
        for ind in Indicator::ALL {
            m.set(ind, Some(1.0));
        }
        assert!(m.complete().is_some());
        m.set(Indicator::Navy, None);
        assert!(m.complete().is_none());
    }

    #[test]
    fn window_is_inclusive_and_ordered() {
        let s = BudgetSeries::with_values(
            "X",
            &[(2021, 9.0), (2000, 1.0), (2020, 3.0), (1999, 0.0)],
        );
        assert_eq!(s.window(2000, 2020), vec![(2000, 1.0), (2020, 3.0)]);
    }

    #[test]
    fn rank_delta_sign() {
        let up = RankChange { country: "A".into(), current_rank: 5, projected_rank: 2 };
        assert_eq!(up.delta(), 3);
    }
}
