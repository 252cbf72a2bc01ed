//! Strength ranking and target-year projection.
//!
//! The pipeline runs in three stages, each a pure function of its inputs:
//!
//! 1. [`compute_current_ranking`] - drop incomplete rows, standardize the
//!    seven indicators, average them into a strength score.
//! 2. [`compute_growth_trend`] - fit a least-squares trend to each country's
//!    2000-2020 budget values and min-max normalize the slopes.
//! 3. [`project_future`] - push the strength score forward by the normalized
//!    growth and damp it with the published power index.
//!
//! [`run_projection`] chains all three for one request.

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::logging::{log_excluded, log_ranking, Domain, ProfileScope};
use crate::model::{BudgetSeries, CountryMetrics, RankChange, ScoredCountry};
use crate::stats::{self, desc, NORM_EPSILON};

pub const BASE_YEAR: i32 = 2024;
pub const DEFAULT_TARGET_YEAR: i32 = 2047;

/// Budget years considered for the growth trend, inclusive.
pub const GROWTH_WINDOW_START: i32 = 2000;
pub const GROWTH_WINDOW_END: i32 = 2020;
/// Fewer present values than this and the slope is taken as zero.
pub const MIN_GROWTH_POINTS: usize = 5;

/// Normalized growth accrues once per this many projected years.
pub const GROWTH_STEP_YEARS: f64 = 5.0;
/// Weight of the published power index in the projection score.
pub const PWR_INDEX_DAMPING: f64 = 0.1;

/// Rank given to a country missing from one of the two top-N lists is
/// `top_n + RANK_SENTINEL_OFFSET`.
pub const RANK_SENTINEL_OFFSET: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProjectionParams {
    pub base_year: i32,
    pub target_year: i32,
    pub top_n: usize,
}

impl Default for ProjectionParams {
    fn default() -> Self {
        Self {
            base_year: BASE_YEAR,
            target_year: DEFAULT_TARGET_YEAR,
            top_n: 10,
        }
    }
}

/// Both orderings plus how the top of the table moves between them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectionReport {
    pub params: ProjectionParams,
    /// Sorted by strength score, with growth fields filled in.
    pub current: Vec<ScoredCountry>,
    /// Sorted by projection score.
    pub projected: Vec<ScoredCountry>,
    pub changes: Vec<RankChange>,
}

impl ProjectionReport {
    pub fn current_top(&self) -> &[ScoredCountry] {
        &self.current[..self.params.top_n.min(self.current.len())]
    }

    pub fn projected_top(&self) -> &[ScoredCountry] {
        &self.projected[..self.params.top_n.min(self.projected.len())]
    }
}

// =============================================================================
// Stage 1: current strength
// =============================================================================

pub fn compute_current_ranking(metrics: &[CountryMetrics]) -> Vec<ScoredCountry> {
    let _scope = ProfileScope::new("compute_current_ranking");

    let mut excluded = Vec::new();
    let complete: Vec<(&CountryMetrics, [f64; 7])> = metrics
        .iter()
        .filter_map(|m| match m.complete() {
            Some(values) => Some((m, values)),
            None => {
                excluded.push(m.country.clone());
                None
            }
        })
        .collect();
    log_excluded(Domain::Score, "missing_indicator", &excluded);

    if complete.is_empty() {
        return Vec::new();
    }

    let mut standardized = vec![[0.0f64; 7]; complete.len()];
    for col in 0..7 {
        let column: Vec<f64> = complete.iter().map(|(_, v)| v[col]).collect();
        for (row, z) in stats::standardize(&column).into_iter().enumerate() {
            standardized[row][col] = z;
        }
    }

    let mut scored: Vec<ScoredCountry> = complete
        .iter()
        .zip(standardized)
        .map(|((m, _), z)| ScoredCountry {
            country: m.country.clone(),
            standardized: z,
            strength_score: stats::mean(&z),
            pwr_index: m.pwr_index,
            growth_slope: 0.0,
            growth_norm: 0.0,
            projected_strength: 0.0,
            projection_score: 0.0,
        })
        .collect();
    scored.sort_by(|a, b| desc(a.strength_score, b.strength_score));
    scored
}

// =============================================================================
// Stage 2: budget growth
// =============================================================================

/// Trend of one country's budget over the growth window.
///
/// The x-axis is the offset from the window start, so missing years leave
/// gaps instead of compressing the series.
pub fn growth_slope(series: Option<&BudgetSeries>) -> f64 {
    series.map(|s| window_slope(&growth_window(s))).unwrap_or(0.0)
}

fn growth_window(series: &BudgetSeries) -> Vec<(i32, f64)> {
    series.window(GROWTH_WINDOW_START, GROWTH_WINDOW_END)
}

/// Slope of `(year, value)` points; 0 below [`MIN_GROWTH_POINTS`].
fn window_slope(window: &[(i32, f64)]) -> f64 {
    if window.len() < MIN_GROWTH_POINTS {
        return 0.0;
    }
    let points: Vec<(f64, f64)> = window
        .iter()
        .map(|(year, v)| ((year - GROWTH_WINDOW_START) as f64, *v))
        .collect();
    stats::ols_slope(&points).unwrap_or(0.0)
}

/// Exact name match; the first row wins when a name repeats.
fn budget_index(budgets: &[BudgetSeries]) -> HashMap<&str, &BudgetSeries> {
    let mut index = HashMap::with_capacity(budgets.len());
    for series in budgets {
        index.entry(series.country.as_str()).or_insert(series);
    }
    index
}

pub fn compute_growth_trend(
    mut scored: Vec<ScoredCountry>,
    budgets: &[BudgetSeries],
) -> Vec<ScoredCountry> {
    let _scope = ProfileScope::new("compute_growth_trend");
    let index = budget_index(budgets);

    let mut flat = Vec::new();
    for entry in scored.iter_mut() {
        let window = index
            .get(entry.country.as_str())
            .map(|s| growth_window(s))
            .unwrap_or_default();
        if window.len() < MIN_GROWTH_POINTS {
            flat.push(entry.country.clone());
        }
        entry.growth_slope = window_slope(&window);
    }
    log_excluded(Domain::Growth, "insufficient_budget_history", &flat);

    let slopes: Vec<f64> = scored.iter().map(|s| s.growth_slope).collect();
    let norms = stats::min_max_normalize(&slopes, NORM_EPSILON);
    for (entry, norm) in scored.iter_mut().zip(norms) {
        entry.growth_norm = norm;
    }
    scored
}

// =============================================================================
// Stage 3: projection
// =============================================================================

pub fn project_future(
    mut annotated: Vec<ScoredCountry>,
    target_year: i32,
    base_year: i32,
) -> Result<Vec<ScoredCountry>> {
    if target_year <= base_year {
        bail!(
            "target year {} must be after base year {}",
            target_year,
            base_year
        );
    }
    let steps = (target_year - base_year) as f64 / GROWTH_STEP_YEARS;
    for entry in annotated.iter_mut() {
        entry.projected_strength = entry.strength_score + entry.growth_norm * steps;
        // A missing power index contributes nothing.
        let damping = entry.pwr_index.map(|p| PWR_INDEX_DAMPING * p).unwrap_or(0.0);
        entry.projection_score = entry.projected_strength - damping;
    }
    annotated.sort_by(|a, b| desc(a.projection_score, b.projection_score));
    Ok(annotated)
}

/// Compare the top `top_n` of two orderings.
///
/// Every country in either list appears once; a country absent from one list
/// gets rank `top_n + 10` there. Ranks are keyed by name, so a name that
/// repeats within the top `top_n` yields one entry carrying the rank of its
/// last occurrence.
pub fn rank_changes(
    current: &[ScoredCountry],
    projected: &[ScoredCountry],
    top_n: usize,
) -> Vec<RankChange> {
    let sentinel = top_n + RANK_SENTINEL_OFFSET;
    let ranks = |rows: &[ScoredCountry]| -> HashMap<String, usize> {
        rows.iter()
            .take(top_n)
            .enumerate()
            .map(|(i, s)| (s.country.clone(), i + 1))
            .collect()
    };
    let cur = ranks(current);
    let proj = ranks(projected);

    let mut changes: Vec<RankChange> = cur
        .keys()
        .chain(proj.keys().filter(|c| !cur.contains_key(*c)))
        .map(|country| RankChange {
            country: country.clone(),
            current_rank: cur.get(country).copied().unwrap_or(sentinel),
            projected_rank: proj.get(country).copied().unwrap_or(sentinel),
        })
        .collect();
    changes.sort_by(|a, b| {
        a.projected_rank
            .cmp(&b.projected_rank)
            .then(a.current_rank.cmp(&b.current_rank))
            .then_with(|| a.country.cmp(&b.country))
    });
    changes
}

/// Full pipeline for one request.
pub fn run_projection(
    metrics: &[CountryMetrics],
    budgets: &[BudgetSeries],
    params: ProjectionParams,
) -> Result<ProjectionReport> {
    let current = compute_growth_trend(compute_current_ranking(metrics), budgets);
    let projected = project_future(current.clone(), params.target_year, params.base_year)?;
    let changes = rank_changes(&current, &projected, params.top_n);

    let cur_top: Vec<(&str, f64)> = current
        .iter()
        .take(params.top_n)
        .map(|s| (s.country.as_str(), s.strength_score))
        .collect();
    let proj_top: Vec<(&str, f64)> = projected
        .iter()
        .take(params.top_n)
        .map(|s| (s.country.as_str(), s.projection_score))
        .collect();
    log_ranking(Domain::Score, "current_ranking", &cur_top);
    log_ranking(Domain::Projection, "projected_ranking", &proj_top);

    Ok(ProjectionReport {
        params,
        current,
        projected,
        changes,
    })
}
