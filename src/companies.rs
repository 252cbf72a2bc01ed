//! Defence-company revenue table: company name cleanup and the per-year
//! country and company aggregates.
//!
//! Raw company names in the source table are inconsistent ("Lockheed
//! Martin Corp.", "LOCKHEED MARTIN CORP 2", ...). [`normalize_companies`]
//! cleans them and folds near-duplicates together before any grouping.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::logging::{log, obj, v_num, Domain, Level};
use crate::stats::{self, desc};

/// Minimum [`similarity`] for two cleaned names to be treated as one company.
pub const FUZZY_CUTOFF: f64 = 0.85;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanyRecord {
    pub year: i32,
    pub company: String,
    pub country: String,
    pub defense_revenue: Option<f64>,
    pub total_revenue: Option<f64>,
    /// Percent of total revenue that comes from defence.
    pub defense_share: Option<f64>,
}

// =============================================================================
// Name normalization
// =============================================================================

fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev_letter = false;
    for c in s.chars() {
        if c.is_alphabetic() {
            if prev_letter {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            prev_letter = true;
        } else {
            out.push(c);
            prev_letter = false;
        }
    }
    out
}

/// Trim, drop trailing digits, turn punctuation into spaces, collapse
/// whitespace and title-case.
pub fn clean_company_name(raw: &str) -> String {
    let trimmed = raw.trim().trim_end_matches(|c: char| c.is_ascii_digit());
    let spaced: String = trimmed
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '_' || c.is_whitespace() {
                c
            } else {
                ' '
            }
        })
        .collect();
    let collapsed = spaced.split_whitespace().collect::<Vec<_>>().join(" ");
    title_case(&collapsed)
}

/// Longest common block of `a[alo..ahi]` and `b[blo..bhi]` as `(i, j, len)`.
/// Ties go to the block that starts first in `a`, then first in `b`.
fn longest_block(
    a: &[char],
    b: &[char],
    (alo, ahi): (usize, usize),
    (blo, bhi): (usize, usize),
) -> (usize, usize, usize) {
    let mut best = (alo, blo, 0);
    let width = bhi - blo + 1;
    let mut prev = vec![0usize; width];
    for i in alo..ahi {
        let mut cur = vec![0usize; width];
        for j in blo..bhi {
            if a[i] == b[j] {
                let k = prev[j - blo] + 1;
                cur[j - blo + 1] = k;
                if k > best.2 {
                    best = (i + 1 - k, j + 1 - k, k);
                }
            }
        }
        prev = cur;
    }
    best
}

fn matched_chars(a: &[char], b: &[char], ar: (usize, usize), br: (usize, usize)) -> usize {
    if ar.0 >= ar.1 || br.0 >= br.1 {
        return 0;
    }
    let (i, j, k) = longest_block(a, b, ar, br);
    if k == 0 {
        return 0;
    }
    k + matched_chars(a, b, (ar.0, i), (br.0, j))
        + matched_chars(a, b, (i + k, ar.1), (j + k, br.1))
}

/// Ratcliff/Obershelp similarity in `[0, 1]`.
pub fn similarity(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let total = a.len() + b.len();
    if total == 0 {
        return 1.0;
    }
    let m = matched_chars(&a, &b, (0, a.len()), (0, b.len()));
    2.0 * m as f64 / total as f64
}

/// Best accepted name at or above [`FUZZY_CUTOFF`]; equal scores go to the
/// lexicographically larger name.
fn closest<'a>(name: &str, accepted: &'a [String]) -> Option<&'a str> {
    let mut best: Option<(f64, &str)> = None;
    for cand in accepted {
        let score = similarity(cand, name);
        if score < FUZZY_CUTOFF {
            continue;
        }
        let better = match best {
            None => true,
            Some((s, n)) => score > s || (score == s && cand.as_str() > n),
        };
        if better {
            best = Some((score, cand.as_str()));
        }
    }
    best.map(|(_, n)| n)
}

/// Clean every company name and fold near-duplicates into the first-seen
/// spelling. Returns how many distinct cleaned names were merged away.
pub fn normalize_companies(records: &mut [CompanyRecord]) -> usize {
    let mut mapping: HashMap<String, String> = HashMap::new();
    let mut accepted: Vec<String> = Vec::new();
    let mut merged = 0;
    for rec in records.iter_mut() {
        let cleaned = clean_company_name(&rec.company);
        if !mapping.contains_key(&cleaned) {
            let target = match closest(&cleaned, &accepted).map(str::to_string) {
                Some(existing) => {
                    merged += 1;
                    existing
                }
                None => {
                    accepted.push(cleaned.clone());
                    cleaned.clone()
                }
            };
            mapping.insert(cleaned.clone(), target);
        }
        if let Some(target) = mapping.get(&cleaned) {
            rec.company = target.clone();
        }
    }
    log(
        Level::Debug,
        Domain::Explore,
        "company_names_normalized",
        obj(&[
            ("distinct", v_num(mapping.len() as f64)),
            ("merged", v_num(merged as f64)),
        ]),
    );
    merged
}

// =============================================================================
// Aggregates
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountryRevenue {
    pub year: i32,
    pub country: String,
    pub defense_revenue: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanyCount {
    pub year: i32,
    pub country: String,
    pub companies: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountryLeaders {
    pub country: String,
    pub defense_revenue: f64,
    /// Largest companies first.
    pub companies: Vec<(String, f64)>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedCompany {
    pub year: i32,
    pub company: String,
    pub country: String,
    pub defense_revenue: f64,
    pub total_revenue: f64,
    pub defense_share: Option<f64>,
    /// Dense rank of defence revenue within the year, 1 = largest.
    pub rank: usize,
}

pub fn latest_year(records: &[CompanyRecord]) -> Option<i32> {
    records.iter().map(|r| r.year).max()
}

/// Split `(year, key) -> value` groups into per-year lists, keep the `n`
/// largest of each. Keys arrive sorted, so ties stay in key order.
fn top_per_year<K, V: Copy>(
    groups: BTreeMap<(i32, K), V>,
    n: usize,
    value: impl Fn(V) -> f64,
) -> Vec<(i32, K, V)> {
    let mut by_year: BTreeMap<i32, Vec<(K, V)>> = BTreeMap::new();
    for ((year, key), v) in groups {
        by_year.entry(year).or_default().push((key, v));
    }
    let mut out = Vec::new();
    for (year, mut rows) in by_year {
        rows.sort_by(|a, b| desc(value(a.1), value(b.1)));
        out.extend(rows.into_iter().take(n).map(|(k, v)| (year, k, v)));
    }
    out
}

/// Defence revenue summed per (year, country); the `n` largest countries of
/// each year, years ascending.
pub fn top_countries_by_year(records: &[CompanyRecord], n: usize) -> Vec<CountryRevenue> {
    let mut sums: BTreeMap<(i32, String), f64> = BTreeMap::new();
    for r in records {
        *sums.entry((r.year, r.country.clone())).or_insert(0.0) +=
            r.defense_revenue.unwrap_or(0.0);
    }
    top_per_year(sums, n, |v| v)
        .into_iter()
        .map(|(year, country, defense_revenue)| CountryRevenue {
            year,
            country,
            defense_revenue,
        })
        .collect()
}

/// Distinct companies per (year, country); the `n` largest counts per year.
pub fn company_counts_by_year(records: &[CompanyRecord], n: usize) -> Vec<CompanyCount> {
    let mut names: BTreeMap<(i32, String), BTreeSet<&str>> = BTreeMap::new();
    for r in records {
        names
            .entry((r.year, r.country.clone()))
            .or_default()
            .insert(r.company.as_str());
    }
    let counts: BTreeMap<(i32, String), usize> =
        names.into_iter().map(|(k, set)| (k, set.len())).collect();
    top_per_year(counts, n, |c| c as f64)
        .into_iter()
        .map(|(year, country, companies)| CompanyCount {
            year,
            country,
            companies,
        })
        .collect()
}

/// The `countries` largest countries by defence revenue in `year`, each with
/// its `per_country` largest companies.
pub fn country_leaders(
    records: &[CompanyRecord],
    year: i32,
    countries: usize,
    per_country: usize,
) -> Vec<CountryLeaders> {
    let mut by_country: BTreeMap<&str, BTreeMap<&str, f64>> = BTreeMap::new();
    for r in records.iter().filter(|r| r.year == year) {
        *by_country
            .entry(r.country.as_str())
            .or_default()
            .entry(r.company.as_str())
            .or_insert(0.0) += r.defense_revenue.unwrap_or(0.0);
    }
    let mut leaders: Vec<CountryLeaders> = by_country
        .into_iter()
        .map(|(country, companies)| {
            let mut companies: Vec<(String, f64)> = companies
                .into_iter()
                .map(|(c, v)| (c.to_string(), v))
                .collect();
            let total = companies.iter().map(|(_, v)| v).sum();
            companies.sort_by(|a, b| desc(a.1, b.1));
            companies.truncate(per_country);
            CountryLeaders {
                country: country.to_string(),
                defense_revenue: total,
                companies,
            }
        })
        .collect();
    leaders.sort_by(|a, b| desc(a.defense_revenue, b.defense_revenue));
    leaders.truncate(countries);
    leaders
}

#[derive(Default)]
struct CompanyYear {
    defense_revenue: f64,
    total_revenue: f64,
    shares: Vec<f64>,
}

/// Per (year, company, country) totals with a dense defence-revenue rank
/// inside each year. Rows ranked above `max_rank` are dropped.
pub fn ranked_companies(records: &[CompanyRecord], max_rank: usize) -> Vec<RankedCompany> {
    let mut groups: BTreeMap<(i32, &str, &str), CompanyYear> = BTreeMap::new();
    for r in records {
        let g = groups
            .entry((r.year, r.company.as_str(), r.country.as_str()))
            .or_default();
        g.defense_revenue += r.defense_revenue.unwrap_or(0.0);
        g.total_revenue += r.total_revenue.unwrap_or(0.0);
        if let Some(share) = r.defense_share {
            g.shares.push(share);
        }
    }

    let mut by_year: BTreeMap<i32, Vec<RankedCompany>> = BTreeMap::new();
    for ((year, company, country), g) in groups {
        by_year.entry(year).or_default().push(RankedCompany {
            year,
            company: company.to_string(),
            country: country.to_string(),
            defense_revenue: g.defense_revenue,
            total_revenue: g.total_revenue,
            defense_share: (!g.shares.is_empty()).then(|| stats::mean(&g.shares)),
            rank: 0,
        });
    }

    let mut out = Vec::new();
    for (_, mut rows) in by_year {
        rows.sort_by(|a, b| desc(a.defense_revenue, b.defense_revenue));
        let mut rank = 0;
        let mut last: Option<f64> = None;
        for row in rows.iter_mut() {
            if last != Some(row.defense_revenue) {
                rank += 1;
                last = Some(row.defense_revenue);
            }
            row.rank = rank;
        }
        out.extend(rows.into_iter().filter(|r| r.rank <= max_rank));
    }
    out
}

/// Distinct company names among the `n` largest rows of `year`.
pub fn leading_companies(records: &[CompanyRecord], year: i32, n: usize) -> Vec<String> {
    let mut rows: Vec<(&str, f64)> = records
        .iter()
        .filter(|r| r.year == year)
        .filter_map(|r| r.defense_revenue.map(|v| (r.company.as_str(), v)))
        .collect();
    rows.sort_by(|a, b| desc(a.1, b.1));
    let mut names: Vec<String> = Vec::new();
    for (name, _) in rows.into_iter().take(n) {
        if !names.iter().any(|existing| existing == name) {
            names.push(name.to_string());
        }
    }
    names
}

/// (year, defence revenue) for one company, years ascending.
pub fn revenue_trend(records: &[CompanyRecord], company: &str) -> Vec<(i32, f64)> {
    let mut sums: BTreeMap<i32, f64> = BTreeMap::new();
    for r in records.iter().filter(|r| r.company == company) {
        if let Some(v) = r.defense_revenue {
            *sums.entry(r.year).or_insert(0.0) += v;
        }
    }
    sums.into_iter().collect()
}
