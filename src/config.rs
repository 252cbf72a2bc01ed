use serde::{Deserialize, Serialize};

use crate::engine::{ProjectionParams, BASE_YEAR, DEFAULT_TARGET_YEAR};
use crate::explore::DEFAULT_EXCLUDED;

pub const DEFAULT_METRICS_CSV: &str = "data/2024_military_strength_by_country.csv";
pub const DEFAULT_BUDGET_CSV: &str = "data/Cleaned_Defence_Budget.csv";
pub const DEFAULT_TRADE_CSV: &str = "data/exports_imports_cleaned.csv";
pub const DEFAULT_COMPANIES_CSV: &str = "data/updated_defense_companies_2005_2020.csv";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub metrics_csv: String,
    pub budget_csv: String,
    pub trade_csv: String,
    pub companies_csv: String,
    pub base_year: i32,
    pub target_year: i32,
    pub top_n: usize,
    pub focus_country: String,
    pub excluded_countries: Vec<String>,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            metrics_csv: std::env::var("METRICS_CSV").unwrap_or_else(|_| DEFAULT_METRICS_CSV.to_string()),
            budget_csv: std::env::var("BUDGET_CSV").unwrap_or_else(|_| DEFAULT_BUDGET_CSV.to_string()),
            trade_csv: std::env::var("TRADE_CSV").unwrap_or_else(|_| DEFAULT_TRADE_CSV.to_string()),
            companies_csv: std::env::var("COMPANIES_CSV").unwrap_or_else(|_| DEFAULT_COMPANIES_CSV.to_string()),
            base_year: std::env::var("BASE_YEAR").ok().and_then(|v| v.parse().ok()).unwrap_or(BASE_YEAR),
            target_year: std::env::var("TARGET_YEAR").ok().and_then(|v| v.parse().ok()).unwrap_or(DEFAULT_TARGET_YEAR),
            top_n: std::env::var("TOP_N").ok().and_then(|v| v.parse().ok()).unwrap_or(10),
            focus_country: std::env::var("FOCUS_COUNTRY").unwrap_or_else(|_| "India".to_string()),
            excluded_countries: std::env::var("EXCLUDED_COUNTRIES")
                .map(|v| parse_list(&v))
                .unwrap_or_else(|_| DEFAULT_EXCLUDED.iter().map(|s| s.to_string()).collect()),
        }
    }

    pub fn projection_params(&self) -> ProjectionParams {
        ProjectionParams {
            base_year: self.base_year,
            target_year: self.target_year,
            top_n: self.top_n,
        }
    }
}

fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_parsing_drops_blanks() {
        assert_eq!(parse_list(" A, ,B,"), vec!["A".to_string(), "B".to_string()]);
        assert!(parse_list("").is_empty());
    }

    #[test]
    fn default_paths_point_at_bundled_tables() {
        for path in [
            DEFAULT_METRICS_CSV,
            DEFAULT_BUDGET_CSV,
            DEFAULT_TRADE_CSV,
            DEFAULT_COMPANIES_CSV,
        ] {
            assert!(std::path::Path::new(path).exists(), "{} missing", path);
        }
    }

    #[test]
    fn params_follow_config() {
        let mut cfg = Config::from_env();
        cfg.target_year = 2030;
        cfg.top_n = 3;
        let p = cfg.projection_params();
        assert_eq!(p.target_year, 2030);
        assert_eq!(p.top_n, 3);
    }
}
