//! JSON payload builders for the dashboard API. Handlers in [super::routes] lock the session
//! dataset and delegate here, so everything in this module is plain functions over records.

use std::fmt;

use serde::Serialize;

use crate::config::Targets;
use crate::dataset::query::{filter_records, search_with_bands, top_by_efficiency, RecordFilter};
use crate::dataset::stats::{describe, key_metrics, period_stats};
use crate::parallel::FileSummary;
use crate::report::EmployeeRecord;

pub const DEFAULT_TOP_N: usize = 10;

#[derive(Debug, Clone, PartialEq)]
pub enum QueryError {
    InvalidNumber { param: &'static str, value: String },
}

impl fmt::Display for QueryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidNumber { param, value } => {
                write!(f, "query parameter '{param}' is not a number: '{value}'")
            }
        }
    }
}

impl std::error::Error for QueryError {}

pub fn health_payload() -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(&serde_json::json!({
        "status": "ok",
        "service": "prodeff-api",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

#[derive(Debug, Clone, Serialize)]
pub struct UploadResponse<'a> {
    pub status: &'static str,
    pub file: &'a str,
    pub records_added: usize,
    pub strategy: crate::report::DetectionStrategy,
    pub total_records: usize,
}

pub fn upload_payload(
    summary: &FileSummary,
    total_records: usize,
) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(&UploadResponse {
        status: "ok",
        file: &summary.file_name,
        records_added: summary.records,
        strategy: summary.strategy,
        total_records,
    })
}

/// Build a table filter from `period=<p>` (repeatable) and `min_efficiency=<x>` pairs.
pub fn filter_from_query(pairs: &[(String, String)]) -> Result<RecordFilter, QueryError> {
    let periods: Vec<String> = pairs
        .iter()
        .filter(|(key, _)| key == "period")
        .map(|(_, value)| value.trim().to_string())
        .collect();
    let min_efficiency = match pairs.iter().find(|(key, _)| key == "min_efficiency") {
        Some((_, raw)) => Some(parse_number(raw, "min_efficiency")?),
        None => None,
    };
    Ok(RecordFilter {
        periods: (!periods.is_empty()).then_some(periods),
        min_efficiency,
    })
}

fn parse_number(raw: &str, param: &'static str) -> Result<f64, QueryError> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| QueryError::InvalidNumber {
            param,
            value: raw.to_string(),
        })
}

pub fn dataset_payload(
    records: &[EmployeeRecord],
    filter: &RecordFilter,
) -> Result<String, serde_json::Error> {
    let kept = filter_records(records, filter);
    serde_json::to_string_pretty(&serde_json::json!({
        "showing": kept.len(),
        "total": records.len(),
        "records": kept,
    }))
}

pub fn summary_payload(records: &[EmployeeRecord]) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(&serde_json::json!({
        "generated_at": chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string(),
        "metrics": key_metrics(records),
        "periods": period_stats(records),
        "describe": describe(records),
    }))
}

pub fn top_payload(records: &[EmployeeRecord], n: usize) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(&serde_json::json!({
        "top": top_by_efficiency(records, n),
    }))
}

pub fn top_n_from_query(raw: Option<&str>) -> Result<usize, QueryError> {
    match raw {
        None => Ok(DEFAULT_TOP_N),
        Some(value) => value
            .trim()
            .parse::<usize>()
            .map_err(|_| QueryError::InvalidNumber {
                param: "n",
                value: value.to_string(),
            }),
    }
}

pub fn search_payload(
    records: &[EmployeeRecord],
    query: &str,
    targets: &Targets,
) -> Result<String, serde_json::Error> {
    let hits = search_with_bands(records, query, targets);
    serde_json::to_string_pretty(&serde_json::json!({
        "query": query,
        "count": hits.len(),
        "results": hits,
    }))
}

pub fn error_payload(message: &str) -> String {
    serde_json::json!({ "status": "error", "message": message }).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(raw: &[(&str, &str)]) -> Vec<(String, String)> {
        raw.iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn repeated_periods_are_collected() {
        let filter = filter_from_query(&pairs(&[
            ("period", "2025/11"),
            ("period", "2025/12"),
            ("min_efficiency", "0.5"),
        ]))
        .unwrap();
        assert_eq!(
            filter.periods,
            Some(vec!["2025/11".to_string(), "2025/12".to_string()])
        );
        assert_eq!(filter.min_efficiency, Some(0.5));
    }

    #[test]
    fn no_params_means_no_filter() {
        assert_eq!(filter_from_query(&[]).unwrap(), RecordFilter::default());
    }

    #[test]
    fn bad_min_efficiency_is_rejected() {
        let err = filter_from_query(&pairs(&[("min_efficiency", "high")])).unwrap_err();
        assert!(err.to_string().contains("min_efficiency"));
    }

    #[test]
    fn top_n_defaults_to_ten() {
        assert_eq!(top_n_from_query(None).unwrap(), DEFAULT_TOP_N);
        assert_eq!(top_n_from_query(Some("3")).unwrap(), 3);
        assert!(top_n_from_query(Some("-1")).is_err());
    }
}
