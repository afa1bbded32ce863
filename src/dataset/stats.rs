//! Aggregates for the dashboard header and period comparison. Missing metric values are left
//! out of every mean and sum; they are never counted as zero.

use std::collections::HashMap;

use serde::Serialize;

use crate::report::{EmployeeRecord, Metric};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KeyMetrics {
    pub record_count: usize,
    pub mean_efficiency: Option<f64>,
    pub total_time_logged: f64,
    pub period_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeriodStats {
    pub period: String,
    pub mean_efficiency: Option<f64>,
    pub total_time_logged: f64,
    pub record_count: usize,
}

/// Descriptive statistics of one metric over its non-null values.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldSummary {
    pub field: &'static str,
    pub count: usize,
    pub mean: Option<f64>,
    pub std: Option<f64>,
    pub min: Option<f64>,
    pub q25: Option<f64>,
    pub median: Option<f64>,
    pub q75: Option<f64>,
    pub max: Option<f64>,
}

pub fn metric_values(records: &[EmployeeRecord], metric: Metric) -> Vec<f64> {
    records.iter().filter_map(|r| r.metric(metric)).collect()
}

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

/// Sum of non-null values; an all-null column sums to zero.
pub fn sum(records: &[EmployeeRecord], metric: Metric) -> f64 {
    records.iter().filter_map(|r| r.metric(metric)).sum()
}

pub fn key_metrics(records: &[EmployeeRecord]) -> KeyMetrics {
    KeyMetrics {
        record_count: records.len(),
        mean_efficiency: mean(&metric_values(records, Metric::TechnicalEfficiency)),
        total_time_logged: sum(records, Metric::TimeLogged),
        period_count: distinct_periods(records).len(),
    }
}

/// Distinct periods in order of first appearance.
pub fn distinct_periods(records: &[EmployeeRecord]) -> Vec<&str> {
    let mut seen = Vec::new();
    for record in records {
        if !seen.contains(&record.period.as_str()) {
            seen.push(record.period.as_str());
        }
    }
    seen
}

pub fn period_stats(records: &[EmployeeRecord]) -> Vec<PeriodStats> {
    let mut by_period: HashMap<&str, Vec<&EmployeeRecord>> = HashMap::new();
    for record in records {
        by_period.entry(record.period.as_str()).or_default().push(record);
    }

    distinct_periods(records)
        .into_iter()
        .map(|period| {
            let group = by_period.get(period).map(Vec::as_slice).unwrap_or_default();
            let efficiencies: Vec<f64> =
                group.iter().filter_map(|r| r.technical_efficiency).collect();
            PeriodStats {
                period: period.to_string(),
                mean_efficiency: mean(&efficiencies),
                total_time_logged: group.iter().filter_map(|r| r.time_logged).sum(),
                record_count: group.len(),
            }
        })
        .collect()
}

pub fn describe(records: &[EmployeeRecord]) -> Vec<FieldSummary> {
    Metric::ALL
        .iter()
        .map(|&metric| describe_values(metric.column_name(), metric_values(records, metric)))
        .collect()
}

fn describe_values(field: &'static str, mut values: Vec<f64>) -> FieldSummary {
    values.sort_by(f64::total_cmp);
    FieldSummary {
        field,
        count: values.len(),
        mean: mean(&values),
        std: sample_std(&values),
        min: values.first().copied(),
        q25: quantile(&values, 0.25),
        median: quantile(&values, 0.5),
        q75: quantile(&values, 0.75),
        max: values.last().copied(),
    }
}

fn sample_std(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let m = mean(values)?;
    let var = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    Some(var.sqrt())
}

/// Linear-interpolated quantile of already sorted values.
fn quantile(sorted: &[f64], q: f64) -> Option<f64> {
    let last = sorted.len().checked_sub(1)?;
    let pos = q * last as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let (a, b) = (sorted[lo], sorted[hi]);
    Some(a + (b - a) * (pos - lo as f64))
}
