//! Row classification: every grid row becomes exactly one [RowEvent].

use once_cell::sync::Lazy;
use regex::Regex;

use crate::grid::{row_text, Cell};
use crate::report::layout::ColumnMap;
use crate::report::record::Metrics;

static HEADER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"Matricule\s*:\s*(\d+(?:\s*\d+)*)\s*-\s*(.+?)\s*(?:P[ée]riode\b.*)?$")
        .expect("header pattern is valid")
});

static HEADER_PERIOD_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"P[ée]riode\s*:?\s*(\d{4}/\d{2})").expect("header period pattern is valid")
});

static PERIOD_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*(\d{4}/\d{2})").expect("period pattern is valid"));

static TOTALS_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"TOTAL MATRICULE\s*:\s*(\d+(?:\s*\d+)*)").expect("totals pattern is valid")
});

#[derive(Debug, Clone, PartialEq)]
pub enum RowEvent {
    /// `Matricule : <id> - <name>` opens an employee section.
    Header {
        employee_id: String,
        employee_name: String,
        /// Set when the header line itself ends with `Période <YYYY/MM>` or starts with
        /// `YYYY/MM`.
        period: Option<String>,
    },
    /// A line starting with `YYYY/MM`.
    Period(String),
    /// `TOTAL MATRICULE : <id>` closes a section and carries its figures.
    Totals {
        /// Matricule printed in the totals cell, when it could be isolated.
        employee_id: Option<String>,
        metrics: Metrics,
    },
    NoMatch,
}

/// Classify one grid row. Totals are checked first, then headers, then periods.
pub fn classify_row(row: &[Cell], columns: &ColumnMap) -> RowEvent {
    let text = row_text(row);

    if TOTALS_RE.is_match(&text) {
        return RowEvent::Totals {
            employee_id: totals_cell_id(row),
            metrics: extract_metrics(row, columns),
        };
    }

    if let Some(caps) = HEADER_RE.captures(&text) {
        // A header row can also lead with the period; totals rows never reach this branch.
        let period = HEADER_PERIOD_RE
            .captures(&text[caps.get(2).map_or(0, |m| m.end())..])
            .or_else(|| PERIOD_RE.captures(&text))
            .map(|p| p[1].to_string());
        return RowEvent::Header {
            employee_id: strip_whitespace(&caps[1]),
            employee_name: caps[2].trim().to_string(),
            period,
        };
    }

    if !text.contains("TOTAL") {
        if let Some(caps) = PERIOD_RE.captures(&text) {
            return RowEvent::Period(caps[1].to_string());
        }
    }

    RowEvent::NoMatch
}

/// Value of `row[col]` as a float, `None` when out of range, blank or not numeric.
pub fn extract_metric(row: &[Cell], col: usize) -> Option<f64> {
    row.get(col).and_then(Cell::as_f64)
}

pub fn extract_metrics(row: &[Cell], columns: &ColumnMap) -> Metrics {
    Metrics {
        time_logged: extract_metric(row, columns.time_logged),
        time_allocated: extract_metric(row, columns.time_allocated),
        variance: extract_metric(row, columns.variance),
        technical_efficiency: extract_metric(row, columns.technical_efficiency),
    }
}

fn totals_cell_id(row: &[Cell]) -> Option<String> {
    row.iter().find_map(|cell| match cell {
        Cell::Text(text) => TOTALS_RE
            .captures(text)
            .map(|caps| strip_whitespace(&caps[1])),
        _ => None,
    })
}

fn strip_whitespace(value: &str) -> String {
    value.chars().filter(|c| !c.is_whitespace()).collect()
}
