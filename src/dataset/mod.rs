//! Combined dataset across uploaded reports, and the queries the dashboard runs over it.

pub mod export;
pub mod query;
pub mod stats;

use serde::Serialize;

use crate::report::{EmployeeRecord, ParsedReport};

/// Ordered records from every successfully parsed file, in upload order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Dataset {
    records: Vec<EmployeeRecord>,
}

impl Dataset {
    pub fn new() -> Self {
        Self::default()
    }

    /// Concatenate per-file record sequences, keeping file order then in-file order.
    pub fn aggregate<I>(per_file: I) -> Self
    where
        I: IntoIterator<Item = Vec<EmployeeRecord>>,
    {
        let mut dataset = Self::new();
        for records in per_file {
            dataset.append(records);
        }
        dataset
    }

    pub fn from_reports<I>(reports: I) -> Self
    where
        I: IntoIterator<Item = ParsedReport>,
    {
        Self::aggregate(reports.into_iter().map(|report| report.records))
    }

    pub fn append(&mut self, records: Vec<EmployeeRecord>) {
        self.records.extend(records);
    }

    pub fn records(&self) -> &[EmployeeRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }

    pub fn into_records(self) -> Vec<EmployeeRecord> {
        self.records
    }
}

impl From<Vec<EmployeeRecord>> for Dataset {
    fn from(records: Vec<EmployeeRecord>) -> Self {
        Self { records }
    }
}
