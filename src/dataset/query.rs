use serde::{Deserialize, Serialize};

use crate::config::Targets;
use crate::report::EmployeeRecord;

/// Table filter. `periods: None` keeps every period.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecordFilter {
    pub periods: Option<Vec<String>>,
    pub min_efficiency: Option<f64>,
}

impl RecordFilter {
    /// A record without an efficiency value never satisfies a minimum.
    pub fn matches(&self, record: &EmployeeRecord) -> bool {
        let period_ok = self
            .periods
            .as_ref()
            .map_or(true, |periods| periods.iter().any(|p| *p == record.period));
        let efficiency_ok = self.min_efficiency.map_or(true, |min| {
            record.technical_efficiency.is_some_and(|value| value >= min)
        });
        period_ok && efficiency_ok
    }
}

pub fn filter_records<'a>(
    records: &'a [EmployeeRecord],
    filter: &RecordFilter,
) -> Vec<&'a EmployeeRecord> {
    records.iter().filter(|r| filter.matches(r)).collect()
}

/// Case-insensitive substring search over name and matricule. An empty query matches nothing.
pub fn search_records<'a>(records: &'a [EmployeeRecord], query: &str) -> Vec<&'a EmployeeRecord> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return Vec::new();
    }
    records
        .iter()
        .filter(|r| {
            r.employee_name.to_lowercase().contains(&needle)
                || r.employee_id.to_lowercase().contains(&needle)
        })
        .collect()
}

/// Highest efficiencies first; records without a value are skipped and ties keep dataset order.
pub fn top_by_efficiency(records: &[EmployeeRecord], n: usize) -> Vec<&EmployeeRecord> {
    let mut ranked: Vec<&EmployeeRecord> = records
        .iter()
        .filter(|r| r.technical_efficiency.is_some())
        .collect();
    ranked.sort_by(|a, b| {
        let (a, b) = (
            a.technical_efficiency.unwrap_or_default(),
            b.technical_efficiency.unwrap_or_default(),
        );
        b.total_cmp(&a)
    });
    ranked.truncate(n);
    ranked
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EfficiencyBand {
    AboveTarget,
    NearTarget,
    BelowTarget,
}

impl EfficiencyBand {
    pub fn classify(efficiency: f64, targets: &Targets) -> Self {
        if efficiency >= targets.above {
            Self::AboveTarget
        } else if efficiency >= targets.near {
            Self::NearTarget
        } else {
            Self::BelowTarget
        }
    }

    pub fn of(record: &EmployeeRecord, targets: &Targets) -> Option<Self> {
        record
            .technical_efficiency
            .map(|value| Self::classify(value, targets))
    }
}

/// Search hit as shown in the employee detail view.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchHit<'a> {
    #[serde(flatten)]
    pub record: &'a EmployeeRecord,
    pub band: Option<EfficiencyBand>,
}

pub fn search_with_bands<'a>(
    records: &'a [EmployeeRecord],
    query: &str,
    targets: &Targets,
) -> Vec<SearchHit<'a>> {
    search_records(records, query)
        .into_iter()
        .map(|record| SearchHit {
            record,
            band: EfficiencyBand::of(record, targets),
        })
        .collect()
}
