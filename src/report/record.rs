use serde::{Deserialize, Serialize};

use crate::report::layout::Metric;

/// Period used when no `YYYY/MM` line preceded an employee's totals line.
pub const PERIOD_NOT_AVAILABLE: &str = "N/A";

/// The four figures printed on a totals line. Each is `None` when the mapped cell is
/// missing, blank or not numeric.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Metrics {
    pub time_logged: Option<f64>,
    pub time_allocated: Option<f64>,
    pub variance: Option<f64>,
    pub technical_efficiency: Option<f64>,
}

/// One employee section, before it is stamped with the file it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct EmployeeTotals {
    pub employee_id: String,
    pub employee_name: String,
    pub period: String,
    pub metrics: Metrics,
}

impl EmployeeTotals {
    pub fn into_record(self, source_file: &str) -> EmployeeRecord {
        EmployeeRecord {
            employee_id: self.employee_id,
            employee_name: self.employee_name,
            period: self.period,
            time_logged: self.metrics.time_logged,
            time_allocated: self.metrics.time_allocated,
            variance: self.metrics.variance,
            technical_efficiency: self.metrics.technical_efficiency,
            source_file: source_file.to_string(),
        }
    }
}

/// Output row of the parser. Serialized names are the column names of the cleaned export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmployeeRecord {
    #[serde(rename = "Matricule")]
    pub employee_id: String,
    #[serde(rename = "Employee_Name")]
    pub employee_name: String,
    #[serde(rename = "Period")]
    pub period: String,
    #[serde(rename = "Tps_Saisie")]
    pub time_logged: Option<f64>,
    #[serde(rename = "Tps_Alloue")]
    pub time_allocated: Option<f64>,
    #[serde(rename = "Ecart")]
    pub variance: Option<f64>,
    #[serde(rename = "Efficience_Tech")]
    pub technical_efficiency: Option<f64>,
    #[serde(rename = "Source_File")]
    pub source_file: String,
}

impl EmployeeRecord {
    pub fn has_period(&self) -> bool {
        self.period != PERIOD_NOT_AVAILABLE
    }

    pub fn metric(&self, metric: Metric) -> Option<f64> {
        match metric {
            Metric::TimeLogged => self.time_logged,
            Metric::TimeAllocated => self.time_allocated,
            Metric::Variance => self.variance,
            Metric::TechnicalEfficiency => self.technical_efficiency,
        }
    }
}
