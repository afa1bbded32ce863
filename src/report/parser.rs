//! Extraction state machine.
//!
//! Rows are classified into [RowEvent]s and folded through [ParserState::apply]. A record is
//! produced only for a section that saw a header and then a totals line, in that order; any
//! period line in between (or before) is carried along.

use tracing::{debug, warn};

use crate::grid::Grid;
use crate::report::event::{classify_row, RowEvent};
use crate::report::layout::ColumnMap;
use crate::report::record::{EmployeeRecord, EmployeeTotals, PERIOD_NOT_AVAILABLE};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmployeeContext {
    pub employee_id: String,
    pub employee_name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParserState {
    pub employee: Option<EmployeeContext>,
    pub period: Option<String>,
}

impl ParserState {
    /// Advance by one row event. Returns the completed section when `event` closes one.
    pub fn apply(self, event: RowEvent) -> (Self, Option<EmployeeTotals>) {
        match event {
            RowEvent::Header {
                employee_id,
                employee_name,
                period,
            } => {
                if let Some(dropped) = &self.employee {
                    debug!(
                        employee_id = %dropped.employee_id,
                        "section ended without a totals line; dropped"
                    );
                }
                let next = Self {
                    employee: Some(EmployeeContext {
                        employee_id,
                        employee_name,
                    }),
                    period,
                };
                (next, None)
            }
            RowEvent::Period(period) => (
                Self {
                    period: Some(period),
                    ..self
                },
                None,
            ),
            RowEvent::Totals {
                employee_id: printed_id,
                metrics,
            } => {
                let Some(employee) = self.employee else {
                    debug!(?printed_id, "totals line without an employee header; ignored");
                    return (
                        Self {
                            employee: None,
                            period: self.period,
                        },
                        None,
                    );
                };
                if let Some(printed) = printed_id.filter(|id| *id != employee.employee_id) {
                    warn!(
                        header_id = %employee.employee_id,
                        totals_id = %printed,
                        "totals matricule differs from section header"
                    );
                }
                let totals = EmployeeTotals {
                    employee_id: employee.employee_id,
                    employee_name: employee.employee_name,
                    period: self
                        .period
                        .unwrap_or_else(|| PERIOD_NOT_AVAILABLE.to_string()),
                    metrics,
                };
                (Self::default(), Some(totals))
            }
            RowEvent::NoMatch => (self, None),
        }
    }
}

/// Scan `grid` top to bottom and emit one record per completed employee section.
pub fn parse_grid(grid: &Grid, columns: &ColumnMap, source_file: &str) -> Vec<EmployeeRecord> {
    let mut state = ParserState::default();
    let mut records = Vec::new();

    for row in grid.rows() {
        let (next, emitted) = state.apply(classify_row(row, columns));
        state = next;
        if let Some(totals) = emitted {
            debug!(
                file = source_file,
                employee_id = %totals.employee_id,
                period = %totals.period,
                "employee record"
            );
            records.push(totals.into_record(source_file));
        }
    }

    if let Some(open) = state.employee {
        debug!(
            file = source_file,
            employee_id = %open.employee_id,
            "report ended inside an employee section; dropped"
        );
    }
    records
}
