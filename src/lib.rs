//! Extraction of employee time-efficiency records from X3 production reports.
//!
//! The pipeline is bytes -> [grid::Grid] -> [report::ColumnMap] -> [report::EmployeeRecord]s
//! -> [dataset::Dataset]. Everything outside `server` and `cli` is synchronous and free of
//! process-wide state so it can be driven from any front end or test.

pub mod cli;
pub mod config;
pub mod dataset;
pub mod grid;
pub mod parallel;
pub mod report;
pub mod server;
