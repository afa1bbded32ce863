pub mod event;
pub mod layout;
pub mod parser;
pub mod record;

use std::path::Path;

use serde::Serialize;
use tracing::info;

use crate::grid::loader::{file_name_of, LoadError};
use crate::grid::{load_grid_from_bytes, load_grid_from_path, Grid};

pub use event::{classify_row, extract_metric, RowEvent};
pub use layout::{detect_layout, ColumnMap, DetectionStrategy, LayoutDetection, Metric};
pub use parser::{parse_grid, EmployeeContext, ParserState};
pub use record::{EmployeeRecord, EmployeeTotals, Metrics, PERIOD_NOT_AVAILABLE};

/// Records extracted from one report file, with the layout that was used.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParsedReport {
    pub source_file: String,
    pub layout: LayoutDetection,
    pub records: Vec<EmployeeRecord>,
}

/// Detect the layout of an already loaded grid and run the extraction pass over it.
pub fn parse_report(grid: &Grid, source_file: &str) -> ParsedReport {
    let layout = detect_layout(grid);
    let records = parse_grid(grid, &layout.columns, source_file);
    info!(
        file = source_file,
        records = records.len(),
        strategy = ?layout.strategy,
        "report parsed"
    );
    ParsedReport {
        source_file: source_file.to_string(),
        layout,
        records,
    }
}

/// Bytes in, records out. The grid is dropped once extraction is done.
pub fn extract_report(bytes: &[u8], file_name: &str) -> Result<ParsedReport, LoadError> {
    let grid = load_grid_from_bytes(bytes, file_name)?;
    Ok(parse_report(&grid, file_name))
}

pub fn extract_report_file(path: &Path) -> Result<ParsedReport, LoadError> {
    let grid = load_grid_from_path(path)?;
    Ok(parse_report(&grid, &file_name_of(path)))
}
