//! Load the first worksheet of a report workbook into a [Grid].
//!
//! Reports are small enough to be held in memory, so both entry points work from a byte
//! buffer: no staging file is ever written.

use std::fs;
use std::io::Cursor;
use std::path::Path;

use calamine::{open_workbook_from_rs, Data, Range, Reader, Xls, Xlsx};
use thiserror::Error;
use tracing::debug;

use super::{Cell, Grid};

const OLE2_SIGNATURE: [u8; 8] = [0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];
const ZIP_SIGNATURE: [u8; 4] = [0x50, 0x4B, 0x03, 0x04];

#[derive(Debug, Error)]
pub enum LoadError {
    /// The bytes are not a workbook we can read. Fatal for this file only.
    #[error("unreadable spreadsheet '{file_name}': {reason}")]
    Unreadable { file_name: String, reason: String },
    #[error("failed to read '{path}': {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl LoadError {
    fn unreadable(file_name: &str, reason: impl ToString) -> Self {
        Self::Unreadable {
            file_name: file_name.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// Container format, sniffed from the leading bytes rather than the file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpreadsheetFormat {
    /// Legacy BIFF workbook in an OLE2 compound file (`.xls`), the format X3 exports.
    Xls,
    /// Office Open XML (`.xlsx`), for reports that were re-saved by hand.
    Xlsx,
}

impl SpreadsheetFormat {
    pub fn sniff(bytes: &[u8]) -> Option<Self> {
        if bytes.starts_with(&OLE2_SIGNATURE) {
            Some(Self::Xls)
        } else if bytes.starts_with(&ZIP_SIGNATURE) {
            Some(Self::Xlsx)
        } else {
            None
        }
    }
}

/// Load the first worksheet of `bytes`. `file_name` is only used in error messages and logs.
pub fn load_grid_from_bytes(bytes: &[u8], file_name: &str) -> Result<Grid, LoadError> {
    let format = SpreadsheetFormat::sniff(bytes)
        .ok_or_else(|| LoadError::unreadable(file_name, "not an .xls or .xlsx workbook"))?;

    let range = match format {
        SpreadsheetFormat::Xls => {
            let mut workbook: Xls<_> = open_workbook_from_rs(Cursor::new(bytes))
                .map_err(|err| LoadError::unreadable(file_name, err))?;
            workbook
                .worksheet_range_at(0)
                .ok_or_else(|| LoadError::unreadable(file_name, "workbook has no worksheet"))?
                .map_err(|err| LoadError::unreadable(file_name, err))?
        }
        SpreadsheetFormat::Xlsx => {
            let mut workbook: Xlsx<_> = open_workbook_from_rs(Cursor::new(bytes))
                .map_err(|err| LoadError::unreadable(file_name, err))?;
            workbook
                .worksheet_range_at(0)
                .ok_or_else(|| LoadError::unreadable(file_name, "workbook has no worksheet"))?
                .map_err(|err| LoadError::unreadable(file_name, err))?
        }
    };

    let grid = grid_from_range(&range);
    debug!(
        file = file_name,
        ?format,
        rows = grid.height(),
        cols = grid.width(),
        "loaded worksheet"
    );
    Ok(grid)
}

pub fn load_grid_from_path(path: &Path) -> Result<Grid, LoadError> {
    let bytes = fs::read(path).map_err(|source| LoadError::Read {
        path: path.display().to_string(),
        source,
    })?;
    load_grid_from_bytes(&bytes, &file_name_of(path))
}

pub fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Re-anchor a used range at A1 so column indices are absolute sheet columns.
fn grid_from_range(range: &Range<Data>) -> Grid {
    let Some((start_row, start_col)) = range.start() else {
        return Grid::default();
    };
    let leading_cols = start_col as usize;

    let mut rows: Vec<Vec<Cell>> = vec![Vec::new(); start_row as usize];
    for source_row in range.rows() {
        let mut row = Vec::with_capacity(leading_cols + source_row.len());
        row.resize(leading_cols, Cell::Empty);
        row.extend(source_row.iter().map(cell_from_data));
        rows.push(row);
    }
    Grid::new(rows)
}

fn cell_from_data(data: &Data) -> Cell {
    match data {
        Data::Empty | Data::Error(_) => Cell::Empty,
        Data::Int(i) => Cell::Number(*i as f64),
        Data::Float(f) => Cell::Number(*f),
        Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s) => Cell::text(s.as_str()),
        Data::Bool(b) => Cell::Text(b.to_string()),
        Data::DateTime(dt) => Cell::Number(dt.as_f64()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sniff_recognises_containers() {
        assert_eq!(
            SpreadsheetFormat::sniff(&OLE2_SIGNATURE),
            Some(SpreadsheetFormat::Xls)
        );
        assert_eq!(
            SpreadsheetFormat::sniff(b"PK\x03\x04rest"),
            Some(SpreadsheetFormat::Xlsx)
        );
        assert_eq!(SpreadsheetFormat::sniff(b"Matricule;Nom\n"), None);
        assert_eq!(SpreadsheetFormat::sniff(b""), None);
    }

    #[test]
    fn truncated_ole2_header_is_unreadable() {
        let err = load_grid_from_bytes(&OLE2_SIGNATURE, "broken.xls").unwrap_err();
        assert!(matches!(err, LoadError::Unreadable { ref file_name, .. } if file_name == "broken.xls"));
    }

    #[test]
    fn range_is_reanchored_at_a1() {
        let mut range: Range<Data> = Range::new((2, 1), (3, 2));
        range.set_value((2, 1), Data::String("Matricule : 1 - A".to_string()));
        range.set_value((3, 2), Data::Float(4.5));

        let grid = grid_from_range(&range);
        assert_eq!(grid.height(), 4);
        assert_eq!(grid.cell(2, 1), Some(&Cell::text("Matricule : 1 - A")));
        assert_eq!(grid.cell(3, 2), Some(&Cell::Number(4.5)));
        assert_eq!(grid.cell(3, 0), Some(&Cell::Empty));
        assert_eq!(grid.width(), 3);
    }
}
