//! Cleaned-data downloads: CSV and a single-sheet XLSX, both in dataset order.

use std::fs;
use std::io::Write;
use std::path::Path;

use rust_xlsxwriter::{ColNum, Format, RowNum, Workbook, XlsxError};
use thiserror::Error;

use crate::report::{EmployeeRecord, Metric};

pub const XLSX_SHEET_NAME: &str = "Employee_Efficiency";

pub const EXPORT_COLUMNS: [&str; 8] = [
    "Matricule",
    "Employee_Name",
    "Period",
    "Tps_Saisie",
    "Tps_Alloue",
    "Ecart",
    "Efficience_Tech",
    "Source_File",
];

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("csv export failed: {0}")]
    Csv(#[from] csv::Error),
    #[error("xlsx export failed: {0}")]
    Xlsx(#[from] XlsxError),
    #[error("failed to write '{path}': {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("{0} rows do not fit in a worksheet")]
    TooManyRows(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Xlsx,
}

impl ExportFormat {
    pub fn content_type(self) -> &'static str {
        match self {
            Self::Csv => "text/csv; charset=utf-8",
            Self::Xlsx => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        }
    }

    pub fn file_name(self) -> &'static str {
        match self {
            Self::Csv => "cleaned_efficiency_data.csv",
            Self::Xlsx => "cleaned_efficiency_data.xlsx",
        }
    }
}

pub fn write_csv<W: Write>(records: &[EmployeeRecord], writer: W) -> Result<(), ExportError> {
    let mut csv = csv::Writer::from_writer(writer);
    if records.is_empty() {
        csv.write_record(EXPORT_COLUMNS)?;
    }
    for record in records {
        csv.serialize(record)?;
    }
    csv.flush().map_err(csv::Error::from)?;
    Ok(())
}

pub fn csv_bytes(records: &[EmployeeRecord]) -> Result<Vec<u8>, ExportError> {
    let mut buffer = Vec::new();
    write_csv(records, &mut buffer)?;
    Ok(buffer)
}

pub fn xlsx_bytes(records: &[EmployeeRecord]) -> Result<Vec<u8>, ExportError> {
    let mut workbook = Workbook::new();
    let header = Format::new().set_bold();
    let hours = Format::new().set_num_format("0.00");
    let percent = Format::new().set_num_format("0.00%");

    let sheet = workbook.add_worksheet();
    sheet.set_name(XLSX_SHEET_NAME)?;
    for (col, name) in EXPORT_COLUMNS.iter().enumerate() {
        sheet.write_string_with_format(0, col as ColNum, *name, &header)?;
    }

    for (index, record) in records.iter().enumerate() {
        let row = RowNum::try_from(index + 1).map_err(|_| ExportError::TooManyRows(records.len()))?;
        sheet.write_string(row, 0, record.employee_id.as_str())?;
        sheet.write_string(row, 1, record.employee_name.as_str())?;
        sheet.write_string(row, 2, record.period.as_str())?;
        for (offset, metric) in Metric::ALL.iter().enumerate() {
            let Some(value) = record.metric(*metric) else {
                continue;
            };
            let format = if *metric == Metric::TechnicalEfficiency {
                &percent
            } else {
                &hours
            };
            sheet.write_number_with_format(row, 3 + offset as ColNum, value, format)?;
        }
        sheet.write_string(row, 7, record.source_file.as_str())?;
    }
    sheet.set_column_width(1, 28)?;
    sheet.set_column_width(7, 32)?;

    Ok(workbook.save_to_buffer()?)
}

pub fn export_bytes(records: &[EmployeeRecord], format: ExportFormat) -> Result<Vec<u8>, ExportError> {
    match format {
        ExportFormat::Csv => csv_bytes(records),
        ExportFormat::Xlsx => xlsx_bytes(records),
    }
}

pub fn export_to_path(
    records: &[EmployeeRecord],
    format: ExportFormat,
    path: &Path,
) -> Result<(), ExportError> {
    let bytes = export_bytes(records, format)?;
    fs::write(path, bytes).map_err(|source| ExportError::Write {
        path: path.display().to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, efficiency: Option<f64>) -> EmployeeRecord {
        EmployeeRecord {
            employee_id: id.to_string(),
            employee_name: "SADIK Amina".to_string(),
            period: "2025/12".to_string(),
            time_logged: Some(37.5),
            time_allocated: Some(40.0),
            variance: Some(-2.5),
            technical_efficiency: efficiency,
            source_file: "decembre.xls".to_string(),
        }
    }

    #[test]
    fn csv_has_header_and_blank_nulls() {
        let bytes = csv_bytes(&[record("7001", Some(0.9375)), record("7002", None)]).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], EXPORT_COLUMNS.join(","));
        assert_eq!(lines[1], "7001,SADIK Amina,2025/12,37.5,40.0,-2.5,0.9375,decembre.xls");
        assert_eq!(lines[2], "7002,SADIK Amina,2025/12,37.5,40.0,-2.5,,decembre.xls");
    }

    #[test]
    fn empty_csv_still_has_header() {
        let text = String::from_utf8(csv_bytes(&[]).unwrap()).unwrap();
        assert_eq!(text.trim_end(), EXPORT_COLUMNS.join(","));
    }

    #[test]
    fn xlsx_is_a_zip_container() {
        let bytes = xlsx_bytes(&[record("7001", Some(0.9375))]).unwrap();
        assert!(bytes.starts_with(b"PK\x03\x04"));
    }
}
