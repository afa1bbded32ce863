#![allow(dead_code)]

use rust_xlsxwriter::{Workbook, XlsxError};

/// One employee section of a compact X3 report.
pub struct Section<'a> {
    pub id: &'a str,
    pub name: &'a str,
    pub period: Option<&'a str>,
    pub metrics: [f64; 4],
}

impl<'a> Section<'a> {
    pub fn new(id: &'a str, name: &'a str, period: Option<&'a str>, metrics: [f64; 4]) -> Self {
        Self {
            id,
            name,
            period,
            metrics,
        }
    }
}

/// Build an `.xlsx` workbook laid out like a compact productivity report.
pub fn report_xlsx(sections: &[Section<'_>]) -> Result<Vec<u8>, XlsxError> {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.write_string(0, 0, "EFFICIENCE PAR MATRICULE")?;

    let mut row = 2u32;
    for section in sections {
        sheet.write_string(row, 0, format!("Matricule : {} - {}", section.id, section.name))?;
        row += 1;
        if let Some(period) = section.period {
            sheet.write_string(row, 0, period)?;
            row += 1;
        }
        sheet.write_string(row, 0, "OF 1200 Montage")?;
        sheet.write_number(row, 1, section.metrics[0] / 2.0)?;
        row += 1;
        sheet.write_string(row, 0, format!("TOTAL MATRICULE : {}", section.id))?;
        for (offset, value) in section.metrics.iter().enumerate() {
            sheet.write_number(row, offset as u16 + 1, *value)?;
        }
        row += 2;
    }
    workbook.save_to_buffer()
}

pub fn three_sections(period: &str) -> Vec<Section<'_>> {
    vec![
        Section::new("7 001", "SADIK Amina", Some(period), [37.5, 40.0, -2.5, 0.9375]),
        Section::new("812", "BENALI Karim", Some(period), [10.0, 12.0, -2.0, 0.83]),
        Section::new("9 040", "MARTIN Lea", None, [42.0, 35.0, 7.0, 1.2]),
    ]
}
