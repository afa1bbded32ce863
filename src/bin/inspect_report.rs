//! Inspect an X3 productivity report: print the grid size, the detected layout and how the
//! first rows are classified.
//! Usage: cargo run --bin inspect_report -- path/to/report.xls [rows]

use std::path::Path;

use prodeff::grid::{load_grid_from_path, row_text};
use prodeff::report::{classify_row, detect_layout, RowEvent};

fn event_tag(event: &RowEvent) -> &'static str {
    match event {
        RowEvent::Header { .. } => "HEADER",
        RowEvent::Period(_) => "PERIOD",
        RowEvent::Totals { .. } => "TOTALS",
        RowEvent::NoMatch => "",
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let path = std::env::args()
        .nth(1)
        .ok_or("Usage: inspect_report <path-to-report.xls> [rows]")?;
    let rows = std::env::args()
        .nth(2)
        .map(|raw| raw.parse::<usize>())
        .transpose()?
        .unwrap_or(25);
    let path = Path::new(&path);
    if !path.exists() {
        return Err(format!("File not found: {}", path.display()).into());
    }

    let grid = load_grid_from_path(path)?;
    println!("Size: {} rows x {} cols", grid.height(), grid.width());

    let layout = detect_layout(&grid);
    let columns = layout.columns;
    println!(
        "Layout: {:?} (time_logged={}, time_allocated={}, variance={}, technical_efficiency={})",
        layout.strategy,
        columns.time_logged,
        columns.time_allocated,
        columns.variance,
        columns.technical_efficiency
    );

    println!("First {rows} rows:");
    for (i, row) in grid.rows().iter().take(rows).enumerate() {
        let event = classify_row(row, &columns);
        println!("  {:>4} {:<7} {}", i, event_tag(&event), row_text(row));
    }
    Ok(())
}
