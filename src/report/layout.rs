//! Column layout detection.
//!
//! X3 prints the same report in two widths. The compact variant keeps the four figures in
//! columns 1..=4; the expanded variant spreads them over 26 columns. A header row with
//! "Tps Saisie"/"Tps Alloué" labels, when present, names the columns directly and wins over
//! the width heuristic.

use serde::Serialize;
use tracing::{debug, warn};

use crate::grid::{row_text, Cell, Grid};

const HEADER_MARKERS: [&str; 2] = ["Tps Saisie", "Tps Alloué"];
const TOTALS_MARKER: &str = "TOTAL MATRICULE";
const COMPACT_MAX_WIDTH: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Metric {
    TimeLogged,
    TimeAllocated,
    Variance,
    TechnicalEfficiency,
}

impl Metric {
    pub const ALL: [Metric; 4] = [
        Metric::TimeLogged,
        Metric::TimeAllocated,
        Metric::Variance,
        Metric::TechnicalEfficiency,
    ];

    /// Column name used in exports and summaries.
    pub fn column_name(self) -> &'static str {
        match self {
            Metric::TimeLogged => "Tps_Saisie",
            Metric::TimeAllocated => "Tps_Alloue",
            Metric::Variance => "Ecart",
            Metric::TechnicalEfficiency => "Efficience_Tech",
        }
    }
}

/// Column index of each metric within a grid row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ColumnMap {
    pub time_logged: usize,
    pub time_allocated: usize,
    pub variance: usize,
    pub technical_efficiency: usize,
}

impl ColumnMap {
    pub const COMPACT: Self = Self {
        time_logged: 1,
        time_allocated: 2,
        variance: 3,
        technical_efficiency: 4,
    };

    pub const EXPANDED: Self = Self {
        time_logged: 13,
        time_allocated: 16,
        variance: 18,
        technical_efficiency: 25,
    };

    /// Fixed table keyed on the grid's column count.
    pub fn for_width(width: usize) -> Self {
        if width <= COMPACT_MAX_WIDTH {
            Self::COMPACT
        } else {
            Self::EXPANDED
        }
    }

    pub fn get(&self, metric: Metric) -> usize {
        match metric {
            Metric::TimeLogged => self.time_logged,
            Metric::TimeAllocated => self.time_allocated,
            Metric::Variance => self.variance,
            Metric::TechnicalEfficiency => self.technical_efficiency,
        }
    }

    pub fn indices(&self) -> [usize; 4] {
        [
            self.time_logged,
            self.time_allocated,
            self.variance,
            self.technical_efficiency,
        ]
    }

    pub fn is_distinct(&self) -> bool {
        let idx = self.indices();
        (0..idx.len()).all(|i| !idx[i + 1..].contains(&idx[i]))
    }
}

impl Default for ColumnMap {
    fn default() -> Self {
        Self::COMPACT
    }
}

/// Which rule produced the column map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectionStrategy {
    HeaderLabels,
    Width,
    Default,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LayoutDetection {
    pub columns: ColumnMap,
    pub strategy: DetectionStrategy,
}

/// Partial result of reading a labelled header row.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LabelledColumns {
    pub time_logged: Option<usize>,
    pub time_allocated: Option<usize>,
    pub variance: Option<usize>,
    pub technical_efficiency: Option<usize>,
}

impl LabelledColumns {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Fill metrics the header did not name from `fallback`.
    pub fn complete_with(&self, fallback: ColumnMap) -> ColumnMap {
        ColumnMap {
            time_logged: self.time_logged.unwrap_or(fallback.time_logged),
            time_allocated: self.time_allocated.unwrap_or(fallback.time_allocated),
            variance: self.variance.unwrap_or(fallback.variance),
            technical_efficiency: self
                .technical_efficiency
                .unwrap_or(fallback.technical_efficiency),
        }
    }
}

/// Detect the layout of `grid`: labelled header row, then width at the first totals row,
/// then the compact default. Columns past the grid's width are kept and logged; their
/// figures extract as null.
pub fn detect_layout(grid: &Grid) -> LayoutDetection {
    let detection = choose_layout(grid);
    let width = grid.width();
    if width > 0 {
        let missing = columns_beyond(&detection.columns, width);
        if !missing.is_empty() {
            warn!(
                ?missing,
                columns = ?detection.columns,
                width,
                "metric columns lie beyond the grid; their figures will be null"
            );
        }
    }
    detection
}

/// Metrics whose column index is not below `width`.
pub fn columns_beyond(columns: &ColumnMap, width: usize) -> Vec<Metric> {
    Metric::ALL
        .into_iter()
        .filter(|metric| columns.get(*metric) >= width)
        .collect()
}

fn choose_layout(grid: &Grid) -> LayoutDetection {
    let labelled = find_header_labels(grid);
    let by_width = width_layout(grid);

    if let Some(labels) = labelled {
        let fallback = by_width.unwrap_or_default();
        let columns = labels.complete_with(fallback);
        if !columns.is_distinct() {
            warn!(
                ?labels,
                ?fallback,
                "header labels collide with fallback columns; using width table"
            );
            return LayoutDetection {
                columns: fallback,
                strategy: if by_width.is_some() {
                    DetectionStrategy::Width
                } else {
                    DetectionStrategy::Default
                },
            };
        }
        if let Some(width_columns) = by_width {
            if width_columns != columns {
                warn!(
                    ?columns,
                    ?width_columns,
                    width = grid.width(),
                    "header labels disagree with width-based layout; keeping header labels"
                );
            }
        }
        debug!(?columns, "layout from header labels");
        return LayoutDetection {
            columns,
            strategy: DetectionStrategy::HeaderLabels,
        };
    }

    match by_width {
        Some(columns) => {
            debug!(?columns, width = grid.width(), "layout from grid width");
            LayoutDetection {
                columns,
                strategy: DetectionStrategy::Width,
            }
        }
        None => {
            debug!("no header or totals row found; using compact layout");
            LayoutDetection {
                columns: ColumnMap::default(),
                strategy: DetectionStrategy::Default,
            }
        }
    }
}

/// Width-based map, available only when the grid contains a totals row.
pub fn width_layout(grid: &Grid) -> Option<ColumnMap> {
    grid.rows()
        .iter()
        .any(|row| row_text(row).contains(TOTALS_MARKER))
        .then(|| ColumnMap::for_width(grid.width()))
}

/// Read metric columns from the first row carrying both header markers. Returns `None` when
/// no such row exists. A marker row always names at least one metric: cells are joined with
/// spaces, so "Alloué" must sit inside a single text cell.
pub fn find_header_labels(grid: &Grid) -> Option<LabelledColumns> {
    let header = grid.rows().iter().find(|row| {
        let text = row_text(row);
        HEADER_MARKERS.iter().all(|marker| text.contains(marker))
    })?;

    let labels = labels_from_row(header);
    (!labels.is_empty()).then_some(labels)
}

fn labels_from_row(row: &[Cell]) -> LabelledColumns {
    let mut labels = LabelledColumns::default();
    for (col, cell) in row.iter().enumerate() {
        let Cell::Text(raw) = cell else {
            continue;
        };
        let label = raw.trim();
        // Order matters: "Ecart (Alloué-Réalisé)" also contains "Alloué".
        if label.contains("Ecart") {
            labels.variance = Some(col);
        } else if label.contains("Tps Saisie") {
            labels.time_logged = Some(col);
        } else if label.contains("Alloué") {
            labels.time_allocated = Some(col);
        } else if label.contains("Efficience") {
            // The efficiency figure sits one column right of its label.
            labels.technical_efficiency = Some(col + 1);
        }
    }
    labels
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(cells: &[(usize, &str)], width: usize) -> Vec<Cell> {
        let mut row = vec![Cell::Empty; width];
        for (col, text) in cells {
            row[*col] = Cell::text(*text);
        }
        row
    }

    #[test]
    fn compact_width_selects_compact_map() {
        let grid = Grid::new(vec![row(&[(0, "TOTAL MATRICULE : 12 345")], 5)]);
        let detection = detect_layout(&grid);
        assert_eq!(detection.columns, ColumnMap::COMPACT);
        assert_eq!(detection.strategy, DetectionStrategy::Width);
    }

    #[test]
    fn wide_grid_selects_expanded_map() {
        let grid = Grid::new(vec![row(&[(0, "TOTAL MATRICULE : 12 345")], 26)]);
        let detection = detect_layout(&grid);
        assert_eq!(detection.columns, ColumnMap::EXPANDED);
        assert_eq!(detection.strategy, DetectionStrategy::Width);
    }

    #[test]
    fn width_boundary_is_inclusive_at_ten() {
        assert_eq!(ColumnMap::for_width(10), ColumnMap::COMPACT);
        assert_eq!(ColumnMap::for_width(11), ColumnMap::EXPANDED);
        assert_eq!(ColumnMap::for_width(0), ColumnMap::COMPACT);
    }

    #[test]
    fn missing_markers_default_to_compact() {
        let grid = Grid::new(vec![row(&[(0, "Rapport de production")], 30)]);
        let detection = detect_layout(&grid);
        assert_eq!(detection.columns, ColumnMap::COMPACT);
        assert_eq!(detection.strategy, DetectionStrategy::Default);
    }

    #[test]
    fn header_labels_win_over_width() {
        let header = row(
            &[
                (2, "Tps Saisie"),
                (5, "Tps Alloué"),
                (7, "Ecart (Alloué-Réalisé)"),
                (9, "Efficience Tech."),
            ],
            26,
        );
        let totals = row(&[(0, "TOTAL MATRICULE : 1 001")], 26);
        let grid = Grid::new(vec![header, totals]);

        let detection = detect_layout(&grid);
        assert_eq!(detection.strategy, DetectionStrategy::HeaderLabels);
        assert_eq!(
            detection.columns,
            ColumnMap {
                time_logged: 2,
                time_allocated: 5,
                variance: 7,
                technical_efficiency: 10,
            }
        );
    }

    #[test]
    fn partial_labels_are_completed_from_width_table() {
        let header = row(&[(1, "Tps Saisie"), (2, "Tps Alloué")], 8);
        let grid = Grid::new(vec![header]);

        let detection = detect_layout(&grid);
        assert_eq!(detection.strategy, DetectionStrategy::HeaderLabels);
        assert_eq!(detection.columns, ColumnMap::COMPACT);
    }

    #[test]
    fn colliding_labels_fall_back_to_width_table() {
        // Time logged labelled at column 3 lands on the compact variance column.
        let header = row(&[(0, "Efficience"), (3, "Tps Saisie Tps Alloué")], 8);
        let totals = row(&[(0, "TOTAL MATRICULE : 1")], 8);
        let grid = Grid::new(vec![header, totals]);

        let detection = detect_layout(&grid);
        assert_eq!(detection.columns, ColumnMap::COMPACT);
        assert_eq!(detection.strategy, DetectionStrategy::Width);
    }

    #[test]
    fn narrow_grid_keeps_compact_map_and_reports_missing_columns() {
        let grid = Grid::new(vec![row(&[(0, "TOTAL MATRICULE : 5")], 3)]);
        let detection = detect_layout(&grid);
        assert_eq!(detection.columns, ColumnMap::COMPACT);
        assert_eq!(
            columns_beyond(&detection.columns, grid.width()),
            [Metric::Variance, Metric::TechnicalEfficiency]
        );
        assert!(columns_beyond(&ColumnMap::COMPACT, 5).is_empty());
        assert_eq!(columns_beyond(&ColumnMap::EXPANDED, 25), [Metric::TechnicalEfficiency]);
    }

    #[test]
    fn marker_row_split_across_cells_still_names_a_metric() {
        for cells in [
            vec![(0usize, "Tps"), (1, "Saisie Tps"), (2, "Alloué")],
            vec![(0, "Tps Saisie Tps"), (1, "Alloué")],
            vec![(0, "x Tps"), (1, "Saisie"), (3, "Tps Alloué y")],
        ] {
            let grid = Grid::new(vec![row(&cells, 6)]);
            let labels = find_header_labels(&grid).expect("marker row names a metric");
            assert!(!labels.is_empty());
        }
        let no_markers = Grid::new(vec![row(&[(0, "Tps"), (1, "Allou"), (2, "é")], 4)]);
        assert_eq!(find_header_labels(&no_markers), None);
    }

    #[test]
    fn builtin_maps_are_distinct() {
        assert!(ColumnMap::COMPACT.is_distinct());
        assert!(ColumnMap::EXPANDED.is_distinct());
    }
}
