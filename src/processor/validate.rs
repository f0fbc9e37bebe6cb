//! Check the processed map against the engine's per-screen budgets.
//!
//! The map is rendered down to one entry per character cell. A window one
//! screen wide then slides across it, counting the distinct physical
//! characters and the colour changes it would have to display at once.
//! Over-budget windows are reported but never stop the conversion.

use std::collections::HashSet;

use serde::Serialize;
use tracing::{debug, warn};

use crate::processor::{
    Catalog, FLIP_X_BIT, FLIP_X_HIRES_BIT, MAX_COLOR_SHIFTS, MAX_PHYSICAL_CHARS, SCREEN_WIDTH,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Budget {
    PhysicalChars,
    ColorShifts,
}

/// One window position over budget.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Violation {
    pub budget: Budget,
    /// Leftmost character column of the window.
    pub char_column: usize,
    /// Map column holding `char_column`.
    pub tile_column: usize,
    pub count: usize,
    pub limit: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    pub viewport_width: usize,
    pub max_physical_chars: usize,
    pub max_color_shifts: usize,
    pub violations: Vec<Violation>,
}

impl ValidationReport {
    pub fn is_within_budget(&self) -> bool {
        self.violations.is_empty()
    }
}

/// One rendered character cell.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Cell {
    /// Character index and effective flips, hires x flip on its own bit.
    pub bits: u16,
    pub color: u8,
}

/// The map expanded to character cells, row-major.
#[derive(Debug, Clone, Default)]
pub struct RenderedMap {
    pub columns: usize,
    pub rows: usize,
    cells: Vec<Cell>,
}

impl RenderedMap {
    pub fn get(&self, row: usize, col: usize) -> Cell {
        self.cells[row * self.columns + col]
    }
}

pub fn render(catalog: &Catalog, tile_width: usize, tile_height: usize) -> RenderedMap {
    let columns = catalog.map.width() * tile_width;
    let rows = catalog.map.height() * tile_height;
    let mut cells = Vec::with_capacity(columns * rows);

    for row in 0..rows {
        for col in 0..columns {
            let vt = catalog.vir_tiles[catalog.map.get(row / tile_height, col / tile_width)];
            let tile = &catalog.tiles[vt.tile_index];

            let mut tile_row = row % tile_height;
            let mut tile_col = col % tile_width;
            if vt.flip_y {
                tile_row = tile_height - 1 - tile_row;
            }
            if vt.flip_x {
                tile_col = tile_width - 1 - tile_col;
            }

            let vc = tile.cell(tile_row, tile_col);
            let mut bits = vc.char_bits(vt.flip_x, vt.flip_y, &catalog.chars);
            if vc.is_hires() && bits & FLIP_X_BIT != 0 {
                bits = (bits & !FLIP_X_BIT) | FLIP_X_HIRES_BIT;
            }
            cells.push(Cell {
                bits,
                color: vc.color,
            });
        }
    }

    RenderedMap {
        columns,
        rows,
        cells,
    }
}

fn physical_chars(map: &RenderedMap, start: usize, width: usize) -> usize {
    let mut seen = HashSet::new();
    for row in 0..map.rows {
        for col in start..start + width {
            seen.insert(map.get(row, col).bits);
        }
    }
    seen.len()
}

fn color_shifts(map: &RenderedMap, start: usize, width: usize) -> usize {
    (0..map.rows)
        .map(|row| {
            (start + 1..start + width)
                .filter(|&col| map.get(row, col).color != map.get(row, col - 1).color)
                .count()
        })
        .sum()
}

/// Slide a screen-wide window over every horizontal position of the map.
/// Maps narrower than the screen are checked once at their own width.
pub fn run(catalog: &Catalog, tile_width: usize, tile_height: usize) -> ValidationReport {
    let map = render(catalog, tile_width, tile_height);
    let viewport = SCREEN_WIDTH.min(map.columns);
    let mut report = ValidationReport {
        viewport_width: viewport,
        ..Default::default()
    };
    if viewport == 0 {
        return report;
    }

    for start in 0..=map.columns - viewport {
        let tile_column = start / tile_width;

        let chars = physical_chars(&map, start, viewport);
        report.max_physical_chars = report.max_physical_chars.max(chars);
        if chars > MAX_PHYSICAL_CHARS {
            warn!(
                "Too many physical chars at column {} (tile column {}): {} > {}",
                start, tile_column, chars, MAX_PHYSICAL_CHARS
            );
            report.violations.push(Violation {
                budget: Budget::PhysicalChars,
                char_column: start,
                tile_column,
                count: chars,
                limit: MAX_PHYSICAL_CHARS,
            });
        }

        let shifts = color_shifts(&map, start, viewport);
        report.max_color_shifts = report.max_color_shifts.max(shifts);
        if shifts > MAX_COLOR_SHIFTS {
            warn!(
                "Too many color shifts at column {} (tile column {}): {} > {}",
                start, tile_column, shifts, MAX_COLOR_SHIFTS
            );
            report.violations.push(Violation {
                budget: Budget::ColorShifts,
                char_column: start,
                tile_column,
                count: shifts,
                limit: MAX_COLOR_SHIFTS,
            });
        }
    }

    debug!(
        "Validated {} window positions: max {} physical chars, max {} color shifts",
        map.columns - viewport + 1,
        report.max_physical_chars,
        report.max_color_shifts
    );
    report
}
