//! plot/layout.rs — geometry and labelling of the subplot matrix.
//!
//! Plots are numbered column-major from the bottom-left corner:
//! `p = row + column · MATRIX_ROWS`, with row 0 at the bottom of the figure.

use crate::core::linspace::Linspace;

pub const MATRIX_ROWS: usize = 5;
pub const MATRIX_COLS: usize = 5;
pub const PLOT_COUNT: usize = MATRIX_ROWS * MATRIX_COLS;

#[inline]
pub fn plot_number(row: usize, column: usize) -> usize {
    row + column * MATRIX_ROWS
}

/// Inverse of [`plot_number`].
#[inline]
pub fn row_column(p: usize) -> (usize, usize) {
    (p % MATRIX_ROWS, p / MATRIX_ROWS)
}

/// Index into drawing areas split row-major from the top-left corner.
#[inline]
pub fn cell_index(row: usize, column: usize) -> usize {
    (MATRIX_ROWS - 1 - row) * MATRIX_COLS + column
}

/// `count` evenly spaced parameter values from `min` to `max`.
pub fn parameter_values(min: f64, max: f64, count: usize) -> Vec<f64> {
    Linspace::new(min, count, max).points().collect()
}

/// `"k_m = -1.00"` style label.
pub fn parameter_label(name: &str, value: f64) -> String {
    format!("{name} = {value:5.2}")
}

/// Extra pixels reserved around the plotting areas of edge cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EdgeMargins {
    /// Column captions above the top row.
    pub top: u32,
    /// Tick labels and description below the bottom row.
    pub bottom: u32,
    /// Tick labels and description left of the first column.
    pub left: u32,
    /// Row captions right of the last column.
    pub right: u32,
}

impl EdgeMargins {
    pub fn from_fonts(label_size: f64, tick_size: f64) -> Self {
        let caption = (label_size * 2.0).ceil() as u32;
        let axis = (tick_size * 1.5 + label_size * 1.8).ceil() as u32;
        Self {
            top: caption,
            bottom: axis,
            left: (tick_size * 3.0 + label_size * 1.8).ceil() as u32,
            right: caption,
        }
    }
}

/// Interior breakpoints splitting `extent` pixels into `cells` parts whose
/// inner widths are equal once `lead` and `trail` are added to the first and
/// last part.
pub fn breakpoints(extent: u32, cells: usize, lead: u32, trail: u32) -> Vec<i32> {
    if cells == 0 {
        return Vec::new();
    }
    let inner = extent.saturating_sub(lead + trail) as f64 / cells as f64;
    (1..cells)
        .map(|i| (lead as f64 + inner * i as f64).round() as i32)
        .collect()
}
