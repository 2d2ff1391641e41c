//! plot/figure.rs — renders the 5×5 filled-contour matrix and its colour bar.

use std::path::Path;

use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};

use crate::config::RenderConfig;
use crate::core::colormap::BandPalette;
use crate::core::contour::ContourLevels;
use crate::core::interp::{Bounds, GridField};
use crate::error::{KurticError, KurticResult};
use crate::plot::layout::{
    self, EdgeMargins, MATRIX_COLS, MATRIX_ROWS, breakpoints, cell_index, parameter_label,
};

/// Share of the figure width given to the subplot matrix.
const GRID_WIDTH_RATIO: f64 = 0.9;
/// Triangle height of the colour-bar extensions, relative to the value span.
const EXTENSION_RATIO: f64 = 0.04;
const CELL_GAP: u32 = 6;

/// Everything the renderer needs besides the output location.
pub struct Figure<'a> {
    pub title: String,
    /// Indexed by plot number.
    pub fields: &'a [GridField],
    /// Shared axis range of every subplot.
    pub bounds: Bounds,
    pub levels: &'a ContourLevels,
    pub palette: &'a BandPalette,
    /// Column parameter values, left to right.
    pub column_values: Vec<f64>,
    /// Row parameter values, bottom to top.
    pub row_values: Vec<f64>,
}

type Area<'b> = DrawingArea<BitMapBackend<'b>, Shift>;

pub fn render(figure: &Figure<'_>, style: &RenderConfig, output: &Path) -> KurticResult<()> {
    let root = BitMapBackend::new(output, (style.width, style.height)).into_drawing_area();
    root.fill(&WHITE).map_err(KurticError::plot)?;

    let family = style.font_family.as_str();
    let body = root
        .titled(&figure.title, (family, style.title_font_size))
        .map_err(KurticError::plot)?;

    let (body_width, _) = body.dim_in_pixel();
    let grid_width = (body_width as f64 * GRID_WIDTH_RATIO).round() as u32;
    let (grid_area, bar_area) = body.split_horizontally(grid_width);

    let margins = EdgeMargins::from_fonts(style.label_font_size, style.tick_font_size);
    let (grid_w, grid_h) = grid_area.dim_in_pixel();
    let cells = grid_area.split_by_breakpoints(
        breakpoints(grid_w, MATRIX_COLS, margins.left, margins.right),
        breakpoints(grid_h, MATRIX_ROWS, margins.top, margins.bottom),
    );

    for (p, field) in figure.fields.iter().enumerate() {
        let (row, column) = layout::row_column(p);
        let cell = &cells[cell_index(row, column)];
        draw_cell(cell, figure, field, row, column, &margins, style)?;
    }

    draw_colorbar(&bar_area, figure, &margins, style)?;
    root.present().map_err(KurticError::plot)?;
    Ok(())
}

fn draw_cell(
    cell: &Area<'_>,
    figure: &Figure<'_>,
    field: &GridField,
    row: usize,
    column: usize,
    margins: &EdgeMargins,
    style: &RenderConfig,
) -> KurticResult<()> {
    let family = style.font_family.as_str();
    let is_top = row == MATRIX_ROWS - 1;
    let is_bottom = row == 0;
    let is_left = column == 0;
    let is_right = column == MATRIX_COLS - 1;
    let caption_style = TextStyle::from((family, style.label_font_size).into_font())
        .pos(Pos::new(HPos::Center, VPos::Center));

    let mut area = cell.margin(0, 0, 0, 0);
    if is_top {
        let (strip, rest) = area.split_vertically(margins.top);
        let (w, h) = strip.dim_in_pixel();
        let label = parameter_label(&style.column_label, figure.column_values[column]);
        strip
            .draw_text(&label, &caption_style, ((w / 2) as i32, (h / 2) as i32))
            .map_err(KurticError::plot)?;
        area = rest;
    }
    if is_right {
        let (w, _) = area.dim_in_pixel();
        let (rest, strip) = area.split_horizontally(w.saturating_sub(margins.right));
        let (sw, sh) = strip.dim_in_pixel();
        let label = parameter_label(&style.row_label, figure.row_values[row]);
        strip
            .draw_text(
                &label,
                &caption_style.transform(FontTransform::Rotate270),
                ((sw / 2) as i32, (sh / 2) as i32),
            )
            .map_err(KurticError::plot)?;
        area = rest;
    }

    let b = figure.bounds;
    let mut chart = ChartBuilder::on(&area)
        .margin(CELL_GAP / 2)
        .x_label_area_size(if is_bottom { margins.bottom } else { 0 })
        .y_label_area_size(if is_left { margins.left } else { 0 })
        .build_cartesian_2d(b.x_min..b.x_max, b.y_min..b.y_max)
        .map_err(KurticError::plot)?;

    let tick_font = (family, style.tick_font_size).into_font();
    let desc_font = (family, style.label_font_size).into_font();
    let tick_format = |v: &f64| format!("{v:.2}");
    let mut mesh = chart.configure_mesh();
    mesh.disable_mesh()
        .axis_desc_style(desc_font)
        .x_label_style(tick_font.clone())
        .y_label_style(tick_font)
        .x_label_formatter(&tick_format)
        .y_label_formatter(&tick_format);
    if is_bottom {
        mesh.x_desc(style.x_desc.as_str()).x_labels(style.x_ticks);
    } else {
        mesh.x_labels(0);
    }
    if is_left {
        mesh.y_desc(style.y_desc.as_str()).y_labels(style.y_ticks);
    } else {
        mesh.y_labels(0);
    }
    mesh.draw().map_err(KurticError::plot)?;

    let (hx, hy) = (0.5 * field.xs.step, 0.5 * field.ys.step);
    let fb = field.bounds();
    let nx = field.xs.count;
    chart
        .draw_series(field.values.iter().enumerate().filter_map(|(idx, &z)| {
            let band = figure.levels.band(z)?;
            let (x, y) = (field.xs.at(idx % nx), field.ys.at(idx / nx));
            let lo = ((x - hx).max(fb.x_min), (y - hy).max(fb.y_min));
            let hi = ((x + hx).min(fb.x_max), (y + hy).min(fb.y_max));
            Some(Rectangle::new([lo, hi], figure.palette.color(band).filled()))
        }))
        .map_err(KurticError::plot)?;
    Ok(())
}

fn draw_colorbar(
    area: &Area<'_>,
    figure: &Figure<'_>,
    margins: &EdgeMargins,
    style: &RenderConfig,
) -> KurticResult<()> {
    let levels = figure.levels;
    let (z_min, z_max) = (levels.z_min(), levels.z_max());
    let ext = (z_max - z_min) * EXTENSION_RATIO;
    let family = style.font_family.as_str();

    let mut chart = ChartBuilder::on(area)
        .margin_top(margins.top + CELL_GAP / 2)
        .margin_bottom(margins.bottom + CELL_GAP / 2)
        .margin_right(CELL_GAP * 2)
        .y_label_area_size(margins.left)
        .build_cartesian_2d(0.0..1.0, (z_min - ext)..(z_max + ext))
        .map_err(KurticError::plot)?;

    let label_format = |v: &f64| {
        if *v < z_min - 1e-9 || *v > z_max + 1e-9 {
            String::new()
        } else {
            format!("{v:3.1}")
        }
    };
    chart
        .configure_mesh()
        .disable_mesh()
        .disable_x_axis()
        .x_labels(0)
        .y_labels(style.colorbar_ticks)
        .y_label_style((family, style.tick_font_size).into_font())
        .y_label_formatter(&label_format)
        .draw()
        .map_err(KurticError::plot)?;

    let palette = figure.palette;
    chart
        .draw_series((0..levels.band_count()).map(|i| {
            let (lo, hi) = levels.band_bounds(i);
            Rectangle::new([(0.0, lo), (1.0, hi)], palette.bands()[i].filled())
        }))
        .map_err(KurticError::plot)?;
    chart
        .draw_series([
            Polygon::new(
                vec![(0.0, z_max), (1.0, z_max), (0.5, z_max + ext)],
                palette.over.filled(),
            ),
            Polygon::new(
                vec![(0.0, z_min), (1.0, z_min), (0.5, z_min - ext)],
                palette.under.filled(),
            ),
        ])
        .map_err(KurticError::plot)?;
    Ok(())
}
