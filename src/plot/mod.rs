//! Contour-matrix drawing: load → slice → interpolate → render.

pub mod figure;
pub mod layout;

use std::path::PathBuf;

use tracing::info;

use crate::config::{DrawConfig, RenderConfig};
use crate::core::colormap::BandPalette;
use crate::core::contour::ContourLevels;
use crate::core::interp::{Bounds, GridField, interpolate};
use crate::error::{KurticError, KurticResult};
use crate::surface::blocks::Blocks;
use crate::surface::table::SampleTable;
use figure::Figure;
use layout::{MATRIX_COLS, MATRIX_ROWS, PLOT_COUNT, parameter_values};

/// One fully resolved `draw` invocation.
#[derive(Debug, Clone)]
pub struct DrawJob {
    pub dimension: String,
    pub input: PathBuf,
    pub output: PathBuf,
    pub draw: DrawConfig,
}

impl DrawJob {
    /// Header printed before drawing starts.
    pub fn banner(&self) -> String {
        format!(
            "Dimension:        {}\nExcess range:     {:?}..{:?}\nValues range:     {:?}..{:?}",
            self.dimension, self.draw.k_min, self.draw.k_max, self.draw.z_min, self.draw.z_max
        )
    }
}

/// Interpolated subplots ready for rendering.
#[derive(Debug, Clone)]
pub struct PreparedFields {
    /// Indexed by plot number.
    pub fields: Vec<GridField>,
    /// Union of the block bounding boxes.
    pub bounds: Bounds,
    pub levels: ContourLevels,
}

impl PreparedFields {
    pub fn value_range(&self) -> Option<(f64, f64)> {
        self.fields
            .iter()
            .filter_map(GridField::value_range)
            .reduce(|(lo, hi), (l, h)| (lo.min(l), hi.max(h)))
    }
}

#[derive(Debug, Clone)]
pub struct DrawSummary {
    pub plots: usize,
    /// Range of the interpolated values over all subplots.
    pub value_range: Option<(f64, f64)>,
}

/// Loads the table and interpolates every block, without touching the
/// output file.
pub fn prepare(job: &DrawJob) -> KurticResult<PreparedFields> {
    let draw = &job.draw;
    let levels = ContourLevels::new(draw.z_min, draw.z_max, draw.smooth)?;
    if draw.grid_resolution < 2 {
        return Err(KurticError::range(format!(
            "grid_resolution must be at least 2, got {}",
            draw.grid_resolution
        )));
    }

    let table = SampleTable::load(&job.input)?;
    info!(
        "Loaded {} rows of {} columns from {}",
        table.len(),
        table.width(),
        job.input.display()
    );
    let samples = table.samples(draw.columns())?;
    let blocks = Blocks::new(&samples, draw.shift, PLOT_COUNT)?;

    let mut fields = Vec::with_capacity(PLOT_COUNT);
    let mut bounds: Option<Bounds> = None;
    for (p, block) in blocks.iter().enumerate() {
        info!("{} plot creating...", p + 1);
        let field = interpolate(block, draw.grid_resolution, draw.interpolation).map_err(|e| {
            KurticError::DegenerateBlock {
                block: p,
                reason: e.to_string(),
            }
        })?;
        let fb = field.bounds();
        bounds = Some(bounds.map_or(fb, |b| b.union(fb)));
        fields.push(field);
    }
    let bounds = bounds.ok_or_else(|| KurticError::range("no blocks to draw"))?;

    Ok(PreparedFields {
        fields,
        bounds,
        levels,
    })
}

/// Prepares the fields and writes the PNG.
pub fn run(job: &DrawJob, render: &RenderConfig) -> KurticResult<DrawSummary> {
    let prepared = prepare(job)?;
    let palette = BandPalette::new(
        render.colormap,
        &prepared.levels,
        render.over(),
        render.under(),
    );
    let draw = &job.draw;
    let figure = Figure {
        title: render.title_for(&job.dimension),
        fields: &prepared.fields,
        bounds: prepared.bounds,
        levels: &prepared.levels,
        palette: &palette,
        column_values: parameter_values(draw.k_min, draw.k_max, MATRIX_COLS),
        row_values: parameter_values(draw.k_min, draw.k_max, MATRIX_ROWS),
    };

    info!("Drawing...");
    figure::render(&figure, render, &job.output)?;
    info!("Saved {}", job.output.display());

    Ok(DrawSummary {
        plots: prepared.fields.len(),
        value_range: prepared.value_range(),
    })
}
