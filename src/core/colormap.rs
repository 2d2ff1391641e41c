//! core/colormap.rs — colour maps for contour bands.

use clap::ValueEnum;
use plotters::style::RGBColor;
use plotters::style::colors::colormaps::{ColorMap, ViridisRGB};
use serde::{Deserialize, Serialize};

use crate::core::contour::{Band, ContourLevels};

/// Stops of `nipy_spectral`, evenly spaced on [0, 1].
const NIPY_SPECTRAL: [(f64, f64, f64); 21] = [
    (0.0, 0.0, 0.0),
    (0.4667, 0.0, 0.5333),
    (0.5333, 0.0, 0.6),
    (0.0, 0.0, 0.6667),
    (0.0, 0.0, 0.8667),
    (0.0, 0.4667, 0.8667),
    (0.0, 0.6, 0.8667),
    (0.0, 0.6667, 0.6667),
    (0.0, 0.6667, 0.5333),
    (0.0, 0.6, 0.0),
    (0.0, 0.7333, 0.0),
    (0.0, 0.8667, 0.0),
    (0.0, 1.0, 0.0),
    (0.7333, 1.0, 0.0),
    (0.9333, 0.9333, 0.0),
    (1.0, 0.8, 0.0),
    (1.0, 0.6, 0.0),
    (1.0, 0.0, 0.0),
    (0.8667, 0.0, 0.0),
    (0.8, 0.0, 0.0),
    (0.8, 0.8, 0.8),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum, Default)]
#[serde(rename_all = "kebab-case")]
pub enum ColorMapKind {
    #[default]
    NipySpectral,
    Viridis,
}

impl ColorMapKind {
    /// Colour at `t` in [0, 1]; out-of-range values are clamped.
    pub fn at(self, t: f64) -> RGBColor {
        let t = if t.is_finite() { t.clamp(0.0, 1.0) } else { 0.0 };
        match self {
            ColorMapKind::NipySpectral => piecewise(&NIPY_SPECTRAL, t),
            ColorMapKind::Viridis => ViridisRGB.get_color(t),
        }
    }
}

fn piecewise(stops: &[(f64, f64, f64)], t: f64) -> RGBColor {
    let segments = (stops.len() - 1) as f64;
    let pos = t * segments;
    let i = (pos.floor() as usize).min(stops.len() - 2);
    let frac = pos - i as f64;
    let (r0, g0, b0) = stops[i];
    let (r1, g1, b1) = stops[i + 1];
    let mix = |a: f64, b: f64| ((a + (b - a) * frac) * 255.0).round().clamp(0.0, 255.0) as u8;
    RGBColor(mix(r0, r1), mix(g0, g1), mix(b0, b1))
}

/// Band colours for one set of contour levels.
#[derive(Debug, Clone)]
pub struct BandPalette {
    bands: Vec<RGBColor>,
    pub under: RGBColor,
    pub over: RGBColor,
}

impl BandPalette {
    pub fn new(
        kind: ColorMapKind,
        levels: &ContourLevels,
        over: RGBColor,
        under: Option<RGBColor>,
    ) -> Self {
        let span = levels.z_max() - levels.z_min();
        let bands = (0..levels.band_count())
            .map(|i| {
                let (lo, hi) = levels.band_bounds(i);
                let mid = 0.5 * (lo + hi);
                kind.at((mid - levels.z_min()) / span)
            })
            .collect();
        Self {
            bands,
            under: under.unwrap_or_else(|| kind.at(0.0)),
            over,
        }
    }

    pub fn color(&self, band: Band) -> RGBColor {
        match band {
            Band::Under => self.under,
            Band::Over => self.over,
            Band::Level(i) => self.bands[i.min(self.bands.len().saturating_sub(1))],
        }
    }

    pub fn bands(&self) -> &[RGBColor] {
        &self.bands
    }
}
