//! core/interp.rs — resampling (x, y, z) samples onto a regular grid.
//!
//! Simulation sweeps usually write each block as a complete rectilinear
//! lattice (not necessarily evenly spaced). Such blocks are evaluated with
//! bilinear or bicubic Hermite interpolation. Scattered blocks fall back to
//! inverse-distance weighting.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::core::linspace::Linspace;
use crate::error::{KurticError, KurticResult};

/// Samples closer than this (relative to the block extent) count as the same
/// lattice coordinate.
const LATTICE_REL_TOL: f64 = 1e-9;
const IDW_POWER: i32 = 2;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Sample {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Sample {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum, Default)]
#[serde(rename_all = "kebab-case")]
pub enum InterpMethod {
    Nearest,
    Linear,
    #[default]
    Cubic,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bounds {
    pub x_min: f64,
    pub x_max: f64,
    pub y_min: f64,
    pub y_max: f64,
}

impl Bounds {
    /// Bounding box of the finite sample coordinates.
    pub fn of(samples: &[Sample]) -> Option<Self> {
        samples
            .iter()
            .filter(|s| s.x.is_finite() && s.y.is_finite())
            .fold(None, |acc: Option<Bounds>, s| {
                Some(match acc {
                    None => Bounds {
                        x_min: s.x,
                        x_max: s.x,
                        y_min: s.y,
                        y_max: s.y,
                    },
                    Some(b) => Bounds {
                        x_min: b.x_min.min(s.x),
                        x_max: b.x_max.max(s.x),
                        y_min: b.y_min.min(s.y),
                        y_max: b.y_max.max(s.y),
                    },
                })
            })
    }

    pub fn union(self, other: Bounds) -> Bounds {
        Bounds {
            x_min: self.x_min.min(other.x_min),
            x_max: self.x_max.max(other.x_max),
            y_min: self.y_min.min(other.y_min),
            y_max: self.y_max.max(other.y_max),
        }
    }

    pub fn width(&self) -> f64 {
        self.x_max - self.x_min
    }

    pub fn height(&self) -> f64 {
        self.y_max - self.y_min
    }
}

/// Values on a regular grid, row-major with `y` as the slow axis.
#[derive(Clone, Debug)]
pub struct GridField {
    pub xs: Linspace,
    pub ys: Linspace,
    pub values: Vec<f64>,
}

impl GridField {
    #[inline]
    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.values[j * self.xs.count + i]
    }

    pub fn bounds(&self) -> Bounds {
        Bounds {
            x_min: self.xs.origin,
            x_max: self.xs.last(),
            y_min: self.ys.origin,
            y_max: self.ys.last(),
        }
    }

    /// Smallest and largest finite value, if any.
    pub fn value_range(&self) -> Option<(f64, f64)> {
        self.values
            .iter()
            .copied()
            .filter(|v| v.is_finite())
            .fold(None, |acc, v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })
    }
}

/// Samples arranged as `zs[j * xs.len() + i]` at `(xs[i], ys[j])`.
#[derive(Clone, Debug)]
pub struct Lattice {
    pub xs: Vec<f64>,
    pub ys: Vec<f64>,
    pub zs: Vec<f64>,
}

impl Lattice {
    /// Detects a complete rectilinear lattice; `None` for scattered data.
    pub fn detect(samples: &[Sample]) -> Option<Self> {
        let bounds = Bounds::of(samples)?;
        let tol_x = LATTICE_REL_TOL * bounds.width().abs().max(1.0);
        let tol_y = LATTICE_REL_TOL * bounds.height().abs().max(1.0);

        let xs = distinct(samples.iter().map(|s| s.x), tol_x);
        let ys = distinct(samples.iter().map(|s| s.y), tol_y);
        if xs.len() < 2 || ys.len() < 2 || xs.len() * ys.len() != samples.len() {
            return None;
        }

        let mut zs = vec![f64::NAN; samples.len()];
        let mut filled = vec![false; samples.len()];
        for s in samples {
            let i = locate(&xs, s.x, tol_x)?;
            let j = locate(&ys, s.y, tol_y)?;
            let slot = j * xs.len() + i;
            if filled[slot] {
                return None;
            }
            filled[slot] = true;
            zs[slot] = s.z;
        }
        Some(Self { xs, ys, zs })
    }

    #[inline]
    fn z(&self, i: usize, j: usize) -> f64 {
        self.zs[j * self.xs.len() + i]
    }

    pub fn eval(&self, method: InterpMethod, x: f64, y: f64) -> f64 {
        match method {
            InterpMethod::Nearest => {
                let i = nearest_index(&self.xs, x);
                let j = nearest_index(&self.ys, y);
                self.z(i, j)
            }
            InterpMethod::Linear => {
                let (i, tx) = segment(&self.xs, x);
                let (j, ty) = segment(&self.ys, y);
                let z00 = self.z(i, j);
                let z10 = self.z(i + 1, j);
                let z01 = self.z(i, j + 1);
                let z11 = self.z(i + 1, j + 1);
                let lower = z00 + (z10 - z00) * tx;
                let upper = z01 + (z11 - z01) * tx;
                lower + (upper - lower) * ty
            }
            InterpMethod::Cubic => {
                let (j, _) = segment(&self.ys, y);
                let rows: Vec<usize> = stencil(j, self.ys.len());
                let column: Vec<f64> = rows
                    .iter()
                    .map(|&row| {
                        let values: Vec<f64> = (0..self.xs.len()).map(|i| self.z(i, row)).collect();
                        hermite(&self.xs, &values, x)
                    })
                    .collect();
                let knots: Vec<f64> = rows.iter().map(|&r| self.ys[r]).collect();
                hermite(&knots, &column, y)
            }
        }
    }
}

/// Sorted distinct values, merging neighbours closer than `tol`.
fn distinct(values: impl Iterator<Item = f64>, tol: f64) -> Vec<f64> {
    let mut sorted: Vec<f64> = values.filter(|v| v.is_finite()).collect();
    sorted.sort_by(f64::total_cmp);
    let mut out: Vec<f64> = Vec::with_capacity(sorted.len());
    for v in sorted {
        match out.last() {
            Some(&last) if (v - last).abs() <= tol => {}
            _ => out.push(v),
        }
    }
    out
}

fn locate(knots: &[f64], v: f64, tol: f64) -> Option<usize> {
    let idx = knots.partition_point(|&k| k < v - tol);
    (idx < knots.len() && (knots[idx] - v).abs() <= tol).then_some(idx)
}

fn nearest_index(knots: &[f64], v: f64) -> usize {
    let idx = knots.partition_point(|&k| k < v);
    if idx == 0 {
        0
    } else if idx >= knots.len() {
        knots.len() - 1
    } else if (v - knots[idx - 1]) <= (knots[idx] - v) {
        idx - 1
    } else {
        idx
    }
}

/// Interval index `i` with `knots[i] <= v <= knots[i + 1]` (clamped) and the
/// fractional position inside it.
fn segment(knots: &[f64], v: f64) -> (usize, f64) {
    let n = knots.len();
    let i = knots.partition_point(|&k| k <= v).saturating_sub(1).min(n - 2);
    let t = (v - knots[i]) / (knots[i + 1] - knots[i]);
    (i, t.clamp(0.0, 1.0))
}

/// The up-to-four knot indices around interval `i`.
fn stencil(i: usize, n: usize) -> Vec<usize> {
    let lo = i.saturating_sub(1);
    let hi = (i + 2).min(n - 1);
    (lo..=hi).collect()
}

/// Finite-difference slope at knot `i`: centred inside, one-sided at the ends.
fn slope(knots: &[f64], values: &[f64], i: usize) -> f64 {
    let n = knots.len();
    let (l, r) = if i == 0 {
        (0, 1)
    } else if i == n - 1 {
        (n - 2, n - 1)
    } else {
        (i - 1, i + 1)
    };
    (values[r] - values[l]) / (knots[r] - knots[l])
}

/// Cubic Hermite interpolation through `(knots, values)` at `v`.
fn hermite(knots: &[f64], values: &[f64], v: f64) -> f64 {
    if knots.len() < 2 {
        return values.first().copied().unwrap_or(f64::NAN);
    }
    let (i, t) = segment(knots, v);
    let h = knots[i + 1] - knots[i];
    let m0 = slope(knots, values, i) * h;
    let m1 = slope(knots, values, i + 1) * h;
    let t2 = t * t;
    let t3 = t2 * t;
    let h00 = 2.0 * t3 - 3.0 * t2 + 1.0;
    let h10 = t3 - 2.0 * t2 + t;
    let h01 = -2.0 * t3 + 3.0 * t2;
    let h11 = t3 - t2;
    h00 * values[i] + h10 * m0 + h01 * values[i + 1] + h11 * m1
}

fn idw(samples: &[Sample], x: f64, y: f64, tol: f64) -> f64 {
    let mut weight_sum = 0.0;
    let mut value_sum = 0.0;
    for s in samples.iter().filter(|s| s.z.is_finite()) {
        let dx = s.x - x;
        let dy = s.y - y;
        let dist = (dx * dx + dy * dy).sqrt();
        if dist < tol {
            return s.z;
        }
        let w = 1.0 / dist.powi(IDW_POWER);
        weight_sum += w;
        value_sum += w * s.z;
    }
    if weight_sum > 0.0 {
        value_sum / weight_sum
    } else {
        f64::NAN
    }
}

fn nearest_sample(samples: &[Sample], x: f64, y: f64) -> f64 {
    samples
        .iter()
        .map(|s| ((s.x - x).powi(2) + (s.y - y).powi(2), s.z))
        .min_by(|a, b| a.0.total_cmp(&b.0))
        .map(|(_, z)| z)
        .unwrap_or(f64::NAN)
}

/// Resamples `samples` on a `resolution × resolution` grid spanning their
/// bounding box.
pub fn interpolate(
    samples: &[Sample],
    resolution: usize,
    method: InterpMethod,
) -> KurticResult<GridField> {
    if resolution < 2 {
        return Err(KurticError::range(format!(
            "grid resolution must be at least 2, got {resolution}"
        )));
    }
    let bounds =
        Bounds::of(samples).ok_or_else(|| KurticError::range("no finite sample coordinates"))?;
    if !(bounds.width() > 0.0 && bounds.height() > 0.0) {
        return Err(KurticError::range(format!(
            "zero extent: x in [{}, {}], y in [{}, {}]",
            bounds.x_min, bounds.x_max, bounds.y_min, bounds.y_max
        )));
    }

    let xs = Linspace::new(bounds.x_min, resolution, bounds.x_max);
    let ys = Linspace::new(bounds.y_min, resolution, bounds.y_max);
    let lattice = Lattice::detect(samples);
    if lattice.is_none() && method != InterpMethod::Nearest {
        warn!(
            "{} samples do not form a lattice; using inverse-distance weighting",
            samples.len()
        );
    }
    let tol = LATTICE_REL_TOL * bounds.width().max(bounds.height());

    let mut values = Vec::with_capacity(resolution * resolution);
    for y in ys.points() {
        for x in xs.points() {
            let z = match (&lattice, method) {
                (Some(l), m) => l.eval(m, x, y),
                (None, InterpMethod::Nearest) => nearest_sample(samples, x, y),
                (None, _) => idw(samples, x, y, tol),
            };
            values.push(z);
        }
    }
    Ok(GridField { xs, ys, values })
}
