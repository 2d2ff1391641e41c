//! core/contour.rs — filled-contour levels and band lookup.

use crate::error::{KurticError, KurticResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Band {
    Under,
    Level(usize),
    Over,
}

/// Levels `z_min, z_min + step, …` strictly below `z_max`, plus the closing
/// value `z_max` that bounds the last band.
#[derive(Debug, Clone)]
pub struct ContourLevels {
    levels: Vec<f64>,
    z_min: f64,
    z_max: f64,
}

impl ContourLevels {
    pub fn new(z_min: f64, z_max: f64, step: f64) -> KurticResult<Self> {
        if !(z_min.is_finite() && z_max.is_finite() && step.is_finite()) {
            return Err(KurticError::range(format!(
                "non-finite contour range [{z_min}, {z_max}] step {step}"
            )));
        }
        if z_max <= z_min {
            return Err(KurticError::range(format!(
                "zmax ({z_max}) must be greater than zmin ({z_min})"
            )));
        }
        if step <= 0.0 {
            return Err(KurticError::range(format!(
                "contour step must be positive, got {step}"
            )));
        }
        Ok(Self {
            levels: arange(z_min, z_max, step),
            z_min,
            z_max,
        })
    }

    pub fn levels(&self) -> &[f64] {
        &self.levels
    }

    pub fn band_count(&self) -> usize {
        self.levels.len()
    }

    pub fn z_min(&self) -> f64 {
        self.z_min
    }

    pub fn z_max(&self) -> f64 {
        self.z_max
    }

    /// Lower and upper value of band `i`.
    pub fn band_bounds(&self, i: usize) -> (f64, f64) {
        let lo = self.levels[i];
        let hi = self.levels.get(i + 1).copied().unwrap_or(self.z_max);
        (lo, hi)
    }

    pub fn band(&self, z: f64) -> Option<Band> {
        if z.is_nan() {
            return None;
        }
        if z < self.z_min {
            return Some(Band::Under);
        }
        if z >= self.z_max {
            return Some(Band::Over);
        }
        let i = self.levels.partition_point(|&l| l <= z).saturating_sub(1);
        Some(Band::Level(i))
    }
}

/// numpy-style `arange`: `ceil((stop - start) / step)` values.
pub fn arange(start: f64, stop: f64, step: f64) -> Vec<f64> {
    let count = ((stop - start) / step).ceil();
    if !(count.is_finite() && count > 0.0) {
        return Vec::new();
    }
    (0..count as usize)
        .map(|i| start + step * i as f64)
        .collect()
}
