//! core/linspace.rs — uniformly spaced 1-D grids.
//!
//! Used for the excess/dispersion sweeps of the solver, the sampling window of
//! kernel moments and the axes of interpolation grids.

use std::str::FromStr;

use crate::error::KurticError;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Linspace {
    pub origin: f64,
    pub step: f64,
    pub count: usize,
}

impl Linspace {
    /// Grid of `count` points from `begin` to `last` inclusive.
    /// A single point has step 0.
    pub fn new(begin: f64, count: usize, last: f64) -> Self {
        let step = if count > 1 {
            (last - begin) / (count - 1) as f64
        } else {
            0.0
        };
        Self {
            origin: begin,
            step,
            count,
        }
    }

    /// Symmetric grid over `[-half_width, half_width]`.
    pub fn symmetric(half_width: f64, count: usize) -> Self {
        Self::new(-half_width, count, half_width)
    }

    #[inline]
    pub fn at(&self, i: usize) -> f64 {
        self.origin + self.step * i as f64
    }

    #[inline]
    pub fn last(&self) -> f64 {
        if self.count == 0 {
            self.origin
        } else {
            self.at(self.count - 1)
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn points(&self) -> impl Iterator<Item = f64> + '_ {
        (0..self.count).map(move |i| self.at(i))
    }
}

/// Parses `BEGIN:COUNT:LAST`, e.g. `-1:5:1`.
impl FromStr for Linspace {
    type Err = KurticError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(':').map(str::trim).collect();
        let [begin, count, last] = parts.as_slice() else {
            return Err(KurticError::range(format!(
                "expected BEGIN:COUNT:LAST, got '{s}'"
            )));
        };
        let begin = begin
            .parse::<f64>()
            .map_err(|e| KurticError::range(format!("bad begin '{begin}': {e}")))?;
        let count = count
            .parse::<usize>()
            .map_err(|e| KurticError::range(format!("bad count '{count}': {e}")))?;
        let last = last
            .parse::<f64>()
            .map_err(|e| KurticError::range(format!("bad last '{last}': {e}")))?;
        if count == 0 {
            return Err(KurticError::range("grid count must be positive"));
        }
        if !begin.is_finite() || !last.is_finite() {
            return Err(KurticError::range(format!("non-finite bounds in '{s}'")));
        }
        Ok(Self::new(begin, count, last))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn endpoints_are_inclusive() {
        let grid = Linspace::new(-1.0, 5, 1.0);
        assert_abs_diff_eq!(grid.step, 0.5);
        assert_abs_diff_eq!(grid.last(), 1.0);
        let pts: Vec<f64> = grid.points().collect();
        assert_eq!(pts, vec![-1.0, -0.5, 0.0, 0.5, 1.0]);
    }

    #[test]
    fn single_point_has_zero_step() {
        let grid = Linspace::new(3.0, 1, 7.0);
        assert_eq!(grid.step, 0.0);
        assert_eq!(grid.last(), 3.0);
        assert_eq!(grid.points().collect::<Vec<_>>(), vec![3.0]);
    }

    #[test]
    fn parses_begin_count_last() {
        let grid: Linspace = "0.5:4:2".parse().unwrap();
        assert_eq!(grid.count, 4);
        assert_abs_diff_eq!(grid.step, 0.5);
        assert!("1:0:2".parse::<Linspace>().is_err());
        assert!("1:2".parse::<Linspace>().is_err());
        assert!("a:2:3".parse::<Linspace>().is_err());
    }
}
