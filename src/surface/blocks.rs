//! Slicing a sample table into equal row blocks, one per subplot.

use std::ops::Range;

use tracing::warn;

use crate::core::interp::Sample;
use crate::error::{KurticError, KurticResult};

#[derive(Debug)]
pub struct Blocks<'a> {
    samples: &'a [Sample],
    shift: usize,
    plots: usize,
}

impl<'a> Blocks<'a> {
    /// Checks that `samples` holds at least `plots · shift` rows.
    pub fn new(samples: &'a [Sample], shift: usize, plots: usize) -> KurticResult<Self> {
        if shift == 0 {
            return Err(KurticError::range("block shift must be positive"));
        }
        let expected = plots * shift;
        if samples.len() < expected {
            return Err(KurticError::ShortTable {
                expected,
                actual: samples.len(),
                plots,
                shift,
            });
        }
        if samples.len() > expected {
            warn!(
                "ignoring {} trailing rows after {plots} blocks of {shift}",
                samples.len() - expected
            );
        }
        Ok(Self {
            samples,
            shift,
            plots,
        })
    }

    pub fn len(&self) -> usize {
        self.plots
    }

    pub fn is_empty(&self) -> bool {
        self.plots == 0
    }

    pub fn row_range(&self, p: usize) -> Range<usize> {
        p * self.shift..(p + 1) * self.shift
    }

    /// Rows `[p·shift, (p+1)·shift)`; `None` past the last plot.
    pub fn get(&self, p: usize) -> Option<&'a [Sample]> {
        let samples = self.samples;
        (p < self.plots).then(|| &samples[self.row_range(p)])
    }

    pub fn iter(&self) -> impl Iterator<Item = &'a [Sample]> + '_ {
        (0..self.plots).filter_map(move |p| self.get(p))
    }
}
