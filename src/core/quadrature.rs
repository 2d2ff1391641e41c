//! core/quadrature.rs — composite Simpson integration on a uniform grid.
//!
//! Odd interval counts close with Simpson's 3/8 rule over the last three
//! intervals, so any sample count ≥ 4 keeps fourth-order accuracy.

/// ∫ f dx for samples `values` spaced `step` apart.
pub fn integral(values: &[f64], step: f64) -> f64 {
    weighted_sum(values.len(), step, |i| values[i])
}

/// L1 norm ∫ |f| dx with the same rule as [`integral`].
pub fn norm(values: &[f64], step: f64) -> f64 {
    weighted_sum(values.len(), step, |i| values[i].abs())
}

fn weighted_sum(n: usize, step: f64, f: impl Fn(usize) -> f64) -> f64 {
    match n {
        0 | 1 => 0.0,
        2 => 0.5 * step * (f(0) + f(1)),
        3 => simpson(0, 2, step, &f),
        _ => {
            let intervals = n - 1;
            if intervals % 2 == 0 {
                simpson(0, intervals, step, &f)
            } else {
                let split = intervals - 3;
                simpson(0, split, step, &f) + three_eighths(split, step, &f)
            }
        }
    }
}

/// Simpson 1/3 over samples `start..=end`; `end - start` must be even.
fn simpson(start: usize, end: usize, step: f64, f: &impl Fn(usize) -> f64) -> f64 {
    debug_assert_eq!((end - start) % 2, 0);
    if end == start {
        return 0.0;
    }
    let mut acc = f(start) + f(end);
    for i in (start + 1)..end {
        let w = if (i - start) % 2 == 1 { 4.0 } else { 2.0 };
        acc += w * f(i);
    }
    acc * step / 3.0
}

/// Simpson 3/8 over samples `start..=start + 3`.
fn three_eighths(start: usize, step: f64, f: &impl Fn(usize) -> f64) -> f64 {
    3.0 * step / 8.0 * (f(start) + 3.0 * f(start + 1) + 3.0 * f(start + 2) + f(start + 3))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::linspace::Linspace;
    use approx::assert_abs_diff_eq;
    use std::f64::consts::{E, PI};

    fn sample(grid: &Linspace, f: impl Fn(f64) -> f64) -> Vec<f64> {
        grid.points().map(f).collect()
    }

    #[test]
    fn integral_of_exp_on_unit_interval() {
        // both parities of the interval count
        for count in [1000, 1001] {
            let grid = Linspace::new(0.0, count, 1.0);
            let values = sample(&grid, f64::exp);
            assert_abs_diff_eq!(integral(&values, grid.step), E - 1.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn norm_of_sine_over_full_period() {
        let grid = Linspace::new(0.0, 10_000, 2.0 * PI);
        let values = sample(&grid, f64::sin);
        assert_abs_diff_eq!(norm(&values, grid.step), 4.0, epsilon = 1e-5);
        assert_abs_diff_eq!(integral(&values, grid.step), 0.0, epsilon = 1e-9);
    }

    #[test]
    fn short_inputs() {
        assert_eq!(integral(&[], 1.0), 0.0);
        assert_eq!(integral(&[5.0], 1.0), 0.0);
        assert_abs_diff_eq!(integral(&[1.0, 3.0], 2.0), 4.0);
        // cubic is exact under both rules
        let grid = Linspace::new(0.0, 4, 3.0);
        let values = sample(&grid, |x| x * x * x);
        assert_abs_diff_eq!(integral(&values, grid.step), 81.0 / 4.0, epsilon = 1e-12);
    }
}
