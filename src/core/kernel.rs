//! core/kernel.rs — symmetric kernel families and their moments.
//!
//! Each family has two shape parameters `(a, b)`. The solver searches for the
//! pair whose normalised kernel has a requested dispersion (second moment) and
//! excess kurtosis (fourth standardised moment minus 3).
//!
//! - kurtic:      f(x) = exp(-½ (a x² + b x⁴) / (1 + x²))
//! - roughgarden: f(x) = exp(-|x / a|^b)
//!
//! Moments are integrated on a symmetric window `[-L, L]`, where `L` is the
//! first point at which the kernel falls to [`DECAY_THRESHOLD`].

use clap::ValueEnum;
use nalgebra::Matrix2;
use serde::{Deserialize, Serialize};

use crate::core::linspace::Linspace;
use crate::core::quadrature;
use crate::error::{KurticError, KurticResult};

/// Kernel magnitude that bounds the integration window.
pub const DECAY_THRESHOLD: f64 = 1e-12;
/// Window half-widths beyond this are treated as non-decaying.
const MAX_SUPPORT: f64 = 1e6;
const BISECTION_STEPS: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum, Default)]
#[serde(rename_all = "kebab-case")]
pub enum KernelKind {
    #[default]
    Kurtic,
    Roughgarden,
}

impl KernelKind {
    pub fn name(self) -> &'static str {
        match self {
            KernelKind::Kurtic => "kurtic",
            KernelKind::Roughgarden => "roughgarden",
        }
    }

    #[inline]
    pub fn eval(self, x: f64, a: f64, b: f64) -> f64 {
        match self {
            KernelKind::Kurtic => {
                let xx = x * x;
                (-0.5 * (a * xx + b * xx * xx) / (1.0 + xx)).exp()
            }
            KernelKind::Roughgarden => (-(x / a).abs().powf(b)).exp(),
        }
    }

    /// Starting point for the root search at target excess `k` and
    /// dispersion (variance) `d`.
    pub fn initial_guess(self, k: f64, d: f64) -> (f64, f64) {
        match self {
            KernelKind::Kurtic => {
                if d < 1.0 && k <= 0.0 {
                    (0.1, 0.02)
                } else if k > 0.0 {
                    (10.0, 1.0)
                } else {
                    (400.0, 0.01)
                }
            }
            KernelKind::Roughgarden => {
                let b = if k < 0.0 {
                    4.0
                } else if k.abs() < 1e-6 {
                    2.0
                } else {
                    1.0
                };
                (1.0, b)
            }
        }
    }

    /// Half-width of the window outside which the kernel stays below
    /// [`DECAY_THRESHOLD`].
    pub fn support(self, a: f64, b: f64) -> KurticResult<f64> {
        let not_decaying = || KurticError::KernelNotDecaying {
            kernel: self.name(),
            a,
            b,
        };
        if !a.is_finite() || !b.is_finite() {
            return Err(not_decaying());
        }
        if self == KernelKind::Roughgarden && (a <= 0.0 || b <= 0.0) {
            return Err(not_decaying());
        }

        let above = |x: f64| -> KurticResult<bool> {
            let v = self.eval(x, a, b);
            if v.is_finite() {
                Ok(v.abs() > DECAY_THRESHOLD)
            } else {
                Err(not_decaying())
            }
        };

        let mut lo = 0.0;
        let mut hi = 1.0;
        while above(hi)? {
            lo = hi;
            hi *= 2.0;
            if hi > MAX_SUPPORT {
                return Err(not_decaying());
            }
        }
        for _ in 0..BISECTION_STEPS {
            let mid = 0.5 * (lo + hi);
            if above(mid)? {
                lo = mid;
            } else {
                hi = mid;
            }
        }
        if hi <= 0.0 {
            return Err(not_decaying());
        }
        Ok(hi)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Moments {
    /// Second moment of the normalised kernel.
    pub dispersion: f64,
    /// Fourth standardised moment minus 3.
    pub excess: f64,
}

/// Moments plus ∂(excess, dispersion)/∂(a, b), rows ordered like the
/// solver residual.
#[derive(Clone, Copy, Debug)]
pub struct Evaluation {
    pub moments: Moments,
    pub jacobian: Option<Matrix2<f64>>,
}

/// Evaluates kernel moments on a fixed number of quadrature nodes, reusing
/// one sample buffer across calls.
#[derive(Clone, Debug)]
pub struct MomentProbe {
    kind: KernelKind,
    points: usize,
    buffer: Vec<f64>,
}

impl MomentProbe {
    pub fn new(kind: KernelKind, points: usize) -> KurticResult<Self> {
        if points < 3 {
            return Err(KurticError::range(format!(
                "moment integration needs at least 3 points, got {points}"
            )));
        }
        Ok(Self {
            kind,
            points,
            buffer: vec![0.0; points],
        })
    }

    pub fn moments(&mut self, a: f64, b: f64) -> KurticResult<Moments> {
        self.sample(a, b).map(|(grid, norm)| self.moments_on(&grid, norm))
    }

    /// Moments and, for kernels that have one, the analytic Jacobian.
    pub fn evaluate(&mut self, a: f64, b: f64) -> KurticResult<Evaluation> {
        let (grid, norm) = self.sample(a, b)?;
        let moments = self.moments_on(&grid, norm);
        let jacobian = match self.kind {
            KernelKind::Kurtic => Some(self.kurtic_jacobian(&grid, norm, moments)),
            KernelKind::Roughgarden => None,
        };
        Ok(Evaluation { moments, jacobian })
    }

    fn sample(&mut self, a: f64, b: f64) -> KurticResult<(Linspace, f64)> {
        let half_width = self.kind.support(a, b)?;
        let grid = Linspace::symmetric(half_width, self.points);
        for (i, slot) in self.buffer.iter_mut().enumerate() {
            *slot = self.kind.eval(grid.at(i), a, b);
        }
        let norm = quadrature::norm(&self.buffer, grid.step);
        if !(norm.is_finite() && norm > 0.0) {
            return Err(KurticError::KernelNotDecaying {
                kernel: self.kind.name(),
                a,
                b,
            });
        }
        Ok((grid, norm))
    }

    /// ∫ x^(2·power) f(x) w(x) dx over the sampled window.
    fn weighted(&self, grid: &Linspace, power: i32, weight: impl Fn(f64) -> f64) -> f64 {
        let values: Vec<f64> = self
            .buffer
            .iter()
            .enumerate()
            .map(|(i, &f)| {
                let x = grid.at(i);
                f * (x * x).powi(power) * weight(x)
            })
            .collect();
        quadrature::integral(&values, grid.step)
    }

    fn moments_on(&self, grid: &Linspace, norm: f64) -> Moments {
        let dispersion = self.weighted(grid, 1, |_| 1.0) / norm;
        let fourth = self.weighted(grid, 2, |_| 1.0) / norm;
        Moments {
            dispersion,
            excess: fourth / (dispersion * dispersion) - 3.0,
        }
    }

    fn kurtic_jacobian(&self, grid: &Linspace, norm: f64, m: Moments) -> Matrix2<f64> {
        // ∂f/∂a = -½ x²/(1+x²) f and ∂f/∂b = -½ x⁴/(1+x²) f, so every
        // derivative is one of p[j] = ∫ x^(2j) f/(1+x²).
        let damped = |x: f64| 1.0 / (1.0 + x * x);
        let p: Vec<f64> = (0..=4).map(|j| self.weighted(grid, j, damped)).collect();

        let d = m.dispersion;
        let mu = (m.excess + 3.0) * d * d;

        let dn = [-0.5 * p[1], -0.5 * p[2]];
        let d_second = [-0.5 * p[2], -0.5 * p[3]];
        let d_fourth = [-0.5 * p[3], -0.5 * p[4]];

        let dd: Vec<f64> = (0..2).map(|c| (d_second[c] - d * dn[c]) / norm).collect();
        let dmu: Vec<f64> = (0..2).map(|c| (d_fourth[c] - mu * dn[c]) / norm).collect();
        let dk: Vec<f64> = (0..2)
            .map(|c| dmu[c] / (d * d) - 2.0 * mu * dd[c] / (d * d * d))
            .collect();

        Matrix2::new(dk[0], dk[1], dd[0], dd[1])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn kurtic_with_equal_parameters_is_gaussian() {
        let mut probe = MomentProbe::new(KernelKind::Kurtic, 4001).unwrap();
        for s in [0.25, 1.0, 4.0] {
            let m = probe.moments(s, s).unwrap();
            assert_abs_diff_eq!(m.dispersion, 1.0 / s, epsilon = 1e-6 / s);
            assert_abs_diff_eq!(m.excess, 0.0, epsilon = 1e-6);
        }
    }

    #[test]
    fn roughgarden_shapes() {
        let mut probe = MomentProbe::new(KernelKind::Roughgarden, 4001).unwrap();
        let gauss = probe.moments(2.0, 2.0).unwrap();
        assert_abs_diff_eq!(gauss.dispersion, 2.0, epsilon = 1e-6);
        assert_abs_diff_eq!(gauss.excess, 0.0, epsilon = 1e-6);

        let laplace = probe.moments(1.0, 1.0).unwrap();
        assert_abs_diff_eq!(laplace.dispersion, 2.0, epsilon = 1e-4);
        assert_abs_diff_eq!(laplace.excess, 3.0, epsilon = 1e-3);
    }

    #[test]
    fn support_reaches_threshold() {
        let l = KernelKind::Kurtic.support(1.0, 1.0).unwrap();
        // exp(-x²/2) = 1e-12
        let expected = (2.0 * 1e12f64.ln()).sqrt();
        assert_abs_diff_eq!(l, expected, epsilon = 1e-9);
        assert!(KernelKind::Kurtic.eval(l * 1.001, 1.0, 1.0) <= DECAY_THRESHOLD);
    }

    #[test]
    fn non_decaying_kernels_are_rejected() {
        assert!(KernelKind::Kurtic.support(1.0, 0.0).is_err());
        assert!(KernelKind::Kurtic.support(-1.0, -1.0).is_err());
        assert!(KernelKind::Roughgarden.support(0.0, 2.0).is_err());
        assert!(KernelKind::Kurtic.support(f64::NAN, 1.0).is_err());
    }

    #[test]
    fn analytic_jacobian_matches_finite_differences() {
        let mut probe = MomentProbe::new(KernelKind::Kurtic, 6001).unwrap();
        let (a, b) = (0.8, 0.3);
        let jac = probe.evaluate(a, b).unwrap().jacobian.unwrap();

        let h = 1e-5;
        let at = |probe: &mut MomentProbe, a: f64, b: f64| probe.moments(a, b).unwrap();
        let da_plus = at(&mut probe, a + h, b);
        let da_minus = at(&mut probe, a - h, b);
        let db_plus = at(&mut probe, a, b + h);
        let db_minus = at(&mut probe, a, b - h);

        let dk_da = (da_plus.excess - da_minus.excess) / (2.0 * h);
        let dk_db = (db_plus.excess - db_minus.excess) / (2.0 * h);
        let dd_da = (da_plus.dispersion - da_minus.dispersion) / (2.0 * h);
        let dd_db = (db_plus.dispersion - db_minus.dispersion) / (2.0 * h);

        assert_abs_diff_eq!(jac[(0, 0)], dk_da, epsilon = 1e-3);
        assert_abs_diff_eq!(jac[(0, 1)], dk_db, epsilon = 1e-3);
        assert_abs_diff_eq!(jac[(1, 0)], dd_da, epsilon = 1e-3);
        assert_abs_diff_eq!(jac[(1, 1)], dd_db, epsilon = 1e-3);
    }

    #[test]
    fn initial_guesses() {
        assert_eq!(KernelKind::Kurtic.initial_guess(-0.5, 0.5), (0.1, 0.02));
        assert_eq!(KernelKind::Kurtic.initial_guess(0.5, 4.0), (10.0, 1.0));
        assert_eq!(KernelKind::Kurtic.initial_guess(-0.5, 4.0), (400.0, 0.01));
        assert_eq!(KernelKind::Roughgarden.initial_guess(-1.0, 1.0), (1.0, 4.0));
        assert_eq!(KernelKind::Roughgarden.initial_guess(0.0, 1.0), (1.0, 2.0));
        assert_eq!(KernelKind::Roughgarden.initial_guess(2.0, 1.0), (1.0, 1.0));
    }
}
